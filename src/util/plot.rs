use crate::driver::RunResults;
use crate::StrError;
use plotpy::{Curve, Legend, Plot};
use std::ffi::OsStr;

/// Plots the history of the components of a run
pub struct ResultsPlotter {
    plot: Plot,
    n_curves: usize,
}

impl ResultsPlotter {
    /// Allocates a new instance
    pub fn new() -> Self {
        ResultsPlotter {
            plot: Plot::new(),
            n_curves: 0,
        }
    }

    /// Draws the curve y(x) where x and y are component names (or `t` for the time)
    ///
    /// For example, `draw(&results, "EXX", "SXX")` draws the stress-strain curve.
    pub fn draw(&mut self, results: &RunResults, x: &str, y: &str) -> Result<&mut Self, StrError> {
        let xx = series(results, x)?;
        let yy = series(results, y)?;
        let mut curve = Curve::new();
        curve.set_label(&format!("{} vs {}", y, x)).set_marker_style(".");
        curve.draw(&xx, &yy);
        self.plot.add(&curve);
        self.plot.grid_and_labels(x, y);
        self.n_curves += 1;
        Ok(self)
    }

    /// Saves the figure
    ///
    /// # Input
    ///
    /// * `figure_path` -- may be a String, &str, or Path
    pub fn save<S>(&mut self, figure_path: &S) -> Result<(), StrError>
    where
        S: AsRef<OsStr> + ?Sized,
    {
        if self.n_curves == 0 {
            return Err("there are no curves to be saved");
        }
        if self.n_curves > 1 {
            let mut legend = Legend::new();
            legend.draw();
            self.plot.add(&legend);
        }
        self.plot.save(figure_path)
    }
}

/// Returns the time or the history of a component
fn series(results: &RunResults, name: &str) -> Result<Vec<f64>, StrError> {
    if name == "t" {
        Ok(results.times())
    } else {
        results.series(name)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
