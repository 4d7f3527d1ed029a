use crate::base::{Config, FailureCategory, PredictionPolicy};
use russell_lab::{vec_norm, Norm, Vector};

/// Controls the convergence of the Newton-Raphson iterations of one step
///
/// Convergence requires, at the same iteration:
///
/// 1. the max-norm of the driving variable correction below `eeps`
/// 2. the max-norm of the equilibrium residual below `seps`
/// 3. all constraints satisfied
///
/// With `NoPrediction`, convergence cannot be declared at the first iteration.
pub struct ControlConvergence<'a> {
    config: &'a Config,
    ndv: usize,
    driving: Vector,
    iteration: usize,
    norm_du: f64,
    norm_rr: f64,
    norm_rr_prev: f64,
    converged_on_du: bool,
    converged_on_rr: bool,
    constraints_satisfied: bool,
    diverging_on_rr: bool,
    found_nan_or_inf: bool,
}

impl<'a> ControlConvergence<'a> {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `config` -- solver options
    /// * `ndv` -- number of driving variables (the norms only consider these components)
    pub fn new(config: &'a Config, ndv: usize) -> Self {
        ControlConvergence {
            config,
            ndv,
            driving: Vector::new(ndv),
            iteration: 0,
            norm_du: 0.0,
            norm_rr: 0.0,
            norm_rr_prev: 0.0,
            converged_on_du: false,
            converged_on_rr: false,
            constraints_satisfied: false,
            diverging_on_rr: false,
            found_nan_or_inf: false,
        }
    }

    /// Resets the flags for a new step
    pub fn reset(&mut self) {
        self.iteration = 0;
        self.norm_du = 0.0;
        self.norm_rr = 0.0;
        self.norm_rr_prev = 0.0;
        self.converged_on_du = false;
        self.converged_on_rr = false;
        self.constraints_satisfied = false;
        self.diverging_on_rr = false;
        self.found_nan_or_inf = false;
    }

    /// Analyzes the residual evaluated at the current iteration
    pub fn analyze_rr(&mut self, iteration: usize, rr: &Vector) {
        self.iteration = iteration;
        self.norm_rr = self.driving_norm(rr);
        if !self.norm_rr.is_finite() || rr.as_data().iter().any(|v| !v.is_finite()) {
            self.found_nan_or_inf = true;
        }
        self.converged_on_rr = !self.found_nan_or_inf && self.norm_rr < self.config.seps;
        self.diverging_on_rr = iteration > 1 && self.norm_rr > self.norm_rr_prev;
        self.norm_rr_prev = self.norm_rr;
    }

    /// Analyzes the correction of the unknowns
    pub fn analyze_du(&mut self, du: &Vector) {
        self.norm_du = self.driving_norm(du);
        if du.as_data().iter().any(|v| !v.is_finite()) {
            self.found_nan_or_inf = true;
        }
        self.converged_on_du = !self.found_nan_or_inf && self.norm_du < self.config.eeps;
    }

    /// Returns the max-norm of the driving variable components (the multipliers are ignored)
    fn driving_norm(&mut self, v: &Vector) -> f64 {
        self.driving
            .as_mut_data()
            .copy_from_slice(&v.as_data()[..self.ndv]);
        vec_norm(&self.driving, Norm::Max)
    }

    /// Records whether the constraints are satisfied
    pub fn set_constraints_satisfied(&mut self, satisfied: bool) {
        self.constraints_satisfied = satisfied;
    }

    /// Returns true if NaN or Inf values were found
    pub fn found_nan_or_inf(&self) -> bool {
        self.found_nan_or_inf
    }

    /// Returns true if all criteria are satisfied
    pub fn converged(&self) -> bool {
        if self.config.prediction_policy == PredictionPolicy::NoPrediction && self.iteration < 2 {
            return false;
        }
        self.converged_on_du && self.converged_on_rr && self.constraints_satisfied
    }

    /// Returns the max-norm of the last correction
    pub fn norm_du(&self) -> f64 {
        self.norm_du
    }

    /// Returns the max-norm of the last residual
    pub fn norm_rr(&self) -> f64 {
        self.norm_rr
    }

    /// Prints the header of the table
    pub fn print_header(&self) {
        if self.config.verbose_steps || self.config.verbose_iterations || self.config.verbose_sub_steps {
            println!("\nMATPOINT === TIME STEPPING AND CONVERGENCE STATISTICS =========================");
            println!("\nLegend:");
            println!("✅ : converged");
            println!("🔹 : converging");
            println!("🎈 : diverging");
            println!("\"iter\" means iteration\n");
            println!("{}", "─".repeat(79));
            println!(
                "{:>8} {:>11} {:>11} {:>5} {:>9} {:>9}",
                "period", "t", "Δt", "iter", "‖Δu‖∞", "‖R‖∞"
            );
            println!("{}", "─".repeat(79));
        }
    }

    /// Prints the step information
    pub fn print_step(&self, period: usize, t: f64, dt: f64) {
        if self.config.verbose_steps {
            println!("{:>8} {:>11.6e} {:>11.6e}", period + 1, t, dt);
        }
    }

    /// Prints the iteration information
    pub fn print_iteration(&self) {
        if self.config.verbose_iterations {
            let icon = if self.converged() {
                "✅"
            } else if self.diverging_on_rr {
                "🎈"
            } else {
                "🔹"
            };
            println!(
                "{:>8} {:>11} {:>11} {:>5} {:>9.2e} {:>9.2e} {}",
                "·", "·", "·", self.iteration, self.norm_du, self.norm_rr, icon
            );
        }
    }

    /// Prints the failure of a (sub)step
    pub fn print_sub_step_failure(&self, t: f64, dt: f64, category: FailureCategory) {
        if self.config.verbose_sub_steps {
            println!(
                "{:>8} {:>11.6e} {:>11.6e} step failed ({:?}); reducing the time increment",
                "·", t, dt, category
            );
        }
    }

    /// Prints the horizontal line at the end of the run
    pub fn print_footer(&self) {
        if self.config.verbose_steps || self.config.verbose_iterations || self.config.verbose_sub_steps {
            println!("{}", "─".repeat(79));
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
