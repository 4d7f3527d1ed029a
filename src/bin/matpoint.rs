use matpoint::prelude::*;
use matpoint::StrError;
use std::path::Path;
use structopt::StructOpt;

/// Command line options
#[derive(StructOpt, Debug)]
#[structopt(name = "matpoint", about = "Runs a material point test described by a JSON file")]
struct Options {
    /// JSON file with the description of the test
    input: String,

    /// Output directory
    #[structopt(short, long, default_value = "/tmp/matpoint/results")]
    out_dir: String,

    /// Draws the curves y vs x given as "x:y" (e.g., "EXX:SXX"); may be repeated
    #[structopt(short, long)]
    plot: Vec<String>,
}

fn main() -> Result<(), StrError> {
    // parse options
    let options = Options::from_args();

    // run the test
    let input = SchemeInput::read_json(&options.input)?;
    let mut scheme = input.build()?;
    let results = scheme.run()?;

    // write the results
    let stem = Path::new(&options.input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("results");
    let path_json = format!("{}/{}.json", options.out_dir, stem);
    results.write_json(&path_json)?;

    // plot
    if !options.plot.is_empty() {
        let mut plotter = ResultsPlotter::new();
        for pair in &options.plot {
            let (x, y) = pair.split_once(':').ok_or("the plot option must be formatted as x:y")?;
            plotter.draw(&results, x, y)?;
        }
        plotter.save(&format!("{}/{}.svg", options.out_dir, stem))?;
    }

    // message
    let thin_line = format!("{:─^1$}", "", path_json.len());
    println!("\n\n{}", thin_line);
    match &results.failure {
        Some(failure) => println!(
            "FAILED at t = {:?} ({:?}): {}",
            failure.time, failure.category, failure.message
        ),
        None => println!("{} periods completed", results.snapshots.len().saturating_sub(1)),
    }
    for check in &results.checks {
        let status = if check.passed { "passed" } else { "FAILED" };
        println!(
            "check {} vs {}: {} (max error = {:e})",
            check.variable, check.reference, status, check.max_error
        );
    }
    println!("the results file is:");
    println!("{}", path_json);
    println!("{}\n\n", thin_line);
    if results.succeeded() && results.checks_passed() {
        Ok(())
    } else {
        Err("the test did not succeed")
    }
}
