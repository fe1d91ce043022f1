// Entry point and high-level CLI flow.
//
// - Parse arguments and set up logging.
// - Validate the inputs into a `ReportRequest` (prompting for missing ones
//   with `--interactive`).
// - Run the pipeline, print the preview, write the workbook.
// - In interactive mode, offer to run again with a fresh request.
mod config;
mod dates;
mod error;
mod form;
mod loader;
mod merge;
mod output;
mod pipeline;
mod types;
mod util;

use clap::Parser;
use config::{Cli, ReportRequest};
use error::ReportError;
use std::io;
use std::process::ExitCode;
use tracing::Level;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Run one report, preview it and write the workbook.
fn generate(request: &ReportRequest, cli: &Cli) -> Result<(), ReportError> {
    println!("Generating report...");
    let report = pipeline::run(request)?;
    output::print_preview(&report, cli.preview_rows);
    let path = output::write_report(&report, &cli.output_dir)?;
    println!("(Full table exported to {})\n", path.display());
    Ok(())
}

fn run_interactive(cli: &Cli) -> ExitCode {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    loop {
        let result = form::collect_request(&mut input, cli).and_then(|req| generate(&req, cli));
        let status = match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {e}\n");
                ExitCode::from(e.exit_code())
            }
        };
        if !form::prompt_again(&mut input) {
            println!("Exiting the program.");
            return status;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.interactive {
        return run_interactive(&cli);
    }

    match ReportRequest::from_cli(&cli).and_then(|req| generate(&req, &cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
