//! CLI entrypoint for `contract-runner`.

use std::process::ExitCode;

use clap::Parser;
use contract_runner::cli::Args;
use contract_runner::{FATAL_EXIT_CODE, RunnerError, logging};

fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    logging::init_tracing();

    let args = Args::parse();
    Ok(match contract_runner::run(&args) {
        Ok(outcome) => outcome.into(),
        Err(err) => {
            report_fatal(err);
            ExitCode::from(FATAL_EXIT_CODE)
        }
    })
}

#[expect(
    clippy::print_stderr,
    reason = "fatal errors are reported to the terminal before exiting"
)]
fn report_fatal(err: RunnerError) {
    let report = color_eyre::eyre::Report::from(err);
    eprintln!("Error: {report:?}");
}
