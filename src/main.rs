//! Sitepack - command-line asset build pipeline for single-page apps

use std::process::ExitCode;

use sitepack::cli;

fn main() -> ExitCode {
    cli::run()
}
