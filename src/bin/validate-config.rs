use chainrunner::cli::{self, ValidateCli};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = ValidateCli::parse();
    cli::init_logging(&args.log);
    ExitCode::from(cli::validate(&args, &mut std::io::stdout(), &mut std::io::stderr()))
}
