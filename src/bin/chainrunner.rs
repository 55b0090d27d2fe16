use chainrunner::cli::{self, RunCli};
use clap::Parser;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = RunCli::parse();
    cli::init_logging(&args.log);

    let runner = match args.runner() {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return ExitCode::FAILURE;
        }
    };

    let code = cli::run_chain(&args, &runner, &mut std::io::stdout(), &mut std::io::stderr()).await;
    ExitCode::from(code)
}
