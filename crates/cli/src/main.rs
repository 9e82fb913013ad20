use std::process::ExitCode;

fn main() -> ExitCode {
    goodday_cli::run()
}
