use std::process::ExitCode;

fn main() -> ExitCode {
    liftline_cli::run()
}
