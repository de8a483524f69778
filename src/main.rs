//! session-keeper binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use session_keeper::{cli, logging, Config, Console, StreamOutput, SystemClock};
use tracing::{debug, error};

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    // Ignore the error if a subscriber is already installed
    let _ = logging::init_with_filter(config.log_filter());
    debug!(
        handler = %config.session.handler,
        path = %config.session.path.display(),
        "session-keeper v{}",
        env!("CARGO_PKG_VERSION")
    );

    let console = match Console::new(config, Arc::new(SystemClock)) {
        Ok(console) => console,
        Err(e) => {
            error!("failed to open session storage: {}", e);
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut out = StreamOutput::new(std::io::stdout().lock());
    match console.execute(&args, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("command failed: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
