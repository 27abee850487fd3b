use crate::args::LogLevel;
use is_terminal::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a full `EnvFilter` directive, e.g. `kvadm_sheet=trace`.
pub const LOG_ENV: &str = "KVADM_LOG";

/// Install the stderr subscriber. `KVADM_LOG` wins over `--log-level`.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    // A second install (tests driving `run` repeatedly) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}
