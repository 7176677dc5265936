//! Log output for the CLI.
//!
//! Library code logs through the `log` facade; this installs a
//! tracing-subscriber formatter that bridges those records to stderr.

use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// HTTP stack targets capped at `warn` regardless of verbosity.
const QUIET_TARGETS: &[&str] = &["hyper=warn", "hyper_util=warn", "rustls=warn", "reqwest=info"];

/// Level used when `RUST_LOG` is unset, from the number of `-v` flags.
pub fn verbosity_filter(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

pub fn env_filter(verbosity: u8) -> EnvFilter {
    let mut filter = EnvFilter::builder()
        .with_default_directive(verbosity_filter(verbosity).into())
        .from_env_lossy();
    for target in QUIET_TARGETS {
        if let Ok(directive) = target.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(verbosity: u8) {
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity > 1),
        )
        .with(env_filter(verbosity))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(verbosity_filter(0), LevelFilter::WARN);
        assert_eq!(verbosity_filter(1), LevelFilter::INFO);
        assert_eq!(verbosity_filter(2), LevelFilter::DEBUG);
        assert_eq!(verbosity_filter(9), LevelFilter::TRACE);
    }

    #[test]
    fn quiet_targets_parse() {
        for target in QUIET_TARGETS {
            assert!(target.parse::<tracing_subscriber::filter::Directive>().is_ok());
        }
    }

    #[test]
    fn init_twice_is_harmless() {
        init(0);
        init(2);
    }
}
