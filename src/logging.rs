//! Log setup for the command-line tool
//!
//! Logs go to stderr so the CSV and JSON written to stdout stay clean.
//! `RUST_LOG` takes precedence over `--verbose`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "school_fees_engine=debug,info"
    } else {
        "school_fees_engine=info,warn"
    }
}

pub fn init_logger(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    // a second initialisation (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters_parse() {
        for verbose in [true, false] {
            assert!(EnvFilter::try_new(default_filter(verbose)).is_ok());
        }
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_logger(false);
        init_logger(true);
    }
}
