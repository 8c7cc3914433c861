use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the stderr subscriber. `RUST_LOG` takes precedence over `verbose`.
pub fn init(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(verbose)
                .with_level(true),
        )
        .try_init();
    if let Err(error) = result {
        eprintln!("failed to initialize logging: {}", error);
    }
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "sensu_cli=debug"
    } else {
        "sensu_cli=warn"
    }
}

#[cfg(test)]
mod tests {
    use super::default_directive;
    use tracing_subscriber::EnvFilter;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true), "sensu_cli=debug");
        assert_eq!(default_directive(false), "sensu_cli=warn");
        for verbose in [true, false].iter() {
            assert!(EnvFilter::try_new(default_directive(*verbose)).is_ok());
        }
    }
}
