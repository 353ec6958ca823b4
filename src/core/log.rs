use tracing_subscriber::{EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt};

const APP_TARGET: &str = "splitledger";

/// Directive used when `RUST_LOG` is unset. Only the crate's own events are
/// shown, and only with `--verbose`. Problems the user must act on are
/// printed by the commands themselves.
fn default_directive(verbose: bool) -> String {
    if verbose {
        format!("off,{APP_TARGET}=debug")
    } else {
        "off".to_string()
    }
}

/// Installs the global subscriber on stderr. `--verbose` gets the pretty
/// multi-line format, a bare `RUST_LOG` gets one line per event.
pub fn init_logging(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let detailed = verbose.then(|| {
        fmt::layer()
            .pretty()
            .without_time()
            .with_writer(std::io::stderr)
    });
    let compact = (!verbose).then(|| {
        fmt::layer()
            .compact()
            .without_time()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(detailed)
        .with(compact)
        .with(env_filter)
        .init();
}
