use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Crates whose events are raised to `info` when running verbosely.
const VERBOSE_TARGETS: &[&str] = &["postman_cli", "postman_ses", "postman_utils"];

/// Builds the filter used by [`init_logging`].
///
/// `RUST_LOG` wins when set, otherwise only warnings are shown, or
/// informational events of the postman crates when `verbose` is on.
pub fn log_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose))
}

fn default_filter(verbose: bool) -> EnvFilter {
    let mut directives = String::from("warn");
    if verbose {
        for target in VERBOSE_TARGETS {
            directives.push_str(&format!(",{target}=info"));
        }
    }
    EnvFilter::new(directives)
}

/// Installs the global `tracing` subscriber writing to standard error,
/// leaving standard output to the command results.
pub fn init_logging(verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(log_filter(verbose))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
