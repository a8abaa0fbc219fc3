//! Logging setup.
//!
//! All diagnostics go through `tracing`. The subscriber writes compact lines to
//! stderr so `--json` output on stdout stays machine-readable. Verbosity is
//! controlled with `RUST_LOG` and defaults to `info`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `verbose` raises the default level to `debug` for this crate when
/// `RUST_LOG` is not set. Calling this twice is harmless; the second
/// installation attempt is ignored.
pub fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "info,wave_front_lib=debug,wave_front=debug"
    } else {
        "info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init();
}
