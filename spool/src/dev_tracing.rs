//! Development logging setup.

/// Initialize a tracing subscriber when `RUST_LOG` is set.
///
/// Tests and demos can call `spool::dev_tracing::init_tracing()` to see the
/// socket's `[XSUB]` / `[STAR]` traces, for example with
/// `RUST_LOG=spool_proto=trace`. This is a no-op when `RUST_LOG` is not set
/// or when a global subscriber is already installed.
pub fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_some() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_target(true)
            .try_init();
    }
}
