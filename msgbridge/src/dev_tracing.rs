//! Opt-in log output.

/// Install a fmt subscriber filtered by `RUST_LOG`, if that variable is set.
///
/// `msgbridge_init` calls this so a host process can turn on bridge logging
/// without any code of its own; tests and benches may call it directly. It is
/// a no-op when `RUST_LOG` is unset or a global subscriber already exists.
pub fn init_tracing() {
    use std::env;

    if env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .try_init();
    }
}
