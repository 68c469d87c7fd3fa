use env_logger::{Builder, Env};

/// Install the global logger; `RUST_LOG` overrides the `info` default.
///
/// Safe to call more than once, later calls are ignored.
pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .format_target(false)
        .try_init();
}
