use log::SetLoggerError;

/// Filter used when `RUST_LOG` is not set.
#[cfg(feature = "builtin_env_logger")]
const DEFAULT_FILTER: &str = "info";

/// Install `env_logger` as the `log` backend, honouring `RUST_LOG`.
///
/// Without the "builtin_env_logger" feature this does nothing, and the host is expected to
/// install its own logger. Calling it twice returns the error from the second attempt.
pub fn try_init() -> Result<(), SetLoggerError> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "builtin_env_logger")] {
            let env = env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, DEFAULT_FILTER);
            env_logger::Builder::from_env(env)
                .format_timestamp_micros()
                .try_init()
        } else {
            Ok(())
        }
    }
}
