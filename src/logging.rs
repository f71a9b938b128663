use env_logger::{Builder, Env};
use log::LevelFilter;

/// Initializes the global logger.
///
/// `RUST_LOG` wins when set. Otherwise `verbose` selects debug output (every
/// split, merge and reversal) over the default info level.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(level.to_string());
    let mut builder = Builder::from_env(env);

    // Only fails if a logger is already installed, which tests do repeatedly.
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init(false);
        init(true);
        log::debug!("logger initialised twice without panicking");
    }
}
