use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Install a stderr `fmt` subscriber. `RUST_LOG` takes precedence over `level`.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_logging(level: Level) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    // Already set (tests, repeated CLI setup): keep the existing one.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(Level::WARN);
        init_logging(Level::DEBUG);
        tracing::info!("still alive");
    }
}
