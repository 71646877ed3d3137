use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "tube_converter=info,tower_http=info";

/// Build the filter directive for a configured level, e.g. `debug`.
pub fn filter_for_level(level: &str) -> String {
    format!("tube_converter={level},tower_http={level}")
}

pub fn init_tracing() {
    init_tracing_with_default(DEFAULT_LOG_FILTER);
}

/// `RUST_LOG` wins over `default_filter` when set.
pub fn init_tracing_with_default(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_for_level() {
        assert_eq!(filter_for_level("debug"), "tube_converter=debug,tower_http=debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_tracing();
        init_tracing_with_default("tube_converter=trace");
    }
}
