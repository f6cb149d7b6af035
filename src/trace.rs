use tracing::dispatcher::{Dispatch, set_global_default};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the global `tracing` subscriber.
///
/// `levels` is an `EnvFilter` directive such as `goose_flowmeter=debug`.
/// Repeated calls are ignored so tests can initialize freely.
pub fn init(color: bool, json: bool, levels: &str) {
    let filter = EnvFilter::try_new(levels).unwrap_or_else(|_| EnvFilter::new("info"));

    let dispatch = if json {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .json()
            .flatten_event(true)
            .finish();
        Dispatch::new(subscriber)
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_ansi(color)
            .with_env_filter(filter)
            .finish();
        Dispatch::new(subscriber)
    };

    let _ = set_global_default(dispatch);
}

/// Logging setup for tests, honoring `TEST_LOG`.
pub fn test_init() {
    let levels = std::env::var("TEST_LOG").unwrap_or_else(|_| "error".to_owned());
    init(false, false, &levels);
}
