use cucumber::World;

pub mod common;
pub mod steps;

pub use common::world::PagerWorld;

/// # rat Integration Tests
///
/// Drives real pagers over real shell commands. Keys go through the
/// controller's event handling and frames are captured by a mock render
/// stream, so no TTY is needed.
///
/// ```bash
/// cargo test --test integration_tests
/// RAT_LOG_LEVEL=debug cargo test --test integration_tests -- --nocapture
/// ```
#[tokio::main]
async fn main() {
    let log_level = std::env::var("RAT_LOG_LEVEL")
        .unwrap_or_else(|_| "error".to_string())
        .to_lowercase();

    let level = match log_level.as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        _ => tracing::Level::ERROR,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    run_features_sequentially().await;
}

/// Features spawn processes and share the machine's process table, so they
/// run one at a time.
async fn run_features_sequentially() {
    let features = [
        "features/navigation.feature",
        "features/annotations.feature",
        "features/reload.feature",
    ];

    for (i, feature) in features.iter().enumerate() {
        tracing::info!("[{}/{}] Starting {}", i + 1, features.len(), feature);
        PagerWorld::run(feature).await;
        tracing::info!("[{}/{}] Completed {}", i + 1, features.len(), feature);
    }
}
