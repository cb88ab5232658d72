pub mod context;

use std::{
    env,
    ops::Mul as _,
    sync::{LazyLock, OnceLock},
    time::Duration,
};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use umbra_tracing::logging::{init_logger, LoggerLayer, LoggerSettings};

pub use crate::context::{TestConfig, TestContext};

static IS_SLOW_TEST_ENV: LazyLock<bool> =
    LazyLock::new(|| env::var("SLOW_TEST_ENV").is_ok_and(|s| s == "true"));

pub static IS_DEBUG_TRACING: LazyLock<bool> = LazyLock::new(|| {
    env::var("UMBRA_TESTS_TRACING").is_ok_and(|val| val.eq_ignore_ascii_case("true"))
});

static LOG_GUARD: OnceLock<Option<WorkerGuard>> = OnceLock::new();

/// In slow test environments like Codecov, use 2x timeout.
#[must_use]
pub fn adjust_timeout(d: Duration) -> Duration {
    if *IS_SLOW_TEST_ENV {
        d.mul(2)
    } else {
        d
    }
}

/// Installs a stdout subscriber once per test binary when
/// `UMBRA_TESTS_TRACING=true`.
pub fn init_test_tracing() {
    LOG_GUARD.get_or_init(|| {
        if !*IS_DEBUG_TRACING {
            return None;
        }
        let settings = LoggerSettings {
            logger: LoggerLayer::Stdout,
            level: Level::DEBUG,
            filter: None,
        };
        init_logger(&settings).unwrap_or_else(|e| {
            eprintln!("Test tracing disabled: {e}");
            None
        })
    });
}
