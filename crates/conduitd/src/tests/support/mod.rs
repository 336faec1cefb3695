//! Shared doubles and harnesses for the daemon suites.

mod harness;
mod loaders;
mod reporter;
mod shutdown;

pub use self::harness::BridgeHarness;
pub use self::loaders::{FailingConfigLoader, TestConfigLoader, test_config};
pub use self::reporter::{HealthEvent, RecordingHealthReporter};
pub use self::shutdown::ChannelShutdownSignal;
