//! Configuration loaders for success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};

use conduit_config::Config;

use crate::bootstrap::ConfigLoader;

/// Loopback configuration on an ephemeral port with logging silenced.
#[must_use]
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_owned(),
        port: 0,
        log_filter: "off".to_owned(),
        ..Config::default()
    }
}

/// Loader returning [`test_config`].
#[derive(Debug, Default)]
pub struct TestConfigLoader;

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(test_config())
    }
}

/// Loader that fails by passing an unparseable port on the command line.
#[derive(Debug, Default)]
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("conduitd"),
            OsString::from("--port"),
            OsString::from("not-a-port"),
        ];
        Config::load_from_iter(args)
    }
}
