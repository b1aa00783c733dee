//! Runtime configuration.
//!
//! Defaults, overridable via `BEACONPIPE_*` environment variables and
//! then by command-line flags in the binary.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::ConfigError;

const DEFAULT_CHANNEL: u8 = 10;
const DEFAULT_LISTEN: &str = "127.0.0.1:19000";

/// Where the capture stream goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkSpec {
    /// Listen on this address and stream to the first consumer.
    Tcp(SocketAddr),
    /// Stream through a named pipe at this path (unix).
    Fifo(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Radio channel to capture on (1-13).
    pub channel: u8,
    pub sink: SinkSpec,
}

impl Config {
    /// Built-in defaults with environment overrides applied.
    pub fn load() -> Result<Self, ConfigError> {
        let mut channel = DEFAULT_CHANNEL;
        if let Ok(val) = env::var("BEACONPIPE_CHANNEL") {
            channel = val.parse().map_err(|_| ConfigError::InvalidEnvValue {
                key: "BEACONPIPE_CHANNEL",
                value: val,
            })?;
        }

        let mut sink = SinkSpec::Tcp(
            DEFAULT_LISTEN
                .parse()
                .expect("default listen address is valid"),
        );
        if let Ok(val) = env::var("BEACONPIPE_LISTEN") {
            sink = SinkSpec::Tcp(val.parse().map_err(|_| ConfigError::InvalidEnvValue {
                key: "BEACONPIPE_LISTEN",
                value: val,
            })?);
        }
        if let Ok(val) = env::var("BEACONPIPE_PIPE") {
            sink = SinkSpec::Fifo(PathBuf::from(val));
        }

        let config = Self { channel, sink };
        config.validate()?;
        Ok(config)
    }

    pub fn with_channel(mut self, channel: u8) -> Result<Self, ConfigError> {
        self.channel = channel;
        self.validate()?;
        Ok(self)
    }

    pub fn with_sink(mut self, sink: SinkSpec) -> Self {
        self.sink = sink;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=13).contains(&self.channel) {
            return Err(ConfigError::InvalidChannel(self.channel));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod channel_tests {
        use super::*;

        fn base() -> Config {
            Config {
                channel: DEFAULT_CHANNEL,
                sink: SinkSpec::Tcp(DEFAULT_LISTEN.parse().unwrap()),
            }
        }

        #[test]
        fn accepts_valid_channels() {
            assert!(base().with_channel(1).is_ok());
            assert!(base().with_channel(13).is_ok());
        }

        #[test]
        fn rejects_channel_zero() {
            assert!(matches!(
                base().with_channel(0),
                Err(ConfigError::InvalidChannel(0))
            ));
        }

        #[test]
        fn rejects_channel_above_range() {
            assert!(matches!(
                base().with_channel(14),
                Err(ConfigError::InvalidChannel(14))
            ));
        }
    }
}
