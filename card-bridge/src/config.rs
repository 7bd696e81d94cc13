//! Bridge command line / environment configuration

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Reads NFC card taps, toggles attendance and relays every UID to the browser
#[derive(Debug, Clone, Parser)]
#[command(name = "card-bridge", version, about)]
pub struct BridgeConfig {
    /// Line-oriented reader device (serial TTY, HID wedge); `-` reads stdin
    #[arg(long, env = "READER_DEVICE", default_value = "-")]
    pub device: String,

    /// Address the relay WebSocket server listens on
    #[arg(long, env = "RELAY_ADDR", default_value = "127.0.0.1:4000")]
    pub relay_addr: SocketAddr,

    /// SQLite database shared with the gym server
    #[arg(long = "database", env = "DATABASE_PATH", default_value = "data/gym.db")]
    pub database_path: String,

    /// Ignore a repeat of the same card within this window (0 = off)
    #[arg(long, env = "TAP_DEBOUNCE_MS", default_value_t = 0)]
    pub debounce_ms: u64,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Daily rolling log files go here when set
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<String>,
}

impl BridgeConfig {
    pub fn debounce(&self) -> Option<Duration> {
        (self.debounce_ms > 0).then(|| Duration::from_millis(self.debounce_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = BridgeConfig::parse_from([
            "card-bridge",
            "--device",
            "/dev/ttyUSB0",
            "--relay-addr",
            "0.0.0.0:4100",
            "--database",
            "/tmp/gym.db",
            "--debounce-ms",
            "1500",
        ]);
        assert_eq!(config.device, "/dev/ttyUSB0");
        assert_eq!(config.relay_addr.port(), 4100);
        assert_eq!(config.database_path, "/tmp/gym.db");
        assert_eq!(config.debounce(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn debounce_zero_is_off() {
        let config = BridgeConfig::parse_from(["card-bridge", "--debounce-ms", "0"]);
        assert_eq!(config.debounce(), None);
    }
}
