//! Command line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use labelcheck_core::ScannerId;
use labelcheck_core::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_ARM_SCANNER_ID, DEFAULT_SCANNER_URL, MAX_RECONNECT_ATTEMPTS,
    RECONNECT_INTERVAL_MS, WEDGE_DEBOUNCE_MS,
};
use labelcheck_network::{ScannerTransportConfig, ValidationClientConfig};
use labelcheck_orchestrator::OrchestratorConfig;

/// Shipping label inspection station.
#[derive(Parser, Debug, Clone)]
#[command(name = "labelcheck", version)]
#[command(about = "Pair scanned tracking numbers with label photos and validate them")]
pub struct Settings {
    /// Scanner hub WebSocket URL
    #[arg(long, env = "LABELCHECK_SCANNER_URL", default_value = DEFAULT_SCANNER_URL)]
    pub scanner_url: String,

    /// Validation API root
    #[arg(long, env = "LABELCHECK_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// Delay between reconnection attempts
    #[arg(long, env = "LABELCHECK_RECONNECT_INTERVAL_MS", default_value_t = RECONNECT_INTERVAL_MS)]
    pub reconnect_interval_ms: u64,

    /// Reconnection attempts before giving up
    #[arg(long, env = "LABELCHECK_MAX_RECONNECT_ATTEMPTS", default_value_t = MAX_RECONNECT_ATTEMPTS)]
    pub max_reconnect_attempts: u32,

    /// Keyboard-wedge idle reset
    #[arg(long, env = "LABELCHECK_DEBOUNCE_MS", default_value_t = WEDGE_DEBOUNCE_MS)]
    pub debounce_ms: u64,

    /// Scanner armed for image capture when the hub connects
    #[arg(long, env = "LABELCHECK_ARM_SCANNER", default_value_t = DEFAULT_ARM_SCANNER_ID)]
    pub arm_scanner: u32,

    /// Arm scanners on connect, on attach and after every cycle
    #[arg(
        long,
        env = "LABELCHECK_ARM_ON_CONNECT",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub arm_on_connect: bool,

    /// Validation request timeout; waits indefinitely when unset
    #[arg(long, env = "LABELCHECK_VALIDATION_TIMEOUT_SECS")]
    pub validation_timeout_secs: Option<u64>,

    /// Read keyboard-wedge input from a device or file instead of the console
    #[arg(long, env = "LABELCHECK_WEDGE_DEVICE")]
    pub wedge_device: Option<PathBuf>,
}

impl Settings {
    pub fn transport_config(&self) -> ScannerTransportConfig {
        ScannerTransportConfig {
            url: self.scanner_url.clone(),
            reconnect_interval: Duration::from_millis(self.reconnect_interval_ms),
            max_reconnect_attempts: self.max_reconnect_attempts,
            ..Default::default()
        }
    }

    pub fn validation_config(&self) -> ValidationClientConfig {
        ValidationClientConfig {
            base_url: self.api_base_url.clone(),
            timeout: self.validation_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            arm_on_connect: self.arm_on_connect,
            arm_scanner: Some(ScannerId::new(self.arm_scanner)),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let settings = Settings::try_parse_from(["labelcheck"]).unwrap();

        assert_eq!(settings.transport_config().url, DEFAULT_SCANNER_URL);
        assert_eq!(
            settings.transport_config().reconnect_interval,
            Duration::from_secs(3)
        );
        assert_eq!(settings.validation_config().timeout, None);
        assert_eq!(settings.orchestrator_config(), OrchestratorConfig::default());
        assert_eq!(settings.debounce(), Duration::from_millis(50));
        assert!(settings.wedge_device.is_none());
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::try_parse_from([
            "labelcheck",
            "--scanner-url",
            "ws://scanner.local:9000",
            "--api-base-url",
            "https://api.example.com/api/latest",
            "--reconnect-interval-ms",
            "500",
            "--max-reconnect-attempts",
            "3",
            "--arm-scanner",
            "4",
            "--validation-timeout-secs",
            "15",
            "--wedge-device",
            "/dev/hidraw0",
        ])
        .unwrap();

        let transport = settings.transport_config();
        assert_eq!(transport.url, "ws://scanner.local:9000");
        assert_eq!(transport.reconnect_interval, Duration::from_millis(500));
        assert_eq!(transport.max_reconnect_attempts, 3);
        assert_eq!(
            settings.validation_config().timeout,
            Some(Duration::from_secs(15))
        );
        assert_eq!(
            settings.orchestrator_config().arm_scanner,
            Some(ScannerId::new(4))
        );
        assert_eq!(settings.wedge_device, Some(PathBuf::from("/dev/hidraw0")));
    }

    #[rstest]
    #[case("false", false)]
    #[case("true", true)]
    fn test_arm_on_connect_flag(#[case] value: &str, #[case] expected: bool) {
        let settings =
            Settings::try_parse_from(["labelcheck", "--arm-on-connect", value]).unwrap();
        assert_eq!(settings.orchestrator_config().arm_on_connect, expected);
    }
}
