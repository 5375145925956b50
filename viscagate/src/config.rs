//! Configuration loading from TOML.
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyUSB0"
//! baud = 38400
//!
//! [server]
//! base_port = 52380
//!
//! [[ip_camera]]
//! name = "wide"
//! index = 6
//! ip = "10.0.0.31"
//! port = 1259
//! flavor = "ptz"
//! ```
//!
//! Either a `[serial]` section or at least one `[[ip_camera]]` must be
//! present. The UDP passthrough server only makes sense in front of a
//! serial chain.

use crate::{Error, Result};
use serde::Deserialize;
use std::{fs, net::IpAddr, path::Path};

/// Serial daisy-chain configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`. Framing is always
    /// 8-N-1.
    pub port: String,

    /// Baud rate. EVI heads default to 9600; production installs run
    /// 38400.
    #[serde(default = "default_baud")]
    pub baud: u32,
}

fn default_baud() -> u32 {
    9600
}

/// How a camera interprets vendor-specific codes (video system, preset
/// depth). The engine stays permissive either way; the tag is carried
/// for consumers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFlavor {
    #[default]
    Ptz,
    Sony,
}

/// A camera reached over VISCA-over-IP instead of the serial chain.
#[derive(Debug, Clone, Deserialize)]
pub struct IpCameraConfig {
    /// Display name, used in logs only.
    pub name: String,

    /// The camera's address in the gateway's camera table, 1–7. Must not
    /// collide with the serial chain, which claims 1..N.
    pub index: u8,

    pub ip: IpAddr,

    /// The camera's VISCA UDP port.
    #[serde(default = "default_visca_port")]
    pub port: u16,

    #[serde(default)]
    pub flavor: CameraFlavor,
}

fn default_visca_port() -> u16 {
    1259
}

/// UDP passthrough server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Serial camera N is served on `base_port + N`.
    pub base_port: u16,
}

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub serial: Option<SerialConfig>,

    #[serde(default, rename = "ip_camera")]
    pub ip_cameras: Vec<IpCameraConfig>,

    #[serde(default)]
    pub server: Option<ServerConfig>,
}

impl Config {
    /// Loads and validates a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("failed to read config: {e}")))?;
        let config: Config = basic_toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result {
        if self.serial.is_none() && self.ip_cameras.is_empty() {
            return Err(Error::Config(
                "need a [serial] section or at least one [[ip_camera]]".to_string(),
            ));
        }

        if self.server.is_some() && self.serial.is_none() {
            return Err(Error::Config(
                "[server] passthrough requires a [serial] chain".to_string(),
            ));
        }

        if let Some(server) = &self.server {
            if server.base_port > u16::MAX - 7 {
                return Err(Error::Config(format!(
                    "base_port {} leaves no room for camera ports",
                    server.base_port
                )));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for cam in &self.ip_cameras {
            // Addresses are 3 bits on the wire and 0 is the controller.
            if !(1..=7).contains(&cam.index) {
                return Err(Error::Config(format!(
                    "ip_camera \"{}\": index {} is outside the addressable range 1-7",
                    cam.name, cam.index
                )));
            }
            if !seen.insert(cam.index) {
                return Err(Error::Config(format!(
                    "ip_camera \"{}\": duplicate index {}",
                    cam.name, cam.index
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn full_example() -> Result {
        let config: Config = basic_toml::from_str(
            r#"
            [serial]
            port = "/dev/ttyUSB0"
            baud = 38400

            [server]
            base_port = 52380

            [[ip_camera]]
            name = "wide"
            index = 6
            ip = "10.0.0.31"
            "#,
        )
        .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;

        let serial = config.serial.expect("serial section");
        assert_eq!("/dev/ttyUSB0", serial.port);
        assert_eq!(38400, serial.baud);
        assert_eq!(52380, config.server.expect("server section").base_port);

        let cam = &config.ip_cameras[0];
        assert_eq!(6, cam.index);
        assert_eq!(1259, cam.port);
        assert_eq!(CameraFlavor::Ptz, cam.flavor);
        Ok(())
    }

    #[test]
    fn rejects_empty_config() {
        let config: Config = basic_toml::from_str("").expect("parse");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_server_without_serial() {
        let config: Config = basic_toml::from_str(
            r#"
            [server]
            base_port = 52380

            [[ip_camera]]
            name = "only"
            index = 1
            ip = "10.0.0.31"
            "#,
        )
        .expect("parse");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_unaddressable_indexes() {
        for index in ["0", "8", "200"] {
            let config: Config = basic_toml::from_str(&format!(
                r#"
                [[ip_camera]]
                name = "far"
                index = {index}
                ip = "10.0.0.31"
                "#,
            ))
            .expect("parse");
            assert!(matches!(config.validate(), Err(Error::Config(_))));
        }
    }

    #[test]
    fn rejects_duplicate_indexes() {
        let config: Config = basic_toml::from_str(
            r#"
            [[ip_camera]]
            name = "a"
            index = 2
            ip = "10.0.0.31"

            [[ip_camera]]
            name = "b"
            index = 2
            ip = "10.0.0.32"
            "#,
        )
        .expect("parse");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn sony_flavor_parses() {
        let config: Config = basic_toml::from_str(
            r#"
            [[ip_camera]]
            name = "sony"
            index = 3
            ip = "10.0.0.33"
            flavor = "sony"
            "#,
        )
        .expect("parse");
        assert_eq!(CameraFlavor::Sony, config.ip_cameras[0].flavor);
    }
}
