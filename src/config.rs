use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use thiserror::Error;

pub const MODE_VAR: &str = "DASHBOARD_ENV";
pub const PORT_VAR: &str = "PORT";
pub const DEFAULT_PORT: u16 = 8050;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("DASHBOARD_ENV must be 'development' or 'production', got '{0}'")]
    UnknownMode(String),

    #[error("PORT must be a port number, got '{0}'")]
    InvalidPort(String),
}

/// Development vs. production serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServeMode {
    Development,
    #[default]
    Production,
}

impl ServeMode {
    pub fn parse(value: Option<&str>) -> Result<Self, ConfigError> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(value) if value.eq_ignore_ascii_case("development") => Ok(Self::Development),
            Some(value) if value.eq_ignore_ascii_case("production") => Ok(Self::Production),
            Some(other) => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::parse(std::env::var(MODE_VAR).ok().as_deref())
    }

    pub fn bind_ip(self) -> IpAddr {
        match self {
            Self::Development => IpAddr::V4(Ipv4Addr::LOCALHOST),
            Self::Production => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_directive(self) -> &'static str {
        match self {
            Self::Development => "debug",
            Self::Production => "info",
        }
    }
}

/// Resolves the listening port: explicit flag, then `PORT`, then the default.
pub fn resolve_port(flag: Option<u16>, env_value: Option<&str>) -> Result<u16, ConfigError> {
    if let Some(port) = flag {
        return Ok(port);
    }
    match env_value.map(str::trim) {
        None | Some("") => Ok(DEFAULT_PORT),
        Some(value) => value
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(value.to_string())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServeConfig {
    pub mode: ServeMode,
    pub port: u16,
}

impl ServeConfig {
    pub fn from_env(port_flag: Option<u16>) -> Result<Self, ConfigError> {
        Ok(Self {
            mode: ServeMode::from_env()?,
            port: resolve_port(port_flag, std::env::var(PORT_VAR).ok().as_deref())?,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.mode.bind_ip(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_defaults_to_production() {
        assert_eq!(ServeMode::parse(None), Ok(ServeMode::Production));
        assert_eq!(ServeMode::parse(Some("")), Ok(ServeMode::Production));
        assert_eq!(ServeMode::parse(Some("Development")), Ok(ServeMode::Development));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert_eq!(
            ServeMode::parse(Some("staging")),
            Err(ConfigError::UnknownMode("staging".to_string()))
        );
    }

    #[test]
    fn port_precedence() {
        assert_eq!(resolve_port(Some(9000), Some("8080")), Ok(9000));
        assert_eq!(resolve_port(None, Some("8080")), Ok(8080));
        assert_eq!(resolve_port(None, None), Ok(DEFAULT_PORT));
        assert!(resolve_port(None, Some("eighty")).is_err());
    }

    #[test]
    fn development_binds_locally() {
        let config = ServeConfig {
            mode: ServeMode::Development,
            port: 8050,
        };
        assert_eq!(config.addr().to_string(), "127.0.0.1:8050");
        assert_eq!(ServeMode::Production.log_directive(), "info");
    }
}
