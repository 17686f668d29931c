use std::env;
use std::str::FromStr;

use ipnetwork::Ipv4Network;
use thiserror::Error;

use mikroguard_types::{key, ConfigTemplate};

/// Runtime settings for the RouterOS layer, read from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub router: RouterSettings,
    pub wireguard: WireGuardSettings,
}

/// How to reach the router's REST endpoint.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub use_tls: bool,
    /// Routers commonly serve self-signed certificates; opt in explicitly.
    pub accept_invalid_certs: bool,
}

/// The managed interface and peer provisioning defaults.
#[derive(Debug, Clone)]
pub struct WireGuardSettings {
    pub interface: String,
    pub subnet: Ipv4Network,
    pub dns: String,
    pub allowed_ips: Vec<String>,
    pub endpoint: String,
    pub persistent_keepalive: u16,
    pub expiration_days: i64,
    /// Used when the router cannot report its own interface key.
    pub server_public_key: Option<String>,
    pub allocation: AllocationSettings,
}

/// Host-number scan range and address suffix for IP allocation.
#[derive(Debug, Clone)]
pub struct AllocationSettings {
    pub start: u8,
    pub end: u8,
    pub suffix: String,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing required environment variable: {var}")]
    MissingEnvVar { var: &'static str },

    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: &'static str, message: String },
}

fn parse_var<T>(raw: Option<String>, var: &'static str, default: T) -> Result<T, SettingsError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.parse().map_err(|e: T::Err| SettingsError::InvalidValue {
            var,
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

impl Settings {
    /// Load settings from process environment variables.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let get = |var: &'static str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require =
            |var: &'static str| get(var).ok_or(SettingsError::MissingEnvVar { var });

        let router = RouterSettings {
            host: require("ROUTEROS_HOST")?,
            port: parse_var(get("ROUTEROS_PORT"), "ROUTEROS_PORT", 8080)?,
            username: require("ROUTEROS_USERNAME")?,
            password: require("ROUTEROS_PASSWORD")?,
            use_tls: get("ROUTEROS_USE_TLS").is_some_and(|v| v == "true"),
            accept_invalid_certs: get("ROUTEROS_ACCEPT_INVALID_CERTS")
                .is_some_and(|v| v == "true"),
        };

        let subnet: Ipv4Network = parse_var(
            get("WG_SUBNET"),
            "WG_SUBNET",
            "10.10.10.0/24".parse().unwrap(),
        )?;

        let allowed_ips = match get("WG_DEFAULT_ALLOWED_IPS") {
            Some(raw) => raw
                .split(',')
                .map(|ip| ip.trim().to_string())
                .filter(|ip| !ip.is_empty())
                .collect(),
            None => vec!["0.0.0.0/0".to_string()],
        };

        let expiration_days: i64 =
            parse_var(get("WG_EXPIRATION_DAYS"), "WG_EXPIRATION_DAYS", 90)?;
        if expiration_days < 1 {
            return Err(SettingsError::InvalidValue {
                var: "WG_EXPIRATION_DAYS",
                message: "must be at least 1".to_string(),
            });
        }

        let server_public_key = get("WG_SERVER_PUBLIC_KEY");
        if let Some(ref key) = server_public_key {
            if !key::is_valid_public_key(key) {
                return Err(SettingsError::InvalidValue {
                    var: "WG_SERVER_PUBLIC_KEY",
                    message: "not a 44-character base64 key".to_string(),
                });
            }
        }

        let allocation = AllocationSettings {
            start: parse_var(get("WG_IP_START"), "WG_IP_START", 2)?,
            end: parse_var(get("WG_IP_END"), "WG_IP_END", 254)?,
            suffix: get("WG_IP_CIDR_SUFFIX").unwrap_or_else(|| "/32".to_string()),
        };
        if allocation.start < 2 || allocation.end > 254 || allocation.start > allocation.end {
            return Err(SettingsError::InvalidValue {
                var: "WG_IP_START",
                message: format!(
                    "scan range {}..={} must lie within 2..=254",
                    allocation.start, allocation.end
                ),
            });
        }

        let wireguard = WireGuardSettings {
            interface: get("WG_INTERFACE_NAME").unwrap_or_else(|| "wireguard1".to_string()),
            subnet,
            dns: get("WG_DNS").unwrap_or_else(|| "1.1.1.1".to_string()),
            allowed_ips,
            endpoint: require("WG_ENDPOINT")?,
            persistent_keepalive: parse_var(
                get("WG_PERSISTENT_KEEPALIVE"),
                "WG_PERSISTENT_KEEPALIVE",
                25,
            )?,
            expiration_days,
            server_public_key,
            allocation,
        };

        Ok(Self { router, wireguard })
    }
}

impl WireGuardSettings {
    /// Default connection template seeded from static configuration.
    pub fn default_template(&self) -> ConfigTemplate {
        ConfigTemplate {
            dns: self.dns.clone(),
            allowed_ips: self.allowed_ips.clone(),
            endpoint: self.endpoint.clone(),
            persistent_keepalive: self.persistent_keepalive,
        }
    }
}
