//! mikroguard-types: shared data model for the MikroGuard peer portal.
//!
//! Contains the peer and template records exchanged between the RouterOS
//! layer and its callers, plus the pure key-format and config-text helpers.

#![warn(missing_docs)]

pub mod key;
pub mod render;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One WireGuard peer on the managed router interface.
///
/// A peer corresponds 1:1 with a portal username (`name`). The router is the
/// sole system of record; this struct is rebuilt from the router's peer list
/// on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    /// Username this peer belongs to. Unique per interface.
    pub name: String,
    /// Base64-encoded Curve25519 public key, always 44 characters.
    pub public_key: String,
    /// The single tunnel address assigned to this peer, suffix included
    /// (e.g. `10.10.10.7/32`).
    pub allowed_address: String,
    /// Raw router comment. Carries the expiry as `ttl-<unix_seconds>`; any
    /// other content is tolerated.
    pub comment: String,
    /// Whether the router currently blocks this peer's traffic.
    pub disabled: bool,
    /// Synthesized as "now" at read time; the router keeps no creation time.
    pub created_at: DateTime<Utc>,
    /// Expiry derived from the comment, or defaulted when absent.
    pub expires_at: DateTime<Utc>,
}

impl Peer {
    /// True once the peer's derived expiry has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Process-wide default connection parameters, used to fill in the fields a
/// router peer record does not carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigTemplate {
    /// DNS server handed to clients.
    pub dns: String,
    /// Destination ranges clients tunnel (client-side `AllowedIPs`).
    pub allowed_ips: Vec<String>,
    /// Router endpoint as `host:port`.
    pub endpoint: String,
    /// `PersistentKeepalive` interval in seconds.
    pub persistent_keepalive: u16,
}

impl ConfigTemplate {
    /// Merge an update into this template; `None` fields keep their value.
    pub fn apply(&mut self, update: TemplateUpdate) {
        if let Some(dns) = update.dns {
            self.dns = dns;
        }
        if let Some(allowed_ips) = update.allowed_ips {
            self.allowed_ips = allowed_ips;
        }
        if let Some(endpoint) = update.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(persistent_keepalive) = update.persistent_keepalive {
            self.persistent_keepalive = persistent_keepalive;
        }
    }
}

/// Partial form of [`ConfigTemplate`] for admin updates and per-render
/// overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateUpdate {
    /// Replacement DNS server.
    pub dns: Option<String>,
    /// Replacement allowed-IP list.
    pub allowed_ips: Option<Vec<String>>,
    /// Replacement endpoint.
    pub endpoint: Option<String>,
    /// Replacement keepalive interval.
    pub persistent_keepalive: Option<u16>,
}
