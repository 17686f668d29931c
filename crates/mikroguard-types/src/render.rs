// Copyright (C) 2025 Joseph Sacchini
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU Affero General Public License as published by the Free
// Software Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more
// details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Client configuration file rendering.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::ConfigTemplate;

/// Emitted in place of a private key when none was supplied. The portal
/// never holds a user's private key; users paste their own before importing
/// the file.
pub const PRIVATE_KEY_PLACEHOLDER: &str = "YOUR_PRIVATE_KEY_HERE";

/// Everything needed to render one client-side configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Client private key, or [`PRIVATE_KEY_PLACEHOLDER`].
    pub private_key: String,
    /// Tunnel address assigned to this peer.
    pub address: String,
    /// DNS server for the tunnel.
    pub dns: String,
    /// Public key of the router's WireGuard interface.
    pub server_public_key: String,
    /// Destination ranges tunneled by the client.
    pub allowed_ips: Vec<String>,
    /// Router endpoint as `host:port`.
    pub endpoint: String,
    /// Keepalive interval in seconds.
    pub persistent_keepalive: u16,
}

impl ClientConfig {
    /// Fill a config from template defaults for a peer's assigned address.
    ///
    /// The private key is left as the placeholder; only the caller may
    /// substitute a real one.
    pub fn from_template(
        template: &ConfigTemplate,
        address: impl Into<String>,
        server_public_key: impl Into<String>,
    ) -> Self {
        Self {
            private_key: PRIVATE_KEY_PLACEHOLDER.to_string(),
            address: address.into(),
            dns: template.dns.clone(),
            server_public_key: server_public_key.into(),
            allowed_ips: template.allowed_ips.clone(),
            endpoint: template.endpoint.clone(),
            persistent_keepalive: template.persistent_keepalive,
        }
    }

    /// Render the standard two-section client configuration file.
    ///
    /// Identical fields always produce byte-identical output, section
    /// headers and field order included.
    pub fn render(&self) -> String {
        let mut out = String::new();
        writeln!(out, "[Interface]").unwrap();
        writeln!(out, "PrivateKey = {}", self.private_key).unwrap();
        writeln!(out, "Address = {}", self.address).unwrap();
        writeln!(out, "DNS = {}", self.dns).unwrap();
        writeln!(out).unwrap();
        writeln!(out, "[Peer]").unwrap();
        writeln!(out, "PublicKey = {}", self.server_public_key).unwrap();
        writeln!(out, "AllowedIPs = {}", self.allowed_ips.join(", ")).unwrap();
        writeln!(out, "Endpoint = {}", self.endpoint).unwrap();
        writeln!(out, "PersistentKeepalive = {}", self.persistent_keepalive).unwrap();
        out
    }
}
