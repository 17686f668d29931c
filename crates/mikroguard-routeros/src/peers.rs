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

//! Peer CRUD against the router, scoped to one managed interface.

use chrono::{DateTime, Duration, Utc};
use ipnetwork::Ipv4Network;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use mikroguard_types::{key, Peer};

use crate::alloc::{self, NoAddressAvailable};
use crate::client::{RestClient, RouterError};
use crate::settings::{AllocationSettings, WireGuardSettings};
use crate::wire::{InterfaceRecord, NewPeer, PeerPatch, PeerRecord};

const PEERS_PATH: &str = "/interface/wireguard/peers";
const INTERFACES_PATH: &str = "/interface/wireguard";

#[derive(Debug, Error)]
pub enum PeerStoreError {
    #[error(transparent)]
    Router(#[from] RouterError),

    #[error("peer not found")]
    NotFound,

    #[error("a peer already exists for this user")]
    AlreadyExists,

    #[error("public key must be 44 base64 characters decoding to 32 bytes")]
    InvalidPublicKey,

    #[error(transparent)]
    NoAddressAvailable(#[from] NoAddressAvailable),
}

/// Peer repository backed directly by the router.
///
/// The router indexes records by an opaque id, not by name, so every write
/// is at least two round trips: find the record, then mutate it. Reads map
/// raw records into [`Peer`], deriving expiry from the `ttl-` comment.
pub struct PeerStore {
    client: RestClient,
    interface: String,
    subnet: Ipv4Network,
    expiration_days: i64,
    allocation: AllocationSettings,
    fallback_public_key: Option<String>,
    create_lock: Mutex<()>,
}

impl PeerStore {
    pub fn new(client: RestClient, settings: &WireGuardSettings) -> Self {
        Self {
            client,
            interface: settings.interface.clone(),
            subnet: settings.subnet,
            expiration_days: settings.expiration_days,
            allocation: settings.allocation.clone(),
            fallback_public_key: settings.server_public_key.clone(),
            create_lock: Mutex::new(()),
        }
    }

    /// All peers on the managed interface. Peers belonging to other
    /// interfaces on the same router are filtered out.
    #[tracing::instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Peer>, PeerStoreError> {
        let records = self.fetch_records().await?;
        let now = Utc::now();
        Ok(records
            .into_iter()
            .map(|record| peer_from_record(record, self.expiration_days, now))
            .collect())
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Peer>, PeerStoreError> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .find(|peer| peer.name == username))
    }

    /// Create a peer with a caller-chosen address. Rejects usernames that
    /// already have a peer; the router creates the record enabled.
    #[tracing::instrument(skip(self, public_key))]
    pub async fn create(
        &self,
        username: &str,
        public_key: &str,
        allowed_address: &str,
    ) -> Result<Peer, PeerStoreError> {
        if !key::is_valid_public_key(public_key) {
            return Err(PeerStoreError::InvalidPublicKey);
        }
        let records = self.fetch_records().await?;
        if records.iter().any(|r| r.name == username) {
            return Err(PeerStoreError::AlreadyExists);
        }
        self.create_unchecked(username, public_key, allowed_address)
            .await
    }

    /// Allocate the next free address and create the peer in one step.
    ///
    /// Creations are serialized through a lock held across scan + create, so
    /// two concurrent calls cannot claim the same address.
    #[tracing::instrument(skip(self, public_key))]
    pub async fn provision(
        &self,
        username: &str,
        public_key: &str,
    ) -> Result<Peer, PeerStoreError> {
        if !key::is_valid_public_key(public_key) {
            return Err(PeerStoreError::InvalidPublicKey);
        }

        let _guard = self.create_lock.lock().await;

        let records = self.fetch_records().await?;
        if records.iter().any(|r| r.name == username) {
            return Err(PeerStoreError::AlreadyExists);
        }

        let used = alloc::used_addresses(records.iter().map(|r| r.allowed_address.as_str()));
        let address = alloc::next_available_address(self.subnet, &self.allocation, &used)?;

        self.create_unchecked(username, public_key, &address).await
    }

    async fn create_unchecked(
        &self,
        username: &str,
        public_key: &str,
        allowed_address: &str,
    ) -> Result<Peer, PeerStoreError> {
        let now = Utc::now();
        let expires_at = now + Duration::days(self.expiration_days);
        let comment = ttl_comment(expires_at);

        let record: PeerRecord = self
            .client
            .put(
                PEERS_PATH,
                &NewPeer {
                    interface: &self.interface,
                    name: username,
                    public_key,
                    allowed_address,
                    comment: &comment,
                },
            )
            .await?;

        info!(peer = %username, address = %allowed_address, expires_at = %expires_at, "created peer");
        Ok(peer_from_record(record, self.expiration_days, now))
    }

    /// Push the expiry out by the configured interval and re-enable the
    /// peer. Renewal always clears a disabled state.
    #[tracing::instrument(skip(self))]
    pub async fn renew(&self, username: &str) -> Result<(), PeerStoreError> {
        let record = self.find_record(username).await?;
        let expires_at = Utc::now() + Duration::days(self.expiration_days);

        self.client
            .patch(
                &peer_path(&record.id),
                &PeerPatch {
                    comment: Some(ttl_comment(expires_at)),
                    disabled: Some(false),
                    ..PeerPatch::default()
                },
            )
            .await?;

        info!(peer = %username, expires_at = %expires_at, "renewed peer");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn disable(&self, username: &str) -> Result<(), PeerStoreError> {
        self.set_disabled(username, true).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn enable(&self, username: &str) -> Result<(), PeerStoreError> {
        self.set_disabled(username, false).await
    }

    async fn set_disabled(&self, username: &str, disabled: bool) -> Result<(), PeerStoreError> {
        let record = self.find_record(username).await?;
        self.client
            .patch(
                &peer_path(&record.id),
                &PeerPatch {
                    disabled: Some(disabled),
                    ..PeerPatch::default()
                },
            )
            .await?;
        info!(peer = %username, disabled, "updated peer state");
        Ok(())
    }

    /// Replace the peer's public key. Expiry and disabled state are left
    /// untouched.
    #[tracing::instrument(skip(self, public_key))]
    pub async fn update_public_key(
        &self,
        username: &str,
        public_key: &str,
    ) -> Result<(), PeerStoreError> {
        if !key::is_valid_public_key(public_key) {
            return Err(PeerStoreError::InvalidPublicKey);
        }
        let record = self.find_record(username).await?;
        self.client
            .patch(
                &peer_path(&record.id),
                &PeerPatch {
                    public_key: Some(public_key.to_string()),
                    ..PeerPatch::default()
                },
            )
            .await?;
        info!(peer = %username, "replaced peer public key");
        Ok(())
    }

    /// Remove the peer record entirely. Deleting an absent peer surfaces
    /// `NotFound`; this is not idempotent.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, username: &str) -> Result<(), PeerStoreError> {
        let record = self.find_record(username).await?;
        self.client.delete(&peer_path(&record.id)).await?;
        info!(peer = %username, "deleted peer");
        Ok(())
    }

    /// Public key of the managed interface itself, for client configs.
    ///
    /// Falls back to the statically configured key when the router cannot
    /// provide one and a fallback exists.
    #[tracing::instrument(skip(self))]
    pub async fn server_public_key(&self) -> Result<String, PeerStoreError> {
        match self.fetch_interface_key().await {
            Ok(key) => Ok(key),
            Err(e) => match &self.fallback_public_key {
                Some(key) => {
                    warn!(error = %e, "router interface key lookup failed, using configured key");
                    Ok(key.clone())
                }
                None => Err(e),
            },
        }
    }

    async fn fetch_interface_key(&self) -> Result<String, PeerStoreError> {
        let interfaces: Vec<InterfaceRecord> = self.client.get(INTERFACES_PATH).await?;
        interfaces
            .into_iter()
            .find(|i| i.name == self.interface)
            .map(|i| i.public_key)
            .ok_or(PeerStoreError::NotFound)
    }

    async fn fetch_records(&self) -> Result<Vec<PeerRecord>, PeerStoreError> {
        let records: Vec<PeerRecord> = self.client.get(PEERS_PATH).await?;
        let total = records.len();
        let records: Vec<PeerRecord> = records
            .into_iter()
            .filter(|r| r.interface == self.interface)
            .collect();
        debug!(interface = %self.interface, matched = records.len(), total, "fetched peer records");
        Ok(records)
    }

    async fn find_record(&self, username: &str) -> Result<PeerRecord, PeerStoreError> {
        self.fetch_records()
            .await?
            .into_iter()
            .find(|r| r.name == username)
            .ok_or(PeerStoreError::NotFound)
    }
}

fn peer_path(id: &str) -> String {
    format!("{PEERS_PATH}/{id}")
}

fn peer_from_record(record: PeerRecord, expiration_days: i64, now: DateTime<Utc>) -> Peer {
    let expires_at = parse_ttl_comment(&record.comment).unwrap_or_else(|| {
        if !record.comment.is_empty() {
            debug!(peer = %record.name, comment = %record.comment, "comment carries no ttl, using default expiry");
        }
        now + Duration::days(expiration_days)
    });

    Peer {
        name: record.name,
        public_key: record.public_key,
        allowed_address: record.allowed_address,
        comment: record.comment,
        disabled: record.disabled,
        // The router keeps no creation time.
        created_at: now,
        expires_at,
    }
}

/// Encode an expiry into the router comment field.
pub fn ttl_comment(expires_at: DateTime<Utc>) -> String {
    format!("ttl-{}", expires_at.timestamp())
}

/// Extract the first `ttl-<seconds>` marker from a comment, if any.
pub fn parse_ttl_comment(comment: &str) -> Option<DateTime<Utc>> {
    let start = comment.find("ttl-")? + "ttl-".len();
    let digits: &str = comment[start..]
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .unwrap_or("");
    let seconds: i64 = digits.parse().ok()?;
    DateTime::from_timestamp(seconds, 0)
}
