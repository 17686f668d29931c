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

//! Expiration sweep: disable peers whose derived expiry has passed.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use mikroguard_types::Peer;

use crate::peers::{PeerStore, PeerStoreError};

/// Disable every enabled peer whose expiry has passed, returning the
/// usernames actually disabled.
///
/// A failure on one peer is logged and skipped so the rest of the sweep
/// still runs; there is no retry. A failure to list peers at all aborts the
/// sweep.
#[tracing::instrument(skip(store))]
pub async fn disable_expired(store: &PeerStore) -> Result<Vec<String>, PeerStoreError> {
    let peers = store.list_all().await?;
    let now = Utc::now();

    let mut disabled = Vec::new();
    for peer in expired_candidates(&peers, now) {
        match store.disable(&peer.name).await {
            Ok(()) => {
                info!(peer = %peer.name, expired_at = %peer.expires_at, "disabled expired peer");
                disabled.push(peer.name.clone());
            }
            Err(e) => {
                warn!(peer = %peer.name, error = %e, "failed to disable expired peer, skipping");
            }
        }
    }

    info!(count = disabled.len(), "expiration sweep complete");
    Ok(disabled)
}

/// Enabled peers whose expiry is in the past. Already-disabled peers are
/// left untouched no matter how stale.
fn expired_candidates(peers: &[Peer], now: DateTime<Utc>) -> impl Iterator<Item = &Peer> {
    peers.iter().filter(move |p| !p.disabled && p.is_expired(now))
}
