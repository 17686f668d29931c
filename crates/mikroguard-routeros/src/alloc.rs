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

//! Tunnel address allocation: ascending scan over the subnet's host range.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;
use thiserror::Error;

use crate::settings::AllocationSettings;

/// Every host number in the configured scan range is taken.
#[derive(Debug, Error)]
#[error("no available addresses in subnet {subnet}")]
pub struct NoAddressAvailable {
    pub subnet: Ipv4Network,
}

/// First free address in the subnet's scan range, as `a.b.c.h<suffix>`.
///
/// Host numbers are scanned in ascending order over `[start, end]`; the
/// first candidate absent from `used` wins. There is no reservation step, so
/// callers must serialize scan + create themselves (`PeerStore::provision`
/// does).
pub fn next_available_address(
    subnet: Ipv4Network,
    allocation: &AllocationSettings,
    used: &HashSet<Ipv4Addr>,
) -> Result<String, NoAddressAvailable> {
    let [a, b, c, _] = subnet.network().octets();

    for host in allocation.start..=allocation.end {
        let candidate = Ipv4Addr::new(a, b, c, host);
        if !used.contains(&candidate) {
            return Ok(format!("{candidate}{}", allocation.suffix));
        }
    }

    Err(NoAddressAvailable { subnet })
}

/// Build the used-address set from peer `allowed-address` values, stripping
/// the suffix. Unparsable entries are ignored.
pub fn used_addresses<'a>(addresses: impl IntoIterator<Item = &'a str>) -> HashSet<Ipv4Addr> {
    addresses
        .into_iter()
        .filter_map(|address| address.split('/').next().and_then(|ip| ip.parse().ok()))
        .collect()
}
