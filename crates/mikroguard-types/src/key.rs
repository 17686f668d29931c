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

//! WireGuard key helpers: format validation and X25519 keypair generation.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};

/// Length of a base64-encoded WireGuard key.
pub const KEY_B64_LEN: usize = 44;

/// Length of a raw Curve25519 key in bytes.
pub const KEY_RAW_LEN: usize = 32;

/// Check a WireGuard public key: exactly 44 base64 characters decoding to
/// exactly 32 bytes.
///
/// This is the sole gate at every mutation boundary. No point-on-curve
/// validation is performed; the wire format only requires the length.
pub fn is_valid_public_key(key: &str) -> bool {
    if key.len() != KEY_B64_LEN {
        return false;
    }
    match BASE64.decode(key) {
        Ok(raw) => raw.len() == KEY_RAW_LEN,
        Err(_) => false,
    }
}

/// A freshly generated WireGuard keypair, base64-encoded.
#[derive(Debug, Clone)]
pub struct KeyPair {
    /// Private half. Never leaves the machine that generated it.
    pub private_key: String,
    /// Public half, suitable for peer provisioning.
    pub public_key: String,
}

/// Generate an X25519 keypair.
///
/// The portal itself never calls this on a user's behalf; provisioning takes
/// a client-supplied public key. Generation exists for operators producing a
/// keypair locally.
pub fn generate_keypair() -> KeyPair {
    let secret = StaticSecret::random_from_rng(&mut OsRng);
    let public = PublicKey::from(&secret);

    KeyPair {
        private_key: BASE64.encode(secret.to_bytes()),
        public_key: BASE64.encode(public.as_bytes()),
    }
}
