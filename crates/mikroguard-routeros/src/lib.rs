//! RouterOS-facing layer of the MikroGuard portal: REST transport, peer
//! repository, IP allocation, expiry sweeping, and the in-memory template
//! store.
//!
//! The router is the sole system of record. There is no local cache or
//! database; every read fetches the live peer list, and every write first
//! resolves the router's opaque record id by peer name.

pub mod alloc;
pub mod client;
pub mod peers;
pub mod settings;
pub mod sweep;
pub mod template;
pub mod wire;
