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

//! Raw RouterOS REST record shapes.
//!
//! RouterOS returns string-keyed records with kebab-case field names,
//! `.id`-style internal ids, and booleans spelled `"true"`/`"false"`. The
//! shapes here are strict: a record missing its id fails deserialization
//! outright instead of being patched over.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A peer record as returned by `GET /interface/wireguard/peers`.
#[derive(Debug, Clone, Deserialize)]
pub struct PeerRecord {
    #[serde(rename = ".id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub interface: String,
    #[serde(rename = "public-key", default)]
    pub public_key: String,
    #[serde(rename = "allowed-address", default)]
    pub allowed_address: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default, deserialize_with = "routeros_bool")]
    pub disabled: bool,
}

/// A WireGuard interface record from `GET /interface/wireguard`.
#[derive(Debug, Clone, Deserialize)]
pub struct InterfaceRecord {
    pub name: String,
    #[serde(rename = "public-key", default)]
    pub public_key: String,
}

/// Body for `PUT /interface/wireguard/peers`. The router creates the peer
/// enabled; `disabled` is not part of the creation surface.
#[derive(Debug, Serialize)]
pub struct NewPeer<'a> {
    pub interface: &'a str,
    pub name: &'a str,
    #[serde(rename = "public-key")]
    pub public_key: &'a str,
    #[serde(rename = "allowed-address")]
    pub allowed_address: &'a str,
    pub comment: &'a str,
}

/// Partial body for `PATCH /interface/wireguard/peers/{id}`. Unset fields
/// are omitted and keep their router-side value.
#[derive(Debug, Default, Serialize)]
pub struct PeerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "opt_routeros_bool"
    )]
    pub disabled: Option<bool>,
    #[serde(rename = "public-key", skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

fn routeros_bool<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Str(String),
    }
    match Raw::deserialize(de)? {
        Raw::Bool(b) => Ok(b),
        Raw::Str(s) => Ok(matches!(s.as_str(), "true" | "yes")),
    }
}

fn opt_routeros_bool<S: Serializer>(value: &Option<bool>, ser: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(true) => ser.serialize_str("true"),
        Some(false) => ser.serialize_str("false"),
        None => ser.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_LIST: &str = r#"[
        {".id":"*6","name":"alice","interface":"wireguard1",
         "public-key":"YWFhYWFhYWFhYWFhYWFhYWFhYWFhYWFhYWFhYWFhYWE=",
         "allowed-address":"10.10.10.2/32","comment":"ttl-1700000000","disabled":"true"},
        {".id":"*7","name":"bob","interface":"wireguard1",
         "public-key":"YmJiYmJiYmJiYmJiYmJiYmJiYmJiYmJiYmJiYmJiYmI=",
         "allowed-address":"10.10.10.3/32","disabled":"false"}
    ]"#;

    #[test]
    fn deserializes_router_peer_list() {
        let records: Vec<PeerRecord> = serde_json::from_str(SAMPLE_LIST).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "*6");
        assert_eq!(records[0].allowed_address, "10.10.10.2/32");
        assert!(records[0].disabled);
        assert!(!records[1].disabled);
        assert_eq!(records[1].comment, "", "absent comment defaults to empty");
    }

    #[test]
    fn json_booleans_are_accepted_too() {
        let record: PeerRecord = serde_json::from_str(
            r#"{".id":"*1","name":"x","interface":"wireguard1","disabled":true}"#,
        )
        .unwrap();
        assert!(record.disabled);
    }

    #[test]
    fn record_without_id_is_rejected() {
        let result: Result<PeerRecord, _> =
            serde_json::from_str(r#"{"name":"x","interface":"wireguard1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn record_without_interface_is_rejected() {
        let result: Result<PeerRecord, _> = serde_json::from_str(r#"{".id":"*1","name":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn new_peer_serializes_router_field_names() {
        let body = serde_json::to_value(NewPeer {
            interface: "wireguard1",
            name: "alice",
            public_key: "k",
            allowed_address: "10.10.10.2/32",
            comment: "ttl-1700000000",
        })
        .unwrap();
        assert_eq!(body["interface"], "wireguard1");
        assert_eq!(body["public-key"], "k");
        assert_eq!(body["allowed-address"], "10.10.10.2/32");
        assert_eq!(body["comment"], "ttl-1700000000");
    }

    #[test]
    fn patch_omits_unset_fields() {
        let body = serde_json::to_value(PeerPatch {
            disabled: Some(false),
            ..PeerPatch::default()
        })
        .unwrap();
        assert_eq!(body["disabled"], "false");
        assert!(body.get("comment").is_none());
        assert!(body.get("public-key").is_none());
    }

    #[test]
    fn patch_spells_booleans_as_strings() {
        let body = serde_json::to_value(PeerPatch {
            disabled: Some(true),
            ..PeerPatch::default()
        })
        .unwrap();
        assert_eq!(body["disabled"], "true");
    }

    #[test]
    fn interface_record_maps_public_key() {
        let records: Vec<InterfaceRecord> = serde_json::from_str(
            r#"[{"name":"wireguard1","public-key":"ServerKey="},{"name":"wg-other"}]"#,
        )
        .unwrap();
        assert_eq!(records[0].public_key, "ServerKey=");
        assert_eq!(records[1].public_key, "");
    }
}
