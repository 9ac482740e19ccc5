use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::error::ExplorerError;

/// Decoded payload size: two version bytes followed by a 20 byte hash
const PAYLOAD_LEN: usize = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    PubKeyHash,
    ScriptHash,
}

/// Version prefixes accepted on one network
#[derive(Debug)]
pub struct NetworkParams {
    pub name: &'static str,
    pub prefixes: &'static [([u8; 2], AddressKind)],
}

pub static MAINNET: NetworkParams = NetworkParams {
    name: "mainnet",
    prefixes: &[
        ([0x20, 0x89], AddressKind::PubKeyHash),
        ([0x20, 0x96], AddressKind::ScriptHash),
        // legacy t1 / t3
        ([0x1c, 0xb8], AddressKind::PubKeyHash),
        ([0x1c, 0xbd], AddressKind::ScriptHash),
    ],
};

pub static TESTNET: NetworkParams = NetworkParams {
    name: "testnet",
    prefixes: &[
        ([0x20, 0x98], AddressKind::PubKeyHash),
        ([0x20, 0x92], AddressKind::ScriptHash),
        // legacy tm / t2
        ([0x1d, 0x25], AddressKind::PubKeyHash),
        ([0x1c, 0xba], AddressKind::ScriptHash),
    ],
};

static NETWORKS: Lazy<HashMap<&'static str, &'static NetworkParams>> = Lazy::new(|| {
    [("mainnet", &MAINNET), ("livenet", &MAINNET), ("testnet", &TESTNET)]
        .into_iter()
        .collect()
});

impl NetworkParams {
    /// Look a network up by its configured name
    pub fn from_name(name: &str) -> Option<&'static NetworkParams> {
        NETWORKS.get(name).copied()
    }

    fn kind_of(&self, version: [u8; 2]) -> Option<AddressKind> {
        self.prefixes
            .iter()
            .find(|(prefix, _)| *prefix == version)
            .map(|(_, kind)| *kind)
    }

    /// Preferred (non-legacy) prefix for a kind
    pub fn prefix_for(&self, kind: AddressKind) -> [u8; 2] {
        self.prefixes
            .iter()
            .find(|(_, k)| *k == kind)
            .map(|(prefix, _)| *prefix)
            .unwrap_or(self.prefixes[0].0)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AddressParseError {
    #[error("Address is empty")]
    Empty,
    #[error("{0}")]
    Base58(String),
    #[error("Invalid address length")]
    InvalidLength(usize),
    #[error("Address has mismatched network type.")]
    NetworkMismatch,
    #[error("Address has invalid version prefix")]
    UnknownVersion,
}

/// A structurally valid address for one network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    text: String,
    kind: AddressKind,
    hash: [u8; 20],
}

impl Address {
    pub fn parse(input: &str, network: &NetworkParams) -> Result<Self, AddressParseError> {
        if input.is_empty() {
            return Err(AddressParseError::Empty);
        }

        let payload = bs58::decode(input)
            .with_check(None)
            .into_vec()
            .map_err(|e| AddressParseError::Base58(e.to_string()))?;

        if payload.len() != PAYLOAD_LEN {
            return Err(AddressParseError::InvalidLength(payload.len()));
        }

        let version = [payload[0], payload[1]];
        let kind = match network.kind_of(version) {
            Some(kind) => kind,
            None => {
                let known_elsewhere = NETWORKS
                    .values()
                    .any(|other| other.name != network.name && other.kind_of(version).is_some());
                return Err(if known_elsewhere {
                    AddressParseError::NetworkMismatch
                } else {
                    AddressParseError::UnknownVersion
                });
            }
        };

        let mut hash = [0u8; 20];
        hash.copy_from_slice(&payload[2..]);

        Ok(Self {
            text: input.to_string(),
            kind,
            hash,
        })
    }

    /// Build the canonical encoding of a hash on the given network
    pub fn from_hash(kind: AddressKind, hash: [u8; 20], network: &NetworkParams) -> Self {
        let mut payload = network.prefix_for(kind).to_vec();
        payload.extend_from_slice(&hash);
        let text = bs58::encode(payload).with_check().into_string();
        Self { text, kind, hash }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    pub fn hash(&self) -> &[u8; 20] {
        &self.hash
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

/// Split a comma-delimited address list. Empty entries are kept so validation can reject them.
pub fn split_addresses(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

/// Gate for every address-bearing request
#[derive(Debug, Clone, Copy)]
pub struct AddressValidator {
    network: &'static NetworkParams,
}

impl AddressValidator {
    pub fn new(network: &'static NetworkParams) -> Self {
        Self { network }
    }

    pub fn network(&self) -> &'static NetworkParams {
        self.network
    }

    /// Validate every entry, failing on the first malformed one
    pub fn validate(&self, inputs: &[String]) -> Result<Vec<Address>, ExplorerError> {
        match inputs.first() {
            None => return Err(ExplorerError::MissingAddress),
            Some(first) if first.is_empty() => return Err(ExplorerError::MissingAddress),
            Some(_) => {}
        }

        inputs
            .iter()
            .map(|input| {
                Address::parse(input, self.network)
                    .map_err(|e| ExplorerError::InvalidAddress(e.to_string()))
            })
            .collect()
    }

    pub fn validate_one(&self, input: &str) -> Result<Address, ExplorerError> {
        let mut addresses = self.validate(&[input.to_string()])?;
        Ok(addresses.remove(0))
    }

    /// Split a comma-delimited list and validate it
    pub fn validate_list(&self, raw: &str) -> Result<Vec<Address>, ExplorerError> {
        self.validate(&split_addresses(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mainnet_address(seed: u8) -> String {
        Address::from_hash(AddressKind::PubKeyHash, [seed; 20], &MAINNET).to_string()
    }

    #[test]
    fn test_roundtrip_through_parser() {
        let text = mainnet_address(7);
        assert!(text.starts_with("zn"));

        let parsed = Address::parse(&text, &MAINNET).unwrap();
        assert_eq!(parsed.kind(), AddressKind::PubKeyHash);
        assert_eq!(parsed.hash(), &[7u8; 20]);
        assert_eq!(parsed.as_str(), text);
    }

    #[test]
    fn test_script_hash_prefix() {
        let text = Address::from_hash(AddressKind::ScriptHash, [1; 20], &MAINNET).to_string();
        assert!(text.starts_with("zs"));
        assert_eq!(Address::parse(&text, &MAINNET).unwrap().kind(), AddressKind::ScriptHash);
    }

    #[test]
    fn test_legacy_prefix_accepted() {
        let mut payload = vec![0x1c, 0xb8];
        payload.extend_from_slice(&[3u8; 20]);
        let legacy = bs58::encode(payload).with_check().into_string();
        assert!(legacy.starts_with("t1"));

        let parsed = Address::parse(&legacy, &MAINNET).unwrap();
        assert_eq!(parsed.kind(), AddressKind::PubKeyHash);
    }

    #[test]
    fn test_network_mismatch() {
        let testnet = Address::from_hash(AddressKind::PubKeyHash, [2; 20], &TESTNET).to_string();
        assert_eq!(
            Address::parse(&testnet, &MAINNET).unwrap_err(),
            AddressParseError::NetworkMismatch
        );
    }

    #[test]
    fn test_bad_checksum_and_characters() {
        let mut text = mainnet_address(9);
        let last = text.pop().unwrap();
        text.push(if last == '1' { '2' } else { '1' });
        assert!(matches!(Address::parse(&text, &MAINNET), Err(AddressParseError::Base58(_))));

        assert!(matches!(Address::parse("zn0OIl", &MAINNET), Err(AddressParseError::Base58(_))));
    }

    #[test]
    fn test_wrong_length() {
        let short = bs58::encode(vec![0x20, 0x89, 1, 2, 3]).with_check().into_string();
        assert_eq!(
            Address::parse(&short, &MAINNET).unwrap_err(),
            AddressParseError::InvalidLength(5)
        );
    }

    #[test]
    fn test_split_keeps_empty_entries() {
        assert_eq!(split_addresses("a,,b"), vec!["a", "", "b"]);
        assert_eq!(split_addresses(""), vec![""]);
        assert_eq!(split_addresses("a"), vec!["a"]);
    }

    #[test]
    fn test_validator_missing_address() {
        let validator = AddressValidator::new(&MAINNET);
        assert!(matches!(validator.validate(&[]), Err(ExplorerError::MissingAddress)));
        assert!(matches!(validator.validate_list(""), Err(ExplorerError::MissingAddress)));
        assert!(matches!(
            validator.validate_list(&format!(",{}", mainnet_address(1))),
            Err(ExplorerError::MissingAddress)
        ));
    }

    #[test]
    fn test_validator_rejects_empty_middle_entry() {
        let validator = AddressValidator::new(&MAINNET);
        let raw = format!("{},,{}", mainnet_address(1), mainnet_address(2));
        match validator.validate_list(&raw) {
            Err(ExplorerError::InvalidAddress(detail)) => assert_eq!(detail, "Address is empty"),
            other => panic!("expected InvalidAddress, got {:?}", other),
        }
    }

    #[test]
    fn test_validator_rejects_whole_list_on_one_bad_entry() {
        let validator = AddressValidator::new(&MAINNET);
        let raw = format!("{},notanaddress,{}", mainnet_address(1), mainnet_address(2));
        let err = validator.validate_list(&raw).unwrap_err();
        assert!(err.to_string().starts_with("Invalid address: "));
    }

    #[test]
    fn test_validator_preserves_order() {
        let validator = AddressValidator::new(&MAINNET);
        let a = mainnet_address(1);
        let b = mainnet_address(2);
        let parsed = validator.validate_list(&format!("{},{}", a, b)).unwrap();
        let texts: Vec<&str> = parsed.iter().map(Address::as_str).collect();
        assert_eq!(texts, vec![a.as_str(), b.as_str()]);
    }

    #[test]
    fn test_network_lookup() {
        assert_eq!(NetworkParams::from_name("mainnet").unwrap().name, "mainnet");
        assert_eq!(NetworkParams::from_name("livenet").unwrap().name, "mainnet");
        assert_eq!(NetworkParams::from_name("testnet").unwrap().name, "testnet");
        assert!(NetworkParams::from_name("regtest").is_none());
    }
}
