use ripemd160::Ripemd160;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{ExplorerError, Result};
use crate::logging::LogContext;
use crate::models::{Address, AddressKind, NetworkParams};

const MESSAGE_MAGIC: &str = "Zcash Signed Message:\n";
const COMPACT_SIGNATURE_LEN: usize = 65;

/// Inputs of a verification request; any of them may be missing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyParams {
    pub address: Option<String>,
    pub signature: Option<String>,
    pub message: Option<String>,
}

impl VerifyParams {
    /// Body values win; the query fills whatever the body left out
    pub fn merge(body: VerifyParams, query: VerifyParams) -> VerifyParams {
        fn pick(body: Option<String>, query: Option<String>) -> Option<String> {
            body.filter(|v| !v.is_empty()).or(query)
        }

        VerifyParams {
            address: pick(body.address, query.address),
            signature: pick(body.signature, query.signature),
            message: pick(body.message, query.message),
        }
    }
}

/// Checks signed messages against P2PKH addresses
#[derive(Debug, Clone, Copy)]
pub struct MessageVerifier {
    network: &'static NetworkParams,
}

impl MessageVerifier {
    pub fn new(network: &'static NetworkParams) -> Self {
        Self { network }
    }

    pub fn verify(&self, params: &VerifyParams) -> Result<bool> {
        let (address, signature, message) = match (&params.address, &params.signature, &params.message) {
            (Some(a), Some(s), Some(m)) if !a.is_empty() && !s.is_empty() => (a, s, m),
            _ => return Err(ExplorerError::MissingParameter),
        };

        let valid = verify_signature(message, address, signature, self.network)?;

        LogContext::new("message", "verify")
            .with_address(address)
            .with_metadata("result", serde_json::json!(valid))
            .debug("Message signature checked");

        Ok(valid)
    }
}

/// Verify a base64 compact signature over `message` for `address`.
///
/// Malformed input is an error; a signature that does not recover to the
/// address key is `false`.
pub fn verify_signature(message: &str, address: &str, signature: &str, network: &NetworkParams) -> Result<bool> {
    let address = Address::parse(address, network).map_err(|e| ExplorerError::VerificationError(e.to_string()))?;
    if address.kind() != AddressKind::PubKeyHash {
        return Err(ExplorerError::VerificationError("Address does not refer to key".to_string()));
    }

    let signature =
        base64::decode(signature).map_err(|_| ExplorerError::VerificationError("Malformed base64 encoding".to_string()))?;
    if signature.len() != COMPACT_SIGNATURE_LEN {
        return Err(ExplorerError::VerificationError(format!(
            "Invalid signature length {}",
            signature.len()
        )));
    }

    let header = signature[0];
    if !(27..=34).contains(&header) {
        return Err(ExplorerError::VerificationError(format!(
            "Invalid signature header {}",
            header
        )));
    }

    let pubkey = match recover_pubkey(&signature, message) {
        Some(pubkey) => pubkey,
        None => return Ok(false),
    };
    Ok(hash160(&pubkey) == *address.hash())
}

fn recover_pubkey(signature: &[u8], message: &str) -> Option<Vec<u8>> {
    let header = signature[0] - 27;
    let compressed = header >= 4;
    let recovery_id = RecoveryId::from_i32(i32::from(header & 3)).ok()?;
    let signature = RecoverableSignature::from_compact(&signature[1..], recovery_id).ok()?;
    let digest = Message::from_slice(&signed_message_hash(message)).ok()?;

    let pubkey = Secp256k1::verification_only().recover_ecdsa(&digest, &signature).ok()?;
    Some(if compressed {
        pubkey.serialize().to_vec()
    } else {
        pubkey.serialize_uncompressed().to_vec()
    })
}

/// Double SHA-256 of the magic-prefixed message
pub fn signed_message_hash(message: &str) -> [u8; 32] {
    let mut payload = Vec::with_capacity(MESSAGE_MAGIC.len() + message.len() + 10);
    write_varstr(&mut payload, MESSAGE_MAGIC.as_bytes());
    write_varstr(&mut payload, message.as_bytes());

    let mut hash = [0u8; 32];
    hash.copy_from_slice(&Sha256::digest(&Sha256::digest(&payload)));
    hash
}

fn write_varstr(buf: &mut Vec<u8>, data: &[u8]) {
    let len = data.len() as u64;
    match len {
        0..=0xfc => buf.push(len as u8),
        0xfd..=0xffff => {
            buf.push(0xfd);
            buf.extend_from_slice(&(len as u16).to_le_bytes());
        }
        0x10000..=0xffff_ffff => {
            buf.push(0xfe);
            buf.extend_from_slice(&(len as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xff);
            buf.extend_from_slice(&len.to_le_bytes());
        }
    }
    buf.extend_from_slice(data);
}

fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&Ripemd160::digest(&sha));
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MAINNET, TESTNET};
    use secp256k1::{PublicKey, SecretKey};

    fn key() -> SecretKey {
        SecretKey::from_slice(&[0x42; 32]).unwrap()
    }

    fn address_for(secret: &SecretKey, compressed: bool, network: &NetworkParams) -> Address {
        let secp = Secp256k1::new();
        let pubkey = PublicKey::from_secret_key(&secp, secret);
        let serialized = if compressed {
            pubkey.serialize().to_vec()
        } else {
            pubkey.serialize_uncompressed().to_vec()
        };
        Address::from_hash(AddressKind::PubKeyHash, hash160(&serialized), network)
    }

    fn sign(secret: &SecretKey, compressed: bool, message: &str) -> String {
        let secp = Secp256k1::new();
        let digest = Message::from_slice(&signed_message_hash(message)).unwrap();
        let (recovery_id, compact) = secp.sign_ecdsa_recoverable(&digest, secret).serialize_compact();

        let mut bytes = vec![27 + recovery_id.to_i32() as u8 + if compressed { 4 } else { 0 }];
        bytes.extend_from_slice(&compact);
        base64::encode(bytes)
    }

    fn params(address: &str, signature: &str, message: &str) -> VerifyParams {
        VerifyParams {
            address: Some(address.to_string()),
            signature: Some(signature.to_string()),
            message: Some(message.to_string()),
        }
    }

    #[test]
    fn test_valid_signature_verifies() {
        let address = address_for(&key(), true, &MAINNET);
        let signature = sign(&key(), true, "hello zen");

        let verifier = MessageVerifier::new(&MAINNET);
        assert!(verifier.verify(&params(address.as_str(), &signature, "hello zen")).unwrap());
    }

    #[test]
    fn test_uncompressed_key_signature_verifies() {
        let address = address_for(&key(), false, &TESTNET);
        let signature = sign(&key(), false, "testnet message");

        let verifier = MessageVerifier::new(&TESTNET);
        assert!(verifier.verify(&params(address.as_str(), &signature, "testnet message")).unwrap());
    }

    #[test]
    fn test_altered_message_is_false() {
        let address = address_for(&key(), true, &MAINNET);
        let signature = sign(&key(), true, "hello zen");

        let verifier = MessageVerifier::new(&MAINNET);
        assert!(!verifier.verify(&params(address.as_str(), &signature, "hello zen!")).unwrap());
    }

    #[test]
    fn test_wrong_compression_flag_is_false() {
        let address = address_for(&key(), true, &MAINNET);
        let signature = sign(&key(), false, "hello zen");

        assert!(!verify_signature("hello zen", address.as_str(), &signature, &MAINNET).unwrap());
    }

    #[test]
    fn test_garbage_base64_is_an_error() {
        let address = address_for(&key(), true, &MAINNET);
        let err = verify_signature("hello", address.as_str(), "@@not base64@@", &MAINNET).unwrap_err();
        assert!(matches!(err, ExplorerError::VerificationError(_)));
        assert_eq!(err.to_string(), "Unexpected error: Malformed base64 encoding");
    }

    #[test]
    fn test_wrong_length_and_header_are_errors() {
        let address = address_for(&key(), true, &MAINNET);
        let short = base64::encode([31u8; 10]);
        assert!(verify_signature("hello", address.as_str(), &short, &MAINNET).is_err());

        let bad_header = base64::encode([1u8; 65]);
        assert!(verify_signature("hello", address.as_str(), &bad_header, &MAINNET).is_err());
    }

    #[test]
    fn test_script_hash_address_is_an_error() {
        let address = Address::from_hash(AddressKind::ScriptHash, [3; 20], &MAINNET);
        let signature = sign(&key(), true, "hello");
        assert!(matches!(
            verify_signature("hello", address.as_str(), &signature, &MAINNET),
            Err(ExplorerError::VerificationError(_))
        ));
    }

    #[test]
    fn test_invalid_address_is_an_error() {
        let signature = sign(&key(), true, "hello");
        assert!(verify_signature("hello", "not-an-address", &signature, &MAINNET).is_err());
    }

    #[test]
    fn test_missing_parameters() {
        let verifier = MessageVerifier::new(&MAINNET);
        let missing = VerifyParams {
            address: Some("zn".to_string()),
            signature: None,
            message: Some("m".to_string()),
        };
        assert!(matches!(verifier.verify(&missing), Err(ExplorerError::MissingParameter)));
        assert!(matches!(
            verifier.verify(&VerifyParams::default()),
            Err(ExplorerError::MissingParameter)
        ));
    }

    #[test]
    fn test_merge_prefers_body() {
        let body = VerifyParams {
            address: Some("body-addr".to_string()),
            signature: Some(String::new()),
            message: None,
        };
        let query = VerifyParams {
            address: Some("query-addr".to_string()),
            signature: Some("query-sig".to_string()),
            message: Some("query-msg".to_string()),
        };

        let merged = VerifyParams::merge(body, query);
        assert_eq!(merged.address.as_deref(), Some("body-addr"));
        assert_eq!(merged.signature.as_deref(), Some("query-sig"));
        assert_eq!(merged.message.as_deref(), Some("query-msg"));
    }

    #[test]
    fn test_varstr_lengths() {
        let mut short = Vec::new();
        write_varstr(&mut short, &[7; 3]);
        assert_eq!(short, vec![3, 7, 7, 7]);

        let mut long = Vec::new();
        write_varstr(&mut long, &[0; 300]);
        assert_eq!(&long[..3], &[0xfd, 0x2c, 0x01]);
        assert_eq!(long.len(), 303);
    }
}
