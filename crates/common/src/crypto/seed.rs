use bip39::Mnemonic;
use hmac::{Hmac, Mac};
use sha2::Sha512;

use super::keys::SecretKey;

type HmacSha512 = Hmac<Sha512>;

/// Account derivation path for publisher keys, all segments hardened:
/// `m/44'/1627'/0'/0'/0'`
pub const APP_DERIVATION_PATH: [u32; 5] = [44, 1627, 0, 0, 0];

const MASTER_HMAC_KEY: &[u8] = b"ed25519 seed";
const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Errors that can occur while deriving a key from a mnemonic
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("invalid mnemonic phrase: {0}")]
    InvalidPhrase(#[from] bip39::Error),
}

/// Derive the publisher keypair from a BIP-39 mnemonic phrase.
///
/// The phrase expands to a 64-byte seed, which is walked down
/// [`APP_DERIVATION_PATH`] with hardened SLIP-0010 steps (HMAC-SHA512
/// chain) to produce a deterministic Ed25519 secret key. The same phrase
/// always yields the same key, so a publisher can re-sign their registry
/// slot from any machine.
pub fn derive_app_key(phrase: &str) -> Result<SecretKey, SeedError> {
    let mnemonic = Mnemonic::parse(phrase.trim())?;
    let seed = mnemonic.to_seed("");

    let (mut key, mut chain_code) = split(hmac(MASTER_HMAC_KEY, &seed));
    for index in APP_DERIVATION_PATH {
        (key, chain_code) = derive_child(&key, &chain_code, index | HARDENED_OFFSET);
    }

    Ok(SecretKey::from(key))
}

fn derive_child(key: &[u8; 32], chain_code: &[u8; 32], index: u32) -> ([u8; 32], [u8; 32]) {
    let mut data = Vec::with_capacity(37);
    data.push(0u8);
    data.extend_from_slice(key);
    data.extend_from_slice(&index.to_be_bytes());
    split(hmac(chain_code, &data))
}

fn hmac(key: &[u8], data: &[u8]) -> [u8; 64] {
    let mut mac = HmacSha512::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(data);
    let mut out = [0u8; 64];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

fn split(bytes: [u8; 64]) -> ([u8; 32], [u8; 32]) {
    let mut key = [0u8; 32];
    let mut chain_code = [0u8; 32];
    key.copy_from_slice(&bytes[..32]);
    chain_code.copy_from_slice(&bytes[32..]);
    (key, chain_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_derivation_is_deterministic() {
        let a = derive_app_key(PHRASE).unwrap();
        let b = derive_app_key(PHRASE).unwrap();
        assert_eq!(a.to_bytes(), b.to_bytes());
        assert_eq!(a.public().to_bytes(), b.public().to_bytes());
    }

    #[test]
    fn test_whitespace_is_tolerated() {
        let padded = format!("  {}\n", PHRASE);
        let a = derive_app_key(PHRASE).unwrap();
        let b = derive_app_key(&padded).unwrap();
        assert_eq!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn test_different_phrases_differ() {
        let other =
            "legal winner thank year wave sausage worth useful legal winner thank yellow";
        let a = derive_app_key(PHRASE).unwrap();
        let b = derive_app_key(other).unwrap();
        assert_ne!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn test_rejects_malformed_phrase() {
        assert!(derive_app_key("definitely not a mnemonic").is_err());
        assert!(derive_app_key("").is_err());
    }
}
