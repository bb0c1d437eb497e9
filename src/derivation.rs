use bitcoin_hashes::{hash160, Hash};
use hmac::{Hmac, Mac};
use secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey};
use sha2::Sha512;
use std::fmt;

const HARDENED_BIT: u32 = 0x80000000;

/// BIP32 version bytes, mainnet.
const XPRV_VERSION: [u8; 4] = [0x04, 0x88, 0xAD, 0xE4];
const XPUB_VERSION: [u8; 4] = [0x04, 0x88, 0xB2, 0x1E];

#[derive(Debug, PartialEq, Eq)]
pub enum DerivationError {
    InvalidPath,
    InvalidChildNumber,
    InvalidMasterKey,
    InvalidChildKey,
    HmacError,
}

impl fmt::Display for DerivationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DerivationError::InvalidPath => write!(f, "Invalid derivation path"),
            DerivationError::InvalidChildNumber => write!(f, "Invalid child number"),
            DerivationError::InvalidMasterKey => {
                write!(f, "Master key scalar is zero or exceeds the curve order")
            }
            DerivationError::InvalidChildKey => {
                write!(f, "Child key scalar is zero or exceeds the curve order")
            }
            DerivationError::HmacError => write!(f, "HMAC operation failed"),
        }
    }
}

impl std::error::Error for DerivationError {}

/// A BIP32 extended key: private scalar, public point, and chain code,
/// plus the metadata needed for xprv/xpub serialization.
///
/// Derivation never mutates a key in place; every step returns a new
/// `ExtendedKey`, so a master key can be shared read-only across
/// per-chain derivations.
#[derive(Clone)]
pub struct ExtendedKey {
    pub private_key: SecretKey,
    pub public_key: PublicKey,
    pub chain_code: [u8; 32],
    pub depth: u8,
    pub parent_fingerprint: [u8; 4],
    pub child_number: u32,
}

impl ExtendedKey {
    /// Creates the master key from a BIP39 seed.
    ///
    /// HMAC-SHA512 keyed with "Bitcoin seed"; the left half becomes the
    /// private scalar, the right half the chain code. A left half of zero
    /// or at least the curve order is rejected rather than coerced.
    pub fn from_seed(seed: &[u8]) -> Result<Self, DerivationError> {
        let secp = Secp256k1::new();

        let mut hmac = Hmac::<Sha512>::new_from_slice(b"Bitcoin seed")
            .map_err(|_| DerivationError::HmacError)?;

        hmac.update(seed);
        let result = hmac.finalize().into_bytes();

        let mut left = [0u8; 32];
        let mut chain_code = [0u8; 32];
        left.copy_from_slice(&result[0..32]);
        chain_code.copy_from_slice(&result[32..64]);

        let private_key =
            SecretKey::from_slice(&left).map_err(|_| DerivationError::InvalidMasterKey)?;

        let public_key = PublicKey::from_secret_key(&secp, &private_key);

        Ok(ExtendedKey {
            private_key,
            public_key,
            chain_code,
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_number: 0,
        })
    }

    /// Derives a child key at `index` (0..2^31).
    ///
    /// Hardened derivation feeds the parent private key into the HMAC,
    /// non-hardened the compressed public key. An out-of-range child
    /// scalar surfaces as `InvalidChildKey`; BIP32 would advance to the
    /// next index, but silently skipping would break the reproducibility
    /// this library promises, so the caller decides.
    pub fn derive_child(&self, index: u32, hardened: bool) -> Result<Self, DerivationError> {
        if index >= HARDENED_BIT {
            return Err(DerivationError::InvalidChildNumber);
        }
        self.derive_index(if hardened { index | HARDENED_BIT } else { index })
    }

    fn derive_index(&self, index: u32) -> Result<Self, DerivationError> {
        let secp = Secp256k1::new();

        // 33 bytes of key material + 4 bytes of index
        let mut data = Vec::with_capacity(37);

        if index & HARDENED_BIT != 0 {
            data.push(0);
            data.extend_from_slice(&self.private_key.secret_bytes());
        } else {
            data.extend_from_slice(&self.public_key.serialize());
        }

        data.extend_from_slice(&index.to_be_bytes());

        let mut hmac = Hmac::<Sha512>::new_from_slice(&self.chain_code)
            .map_err(|_| DerivationError::HmacError)?;

        hmac.update(&data);
        let result = hmac.finalize().into_bytes();

        let mut left = [0u8; 32];
        let mut chain_code = [0u8; 32];
        left.copy_from_slice(&result[0..32]);
        chain_code.copy_from_slice(&result[32..64]);

        // child scalar = IL + parent (mod n); IL out of range or a zero
        // sum are both invalid children
        let tweak = SecretKey::from_slice(&left)
            .map_err(|_| DerivationError::InvalidChildKey)?;
        let tweak_scalar: Scalar = tweak.into();

        let child_private_key = self
            .private_key
            .add_tweak(&tweak_scalar)
            .map_err(|_| DerivationError::InvalidChildKey)?;

        let child_public_key = PublicKey::from_secret_key(&secp, &child_private_key);

        Ok(ExtendedKey {
            private_key: child_private_key,
            public_key: child_public_key,
            chain_code,
            depth: self.depth + 1,
            parent_fingerprint: self.fingerprint(),
            child_number: index,
        })
    }

    /// First four bytes of hash160 over the compressed public key.
    pub fn fingerprint(&self) -> [u8; 4] {
        let mut result = [0u8; 4];
        let serialized_pubkey = self.public_key.serialize();
        let hash = hash160::Hash::hash(&serialized_pubkey);
        result.copy_from_slice(&hash[0..4]);
        result
    }

    /// Serializes as a mainnet extended private key (xprv...).
    pub fn to_xprv(&self) -> String {
        let mut data = Vec::with_capacity(78);
        data.extend_from_slice(&XPRV_VERSION);
        data.push(self.depth);
        data.extend_from_slice(&self.parent_fingerprint);
        data.extend_from_slice(&self.child_number.to_be_bytes());
        data.extend_from_slice(&self.chain_code);
        data.push(0x00);
        data.extend_from_slice(&self.private_key.secret_bytes());
        bs58::encode(&data).with_check().into_string()
    }

    /// Serializes as a mainnet extended public key (xpub...).
    pub fn to_xpub(&self) -> String {
        let mut data = Vec::with_capacity(78);
        data.extend_from_slice(&XPUB_VERSION);
        data.push(self.depth);
        data.extend_from_slice(&self.parent_fingerprint);
        data.extend_from_slice(&self.child_number.to_be_bytes());
        data.extend_from_slice(&self.chain_code);
        data.extend_from_slice(&self.public_key.serialize());
        bs58::encode(&data).with_check().into_string()
    }
}

/// A parsed BIP32 derivation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationPath {
    indices: Vec<u32>,
}

impl DerivationPath {
    /// Parses a path such as "m/44'/0'/0'/0/0" (' or h marks hardened).
    pub fn from_str(path: &str) -> Result<Self, DerivationError> {
        if !path.starts_with('m') {
            return Err(DerivationError::InvalidPath);
        }

        let indices: Result<Vec<u32>, _> = path
            .split('/')
            .skip(1)
            .filter(|s| !s.is_empty())
            .map(|component| {
                let hardened = component.ends_with('\'') || component.ends_with('h');
                let index_str = if hardened {
                    &component[..component.len() - 1]
                } else {
                    component
                };

                match index_str.parse::<u32>() {
                    Ok(index) if index < HARDENED_BIT => {
                        Ok(if hardened { index | HARDENED_BIT } else { index })
                    }
                    _ => Err(DerivationError::InvalidChildNumber),
                }
            })
            .collect();

        indices.map(|indices| DerivationPath { indices })
    }

    /// Walks `root` through every step of this path.
    pub fn derive(&self, root: &ExtendedKey) -> Result<ExtendedKey, DerivationError> {
        let mut key = root.clone();

        for &index in &self.indices {
            key = key.derive_index(index)?;
        }

        Ok(key)
    }
}

/// Constructors and coin-type constants for common paths.
pub mod paths {
    use super::{DerivationPath, HARDENED_BIT};

    /// Bitcoin - Coin type 0
    pub const BITCOIN: u32 = 0;

    /// Ethereum - Coin type 60
    pub const ETHEREUM: u32 = 60;

    /// BIP44 - Multi-Account Hierarchy for Deterministic Wallets
    /// Format: m/44'/coin_type'/account'/change/address_index
    pub fn bip44(coin_type: u32, account: u32, change: bool, address_index: u32) -> DerivationPath {
        DerivationPath {
            indices: vec![
                44 | HARDENED_BIT,
                coin_type | HARDENED_BIT,
                account | HARDENED_BIT,
                u32::from(change),
                address_index,
            ],
        }
    }
}
