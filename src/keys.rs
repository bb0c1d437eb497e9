use crate::derivation::{paths, DerivationError, ExtendedKey};
use crate::mnemonic::SeedPhrase;
use bech32::ToBase32;
use bitcoin_hashes::{hash160, Hash};
use ed25519_dalek::SigningKey;
use secp256k1::PublicKey;
use serde::Serialize;
use std::error::Error;
use std::fmt;
use std::str::FromStr;

/// Mainnet version byte for P2PKH addresses.
const P2PKH_VERSION: u8 = 0x00;
/// Human-readable part for mainnet segwit addresses.
const SEGWIT_HRP: &str = "bc";
/// Length of an ed25519 seed and public key.
const ED25519_KEY_LEN: usize = 32;

/// The closed set of chains this library derives keys for. Adding a chain
/// means adding a variant here and a branch in `derive_chain_keys`; the
/// compiler flags every other place that needs updating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chain {
    Bitcoin,
    Ethereum,
    Solana,
}

impl FromStr for Chain {
    type Err = KeyError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "bitcoin" | "btc" => Ok(Chain::Bitcoin),
            "ethereum" | "eth" => Ok(Chain::Ethereum),
            "solana" | "sol" => Ok(Chain::Solana),
            _ => Err(KeyError::UnsupportedChain(name.to_string())),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Chain::Bitcoin => write!(f, "bitcoin"),
            Chain::Ethereum => write!(f, "ethereum"),
            Chain::Solana => write!(f, "solana"),
        }
    }
}

#[derive(Debug)]
pub enum KeyError {
    Derivation(DerivationError),
    UnsupportedChain(String),
    MalformedKey { expected: usize, actual: usize },
    AddressGenerationFailed,
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeyError::Derivation(e) => write!(f, "Derivation error: {}", e),
            KeyError::UnsupportedChain(name) => {
                write!(f, "No derivation rule for chain '{}'", name)
            }
            KeyError::MalformedKey { expected, actual } => {
                write!(f, "Malformed key: expected {} bytes, got {}", expected, actual)
            }
            KeyError::AddressGenerationFailed => write!(f, "Failed to generate address"),
        }
    }
}

impl Error for KeyError {}

impl From<DerivationError> for KeyError {
    fn from(err: DerivationError) -> Self {
        KeyError::Derivation(err)
    }
}

/// Keys and addresses for a secp256k1 BIP44 Bitcoin account.
#[derive(Debug, Clone, Serialize)]
pub struct BitcoinKeys {
    pub private_key: String,
    pub x_coordinate: String,
    pub y_coordinate: String,
    pub p2pkh_address: String,
    pub segwit_address: String,
}

/// Keys and address for a secp256k1 BIP44 Ethereum account.
#[derive(Debug, Clone, Serialize)]
pub struct EthereumKeys {
    pub private_key: String,
    pub x_coordinate: String,
    pub y_coordinate: String,
    pub address: String,
}

/// An ed25519 keypair and its base58 Solana address.
#[derive(Debug, Clone, Serialize)]
pub struct SolanaKeys {
    pub private_key: String,
    pub public_key: String,
    pub address: String,
}

/// Per-chain derivation output.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "chain", rename_all = "snake_case")]
pub enum ChainKeyBundle {
    Bitcoin(BitcoinKeys),
    Ethereum(EthereumKeys),
    Solana(SolanaKeys),
}

/// Derives the key bundle for `chain`.
///
/// Bitcoin and Ethereum walk the canonical BIP44 path
/// m/44'/coin_type'/0'/0/0 from `master`. Solana ignores BIP32 and uses
/// the first 32 bytes of the seed phrase's UTF-8 text as its ed25519
/// seed; that diverges from the usual SLIP-0010 convention on purpose,
/// to stay compatible with wallets already generated this way.
pub fn derive_chain_keys(
    chain: Chain,
    master: &ExtendedKey,
    seed_phrase: &SeedPhrase,
) -> Result<ChainKeyBundle, KeyError> {
    match chain {
        Chain::Bitcoin => bitcoin_keys(master).map(ChainKeyBundle::Bitcoin),
        Chain::Ethereum => ethereum_keys(master).map(ChainKeyBundle::Ethereum),
        Chain::Solana => solana_keys(seed_phrase).map(ChainKeyBundle::Solana),
    }
}

fn bitcoin_keys(master: &ExtendedKey) -> Result<BitcoinKeys, KeyError> {
    let child = paths::bip44(paths::BITCOIN, 0, false, 0).derive(master)?;
    let (x_coordinate, y_coordinate) = public_key_coordinates(&child.public_key);

    Ok(BitcoinKeys {
        private_key: hex::encode(child.private_key.secret_bytes()),
        x_coordinate,
        y_coordinate,
        p2pkh_address: p2pkh_address(&child.public_key),
        segwit_address: segwit_address(&child.public_key)?,
    })
}

fn ethereum_keys(master: &ExtendedKey) -> Result<EthereumKeys, KeyError> {
    let child = paths::bip44(paths::ETHEREUM, 0, false, 0).derive(master)?;
    let (x_coordinate, y_coordinate) = public_key_coordinates(&child.public_key);

    Ok(EthereumKeys {
        private_key: hex::encode(child.private_key.secret_bytes()),
        x_coordinate,
        y_coordinate,
        address: ethereum_address(&child.public_key),
    })
}

fn solana_keys(seed_phrase: &SeedPhrase) -> Result<SolanaKeys, KeyError> {
    let phrase = seed_phrase.phrase();
    let bytes = phrase.as_bytes();
    if bytes.len() < ED25519_KEY_LEN {
        return Err(KeyError::MalformedKey {
            expected: ED25519_KEY_LEN,
            actual: bytes.len(),
        });
    }

    let mut seed = [0u8; ED25519_KEY_LEN];
    seed.copy_from_slice(&bytes[..ED25519_KEY_LEN]);

    let signing_key = SigningKey::from_bytes(&seed);
    let public_bytes = signing_key.verifying_key().to_bytes();

    Ok(SolanaKeys {
        private_key: hex::encode(signing_key.to_keypair_bytes()),
        public_key: hex::encode(public_bytes),
        address: solana_address(&public_bytes)?,
    })
}

/// Splits an uncompressed secp256k1 point into hex X/Y coordinates.
fn public_key_coordinates(public_key: &PublicKey) -> (String, String) {
    let uncompressed = public_key.serialize_uncompressed();
    (
        hex::encode(&uncompressed[1..33]),
        hex::encode(&uncompressed[33..65]),
    )
}

/// Legacy mainnet address: base58check(0x00 || hash160(compressed pubkey)).
pub fn p2pkh_address(public_key: &PublicKey) -> String {
    let pubkey_hash = hash160::Hash::hash(&public_key.serialize());

    let mut payload = Vec::with_capacity(21);
    payload.push(P2PKH_VERSION);
    payload.extend_from_slice(<hash160::Hash as AsRef<[u8]>>::as_ref(&pubkey_hash));

    bs58::encode(&payload).with_check().into_string()
}

/// Native segwit mainnet address: bech32("bc", v0 || hash160 program).
pub fn segwit_address(public_key: &PublicKey) -> Result<String, KeyError> {
    let pubkey_hash = hash160::Hash::hash(&public_key.serialize());
    let program = <hash160::Hash as AsRef<[u8]>>::as_ref(&pubkey_hash);

    let version =
        bech32::u5::try_from_u8(0).map_err(|_| KeyError::AddressGenerationFailed)?;
    let mut data = vec![version];
    data.extend(program.to_base32());

    bech32::encode(SEGWIT_HRP, data, bech32::Variant::Bech32)
        .map_err(|_| KeyError::AddressGenerationFailed)
}

/// Ethereum address: last 20 bytes of keccak256(uncompressed pubkey minus
/// the 0x04 prefix byte), 0x-prefixed lowercase hex.
pub fn ethereum_address(public_key: &PublicKey) -> String {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak_hash::keccak(&uncompressed[1..]);
    format!("0x{}", hex::encode(&hash.as_bytes()[12..]))
}

/// Solana address: base58 of the raw 32-byte ed25519 public key.
pub fn solana_address(public_key: &[u8]) -> Result<String, KeyError> {
    if public_key.len() != ED25519_KEY_LEN {
        return Err(KeyError::MalformedKey {
            expected: ED25519_KEY_LEN,
            actual: public_key.len(),
        });
    }
    Ok(bs58::encode(public_key).into_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bech32::FromBase32;

    const TEST_PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn test_master() -> ExtendedKey {
        let phrase = SeedPhrase::from_phrase(TEST_PHRASE).unwrap();
        ExtendedKey::from_seed(&phrase.to_seed("")).unwrap()
    }

    fn test_phrase() -> SeedPhrase {
        SeedPhrase::from_phrase(TEST_PHRASE).unwrap()
    }

    #[test]
    fn ethereum_address_matches_published_vector() {
        let bundle = derive_chain_keys(Chain::Ethereum, &test_master(), &test_phrase()).unwrap();
        let ChainKeyBundle::Ethereum(keys) = bundle else {
            panic!("expected an ethereum bundle");
        };
        assert_eq!(keys.address, "0x9858effd232b4033e47d90003d41ec34ecaeda94");
        assert_eq!(keys.x_coordinate.len(), 64);
        assert_eq!(keys.y_coordinate.len(), 64);
    }

    #[test]
    fn bitcoin_p2pkh_address_matches_published_vector() {
        let bundle = derive_chain_keys(Chain::Bitcoin, &test_master(), &test_phrase()).unwrap();
        let ChainKeyBundle::Bitcoin(keys) = bundle else {
            panic!("expected a bitcoin bundle");
        };
        assert_eq!(keys.p2pkh_address, "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA");
        assert!(keys.segwit_address.starts_with("bc1"));
    }

    #[test]
    fn bitcoin_addresses_round_trip_to_the_same_hash160() {
        let ChainKeyBundle::Bitcoin(keys) =
            derive_chain_keys(Chain::Bitcoin, &test_master(), &test_phrase()).unwrap()
        else {
            panic!("expected a bitcoin bundle");
        };

        let p2pkh_payload = bs58::decode(&keys.p2pkh_address)
            .with_check(None)
            .into_vec()
            .unwrap();
        assert_eq!(p2pkh_payload[0], P2PKH_VERSION);
        let p2pkh_hash = &p2pkh_payload[1..];
        assert_eq!(p2pkh_hash.len(), 20);

        let (hrp, data, variant) = bech32::decode(&keys.segwit_address).unwrap();
        assert_eq!(hrp, SEGWIT_HRP);
        assert_eq!(variant, bech32::Variant::Bech32);
        assert_eq!(data[0].to_u8(), 0);
        let segwit_hash = Vec::<u8>::from_base32(&data[1..]).unwrap();

        assert_eq!(p2pkh_hash, &segwit_hash[..]);
    }

    #[test]
    fn bitcoin_and_ethereum_private_keys_differ() {
        let master = test_master();
        let phrase = test_phrase();
        let ChainKeyBundle::Bitcoin(btc) =
            derive_chain_keys(Chain::Bitcoin, &master, &phrase).unwrap()
        else {
            panic!("expected a bitcoin bundle");
        };
        let ChainKeyBundle::Ethereum(eth) =
            derive_chain_keys(Chain::Ethereum, &master, &phrase).unwrap()
        else {
            panic!("expected an ethereum bundle");
        };
        assert_ne!(btc.private_key, eth.private_key);
    }

    #[test]
    fn solana_address_is_valid_base58_of_32_bytes() {
        let ChainKeyBundle::Solana(keys) =
            derive_chain_keys(Chain::Solana, &test_master(), &test_phrase()).unwrap()
        else {
            panic!("expected a solana bundle");
        };

        assert!((32..=44).contains(&keys.address.len()));
        let decoded = bs58::decode(&keys.address).into_vec().unwrap();
        assert_eq!(decoded.len(), ED25519_KEY_LEN);
        assert_eq!(hex::encode(&decoded), keys.public_key);
        // 64-byte keypair: seed followed by public key
        assert_eq!(keys.private_key.len(), 128);
        assert!(keys.private_key.ends_with(&keys.public_key));
    }

    #[test]
    fn solana_derivation_is_deterministic() {
        let master = test_master();
        let a = derive_chain_keys(Chain::Solana, &master, &test_phrase()).unwrap();
        let b = derive_chain_keys(Chain::Solana, &master, &test_phrase()).unwrap();
        let (ChainKeyBundle::Solana(a), ChainKeyBundle::Solana(b)) = (a, b) else {
            panic!("expected solana bundles");
        };
        assert_eq!(a.address, b.address);
        assert_eq!(a.private_key, b.private_key);
    }

    #[test]
    fn unsupported_chain_name_is_an_error() {
        let err = Chain::from_str("dogecoin").unwrap_err();
        assert!(matches!(err, KeyError::UnsupportedChain(name) if name == "dogecoin"));
    }

    #[test]
    fn chain_names_parse_case_insensitively() {
        assert_eq!(Chain::from_str("Bitcoin").unwrap(), Chain::Bitcoin);
        assert_eq!(Chain::from_str("ETH").unwrap(), Chain::Ethereum);
        assert_eq!(Chain::from_str("sol").unwrap(), Chain::Solana);
    }

    #[test]
    fn solana_address_rejects_wrong_key_length() {
        let err = solana_address(&[0u8; 31]).unwrap_err();
        assert!(matches!(
            err,
            KeyError::MalformedKey { expected: 32, actual: 31 }
        ));
    }
}
