pub mod derivation;
pub mod keys;
pub mod mnemonic;

pub use derivation::{paths, DerivationError, DerivationPath, ExtendedKey};
pub use keys::{
    derive_chain_keys, BitcoinKeys, Chain, ChainKeyBundle, EthereumKeys, KeyError, SolanaKeys,
};
pub use mnemonic::{generate_entropy, MnemonicError, SeedPhrase, SeedPhraseSize};

/// Generates a BIP39 seed phrase of the requested size.
///
/// `override_phrase` short-circuits entropy generation and returns the
/// given phrase verbatim (after validation); see [`SeedPhrase::generate`]
/// for the caveats.
pub fn generate_seed_phrase(
    size: SeedPhraseSize,
    override_phrase: Option<&str>,
) -> Result<SeedPhrase, MnemonicError> {
    SeedPhrase::generate(size, override_phrase)
}

/// Builds the BIP32 master key from a seed phrase with an empty passphrase.
pub fn derive_master_key(seed_phrase: &SeedPhrase) -> Result<ExtendedKey, DerivationError> {
    let seed = zeroize::Zeroizing::new(seed_phrase.to_seed(""));
    ExtendedKey::from_seed(seed.as_ref())
}
