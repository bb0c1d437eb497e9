use bip39::Mnemonic;
use rand::{rngs::OsRng, RngCore};
use std::error::Error as StdError;
use std::fmt;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedPhraseSize {
    Words12,
    Words24,
}

impl SeedPhraseSize {
    pub fn entropy_bits(&self) -> usize {
        match self {
            SeedPhraseSize::Words12 => 128,
            SeedPhraseSize::Words24 => 256,
        }
    }

    /// Maps a requested word count onto a supported size. Anything other
    /// than 12 falls back to 24 words (256 bits of entropy).
    pub fn from_word_count(count: usize) -> Self {
        match count {
            12 => SeedPhraseSize::Words12,
            _ => SeedPhraseSize::Words24,
        }
    }
}

#[derive(Debug)]
pub enum MnemonicError {
    InvalidPhrase,
    EntropySource,
}

impl fmt::Display for MnemonicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MnemonicError::InvalidPhrase => write!(f, "Invalid seed phrase"),
            MnemonicError::EntropySource => write!(f, "Failed to draw secure entropy"),
        }
    }
}

impl StdError for MnemonicError {}

/// A validated BIP39 seed phrase.
pub struct SeedPhrase {
    mnemonic: Mnemonic,
}

impl SeedPhrase {
    /// Generates a fresh seed phrase from OS entropy.
    ///
    /// `override_phrase`, when present, is parsed and returned verbatim
    /// instead of drawing entropy. This exists for deterministic test and
    /// demo runs only; production callers must pass `None`, since a fixed
    /// phrase defeats every randomness guarantee this function offers.
    pub fn generate(
        size: SeedPhraseSize,
        override_phrase: Option<&str>,
    ) -> Result<Self, MnemonicError> {
        if let Some(phrase) = override_phrase {
            return Self::from_phrase(phrase);
        }

        let entropy = Zeroizing::new(generate_entropy(size.entropy_bits() / 8)?);

        match Mnemonic::from_entropy(&entropy) {
            Ok(mnemonic) => Ok(Self { mnemonic }),
            Err(_) => Err(MnemonicError::EntropySource),
        }
    }

    /// Parses an existing phrase, checking every word against the wordlist
    /// and verifying the embedded checksum.
    pub fn from_phrase(phrase: &str) -> Result<Self, MnemonicError> {
        match Mnemonic::parse_normalized(phrase) {
            Ok(mnemonic) => Ok(Self { mnemonic }),
            Err(_) => Err(MnemonicError::InvalidPhrase),
        }
    }

    pub fn phrase(&self) -> String {
        let mut result = String::new();
        for (i, word) in self.mnemonic.word_iter().enumerate() {
            if i > 0 {
                result.push(' ');
            }
            result.push_str(word);
        }
        result
    }

    pub fn word_count(&self) -> usize {
        self.mnemonic.word_count()
    }

    /// Recovers the entropy this phrase encodes (checksum excluded).
    pub fn to_entropy(&self) -> Vec<u8> {
        self.mnemonic.to_entropy()
    }

    /// Stretches the phrase into the 64-byte BIP39 seed
    /// (PBKDF2-HMAC-SHA512, 2048 iterations, salt "mnemonic" + passphrase).
    pub fn to_seed(&self, passphrase: &str) -> [u8; 64] {
        self.mnemonic.to_seed(passphrase)
    }
}

pub fn generate_entropy(byte_length: usize) -> Result<Vec<u8>, MnemonicError> {
    let mut bytes = vec![0u8; byte_length];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|_| MnemonicError::EntropySource)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn generates_requested_word_counts() {
        let twelve = SeedPhrase::generate(SeedPhraseSize::Words12, None).unwrap();
        assert_eq!(twelve.word_count(), 12);

        let twenty_four = SeedPhrase::generate(SeedPhraseSize::Words24, None).unwrap();
        assert_eq!(twenty_four.word_count(), 24);
    }

    #[test]
    fn generated_phrase_passes_checksum_validation() {
        // parse_normalized rejects any phrase whose checksum bits do not
        // match the decoded entropy, so re-parsing is the checksum check.
        let phrase = SeedPhrase::generate(SeedPhraseSize::Words12, None).unwrap();
        assert!(SeedPhrase::from_phrase(&phrase.phrase()).is_ok());
    }

    #[test]
    fn entropy_round_trip_reproduces_phrase() {
        for size in [SeedPhraseSize::Words12, SeedPhraseSize::Words24] {
            let phrase = SeedPhrase::generate(size, None).unwrap();
            let entropy = phrase.to_entropy();
            let rebuilt = Mnemonic::from_entropy(&entropy).unwrap();
            assert_eq!(rebuilt.to_string(), phrase.phrase());
        }
    }

    #[test]
    fn unrecognized_word_count_falls_back_to_24() {
        assert_eq!(SeedPhraseSize::from_word_count(13), SeedPhraseSize::Words24);
        assert_eq!(SeedPhraseSize::from_word_count(0), SeedPhraseSize::Words24);
        assert_eq!(SeedPhraseSize::from_word_count(12), SeedPhraseSize::Words12);
    }

    #[test]
    fn override_phrase_is_returned_verbatim() {
        let phrase = SeedPhrase::generate(SeedPhraseSize::Words24, Some(TEST_PHRASE)).unwrap();
        assert_eq!(phrase.phrase(), TEST_PHRASE);
        assert_eq!(phrase.word_count(), 12);
    }

    #[test]
    fn invalid_override_phrase_is_rejected() {
        let result = SeedPhrase::generate(
            SeedPhraseSize::Words12,
            Some("abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon"),
        );
        assert!(matches!(result, Err(MnemonicError::InvalidPhrase)));
    }

    #[test]
    fn seed_matches_published_bip39_vector() {
        let phrase = SeedPhrase::from_phrase(TEST_PHRASE).unwrap();
        let seed = phrase.to_seed("");
        assert_eq!(
            hex::encode(seed),
            "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc1\
             9a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
        );
    }

    #[test]
    fn seed_derivation_is_deterministic() {
        let phrase = SeedPhrase::from_phrase(TEST_PHRASE).unwrap();
        assert_eq!(phrase.to_seed(""), phrase.to_seed(""));
        assert_ne!(phrase.to_seed(""), phrase.to_seed("trezor"));
    }
}
