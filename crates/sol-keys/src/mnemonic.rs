use bip39::{Language, Mnemonic};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::derivation_path::DerivationPath;
use crate::error::KeyError;
use crate::keypair::Keypair;
use crate::secret::{SecretBytes, SecretString};

/// Generate a new English BIP-39 mnemonic of 12 or 24 words.
pub fn generate_mnemonic(word_count: usize) -> Result<SecretString, KeyError> {
    // 12 words = 128 bits, 24 words = 256 bits of entropy
    let entropy_len = match word_count {
        12 => 16,
        24 => 32,
        other => {
            return Err(KeyError::InvalidMnemonic(format!(
                "unsupported word count {other}, expected 12 or 24"
            )))
        }
    };
    let mut entropy = Zeroizing::new([0u8; 32]);
    rand::rngs::OsRng.fill_bytes(&mut entropy[..entropy_len]);
    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy[..entropy_len])
        .map_err(|e| KeyError::InvalidMnemonic(e.to_string()))?;
    Ok(SecretString::new(mnemonic.to_string()))
}

/// Whether `phrase` is a well-formed English mnemonic with a valid checksum.
pub fn validate_mnemonic(phrase: &str) -> bool {
    Mnemonic::parse_in_normalized(Language::English, phrase).is_ok()
}

/// Stretch a mnemonic and optional passphrase into the 64-byte BIP-39 seed.
pub fn mnemonic_to_seed(phrase: &str, passphrase: &str) -> Result<SecretBytes, KeyError> {
    let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase)
        .map_err(|e| KeyError::InvalidMnemonic(e.to_string()))?;
    Ok(SecretBytes::from_array(mnemonic.to_seed(passphrase)))
}

/// Recover the wallet keypair at `path` from a seed phrase.
pub fn keypair_from_seed_phrase(
    phrase: &str,
    passphrase: &str,
    path: &DerivationPath,
) -> Result<Keypair, KeyError> {
    let seed = mnemonic_to_seed(phrase, passphrase)?;
    Keypair::from_seed_and_derivation_path(&seed, path)
}

/// Validate a single word against the English word list.
pub fn is_valid_word(word: &str) -> bool {
    Language::English.find_word(word).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_generate_mnemonic_word_counts() {
        for count in [12, 24] {
            let mnemonic = generate_mnemonic(count).unwrap();
            assert_eq!(mnemonic.split_whitespace().count(), count);
            assert!(validate_mnemonic(&mnemonic));
        }
    }

    #[test]
    fn test_generate_mnemonic_rejects_other_counts() {
        assert!(matches!(
            generate_mnemonic(15),
            Err(KeyError::InvalidMnemonic(_))
        ));
    }

    #[test]
    fn test_validate_invalid_mnemonic() {
        assert!(!validate_mnemonic("invalid mnemonic phrase here"));
        // right words, wrong checksum
        assert!(!validate_mnemonic(
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon"
        ));
    }

    #[test]
    fn test_bip39_test_vector() {
        let seed = mnemonic_to_seed(TEST_PHRASE, "").unwrap();
        assert_eq!(
            hex::encode(&*seed),
            "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc1\
             9a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
        );
    }

    #[test]
    fn test_passphrase_changes_seed() {
        let plain = mnemonic_to_seed(TEST_PHRASE, "").unwrap();
        let salted = mnemonic_to_seed(TEST_PHRASE, "mypassphrase").unwrap();
        assert_ne!(&*plain, &*salted);
    }

    #[test]
    fn test_mnemonic_to_seed_rejects_garbage() {
        assert!(mnemonic_to_seed("not a real phrase", "").is_err());
    }

    #[test]
    fn test_keypair_from_seed_phrase_matches_manual_derivation() {
        let path = DerivationPath::default();
        let keypair = keypair_from_seed_phrase(TEST_PHRASE, "", &path).unwrap();

        let seed = mnemonic_to_seed(TEST_PHRASE, "").unwrap();
        let manual = Keypair::from_seed_and_derivation_path(&seed, &path).unwrap();
        assert_eq!(keypair.pubkey(), manual.pubkey());
    }

    #[test]
    fn test_keypair_from_seed_phrase_account_index_matters() {
        let first =
            keypair_from_seed_phrase(TEST_PHRASE, "", &DerivationPath::new_bip44(Some(0), Some(0)))
                .unwrap();
        let second =
            keypair_from_seed_phrase(TEST_PHRASE, "", &DerivationPath::new_bip44(Some(1), Some(0)))
                .unwrap();
        assert_ne!(first.pubkey(), second.pubkey());
    }

    #[test]
    fn test_is_valid_word() {
        assert!(is_valid_word("abandon"));
        assert!(is_valid_word("zoo"));
        assert!(!is_valid_word("notaword"));
    }
}
