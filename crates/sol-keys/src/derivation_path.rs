//! BIP-44 style derivation paths, `m/44'/501'/<account>'/<change>'`.
//!
//! Ed25519 (SLIP-0010) only defines hardened child derivation, so the parser
//! refuses unhardened segments with [`KeyError::UnsupportedDerivation`] and
//! malformed text with [`KeyError::InvalidPath`]. Unhardened indices can still
//! be built programmatically; derivation rejects them later.

use std::fmt;
use std::str::FromStr;

use crate::error::KeyError;

/// BIP-44 purpose level.
pub const BIP44_PURPOSE: u32 = 44;
/// SLIP-44 coin type for SOL.
pub const SOLANA_COIN_TYPE: u32 = 501;
/// First hardened index, `2^31`.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// One path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildIndex {
    Normal(u32),
    Hardened(u32),
}

impl ChildIndex {
    /// The index without the hardened bit.
    pub fn index(&self) -> u32 {
        match *self {
            ChildIndex::Normal(i) | ChildIndex::Hardened(i) => i,
        }
    }

    pub fn is_hardened(&self) -> bool {
        matches!(self, ChildIndex::Hardened(_))
    }

    /// The 32-bit value mixed into the HMAC, hardened bit included.
    pub fn to_bits(&self) -> u32 {
        match *self {
            ChildIndex::Normal(i) => i,
            ChildIndex::Hardened(i) => i | HARDENED_OFFSET,
        }
    }
}

impl fmt::Display for ChildIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildIndex::Normal(i) => write!(f, "{i}"),
            ChildIndex::Hardened(i) => write!(f, "{i}'"),
        }
    }
}

/// An ordered list of child indices below the master key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<ChildIndex>);

impl Default for DerivationPath {
    /// `m/44'/501'/0'/0'`, the first account of most Solana wallets.
    fn default() -> Self {
        Self::new_bip44(Some(0), Some(0))
    }
}

impl DerivationPath {
    pub fn new(path: Vec<ChildIndex>) -> Self {
        Self(path)
    }

    /// The master key itself (`m`).
    pub fn master() -> Self {
        Self(Vec::new())
    }

    /// `m/44'/501'[/account'[/change']]`. `change` is ignored without an
    /// account.
    pub fn new_bip44(account: Option<u32>, change: Option<u32>) -> Self {
        let mut path = vec![
            ChildIndex::Hardened(BIP44_PURPOSE),
            ChildIndex::Hardened(SOLANA_COIN_TYPE),
        ];
        if let Some(account) = account {
            path.push(ChildIndex::Hardened(account));
            if let Some(change) = change {
                path.push(ChildIndex::Hardened(change));
            }
        }
        Self(path)
    }

    /// Parse the `<account>'/<change>'` shorthand used by wallet CLIs,
    /// appended to `m/44'/501'`.
    pub fn from_key_str(key: &str) -> Result<Self, KeyError> {
        let mut path = Self::new_bip44(None, None).0;
        let parts: Vec<&str> = key.split('/').collect();
        if parts.len() > 2 {
            return Err(KeyError::InvalidPath(format!(
                "key path `{key}` too deep, only <account>/<change> supported"
            )));
        }
        for (position, part) in parts.iter().enumerate() {
            path.push(parse_segment(part, position + 2)?);
        }
        Ok(Self(path))
    }

    pub fn path(&self) -> &[ChildIndex] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn account(&self) -> Option<&ChildIndex> {
        self.0.get(2)
    }

    pub fn change(&self) -> Option<&ChildIndex> {
        self.0.get(3)
    }
}

impl FromStr for DerivationPath {
    type Err = KeyError;

    /// Parse `m/44'/501'/0'/0'`. Both `'` and `h` mark a hardened segment.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        match parts.next() {
            Some("m") | Some("M") => {}
            _ => {
                return Err(KeyError::InvalidPath(format!(
                    "path `{s}` must start with `m`"
                )))
            }
        }

        let path = parts
            .enumerate()
            .map(|(position, part)| parse_segment(part, position))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(path))
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for index in &self.0 {
            write!(f, "/{index}")?;
        }
        Ok(())
    }
}

/// Parse one `44'` / `44h` segment. `position` is only used in messages.
fn parse_segment(part: &str, position: usize) -> Result<ChildIndex, KeyError> {
    let (digits, hardened) = match part.strip_suffix('\'').or_else(|| part.strip_suffix('h')) {
        Some(stripped) => (stripped, true),
        None => (part, false),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(KeyError::InvalidPath(format!(
            "segment {position} `{part}` is not a decimal index"
        )));
    }
    let index: u32 = digits.parse().map_err(|_| {
        KeyError::InvalidPath(format!("segment {position} `{part}` is out of range"))
    })?;
    if index >= HARDENED_OFFSET {
        return Err(KeyError::InvalidPath(format!(
            "segment {position} index {index} must be below 2^31"
        )));
    }
    if !hardened {
        return Err(KeyError::UnsupportedDerivation(format!(
            "segment {position} `{part}` is not hardened; ed25519 only supports hardened derivation"
        )));
    }
    Ok(ChildIndex::Hardened(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_standard_solana_path() {
        let path: DerivationPath = "m/44'/501'/0'/0'".parse().unwrap();
        assert_eq!(
            path.path(),
            &[
                ChildIndex::Hardened(44),
                ChildIndex::Hardened(501),
                ChildIndex::Hardened(0),
                ChildIndex::Hardened(0),
            ]
        );
        assert_eq!(path, DerivationPath::default());
    }

    #[test]
    fn parse_accepts_h_marker() {
        let path: DerivationPath = "m/44h/501h/3h".parse().unwrap();
        assert_eq!(path, DerivationPath::new_bip44(Some(3), None));
    }

    #[test]
    fn parse_master_only() {
        let path: DerivationPath = "m".parse().unwrap();
        assert!(path.is_empty());
        assert_eq!(path, DerivationPath::master());
    }

    #[test]
    fn display_roundtrip() {
        let text = "m/44'/501'/7'/1'";
        let path: DerivationPath = text.parse().unwrap();
        assert_eq!(path.to_string(), text);
    }

    #[test]
    fn unhardened_segment_is_unsupported() {
        let err = "m/44'/501'/0'/0".parse::<DerivationPath>().unwrap_err();
        assert!(matches!(err, KeyError::UnsupportedDerivation(_)));
    }

    #[test]
    fn missing_root_is_invalid() {
        let err = "44'/501'".parse::<DerivationPath>().unwrap_err();
        assert!(matches!(err, KeyError::InvalidPath(_)));
    }

    #[test]
    fn malformed_segments_are_invalid() {
        for bad in [
            "m/44'/",
            "m//501'",
            "m/abc'",
            "m/-1'",
            "m/+1'",
            "m/1''",
            "m/4294967296'",
            "m/2147483648'",
        ] {
            let err = bad.parse::<DerivationPath>().unwrap_err();
            assert!(
                matches!(err, KeyError::InvalidPath(_)),
                "expected InvalidPath for {bad}, got {err:?}"
            );
        }
    }

    #[test]
    fn largest_hardened_index_parses() {
        let path: DerivationPath = "m/2147483647'".parse().unwrap();
        assert_eq!(path.path()[0].to_bits(), u32::MAX);
    }

    #[test]
    fn from_key_str_shorthand() {
        assert_eq!(
            DerivationPath::from_key_str("1'/2'").unwrap(),
            DerivationPath::new_bip44(Some(1), Some(2))
        );
        assert_eq!(
            DerivationPath::from_key_str("5'").unwrap(),
            DerivationPath::new_bip44(Some(5), None)
        );
        assert!(DerivationPath::from_key_str("1'/2'/3'").is_err());
        assert!(matches!(
            DerivationPath::from_key_str("1/2'"),
            Err(KeyError::UnsupportedDerivation(_))
        ));
    }

    #[test]
    fn account_and_change_accessors() {
        let path = DerivationPath::new_bip44(Some(4), Some(9));
        assert_eq!(path.account(), Some(&ChildIndex::Hardened(4)));
        assert_eq!(path.change(), Some(&ChildIndex::Hardened(9)));
        assert_eq!(DerivationPath::new_bip44(None, Some(9)).len(), 2);
    }

    #[test]
    fn child_index_bits() {
        assert_eq!(ChildIndex::Hardened(0).to_bits(), 0x8000_0000);
        assert_eq!(ChildIndex::Normal(5).to_bits(), 5);
        assert!(!ChildIndex::Normal(5).is_hardened());
        assert_eq!(ChildIndex::Hardened(5).index(), 5);
    }
}
