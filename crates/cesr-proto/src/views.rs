//! Typed views over decoded matter/indexer tokens: thin accessors that
//! name what a primitive's bytes *mean* without re-parsing them.

use crate::error::{CesrError, Result};
use crate::indexer::IndexerToken;
use crate::matter::MatterToken;
use crate::tables::matter::{is_digest_code, is_verfer_code};

/// A verification key (public key) primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verfer {
    /// The underlying decoded token.
    pub token: MatterToken,
}

impl Verfer {
    /// Wrap a decoded matter token as a `Verfer`, if its code is a known
    /// verifier-family code.
    ///
    /// # Errors
    /// [`CesrError::Deserialize`] if `token.code` isn't a verifier code.
    pub fn from_matter(token: MatterToken) -> Result<Self> {
        if is_verfer_code(&token.code) {
            Ok(Self { token })
        } else {
            Err(CesrError::Deserialize {
                hint: Some(format!("`{}` is not a verifier code", token.code)),
                offset: None,
            })
        }
    }

    /// The raw public key bytes.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.token.raw
    }
}

/// A cryptographic digest primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diger {
    /// The underlying decoded token.
    pub token: MatterToken,
}

impl Diger {
    /// Wrap a decoded matter token as a `Diger`, if its code is a known
    /// digest-family code.
    ///
    /// # Errors
    /// [`CesrError::Deserialize`] if `token.code` isn't a digest code.
    pub fn from_matter(token: MatterToken) -> Result<Self> {
        if is_digest_code(&token.code) {
            Ok(Self { token })
        } else {
            Err(CesrError::Deserialize {
                hint: Some(format!("`{}` is not a digest code", token.code)),
                offset: None,
            })
        }
    }

    /// The raw digest bytes.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.token.raw
    }

    /// True if `other` was produced by the same digest algorithm family
    /// (same hard code) as `self`.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.token.code == other.token.code
    }
}

/// An indexed (attached) signature primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Siger {
    /// The underlying decoded indexer token.
    pub token: IndexerToken,
}

impl Siger {
    /// Wrap a decoded indexer token as a `Siger`. Indexer codes are
    /// signature codes by construction (there is no non-signature
    /// indexer family in this crate's table), so this never fails.
    #[must_use]
    pub fn from_indexer(token: IndexerToken) -> Self {
        Self { token }
    }

    /// The raw signature bytes.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.token.raw
    }

    /// The signing-key index this signature corresponds to.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.token.index
    }
}

/// A sequence-number primitive, carried as a plain matter digest-sized
/// token in the quadruple/couple tuple families.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seqner {
    /// The underlying decoded token.
    pub token: MatterToken,
}

impl Seqner {
    /// Wrap a decoded matter token as a `Seqner`.
    #[must_use]
    pub const fn from_matter(token: MatterToken) -> Self {
        Self { token }
    }

    /// The sequence number's raw bytes, big-endian.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.token.raw
    }
}

/// A timestamp primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dater {
    /// The underlying decoded token.
    pub token: MatterToken,
}

impl Dater {
    /// Wrap a decoded matter token as a `Dater`.
    #[must_use]
    pub const fn from_matter(token: MatterToken) -> Self {
        Self { token }
    }

    /// The timestamp's raw bytes.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.token.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::b64;

    #[test]
    fn verfer_accepts_verifier_code() {
        let token = MatterToken {
            code: "D".to_string(),
            raw: vec![0u8; 32],
            qb64_text: format!("D{}", b64::encode_b64(&[0u8; 32])),
            full_size_text: 44,
            full_size_binary: 33,
        };
        assert!(Verfer::from_matter(token).is_ok());
    }

    #[test]
    fn diger_rejects_non_digest_code() {
        let token = MatterToken {
            code: "O".to_string(),
            raw: vec![0u8; 4],
            qb64_text: "OAAAAAAA".to_string(),
            full_size_text: 8,
            full_size_binary: 6,
        };
        assert!(Diger::from_matter(token).is_err());
    }

    #[test]
    fn diger_matches_same_algorithm_family() {
        let a = MatterToken {
            code: "E".to_string(),
            raw: vec![1u8; 32],
            qb64_text: format!("E{}", b64::encode_b64(&[1u8; 32])),
            full_size_text: 44,
            full_size_binary: 33,
        };
        let b = MatterToken { raw: vec![2u8; 32], ..a.clone() };
        let da = Diger::from_matter(a).unwrap();
        let db = Diger::from_matter(b).unwrap();
        assert!(da.matches(&db));
    }
}
