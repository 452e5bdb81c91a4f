//! Variant identity normalization.
//!
//! Raw input strings are folded into a [`VariantKey`] before they reach the
//! cache, so that trivially different spellings of the same variant
//! (`nc_000006.12:g.152387156g>a` vs `NC_000006.12:g.152387156G>A`) share one
//! cache entry and one in-flight provider request. Normalization is
//! deliberately permissive: anything non-empty is accepted, and deciding
//! whether a string is a *valid* variant is left to the provider.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::AnnoError;

/// Decomposed form of a genomic substitution (`ACC:g.POSREF>ALT`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomicSub {
    /// Reference sequence accession, upper-cased (e.g. `NC_000006.12`).
    pub accession: String,
    /// 1-based genomic position.
    pub position: u64,
    /// Reference allele, upper-cased.
    pub reference: char,
    /// Alternate allele, upper-cased.
    pub alternate: char,
}

/// Normalized, hashable variant identity.
///
/// Equality and hashing are defined solely over the canonical string, so two
/// raw inputs that normalize identically are the same cache key. Construction
/// is a pure function of the input.
///
/// # Example
///
/// ```
/// use varanno::VariantKey;
///
/// let a = VariantKey::normalize("  nc_000006.12:g.152387156g>a ").unwrap();
/// let b = VariantKey::normalize("NC_000006.12:g.152387156G>A").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.canonical(), "NC_000006.12:g.152387156G>A");
/// ```
#[derive(Debug, Clone)]
pub struct VariantKey {
    canonical: String,
    sub: Option<GenomicSub>,
}

impl VariantKey {
    /// Normalize a raw input string into a key.
    ///
    /// Recognized genomic substitutions are canonicalized structurally
    /// (accession and alleles upper-cased, position re-rendered without
    /// leading zeros). Anything else falls back to a trimmed, upper-cased
    /// literal. Only empty/whitespace-only input is rejected.
    pub fn normalize(raw: &str) -> Result<Self, AnnoError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AnnoError::invalid_input("empty variant string"));
        }

        match parse_genomic_sub(trimmed) {
            Some(sub) => {
                let canonical = format!(
                    "{}:g.{}{}>{}",
                    sub.accession, sub.position, sub.reference, sub.alternate
                );
                Ok(Self {
                    canonical,
                    sub: Some(sub),
                })
            }
            None => Ok(Self {
                canonical: trimmed.to_ascii_uppercase(),
                sub: None,
            }),
        }
    }

    /// The canonical identifier string. This is what is sent to the provider
    /// and what equality/hashing are defined over.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Decomposed form, present when the input parsed as a genomic
    /// substitution.
    pub fn genomic_sub(&self) -> Option<&GenomicSub> {
        self.sub.as_ref()
    }
}

impl PartialEq for VariantKey {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for VariantKey {}

impl Hash for VariantKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

fn is_base(c: char) -> bool {
    matches!(c.to_ascii_uppercase(), 'A' | 'C' | 'G' | 'T')
}

/// Attempt a structural parse of `ACCESSION:g.POSREF>ALT`.
///
/// The `g.` marker and alleles are matched case-insensitively. Returns None
/// on any structural mismatch; the caller then falls back to the literal
/// form.
fn parse_genomic_sub(s: &str) -> Option<GenomicSub> {
    let (accession, rest) = s.split_once(':')?;

    if accession.is_empty()
        || !accession.chars().next()?.is_ascii_alphabetic()
        || !accession
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return None;
    }

    let body = match rest.get(..2) {
        Some(marker) if marker.eq_ignore_ascii_case("g.") => &rest[2..],
        _ => return None,
    };

    let digits_end = body
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(body.len());
    if digits_end == 0 {
        return None;
    }
    let position: u64 = body[..digits_end].parse().ok()?;
    if position == 0 {
        return None;
    }

    let mut edit = body[digits_end..].chars();
    let reference = edit.next()?;
    if edit.next()? != '>' {
        return None;
    }
    let alternate = edit.next()?;
    if edit.next().is_some() || !is_base(reference) || !is_base(alternate) {
        return None;
    }

    Some(GenomicSub {
        accession: accession.to_ascii_uppercase(),
        position,
        reference: reference.to_ascii_uppercase(),
        alternate: alternate.to_ascii_uppercase(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_genomic_substitution() {
        let key = VariantKey::normalize("NC_000006.12:g.152387156G>A").unwrap();
        assert_eq!(key.canonical(), "NC_000006.12:g.152387156G>A");

        let sub = key.genomic_sub().unwrap();
        assert_eq!(sub.accession, "NC_000006.12");
        assert_eq!(sub.position, 152387156);
        assert_eq!(sub.reference, 'G');
        assert_eq!(sub.alternate, 'A');
    }

    #[test]
    fn test_case_insensitive_coalescing() {
        let a = VariantKey::normalize("nc_000006.12:G.152387156g>a").unwrap();
        let b = VariantKey::normalize("NC_000006.12:g.152387156G>A").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn test_whitespace_trimmed() {
        let key = VariantKey::normalize("  NC_000001.11:g.12345A>G\n").unwrap();
        assert_eq!(key.canonical(), "NC_000001.11:g.12345A>G");
    }

    #[test]
    fn test_idempotence() {
        for input in [
            "NC_000006.12:g.152387156G>A",
            "nc_000006.12:g.152387156g>a",
            "NM_000088.3:c.459del",
            "  rs12345  ",
        ] {
            let once = VariantKey::normalize(input).unwrap();
            let twice = VariantKey::normalize(once.canonical()).unwrap();
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(
            VariantKey::normalize(""),
            Err(AnnoError::InvalidInput { .. })
        ));
        assert!(matches!(
            VariantKey::normalize("   \t\n"),
            Err(AnnoError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_unrecognized_input_falls_back_to_literal() {
        // Not a genomic substitution, but still accepted: validity is the
        // provider's call.
        let key = VariantKey::normalize("NM_000088.3:c.459del").unwrap();
        assert!(key.genomic_sub().is_none());
        assert_eq!(key.canonical(), "NM_000088.3:C.459DEL");
    }

    #[test]
    fn test_structural_rejects_fall_back() {
        // Deletion, insertion, multi-base and malformed edits all fall back.
        for input in [
            "NC_000006.12:g.152387156del",
            "NC_000006.12:g.152387156G>",
            "NC_000006.12:g.G>A",
            "NC_000006.12:g.0G>A",
            "NC_000006.12:g.152387156GG>A",
            "NC_000006.12:c.152387156G>A",
            ":g.123A>G",
            "6:g.152387156N>A",
        ] {
            let key = VariantKey::normalize(input).unwrap();
            assert!(key.genomic_sub().is_none(), "unexpected parse for {input:?}");
        }
    }

    #[test]
    fn test_leading_zeros_collapse() {
        let a = VariantKey::normalize("NC_000001.11:g.0012345A>G").unwrap();
        let b = VariantKey::normalize("NC_000001.11:g.12345A>G").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_over_canonical_only() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(VariantKey::normalize("nc_000006.12:g.152387156g>a").unwrap());
        assert!(set.contains(&VariantKey::normalize("NC_000006.12:g.152387156G>A").unwrap()));
    }

    #[test]
    fn test_display_is_canonical() {
        let key = VariantKey::normalize("nc_000001.11:g.12345a>g").unwrap();
        assert_eq!(key.to_string(), "NC_000001.11:g.12345A>G");
    }
}
