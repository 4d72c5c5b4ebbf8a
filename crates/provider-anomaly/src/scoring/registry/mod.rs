//! Bidirectional label/code tables for each categorical input dimension.
//!
//! Codes are handed out in first-seen order over the reference labels, so a
//! registry rebuilt from an identically ordered dataset reproduces the codes
//! the scoring model was trained against.

mod normalizer;

pub(crate) use normalizer::normalize_label;

use super::error::ScoringError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// One axis of categorical input, each with an independent code space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryDimension {
    Procedure,
    Provider,
}

impl CategoryDimension {
    pub const ALL: [CategoryDimension; 2] =
        [CategoryDimension::Procedure, CategoryDimension::Provider];

    pub fn label(&self) -> &'static str {
        match self {
            CategoryDimension::Procedure => "procedure",
            CategoryDimension::Provider => "provider",
        }
    }

    /// Column carrying this dimension in the reference dataset export.
    pub fn column(&self) -> &'static str {
        match self {
            CategoryDimension::Procedure => "Procedure",
            CategoryDimension::Provider => "Provider_Name",
        }
    }
}

impl fmt::Display for CategoryDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category dimension '{0}' (expected 'provider' or 'procedure')")]
pub struct UnknownDimension(pub String);

impl FromStr for CategoryDimension {
    type Err = UnknownDimension;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "procedure" | "procedures" => Ok(Self::Procedure),
            "provider" | "providers" | "provider_name" => Ok(Self::Provider),
            other => Err(UnknownDimension(other.to_string())),
        }
    }
}

/// Integer assigned to a label within a single dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryCode(pub u32);

impl CategoryCode {
    pub fn as_feature(&self) -> f64 {
        f64::from(self.0)
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whitespace-normalized provider or procedure name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryLabel(String);

impl CategoryLabel {
    pub fn new(raw: &str) -> Self {
        Self(normalize_label(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Forward and reverse tables for one dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryEncoding {
    dimension: CategoryDimension,
    forward: HashMap<CategoryLabel, CategoryCode>,
    reverse: Vec<CategoryLabel>,
}

impl CategoryEncoding {
    /// Assigns contiguous zero-based codes in first-seen order, skipping
    /// labels that normalize to one already assigned.
    pub fn build<I, S>(dimension: CategoryDimension, reference_labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut forward = HashMap::new();
        let mut reverse = Vec::new();

        for raw in reference_labels {
            let label = CategoryLabel::new(raw.as_ref());
            if forward.contains_key(&label) {
                continue;
            }

            let code = CategoryCode(reverse.len() as u32);
            forward.insert(label.clone(), code);
            reverse.push(label);
        }

        Self {
            dimension,
            forward,
            reverse,
        }
    }

    pub fn dimension(&self) -> CategoryDimension {
        self.dimension
    }

    pub fn encode(&self, label: &str) -> Result<CategoryCode, ScoringError> {
        let normalized = CategoryLabel::new(label);
        self.forward
            .get(&normalized)
            .copied()
            .ok_or_else(|| ScoringError::UnknownCategory {
                dimension: self.dimension,
                label: normalized.0,
                known_labels: self.known_labels(),
            })
    }

    pub fn decode(&self, code: CategoryCode) -> Result<&CategoryLabel, ScoringError> {
        self.reverse
            .get(code.0 as usize)
            .ok_or(ScoringError::UnknownCode {
                dimension: self.dimension,
                code,
            })
    }

    /// Labels in code order.
    pub fn labels(&self) -> &[CategoryLabel] {
        &self.reverse
    }

    pub fn known_labels(&self) -> Vec<String> {
        self.reverse.iter().map(|label| label.0.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }
}

/// Immutable snapshot of every dimension's encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRegistry {
    procedure: CategoryEncoding,
    provider: CategoryEncoding,
}

impl CategoryRegistry {
    pub fn from_labels<P, Q, S, T>(procedures: P, providers: Q) -> Self
    where
        P: IntoIterator<Item = S>,
        Q: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            procedure: CategoryEncoding::build(CategoryDimension::Procedure, procedures),
            provider: CategoryEncoding::build(CategoryDimension::Provider, providers),
        }
    }

    /// Returns a new snapshot with one dimension replaced. The receiver is
    /// left untouched so in-flight requests keep their codes.
    pub fn with_encoding(&self, encoding: CategoryEncoding) -> Self {
        let mut next = self.clone();
        match encoding.dimension() {
            CategoryDimension::Procedure => next.procedure = encoding,
            CategoryDimension::Provider => next.provider = encoding,
        }
        next
    }

    pub fn encoding(&self, dimension: CategoryDimension) -> &CategoryEncoding {
        match dimension {
            CategoryDimension::Procedure => &self.procedure,
            CategoryDimension::Provider => &self.provider,
        }
    }

    pub fn encode(
        &self,
        dimension: CategoryDimension,
        label: &str,
    ) -> Result<CategoryCode, ScoringError> {
        self.encoding(dimension).encode(label)
    }

    pub fn decode(
        &self,
        dimension: CategoryDimension,
        code: CategoryCode,
    ) -> Result<&CategoryLabel, ScoringError> {
        self.encoding(dimension).decode(code)
    }

    pub fn labels(&self, dimension: CategoryDimension) -> &[CategoryLabel] {
        self.encoding(dimension).labels()
    }

    /// Hex SHA-256 over the ordered label tables. Two registries share a
    /// fingerprint exactly when every label maps to the same code.
    ///
    /// Every name and label is length-prefixed and every table carries its
    /// label count, so no label content can shift a table boundary.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for dimension in CategoryDimension::ALL {
            update_framed(&mut hasher, dimension.label().as_bytes());
            let labels = self.labels(dimension);
            hasher.update((labels.len() as u64).to_le_bytes());
            for label in labels {
                update_framed(&mut hasher, label.as_str().as_bytes());
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

fn update_framed(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn procedures() -> CategoryEncoding {
        CategoryEncoding::build(
            CategoryDimension::Procedure,
            ["Echocardiogram", "MRI Scan", " Echocardiogram ", "Knee Replacement"],
        )
    }

    #[test]
    fn codes_follow_first_seen_order() {
        let encoding = procedures();
        assert_eq!(encoding.len(), 3);
        assert_eq!(encoding.encode("Echocardiogram"), Ok(CategoryCode(0)));
        assert_eq!(encoding.encode("MRI Scan"), Ok(CategoryCode(1)));
        assert_eq!(encoding.encode("Knee Replacement"), Ok(CategoryCode(2)));
    }

    #[test]
    fn encode_trims_before_lookup() {
        let encoding = procedures();
        assert_eq!(encoding.encode("  MRI Scan\n"), Ok(CategoryCode(1)));
    }

    #[test]
    fn encode_is_case_sensitive() {
        let encoding = procedures();
        match encoding.encode("mri scan") {
            Err(ScoringError::UnknownCategory { label, .. }) => assert_eq!(label, "mri scan"),
            other => panic!("expected unknown category, got {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_unassigned_codes() {
        let encoding = procedures();
        assert_eq!(
            encoding.decode(CategoryCode(1)).map(CategoryLabel::as_str),
            Ok("MRI Scan")
        );
        assert_eq!(
            encoding.decode(CategoryCode(3)),
            Err(ScoringError::UnknownCode {
                dimension: CategoryDimension::Procedure,
                code: CategoryCode(3),
            })
        );
    }

    #[test]
    fn with_encoding_produces_new_snapshot() {
        let registry = CategoryRegistry::from_labels(["Echocardiogram"], ["General Hospital"]);
        let extended = registry.with_encoding(CategoryEncoding::build(
            CategoryDimension::Procedure,
            ["Echocardiogram", "MRI Scan"],
        ));

        assert!(registry
            .encode(CategoryDimension::Procedure, "MRI Scan")
            .is_err());
        assert_eq!(
            extended.encode(CategoryDimension::Procedure, "MRI Scan"),
            Ok(CategoryCode(1))
        );
        assert_eq!(
            extended.encode(CategoryDimension::Provider, "General Hospital"),
            Ok(CategoryCode(0))
        );
        assert_ne!(registry.fingerprint(), extended.fingerprint());
    }

    #[test]
    fn fingerprint_tracks_label_order() {
        let a = CategoryRegistry::from_labels(["Echocardiogram", "MRI Scan"], ["A", "B"]);
        let b = CategoryRegistry::from_labels(["Echocardiogram", "MRI Scan"], ["A", "B"]);
        let reordered = CategoryRegistry::from_labels(["MRI Scan", "Echocardiogram"], ["A", "B"]);

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
        assert_ne!(a.fingerprint(), reordered.fingerprint());
    }

    #[test]
    fn fingerprint_separates_tables_and_labels() {
        let as_procedure = CategoryRegistry::from_labels(["provider"], Vec::<&str>::new());
        let as_provider = CategoryRegistry::from_labels(Vec::<&str>::new(), ["provider"]);
        assert_ne!(as_procedure, as_provider);
        assert_ne!(as_procedure.fingerprint(), as_provider.fingerprint());

        let multiline = CategoryRegistry::from_labels(["A\nB"], ["X"]);
        let split = CategoryRegistry::from_labels(["A", "B"], ["X"]);
        assert_ne!(multiline, split);
        assert_ne!(multiline.fingerprint(), split.fingerprint());
    }

    #[test]
    fn dimension_parses_from_path_segments() {
        assert_eq!(
            "Provider".parse::<CategoryDimension>(),
            Ok(CategoryDimension::Provider)
        );
        assert_eq!(
            "procedures".parse::<CategoryDimension>(),
            Ok(CategoryDimension::Procedure)
        );
        assert!("drg".parse::<CategoryDimension>().is_err());
    }
}
