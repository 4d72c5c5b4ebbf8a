//! Reference dataset export that seeds the category registry.

mod parser;

use super::registry::{CategoryDimension, CategoryRegistry};
use parser::ReferenceRecord;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ReferenceDatasetError {
    #[error("failed to read reference dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid reference dataset CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("reference dataset contains no rows")]
    Empty,
}

/// Ordered provider/procedure rows. Row order is significant: it decides the
/// codes assigned when the registry is built.
#[derive(Debug, Clone)]
pub struct ReferenceDataset {
    records: Vec<ReferenceRecord>,
}

impl ReferenceDataset {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReferenceDatasetError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReferenceDatasetError> {
        let records = parser::parse_records(reader)?;
        if records.is_empty() {
            return Err(ReferenceDatasetError::Empty);
        }

        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every row's label for the dimension, duplicates included.
    pub fn labels(&self, dimension: CategoryDimension) -> impl Iterator<Item = &str> + '_ {
        self.records.iter().map(move |record| match dimension {
            CategoryDimension::Procedure => record.procedure.as_str(),
            CategoryDimension::Provider => record.provider.as_str(),
        })
    }

    /// Distinct labels in first-seen order, as offered to form front ends.
    pub fn unique_labels(&self, dimension: CategoryDimension) -> Vec<String> {
        let mut seen = HashSet::new();
        self.labels(dimension)
            .filter(|label| seen.insert(*label))
            .map(str::to_string)
            .collect()
    }

    pub fn registry(&self) -> CategoryRegistry {
        CategoryRegistry::from_labels(
            self.labels(CategoryDimension::Procedure),
            self.labels(CategoryDimension::Provider),
        )
    }
}
