use crate::scoring::registry::normalize_label;
use serde::{Deserialize, Deserializer};
use std::io::Read;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReferenceRecord {
    pub(crate) provider: String,
    pub(crate) procedure: String,
}

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<ReferenceRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for record in csv_reader.deserialize::<ReferenceRow>() {
        let row = record?;
        records.push(ReferenceRecord {
            provider: row.provider_name,
            procedure: row.procedure,
        });
    }

    Ok(records)
}

/// Only the categorical columns are read; numeric columns in the export
/// belong to training and are ignored here.
#[derive(Debug, Deserialize)]
struct ReferenceRow {
    #[serde(rename = "Provider_Name", deserialize_with = "normalized_string")]
    provider_name: String,
    #[serde(rename = "Procedure", deserialize_with = "normalized_string")]
    procedure: String,
}

fn normalized_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(normalize_label(&value))
}
