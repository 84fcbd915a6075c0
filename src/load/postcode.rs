// src/load/postcode.rs
use crate::config::LookupColumns;
use crate::error::LoadError;
use crate::load::RawTable;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Postcode prefix (normalized) → Westminster constituency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostcodeMap {
    entries: HashMap<String, String>,
}

/// Trim, uppercase and collapse inner whitespace, so "sw1a  1" and "SW1A 1" match.
pub fn normalize_postcode(raw: &str) -> String {
    raw.split_whitespace()
        .map(|part| part.to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join(" ")
}

impl PostcodeMap {
    /// Build from a loaded lookup table. `constituency_column = None` takes the last column.
    pub fn from_table(
        raw: &RawTable,
        postcode_column: &str,
        constituency_column: Option<&str>,
    ) -> Result<Self, LoadError> {
        const TABLE: &str = "postcode lookup";
        let key_idx = raw.column_position(TABLE, postcode_column)?;
        let value_idx = match constituency_column {
            Some(name) => raw.column_position(TABLE, name)?,
            None => raw
                .headers
                .len()
                .checked_sub(1)
                .ok_or_else(|| LoadError::MissingColumn {
                    table: TABLE.to_string(),
                    column: "<constituency>".to_string(),
                })?,
        };

        let mut entries = HashMap::with_capacity(raw.rows.len());
        let mut duplicates = 0usize;
        for row in &raw.rows {
            let (Some(key), Some(value)) = (row.get(key_idx), row.get(value_idx)) else {
                continue;
            };
            let key = normalize_postcode(key);
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                continue;
            }
            if entries.contains_key(&key) {
                duplicates += 1;
                continue;
            }
            entries.insert(key, value.to_string());
        }

        if duplicates > 0 {
            warn!(duplicates, "postcode lookup repeats keys; first entry kept");
        }
        Ok(Self { entries })
    }

    pub fn get(&self, postcode: &str) -> Option<&str> {
        self.entries
            .get(&normalize_postcode(postcode))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for PostcodeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut entries = HashMap::new();
        for (k, v) in iter {
            entries
                .entry(normalize_postcode(k.as_ref()))
                .or_insert_with(|| v.into());
        }
        Self { entries }
    }
}

#[tracing::instrument(level = "info", skip(path, columns), fields(path = %path.as_ref().display()))]
pub fn load_postcode_map<P: AsRef<Path>>(
    path: P,
    columns: &LookupColumns,
) -> Result<PostcodeMap, LoadError> {
    let raw = RawTable::from_csv_path(path)?;
    let map = PostcodeMap::from_table(&raw, &columns.postcode, columns.constituency.as_deref())?;
    info!(entries = map.len(), "loaded postcode lookup");
    Ok(map)
}
