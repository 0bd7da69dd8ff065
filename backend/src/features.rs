//! Turns a customer record into the model's input row.
//!
//! The model artifact ships with an ordered list of feature names. Numeric
//! columns appear under their wire name (`tenure`, `MonthlyCharges`, ...);
//! categorical columns are one-hot encoded as `Column=Value`.

use std::path::Path;

use crate::error::{ChurnError, Result};
use crate::models::{Column, ColumnValue, CustomerRecord};

const INDICATOR_SEPARATOR: char = '=';

#[derive(Debug, Clone, Copy, PartialEq)]
enum FeatureSlot {
    Numeric(Column),
    Indicator { column: Column, value: &'static str },
}

#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    slots: Vec<FeatureSlot>,
    names: Vec<String>,
}

impl FeatureEncoder {
    /// Reads the JSON feature-name list written next to the model.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ChurnError::MissingArtifact {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|e| ChurnError::ModelLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let names: Vec<String> = serde_json::from_str(&raw).map_err(|e| ChurnError::ModelLoad {
            path: path.to_path_buf(),
            message: format!("feature names must be a JSON array of strings: {e}"),
        })?;
        Self::from_names(names)
    }

    pub fn from_names(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(ChurnError::FeatureSchema {
                name: String::new(),
                reason: "feature list is empty".into(),
            });
        }
        let slots = names
            .iter()
            .map(|name| resolve(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { slots, names })
    }

    /// One numeric feature per column, one indicator per categorical label.
    pub fn canonical() -> Self {
        let mut slots = Vec::new();
        let mut names = Vec::new();
        for column in Column::ALL {
            match column.domain() {
                None => {
                    slots.push(FeatureSlot::Numeric(column));
                    names.push(column.name().to_string());
                }
                Some(labels) => {
                    for &value in labels {
                        slots.push(FeatureSlot::Indicator { column, value });
                        names.push(format!("{}{}{}", column.name(), INDICATOR_SEPARATOR, value));
                    }
                }
            }
        }
        Self { slots, names }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn encode(&self, record: &CustomerRecord) -> Vec<f32> {
        self.slots
            .iter()
            .map(|slot| match *slot {
                FeatureSlot::Numeric(column) => match record.value(column) {
                    ColumnValue::Number(value) => value as f32,
                    ColumnValue::Category(_) => 0.0,
                },
                FeatureSlot::Indicator { column, value } => {
                    if record.value(column) == ColumnValue::Category(value) {
                        1.0
                    } else {
                        0.0
                    }
                }
            })
            .collect()
    }
}

fn resolve(name: &str) -> Result<FeatureSlot> {
    let schema_error = |reason: String| ChurnError::FeatureSchema {
        name: name.to_string(),
        reason,
    };

    if let Some(column) = Column::from_name(name) {
        return match column.domain() {
            None => Ok(FeatureSlot::Numeric(column)),
            Some(_) => Err(schema_error(format!(
                "categorical column must be one-hot encoded as {}=<value>",
                column.name()
            ))),
        };
    }

    let (column_name, label) = name
        .split_once(INDICATOR_SEPARATOR)
        .ok_or_else(|| schema_error("unknown column".into()))?;
    let column = Column::from_name(column_name)
        .ok_or_else(|| schema_error(format!("unknown column {column_name:?}")))?;
    let domain = column
        .domain()
        .ok_or_else(|| schema_error(format!("{column_name} is numeric")))?;
    let value = domain
        .iter()
        .copied()
        .find(|candidate| *candidate == label)
        .ok_or_else(|| schema_error(format!("{label:?} is not a valid {column_name} value")))?;

    Ok(FeatureSlot::Indicator { column, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Contract;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn encodes_in_declared_order() {
        let encoder = FeatureEncoder::from_names(names(&[
            "MonthlyCharges",
            "Contract=Month-to-month",
            "Contract=Two year",
            "tenure",
        ]))
        .unwrap();

        let mut record = CustomerRecord::demo();
        record.tenure = 5;
        record.monthly_charges = 42.5;
        assert_eq!(encoder.encode(&record), vec![42.5, 1.0, 0.0, 5.0]);

        record.contract = Contract::TwoYear;
        assert_eq!(encoder.encode(&record), vec![42.5, 0.0, 1.0, 5.0]);
    }

    #[test]
    fn rejects_unknown_or_malformed_names() {
        for bad in ["CustomerID", "Contract", "Contract=Three year", "tenure=1", "Foo=Bar"] {
            let err = FeatureEncoder::from_names(names(&[bad])).unwrap_err();
            assert!(
                matches!(err, ChurnError::FeatureSchema { .. }),
                "{bad} should be a schema error"
            );
        }
        assert!(FeatureEncoder::from_names(Vec::new()).is_err());
    }

    #[test]
    fn canonical_layout_covers_every_label() {
        let encoder = FeatureEncoder::canonical();
        // 4 numeric columns plus the one-hot width of the 15 categorical ones.
        assert_eq!(encoder.len(), 4 + 41);
        let row = encoder.encode(&CustomerRecord::demo());
        let hot: f32 = encoder
            .names()
            .iter()
            .zip(&row)
            .filter(|(name, _)| name.contains('='))
            .map(|(_, v)| *v)
            .sum();
        assert_eq!(hot, 15.0);
    }

    #[test]
    fn canonical_names_resolve_to_the_same_slots() {
        let canonical = FeatureEncoder::canonical();
        let reloaded = FeatureEncoder::from_names(canonical.names().to_vec()).unwrap();
        assert_eq!(reloaded.slots, canonical.slots);
    }

    #[test]
    fn missing_file_is_a_missing_artifact() {
        let err = FeatureEncoder::load("/nonexistent/feature_names.json").unwrap_err();
        assert!(matches!(err, ChurnError::MissingArtifact { .. }));
    }

    #[test]
    fn loads_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feature_names.json");
        std::fs::write(&path, r#"["tenure", "Gender=Male"]"#).unwrap();
        let encoder = FeatureEncoder::load(&path).unwrap();
        assert_eq!(encoder.encode(&CustomerRecord::demo()), vec![1.0, 1.0]);

        std::fs::write(&path, "{\"tenure\": 1}").unwrap();
        assert!(matches!(
            FeatureEncoder::load(&path),
            Err(ChurnError::ModelLoad { .. })
        ));
    }
}
