//! Ingredient catalogue files.
//!
//! Catalogues are JSON arrays, either of plain records
//! (`{"name": ..., "measurement_unit": ...}`) or of fixture entries that wrap
//! each record as `{"model": ..., "pk": ..., "fields": {...}}`. The two shapes
//! may not be mixed in one file.

use serde::Deserialize;
use thiserror::Error;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_UNIT_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IngredientRecord {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Deserialize)]
struct FixtureEntry {
    fields: IngredientRecord,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Catalogue {
    Plain(Vec<IngredientRecord>),
    Fixture(Vec<FixtureEntry>),
}

#[derive(Error, Debug)]
pub enum CatalogueError {
    #[error("Invalid catalogue JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Entry {index}: {message}")]
    Entry { index: usize, message: String },
}

/// Parse a catalogue file. Names and units are trimmed; every record must
/// have a non-empty name and unit within the column limits.
pub fn parse_catalogue(json: &str) -> Result<Vec<IngredientRecord>, CatalogueError> {
    let records = match serde_json::from_str::<Catalogue>(json)? {
        Catalogue::Plain(records) => records,
        Catalogue::Fixture(entries) => entries.into_iter().map(|e| e.fields).collect(),
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            normalize(record).map_err(|message| CatalogueError::Entry { index, message })
        })
        .collect()
}

fn normalize(record: IngredientRecord) -> Result<IngredientRecord, String> {
    let name = record.name.trim().to_string();
    let measurement_unit = record.measurement_unit.trim().to_string();

    if name.is_empty() {
        return Err("name is empty".to_string());
    }
    if measurement_unit.is_empty() {
        return Err(format!("measurement unit of {name:?} is empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(format!("name {name:?} is longer than {MAX_NAME_LEN} characters"));
    }
    if measurement_unit.chars().count() > MAX_UNIT_LEN {
        return Err(format!(
            "measurement unit of {name:?} is longer than {MAX_UNIT_LEN} characters"
        ));
    }

    Ok(IngredientRecord {
        name,
        measurement_unit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_list() {
        let records = parse_catalogue(
            r#"[
                {"name": "flour", "measurement_unit": "g"},
                {"name": " milk ", "measurement_unit": "ml"}
            ]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "milk");
    }

    #[test]
    fn test_fixture_list() {
        let records = parse_catalogue(
            r#"[
                {"model": "recipes.ingredient", "pk": 1,
                 "fields": {"name": "salt", "measurement_unit": "pinch"}}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            records,
            vec![IngredientRecord {
                name: "salt".to_string(),
                measurement_unit: "pinch".to_string(),
            }]
        );
    }

    #[test]
    fn test_empty_file_is_an_empty_catalogue() {
        assert!(parse_catalogue("[]").unwrap().is_empty());
    }

    #[test]
    fn test_bad_entry_reports_its_index() {
        let err = parse_catalogue(
            r#"[
                {"name": "flour", "measurement_unit": "g"},
                {"name": "egg", "measurement_unit": "  "}
            ]"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogueError::Entry { index: 1, .. }));
    }

    #[test]
    fn test_long_unit_rejected() {
        let json = format!(
            r#"[{{"name": "x", "measurement_unit": "{}"}}]"#,
            "u".repeat(MAX_UNIT_LEN + 1)
        );
        assert!(parse_catalogue(&json).is_err());
    }

    #[test]
    fn test_not_a_list() {
        assert!(matches!(
            parse_catalogue(r#"{"name": "flour"}"#),
            Err(CatalogueError::Json(_))
        ));
    }
}
