//! Externally supplied chunk contents, including the legacy numeric form.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use tessera_blocks::CellValue;

/// Numeric cells below this mark a solid tile in legacy data.
pub const LEGACY_SOLID_BELOW: f64 = 1.0;

#[derive(Clone, Debug, PartialEq)]
pub enum ImportCell {
    Value(CellValue),
    /// Legacy numeric density; only meaningful to the import path.
    Legacy(f64),
}

impl ImportCell {
    pub fn from_json(v: &Value) -> Self {
        if let Some(n) = v.as_f64() {
            return ImportCell::Legacy(n);
        }
        match CellValue::from_json(v) {
            Some(c) => ImportCell::Value(c),
            None => {
                log::debug!("unreadable import cell {}; stored as empty", v);
                ImportCell::Value(CellValue::Empty)
            }
        }
    }

    #[inline]
    pub fn is_legacy_solid(&self) -> bool {
        matches!(self, ImportCell::Legacy(n) if *n < LEGACY_SOLID_BELOW)
    }

    /// What the chunk stores for this cell. Legacy numbers never reach the chunk.
    pub fn into_cell(self) -> CellValue {
        match self {
            ImportCell::Value(v) => v,
            ImportCell::Legacy(_) => CellValue::Empty,
        }
    }
}

impl From<CellValue> for ImportCell {
    fn from(v: CellValue) -> Self {
        ImportCell::Value(v)
    }
}

impl<'de> Deserialize<'de> for ImportCell {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(ImportCell::from_json(&v))
    }
}

/// Shapes accepted by `ChunkStore::import_chunk`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ImportData {
    /// Re-synthesize a named chunk type without cave carving.
    Named(String),
    /// `chunk_size`-wide rows; height is inferred.
    Flat(Vec<ImportCell>),
    Sized {
        width: usize,
        height: usize,
        #[serde(default)]
        data: Vec<ImportCell>,
    },
}

impl ImportData {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_shapes() {
        assert_eq!(
            ImportData::from_json_str(r#""plains""#).unwrap(),
            ImportData::Named("plains".into())
        );
        let flat = ImportData::from_json_str(r#"["stone", null, 0.25, {"id": "log", "rot": 90}]"#).unwrap();
        let ImportData::Flat(cells) = flat else {
            panic!("expected flat import");
        };
        assert_eq!(cells[0], ImportCell::Value(CellValue::block("stone")));
        assert_eq!(cells[1], ImportCell::Value(CellValue::Empty));
        assert!(cells[2].is_legacy_solid());
        assert!(matches!(&cells[3], ImportCell::Value(CellValue::Transform { .. })));
        let sized = ImportData::from_json_str(r#"{"width": 2, "height": 1, "data": [1, 1.5]}"#).unwrap();
        assert!(matches!(sized, ImportData::Sized { width: 2, height: 1, .. }));
    }

    #[test]
    fn legacy_threshold() {
        assert!(ImportCell::Legacy(0.0).is_legacy_solid());
        assert!(ImportCell::Legacy(0.999).is_legacy_solid());
        assert!(!ImportCell::Legacy(1.0).is_legacy_solid());
        assert_eq!(ImportCell::Legacy(0.1).into_cell(), CellValue::Empty);
    }

    #[test]
    fn unreadable_cells_become_empty() {
        assert_eq!(
            ImportCell::from_json(&serde_json::json!(true)),
            ImportCell::Value(CellValue::Empty)
        );
    }
}
