use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of the named empty block.
pub const AIR: &str = "air";

/// Quarter-turn rotation of a placed block.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    /// Accepts any multiple of 90, including negatives and full turns.
    pub fn from_degrees(deg: i64) -> Option<Self> {
        match deg.rem_euclid(360) {
            0 => Some(Self::R0),
            90 => Some(Self::R90),
            180 => Some(Self::R180),
            270 => Some(Self::R270),
            _ => None,
        }
    }

    #[inline]
    pub fn degrees(self) -> u16 {
        match self {
            Self::R0 => 0,
            Self::R90 => 90,
            Self::R180 => 180,
            Self::R270 => 270,
        }
    }
}

impl Serialize for Rotation {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u16(self.degrees())
    }
}

impl<'de> Deserialize<'de> for Rotation {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let deg = i64::deserialize(d)?;
        Rotation::from_degrees(deg)
            .ok_or_else(|| serde::de::Error::custom(format!("rotation {deg} is not a multiple of 90")))
    }
}

/// How a block interacts with movement and light.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockMode {
    #[default]
    Solid,
    Platform,
    Background,
    Liquid,
}

impl BlockMode {
    #[inline]
    pub fn is_solid(self) -> bool {
        matches!(self, BlockMode::Solid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BlockMode::Solid => "solid",
            BlockMode::Platform => "platform",
            BlockMode::Background => "background",
            BlockMode::Liquid => "liquid",
        }
    }
}

impl FromStr for BlockMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solid" => Ok(BlockMode::Solid),
            "platform" => Ok(BlockMode::Platform),
            "background" => Ok(BlockMode::Background),
            "liquid" => Ok(BlockMode::Liquid),
            other => Err(format!("unknown block mode '{other}'")),
        }
    }
}

impl fmt::Display for BlockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimal solidity record kept for imported or legacy cells.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockMark {
    pub mode: BlockMode,
}

/// Stored content of one chunk cell.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CellValue {
    #[default]
    Empty,
    Block(String),
    Transform {
        name: String,
        rotation: Rotation,
        invert: bool,
    },
}

impl CellValue {
    pub fn block(name: impl Into<String>) -> Self {
        CellValue::Block(name.into())
    }

    /// Wraps in a transform only when rotation or invert differ from the defaults.
    pub fn placed(name: impl Into<String>, rotation: Rotation, invert: bool) -> Self {
        if rotation == Rotation::R0 && !invert {
            CellValue::Block(name.into())
        } else {
            CellValue::Transform {
                name: name.into(),
                rotation,
                invert,
            }
        }
    }

    #[inline]
    pub fn id(&self) -> Option<&str> {
        match self {
            CellValue::Empty => None,
            CellValue::Block(name) | CellValue::Transform { name, .. } => Some(name),
        }
    }

    /// True for `Empty` and for the named empty block.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.id().is_none_or(|id| id.is_empty() || id == AIR)
    }

    #[inline]
    pub fn rotation(&self) -> Rotation {
        match self {
            CellValue::Transform { rotation, .. } => *rotation,
            _ => Rotation::R0,
        }
    }

    #[inline]
    pub fn invert(&self) -> bool {
        matches!(self, CellValue::Transform { invert: true, .. })
    }

    /// Reads the dynamic write shapes: `null`, an identifier string, or
    /// `{id, rot?, invert?}`. Anything else is `None`.
    pub fn from_json(value: &Value) -> Option<CellValue> {
        match value {
            Value::Null => Some(CellValue::Empty),
            Value::String(s) => Some(CellValue::Block(s.clone())),
            Value::Object(map) => {
                let id = map.get("id")?.as_str()?;
                let rotation = match map.get("rot").or_else(|| map.get("rotation")) {
                    None | Some(Value::Null) => Rotation::R0,
                    Some(v) => v.as_i64().and_then(Rotation::from_degrees).unwrap_or_else(|| {
                        log::debug!("ignoring invalid rotation {} on '{}'", v, id);
                        Rotation::R0
                    }),
                };
                let invert = map.get("invert").and_then(Value::as_bool).unwrap_or(false);
                Some(CellValue::placed(id, rotation, invert))
            }
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => f.write_str("<empty>"),
            CellValue::Block(name) => f.write_str(name),
            CellValue::Transform {
                name,
                rotation,
                invert,
            } => write!(
                f,
                "{}@{}{}",
                name,
                rotation.degrees(),
                if *invert { "!" } else { "" }
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn air_and_empty_are_empty() {
        assert!(CellValue::Empty.is_empty());
        assert!(CellValue::block(AIR).is_empty());
        assert!(CellValue::placed(AIR, Rotation::R90, false).is_empty());
        assert!(!CellValue::block("stone").is_empty());
    }

    #[test]
    fn placed_only_wraps_non_default() {
        assert_eq!(CellValue::placed("dirt", Rotation::R0, false), CellValue::block("dirt"));
        assert!(matches!(
            CellValue::placed("dirt", Rotation::R180, false),
            CellValue::Transform { .. }
        ));
        assert!(CellValue::placed("dirt", Rotation::R0, true).invert());
    }

    #[test]
    fn json_shapes() {
        assert_eq!(CellValue::from_json(&json!(null)), Some(CellValue::Empty));
        assert_eq!(CellValue::from_json(&json!("sand")), Some(CellValue::block("sand")));
        assert_eq!(
            CellValue::from_json(&json!({"id": "log", "rot": 90, "invert": true})),
            Some(CellValue::Transform {
                name: "log".into(),
                rotation: Rotation::R90,
                invert: true
            })
        );
        assert_eq!(
            CellValue::from_json(&json!({"id": "log", "rot": 45})),
            Some(CellValue::block("log"))
        );
        assert_eq!(CellValue::from_json(&json!(3)), None);
        assert_eq!(CellValue::from_json(&json!([1, 2])), None);
        assert_eq!(CellValue::from_json(&json!({"rot": 90})), None);
    }

    #[test]
    fn rotation_normalizes_turns() {
        assert_eq!(Rotation::from_degrees(-90), Some(Rotation::R270));
        assert_eq!(Rotation::from_degrees(450), Some(Rotation::R90));
        assert_eq!(Rotation::from_degrees(30), None);
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("Liquid".parse::<BlockMode>(), Ok(BlockMode::Liquid));
        assert!("gooey".parse::<BlockMode>().is_err());
        assert_eq!(BlockMode::default(), BlockMode::Solid);
    }
}
