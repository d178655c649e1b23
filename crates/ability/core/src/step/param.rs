//! Typed step parameters and sparse parameter tables.
//!
//! Definitions carry a table of defaults; entries carry a sparse table of
//! overrides. Lookups never write to either table.

use std::collections::BTreeMap;

/// Reference to an external asset (visual effect prefab, sound, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ObjectRef(pub String);

impl ObjectRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single typed parameter value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamValue {
    Float(f32),
    Int(i64),
    Bool(bool),
    String(String),
    Object(ObjectRef),
}

impl ParamValue {
    /// Reads the value as a float. Integers widen; other types do not convert.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            ParamValue::Float(value) => Some(*value),
            ParamValue::Int(value) => Some(*value as f32),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            ParamValue::Object(value) => Some(value),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Float(_) => "float",
            ParamValue::Int(_) => "int",
            ParamValue::Bool(_) => "bool",
            ParamValue::String(_) => "string",
            ParamValue::Object(_) => "object",
        }
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Float(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value as f32)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_owned())
    }
}

impl From<ObjectRef> for ParamValue {
    fn from(value: ObjectRef) -> Self {
        ParamValue::Object(value)
    }
}

/// Sparse, ordered table of named parameters.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ParamTable(BTreeMap<String, ParamValue>);

impl ParamTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: insert a parameter.
    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.0.insert(key.to_owned(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Overlays `other` on top of this table (other wins on conflicts).
    pub fn merge(&mut self, other: &ParamTable) {
        for (key, value) in other.iter() {
            self.0.insert(key.to_owned(), value.clone());
        }
    }
}

impl<K: Into<String>> FromIterator<(K, ParamValue)> for ParamTable {
    fn from_iter<T: IntoIterator<Item = (K, ParamValue)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Parameter keys understood by the built-in step kinds.
pub mod keys {
    /// Forward offset from the owner, in owner-local space.
    pub const OFFSET_FORWARD: &str = "offset_forward";
    /// Lateral offset from the owner (positive = left of facing).
    pub const OFFSET_SIDE: &str = "offset_side";
    /// Multiplier applied on top of the cast's area scale.
    pub const SCALE_MULTIPLIER: &str = "scale_multiplier";
    /// Effect lifetime before cast speed scaling, in seconds.
    pub const BASE_DURATION: &str = "base_duration";
    /// Visual asset to instantiate for a spawned effect.
    pub const EFFECT_ASSET: &str = "effect_asset";
    /// Circle radius before area scaling.
    pub const RADIUS: &str = "radius";
    /// Rectangle extent along the facing direction.
    pub const LENGTH: &str = "length";
    /// Rectangle extent across the facing direction.
    pub const WIDTH: &str = "width";
    /// Extra rotation of a rectangle relative to facing, in degrees.
    pub const ANGLE_OFFSET: &str = "angle_offset";
    /// Damage multiplier passed to the snapshot factory.
    pub const DAMAGE_MULTIPLIER: &str = "damage_multiplier";
    /// Index of an earlier step whose runtime result shapes this step.
    pub const SOURCE_STEP_INDEX: &str = "source_step_index";
    /// Fraction of the source's lifetime to wait before firing.
    pub const FIRE_AT_SOURCE_FRACTION: &str = "fire_at_source_fraction";
}
