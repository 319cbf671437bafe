//! Typed key/value preferences.
//!
//! Every persisted field is addressed by a stable string identifier so the
//! on-disk format stays readable by older and newer versions. Keys this
//! version does not know about are carried through edits untouched.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// A single stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Rust types that can be stored under a [`PrefKey`].
pub trait PrefType: Sized {
    fn into_value(self) -> PrefValue;
    fn from_value(value: &PrefValue) -> Option<Self>;
}

impl PrefType for bool {
    fn into_value(self) -> PrefValue {
        PrefValue::Bool(self)
    }

    fn from_value(value: &PrefValue) -> Option<Self> {
        match value {
            PrefValue::Bool(b) => Some(*b),
            PrefValue::Int(_) | PrefValue::Text(_) => None,
        }
    }
}

impl PrefType for u32 {
    fn into_value(self) -> PrefValue {
        PrefValue::Int(i64::from(self))
    }

    fn from_value(value: &PrefValue) -> Option<Self> {
        match value {
            PrefValue::Int(n) => u32::try_from(*n).ok(),
            PrefValue::Bool(_) | PrefValue::Text(_) => None,
        }
    }
}

/// Timestamps are stored as milliseconds since the Unix epoch.
impl PrefType for DateTime<Utc> {
    fn into_value(self) -> PrefValue {
        PrefValue::Int(self.timestamp_millis())
    }

    fn from_value(value: &PrefValue) -> Option<Self> {
        match value {
            PrefValue::Int(ms) => DateTime::from_timestamp_millis(*ms),
            PrefValue::Bool(_) | PrefValue::Text(_) => None,
        }
    }
}

/// A stable identifier bound to the type stored under it.
pub struct PrefKey<T> {
    name: &'static str,
    _type: PhantomData<fn() -> T>,
}

impl<T> PrefKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _type: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for PrefKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PrefKey<T> {}

impl<T> std::fmt::Debug for PrefKey<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PrefKey").field(&self.name).finish()
    }
}

/// Persisted keys. The names are part of the storage format and must not change.
pub mod keys {
    use super::PrefKey;
    use chrono::{DateTime, Utc};

    pub const FIRST_LAUNCH_AT: PrefKey<DateTime<Utc>> = PrefKey::new("first_launch_at");
    pub const LAUNCH_COUNT: PrefKey<u32> = PrefKey::new("launch_count");
    pub const LAST_PROMPT_AT: PrefKey<DateTime<Utc>> = PrefKey::new("last_prompt_at");
    pub const PROMPT_COUNT: PrefKey<u32> = PrefKey::new("prompt_count");
    pub const OPT_OUT: PrefKey<bool> = PrefKey::new("opt_out");
    pub const SENTIMENT_POSITIVE: PrefKey<bool> = PrefKey::new("sentiment_positive");
    pub const PASSIVE_SHOWN_COUNT: PrefKey<u32> = PrefKey::new("passive_shown_count");
    pub const LAST_PASSIVE_SHOWN_AT: PrefKey<DateTime<Utc>> =
        PrefKey::new("last_passive_shown_at");
}

/// An in-memory view of the whole preference set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Preferences(BTreeMap<String, PrefValue>);

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a typed value. A value of the wrong type is reported as corrupt
    /// rather than silently treated as absent.
    pub fn get<T: PrefType>(&self, key: PrefKey<T>) -> Result<Option<T>, StorageError> {
        match self.0.get(key.name()) {
            None => Ok(None),
            Some(value) => T::from_value(value).map(Some).ok_or_else(|| StorageError::Corrupt {
                key: key.name().to_string(),
                message: format!("unexpected value {value:?}"),
            }),
        }
    }

    pub fn set<T: PrefType>(&mut self, key: PrefKey<T>, value: T) {
        self.0.insert(key.name().to_string(), value.into_value());
    }

    pub fn remove<T>(&mut self, key: PrefKey<T>) {
        self.0.remove(key.name());
    }

    pub fn contains<T>(&self, key: PrefKey<T>) -> bool {
        self.0.contains_key(key.name())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PrefValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn get_raw(&self, key: &str) -> Option<&PrefValue> {
        self.0.get(key)
    }

    pub(crate) fn insert_raw(&mut self, key: String, value: PrefValue) {
        self.0.insert(key, value);
    }
}
