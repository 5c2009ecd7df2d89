use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::quantity::{percent::Percent, power::Megawatts};

/// Record handed over to the host for one sensor.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SensorOutput {
    pub entity_id: String,
    pub name: String,
    pub state: SensorState,
    pub unit: Unit,

    /// The key set is fixed per sensor identity, missing values are `null`.
    pub attributes: BTreeMap<String, AttributeValue>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SensorState {
    Available(f64),
    Unavailable,
}

impl SensorState {
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available(_))
    }
}

impl Serialize for SensorState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Available(value) => serializer.serialize_f64(*value),
            Self::Unavailable => serializer.serialize_str("unavailable"),
        }
    }
}

impl Display for SensorState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available(value) => write!(f, "{value:.2}"),
            Self::Unavailable => f.write_str("unavailable"),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Unit {
    #[serde(rename = "MW")]
    Megawatt,

    #[serde(rename = "%")]
    Percent,
}

impl Unit {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Megawatt => Megawatts::SUFFIX,
            Self::Percent => Percent::SUFFIX,
        }
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Integer(u64),
    Number(f64),
    Text(String),
    List(Vec<Self>),
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<usize> for AttributeValue {
    fn from(value: usize) -> Self {
        Self::Integer(value as u64)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Megawatts> for AttributeValue {
    fn from(power: Megawatts) -> Self {
        Self::Number(power.rounded())
    }
}

impl From<Percent> for AttributeValue {
    fn from(percent: Percent) -> Self {
        Self::Number(percent.rounded())
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(timestamp: DateTime<Utc>) -> Self {
        Self::Text(timestamp.to_rfc3339())
    }
}

impl<T: Into<Self>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for AttributeValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}
