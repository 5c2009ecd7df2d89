use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::{catalog::SourceCatalog, prelude::*, quantity::power::Megawatts, settings::Country};

/// The only unit accepted without conversion.
pub const NATIVE_UNIT: &str = "MW";

const FORECAST_SUFFIXES: [&str; 2] = ["_forecast", "_planned"];

/// Epoch values at or above this are milliseconds, below are seconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// The payload cannot be turned into a snapshot at all.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("payload has no timestamp")]
    MissingTimestamp,

    #[error("unrecognized payload timestamp: {0}")]
    UnrecognizedTimestamp(Value),

    #[error("payload has no entries")]
    Empty,

    #[error("payload is not a generation mix")]
    Json(#[from] serde_json::Error),
}

/// Generation mix as handed over by the fetch layer.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawPayload {
    #[serde(default)]
    pub timestamp: Option<Value>,

    #[serde(default)]
    pub entries: Vec<RawEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawEntry {
    pub identifier: String,

    #[serde(default)]
    pub value: Value,

    /// Missing unit means megawatts.
    #[serde(default)]
    pub unit: Option<String>,

    #[serde(default)]
    pub timestamp: Option<Value>,
}

impl RawPayload {
    pub fn from_json(json: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl RawEntry {
    pub fn new(identifier: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { identifier: identifier.into(), value: value.into(), unit: None, timestamp: None }
    }
}

/// Instantaneous power of a single source.
#[derive(Clone, Debug, PartialEq)]
pub struct Reading {
    pub source_id: String,

    /// `None` when the upstream value was missing or not a number.
    pub power: Option<Megawatts>,

    pub timestamp: DateTime<Utc>,
}

/// Normalized generation mix of one country at one point in time.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub country: Country,
    pub timestamp: DateTime<Utc>,

    /// At most one reading per source, in the order of first appearance.
    pub readings: Vec<Reading>,

    /// Forecast series, never counted in totals.
    pub forecasts: Vec<Reading>,

    /// Number of non-generation and foreign-unit entries that have been dropped.
    pub skipped: usize,
}

impl Snapshot {
    pub fn get(&self, source_id: &str) -> Option<&Reading> {
        self.readings.iter().find(|reading| reading.source_id == source_id)
    }

    pub fn forecast(&self, source_id: &str) -> Option<&Reading> {
        self.forecasts.iter().find(|reading| reading.source_id == source_id)
    }
}

/// Normalize the raw payload through the catalog.
///
/// Unknown identifiers are kept as-is and fall into the «other» category downstream.
/// A value that cannot be parsed only makes its own reading undefined.
pub fn normalize(payload: &RawPayload, catalog: &SourceCatalog) -> Result<Snapshot, PayloadError> {
    let timestamp = payload.timestamp.as_ref().ok_or(PayloadError::MissingTimestamp)?;
    let timestamp = parse_timestamp(timestamp)
        .ok_or_else(|| PayloadError::UnrecognizedTimestamp(timestamp.clone()))?;
    if payload.entries.is_empty() {
        return Err(PayloadError::Empty);
    }

    let mut readings = Readings::default();
    let mut forecasts = Readings::default();
    let mut skipped = 0;

    for entry in &payload.entries {
        let slug = crate::catalog::slugify(&entry.identifier);
        if catalog.is_non_generation(&slug) {
            debug!(identifier = %entry.identifier, "skipped non-generation series");
            skipped += 1;
            continue;
        }
        if let Some(unit) = entry.unit.as_deref()
            && !unit.trim().eq_ignore_ascii_case(NATIVE_UNIT)
        {
            debug!(identifier = %entry.identifier, unit, "skipped entry in a foreign unit");
            skipped += 1;
            continue;
        }

        let power = parse_power(&entry.value);
        if power.is_none() {
            debug!(identifier = %entry.identifier, value = %entry.value, "undefined value");
        }
        let timestamp = entry.timestamp.as_ref().and_then(parse_timestamp).unwrap_or(timestamp);

        if let Some(base) = FORECAST_SUFFIXES.iter().find_map(|suffix| slug.strip_suffix(*suffix)) {
            forecasts.merge(catalog.canonical_id(base), power, timestamp);
        } else {
            let source_id = catalog.canonical_id(&slug);
            if !catalog.is_recognized(&source_id) {
                debug!(identifier = %entry.identifier, %source_id, "unrecognized source");
            }
            readings.merge(source_id, power, timestamp);
        }
    }

    Ok(Snapshot {
        country: catalog.country(),
        timestamp,
        readings: readings.readings,
        forecasts: forecasts.readings,
        skipped,
    })
}

/// Readings with at most one entry per source.
#[derive(Default)]
struct Readings {
    readings: Vec<Reading>,
    indices: HashMap<String, usize>,
}

impl Readings {
    /// Duplicates are summed so that no power gets lost.
    fn merge(&mut self, source_id: String, power: Option<Megawatts>, timestamp: DateTime<Utc>) {
        if let Some(&index) = self.indices.get(&source_id) {
            let reading = &mut self.readings[index];
            reading.power = match (reading.power, power) {
                (Some(lhs), Some(rhs)) => Some(lhs + rhs),
                (lhs, rhs) => lhs.or(rhs),
            };
            reading.timestamp = reading.timestamp.max(timestamp);
        } else {
            self.indices.insert(source_id.clone(), self.readings.len());
            self.readings.push(Reading { source_id, power, timestamp });
        }
    }
}

fn parse_power(value: &Value) -> Option<Megawatts> {
    let power = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    power.is_finite().then_some(Megawatts(power))
}

/// Epoch milliseconds, epoch seconds, or RFC 3339.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(number) => {
            #[expect(clippy::cast_possible_truncation)]
            let epoch = number
                .as_i64()
                .or_else(|| number.as_f64().filter(|it| it.is_finite()).map(|it| it as i64))?;
            from_epoch(epoch)
        }
        Value::String(text) => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|timestamp| timestamp.to_utc())
            .or_else(|| from_epoch(text.trim().parse().ok()?)),
        _ => None,
    }
}

fn from_epoch(epoch: i64) -> Option<DateTime<Utc>> {
    if !(-MILLIS_THRESHOLD..MILLIS_THRESHOLD).contains(&epoch) {
        DateTime::from_timestamp_millis(epoch)
    } else {
        DateTime::from_timestamp(epoch, 0)
    }
}
