use std::{collections::BTreeMap, time::Duration};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use serde_with::{TimestampMilliSeconds, serde_as};
use tokio::time::sleep;

use crate::{
    prelude::*,
    settings::Country,
    snapshot::{NATIVE_UNIT, RawEntry, RawPayload},
};

const BASE_URL: &str = "https://www.energy-charts.info/charts/power/data";
const N_ATTEMPTS: u32 = 3;
const TIMEOUT: Duration = Duration::from_secs(30);
const BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("`{0}` does not exist")]
    NotFound(String),

    #[error("request to `{url}` failed")]
    Request {
        url: String,

        #[source]
        source: reqwest::Error,
    },
}

/// Energy-Charts public power data.
pub struct Api {
    client: reqwest::Client,
    country: Country,
}

impl Api {
    pub fn new(country: Country) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, country })
    }

    #[must_use]
    pub fn week_url(country: Country, on: NaiveDate) -> String {
        let week = on.iso_week();
        format!("{BASE_URL}/{country}/week_{}_{:02}.json", week.year(), week.week())
    }

    #[must_use]
    pub fn month_url(country: Country, on: NaiveDate) -> String {
        format!("{BASE_URL}/{country}/month_{}_{:02}.json", on.year(), on.month())
    }

    /// Fetch the ISO week containing the date: the finest resolution the service offers.
    pub async fn get_week(&self, on: NaiveDate) -> Result<Response, FetchError> {
        self.get(&Self::week_url(self.country, on)).await
    }

    pub async fn get_month(&self, on: NaiveDate) -> Result<Response, FetchError> {
        self.get(&Self::month_url(self.country, on)).await
    }

    /// Request with exponential backoff, a missing resource is not retried.
    #[instrument(skip_all, fields(country = %self.country))]
    async fn get(&self, url: &str) -> Result<Response, FetchError> {
        let mut attempt = 0;
        loop {
            let timeout = TIMEOUT * (attempt + 1);
            debug!(url, attempt = attempt + 1, ?timeout, "fetching…");
            match self.try_get(url, timeout).await {
                Ok(response) => {
                    debug!(url, n_series = response.0.len(), "fetched");
                    return Ok(response);
                }
                Err(error @ FetchError::NotFound(_)) => return Err(error),
                Err(error) if attempt + 1 < N_ATTEMPTS => {
                    let backoff = BACKOFF * 2_u32.pow(attempt);
                    warn!(attempt = attempt + 1, ?backoff, "{error:#}, retrying…");
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn try_get(&self, url: &str, timeout: Duration) -> Result<Response, FetchError> {
        let request_error = |source| FetchError::Request { url: url.to_owned(), source };
        let response = self.client.get(url).timeout(timeout).send().await.map_err(request_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_owned()));
        }
        response.error_for_status().map_err(request_error)?.json().await.map_err(request_error)
    }
}

/// Series as published by Energy-Charts, the first one carries the shared time axis.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct Response(pub Vec<Series>);

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub name: Option<Name>,

    #[serde(default)]
    pub data: Option<Vec<Value>>,

    #[serde(default, rename = "xAxisValues")]
    #[serde_as(as = "Option<Vec<TimestampMilliSeconds<i64>>>")]
    pub x_axis_values: Option<Vec<DateTime<Utc>>>,
}

/// Localized series name, the service returns either an object or a one-element list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Name {
    Map(BTreeMap<String, String>),
    List(Vec<BTreeMap<String, String>>),
}

impl Name {
    const UNKNOWN: &'static str = "Unknown";

    /// English name, otherwise German, otherwise any other translation.
    ///
    /// A series is never dropped for lack of a name, it ends up as an unrecognized source.
    #[must_use]
    pub fn preferred(&self) -> &str {
        let names = match self {
            Self::Map(names) => Some(names),
            Self::List(names) => names.first(),
        };
        names
            .and_then(|names| {
                names.get("en").or_else(|| names.get("de")).or_else(|| names.values().next())
            })
            .map_or(Self::UNKNOWN, String::as_str)
    }
}

impl Response {
    fn timestamps(&self) -> &[DateTime<Utc>] {
        self.0.first().and_then(|series| series.x_axis_values.as_deref()).unwrap_or_default()
    }

    /// Named series with their values, series without a name or data are skipped.
    fn series(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.0.iter().filter_map(|series| {
            let name = series.name.as_ref()?.preferred();
            Some((name, series.data.as_deref()?))
        })
    }

    /// The latest non-null value of every series, each stamped with its own time.
    #[must_use]
    pub fn latest_payload(&self) -> RawPayload {
        let timestamps = self.timestamps();
        let entries: Vec<RawEntry> = self
            .series()
            .map(|(name, data)| {
                let latest = data
                    .iter()
                    .zip(timestamps)
                    .rev()
                    .find(|(value, _)| !value.is_null());
                let mut entry =
                    RawEntry::new(name, latest.map_or(Value::Null, |(value, _)| value.clone()));
                entry.unit = Some(NATIVE_UNIT.to_owned());
                entry.timestamp = latest.map(|(_, timestamp)| timestamp.timestamp_millis().into());
                entry
            })
            .collect();
        let timestamp = entries.iter().filter_map(|entry| entry.timestamp.as_ref()?.as_i64()).max();
        RawPayload { timestamp: timestamp.map(Value::from), entries }
    }

    /// One payload per point of the time axis that has at least one value.
    #[must_use]
    pub fn payloads(&self) -> Vec<RawPayload> {
        let series: Vec<_> = self.series().collect();
        self.timestamps()
            .iter()
            .enumerate()
            .filter(|(index, _)| {
                series
                    .iter()
                    .any(|(_, data)| data.get(*index).is_some_and(|value| !value.is_null()))
            })
            .map(|(index, timestamp)| RawPayload {
                timestamp: Some(timestamp.timestamp_millis().into()),
                entries: series
                    .iter()
                    .map(|(name, data)| {
                        let mut entry =
                            RawEntry::new(*name, data.get(index).cloned().unwrap_or_default());
                        entry.unit = Some(NATIVE_UNIT.to_owned());
                        entry
                    })
                    .collect(),
            })
            .collect()
    }
}
