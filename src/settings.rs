use std::{
    fmt::{Display, Formatter},
    path::Path,
    str::FromStr,
    time::Duration,
};

use bon::Builder;
use clap::Args;
use enumset::{EnumSet, EnumSetType};
use itertools::Itertools;
use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};

use crate::{history::Retention, prelude::*};

pub const MIN_POLL_INTERVAL_MINUTES: u64 = 5;
pub const MAX_POLL_INTERVAL_MINUTES: u64 = 60;
pub const DEFAULT_POLL_INTERVAL_MINUTES: u64 = 15;
pub const DEFAULT_TOP_N: usize = 5;

/// Configuration rejected before any pipeline starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unsupported country `{0}`, expected one of: de, at, ch, fr, nl, be, pl, cz")]
    UnsupportedCountry(String),

    #[error("unsupported language `{0}`, expected one of: en, de, fr, it, es")]
    UnsupportedLanguage(String),

    #[error(
        "unknown sensor group `{0}`, expected one of: individual, aggregated, categories, forecasts"
    )]
    UnknownSensorGroup(String),

    #[error("unknown history range `{0}`, expected one of: none, day, week, month")]
    UnknownHistoryRange(String),

    #[error(
        "poll interval must be between {MIN_POLL_INTERVAL_MINUTES} and {MAX_POLL_INTERVAL_MINUTES} minutes, got {0}"
    )]
    PollInterval(u64),

    #[error("at least one country must be configured")]
    NoCountries,

    #[error("country `{0}` is configured more than once")]
    DuplicateCountry(Country),

    #[error("at least one of the individual, aggregated, or categories sensor groups must be enabled")]
    NoSensorGroups,

    #[error("history is enabled, but the history range is `none`")]
    HistoryWithoutRange,

    #[error("history range `{0}` is set, but history is disabled")]
    RangeWithoutHistory(HistoryRange),

    #[error("the number of top sources must be at least 1")]
    TopN,
}

impl ConfigError {
    /// Name of the offending configuration field.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::UnsupportedCountry(_) | Self::NoCountries | Self::DuplicateCountry(_) => {
                "countries"
            }
            Self::UnsupportedLanguage(_) => "language",
            Self::UnknownSensorGroup(_) | Self::NoSensorGroups => "sensor_groups",
            Self::UnknownHistoryRange(_) | Self::HistoryWithoutRange => "history_range",
            Self::RangeWithoutHistory(_) => "enable_history",
            Self::PollInterval(_) => "poll_interval_minutes",
            Self::TopN => "top_n",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Country {
    De,
    At,
    Ch,
    Fr,
    Nl,
    Be,
    Pl,
    Cz,
}

impl Country {
    pub const ALL: [Self; 8] =
        [Self::De, Self::At, Self::Ch, Self::Fr, Self::Nl, Self::Be, Self::Pl, Self::Cz];

    /// Lower-case code as used in API paths and entity IDs.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::De => "de",
            Self::At => "at",
            Self::Ch => "ch",
            Self::Fr => "fr",
            Self::Nl => "nl",
            Self::Be => "be",
            Self::Pl => "pl",
            Self::Cz => "cz",
        }
    }
}

impl Display for Country {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Country {
    type Err = ConfigError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|country| country.code().eq_ignore_ascii_case(code.trim()))
            .ok_or_else(|| ConfigError::UnsupportedCountry(code.to_owned()))
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Language {
    En,

    #[default]
    De,

    Fr,
    It,
    Es,
}

impl Language {
    pub const ALL: [Self; 5] = [Self::En, Self::De, Self::Fr, Self::It, Self::Es];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::De => "de",
            Self::Fr => "fr",
            Self::It => "it",
            Self::Es => "es",
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|language| language.code().eq_ignore_ascii_case(code.trim()))
            .ok_or_else(|| ConfigError::UnsupportedLanguage(code.to_owned()))
    }
}

#[derive(Debug, Hash, EnumSetType)]
pub enum SensorGroup {
    Individual,
    Aggregated,
    Categories,
    Forecasts,
}

impl SensorGroup {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Aggregated => "aggregated",
            Self::Categories => "categories",
            Self::Forecasts => "forecasts",
        }
    }
}

impl Display for SensorGroup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SensorGroup {
    type Err = ConfigError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code.trim().to_ascii_lowercase().as_str() {
            "individual" | "sources" => Ok(Self::Individual),
            "aggregated" | "aggregate" => Ok(Self::Aggregated),
            "categories" | "category" => Ok(Self::Categories),
            "forecasts" | "forecast" => Ok(Self::Forecasts),
            _ => Err(ConfigError::UnknownSensorGroup(code.to_owned())),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum HistoryRange {
    #[default]
    None,

    Day,
    Week,
    Month,
}

impl HistoryRange {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    #[must_use]
    pub const fn retention(self) -> Option<Retention> {
        match self {
            Self::None => None,
            Self::Day => Some(Retention::Day),
            Self::Week => Some(Retention::Week),
            Self::Month => Some(Retention::Month),
        }
    }
}

impl Display for HistoryRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for HistoryRange {
    type Err = ConfigError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(ConfigError::UnknownHistoryRange(code.to_owned())),
        }
    }
}

/// Settings as entered on the command line or in a configuration file, not validated yet.
#[serde_as]
#[derive(Clone, Args, Deserialize)]
#[serde(default)]
pub struct RawSettings {
    /// Country codes, each one gets its own independent pipeline.
    #[clap(
        long = "countries",
        env = "ENERGY_CHARTS_COUNTRIES",
        value_delimiter = ',',
        num_args = 1..,
        default_value = "de",
    )]
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub countries: Vec<Country>,

    #[clap(
        long = "poll-interval-minutes",
        env = "ENERGY_CHARTS_POLL_INTERVAL_MINUTES",
        default_value_t = DEFAULT_POLL_INTERVAL_MINUTES,
    )]
    pub poll_interval_minutes: u64,

    #[clap(
        long = "sensor-groups",
        env = "ENERGY_CHARTS_SENSOR_GROUPS",
        value_delimiter = ',',
        num_args = 1..,
        default_value = "individual,aggregated,categories",
    )]
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub sensor_groups: Vec<SensorGroup>,

    /// Attach peak and average statistics to the individual source sensors.
    #[clap(long = "enable-history", env = "ENERGY_CHARTS_ENABLE_HISTORY")]
    pub enable_history: bool,

    #[clap(long = "history-range", env = "ENERGY_CHARTS_HISTORY_RANGE", default_value = "none")]
    #[serde_as(as = "DisplayFromStr")]
    pub history_range: HistoryRange,

    /// Language of the source display names.
    #[clap(long, env = "ENERGY_CHARTS_LANGUAGE", default_value = "de")]
    #[serde_as(as = "DisplayFromStr")]
    pub language: Language,

    /// Number of sources in the top ranking.
    #[clap(long = "top-n", env = "ENERGY_CHARTS_TOP_N", default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            countries: vec![Country::De],
            poll_interval_minutes: DEFAULT_POLL_INTERVAL_MINUTES,
            sensor_groups: vec![
                SensorGroup::Individual,
                SensorGroup::Aggregated,
                SensorGroup::Categories,
            ],
            enable_history: false,
            history_range: HistoryRange::None,
            language: Language::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl RawSettings {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("failed to parse `{}`", path.display()))
    }

    /// Validate the raw settings into one [`Settings`] per configured country.
    pub fn validate(&self) -> Result<Vec<Settings>, ConfigError> {
        if !(MIN_POLL_INTERVAL_MINUTES..=MAX_POLL_INTERVAL_MINUTES)
            .contains(&self.poll_interval_minutes)
        {
            return Err(ConfigError::PollInterval(self.poll_interval_minutes));
        }

        let sensor_groups: EnumSet<SensorGroup> = self.sensor_groups.iter().copied().collect();
        if sensor_groups.is_disjoint(
            SensorGroup::Individual | SensorGroup::Aggregated | SensorGroup::Categories,
        ) {
            return Err(ConfigError::NoSensorGroups);
        }

        let history = match (self.enable_history, self.history_range.retention()) {
            (true, Some(retention)) => Some(retention),
            (true, None) => return Err(ConfigError::HistoryWithoutRange),
            (false, Some(_)) => return Err(ConfigError::RangeWithoutHistory(self.history_range)),
            (false, None) => None,
        };

        if self.top_n == 0 {
            return Err(ConfigError::TopN);
        }
        if self.countries.is_empty() {
            return Err(ConfigError::NoCountries);
        }
        if let Some(country) = self.countries.iter().duplicates().next() {
            return Err(ConfigError::DuplicateCountry(*country));
        }

        Ok(self
            .countries
            .iter()
            .map(|&country| Settings {
                country,
                poll_interval: Duration::from_secs(self.poll_interval_minutes * 60),
                sensor_groups,
                history,
                language: self.language,
                top_n: self.top_n,
            })
            .collect())
    }
}

/// Validated settings of a single country pipeline.
#[must_use]
#[derive(Clone, Debug, Builder)]
pub struct Settings {
    pub country: Country,

    #[builder(default = Duration::from_secs(DEFAULT_POLL_INTERVAL_MINUTES * 60))]
    pub poll_interval: Duration,

    #[builder(default = SensorGroup::Individual | SensorGroup::Aggregated | SensorGroup::Categories)]
    pub sensor_groups: EnumSet<SensorGroup>,

    pub history: Option<Retention>,

    #[builder(default)]
    pub language: Language,

    #[builder(default = DEFAULT_TOP_N)]
    pub top_n: usize,
}

impl Settings {
    #[must_use]
    pub fn is_enabled(&self, group: SensorGroup) -> bool {
        self.sensor_groups.contains(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_from_str() {
        assert_eq!("DE".parse::<Country>(), Ok(Country::De));
        assert_eq!(" cz ".parse::<Country>(), Ok(Country::Cz));
        assert_eq!(
            "uk".parse::<Country>(),
            Err(ConfigError::UnsupportedCountry("uk".to_owned()))
        );
    }

    #[test]
    fn test_validate_defaults() -> Result {
        let settings = RawSettings::default().validate()?;
        assert_eq!(settings.len(), 1);
        assert_eq!(settings[0].country, Country::De);
        assert_eq!(settings[0].poll_interval, Duration::from_secs(900));
        assert_eq!(settings[0].history, None);
        assert!(settings[0].is_enabled(SensorGroup::Aggregated));
        assert!(!settings[0].is_enabled(SensorGroup::Forecasts));
        Ok(())
    }

    #[test]
    fn test_validate_history_without_range() {
        let raw = RawSettings { enable_history: true, ..RawSettings::default() };
        let error = raw.validate().unwrap_err();
        assert_eq!(error, ConfigError::HistoryWithoutRange);
        assert_eq!(error.field(), "history_range");
    }

    #[test]
    fn test_validate_range_without_history() {
        let raw = RawSettings { history_range: HistoryRange::Week, ..RawSettings::default() };
        assert_eq!(raw.validate().unwrap_err(), ConfigError::RangeWithoutHistory(HistoryRange::Week));
    }

    #[test]
    fn test_validate_history_enabled() -> Result {
        let raw = RawSettings {
            enable_history: true,
            history_range: HistoryRange::Month,
            ..RawSettings::default()
        };
        assert_eq!(raw.validate()?[0].history, Some(Retention::Month));
        Ok(())
    }

    #[test]
    fn test_validate_poll_interval() {
        for minutes in [0, 4, 61] {
            let raw = RawSettings { poll_interval_minutes: minutes, ..RawSettings::default() };
            assert_eq!(raw.validate().unwrap_err(), ConfigError::PollInterval(minutes));
        }
        for minutes in [5, 60] {
            let raw = RawSettings { poll_interval_minutes: minutes, ..RawSettings::default() };
            assert!(raw.validate().is_ok());
        }
    }

    #[test]
    fn test_validate_forecasts_only() {
        let raw =
            RawSettings { sensor_groups: vec![SensorGroup::Forecasts], ..RawSettings::default() };
        assert_eq!(raw.validate().unwrap_err(), ConfigError::NoSensorGroups);
    }

    #[test]
    fn test_validate_duplicate_country() {
        let raw = RawSettings {
            countries: vec![Country::De, Country::At, Country::De],
            ..RawSettings::default()
        };
        assert_eq!(raw.validate().unwrap_err(), ConfigError::DuplicateCountry(Country::De));
    }

    #[test]
    fn test_validate_multiple_countries() -> Result {
        let raw = RawSettings {
            countries: vec![Country::At, Country::Ch],
            language: Language::Fr,
            ..RawSettings::default()
        };
        let settings = raw.validate()?;
        let countries = settings.iter().map(|settings| settings.country).collect_vec();
        assert_eq!(countries, [Country::At, Country::Ch]);
        assert!(settings.iter().all(|settings| settings.language == Language::Fr));
        Ok(())
    }

    #[test]
    fn test_deserialize_toml() -> Result {
        // language=TOML
        const CONFIG: &str = r#"
            countries = ["fr", "be"]
            poll_interval_minutes = 30
            sensor_groups = ["aggregate", "category", "forecast"]
            enable_history = true
            history_range = "week"
            language = "en"
        "#;
        let raw: RawSettings = toml::from_str(CONFIG)?;
        assert_eq!(raw.countries, [Country::Fr, Country::Be]);
        assert_eq!(raw.top_n, DEFAULT_TOP_N);
        let settings = raw.validate()?;
        assert_eq!(settings[1].country, Country::Be);
        assert_eq!(settings[1].poll_interval, Duration::from_secs(1800));
        assert_eq!(
            settings[1].sensor_groups,
            SensorGroup::Aggregated | SensorGroup::Categories | SensorGroup::Forecasts
        );
        assert_eq!(settings[1].history, Some(Retention::Week));
        assert_eq!(settings[1].language, Language::En);
        Ok(())
    }

    #[test]
    fn test_deserialize_toml_unsupported_language() {
        let result = toml::from_str::<RawSettings>(r#"language = "nl""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let settings = Settings::builder().country(Country::Pl).build();
        assert_eq!(settings.top_n, DEFAULT_TOP_N);
        assert_eq!(settings.language, Language::De);
        assert!(settings.is_enabled(SensorGroup::Individual));
    }
}
