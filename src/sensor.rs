mod availability;
mod output;
mod resolver;

use std::fmt::{Display, Formatter};

pub use self::{
    availability::Availability,
    output::{AttributeValue, SensorOutput, SensorState, Unit},
    resolver::{Inputs, Resolution, resolve},
};
use crate::{
    catalog::{CategoryGroup, SourceCatalog},
    settings::{Country, Language, SensorGroup, Settings},
};

pub const ENTITY_PREFIX: &str = "energy_charts";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AggregateKey {
    TotalProduction,
    TotalRenewable,
    TotalFossil,
    TotalNuclear,
    RenewableShare,
}

impl AggregateKey {
    pub const ALL: [Self; 5] = [
        Self::TotalProduction,
        Self::TotalRenewable,
        Self::TotalFossil,
        Self::TotalNuclear,
        Self::RenewableShare,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::TotalProduction => "total_production",
            Self::TotalRenewable => "total_renewable",
            Self::TotalFossil => "total_fossil",
            Self::TotalNuclear => "total_nuclear",
            Self::RenewableShare => "renewable_share",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TotalProduction => "Total Production",
            Self::TotalRenewable => "Renewable Production",
            Self::TotalFossil => "Fossil Production",
            Self::TotalNuclear => "Nuclear Production",
            Self::RenewableShare => "Renewable Share",
        }
    }
}

/// Which derived value a sensor exposes.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum SensorKind {
    Source(String),
    Category(CategoryGroup),
    Aggregate(AggregateKey),
    Forecast(String),
}

impl SensorKind {
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Source(source_id) => source_id.clone(),
            Self::Category(group) => group.key().to_owned(),
            Self::Aggregate(key) => key.key().to_owned(),
            Self::Forecast(source_id) => format!("{source_id}_forecast"),
        }
    }

    #[must_use]
    pub const fn unit(&self) -> Unit {
        match self {
            Self::Aggregate(AggregateKey::RenewableShare) => Unit::Percent,
            _ => Unit::Megawatt,
        }
    }

    /// Source-backed sensors tolerate a single missing cycle, derived ones do not.
    #[must_use]
    pub const fn is_source_backed(&self) -> bool {
        matches!(self, Self::Source(_) | Self::Forecast(_))
    }
}

impl Display for SensorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SensorIdentity {
    pub country: Country,
    pub language: Language,
    pub kind: SensorKind,
}

impl SensorIdentity {
    /// `energy_charts_{country}_{key}`, kept stable for compatibility.
    #[must_use]
    pub fn entity_id(&self) -> String {
        format!("{ENTITY_PREFIX}_{}_{}", self.country.code(), self.kind.key())
    }

    #[must_use]
    pub fn name(&self, catalog: &SourceCatalog) -> String {
        match &self.kind {
            SensorKind::Source(source_id) => {
                catalog.display_name(source_id, self.language).into_owned()
            }
            SensorKind::Forecast(source_id) => {
                format!("{} Forecast", catalog.display_name(source_id, self.language))
            }
            SensorKind::Category(group) => group.name().to_owned(),
            SensorKind::Aggregate(key) => key.name().to_owned(),
        }
    }

    /// Every sensor the settings ask for, in a stable order.
    #[must_use]
    pub fn configured(settings: &Settings, catalog: &SourceCatalog) -> Vec<Self> {
        let mut kinds = Vec::new();
        if settings.is_enabled(SensorGroup::Individual) {
            kinds.extend(catalog.sources().map(|source| SensorKind::Source(source.id.to_owned())));
        }
        if settings.is_enabled(SensorGroup::Categories) {
            kinds.extend(CategoryGroup::ALL.map(SensorKind::Category));
        }
        if settings.is_enabled(SensorGroup::Aggregated) {
            kinds.extend(AggregateKey::ALL.map(SensorKind::Aggregate));
        }
        if settings.is_enabled(SensorGroup::Forecasts) {
            kinds.extend(
                catalog
                    .sources()
                    .filter(|source| source.forecast)
                    .map(|source| SensorKind::Forecast(source.id.to_owned())),
            );
        }
        kinds
            .into_iter()
            .map(|kind| Self { country: settings.country, language: settings.language, kind })
            .collect()
    }
}

/// Configured sensor together with its availability across cycles.
#[derive(Debug)]
pub struct Sensor {
    pub identity: SensorIdentity,
    entity_id: String,
    name: String,
    availability: Availability,
}

impl Sensor {
    #[must_use]
    pub fn new(identity: SensorIdentity, catalog: &SourceCatalog) -> Self {
        Self {
            entity_id: identity.entity_id(),
            name: identity.name(catalog),
            identity,
            availability: Availability::default(),
        }
    }

    /// Resolve the current cycle, this never fails for a single absent source.
    pub fn update(&mut self, inputs: &Inputs<'_>) -> SensorOutput {
        let Resolution { value, attributes } = resolve(&self.identity, inputs);
        let value = value.map(round);
        let state = if self.identity.kind.is_source_backed() {
            self.availability.observe(value)
        } else {
            value.map_or(SensorState::Unavailable, SensorState::Available)
        };
        SensorOutput {
            entity_id: self.entity_id.clone(),
            name: self.name.clone(),
            state,
            unit: self.identity.kind.unit(),
            attributes,
        }
    }
}

fn round(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
