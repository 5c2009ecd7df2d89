use std::collections::BTreeMap;

use crate::{
    aggregate::Aggregate,
    api::EnergyCharts,
    catalog::{Category, CategoryGroup, Class, SourceCatalog},
    history::HistoryAccumulator,
    sensor::{AggregateKey, AttributeValue, SensorIdentity, SensorKind},
    settings::Language,
    snapshot::Snapshot,
};

pub const DATA_SOURCE: &str = "Fraunhofer ISE Energy-Charts";

/// Number of the latest history points exposed as an attribute.
pub const RECENT_HISTORY_POINTS: usize = 10;

/// Everything a single cycle knows.
#[derive(Copy, Clone)]
pub struct Inputs<'a> {
    pub catalog: &'a SourceCatalog,
    pub snapshot: &'a Snapshot,
    pub aggregate: &'a Aggregate,

    /// Only present when history is enabled.
    pub history: Option<&'a HistoryAccumulator>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    /// Unrounded value, `None` when it is undefined in this cycle.
    pub value: Option<f64>,

    pub attributes: BTreeMap<String, AttributeValue>,
}

#[derive(Default)]
struct Attributes(BTreeMap<String, AttributeValue>);

impl Attributes {
    fn insert(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.0.insert(key.into(), value.into());
    }
}

/// Resolve the sensor value and its attributes for the current cycle.
pub fn resolve(identity: &SensorIdentity, inputs: &Inputs<'_>) -> Resolution {
    let mut attributes = Attributes::default();
    attributes.insert("data_source", DATA_SOURCE);
    attributes.insert("country", identity.country.code().to_uppercase());
    attributes.insert(
        "api_url",
        EnergyCharts::week_url(identity.country, inputs.snapshot.timestamp.date_naive()),
    );

    let value = match &identity.kind {
        SensorKind::Source(source_id) => {
            resolve_source(source_id, identity.language, inputs, &mut attributes)
        }
        SensorKind::Forecast(source_id) => {
            resolve_forecast(source_id, identity.language, inputs, &mut attributes)
        }
        SensorKind::Category(group) => resolve_category(*group, inputs.aggregate, &mut attributes),
        SensorKind::Aggregate(key) => {
            resolve_aggregate(*key, identity.language, inputs, &mut attributes)
        }
    };

    Resolution { value, attributes: attributes.0 }
}

fn insert_source_metadata(
    source_id: &str,
    language: Language,
    catalog: &SourceCatalog,
    attributes: &mut Attributes,
) {
    let definition = catalog.lookup(source_id);
    attributes.insert("source_id", source_id);
    attributes.insert("source_name", catalog.display_name(source_id, language).into_owned());
    attributes.insert("source_name_en", catalog.display_name(source_id, Language::En).into_owned());
    attributes.insert("source_name_de", catalog.display_name(source_id, Language::De).into_owned());
    attributes.insert("color", definition.map(|definition| definition.color));
    attributes.insert("category", catalog.category(source_id).code());
    attributes.insert("renewable", definition.is_some_and(|definition| definition.renewable));
}

fn resolve_source(
    source_id: &str,
    language: Language,
    inputs: &Inputs<'_>,
    attributes: &mut Attributes,
) -> Option<f64> {
    insert_source_metadata(source_id, language, inputs.catalog, attributes);
    let reading = inputs.snapshot.get(source_id);
    attributes.insert("last_value_timestamp", reading.map(|reading| reading.timestamp));

    if let Some(history) = inputs.history {
        attributes.insert("daily_peak", history.peak(source_id));
        attributes.insert("daily_average", history.average(source_id));
        let recent: Vec<_> = history
            .recent(source_id, RECENT_HISTORY_POINTS)
            .into_iter()
            .map(|(timestamp, power)| AttributeValue::List(vec![timestamp.into(), power.into()]))
            .collect();
        attributes.insert("history_today", recent);
    }

    Some(reading?.power?.0)
}

fn resolve_forecast(
    source_id: &str,
    language: Language,
    inputs: &Inputs<'_>,
    attributes: &mut Attributes,
) -> Option<f64> {
    insert_source_metadata(source_id, language, inputs.catalog, attributes);
    let forecast = inputs.snapshot.forecast(source_id);
    attributes.insert("forecast_timestamp", forecast.map(|forecast| forecast.timestamp));
    attributes
        .insert("actual_mw", inputs.snapshot.get(source_id).and_then(|reading| reading.power));
    Some(forecast?.power?.0)
}

fn resolve_category(
    group: CategoryGroup,
    aggregate: &Aggregate,
    attributes: &mut Attributes,
) -> Option<f64> {
    for category in group.members() {
        attributes.insert(format!("{}_mw", category.code()), aggregate.category_total(*category));
    }
    let total = aggregate.group_total(group);
    if group == CategoryGroup::Wind {
        let onshore = aggregate.category_total(Category::WindOnshore).unwrap_or_default();
        attributes.insert("onshore_share", total.and_then(|total| onshore.share_of(total)));
    }
    Some(total?.0)
}

fn resolve_aggregate(
    key: AggregateKey,
    language: Language,
    inputs: &Inputs<'_>,
    attributes: &mut Attributes,
) -> Option<f64> {
    let aggregate = inputs.aggregate;
    let top_n: Vec<_> = aggregate
        .top_n
        .iter()
        .map(|source| AttributeValue::List(vec![source.name.as_str().into(), source.power.into()]))
        .collect();
    attributes.insert("top_n", top_n);
    attributes.insert("source_count", aggregate.source_count);
    attributes.insert("source_count_unknown", aggregate.source_count_unknown);
    attributes.insert("source_count_unrecognized", aggregate.source_count_unrecognized);

    match key {
        AggregateKey::TotalProduction => {
            for class in Class::ALL {
                attributes.insert(format!("{}_mw", class.code()), aggregate.class_total(class));
            }
            Some(aggregate.total.0)
        }
        AggregateKey::TotalRenewable => {
            let catalog = inputs.catalog;
            let sources: Vec<_> = inputs
                .snapshot
                .readings
                .iter()
                .filter(|reading| reading.power.is_some())
                .filter(|reading| catalog.category(&reading.source_id).class() == Class::Renewable)
                .map(|reading| catalog.display_name(&reading.source_id, language).into_owned())
                .collect();
            attributes.insert("sources", sources);
            attributes.insert("share_of_total", aggregate.renewable_share);
            Some(aggregate.renewable.0)
        }
        AggregateKey::TotalFossil => {
            attributes.insert(
                "coal_mw",
                aggregate.sum_of(&[
                    Category::FossilHardCoal,
                    Category::FossilLignite,
                    Category::FossilCoalDerivedGas,
                ]),
            );
            attributes.insert("gas_mw", aggregate.category_total(Category::FossilGas));
            attributes.insert("oil_mw", aggregate.category_total(Category::FossilOil));
            attributes.insert("share_of_total", aggregate.fossil.share_of(aggregate.total));
            Some(aggregate.fossil.0)
        }
        AggregateKey::TotalNuclear => {
            attributes.insert("share_of_total", aggregate.nuclear.share_of(aggregate.total));
            Some(aggregate.nuclear.0)
        }
        AggregateKey::RenewableShare => {
            attributes.insert("renewable_mw", aggregate.renewable);
            attributes.insert("total_mw", aggregate.total);
            Some(aggregate.renewable_share?.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use itertools::Itertools;
    use serde_json::json;

    use super::*;
    use crate::{
        aggregate::{Ranking, aggregate},
        history::Retention,
        prelude::*,
        quantity::power::Megawatts,
        settings::Country,
        snapshot::{RawEntry, RawPayload, normalize},
    };

    struct Fixture {
        catalog: SourceCatalog,
        snapshot: Snapshot,
        aggregate: Aggregate,
        history: HistoryAccumulator,
    }

    impl Fixture {
        fn new(entries: Vec<RawEntry>) -> Result<Self> {
            let catalog = SourceCatalog::for_country(Country::De);
            let payload = RawPayload { timestamp: Some(json!("2025-06-01T12:00:00Z")), entries };
            let snapshot = normalize(&payload, &catalog)?;
            let aggregate =
                aggregate(&snapshot, &catalog, Ranking { limit: 5, language: Language::En });
            let mut history = HistoryAccumulator::new(Retention::Day);
            for reading in &snapshot.readings {
                history.record(reading);
            }
            Ok(Self { catalog, snapshot, aggregate, history })
        }

        fn resolve(&self, kind: SensorKind, with_history: bool) -> Resolution {
            let identity = SensorIdentity { country: Country::De, language: Language::De, kind };
            let inputs = Inputs {
                catalog: &self.catalog,
                snapshot: &self.snapshot,
                aggregate: &self.aggregate,
                history: with_history.then_some(&self.history),
            };
            resolve(&identity, &inputs)
        }
    }

    fn mix() -> Vec<RawEntry> {
        vec![
            RawEntry::new("Solar", 35_420.5),
            RawEntry::new("Wind onshore", 42_300.5),
            RawEntry::new("Fossil gas", 18_200.0),
            RawEntry::new("Nuclear", 12_105.3),
        ]
    }

    #[test]
    fn test_common_attributes() -> Result {
        let fixture = Fixture::new(mix())?;
        for kind in [
            SensorKind::Source("solar".to_owned()),
            SensorKind::Category(CategoryGroup::Wind),
            SensorKind::Aggregate(AggregateKey::RenewableShare),
        ] {
            let resolution = fixture.resolve(kind, false);
            assert_eq!(resolution.attributes["country"], AttributeValue::from("DE"));
            assert_eq!(
                resolution.attributes["api_url"],
                AttributeValue::from(
                    "https://www.energy-charts.info/charts/power/data/de/week_2025_22.json"
                ),
            );
        }
        Ok(())
    }

    #[test]
    fn test_source() -> Result {
        let fixture = Fixture::new(mix())?;
        let resolution = fixture.resolve(SensorKind::Source("solar".to_owned()), true);
        assert_eq!(resolution.value, Some(35_420.5));
        let attributes = &resolution.attributes;
        assert_eq!(attributes["data_source"], AttributeValue::from(DATA_SOURCE));
        assert_eq!(attributes["country"], AttributeValue::from("DE"));
        assert_eq!(attributes["source_name"], AttributeValue::from("Solar"));
        assert_eq!(attributes["category"], AttributeValue::from("solar"));
        assert_eq!(attributes["renewable"], AttributeValue::Bool(true));
        assert_eq!(attributes["daily_peak"], AttributeValue::Number(35_420.5));
        assert_eq!(
            attributes["last_value_timestamp"],
            AttributeValue::from("2025-06-01T12:00:00+00:00")
        );
        Ok(())
    }

    #[test]
    fn test_absent_source_keeps_attribute_keys() -> Result {
        let fixture = Fixture::new(mix())?;
        let present = fixture.resolve(SensorKind::Source("solar".to_owned()), true);
        let absent = fixture.resolve(SensorKind::Source("biomass".to_owned()), true);
        assert_eq!(absent.value, None);
        assert_eq!(
            present.attributes.keys().collect_vec(),
            absent.attributes.keys().collect_vec()
        );
        assert_eq!(absent.attributes["country"], AttributeValue::from("DE"));
        assert_eq!(absent.attributes["category"], AttributeValue::from("biomass"));
        assert_eq!(absent.attributes["last_value_timestamp"], AttributeValue::Null);
        assert_eq!(absent.attributes["history_today"], AttributeValue::List(vec![]));
        Ok(())
    }

    #[test]
    fn test_without_history() -> Result {
        let fixture = Fixture::new(mix())?;
        let resolution = fixture.resolve(SensorKind::Source("solar".to_owned()), false);
        assert!(!resolution.attributes.contains_key("daily_peak"));
        assert!(!resolution.attributes.contains_key("history_today"));
        Ok(())
    }

    #[test]
    fn test_renewable_share() -> Result {
        let fixture = Fixture::new(mix())?;
        let resolution = fixture.resolve(SensorKind::Aggregate(AggregateKey::RenewableShare), false);
        assert_abs_diff_eq!(resolution.value.unwrap(), 77_721.0 / 108_026.3 * 100.0, epsilon = 1e-9);
        assert_eq!(resolution.attributes["renewable_mw"], AttributeValue::Number(77_721.0));
        assert_eq!(resolution.attributes["total_mw"], AttributeValue::Number(108_026.3));
        Ok(())
    }

    #[test]
    fn test_renewable_share_zero_total() -> Result {
        let fixture = Fixture::new(vec![RawEntry::new("solar", 0.0)])?;
        let resolution = fixture.resolve(SensorKind::Aggregate(AggregateKey::RenewableShare), false);
        assert_eq!(resolution.value, None);
        Ok(())
    }

    #[test]
    fn test_total_production() -> Result {
        let fixture = Fixture::new(mix())?;
        let resolution =
            fixture.resolve(SensorKind::Aggregate(AggregateKey::TotalProduction), false);
        assert_abs_diff_eq!(resolution.value.unwrap(), 108_026.3, epsilon = 1e-6);
        assert_eq!(resolution.attributes["source_count"], AttributeValue::Integer(4));
        assert_eq!(resolution.attributes["other_mw"], AttributeValue::Number(0.0));
        let AttributeValue::List(top_n) = &resolution.attributes["top_n"] else {
            panic!("`top_n` is not a list");
        };
        assert_eq!(top_n.len(), 4);
        assert_eq!(
            top_n[0],
            AttributeValue::List(vec!["Wind onshore".into(), Megawatts(42_300.5).into()])
        );
        Ok(())
    }

    #[test]
    fn test_total_fossil() -> Result {
        let fixture = Fixture::new(vec![
            RawEntry::new("Fossil hard coal", 100.0),
            RawEntry::new("Fossil brown coal / lignite", 200.0),
            RawEntry::new("Fossil gas", 50.0),
        ])?;
        let resolution = fixture.resolve(SensorKind::Aggregate(AggregateKey::TotalFossil), false);
        assert_eq!(resolution.value, Some(350.0));
        assert_eq!(resolution.attributes["coal_mw"], AttributeValue::Number(300.0));
        assert_eq!(resolution.attributes["oil_mw"], AttributeValue::Null);
        Ok(())
    }

    #[test]
    fn test_category() -> Result {
        let fixture = Fixture::new(vec![
            RawEntry::new("Wind onshore", 300.0),
            RawEntry::new("Wind offshore", 100.0),
        ])?;
        let resolution = fixture.resolve(SensorKind::Category(CategoryGroup::Wind), false);
        assert_eq!(resolution.value, Some(400.0));
        assert_eq!(resolution.attributes["wind_onshore_mw"], AttributeValue::Number(300.0));
        assert_eq!(resolution.attributes["onshore_share"], AttributeValue::Number(75.0));

        let resolution = fixture.resolve(SensorKind::Category(CategoryGroup::Hydro), false);
        assert_eq!(resolution.value, None);
        assert_eq!(resolution.attributes["hydro_pumped_storage_mw"], AttributeValue::Null);
        Ok(())
    }

    #[test]
    fn test_forecast() -> Result {
        let fixture = Fixture::new(vec![
            RawEntry::new("Solar", 100.0),
            RawEntry::new("Solar forecast", 120.0),
        ])?;
        let resolution = fixture.resolve(SensorKind::Forecast("solar".to_owned()), false);
        assert_eq!(resolution.value, Some(120.0));
        assert_eq!(resolution.attributes["actual_mw"], AttributeValue::Number(100.0));
        Ok(())
    }
}
