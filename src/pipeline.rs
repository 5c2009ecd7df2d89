use crate::{
    aggregate::{Ranking, aggregate},
    catalog::{CATALOG_VERSION, SourceCatalog},
    history::HistoryAccumulator,
    prelude::*,
    sensor::{Inputs, Sensor, SensorIdentity, SensorOutput},
    settings::Settings,
    snapshot::{PayloadError, RawPayload, normalize},
};

/// Engine of a single country: normalize, aggregate, record history, and resolve sensors.
///
/// Pipelines share nothing, so different countries may run concurrently.
/// Cycles of the same pipeline are sequential by construction (`&mut self`).
pub struct Pipeline {
    settings: Settings,
    catalog: SourceCatalog,
    sensors: Vec<Sensor>,
    history: Option<HistoryAccumulator>,
    outputs: Vec<SensorOutput>,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Self {
        let catalog = SourceCatalog::for_country(settings.country);
        let sensors: Vec<Sensor> = SensorIdentity::configured(&settings, &catalog)
            .into_iter()
            .map(|identity| Sensor::new(identity, &catalog))
            .collect();
        let history = settings.history.map(HistoryAccumulator::new);
        debug!(
            country = %settings.country,
            catalog_version = CATALOG_VERSION,
            n_sources = catalog.sources().count(),
            n_sensors = sensors.len(),
            "created the pipeline",
        );
        Self { settings, catalog, sensors, history, outputs: Vec::new() }
    }

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run a cycle, a malformed payload gets logged and the previous outputs are retained.
    #[instrument(skip_all, fields(country = %self.settings.country))]
    pub fn update(&mut self, payload: &RawPayload) -> &[SensorOutput] {
        if let Err(error) = self.try_update(payload) {
            error!("malformed payload, keeping the previous states: {error:#}");
        }
        &self.outputs
    }

    pub fn try_update(&mut self, payload: &RawPayload) -> Result<&[SensorOutput], PayloadError> {
        let snapshot = normalize(payload, &self.catalog)?;
        let aggregate = aggregate(&snapshot, &self.catalog, Ranking::from(&self.settings));
        if let Some(history) = &mut self.history {
            for reading in &snapshot.readings {
                history.record(reading);
            }
        }

        let inputs = Inputs {
            catalog: &self.catalog,
            snapshot: &snapshot,
            aggregate: &aggregate,
            history: self.history.as_ref(),
        };
        self.outputs = self.sensors.iter_mut().map(|sensor| sensor.update(&inputs)).collect();

        let n_available = self.outputs.iter().filter(|output| output.state.is_available()).count();
        info!(
            timestamp = %snapshot.timestamp,
            n_readings = snapshot.readings.len(),
            n_available,
            n_sensors = self.outputs.len(),
            total = %aggregate.total,
            "updated",
        );
        Ok(&self.outputs)
    }

    /// Seed the history from past payloads without touching the sensors.
    ///
    /// Returns the number of payloads that have been recorded.
    #[instrument(skip_all, fields(country = %self.settings.country))]
    pub fn backfill<'a>(&mut self, payloads: impl IntoIterator<Item = &'a RawPayload>) -> usize {
        let Some(history) = &mut self.history else {
            return 0;
        };
        let mut n_recorded = 0;
        for payload in payloads {
            match normalize(payload, &self.catalog) {
                Ok(snapshot) => {
                    for reading in &snapshot.readings {
                        history.record(reading);
                    }
                    n_recorded += 1;
                }
                Err(error) => {
                    debug!("skipped a historical payload: {error:#}");
                }
            }
        }
        info!(n_recorded, n_points = history.len(), "backfilled");
        n_recorded
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        history::Retention,
        sensor::{AttributeValue, SensorState},
        settings::Country,
        snapshot::RawEntry,
    };

    fn payload(minutes: i64, entries: &[(&str, Option<f64>)]) -> RawPayload {
        RawPayload {
            timestamp: Some(json!(1_748_779_200 + minutes * 60)),
            entries: entries.iter().map(|(id, value)| RawEntry::new(*id, *value)).collect(),
        }
    }

    fn state<'a>(outputs: &'a [SensorOutput], entity_id: &str) -> &'a SensorState {
        &outputs.iter().find(|output| output.entity_id == entity_id).unwrap().state
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(Settings::builder().country(Country::De).build())
    }

    #[test]
    fn test_single_miss_does_not_flap() {
        let mut pipeline = pipeline();
        let entity_id = "energy_charts_de_biomass";

        let outputs = pipeline.update(&payload(0, &[("Biomass", Some(4_500.0)), ("Solar", Some(1.0))]));
        assert_eq!(*state(outputs, entity_id), SensorState::Available(4_500.0));

        let outputs = pipeline.update(&payload(15, &[("Solar", Some(2.0))]));
        assert_eq!(*state(outputs, entity_id), SensorState::Available(4_500.0));

        let outputs = pipeline.update(&payload(30, &[("Biomass", Some(4_400.0)), ("Solar", Some(3.0))]));
        assert_eq!(*state(outputs, entity_id), SensorState::Available(4_400.0));
    }

    #[test]
    fn test_second_miss_turns_unavailable() {
        let mut pipeline = pipeline();
        let entity_id = "energy_charts_de_nuclear";
        pipeline.update(&payload(0, &[("Nuclear", Some(100.0))]));
        let outputs = pipeline.update(&payload(15, &[("Nuclear", None)]));
        assert_eq!(*state(outputs, entity_id), SensorState::Available(100.0));
        let outputs = pipeline.update(&payload(30, &[("Solar", Some(1.0))]));
        assert_eq!(*state(outputs, entity_id), SensorState::Unavailable);
    }

    #[test]
    fn test_never_seen_source_is_unavailable() {
        let mut pipeline = pipeline();
        let outputs = pipeline.update(&payload(0, &[("Solar", Some(1.0))]));
        let output =
            outputs.iter().find(|output| output.entity_id == "energy_charts_de_geothermal").unwrap();
        assert_eq!(output.state, SensorState::Unavailable);
        assert_eq!(output.attributes["country"], AttributeValue::from("DE"));
        assert_eq!(output.attributes["category"], AttributeValue::from("geothermal"));
    }

    #[test]
    fn test_zero_total_share_is_unavailable() {
        let mut pipeline = pipeline();
        let outputs = pipeline.update(&payload(0, &[("Solar", Some(0.0)), ("Nuclear", Some(0.0))]));
        assert_eq!(*state(outputs, "energy_charts_de_renewable_share"), SensorState::Unavailable);
        assert_eq!(*state(outputs, "energy_charts_de_total_production"), SensorState::Available(0.0));
    }

    #[test]
    fn test_generation_mix() {
        let mut pipeline = pipeline();
        let outputs = pipeline.update(&payload(
            0,
            &[
                ("Solar", Some(35_420.5)),
                ("Wind onshore", Some(42_300.5)),
                ("Fossil gas", Some(18_200.0)),
                ("Nuclear", Some(12_105.3)),
            ],
        ));
        assert_eq!(*state(outputs, "energy_charts_de_renewable_share"), SensorState::Available(71.95));
        assert_eq!(*state(outputs, "energy_charts_de_total_renewable"), SensorState::Available(77_721.0));
        assert_eq!(*state(outputs, "energy_charts_de_wind_total"), SensorState::Available(42_300.5));
        assert_eq!(*state(outputs, "energy_charts_de_fossil_total"), SensorState::Available(18_200.0));
    }

    #[test]
    fn test_malformed_payload_keeps_previous_states() {
        let mut pipeline = pipeline();
        let before = pipeline.update(&payload(0, &[("Solar", Some(1.0))])).to_vec();

        let malformed = RawPayload { timestamp: None, entries: vec![RawEntry::new("Solar", 2.0)] };
        assert!(matches!(pipeline.try_update(&malformed), Err(PayloadError::MissingTimestamp)));
        assert_eq!(pipeline.update(&malformed), before);
        assert_eq!(pipeline.update(&RawPayload::default()), before);
    }

    #[test]
    fn test_history_attributes() {
        let mut pipeline = Pipeline::new(
            Settings::builder().country(Country::De).history(Retention::Day).build(),
        );
        pipeline.update(&payload(0, &[("Solar", Some(100.0))]));
        pipeline.update(&payload(15, &[("Solar", Some(300.0))]));
        let outputs = pipeline.update(&payload(30, &[("Solar", Some(200.0))]));
        let output =
            outputs.iter().find(|output| output.entity_id == "energy_charts_de_solar").unwrap();
        assert_eq!(output.attributes["daily_peak"], AttributeValue::Number(300.0));
        assert_eq!(output.attributes["daily_average"], AttributeValue::Number(200.0));
    }

    #[test]
    fn test_backfill() {
        let mut pipeline = Pipeline::new(
            Settings::builder().country(Country::Fr).history(Retention::Week).build(),
        );
        let history = [
            payload(0, &[("Nuclear", Some(40_000.0))]),
            RawPayload::default(),
            payload(15, &[("Nuclear", Some(42_000.0))]),
        ];
        assert_eq!(pipeline.backfill(&history), 2);
        assert_eq!(pipeline.history.as_ref().unwrap().len(), 2);
        assert!(pipeline.outputs.is_empty());
    }

    #[test]
    fn test_backfill_without_history() {
        let mut pipeline = pipeline();
        assert_eq!(pipeline.backfill(&[payload(0, &[("Solar", Some(1.0))])]), 0);
    }

    #[test]
    fn test_countries_are_independent() {
        let mut germany = pipeline();
        let mut france = Pipeline::new(Settings::builder().country(Country::Fr).build());
        std::thread::scope(|scope| {
            scope.spawn(|| germany.update(&payload(0, &[("Solar", Some(1.0))])).len());
            scope.spawn(|| france.update(&payload(0, &[("Nuclear", Some(2.0))])).len());
        });
        assert!(germany.outputs.iter().all(|output| output.entity_id.starts_with("energy_charts_de_")));
        assert!(france.outputs.iter().all(|output| output.entity_id.starts_with("energy_charts_fr_")));
    }
}
