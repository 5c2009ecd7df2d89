mod energy_charts;

pub use self::energy_charts::{Api as EnergyCharts, Response as EnergyChartsResponse};
