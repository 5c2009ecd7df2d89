use std::collections::{HashMap, VecDeque};

use average::{Max, Mean};
use chrono::{DateTime, TimeDelta, Utc};

use crate::{prelude::*, quantity::power::Megawatts, snapshot::Reading};

/// How far back the history window reaches, measured from its newest point.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Retention {
    Day,
    Week,
    Month,
}

impl Retention {
    #[must_use]
    pub const fn time_delta(self) -> TimeDelta {
        match self {
            Self::Day => TimeDelta::hours(24),
            Self::Week => TimeDelta::days(7),
            Self::Month => TimeDelta::days(30),
        }
    }
}

/// Time-ordered points of a single source.
#[derive(Clone, Debug, Default)]
pub struct HistoryWindow(VecDeque<(DateTime<Utc>, Megawatts)>);

impl HistoryWindow {
    /// Append the point and evict everything that fell out of the retention.
    ///
    /// Returns `false` if the point is older than the newest one and has been ignored.
    pub fn push(
        &mut self,
        timestamp: DateTime<Utc>,
        power: Megawatts,
        retention: Retention,
    ) -> bool {
        match self.0.back_mut() {
            Some((latest, _)) if timestamp < *latest => return false,
            Some((latest, value)) if timestamp == *latest => {
                *value = power;
                return true;
            }
            _ => self.0.push_back((timestamp, power)),
        }
        let since = timestamp - retention.time_delta();
        while self.0.front().is_some_and(|(timestamp, _)| *timestamp < since) {
            self.0.pop_front();
        }
        true
    }

    pub fn peak(&self) -> Option<Megawatts> {
        let peak: Max = self.0.iter().map(|(_, power)| power.0).collect();
        (!self.0.is_empty()).then(|| Megawatts(peak.max()))
    }

    /// Unweighted mean: polling gaps are not taken into account.
    pub fn average(&self) -> Option<Megawatts> {
        let estimate: Mean = self.0.iter().map(|(_, power)| power.0).collect();
        (!estimate.is_empty()).then(|| Megawatts(estimate.mean()))
    }

    /// Last `n` points, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = (DateTime<Utc>, Megawatts)> + '_ {
        self.0.iter().skip(self.0.len().saturating_sub(n)).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Rolling per-source history of a single country.
#[derive(Debug)]
pub struct HistoryAccumulator {
    retention: Retention,
    windows: HashMap<String, HistoryWindow>,
}

impl HistoryAccumulator {
    #[must_use]
    pub fn new(retention: Retention) -> Self {
        Self { retention, windows: HashMap::new() }
    }

    /// Record the reading, readings with an undefined value are skipped.
    pub fn record(&mut self, reading: &Reading) {
        let Some(power) = reading.power else {
            return;
        };
        let window = self.windows.entry(reading.source_id.clone()).or_default();
        if !window.push(reading.timestamp, power, self.retention) {
            trace!(
                source_id = %reading.source_id,
                timestamp = %reading.timestamp,
                "ignored out-of-order point",
            );
        }
    }

    pub fn window(&self, source_id: &str) -> Option<&HistoryWindow> {
        self.windows.get(source_id)
    }

    pub fn peak(&self, source_id: &str) -> Option<Megawatts> {
        self.window(source_id)?.peak()
    }

    pub fn average(&self, source_id: &str) -> Option<Megawatts> {
        self.window(source_id)?.average()
    }

    pub fn recent(&self, source_id: &str, n: usize) -> Vec<(DateTime<Utc>, Megawatts)> {
        self.window(source_id).map(|window| window.recent(n).collect()).unwrap_or_default()
    }

    /// Total number of retained points across all sources.
    pub fn len(&self) -> usize {
        self.windows.values().map(HistoryWindow::len).sum()
    }
}
