use crate::sensor::SensorState;

/// Consecutive misses after which a source-backed sensor turns unavailable.
pub const MAX_MISSES: u8 = 2;

/// Per-sensor availability that tolerates a single missing cycle.
///
/// The state machine only knows three transitions: unavailable → available on
/// the first defined value, available → available on a new value or a single
/// miss, and available → unavailable on the second consecutive miss.
#[derive(Copy, Clone, Debug, Default)]
pub struct Availability {
    last: Option<f64>,
    misses: u8,
}

impl Availability {
    /// Feed the value of the current cycle and return the state to report.
    pub fn observe(&mut self, value: Option<f64>) -> SensorState {
        if let Some(value) = value {
            self.last = Some(value);
            self.misses = 0;
            return SensorState::Available(value);
        }
        self.misses = self.misses.saturating_add(1);
        if self.misses >= MAX_MISSES {
            self.last = None;
        }
        self.last.map_or(SensorState::Unavailable, SensorState::Available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_until_first_value() {
        let mut availability = Availability::default();
        assert_eq!(availability.observe(None), SensorState::Unavailable);
        assert_eq!(availability.observe(None), SensorState::Unavailable);
        assert_eq!(availability.observe(Some(1.0)), SensorState::Available(1.0));
    }

    #[test]
    fn test_single_miss_is_tolerated() {
        let mut availability = Availability::default();
        assert_eq!(availability.observe(Some(1.0)), SensorState::Available(1.0));
        assert_eq!(availability.observe(None), SensorState::Available(1.0));
        assert_eq!(availability.observe(Some(2.0)), SensorState::Available(2.0));
        assert_eq!(availability.observe(None), SensorState::Available(2.0));
    }

    #[test]
    fn test_second_miss_turns_unavailable() {
        let mut availability = Availability::default();
        availability.observe(Some(1.0));
        availability.observe(None);
        assert_eq!(availability.observe(None), SensorState::Unavailable);
        assert_eq!(availability.observe(None), SensorState::Unavailable);
        assert_eq!(availability.observe(Some(3.0)), SensorState::Available(3.0));
    }
}
