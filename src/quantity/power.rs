use std::ops::Div;

use crate::quantity::percent::Percent;

quantity!(Megawatts, suffix: "MW", precision: 2);

impl Megawatts {
    pub const ZERO: Self = Self(0.0);

    /// Share of `self` in `total`, defined only for a positive total.
    pub fn share_of(self, total: Self) -> Option<Percent> {
        (total > Self::ZERO).then(|| Percent(self / total * 100.0))
    }
}

impl Div for Megawatts {
    type Output = f64;

    fn div(self, rhs: Self) -> Self::Output {
        self.0 / rhs.0
    }
}
