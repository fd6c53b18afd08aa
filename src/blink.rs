//! Run-status indicator

use crate::platform::{IndicatorId, Indicators};

/// Toggles the run-status indicator once per period
#[derive(Debug, Default)]
pub struct StatusBlinker {
    count: u32,
}

impl StatusBlinker {
    pub const fn new() -> Self {
        Self { count: 0 }
    }

    /// Advance one period and drive the indicator; returns the new level
    pub fn tick<I: Indicators>(&mut self, indicators: &mut I) -> bool {
        self.count = self.count.wrapping_add(1);
        let on = self.count % 2 == 1;
        indicators.set_indicator(IndicatorId::RunStatus, on);
        on
    }
}
