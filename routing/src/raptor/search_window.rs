use common::types::config::DynamicSearchWindowConfig;

/// Computes the length of the search window from what a heuristic search found out about the
/// trip: the longer the trip, and the more waiting it involves, the wider the window.
#[derive(Debug, Clone, Copy)]
pub struct DynamicSearchWindow<'a> {
    config: &'a DynamicSearchWindowConfig,
}

impl<'a> DynamicSearchWindow<'a> {
    pub fn new(config: &'a DynamicSearchWindowConfig) -> Self {
        Self { config }
    }

    fn step(&self) -> i32 {
        self.config.step_minutes.max(1) as i32 * 60
    }

    fn min_window(&self) -> i32 {
        self.config.min_window.num_seconds() as i32
    }

    pub fn max_window(&self) -> i32 {
        self.config.max_window.num_seconds() as i32
    }

    /// `min_window + T·min_transit_time + W·min_wait_time`, rounded up to the step and clamped to
    /// the configured range
    pub fn calculate(&self, min_transit_time: i32, min_wait_time: i32) -> i32 {
        let window = self.min_window() as f64
            + self.config.min_transit_time_coefficient * min_transit_time as f64
            + self.config.min_wait_time_coefficient * min_wait_time as f64;
        round_up(window.ceil() as i32, self.step()).clamp(self.min_window(), self.max_window().max(self.min_window()))
    }

    /// The window if both time bounds are known: whatever is left of the span between them after
    /// the shortest possible trip
    pub fn between(&self, earliest_departure_time: i32, latest_arrival_time: i32, min_transit_time: i32) -> i32 {
        let span = latest_arrival_time - earliest_departure_time - min_transit_time;
        round_up(span.max(0), self.step()).clamp(0, self.max_window().max(0))
    }
}

/// Rounds `value` up to a multiple of `step`
pub(crate) fn round_up(value: i32, step: i32) -> i32 {
    let step = step.max(1);
    value.div_euclid(step) * step + if value.rem_euclid(step) > 0 { step } else { 0 }
}
