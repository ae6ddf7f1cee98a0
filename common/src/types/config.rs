use chrono::TimeDelta;
use serde::Deserialize;
use serde_with::serde_as;

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1")]
    Version1 {
        /// Path of the timetable (JSON) the engine routes on
        timetable: String,
        #[serde(default)]
        raptor: RaptorConfig,
    }
}

/// Tuning parameters of the Range Raptor search. Every field has a default, so an empty `raptor`
/// section (or none at all) is valid.
#[serde_as]
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RaptorConfig {
    /// Used when a request does not set its own limit. The number of rounds is this + 1.
    pub max_number_of_transfers: i32,
    /// Step between two Range Raptor iterations
    #[serde_as(as = "serde_with::DurationSeconds<i64>")]
    pub iteration_departure_step: TimeDelta,
    /// Number of threads used to run iterations concurrently. 0 runs everything on the caller's
    /// thread.
    pub search_thread_pool_size: usize,
    #[serde_as(as = "Option<serde_with::DurationSeconds<i64>>")]
    pub search_timeout: Option<TimeDelta>,
    pub dynamic_search_window: DynamicSearchWindowConfig,
}

impl Default for RaptorConfig {
    fn default() -> Self {
        Self {
            max_number_of_transfers: 12,
            iteration_departure_step: TimeDelta::seconds(60),
            search_thread_pool_size: 0,
            search_timeout: None,
            dynamic_search_window: DynamicSearchWindowConfig::default(),
        }
    }
}

// window = min_window + T * minTransitTime + W * minWaitTime
// The result is rounded up to a multiple of `step_minutes` and clamped to [min_window, max_window].
#[serde_as]
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DynamicSearchWindowConfig {
    pub min_transit_time_coefficient: f64,
    pub min_wait_time_coefficient: f64,
    #[serde_as(as = "serde_with::DurationSeconds<i64>")]
    pub min_window: TimeDelta,
    #[serde_as(as = "serde_with::DurationSeconds<i64>")]
    pub max_window: TimeDelta,
    pub step_minutes: u32,
}

impl Default for DynamicSearchWindowConfig {
    fn default() -> Self {
        Self {
            min_transit_time_coefficient: 0.5,
            min_wait_time_coefficient: 0.5,
            min_window: TimeDelta::minutes(40),
            max_window: TimeDelta::hours(3),
            step_minutes: 10,
        }
    }
}
