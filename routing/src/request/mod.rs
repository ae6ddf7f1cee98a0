pub mod access_egress;
pub mod input;
pub mod via;

use crate::errors::ConfigError;
use crate::raptor::debug::{DebugListener, DebugRequest};
use crate::request::access_egress::AccessEgress;
use crate::request::via::ViaLocation;
use crate::transit::TransitDataProvider;
use common::types::errors::UnknownStopIdError;
use common::types::StopId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Display;
use std::sync::Arc;

pub const DEFAULT_MAX_NUMBER_OF_TRANSFERS: i32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    /// Earliest arrival with path reconstruction
    #[default]
    Standard,
    /// Like `Standard`, but only the best times are kept
    BestTime,
    /// Travel duration without waiting time. Single iteration only.
    #[serde(alias = "bounded-duration")]
    MinTravelDuration,
    /// Pareto optimal on arrival time, number of transfers and generalized cost
    MultiCriteria,
}

impl Profile {
    pub fn is_multi_criteria(self) -> bool {
        self == Profile::MultiCriteria
    }

    /// Only these profiles keep enough information to look up constrained transfers
    pub fn supports_constrained_transfers(self) -> bool {
        matches!(self, Profile::Standard | Profile::MultiCriteria)
    }

    pub fn produces_journeys(self) -> bool {
        matches!(self, Profile::Standard | Profile::MultiCriteria)
    }
}

impl Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Profile::Standard => "standard",
            Profile::BestTime => "best-time",
            Profile::MinTravelDuration => "min-travel-duration",
            Profile::MultiCriteria => "multi-criteria",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchDirection {
    /// From the origin at the earliest departure time towards the destination
    #[default]
    Forward,
    /// From the destination at the latest arrival time back to the origin
    Reverse,
}

impl SearchDirection {
    pub fn is_forward(self) -> bool {
        self == SearchDirection::Forward
    }
}

/// Immutable parameters of one search. All times in seconds of the service day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchParams {
    pub earliest_departure_time: Option<i32>,
    pub latest_arrival_time: Option<i32>,
    /// Length of the departure (forward) or arrival (reverse) window in seconds
    pub search_window: Option<i32>,
    pub max_number_of_transfers: i32,
    pub access_paths: Vec<AccessEgress>,
    pub egress_paths: Vec<AccessEgress>,
    /// Honor the constrained transfers of the transit data, if there are any
    pub constrained_transfers: bool,
    /// Allow a heuristic pre-search to derive a missing time bound or search window
    pub heuristics_enabled: bool,
    /// Locations every journey has to visit, in this order
    pub via_locations: Vec<ViaLocation>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            earliest_departure_time: None,
            latest_arrival_time: None,
            search_window: None,
            max_number_of_transfers: DEFAULT_MAX_NUMBER_OF_TRANSFERS,
            access_paths: vec![],
            egress_paths: vec![],
            constrained_transfers: true,
            heuristics_enabled: true,
            via_locations: vec![],
        }
    }
}

impl SearchParams {
    /// One round per transit leg
    pub fn number_of_rounds(&self) -> usize {
        self.max_number_of_transfers.max(0) as usize + 1
    }

    /// The search can only start right away if the window and the time bound the search starts
    /// from are known
    pub fn requires_heuristics(&self, profile: Profile, direction: SearchDirection) -> bool {
        let start_bound = match direction {
            SearchDirection::Forward => self.earliest_departure_time,
            SearchDirection::Reverse => self.latest_arrival_time,
        };
        let window_missing = profile != Profile::MinTravelDuration && self.search_window.is_none();
        start_bound.is_none() || window_missing
    }

    pub fn search_window_or_zero(&self) -> i32 {
        self.search_window.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RaptorRequest {
    pub profile: Profile,
    pub direction: SearchDirection,
    pub params: SearchParams,
    pub debug: DebugRequest,
}

impl RaptorRequest {
    pub fn builder() -> RaptorRequestBuilder {
        RaptorRequestBuilder::default()
    }

    /// Checks everything that can be checked before the first round runs
    pub fn validate(&self, data: &dyn TransitDataProvider) -> Result<(), ConfigError> {
        let params = &self.params;

        if params.max_number_of_transfers < 0 {
            return Err(ConfigError::InvalidRoundLimit(params.max_number_of_transfers));
        }
        if params.access_paths.is_empty() {
            return Err(ConfigError::NoAccessPaths);
        }
        if params.egress_paths.is_empty() {
            return Err(ConfigError::NoEgressPaths);
        }

        let number_of_stops = data.number_of_stops();
        for path in params.access_paths.iter().chain(params.egress_paths.iter()) {
            if path.stop.idx() >= number_of_stops {
                return Err(UnknownStopIdError(path.stop).into());
            }
            if path.duration < 0 {
                return Err(ConfigError::NegativeDuration(path.stop));
            }
            if path.opening_hours.is_some_and(|hours| hours.open > hours.close) {
                return Err(ConfigError::InvalidOpeningHours(path.stop));
            }
        }

        if !params.via_locations.is_empty() && !self.profile.is_multi_criteria() {
            return Err(ConfigError::ViaSearchNotSupported(self.profile));
        }
        for (i, location) in params.via_locations.iter().enumerate() {
            if location.stops.is_empty() {
                return Err(ConfigError::EmptyViaLocation(i));
            }
            if let Some(&stop) = location.stops.iter().find(|s| s.idx() >= number_of_stops) {
                return Err(UnknownStopIdError(stop).into());
            }
        }

        match (params.earliest_departure_time, params.latest_arrival_time) {
            (None, None) => return Err(ConfigError::NoTimeBound),
            (Some(edt), Some(lat)) if edt > lat => return Err(ConfigError::DepartureAfterArrival),
            _ => {}
        }

        match params.search_window {
            Some(window) if window < 0 => return Err(ConfigError::NegativeSearchWindow),
            Some(window) if window > 0 && self.profile == Profile::MinTravelDuration => {
                return Err(ConfigError::MinTravelDurationWithSearchWindow);
            }
            _ => {}
        }

        if !params.heuristics_enabled && params.requires_heuristics(self.profile, self.direction) {
            return Err(ConfigError::HeuristicsRequired);
        }
        // the heuristics do not know about via locations and would underestimate
        if !params.via_locations.is_empty() && params.requires_heuristics(self.profile, self.direction) {
            return Err(ConfigError::ViaSearchWithoutWindow);
        }

        let (valid_from, valid_to) = data.valid_data_time_window();
        let departs_too_late = params.earliest_departure_time.is_some_and(|edt| edt > valid_to);
        let arrives_too_early = params.latest_arrival_time.is_some_and(|lat| lat < valid_from);
        if departs_too_late || arrives_too_early {
            return Err(ConfigError::OutsideDataWindow);
        }

        Ok(())
    }

    pub fn traced_stops(&self) -> impl Iterator<Item = &StopId> {
        self.debug.stops.iter()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RaptorRequestBuilder {
    request: RaptorRequest,
}

impl RaptorRequestBuilder {
    pub fn profile(mut self, profile: Profile) -> Self {
        self.request.profile = profile;
        self
    }

    pub fn direction(mut self, direction: SearchDirection) -> Self {
        self.request.direction = direction;
        self
    }

    pub fn earliest_departure_time(mut self, time: i32) -> Self {
        self.request.params.earliest_departure_time = Some(time);
        self
    }

    pub fn latest_arrival_time(mut self, time: i32) -> Self {
        self.request.params.latest_arrival_time = Some(time);
        self
    }

    pub fn search_window(mut self, seconds: i32) -> Self {
        self.request.params.search_window = Some(seconds);
        self
    }

    pub fn max_number_of_transfers(mut self, max: i32) -> Self {
        self.request.params.max_number_of_transfers = max;
        self
    }

    pub fn access(mut self, stop: StopId, duration: i32) -> Self {
        self.request.params.access_paths.push(AccessEgress::new(stop, duration));
        self
    }

    pub fn access_path(mut self, path: AccessEgress) -> Self {
        self.request.params.access_paths.push(path);
        self
    }

    pub fn egress(mut self, stop: StopId, duration: i32) -> Self {
        self.request.params.egress_paths.push(AccessEgress::new(stop, duration));
        self
    }

    pub fn egress_path(mut self, path: AccessEgress) -> Self {
        self.request.params.egress_paths.push(path);
        self
    }

    pub fn via(mut self, location: ViaLocation) -> Self {
        self.request.params.via_locations.push(location);
        self
    }

    pub fn constrained_transfers(mut self, enabled: bool) -> Self {
        self.request.params.constrained_transfers = enabled;
        self
    }

    pub fn heuristics(mut self, enabled: bool) -> Self {
        self.request.params.heuristics_enabled = enabled;
        self
    }

    pub fn debug_stops(mut self, stops: impl IntoIterator<Item = StopId>) -> Self {
        self.request.debug.stops.extend(stops);
        self
    }

    pub fn debug_path(mut self, path: impl IntoIterator<Item = StopId>) -> Self {
        self.request.debug.path.extend(path);
        self
    }

    pub fn debug_listener(mut self, listener: Arc<dyn DebugListener>) -> Self {
        self.request.debug.listeners.push(listener);
        self
    }

    pub fn build(self) -> RaptorRequest {
        self.request
    }
}
