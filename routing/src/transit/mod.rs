pub mod constrained;
pub mod cost;
pub mod timetable;
pub mod trip_search;

use crate::request::SearchDirection;
use crate::transfers::Transfer;
use crate::transit::constrained::ConstrainedTransferSearch;
use crate::transit::cost::CostCalculator;
use crate::transit::trip_search::TripScheduleSearch;
use common::types::{RouteId, StopId, TripId};
use serde::{Deserialize, Serialize};

/// Index of a route pattern in the transit data. Continuous like `StopId`.
pub type RouteIndex = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitMode {
    #[default]
    Bus,
    Tram,
    Rail,
    Subway,
    Ferry,
}

impl TransitMode {
    pub const ALL: [TransitMode; 5] = [
        TransitMode::Bus,
        TransitMode::Tram,
        TransitMode::Rail,
        TransitMode::Subway,
        TransitMode::Ferry,
    ];

    pub(crate) fn ordinal(self) -> usize {
        self as usize
    }
}

/// An ordered sequence of stops served by all trips of a route timetable. A stop may appear more
/// than once (loops), so it is addressed by its position in the pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    pub route: RouteId,
    pub mode: TransitMode,
    pub stops: Vec<StopId>,
}

impl RoutePattern {
    pub fn number_of_stops(&self) -> usize {
        self.stops.len()
    }
}

/// The arrival and departure times of one trip at every position of its pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripSchedule {
    pub trip: TripId,
    pub arrivals: Vec<i32>,
    pub departures: Vec<i32>,
}

impl TripSchedule {
    #[inline]
    pub fn arrival(&self, stop_pos: usize) -> i32 {
        self.arrivals[stop_pos]
    }

    #[inline]
    pub fn departure(&self, stop_pos: usize) -> i32 {
        self.departures[stop_pos]
    }
}

/// Identifies one trip by route index and its index in the route timetable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TripRef {
    pub route: RouteIndex,
    pub trip: usize,
}

/// A pattern together with its trips. The trips are sorted and never overtake each other, which
/// the trip search relies on.
#[derive(Debug, Clone, Copy)]
pub struct RouteTimetable<'a> {
    pub index: RouteIndex,
    pub pattern: &'a RoutePattern,
    pub trips: &'a [TripSchedule],
}

impl<'a> RouteTimetable<'a> {
    pub fn number_of_trips(&self) -> usize {
        self.trips.len()
    }

    pub fn trip_schedule(&self, index: usize) -> &'a TripSchedule {
        &self.trips[index]
    }

    pub fn trip_ref(&self, index: usize) -> TripRef {
        TripRef { route: self.index, trip: index }
    }

    pub fn trip_search(&self, direction: SearchDirection) -> TripScheduleSearch<'a> {
        TripScheduleSearch::new(self.trips, direction)
    }
}

/// Read-only view of a pre-loaded transit network. Shared by all concurrently running iterations,
/// so implementations must not have interior mutability that is observable by the search.
pub trait TransitDataProvider: Send + Sync {
    fn number_of_stops(&self) -> usize;

    /// Every route serving at least one of the given stops, each once, in ascending order
    fn routes_for_stops(&self, stops: &[StopId]) -> Vec<RouteIndex>;

    fn route_timetable(&self, route: RouteIndex) -> RouteTimetable<'_>;

    fn transfers_from(&self, stop: StopId) -> &[Transfer];

    fn transfers_to(&self, stop: StopId) -> &[Transfer];

    /// Generic minimum time needed to change trips at a stop
    fn min_transfer_time(&self, _stop: StopId) -> i32 {
        0
    }

    fn constrained_transfer_search(&self) -> Option<&dyn ConstrainedTransferSearch> {
        None
    }

    fn cost_calculator(&self) -> Option<&dyn CostCalculator> {
        None
    }

    /// First departure and last arrival covered by the loaded schedule data
    fn valid_data_time_window(&self) -> (i32, i32);
}
