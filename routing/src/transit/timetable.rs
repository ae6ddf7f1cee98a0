use crate::transfers::{Transfer, TransferError, TransferIndex};
use crate::transit::constrained::{
    ConstrainedTransfer, ConstrainedTransferSearch, ConstrainedTransfers, TransferConstraint, TransferPoint,
};
use crate::transit::cost::{CostCalculator, CostParameters, DefaultCostCalculator};
use crate::transit::{
    RouteIndex, RoutePattern, RouteTimetable, TransitDataProvider, TransitMode, TripRef, TripSchedule,
};
use common::types::{RouteId, StopId, TripId};
use common::util::time::TimeOfDay;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Display;

/// Serialized form of a complete, pre-loaded transit network
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timetable {
    /// Stop ids are the indices into this list
    pub stops: Vec<StopInfo>,
    pub routes: Vec<RouteInfo>,
    #[serde(default)]
    pub transfers: Vec<TransferInfo>,
    #[serde(default)]
    pub constrained_transfers: Vec<ConstrainedTransferInfo>,
    #[serde(default)]
    pub cost: Option<CostParameters>,
    #[serde(default)]
    pub valid_from: Option<TimeOfDay>,
    #[serde(default)]
    pub valid_to: Option<TimeOfDay>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopInfo {
    pub name: String,
    /// Seconds
    #[serde(default)]
    pub min_transfer_time: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteInfo {
    pub id: RouteId,
    #[serde(default)]
    pub mode: TransitMode,
    pub stops: Vec<StopId>,
    pub trips: Vec<TripInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripInfo {
    pub id: TripId,
    /// One entry per stop of the route
    pub times: Vec<StopTime>,
}

/// Either a single time (arrival = departure) or `{ "arrival": .., "departure": .. }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StopTime {
    At(TimeOfDay),
    Dwell { arrival: TimeOfDay, departure: TimeOfDay },
}

impl StopTime {
    pub(crate) fn arrival(&self) -> i32 {
        match self {
            StopTime::At(t) => t.0,
            StopTime::Dwell { arrival, .. } => arrival.0,
        }
    }

    pub(crate) fn departure(&self) -> i32 {
        match self {
            StopTime::At(t) => t.0,
            StopTime::Dwell { departure, .. } => departure.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransferInfo {
    pub from: StopId,
    pub to: StopId,
    /// Seconds
    pub duration: i32,
}

/// One side of a constrained transfer. Naming a trip makes the constraint apply to that trip only,
/// otherwise it applies to all trips of the route.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransferPointInfo {
    pub route: RouteId,
    #[serde(default)]
    pub trip: Option<TripId>,
    pub stop: StopId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConstrainedTransferInfo {
    pub from: TransferPointInfo,
    pub to: TransferPointInfo,
    pub constraint: TransferConstraint,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TimetableError {
    UnknownStop { route: RouteId, stop: StopId },
    UnknownRoute(RouteId),
    UnknownTrip { route: RouteId, trip: TripId },
    StopNotOnRoute { route: RouteId, stop: StopId },
    TooFewStops(RouteId),
    WrongNumberOfTimes { trip: TripId, expected: usize, actual: usize },
    DecreasingTimes { trip: TripId, stop_pos: usize },
    OvertakingTrips { route: RouteId, first: TripId, second: TripId, stop_pos: usize },
    NegativeMinTransferTime(StopId),
    Transfer(#[from] TransferError),
    InvalidValidityWindow,
}

impl Display for TimetableError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TimetableError::UnknownStop { route, stop } => write!(f, "Route {} references unknown stop {}", route, stop),
            TimetableError::UnknownRoute(route) => write!(f, "Unknown route {}", route),
            TimetableError::UnknownTrip { route, trip } => write!(f, "Route {} has no trip {}", route, trip),
            TimetableError::StopNotOnRoute { route, stop } => write!(f, "Stop {} is not served by route {}", stop, route),
            TimetableError::TooFewStops(route) => write!(f, "Route {} must serve at least two stops", route),
            TimetableError::WrongNumberOfTimes { trip, expected, actual } => {
                write!(f, "Trip {} has {} stop times, but its route has {} stops", trip, actual, expected)
            }
            TimetableError::DecreasingTimes { trip, stop_pos } => {
                write!(f, "Trip {} goes back in time at stop position {}", trip, stop_pos)
            }
            TimetableError::OvertakingTrips { route, first, second, stop_pos } => write!(
                f, "Trip {} overtakes trip {} on route {} at stop position {}", second, first, route, stop_pos
            ),
            TimetableError::NegativeMinTransferTime(stop) => {
                write!(f, "Stop {} has a negative minimum transfer time", stop)
            }
            TimetableError::Transfer(err) => write!(f, "{}", err),
            TimetableError::InvalidValidityWindow => write!(f, "valid_from must not be after valid_to"),
        }
    }
}

/// In-memory `TransitDataProvider` built from a `Timetable`
#[derive(Debug)]
pub struct TimetableTransitData {
    stop_names: Vec<String>,
    min_transfer_times: Vec<i32>,
    patterns: Vec<RoutePattern>,
    trips: Vec<Vec<TripSchedule>>,
    // <stop, [route index]>, sorted and without duplicates
    routes_by_stop: Vec<Vec<RouteIndex>>,
    transfers: TransferIndex,
    constrained_transfers: Option<ConstrainedTransfers>,
    cost_calculator: Option<DefaultCostCalculator>,
    valid_window: (i32, i32),
}

impl TryFrom<Timetable> for TimetableTransitData {
    type Error = TimetableError;

    fn try_from(timetable: Timetable) -> Result<Self, Self::Error> {
        let number_of_stops = timetable.stops.len();
        if let Some(stop) = timetable.stops.iter().position(|s| s.min_transfer_time < 0) {
            return Err(TimetableError::NegativeMinTransferTime(StopId(stop as u32)));
        }

        let mut patterns = Vec::with_capacity(timetable.routes.len());
        let mut trips = Vec::with_capacity(timetable.routes.len());
        let mut routes_by_stop: Vec<Vec<RouteIndex>> = vec![Vec::new(); number_of_stops];

        for (route_idx, route) in timetable.routes.into_iter().enumerate() {
            if route.stops.len() < 2 {
                return Err(TimetableError::TooFewStops(route.id));
            }
            for stop in &route.stops {
                if stop.idx() >= number_of_stops {
                    return Err(TimetableError::UnknownStop { route: route.id, stop: *stop });
                }
                routes_by_stop[stop.idx()].push(route_idx);
            }

            let schedules = route.trips.iter()
                .map(|trip| trip_schedule(trip, route.stops.len()))
                .collect::<Result<Vec<_>, _>>()?;
            let schedules = sort_trips(route.id, schedules)?;

            patterns.push(RoutePattern { route: route.id, mode: route.mode, stops: route.stops });
            trips.push(schedules);
        }

        for routes in routes_by_stop.iter_mut() {
            routes.dedup();
        }

        let transfers = TransferIndex::new(
            number_of_stops,
            timetable.transfers.iter().map(|t| (t.from, t.to, t.duration)),
        )?;

        let constrained_transfers = if timetable.constrained_transfers.is_empty() {
            None
        } else {
            let mut constraints = Vec::with_capacity(timetable.constrained_transfers.len());
            for info in &timetable.constrained_transfers {
                let from = transfer_points(&patterns, &trips, &info.from, Side::Alight)?;
                let to = transfer_points(&patterns, &trips, &info.to, Side::Board)?;
                constraints.extend(
                    from.into_iter()
                        .cartesian_product(to)
                        .map(|(from, to)| ConstrainedTransfer { from, to, constraint: info.constraint }),
                );
            }
            Some(ConstrainedTransfers::new(constraints))
        };

        let (first, last) = trips.iter().flatten()
            .flat_map(|trip| trip.departures.first().into_iter().chain(trip.arrivals.last()))
            .minmax()
            .into_option()
            .map_or((0, 0), |(first, last)| (*first, *last));
        let valid_window = (
            timetable.valid_from.map_or(first, |t| t.0),
            timetable.valid_to.map_or(last, |t| t.0),
        );
        if valid_window.0 > valid_window.1 {
            return Err(TimetableError::InvalidValidityWindow);
        }

        Ok(Self {
            stop_names: timetable.stops.iter().map(|s| s.name.clone()).collect(),
            min_transfer_times: timetable.stops.iter().map(|s| s.min_transfer_time).collect(),
            patterns,
            trips,
            routes_by_stop,
            transfers,
            constrained_transfers,
            cost_calculator: timetable.cost.as_ref().map(DefaultCostCalculator::from),
            valid_window,
        })
    }
}

fn trip_schedule(trip: &TripInfo, number_of_stops: usize) -> Result<TripSchedule, TimetableError> {
    if trip.times.len() != number_of_stops {
        return Err(TimetableError::WrongNumberOfTimes {
            trip: trip.id,
            expected: number_of_stops,
            actual: trip.times.len(),
        });
    }

    let arrivals = trip.times.iter().map(StopTime::arrival).collect_vec();
    let departures = trip.times.iter().map(StopTime::departure).collect_vec();

    for pos in 0..number_of_stops {
        // dwell at the stop, then travel to the next one
        let decreasing = departures[pos] < arrivals[pos]
            || (pos + 1 < number_of_stops && arrivals[pos + 1] < departures[pos]);
        if decreasing {
            return Err(TimetableError::DecreasingTimes { trip: trip.id, stop_pos: pos });
        }
    }

    Ok(TripSchedule { trip: trip.id, arrivals, departures })
}

// Sort by first departure and make sure no trip overtakes another, the trip search depends on it
fn sort_trips(route: RouteId, mut trips: Vec<TripSchedule>) -> Result<Vec<TripSchedule>, TimetableError> {
    trips.sort_by_key(|trip| (trip.departure(0), trip.arrival(trip.arrivals.len() - 1), trip.trip));

    for (a, b) in trips.iter().tuple_windows() {
        let overtaken = (0..a.arrivals.len())
            .find(|&pos| b.arrival(pos) < a.arrival(pos) || b.departure(pos) < a.departure(pos));
        if let Some(stop_pos) = overtaken {
            return Err(TimetableError::OvertakingTrips { route, first: a.trip, second: b.trip, stop_pos });
        }
    }

    Ok(trips)
}

#[derive(Clone, Copy)]
enum Side {
    Alight,
    Board,
}

// A route may have several patterns. A route-level point applies to each of them serving the stop,
// a trip-level one to the pattern of the trip.
fn transfer_points(
    patterns: &[RoutePattern],
    trips: &[Vec<TripSchedule>],
    info: &TransferPointInfo,
    side: Side,
) -> Result<Vec<TransferPoint>, TimetableError> {
    let mut route_exists = false;
    let mut points = Vec::new();

    for (route_idx, pattern) in patterns.iter().enumerate() {
        if pattern.route != info.route {
            continue;
        }
        route_exists = true;

        let trip = match info.trip {
            Some(trip_id) => match trips[route_idx].iter().position(|t| t.trip == trip_id) {
                Some(trip) => Some(trip),
                None => continue,
            },
            None => None,
        };

        // A loop route can serve the stop twice: alight at the last visit, board at the first
        let stop_pos = match side {
            Side::Alight => pattern.stops.iter().skip(1).rposition(|s| *s == info.stop).map(|p| p + 1),
            Side::Board => pattern.stops.iter().take(pattern.stops.len() - 1).position(|s| *s == info.stop),
        };
        let Some(stop_pos) = stop_pos else {
            continue;
        };

        points.push(match trip {
            Some(trip) => TransferPoint::Trip { trip: TripRef { route: route_idx, trip }, stop_pos },
            None => TransferPoint::Route { route: route_idx, stop_pos },
        });
    }

    if !points.is_empty() {
        Ok(points)
    } else if !route_exists {
        Err(TimetableError::UnknownRoute(info.route))
    } else if let Some(trip) = info.trip {
        Err(TimetableError::UnknownTrip { route: info.route, trip })
    } else {
        Err(TimetableError::StopNotOnRoute { route: info.route, stop: info.stop })
    }
}

impl TimetableTransitData {
    pub fn stop_name(&self, stop: StopId) -> Option<&str> {
        self.stop_names.get(stop.idx()).map(String::as_str)
    }

    pub fn number_of_routes(&self) -> usize {
        self.patterns.len()
    }
}

impl TransitDataProvider for TimetableTransitData {
    fn number_of_stops(&self) -> usize {
        self.stop_names.len()
    }

    fn routes_for_stops(&self, stops: &[StopId]) -> Vec<RouteIndex> {
        stops.iter()
            .filter_map(|stop| self.routes_by_stop.get(stop.idx()))
            .kmerge()
            .dedup()
            .copied()
            .collect()
    }

    fn route_timetable(&self, route: RouteIndex) -> RouteTimetable<'_> {
        RouteTimetable { index: route, pattern: &self.patterns[route], trips: &self.trips[route] }
    }

    fn transfers_from(&self, stop: StopId) -> &[Transfer] {
        self.transfers.transfers_from(stop)
    }

    fn transfers_to(&self, stop: StopId) -> &[Transfer] {
        self.transfers.transfers_to(stop)
    }

    fn min_transfer_time(&self, stop: StopId) -> i32 {
        self.min_transfer_times.get(stop.idx()).copied().unwrap_or(0)
    }

    fn constrained_transfer_search(&self) -> Option<&dyn ConstrainedTransferSearch> {
        self.constrained_transfers.as_ref().map(|c| c as &dyn ConstrainedTransferSearch)
    }

    fn cost_calculator(&self) -> Option<&dyn CostCalculator> {
        self.cost_calculator.as_ref().map(|c| c as &dyn CostCalculator)
    }

    fn valid_data_time_window(&self) -> (i32, i32) {
        self.valid_window
    }
}
