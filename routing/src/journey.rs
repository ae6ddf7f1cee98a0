use crate::transit::constrained::TransferConstraint;
use common::types::{RouteId, StopId, TripId};
use common::util::time::{format_duration, format_time, serialize_time};
use serde::Serialize;
use std::fmt::{Debug, Formatter};
use std::slice::Iter;

/// One part of a journey. All times are real times, also for journeys found by a reverse search.
#[derive(Serialize, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Leg {
    /// From the origin to the first boarding stop. Shifted to end when the first trip departs.
    Access {
        stop: StopId,
        #[serde(serialize_with = "serialize_time")]
        departure: i32,
        #[serde(serialize_with = "serialize_time")]
        arrival: i32,
    },
    Transit {
        route: RouteId,
        trip: TripId,
        from: StopId,
        to: StopId,
        board_pos: usize,
        alight_pos: usize,
        #[serde(serialize_with = "serialize_time")]
        departure: i32,
        #[serde(serialize_with = "serialize_time")]
        arrival: i32,
        /// Constraint of the transfer that led onto this trip
        #[serde(skip_serializing_if = "Option::is_none")]
        constraint: Option<TransferConstraint>,
    },
    Transfer {
        from: StopId,
        to: StopId,
        #[serde(serialize_with = "serialize_time")]
        departure: i32,
        #[serde(serialize_with = "serialize_time")]
        arrival: i32,
    },
    /// From the last alighting stop to the destination
    Egress {
        stop: StopId,
        #[serde(serialize_with = "serialize_time")]
        departure: i32,
        #[serde(serialize_with = "serialize_time")]
        arrival: i32,
    },
}

impl Leg {
    pub fn departure(&self) -> i32 {
        match self {
            Leg::Access { departure, .. }
            | Leg::Transit { departure, .. }
            | Leg::Transfer { departure, .. }
            | Leg::Egress { departure, .. } => *departure,
        }
    }

    pub fn arrival(&self) -> i32 {
        match self {
            Leg::Access { arrival, .. }
            | Leg::Transit { arrival, .. }
            | Leg::Transfer { arrival, .. }
            | Leg::Egress { arrival, .. } => *arrival,
        }
    }

    pub fn duration(&self) -> i32 {
        self.arrival() - self.departure()
    }

    /// Stop the leg starts at. None for the access leg, which starts at the origin.
    pub fn start(&self) -> Option<StopId> {
        match self {
            Leg::Access { .. } => None,
            Leg::Transit { from, .. } | Leg::Transfer { from, .. } => Some(*from),
            Leg::Egress { stop, .. } => Some(*stop),
        }
    }

    /// Stop the leg ends at. None for the egress leg, which ends at the destination.
    pub fn end(&self) -> Option<StopId> {
        match self {
            Leg::Access { stop, .. } => Some(*stop),
            Leg::Transit { to, .. } | Leg::Transfer { to, .. } => Some(*to),
            Leg::Egress { .. } => None,
        }
    }

    pub fn is_transit(&self) -> bool {
        matches!(self, Leg::Transit { .. })
    }

    #[cfg(debug_assertions)]
    pub(crate) fn validate(&self) {
        debug_assert!(
            self.departure() <= self.arrival(),
            "Start of leg {:?} must not be after its end", self
        );
        if let Leg::Transit { board_pos, alight_pos, .. } = self {
            debug_assert!(board_pos < alight_pos, "Leg {:?} must alight after boarding", self);
        }
    }
}

impl Debug for Leg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Leg::Access { stop, departure, arrival } => {
                f.write_fmt(format_args!("Access {} ---({})---> {} @{}", format_time(*departure), format_duration(arrival - departure), stop, format_time(*arrival)))
            }
            Leg::Transit { from, to, trip, route, departure, arrival, constraint, .. } => {
                f.write_fmt(format_args!("{} @{} ---{}/{}---> {} @{}", from, format_time(*departure), route, trip, to, format_time(*arrival)))?;
                if let Some(constraint) = constraint {
                    f.write_fmt(format_args!(" [{:?}]", constraint))?;
                }
                Ok(())
            }
            Leg::Transfer { from, to, departure, arrival } => {
                f.write_fmt(format_args!("{} @{} ---({})---> {}", from, format_time(*departure), format_duration(arrival - departure), to))
            }
            Leg::Egress { stop, departure, arrival } => {
                f.write_fmt(format_args!("Egress {} @{} ---({})---> {}", stop, format_time(*departure), format_duration(arrival - departure), format_time(*arrival)))
            }
        }
    }
}

/// A complete path from origin to destination. Ordered by departure, arrival, number of transfers,
/// cost and finally the legs themselves, which makes the order of any set of journeys total.
#[derive(Serialize, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Journey {
    #[serde(serialize_with = "serialize_time")]
    departure: i32,
    #[serde(serialize_with = "serialize_time")]
    arrival: i32,
    number_of_transfers: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    generalized_cost: Option<i32>,
    legs: Vec<Leg>,
}

impl Journey {
    pub fn new(legs: Vec<Leg>, generalized_cost: Option<i32>) -> Self {
        #[cfg(debug_assertions)] {
            debug_assert!(!legs.is_empty(), "A Journey must have at least one leg");

            legs.iter().for_each(Leg::validate);

            // Each leg must start where the previous one ended, and not before it ended
            for (leg, next) in legs.iter().zip(legs.iter().skip(1)) {
                debug_assert!(leg.end() == next.start(), "Legs {:?} and {:?} are not connected", leg, next);
                debug_assert!(leg.arrival() <= next.departure(), "Leg {:?} departs before {:?} arrives", next, leg);
            }
        }

        let transits = legs.iter().filter(|leg| leg.is_transit()).count() as u32;
        Self {
            departure: legs.first().map_or(0, Leg::departure),
            arrival: legs.last().map_or(0, Leg::arrival),
            number_of_transfers: transits.saturating_sub(1),
            generalized_cost,
            legs,
        }
    }

    pub fn legs(&self) -> Iter<Leg> {
        self.legs.iter()
    }

    pub fn departure(&self) -> i32 {
        self.departure
    }

    pub fn arrival(&self) -> i32 {
        self.arrival
    }

    pub fn duration(&self) -> i32 {
        self.arrival - self.departure
    }

    pub fn number_of_transfers(&self) -> u32 {
        self.number_of_transfers
    }

    pub fn generalized_cost(&self) -> Option<i32> {
        self.generalized_cost
    }

    /// Every stop of the journey, in the order they are passed (not counting intermediate stops of
    /// a trip)
    pub fn stops(&self) -> impl Iterator<Item = StopId> + '_ {
        self.legs.iter()
            .flat_map(|leg| leg.start().into_iter().chain(leg.end()))
            .scan(None, |last, stop| {
                let repeated = *last == Some(stop);
                *last = Some(stop);
                Some((!repeated).then_some(stop))
            })
            .flatten()
    }

    /// True if all `path` stops are visited, in this order. Other stops may lie in between.
    pub fn visits_in_order(&self, path: &[StopId]) -> bool {
        let mut remaining = path.iter().peekable();
        for stop in self.stops() {
            if remaining.peek() == Some(&&stop) {
                remaining.next();
            }
        }
        remaining.peek().is_none()
    }
}
