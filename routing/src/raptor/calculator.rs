use crate::request::access_egress::AccessEgress;
use crate::request::SearchDirection;
use crate::transfers::Transfer;
use crate::transit::constrained::{ConstrainedTransferSearch, TransferConstraint};
use crate::transit::trip_search::TripScheduleSearch;
use crate::transit::{RouteIndex, RouteTimetable, TransitDataProvider, TripRef, TripSchedule};
use common::types::StopId;
use itertools::Either;

/// Time arithmetic for one search direction. Everything above this type is written as if
/// searching forward: "plus" moves away from the search origin, "better" means closer to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitCalculator {
    direction: SearchDirection,
    /// Latest arrival time (forward) or earliest departure time (reverse)
    time_limit: Option<i32>,
}

impl TransitCalculator {
    pub fn new(direction: SearchDirection, time_limit: Option<i32>) -> Self {
        Self { direction, time_limit }
    }

    pub fn forward(time_limit: Option<i32>) -> Self {
        Self::new(SearchDirection::Forward, time_limit)
    }

    pub fn reverse(time_limit: Option<i32>) -> Self {
        Self::new(SearchDirection::Reverse, time_limit)
    }

    pub fn direction(&self) -> SearchDirection {
        self.direction
    }

    pub fn is_forward(&self) -> bool {
        self.direction.is_forward()
    }

    #[inline]
    pub fn plus(&self, time: i32, duration: i32) -> i32 {
        if self.is_forward() { time + duration } else { time - duration }
    }

    #[inline]
    pub fn minus(&self, time: i32, duration: i32) -> i32 {
        if self.is_forward() { time - duration } else { time + duration }
    }

    /// Time at the other end of an access or egress path entered at `time`, waiting for it to
    /// open if needed. None if it is closed.
    pub fn walk(&self, path: &AccessEgress, time: i32) -> Option<i32> {
        if self.is_forward() {
            path.earliest_start(time).map(|start| start + path.duration)
        } else {
            path.latest_start(time - path.duration)
        }
    }

    /// Duration from `from` to `to`, positive if `to` is reached after `from` in search order
    #[inline]
    pub fn duration(&self, from: i32, to: i32) -> i32 {
        if self.is_forward() { to - from } else { from - to }
    }

    #[inline]
    pub fn is_better(&self, a: i32, b: i32) -> bool {
        if self.is_forward() { a < b } else { a > b }
    }

    #[inline]
    pub fn is_better_or_equal(&self, a: i32, b: i32) -> bool {
        a == b || self.is_better(a, b)
    }

    #[inline]
    pub fn best(&self, a: i32, b: i32) -> i32 {
        if self.is_better(a, b) { a } else { b }
    }

    #[inline]
    pub fn worst(&self, a: i32, b: i32) -> i32 {
        if self.is_better(a, b) { b } else { a }
    }

    /// Worse than any reachable time
    pub fn unreached_time(&self) -> i32 {
        if self.is_forward() { i32::MAX } else { i32::MIN }
    }

    pub fn exceeds_time_limit(&self, time: i32) -> bool {
        self.time_limit.is_some_and(|limit| self.is_better(limit, time))
    }

    /// Time the search "boards" a trip: the departure (forward) or arrival (reverse) at `stop_pos`
    #[inline]
    pub fn board_time(&self, trip: &TripSchedule, stop_pos: usize) -> i32 {
        if self.is_forward() { trip.departure(stop_pos) } else { trip.arrival(stop_pos) }
    }

    #[inline]
    pub fn alight_time(&self, trip: &TripSchedule, stop_pos: usize) -> i32 {
        if self.is_forward() { trip.arrival(stop_pos) } else { trip.departure(stop_pos) }
    }

    /// Positions of a pattern in the order they are visited by the search
    pub fn stop_positions(&self, number_of_stops: usize) -> impl Iterator<Item = usize> {
        if self.is_forward() {
            Either::Left(0..number_of_stops)
        } else {
            Either::Right((0..number_of_stops).rev())
        }
    }

    /// `a` is visited before `b` when scanning a pattern
    pub fn is_before(&self, a: usize, b: usize) -> bool {
        if self.is_forward() { a < b } else { a > b }
    }

    /// Trip `a` is a better choice than trip `b` of the same timetable: it departs earlier
    /// (forward) or arrives later (reverse)
    pub fn is_better_trip(&self, a: usize, b: usize) -> bool {
        if self.is_forward() { a < b } else { a > b }
    }

    pub fn trip_search<'a>(&self, timetable: &RouteTimetable<'a>) -> TripScheduleSearch<'a> {
        timetable.trip_search(self.direction)
    }

    /// Transfers leaving `stop` in search direction
    pub fn transfers<'a>(&self, data: &'a dyn TransitDataProvider, stop: StopId) -> &'a [Transfer] {
        if self.is_forward() { data.transfers_from(stop) } else { data.transfers_to(stop) }
    }

    /// Look up the constraint between the trip the search arrived with and the trip it boards.
    /// The lookup is always done in real time order.
    pub fn transfer_constraint(
        &self,
        search: &dyn ConstrainedTransferSearch,
        arrived_with: TripRef,
        arrived_pos: usize,
        boarding: TripRef,
        boarding_pos: usize,
    ) -> Option<TransferConstraint> {
        if self.is_forward() {
            search.lookup(arrived_with, arrived_pos, boarding, boarding_pos)
        } else {
            search.lookup(boarding, boarding_pos, arrived_with, arrived_pos)
        }
    }

    pub fn has_constraints(&self, search: &dyn ConstrainedTransferSearch, route: RouteIndex, stop_pos: usize) -> bool {
        if self.is_forward() {
            search.has_constraints_to(route, stop_pos)
        } else {
            search.has_constraints_from(route, stop_pos)
        }
    }

    /// The departure (forward) or arrival (reverse) minutes of all Range Raptor iterations. The
    /// first iteration is furthest away from the search start, so later iterations are pruned by
    /// what the earlier ones found.
    pub fn range_raptor_minutes(&self, start: i32, search_window: i32, step: i32) -> Vec<i32> {
        let step = step.max(1);
        if search_window <= 0 {
            return vec![start];
        }

        let iterations = (search_window + step - 1) / step;
        (0..iterations).rev()
            .map(|i| self.plus(start, i * step))
            .collect()
    }
}
