pub(crate) mod boarding;
pub(crate) mod min_travel_duration;
pub(crate) mod multi_criteria;
pub(crate) mod standard;

use crate::errors::RaptorResult;
use crate::journey::Journey;
use crate::raptor::context::SearchContext;
use crate::raptor::stop_arrivals::StopArrivals;
use crate::transit::RouteTimetable;
use common::types::StopId;

/// What one worker hands back: journeys (if the profile builds them) and its best times
#[derive(Debug, Clone)]
pub(crate) struct WorkerResult {
    pub journeys: Vec<Journey>,
    pub stop_arrivals: StopArrivals,
}

/// The profile specific part of a Range Raptor search. The worker drives the rounds, the strategy
/// owns the state and decides what an improvement is.
pub(crate) trait RoutingStrategy {
    /// Called before every iteration. State shared across iterations is kept.
    fn setup_iteration(&mut self, ctx: &SearchContext, departure: i32);

    /// Round 0: add the access arrivals of the current iteration
    fn set_access(&mut self, ctx: &SearchContext);

    fn prepare_for_next_round(&mut self, round: usize);

    /// Stops improved in the previous round. Only routes serving these are scanned.
    fn stops_touched_previous_round(&self) -> &[StopId];

    /// Transit relaxation of one route
    fn route(&mut self, ctx: &SearchContext, timetable: &RouteTimetable) -> RaptorResult<()>;

    /// Transfer relaxation from the stops reached by transit in the current round
    fn transfers(&mut self, ctx: &SearchContext) -> RaptorResult<()>;

    /// Any stop improved in the current round
    fn is_new_round_available(&self) -> bool;

    fn is_destination_reached_in_current_round(&self) -> bool;

    fn stop_arrivals(&self) -> StopArrivals;

    fn into_result(self) -> WorkerResult;
}
