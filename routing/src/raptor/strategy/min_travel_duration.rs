use crate::errors::{InvariantError, RaptorResult};
use crate::raptor::best_times::{BestTimes, DestinationTracker};
use crate::raptor::context::SearchContext;
use crate::raptor::debug::DebugAction;
use crate::raptor::stop_arrivals::StopArrivals;
use crate::raptor::strategy::{RoutingStrategy, WorkerResult};
use crate::transit::RouteTimetable;
use common::types::StopId;

// A trip boarded with a time-shift: the board time is moved back to the moment the stop was
// reached, so waiting never counts.
#[derive(Debug, Clone, Copy)]
struct ShiftedRide {
    trip: usize,
    shift: i32,
}

/// Finds the shortest possible travel duration to every stop, ignoring waiting time. Runs a single
/// iteration. The times it computes are not real times and are not limited by any time bound.
pub(crate) struct MinTravelDurationStrategy {
    best_times: BestTimes,
    destination: DestinationTracker,
    round: usize,
    iteration_departure: i32,
}

impl MinTravelDurationStrategy {
    pub fn new(ctx: &SearchContext) -> Self {
        Self {
            best_times: BestTimes::new(ctx.calc, ctx.number_of_stops()),
            destination: DestinationTracker::new(ctx.calc),
            round: 0,
            iteration_departure: 0,
        }
    }

    fn transit_to_stop(&mut self, ctx: &SearchContext, stop: StopId, time: i32) {
        if !self.best_times.is_new_best_transit(stop, time) {
            ctx.debug.stop_arrival(DebugAction::Reject, stop, self.round, time, self.iteration_departure);
            return;
        }
        self.best_times.update_best_transit(stop, time);
        if self.best_times.is_new_best(stop, time) {
            self.best_times.update_best(stop, time, true);
        }
        ctx.debug.stop_arrival(DebugAction::Accept, stop, self.round, time, self.iteration_departure);

        for egress in ctx.egress.at(stop) {
            let arrival = ctx.calc.plus(time, egress.duration);
            self.destination.arrived(self.iteration_departure, arrival, self.round as u32 - 1);
        }
    }
}

impl RoutingStrategy for MinTravelDurationStrategy {
    fn setup_iteration(&mut self, _ctx: &SearchContext, departure: i32) {
        self.iteration_departure = departure;
        self.round = 0;
        self.best_times.setup_iteration();
        self.destination.prepare_for_next_round();
    }

    fn set_access(&mut self, ctx: &SearchContext) {
        for path in ctx.access.iter() {
            let time = ctx.calc.plus(self.iteration_departure, path.duration);
            if self.best_times.is_new_best(path.stop, time) {
                self.best_times.update_best(path.stop, time, false);
                ctx.debug.stop_arrival(DebugAction::Accept, path.stop, 0, time, self.iteration_departure);
            }
        }
    }

    fn prepare_for_next_round(&mut self, round: usize) {
        self.round = round;
        self.best_times.prepare_for_next_round();
        self.destination.prepare_for_next_round();
    }

    fn stops_touched_previous_round(&self) -> &[StopId] {
        self.best_times.stops_reached_last_round()
    }

    fn route(&mut self, ctx: &SearchContext, timetable: &RouteTimetable) -> RaptorResult<()> {
        let calc = ctx.calc;
        let search = calc.trip_search(timetable);
        let mut ride: Option<ShiftedRide> = None;

        for stop_pos in calc.stop_positions(timetable.pattern.number_of_stops()) {
            let stop = timetable.pattern.stops[stop_pos];

            if let Some(on_board) = ride {
                let alight_time = calc.alight_time(timetable.trip_schedule(on_board.trip), stop_pos);
                self.transit_to_stop(ctx, stop, calc.minus(alight_time, on_board.shift));
            }

            if !self.best_times.is_reached_last_round(stop) {
                continue;
            }
            let (time, by_transit) = self.best_times.last_round_arrival(stop);
            let slack = if by_transit { ctx.data.min_transfer_time(stop) } else { 0 };
            let earliest = calc.plus(time, slack);

            // switch only if getting on here is earlier than the shifted board time of the
            // current ride at this position
            let switch = ride.is_none_or(|on_board| {
                let board_time = calc.board_time(timetable.trip_schedule(on_board.trip), stop_pos);
                calc.is_better(earliest, calc.minus(board_time, on_board.shift))
            });
            if !switch {
                continue;
            }
            if let Some(trip) = search.search(earliest, stop_pos, None) {
                let board_time = calc.board_time(timetable.trip_schedule(trip), stop_pos);
                ride = Some(ShiftedRide { trip, shift: calc.duration(earliest, board_time) });
            }
        }
        Ok(())
    }

    fn transfers(&mut self, ctx: &SearchContext) -> RaptorResult<()> {
        let calc = ctx.calc;
        for from in self.best_times.stops_reached_by_transit_current_round() {
            let departure = self.best_times.transit_time(from);
            for transfer in calc.transfers(ctx.data, from) {
                if transfer.duration < 0 {
                    return Err(InvariantError::NegativeTransferDuration {
                        from,
                        to: transfer.stop,
                        duration: transfer.duration,
                    }.into());
                }
                let time = calc.plus(departure, transfer.duration);
                if self.best_times.is_new_best(transfer.stop, time) {
                    self.best_times.update_best(transfer.stop, time, false);
                    ctx.debug.stop_arrival(DebugAction::Accept, transfer.stop, self.round, time, self.iteration_departure);
                }
            }
        }
        Ok(())
    }

    fn is_new_round_available(&self) -> bool {
        self.best_times.is_current_round_updated()
    }

    fn is_destination_reached_in_current_round(&self) -> bool {
        self.destination.is_reached_current_round()
    }

    fn stop_arrivals(&self) -> StopArrivals {
        self.best_times.to_stop_arrivals(self.destination.best())
    }

    fn into_result(self) -> WorkerResult {
        WorkerResult { journeys: Vec::new(), stop_arrivals: self.stop_arrivals() }
    }
}
