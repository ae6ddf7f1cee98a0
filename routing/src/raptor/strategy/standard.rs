use crate::errors::{InvariantError, RaptorResult};
use crate::journey::Journey;
use crate::raptor::arrivals::{ArrivalArena, ArrivalId, ArrivalKind, ArrivalTable, Slot, StopArrival};
use crate::raptor::best_times::{BestTimes, DestinationTracker};
use crate::raptor::context::SearchContext;
use crate::raptor::debug::DebugAction;
use crate::raptor::path::{build_journey, DestinationArrivals, JourneyComparator};
use crate::raptor::stop_arrivals::StopArrivals;
use crate::raptor::strategy::boarding::{find_boarding, BoardFrom, PreviousTransit};
use crate::raptor::strategy::{RoutingStrategy, WorkerResult};
use crate::request::access_egress::AccessEgress;
use crate::transit::constrained::TransferConstraint;
use crate::transit::{RouteTimetable, TripRef};
use common::types::StopId;

/// The trip the search is currently on while scanning a route
#[derive(Debug, Clone, Copy)]
pub(crate) struct Ride {
    trip: usize,
    board_pos: usize,
    board_time: i32,
    previous: Option<ArrivalId>,
    constraint: Option<TransferConstraint>,
}

/// Where the standard strategy keeps what it needs besides the best times
pub(crate) trait StdArrivals {
    fn access(&mut self, stop: StopId, time: i32, path: &AccessEgress, iteration_departure: i32);

    #[allow(clippy::too_many_arguments)]
    fn transit(
        &mut self,
        round: usize,
        stop: StopId,
        time: i32,
        trip: TripRef,
        ride: &Ride,
        alight_pos: usize,
        new_best: bool,
        iteration_departure: i32,
    ) -> RaptorResult<Option<ArrivalId>>;

    fn transfer(&mut self, round: usize, from: StopId, to: StopId, time: i32, duration: i32, iteration_departure: i32);

    /// The arrival a trip boarded at `stop` continues from, and the transit leg that arrival used
    fn boarding_context(&self, round: usize, stop: StopId) -> (Option<ArrivalId>, Option<PreviousTransit>);

    fn destination(&mut self, ctx: &SearchContext, arrival: Option<ArrivalId>, egress: &AccessEgress) -> RaptorResult<()>;

    fn into_journeys(self) -> Vec<Journey>;
}

/// Keeps every accepted arrival, so the earliest-arrival journeys can be reconstructed
pub(crate) struct PathArrivals {
    arena: ArrivalArena,
    table: ArrivalTable,
    journeys: DestinationArrivals,
}

impl PathArrivals {
    pub fn new(ctx: &SearchContext) -> Self {
        Self {
            arena: ArrivalArena::default(),
            table: ArrivalTable::new(ctx.number_of_rounds, ctx.number_of_stops()),
            journeys: DestinationArrivals::new(JourneyComparator::new(false)),
        }
    }
}

impl StdArrivals for PathArrivals {
    fn access(&mut self, stop: StopId, time: i32, path: &AccessEgress, iteration_departure: i32) {
        let id = self.arena.push(StopArrival {
            stop,
            round: 0,
            time,
            cost: 0,
            iteration_departure,
            kind: ArrivalKind::Access { path: *path },
        });
        self.table.set(0, stop, Slot::Best, id);
    }

    fn transit(
        &mut self,
        round: usize,
        stop: StopId,
        time: i32,
        trip: TripRef,
        ride: &Ride,
        alight_pos: usize,
        new_best: bool,
        iteration_departure: i32,
    ) -> RaptorResult<Option<ArrivalId>> {
        let previous = ride.previous.ok_or(InvariantError::BrokenArrivalChain(stop))?;
        let id = self.arena.push(StopArrival {
            stop,
            round,
            time,
            cost: 0,
            iteration_departure,
            kind: ArrivalKind::Transit {
                previous,
                trip,
                board_pos: ride.board_pos,
                alight_pos,
                board_time: ride.board_time,
                constraint: ride.constraint,
            },
        });
        self.table.set(round, stop, Slot::Transit, id);
        if new_best {
            self.table.set(round, stop, Slot::Best, id);
        }
        Ok(Some(id))
    }

    fn transfer(&mut self, round: usize, from: StopId, to: StopId, time: i32, duration: i32, iteration_departure: i32) {
        // transfers only start at stops reached by transit in the same round
        let Some(previous) = self.table.get(round, from, Slot::Transit) else {
            return;
        };
        let id = self.arena.push(StopArrival {
            stop: to,
            round,
            time,
            cost: 0,
            iteration_departure,
            kind: ArrivalKind::Transfer { previous, from, duration },
        });
        self.table.set(round, to, Slot::Best, id);
    }

    fn boarding_context(&self, round: usize, stop: StopId) -> (Option<ArrivalId>, Option<PreviousTransit>) {
        let previous = self.table.get(round, stop, Slot::Best);
        (previous, previous.and_then(|id| PreviousTransit::of(&self.arena, id)))
    }

    fn destination(&mut self, ctx: &SearchContext, arrival: Option<ArrivalId>, egress: &AccessEgress) -> RaptorResult<()> {
        let Some(arrival) = arrival else {
            return Ok(());
        };
        let journey = build_journey(ctx.data, &ctx.calc, &self.arena, arrival, egress, None)?;
        let action = if self.journeys.rejects(&journey) { DebugAction::Reject } else { DebugAction::Accept };
        ctx.debug.journey(action, &journey);
        self.journeys.add(journey);
        Ok(())
    }

    fn into_journeys(self) -> Vec<Journey> {
        self.journeys.into_vec()
    }
}

/// Keeps nothing. Used when only the best times are of interest.
#[derive(Debug, Default)]
pub(crate) struct BestTimeArrivals;

impl StdArrivals for BestTimeArrivals {
    fn access(&mut self, _stop: StopId, _time: i32, _path: &AccessEgress, _iteration_departure: i32) {}

    fn transit(
        &mut self,
        _round: usize,
        _stop: StopId,
        _time: i32,
        _trip: TripRef,
        _ride: &Ride,
        _alight_pos: usize,
        _new_best: bool,
        _iteration_departure: i32,
    ) -> RaptorResult<Option<ArrivalId>> {
        Ok(None)
    }

    fn transfer(&mut self, _round: usize, _from: StopId, _to: StopId, _time: i32, _duration: i32, _iteration_departure: i32) {}

    fn boarding_context(&self, _round: usize, _stop: StopId) -> (Option<ArrivalId>, Option<PreviousTransit>) {
        (None, None)
    }

    fn destination(&mut self, _ctx: &SearchContext, _arrival: Option<ArrivalId>, _egress: &AccessEgress) -> RaptorResult<()> {
        Ok(())
    }

    fn into_journeys(self) -> Vec<Journey> {
        Vec::new()
    }
}

/// Single criterion Range Raptor: one best time per stop, improved strictly
pub(crate) struct StdRoutingStrategy<A> {
    best_times: BestTimes,
    destination: DestinationTracker,
    arrivals: A,
    round: usize,
    iteration_departure: i32,
}

pub(crate) type StandardStrategy = StdRoutingStrategy<PathArrivals>;
pub(crate) type BestTimeStrategy = StdRoutingStrategy<BestTimeArrivals>;

impl<A: StdArrivals> StdRoutingStrategy<A> {
    pub fn new(ctx: &SearchContext, arrivals: A) -> Self {
        Self {
            best_times: BestTimes::new(ctx.calc, ctx.number_of_stops()),
            destination: DestinationTracker::new(ctx.calc),
            arrivals,
            round: 0,
            iteration_departure: 0,
        }
    }

    fn transit_to_stop(
        &mut self,
        ctx: &SearchContext,
        timetable: &RouteTimetable,
        ride: &Ride,
        stop: StopId,
        alight_pos: usize,
        alight_time: i32,
    ) -> RaptorResult<()> {
        let calc = &ctx.calc;
        if calc.exceeds_time_limit(alight_time) || !self.best_times.is_new_best_transit(stop, alight_time) {
            ctx.debug.stop_arrival(DebugAction::Reject, stop, self.round, alight_time, self.iteration_departure);
            return Ok(());
        }

        let new_best = self.best_times.is_new_best(stop, alight_time);
        self.best_times.update_best_transit(stop, alight_time);
        if new_best {
            self.best_times.update_best(stop, alight_time, true);
        }
        let id = self.arrivals.transit(
            self.round,
            stop,
            alight_time,
            timetable.trip_ref(ride.trip),
            ride,
            alight_pos,
            new_best,
            self.iteration_departure,
        )?;
        ctx.debug.stop_arrival(DebugAction::Accept, stop, self.round, alight_time, self.iteration_departure);

        for egress in ctx.egress.at(stop) {
            let Some(time) = calc.walk(egress, alight_time).filter(|&t| !calc.exceeds_time_limit(t)) else {
                continue;
            };
            self.destination.arrived(self.iteration_departure, time, self.round as u32 - 1);
            self.arrivals.destination(ctx, id, egress)?;
        }
        Ok(())
    }
}

impl<A: StdArrivals> RoutingStrategy for StdRoutingStrategy<A> {
    fn setup_iteration(&mut self, _ctx: &SearchContext, departure: i32) {
        self.iteration_departure = departure;
        self.round = 0;
        self.best_times.setup_iteration();
        self.destination.prepare_for_next_round();
    }

    fn set_access(&mut self, ctx: &SearchContext) {
        for path in ctx.access.iter() {
            let Some(time) = ctx.calc.walk(path, self.iteration_departure) else {
                continue;
            };
            if ctx.calc.exceeds_time_limit(time) || !self.best_times.is_new_best(path.stop, time) {
                ctx.debug.stop_arrival(DebugAction::Reject, path.stop, 0, time, self.iteration_departure);
                continue;
            }
            self.best_times.update_best(path.stop, time, false);
            self.arrivals.access(path.stop, time, path, self.iteration_departure);
            ctx.debug.stop_arrival(DebugAction::Accept, path.stop, 0, time, self.iteration_departure);
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
        let mut ride: Option<Ride> = None;

        for stop_pos in calc.stop_positions(timetable.pattern.number_of_stops()) {
            let stop = timetable.pattern.stops[stop_pos];

            if let Some(on_board) = ride {
                let alight_time = calc.alight_time(timetable.trip_schedule(on_board.trip), stop_pos);
                self.transit_to_stop(ctx, timetable, &on_board, stop, stop_pos, alight_time)?;
            }

            if !self.best_times.is_reached_last_round(stop) {
                continue;
            }
            let (time, by_transit) = self.best_times.last_round_arrival(stop);
            let (previous, previous_transit) = self.arrivals.boarding_context(self.round - 1, stop);
            let from = BoardFrom { time, by_transit, previous_transit };

            if let Some(boarding) = find_boarding(ctx, timetable, &search, stop_pos, &from, ride.map(|r| r.trip)) {
                ride = Some(Ride {
                    trip: boarding.trip,
                    board_pos: stop_pos,
                    board_time: boarding.board_time,
                    previous,
                    constraint: boarding.constraint,
                });
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
                if calc.exceeds_time_limit(time) || !self.best_times.is_new_best(transfer.stop, time) {
                    ctx.debug.stop_arrival(DebugAction::Reject, transfer.stop, self.round, time, self.iteration_departure);
                    continue;
                }
                self.best_times.update_best(transfer.stop, time, false);
                self.arrivals.transfer(self.round, from, transfer.stop, time, transfer.duration, self.iteration_departure);
                ctx.debug.stop_arrival(DebugAction::Accept, transfer.stop, self.round, time, self.iteration_departure);
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
        WorkerResult {
            stop_arrivals: self.stop_arrivals(),
            journeys: self.arrivals.into_journeys(),
        }
    }
}
