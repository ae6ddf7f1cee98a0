use crate::errors::{InvariantError, RaptorResult};
use crate::raptor::arrivals::{ArrivalArena, ArrivalId, ArrivalKind, StopArrival};
use crate::raptor::best_times::DestinationTracker;
use crate::raptor::calculator::TransitCalculator;
use crate::raptor::context::SearchContext;
use crate::raptor::debug::DebugAction;
use crate::raptor::pareto::{ParetoComparator, ParetoSet};
use crate::raptor::path::{build_journey, DestinationArrivals, JourneyComparator};
use crate::raptor::stop_arrivals::StopArrivals;
use crate::raptor::strategy::boarding::{find_boarding, BoardFrom, PreviousTransit};
use crate::raptor::strategy::{RoutingStrategy, WorkerResult};
use crate::transit::constrained::TransferConstraint;
use crate::transit::cost::RaptorCost;
use crate::transit::RouteTimetable;
use common::types::StopId;
use itertools::Itertools;

/// The criteria of one arrival in a stop's Pareto set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct McArrival {
    id: ArrivalId,
    time: i32,
    round: usize,
    cost: RaptorCost,
    on_board: bool,
    /// Via locations visited so far
    via: usize,
}

#[derive(Debug, Clone, Copy)]
struct StopArrivalComparator {
    calc: TransitCalculator,
}

impl ParetoComparator<McArrival> for StopArrivalComparator {
    fn dominates(&self, a: &McArrival, b: &McArrival) -> bool {
        // arriving on board is better: it may continue walking or leave through egress
        self.calc.is_better_or_equal(a.time, b.time)
            && a.round <= b.round
            && a.cost <= b.cost
            && (a.on_board || !b.on_board)
            && a.via >= b.via
            && (self.calc.is_better(a.time, b.time)
                || a.round < b.round
                || a.cost < b.cost
                || (a.on_board && !b.on_board)
                || a.via > b.via)
    }

    fn equal_criteria(&self, a: &McArrival, b: &McArrival) -> bool {
        a.time == b.time && a.round == b.round && a.cost == b.cost && a.on_board == b.on_board && a.via == b.via
    }
}

#[derive(Debug, Clone, Copy)]
struct McRide {
    trip: usize,
    board_pos: usize,
    board_time: i32,
    previous: ArrivalId,
    constraint: Option<TransferConstraint>,
    /// Cost when boarding
    cost: RaptorCost,
    /// Cost of staying on board up to the stop currently scanned
    cost_at_pos: RaptorCost,
    via: usize,
}

#[derive(Debug, Clone, Copy)]
struct RideComparator {
    calc: TransitCalculator,
}

impl ParetoComparator<McRide> for RideComparator {
    fn dominates(&self, a: &McRide, b: &McRide) -> bool {
        let trip_at_least_as_good = a.trip == b.trip || self.calc.is_better_trip(a.trip, b.trip);
        trip_at_least_as_good
            && a.cost_at_pos <= b.cost_at_pos
            && a.via >= b.via
            && (self.calc.is_better_trip(a.trip, b.trip) || a.cost_at_pos < b.cost_at_pos || a.via > b.via)
    }

    fn equal_criteria(&self, a: &McRide, b: &McRide) -> bool {
        a.trip == b.trip && a.cost_at_pos == b.cost_at_pos && a.via == b.via
    }
}

/// Multi-criteria Range Raptor (McRaptor): every stop keeps the Pareto set of its arrivals over
/// time, number of transfers, generalized cost and whether it was reached on board.
/// With via locations, arrivals also count the locations visited so far. More is better, and only
/// arrivals that visited all of them may leave through egress.
pub(crate) struct McRoutingStrategy {
    calc: TransitCalculator,
    arena: ArrivalArena,
    stops: Vec<ParetoSet<McArrival, StopArrivalComparator>>,
    touched_current: Vec<bool>,
    touched_current_stops: Vec<StopId>,
    touched_last_stops: Vec<StopId>,
    touched_last: Vec<bool>,
    transit_current_stops: Vec<StopId>,
    journeys: DestinationArrivals,
    destination: DestinationTracker,
    round: usize,
    iteration_departure: i32,
}

impl McRoutingStrategy {
    pub fn new(ctx: &SearchContext) -> Self {
        let n = ctx.number_of_stops();
        let comparator = StopArrivalComparator { calc: ctx.calc };
        Self {
            calc: ctx.calc,
            arena: ArrivalArena::default(),
            stops: (0..n).map(|_| ParetoSet::new(comparator)).collect(),
            touched_current: vec![false; n],
            touched_current_stops: Vec::new(),
            touched_last_stops: Vec::new(),
            touched_last: vec![false; n],
            transit_current_stops: Vec::new(),
            journeys: DestinationArrivals::new(JourneyComparator::new(true)),
            destination: DestinationTracker::new(ctx.calc),
            round: 0,
            iteration_departure: 0,
        }
    }

    /// Adds the arrival to the stop's set. Returns its id if it was accepted.
    fn add_arrival(&mut self, ctx: &SearchContext, arrival: StopArrival, on_board: bool, via: usize) -> Option<ArrivalId> {
        let stop = arrival.stop;
        let mut candidate = McArrival {
            id: ArrivalId::default(),
            time: arrival.time,
            round: arrival.round,
            cost: arrival.cost,
            on_board,
            via,
        };
        if self.stops[stop.idx()].rejects(&candidate) {
            ctx.debug.stop_arrival(DebugAction::Reject, stop, arrival.round, arrival.time, self.iteration_departure);
            return None;
        }

        candidate.id = self.arena.push(arrival);
        self.stops[stop.idx()].add(candidate);
        if !self.touched_current[stop.idx()] {
            self.touched_current[stop.idx()] = true;
            self.touched_current_stops.push(stop);
        }
        ctx.debug.stop_arrival(DebugAction::Accept, stop, arrival.round, arrival.time, self.iteration_departure);
        Some(candidate.id)
    }

    /// Arrivals of this iteration found in the given round
    fn arrivals_of_round(&self, stop: StopId, round: usize) -> Vec<McArrival> {
        self.stops[stop.idx()].iter()
            .filter(|a| a.round == round && self.arena.get(a.id).iteration_departure == self.iteration_departure)
            .copied()
            .collect()
    }

    fn transit_to_stop(
        &mut self,
        ctx: &SearchContext,
        timetable: &RouteTimetable,
        ride: &McRide,
        stop: StopId,
        alight_pos: usize,
    ) -> RaptorResult<()> {
        let calc = self.calc;
        let alight_time = calc.alight_time(timetable.trip_schedule(ride.trip), alight_pos);
        if calc.exceeds_time_limit(alight_time) {
            return Ok(());
        }
        let cost = ride.cost
            + ctx.cost().transit_time_cost(timetable.pattern, calc.duration(ride.board_time, alight_time));

        let arrival = StopArrival {
            stop,
            round: self.round,
            time: alight_time,
            cost,
            iteration_departure: self.iteration_departure,
            kind: ArrivalKind::Transit {
                previous: ride.previous,
                trip: timetable.trip_ref(ride.trip),
                board_pos: ride.board_pos,
                alight_pos,
                board_time: ride.board_time,
                constraint: ride.constraint,
            },
        };
        let via = ctx.via.visit(ride.via, stop);
        let Some(id) = self.add_arrival(ctx, arrival, true, via) else {
            return Ok(());
        };
        self.transit_current_stops.push(stop);
        if !ctx.via.is_complete(via) {
            return Ok(());
        }

        for egress in ctx.egress.at(stop) {
            let Some(time) = calc.walk(egress, alight_time).filter(|&t| !calc.exceeds_time_limit(t)) else {
                continue;
            };
            self.destination.arrived(self.iteration_departure, time, self.round as u32 - 1);

            let total_cost = cost + egress.generalized_cost(ctx.cost());
            let journey = build_journey(ctx.data, &calc, &self.arena, id, egress, Some(total_cost))?;
            let action = if self.journeys.rejects(&journey) { DebugAction::Reject } else { DebugAction::Accept };
            ctx.debug.journey(action, &journey);
            self.journeys.add(journey);
        }
        Ok(())
    }
}

impl RoutingStrategy for McRoutingStrategy {
    fn setup_iteration(&mut self, _ctx: &SearchContext, departure: i32) {
        self.iteration_departure = departure;
        self.round = 0;
        for stop in self.touched_current_stops.drain(..) {
            self.touched_current[stop.idx()] = false;
        }
        for stop in self.touched_last_stops.drain(..) {
            self.touched_last[stop.idx()] = false;
        }
        self.transit_current_stops.clear();
        self.destination.prepare_for_next_round();
    }

    fn set_access(&mut self, ctx: &SearchContext) {
        for path in ctx.access.iter() {
            let Some(time) = self.calc.walk(path, self.iteration_departure).filter(|&t| !self.calc.exceeds_time_limit(t)) else {
                continue;
            };
            let arrival = StopArrival {
                stop: path.stop,
                round: 0,
                time,
                cost: path.generalized_cost(ctx.cost()),
                iteration_departure: self.iteration_departure,
                kind: ArrivalKind::Access { path: *path },
            };
            self.add_arrival(ctx, arrival, false, ctx.via.visit(0, path.stop));
        }
    }

    fn prepare_for_next_round(&mut self, round: usize) {
        self.round = round;
        for stop in self.touched_last_stops.drain(..) {
            self.touched_last[stop.idx()] = false;
        }
        std::mem::swap(&mut self.touched_last_stops, &mut self.touched_current_stops);
        self.touched_last_stops.sort_unstable();
        for &stop in &self.touched_last_stops {
            self.touched_current[stop.idx()] = false;
            self.touched_last[stop.idx()] = true;
        }
        self.transit_current_stops.clear();
        self.destination.prepare_for_next_round();
    }

    fn stops_touched_previous_round(&self) -> &[StopId] {
        &self.touched_last_stops
    }

    fn route(&mut self, ctx: &SearchContext, timetable: &RouteTimetable) -> RaptorResult<()> {
        let calc = self.calc;
        let search = calc.trip_search(timetable);
        let pattern = timetable.pattern;
        let mut rides = ParetoSet::new(RideComparator { calc });

        for stop_pos in calc.stop_positions(pattern.number_of_stops()) {
            let stop = pattern.stops[stop_pos];

            for ride in rides.iter().copied().collect_vec() {
                self.transit_to_stop(ctx, timetable, &ride, stop, stop_pos)?;
            }

            if !self.touched_last[stop.idx()] {
                continue;
            }

            rides.update_all(|ride: &mut McRide| {
                let board_time = calc.board_time(timetable.trip_schedule(ride.trip), stop_pos);
                ride.cost_at_pos = ride.cost
                    + ctx.cost().transit_time_cost(pattern, calc.duration(ride.board_time, board_time));
            });

            for previous in self.arrivals_of_round(stop, self.round - 1) {
                let from = BoardFrom {
                    time: previous.time,
                    by_transit: previous.on_board,
                    previous_transit: PreviousTransit::of(&self.arena, previous.id),
                };
                let Some(boarding) = find_boarding(ctx, timetable, &search, stop_pos, &from, None) else {
                    continue;
                };

                let mut cost = previous.cost + ctx.cost().board_cost(pattern);
                // waiting before the first boarding is not penalized
                if previous.round > 0 {
                    cost += ctx.cost().wait_cost(calc.duration(previous.time, boarding.board_time))
                        + ctx.cost().transfer_cost(1);
                }
                rides.add(McRide {
                    trip: boarding.trip,
                    board_pos: stop_pos,
                    board_time: boarding.board_time,
                    previous: previous.id,
                    constraint: boarding.constraint,
                    cost,
                    cost_at_pos: cost,
                    via: previous.via,
                });
            }
        }
        Ok(())
    }

    fn transfers(&mut self, ctx: &SearchContext) -> RaptorResult<()> {
        let calc = self.calc;
        let mut from_stops = std::mem::take(&mut self.transit_current_stops);
        from_stops.sort_unstable();
        from_stops.dedup();

        for from in from_stops {
            let arrivals = self.arrivals_of_round(from, self.round).into_iter().filter(|a| a.on_board).collect_vec();

            for transfer in calc.transfers(ctx.data, from) {
                if transfer.duration < 0 {
                    return Err(InvariantError::NegativeTransferDuration {
                        from,
                        to: transfer.stop,
                        duration: transfer.duration,
                    }.into());
                }

                for previous in &arrivals {
                    let time = calc.plus(previous.time, transfer.duration);
                    if calc.exceeds_time_limit(time) {
                        continue;
                    }
                    let arrival = StopArrival {
                        stop: transfer.stop,
                        round: self.round,
                        time,
                        cost: previous.cost + ctx.cost().walk_cost(transfer.duration),
                        iteration_departure: self.iteration_departure,
                        kind: ArrivalKind::Transfer { previous: previous.id, from, duration: transfer.duration },
                    };
                    self.add_arrival(ctx, arrival, false, ctx.via.visit(previous.via, transfer.stop));
                }
            }
        }
        Ok(())
    }

    fn is_new_round_available(&self) -> bool {
        !self.touched_current_stops.is_empty()
    }

    fn is_destination_reached_in_current_round(&self) -> bool {
        self.destination.is_reached_current_round()
    }

    fn stop_arrivals(&self) -> StopArrivals {
        let calc = self.calc;
        let best = |on_board_only: bool| -> Vec<Option<i32>> {
            self.stops.iter()
                .map(|set| {
                    set.iter()
                        .filter(|a| a.on_board || !on_board_only)
                        .map(|a| a.time)
                        .reduce(|a, b| calc.best(a, b))
                })
                .collect()
        };
        StopArrivals::from_parts(calc.direction(), best(false), best(true), self.destination.best())
    }

    fn into_result(self) -> WorkerResult {
        let stop_arrivals = self.stop_arrivals();
        WorkerResult { journeys: self.journeys.into_vec(), stop_arrivals }
    }
}
