use crate::raptor::arrivals::{ArrivalArena, ArrivalId, ArrivalKind};
use crate::raptor::context::SearchContext;
use crate::transit::constrained::{ConstrainedTransferSearch, TransferConstraint};
use crate::transit::trip_search::TripScheduleSearch;
use crate::transit::{RouteTimetable, TripRef};

/// The transit leg the search last alighted from, needed to look up constrained transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PreviousTransit {
    pub trip: TripRef,
    pub stop_pos: usize,
    /// Time of alighting (in search direction)
    pub time: i32,
}

impl PreviousTransit {
    /// Follows a transfer back to the transit arrival it started from
    pub fn of(arena: &ArrivalArena, id: ArrivalId) -> Option<Self> {
        let arrival = arena.get(id);
        match arrival.kind {
            ArrivalKind::Transit { trip, alight_pos, .. } => {
                Some(PreviousTransit { trip, stop_pos: alight_pos, time: arrival.time })
            }
            ArrivalKind::Transfer { previous, .. } => match arena.get(previous).kind {
                ArrivalKind::Transit { trip, alight_pos, .. } => {
                    Some(PreviousTransit { trip, stop_pos: alight_pos, time: arena.get(previous).time })
                }
                _ => None,
            },
            ArrivalKind::Access { .. } => None,
        }
    }
}

/// The arrival a trip is boarded from
#[derive(Debug, Clone, Copy)]
pub(crate) struct BoardFrom {
    pub time: i32,
    /// The stop's minimum transfer time only applies after alighting at the same stop
    pub by_transit: bool,
    pub previous_transit: Option<PreviousTransit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Boarding {
    pub trip: usize,
    pub board_time: i32,
    pub constraint: Option<TransferConstraint>,
}

/// Finds the best trip boardable at `stop_pos`. Only trips better than `bound` are returned.
pub(crate) fn find_boarding(
    ctx: &SearchContext,
    timetable: &RouteTimetable,
    search: &TripScheduleSearch,
    stop_pos: usize,
    from: &BoardFrom,
    bound: Option<usize>,
) -> Option<Boarding> {
    let calc = &ctx.calc;
    let slack = if from.by_transit {
        ctx.data.min_transfer_time(timetable.pattern.stops[stop_pos])
    } else {
        0
    };

    if let (Some(constraints), Some(previous)) = (ctx.constraints, from.previous_transit) {
        if calc.has_constraints(constraints, timetable.index, stop_pos) {
            return find_constrained_boarding(ctx, constraints, timetable, search, stop_pos, from, previous, slack, bound);
        }
    }

    let trip = search.search(calc.plus(from.time, slack), stop_pos, bound)?;
    Some(Boarding {
        trip,
        board_time: calc.board_time(timetable.trip_schedule(trip), stop_pos),
        constraint: None,
    })
}

// Walks the trips from the first one reachable without any slack. Each trip may have its own
// constraint, so the first trip satisfying its own rule wins.
#[allow(clippy::too_many_arguments)]
fn find_constrained_boarding(
    ctx: &SearchContext,
    constraints: &dyn ConstrainedTransferSearch,
    timetable: &RouteTimetable,
    search: &TripScheduleSearch,
    stop_pos: usize,
    from: &BoardFrom,
    previous: PreviousTransit,
    slack: i32,
    bound: Option<usize>,
) -> Option<Boarding> {
    let calc = &ctx.calc;
    let regular_earliest = calc.plus(from.time, slack);

    for trip in search.candidates(from.time, stop_pos) {
        if bound.is_some_and(|bound| !calc.is_better_trip(trip, bound)) {
            break;
        }

        let board_time = calc.board_time(timetable.trip_schedule(trip), stop_pos);
        let constraint = calc.transfer_constraint(
            constraints,
            previous.trip,
            previous.stop_pos,
            timetable.trip_ref(trip),
            stop_pos,
        );

        let earliest = match constraint {
            Some(TransferConstraint::NotAllowed) => continue,
            Some(TransferConstraint::Guaranteed) | Some(TransferConstraint::StaySeated) => from.time,
            Some(TransferConstraint::MinWaitTime { seconds }) => {
                calc.worst(from.time, calc.plus(previous.time, seconds))
            }
            None => regular_earliest,
        };

        if !calc.is_better(board_time, earliest) {
            return Some(Boarding { trip, board_time, constraint });
        }
    }
    None
}
