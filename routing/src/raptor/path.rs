use crate::errors::InvariantError;
use crate::journey::{Journey, Leg};
use crate::raptor::arrivals::{ArrivalArena, ArrivalId, ArrivalKind, StopArrival};
use crate::raptor::calculator::TransitCalculator;
use crate::raptor::pareto::{ParetoComparator, ParetoSet};
use crate::request::access_egress::AccessEgress;
use crate::transit::constrained::TransferConstraint;
use crate::transit::TransitDataProvider;

/// Criteria of the journeys at the destination. Departure and arrival are always compared in real
/// time, regardless of the search direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct JourneyComparator {
    multi_criteria: bool,
}

impl JourneyComparator {
    pub fn new(multi_criteria: bool) -> Self {
        Self { multi_criteria }
    }
}

impl ParetoComparator<Journey> for JourneyComparator {
    fn dominates(&self, a: &Journey, b: &Journey) -> bool {
        let (a_cost, b_cost) = (a.generalized_cost().unwrap_or(0), b.generalized_cost().unwrap_or(0));

        let mut at_least_as_good = a.departure() >= b.departure() && a.arrival() <= b.arrival();
        let mut better = a.departure() > b.departure() || a.arrival() < b.arrival();
        if self.multi_criteria {
            at_least_as_good &= a.number_of_transfers() <= b.number_of_transfers() && a_cost <= b_cost;
            better |= a.number_of_transfers() < b.number_of_transfers() || a_cost < b_cost;
        }
        at_least_as_good && better
    }

    fn equal_criteria(&self, a: &Journey, b: &Journey) -> bool {
        a.departure() == b.departure()
            && a.arrival() == b.arrival()
            && (!self.multi_criteria
                || (a.number_of_transfers() == b.number_of_transfers()
                    && a.generalized_cost() == b.generalized_cost()))
    }

    // Fewest transfers, then lowest cost, then the legs decide. Keeps the merged result independent
    // of the order the iterations finished in.
    fn prefer(&self, a: &Journey, b: &Journey) -> bool {
        a < b
    }
}

pub(crate) type DestinationArrivals = ParetoSet<Journey, JourneyComparator>;

/// Turns the arrival chain ending at `last` plus the egress path taken from there into a journey
/// in real time order.
pub(crate) fn build_journey(
    data: &dyn TransitDataProvider,
    calc: &TransitCalculator,
    arena: &ArrivalArena,
    last: ArrivalId,
    egress: &AccessEgress,
    generalized_cost: Option<i32>,
) -> Result<Journey, InvariantError> {
    let chain = arena.chain(last)?;
    let legs = if calc.is_forward() {
        forward_legs(data, &chain, egress)?
    } else {
        reverse_legs(data, &chain, egress)?
    };
    Ok(Journey::new(legs, generalized_cost))
}

// The chain starts at the last arrival, so it is walked backwards
fn forward_legs(data: &dyn TransitDataProvider, chain: &[&StopArrival], egress: &AccessEgress) -> Result<Vec<Leg>, InvariantError> {
    let last = chain[0];
    let mut legs = Vec::with_capacity(chain.len() + 1);
    let mut access = None;

    for arrival in chain.iter().rev() {
        match arrival.kind {
            ArrivalKind::Access { path } => access = Some(path),
            ArrivalKind::Transit { trip, board_pos, alight_pos, board_time, constraint, .. } => {
                // the access leg is shifted to end when the first trip departs
                if let Some(path) = access.take() {
                    legs.push(access_leg(&path, board_time)?);
                }
                let timetable = data.route_timetable(trip.route);
                legs.push(Leg::Transit {
                    route: timetable.pattern.route,
                    trip: timetable.trip_schedule(trip.trip).trip,
                    from: timetable.pattern.stops[board_pos],
                    to: arrival.stop,
                    board_pos,
                    alight_pos,
                    departure: board_time,
                    arrival: arrival.time,
                    constraint,
                });
            }
            ArrivalKind::Transfer { from, duration, .. } => legs.push(Leg::Transfer {
                from,
                to: arrival.stop,
                departure: arrival.time - duration,
                arrival: arrival.time,
            }),
        }
    }

    if access.is_some() || !last.is_transit() {
        return Err(InvariantError::BrokenArrivalChain(last.stop));
    }
    legs.push(egress_leg(egress, last.time)?);
    Ok(legs)
}

// A reverse search starts at the destination, so its chain is already in real time order. The
// reverse search's egress is the real access and its access arrival the real egress.
fn reverse_legs(data: &dyn TransitDataProvider, chain: &[&StopArrival], access: &AccessEgress) -> Result<Vec<Leg>, InvariantError> {
    let first = chain[0];
    if !first.is_transit() {
        return Err(InvariantError::BrokenArrivalChain(first.stop));
    }

    let mut legs = Vec::with_capacity(chain.len() + 1);
    legs.push(access_leg(access, first.time)?);

    // A constraint is found when boarding the trip that comes first in real time, but belongs to
    // the transfer onto the next one.
    let mut pending_constraint: Option<TransferConstraint> = None;

    for arrival in chain {
        match arrival.kind {
            ArrivalKind::Transit { trip, board_pos, alight_pos, board_time, constraint, .. } => {
                let timetable = data.route_timetable(trip.route);
                legs.push(Leg::Transit {
                    route: timetable.pattern.route,
                    trip: timetable.trip_schedule(trip.trip).trip,
                    from: arrival.stop,
                    to: timetable.pattern.stops[board_pos],
                    board_pos: alight_pos,
                    alight_pos: board_pos,
                    departure: arrival.time,
                    arrival: board_time,
                    constraint: pending_constraint.take(),
                });
                pending_constraint = constraint;
            }
            ArrivalKind::Transfer { from, duration, .. } => legs.push(Leg::Transfer {
                from: arrival.stop,
                to: from,
                departure: arrival.time,
                arrival: arrival.time + duration,
            }),
            ArrivalKind::Access { path } => {
                let alighted = legs.last().map_or(arrival.time, Leg::arrival);
                legs.push(egress_leg(&path, alighted)?);
            }
        }
    }
    Ok(legs)
}

// Starts as late as the opening hours allow and still makes the first boarding
fn access_leg(path: &AccessEgress, board_time: i32) -> Result<Leg, InvariantError> {
    let departure = path.latest_start(board_time - path.duration)
        .ok_or(InvariantError::ClosedAccessEgress(path.stop))?;
    Ok(Leg::Access { stop: path.stop, departure, arrival: departure + path.duration })
}

// Starts at the last alighting, or when the path opens
fn egress_leg(path: &AccessEgress, alight_time: i32) -> Result<Leg, InvariantError> {
    let departure = path.earliest_start(alight_time)
        .ok_or(InvariantError::ClosedAccessEgress(path.stop))?;
    Ok(Leg::Egress { stop: path.stop, departure, arrival: departure + path.duration })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{hm, TimetableBuilder};
    use crate::transit::TripRef;
    use common::types::{RouteId, StopId, TripId};

    fn journey(departure: i32, arrival: i32, transits: usize, cost: Option<i32>) -> Journey {
        let mut legs = vec![Leg::Access { stop: StopId(0), departure, arrival: departure }];
        let mut time = departure;
        for i in 0..transits {
            let next = if i + 1 == transits { arrival } else { time + 1 };
            legs.push(Leg::Transit {
                route: RouteId(0),
                trip: TripId(i as u32),
                from: StopId(i as u32),
                to: StopId(i as u32 + 1),
                board_pos: 0,
                alight_pos: 1,
                departure: time,
                arrival: next,
                constraint: None,
            });
            time = next;
        }
        legs.push(Leg::Egress { stop: StopId(transits as u32), departure: arrival, arrival });
        Journey::new(legs, cost)
    }

    #[test]
    fn test_standard_criteria_ignore_transfers() {
        let comparator = JourneyComparator::new(false);
        let direct = journey(hm(8, 0), hm(8, 30), 1, None);
        let changing = journey(hm(8, 0), hm(8, 30), 2, None);
        let later = journey(hm(8, 5), hm(8, 30), 2, None);

        assert!(comparator.equal_criteria(&direct, &changing));
        assert!(comparator.prefer(&direct, &changing));
        assert!(comparator.dominates(&later, &direct));
    }

    #[test]
    fn test_multi_criteria_keeps_fewer_transfers() {
        let mut set = DestinationArrivals::new(JourneyComparator::new(true));
        assert!(set.add(journey(hm(8, 0), hm(8, 30), 2, Some(100))));
        assert!(set.add(journey(hm(8, 0), hm(8, 32), 1, Some(100))));
        assert!(!set.add(journey(hm(8, 0), hm(8, 35), 2, Some(100))));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_forward_path() {
        let data = TimetableBuilder::new(3)
            .route(&[0, 1], &[&[hm(8, 0), hm(8, 10)]])
            .transfer(1, 2, 120)
            .build();
        let calc = TransitCalculator::forward(None);

        let mut arena = ArrivalArena::default();
        let access = arena.push(StopArrival {
            stop: StopId(0),
            round: 0,
            time: hm(7, 55),
            cost: 0,
            iteration_departure: hm(7, 50),
            kind: ArrivalKind::Access { path: AccessEgress::new(StopId(0), 300) },
        });
        let ride = arena.push(StopArrival {
            stop: StopId(1),
            round: 1,
            time: hm(8, 10),
            cost: 0,
            iteration_departure: hm(7, 50),
            kind: ArrivalKind::Transit {
                previous: access,
                trip: TripRef { route: 0, trip: 0 },
                board_pos: 0,
                alight_pos: 1,
                board_time: hm(8, 0),
                constraint: None,
            },
        });

        let journey = build_journey(&data, &calc, &arena, ride, &AccessEgress::new(StopId(1), 60), None).unwrap();
        let legs = journey.legs().cloned().collect::<Vec<_>>();

        assert_eq!(legs.len(), 3);
        assert_eq!(legs[0], Leg::Access { stop: StopId(0), departure: hm(7, 55), arrival: hm(8, 0) });
        assert_eq!(journey.departure(), hm(7, 55));
        assert_eq!(journey.arrival(), hm(8, 11));
        assert_eq!(journey.number_of_transfers(), 0);
    }

    #[test]
    fn test_reverse_path_is_in_real_order() {
        let data = TimetableBuilder::new(2).route(&[0, 1], &[&[hm(8, 0), hm(8, 10)]]).build();
        let calc = TransitCalculator::reverse(None);

        // a reverse search starts at the destination stop 1
        let mut arena = ArrivalArena::default();
        let access = arena.push(StopArrival {
            stop: StopId(1),
            round: 0,
            time: hm(8, 12),
            cost: 0,
            iteration_departure: hm(8, 15),
            kind: ArrivalKind::Access { path: AccessEgress::new(StopId(1), 180) },
        });
        let ride = arena.push(StopArrival {
            stop: StopId(0),
            round: 1,
            time: hm(8, 0),
            cost: 0,
            iteration_departure: hm(8, 15),
            kind: ArrivalKind::Transit {
                previous: access,
                trip: TripRef { route: 0, trip: 0 },
                board_pos: 1,
                alight_pos: 0,
                board_time: hm(8, 10),
                constraint: None,
            },
        });

        let journey = build_journey(&data, &calc, &arena, ride, &AccessEgress::new(StopId(0), 300), None).unwrap();
        let stops = journey.stops().collect::<Vec<_>>();

        assert_eq!(stops, vec![StopId(0), StopId(1)]);
        assert_eq!(journey.departure(), hm(7, 55));
        // the egress starts when the trip arrives, not at the shifted iteration time
        assert_eq!(journey.arrival(), hm(8, 13));
    }

    #[test]
    fn test_chain_without_transit_is_broken() {
        let data = TimetableBuilder::new(1).build();
        let mut arena = ArrivalArena::default();
        let access = arena.push(StopArrival {
            stop: StopId(0),
            round: 0,
            time: 60,
            cost: 0,
            iteration_departure: 0,
            kind: ArrivalKind::Access { path: AccessEgress::new(StopId(0), 60) },
        });

        let result = build_journey(&data, &TransitCalculator::forward(None), &arena, access, &AccessEgress::new(StopId(0), 0), None);
        assert_eq!(result, Err(InvariantError::BrokenArrivalChain(StopId(0))));
    }
}
