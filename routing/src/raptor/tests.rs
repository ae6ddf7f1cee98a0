use crate::errors::{ConfigError, RaptorError};
use crate::journey::{Journey, Leg};
use crate::raptor::debug::tests::RecordingListener;
use crate::raptor::debug::{DebugAction, DebugEvent};
use crate::raptor::pareto::ParetoComparator;
use crate::raptor::path::JourneyComparator;
use crate::raptor::strategy::WorkerResult;
use crate::raptor::{merge_results, RaptorResponse, RaptorService, StopArrivals};
use crate::request::access_egress::AccessEgress;
use crate::request::via::ViaLocation;
use crate::request::{Profile, RaptorRequest, RaptorRequestBuilder, SearchDirection};
use crate::tests::{
    case_1, case_2, case_2_network, case_2_with, case_3, case_3_network, case_4, case_5, case_5_network, hm, TimetableBuilder,
};
use crate::transit::constrained::TransferConstraint;
use crate::transit::timetable::{Timetable, TimetableTransitData};
use crate::transit::TransitDataProvider;
use chrono::TimeDelta;
use common::types::config::RaptorConfig;
use common::types::{RouteId, StopId, TripId};
use hashbrown::HashMap;
use itertools::Itertools;
use proptest::prelude::*;
use std::sync::Arc;

fn service() -> RaptorService {
    RaptorService::sequential(RaptorConfig::default())
}

fn route(request: &RaptorRequest, data: &dyn TransitDataProvider) -> RaptorResponse {
    service().route(request, data).unwrap()
}

/// Forward search from stop `from` at `edt`, single iteration
fn forward(from: u32, to: u32, edt: i32) -> RaptorRequestBuilder {
    RaptorRequest::builder()
        .earliest_departure_time(edt)
        .search_window(0)
        .access(StopId(from), 0)
        .egress(StopId(to), 0)
}

fn legs(journey: &Journey) -> Vec<Leg> {
    journey.legs().cloned().collect()
}

fn transit_legs(journey: &Journey) -> Vec<&Leg> {
    journey.legs().filter(|leg| leg.is_transit()).collect()
}

#[test]
fn test_case_1_forward() {
    let request = RaptorRequest::builder()
        .earliest_departure_time(hm(7, 50))
        .search_window(0)
        .access(StopId(0), 300)
        .egress(StopId(1), 0)
        .build();
    let response = route(&request, &case_1());

    assert_eq!(response.journeys.len(), 1);
    assert_eq!(legs(&response.journeys[0]), vec![
        Leg::Access { stop: StopId(0), departure: hm(7, 55), arrival: hm(8, 0) },
        Leg::Transit {
            route: RouteId(0),
            trip: TripId(0),
            from: StopId(0),
            to: StopId(1),
            board_pos: 0,
            alight_pos: 1,
            departure: hm(8, 0),
            arrival: hm(8, 10),
            constraint: None,
        },
        Leg::Egress { stop: StopId(1), departure: hm(8, 10), arrival: hm(8, 10) },
    ]);
    assert_eq!(response.statistics.iterations, 1);
    assert_eq!(response.stop_arrivals.best_time(StopId(1)), Some(hm(8, 10)));
}

#[test]
fn test_reverse_finds_the_same_journey() {
    let data = case_1();
    let forward = RaptorRequest::builder()
        .earliest_departure_time(hm(7, 50))
        .search_window(0)
        .access(StopId(0), 300)
        .egress(StopId(1), 0)
        .build();
    let reverse = RaptorRequest::builder()
        .direction(SearchDirection::Reverse)
        .latest_arrival_time(hm(8, 10))
        .search_window(0)
        .access(StopId(0), 300)
        .egress(StopId(1), 0)
        .build();

    let forward = route(&forward, &data);
    let reverse = route(&reverse, &data);
    assert_eq!(reverse.direction, SearchDirection::Reverse);
    assert_eq!(forward.journeys, reverse.journeys);
    // reverse best times are departures
    assert_eq!(reverse.stop_arrivals.best_time(StopId(0)), Some(hm(8, 0)));
}

#[test]
fn test_guaranteed_transfer() {
    let request = forward(0, 2, hm(8, 0)).build();

    // 1 minute is too short to change at B
    let regular = route(&request, &case_2(false));
    assert_eq!(regular.journeys.len(), 1);
    assert_eq!(regular.journeys[0].arrival(), hm(9, 0));

    let guaranteed = route(&request, &case_2(true));
    assert_eq!(guaranteed.journeys.len(), 1);
    let journey = &guaranteed.journeys[0];
    assert_eq!(journey.arrival(), hm(8, 30));
    assert_eq!(journey.number_of_transfers(), 1);
    match transit_legs(journey)[1] {
        Leg::Transit { trip, constraint, .. } => {
            assert_eq!(*trip, TripId(1));
            assert_eq!(*constraint, Some(TransferConstraint::Guaranteed));
        }
        leg => panic!("Unexpected leg {:?}", leg),
    }
}

#[test]
fn test_constrained_transfers_can_be_ignored() {
    let request = forward(0, 2, hm(8, 0)).constrained_transfers(false).build();
    let response = route(&request, &case_2(true));
    assert_eq!(response.journeys[0].arrival(), hm(9, 0));
}

#[test]
fn test_guaranteed_transfer_reverse() {
    let data = case_2(true);
    let forward = route(&forward(0, 2, hm(8, 0)).build(), &data);
    let reverse = RaptorRequest::builder()
        .direction(SearchDirection::Reverse)
        .latest_arrival_time(hm(8, 30))
        .search_window(0)
        .access(StopId(0), 0)
        .egress(StopId(2), 0)
        .build();
    let reverse = route(&reverse, &data);

    assert_eq!(reverse.journeys.len(), 1);
    assert_eq!(forward.journeys, reverse.journeys);
}

#[test]
fn test_constraint_variants() {
    let request = forward(0, 2, hm(8, 0)).build();

    let stay_seated = route(&request, &case_2_with(case_2_network(), Some(TransferConstraint::StaySeated)));
    assert_eq!(stay_seated.journeys[0].arrival(), hm(8, 30));

    // 1 minute wait is all the connection takes
    let min_wait = case_2_with(case_2_network(), Some(TransferConstraint::MinWaitTime { seconds: 60 }));
    assert_eq!(route(&request, &min_wait).journeys[0].arrival(), hm(8, 30));

    let min_wait = case_2_with(case_2_network(), Some(TransferConstraint::MinWaitTime { seconds: 120 }));
    assert_eq!(route(&request, &min_wait).journeys[0].arrival(), hm(9, 0));

    // the only trip left is not allowed
    let not_allowed = case_2_network().constraint(0, 2, 1, TransferConstraint::NotAllowed).build();
    assert!(route(&request, &not_allowed).journeys.is_empty());

    // a route level constraint applies to every trip of the route
    let route_level = case_2_network().route_constraint(0, 1, 1, TransferConstraint::Guaranteed).build();
    assert_eq!(route(&request, &route_level).journeys[0].arrival(), hm(8, 30));
}

#[test]
fn test_standard_keeps_earliest_arrival_only() {
    let response = route(&forward(0, 2, hm(8, 0)).build(), &case_3());

    assert_eq!(response.journeys.len(), 1);
    let journey = &response.journeys[0];
    assert_eq!(journey.arrival(), hm(8, 30));
    assert_eq!(journey.number_of_transfers(), 1);
    assert!(journey.visits_in_order(&[StopId(0), StopId(1), StopId(2)]));
    assert_eq!(journey.generalized_cost(), None);
}

#[test]
fn test_multi_criteria_keeps_fewer_transfers() {
    let request = forward(0, 2, hm(8, 0)).profile(Profile::MultiCriteria).build();
    let response = route(&request, &case_3());

    assert_eq!(response.journeys.len(), 2);
    let (fast, direct) = (&response.journeys[0], &response.journeys[1]);
    assert_eq!((fast.arrival(), fast.number_of_transfers()), (hm(8, 30), 1));
    assert_eq!((direct.arrival(), direct.number_of_transfers()), (hm(8, 32), 0));
    assert!(fast.generalized_cost().is_some_and(|cost| cost > 0));
    assert!(direct.generalized_cost().is_some_and(|cost| cost > 0));
}

#[test]
fn test_max_number_of_transfers() {
    for profile in [Profile::Standard, Profile::MultiCriteria] {
        let request = forward(0, 2, hm(8, 0)).profile(profile).max_number_of_transfers(0).build();
        let response = route(&request, &case_3());

        assert_eq!(response.journeys.len(), 1, "{}", profile);
        assert_eq!(response.journeys[0].arrival(), hm(8, 32));
        assert_eq!(transit_legs(&response.journeys[0]).len(), 1);
    }
}

#[test]
fn test_walking_transfer() {
    let response = route(&forward(0, 3, hm(8, 0)).build(), &case_5());

    assert_eq!(response.journeys.len(), 1);
    let legs = legs(&response.journeys[0]);
    assert_eq!(legs.len(), 5);
    assert_eq!(legs[2], Leg::Transfer { from: StopId(1), to: StopId(2), departure: hm(8, 10), arrival: hm(8, 12) });
    assert!(matches!(legs[3], Leg::Transit { trip: TripId(2), departure, .. } if departure == hm(8, 15)));
    assert_eq!(response.journeys[0].arrival(), hm(8, 25));
}

#[test]
fn test_no_walking_after_walking() {
    let response = route(&forward(0, 3, hm(8, 0)).build(), &case_5());

    // stop 4 is only reachable on foot from stop 3, as stop 2 was reached by walking
    assert_eq!(response.stop_arrivals.best_time(StopId(4)), Some(hm(8, 26)));
    assert_eq!(response.stop_arrivals.best_transit_time(StopId(2)), None);
}

/// Earliest arrival at every stop, relaxing all trips and transfers until nothing changes.
/// Walking is only allowed right after a transit leg. The networks used here need no transfer
/// slack.
fn earliest_arrivals(timetable: &Timetable, origin: StopId, departure: i32) -> Vec<Option<i32>> {
    // [on foot or at the origin, by transit]
    let mut best = vec![[i32::MAX; 2]; timetable.stops.len()];
    best[origin.idx()][0] = departure;

    let mut changed = true;
    while changed {
        changed = false;
        for route in &timetable.routes {
            for trip in &route.trips {
                let mut on_board = false;
                for (stop, time) in route.stops.iter().zip(&trip.times) {
                    let at_stop = &mut best[stop.idx()];
                    if on_board && time.arrival() < at_stop[1] {
                        at_stop[1] = time.arrival();
                        changed = true;
                    }
                    on_board |= at_stop[0].min(at_stop[1]) <= time.departure();
                }
            }
        }
        for transfer in &timetable.transfers {
            let from = best[transfer.from.idx()][1];
            if from != i32::MAX && from + transfer.duration < best[transfer.to.idx()][0] {
                best[transfer.to.idx()][0] = from + transfer.duration;
                changed = true;
            }
        }
    }
    best.into_iter()
        .map(|[on_foot, by_transit]| Some(on_foot.min(by_transit)).filter(|&t| t != i32::MAX))
        .collect()
}

#[test]
fn test_best_times_improve_round_by_round() {
    let cases = [
        (case_3_network(), 2, vec![hm(8, 32), hm(8, 30)]),
        (case_5_network(), 3, vec![hm(8, 25)]),
    ];
    for (network, destination, destination_times) in cases {
        let timetable = network.into_timetable();
        let expected = earliest_arrivals(&timetable, StopId(0), hm(8, 0));
        let stops = (0..timetable.stops.len() as u32).map(StopId).collect_vec();
        let data = TimetableTransitData::try_from(timetable).unwrap();

        let recorder = Arc::new(RecordingListener::default());
        let request = forward(0, destination, hm(8, 0))
            .debug_stops(stops.iter().copied())
            .debug_listener(recorder.clone())
            .build();
        let response = route(&request, &data);

        // every stop of these networks is reached either on foot or by transit, never both, so
        // the latest accepted arrival is the best time of the stop
        let mut latest = HashMap::new();
        let mut after_round = Vec::new();
        let mut at_destination = Vec::new();
        for event in recorder.0.lock().unwrap().iter() {
            match *event {
                DebugEvent::StopArrival { action: DebugAction::Accept, stop, time, .. } => {
                    assert!(expected[stop.idx()].is_some_and(|earliest| time >= earliest), "{} @{}", stop, time);
                    latest.insert(stop, time);
                    if stop == StopId(destination) {
                        at_destination.push(time);
                    }
                }
                DebugEvent::RoundComplete { .. } => after_round.push(latest.clone()),
                _ => {}
            }
        }

        assert!(after_round.len() >= 2);
        for (before, after) in after_round.iter().tuple_windows() {
            for (stop, time) in before {
                assert!(after.get(stop).is_some_and(|t| t <= time), "{} got worse", stop);
            }
        }
        assert_eq!(at_destination, destination_times);
        for stop in stops {
            assert_eq!(response.stop_arrivals.best_time(stop), expected[stop.idx()], "{}", stop);
        }
    }
}

#[test]
fn test_range_search_finds_every_departure() {
    let request = forward(0, 1, hm(8, 0)).search_window(1800).build();
    let response = route(&request, &case_4());

    let departures = response.journeys.iter().map(Journey::departure).collect::<Vec<_>>();
    assert_eq!(departures, vec![hm(8, 0), hm(8, 10), hm(8, 20), hm(8, 30)]);
    assert_eq!(response.statistics.iterations, 30);
}

#[test]
fn test_parallel_equals_sequential() {
    let config = RaptorConfig { search_thread_pool_size: 2, ..Default::default() };
    let parallel = RaptorService::from_config(config).unwrap();
    let data = case_4();

    for profile in [Profile::Standard, Profile::MultiCriteria] {
        let request = forward(0, 1, hm(8, 0)).profile(profile).search_window(1800).build();
        let sequential = route(&request, &data);
        let concurrent = parallel.route(&request, &data).unwrap();

        assert_eq!(sequential.journeys, concurrent.journeys, "{}", profile);
        assert_eq!(sequential.stop_arrivals, concurrent.stop_arrivals);
        assert_eq!(sequential.statistics.iterations, concurrent.statistics.iterations);
    }
}

#[test]
fn test_search_is_repeatable() {
    let data = case_3();
    let request = forward(0, 2, hm(8, 0)).profile(Profile::MultiCriteria).search_window(600).build();
    let service = service();

    let first = service.route(&request, &data).unwrap();
    let second = service.route(&request, &data).unwrap();
    assert_eq!(first.journeys, second.journeys);
    assert_eq!(first.stop_arrivals, second.stop_arrivals);
}

#[test]
fn test_timeout() {
    let config = RaptorConfig { search_timeout: Some(TimeDelta::zero()), ..Default::default() };
    let result = RaptorService::sequential(config).route(&forward(0, 1, hm(8, 0)).build(), &case_1());

    match result {
        Err(RaptorError::Timeout(err)) => {
            // the access arrival is set before the first round checks the deadline
            assert_eq!(err.best_times.best_time(StopId(0)), Some(hm(8, 0)));
        }
        other => panic!("Expected a timeout, got {:?}", other.map(|r| r.journeys)),
    }
}

#[test]
fn test_config_errors_are_returned() {
    let result = service().route(&forward(0, 1, hm(8, 0)).max_number_of_transfers(-1).build(), &case_1());
    assert!(matches!(result, Err(RaptorError::Config(ConfigError::InvalidRoundLimit(-1)))));

    let result = service().route(&forward(0, 7, hm(8, 0)).build(), &case_1());
    assert!(matches!(result, Err(RaptorError::Config(ConfigError::UnknownStop(_)))));
}

#[test]
fn test_unreachable_destination() {
    // the only trip runs the other way
    let response = route(&forward(1, 0, hm(8, 0)).build(), &case_1());
    assert!(response.journeys.is_empty());
    assert!(!response.stop_arrivals.is_destination_reached());

    // heuristics find out before the search runs
    let request = RaptorRequest::builder()
        .earliest_departure_time(hm(8, 0))
        .access(StopId(1), 0)
        .egress(StopId(0), 0)
        .build();
    let response = route(&request, &case_1());
    assert!(response.journeys.is_empty());
    assert_eq!(response.statistics.iterations, 0);
}

#[test]
fn test_best_time_profile() {
    let request = forward(0, 3, hm(8, 0)).profile(Profile::BestTime).build();
    let response = route(&request, &case_5());

    assert!(response.journeys.is_empty());
    let arrivals = &response.stop_arrivals;
    assert_eq!(arrivals.best_time(StopId(1)), Some(hm(8, 10)));
    assert_eq!(arrivals.best_time(StopId(2)), Some(hm(8, 12)));
    assert_eq!(arrivals.best_time(StopId(3)), Some(hm(8, 25)));

    let destination = arrivals.destination().unwrap();
    assert_eq!(destination.time, hm(8, 25));
    assert_eq!(destination.number_of_transfers, 1);
    assert_eq!(destination.min_travel_duration, 25 * 60);
}

#[test]
fn test_min_travel_duration_profile() {
    let request = RaptorRequest::builder()
        .profile(Profile::MinTravelDuration)
        .earliest_departure_time(hm(8, 0))
        .access(StopId(0), 0)
        .egress(StopId(3), 0)
        .build();
    let response = route(&request, &case_5());

    assert!(response.journeys.is_empty());
    // waiting 3 minutes at stop 2 does not count
    let destination = response.stop_arrivals.destination().unwrap();
    assert_eq!(destination.min_travel_duration, 22 * 60);
    assert_eq!(response.params.search_window, Some(0));
}

#[test]
fn test_heuristics_fill_in_window_and_latest_arrival() {
    let request = RaptorRequest::builder()
        .earliest_departure_time(hm(8, 0))
        .access(StopId(0), 0)
        .egress(StopId(1), 0)
        .build();
    let response = route(&request, &case_4());

    // 40 min + 0.5 * 10 min, rounded up to 10 minutes
    assert_eq!(response.params.search_window, Some(3000));
    // clamped to the last time of the timetable
    assert_eq!(response.params.latest_arrival_time, Some(hm(8, 40)));
    assert_eq!(response.journeys.len(), 4);
}

#[test]
fn test_heuristics_derive_earliest_departure() {
    let request = RaptorRequest::builder()
        .direction(SearchDirection::Reverse)
        .latest_arrival_time(hm(8, 40))
        .access(StopId(0), 0)
        .egress(StopId(1), 0)
        .build();
    let response = route(&request, &case_4());

    assert_eq!(response.params.search_window, Some(3000));
    // clamped to the first time of the timetable
    assert_eq!(response.params.earliest_departure_time, Some(hm(8, 0)));
    let arrivals = response.journeys.iter().map(Journey::arrival).collect::<Vec<_>>();
    assert_eq!(arrivals, vec![hm(8, 10), hm(8, 20), hm(8, 30), hm(8, 40)]);
}

#[test]
fn test_derived_latest_arrival_leaves_room_for_egress() {
    let request = RaptorRequest::builder()
        .earliest_departure_time(hm(7, 50))
        .access(StopId(0), 300)
        .egress(StopId(1), 300)
        .build();
    let response = route(&request, &case_1());

    // the last arrival of the timetable plus the walk from the stop
    assert_eq!(response.params.latest_arrival_time, Some(hm(8, 15)));
    assert_eq!(response.journeys.len(), 1);
    assert_eq!(response.journeys[0].departure(), hm(7, 55));
    assert_eq!(response.journeys[0].arrival(), hm(8, 15));
}

#[test]
fn test_derived_earliest_departure_leaves_room_for_access() {
    let request = RaptorRequest::builder()
        .direction(SearchDirection::Reverse)
        .latest_arrival_time(hm(8, 30))
        .access(StopId(0), 300)
        .egress(StopId(1), 300)
        .build();
    let response = route(&request, &case_1());

    // the first departure of the timetable minus the walk to the stop
    assert_eq!(response.params.earliest_departure_time, Some(hm(7, 55)));
    assert_eq!(response.journeys.len(), 1);
    assert_eq!(response.journeys[0].departure(), hm(7, 55));
    assert_eq!(response.journeys[0].arrival(), hm(8, 15));
}

#[test]
fn test_egress_waits_for_opening_hours() {
    let data = case_1();
    let egress = AccessEgress::new(StopId(1), 300).with_opening_hours(hm(8, 20), hm(8, 30));
    let forward = RaptorRequest::builder()
        .earliest_departure_time(hm(7, 50))
        .search_window(0)
        .access(StopId(0), 300)
        .egress_path(egress)
        .build();
    let reverse = RaptorRequest::builder()
        .direction(SearchDirection::Reverse)
        .latest_arrival_time(hm(9, 0))
        .search_window(0)
        .access(StopId(0), 300)
        .egress_path(egress)
        .build();

    let forward = route(&forward, &data);
    assert_eq!(forward.journeys.len(), 1);
    let legs = legs(&forward.journeys[0]);
    assert_eq!(legs[0], Leg::Access { stop: StopId(0), departure: hm(7, 55), arrival: hm(8, 0) });
    assert_eq!(legs[2], Leg::Egress { stop: StopId(1), departure: hm(8, 20), arrival: hm(8, 25) });

    let reverse = route(&reverse, &data);
    assert_eq!(forward.journeys, reverse.journeys);
}

#[test]
fn test_access_opening_hours() {
    let data = case_1();
    let request = |access: AccessEgress| {
        RaptorRequest::builder()
            .earliest_departure_time(hm(7, 0))
            .search_window(0)
            .access_path(access)
            .egress(StopId(1), 0)
            .build()
    };

    // leaves as late as the hours allow
    let open_early = AccessEgress::new(StopId(0), 300).with_opening_hours(hm(7, 50), hm(7, 52));
    let response = route(&request(open_early), &data);
    assert_eq!(response.journeys.len(), 1);
    assert_eq!(legs(&response.journeys[0])[0], Leg::Access { stop: StopId(0), departure: hm(7, 52), arrival: hm(7, 57) });

    // opens after the only trip left
    let open_late = AccessEgress::new(StopId(0), 300).with_opening_hours(hm(8, 10), hm(8, 20));
    assert!(route(&request(open_late), &data).journeys.is_empty());
}

/// One route A(0) - B(1) - C(2) - D(3) - E(4) - F(5), a trip every 10 minutes. Changing takes a
/// minute wherever the journey has to stop, so staying on board is never the same as visiting.
fn via_network(trips: usize, via_stops: &[u32]) -> TimetableTransitData {
    let schedules = (0..trips as i32)
        .map(|i| [2, 5, 10, 15, 20, 25].map(|m| hm(0, m + 10 * i)))
        .collect_vec();
    let trips = schedules.iter().map(|times| times.as_slice()).collect_vec();
    via_stops.iter()
        .fold(TimetableBuilder::new(6), |builder, &stop| builder.min_transfer_time(stop, 60))
        .route(&[0, 1, 2, 3, 4, 5], &trips)
        .build()
}

fn via_request(direction: SearchDirection, to: u32) -> RaptorRequestBuilder {
    RaptorRequest::builder()
        .profile(Profile::MultiCriteria)
        .direction(direction)
        .earliest_departure_time(hm(0, 0))
        .latest_arrival_time(hm(1, 0))
        .search_window(600)
        .access(StopId(0), 30)
        .egress(StopId(to), 30)
}

#[test]
fn test_via_stop_forces_alighting() {
    let data = via_network(2, &[2]);
    let request = via_request(SearchDirection::Forward, 3).via(ViaLocation::new([StopId(2)])).build();
    let response = route(&request, &data);

    assert_eq!(response.journeys.len(), 1);
    let journey = &response.journeys[0];
    assert_eq!((journey.departure(), journey.arrival()), (hm(0, 1) + 30, hm(0, 25) + 30));
    assert_eq!(journey.number_of_transfers(), 1);
    let rides = transit_legs(journey).into_iter()
        .map(|leg| match leg {
            Leg::Transit { trip, from, to, .. } => (*trip, *from, *to),
            _ => unreachable!(),
        })
        .collect_vec();
    assert_eq!(rides, vec![(TripId(0), StopId(0), StopId(2)), (TripId(1), StopId(2), StopId(3))]);

    // without the via the first trip goes straight through
    let direct = route(&via_request(SearchDirection::Forward, 3).build(), &data);
    assert!(direct.journeys.iter().all(|j| j.number_of_transfers() == 0));
}

#[test]
fn test_via_stops_are_visited_in_order() {
    let data = via_network(3, &[1, 3]);
    let request = via_request(SearchDirection::Forward, 5)
        .via(ViaLocation::new([StopId(1)]))
        .via(ViaLocation::new([StopId(3)]))
        .build();
    let response = route(&request, &data);

    assert_eq!(response.journeys.len(), 1);
    let journey = &response.journeys[0];
    assert_eq!((journey.departure(), journey.arrival()), (hm(0, 1) + 30, hm(0, 45) + 30));
    assert_eq!(journey.number_of_transfers(), 2);
    assert!(journey.visits_in_order(&[StopId(0), StopId(1), StopId(3), StopId(5)]));

    // D before B cannot be done on a line running the other way
    let swapped = via_request(SearchDirection::Forward, 5)
        .via(ViaLocation::new([StopId(3)]))
        .via(ViaLocation::new([StopId(1)]))
        .build();
    assert!(route(&swapped, &data).journeys.is_empty());
}

#[test]
fn test_reverse_via_search() {
    let data = via_network(2, &[2]);
    let via = ViaLocation::new([StopId(2)]);
    let forward = route(&via_request(SearchDirection::Forward, 3).via(via.clone()).build(), &data);
    let reverse = route(&via_request(SearchDirection::Reverse, 3).via(via).build(), &data);

    assert_eq!(reverse.journeys.len(), 1);
    assert_eq!(legs(&forward.journeys[0]), legs(&reverse.journeys[0]));
}

#[test]
fn test_via_needs_multi_criteria() {
    let request = via_request(SearchDirection::Forward, 3)
        .profile(Profile::Standard)
        .via(ViaLocation::new([StopId(2)]))
        .build();
    let result = service().route(&request, &via_network(2, &[2]));
    assert!(matches!(result, Err(RaptorError::Config(ConfigError::ViaSearchNotSupported(Profile::Standard)))));
}

#[test]
fn test_debug_events() {
    let recorder = Arc::new(RecordingListener::default());
    let request = RaptorRequest::builder()
        .earliest_departure_time(hm(7, 50))
        .search_window(0)
        .access(StopId(0), 300)
        .egress(StopId(1), 0)
        .debug_stops([StopId(1)])
        .debug_path([StopId(0), StopId(1)])
        .debug_listener(recorder.clone())
        .build();
    route(&request, &case_1());

    let events = recorder.0.lock().unwrap();
    assert!(events.contains(&DebugEvent::StopArrival {
        action: DebugAction::Accept,
        stop: StopId(1),
        round: 1,
        time: hm(8, 10),
        iteration_departure: hm(7, 50),
    }));
    assert!(events.iter().any(|event| matches!(event, DebugEvent::Journey { action: DebugAction::Accept, .. })));
    assert!(events.contains(&DebugEvent::RoundComplete { round: 1, destination_reached: true }));
}

#[test]
fn test_composite_search() {
    let request = forward(0, 2, hm(8, 0)).profile(Profile::MultiCriteria).build();
    let primary = case_3();

    // the same data again adds nothing
    let response = service().route_composite(&request, &primary, &case_3()).unwrap();
    let single = route(&request, &primary);
    assert_eq!(response.journeys, single.journeys);
    assert_eq!(response.statistics.iterations, 2 * single.statistics.iterations);

    // a faster direct trip replaces the slow one of the primary data
    let express = TimetableBuilder::new(3).route(&[0, 2], &[&[hm(8, 5), hm(8, 31)]]).build();
    let response = service().route_composite(&request, &primary, &express).unwrap();
    let summary = response.journeys.iter()
        .map(|j| (j.departure(), j.arrival(), j.number_of_transfers()))
        .collect::<Vec<_>>();
    assert_eq!(summary, vec![(hm(8, 0), hm(8, 30), 1), (hm(8, 5), hm(8, 31), 0)]);
}

fn journey(departure: i32, arrival: i32, transfers: u32, cost: i32) -> Journey {
    let mut legs = vec![Leg::Access { stop: StopId(0), departure, arrival: departure }];
    let mut time = departure;
    for i in 0..=transfers {
        let next = if i == transfers { arrival } else { time };
        legs.push(Leg::Transit {
            route: RouteId(i),
            trip: TripId(i),
            from: StopId(i),
            to: StopId(i + 1),
            board_pos: 0,
            alight_pos: 1,
            departure: time,
            arrival: next,
            constraint: None,
        });
        time = next;
    }
    legs.push(Leg::Egress { stop: StopId(transfers + 1), departure: arrival, arrival });
    Journey::new(legs, Some(cost))
}

fn worker_results(journeys: &[Journey], chunks: usize) -> Vec<WorkerResult> {
    journeys.chunks(journeys.len().div_ceil(chunks).max(1))
        .map(|chunk| WorkerResult {
            journeys: chunk.to_vec(),
            stop_arrivals: StopArrivals::new(SearchDirection::Forward, 4),
        })
        .collect()
}

proptest! {
    #[test]
    fn test_merged_journeys_do_not_depend_on_worker_order(
        criteria in prop::collection::vec((0..20i32, 0..20i32, 0..3u32, 0..4i32), 1..30),
        chunks in 1..5usize,
    ) {
        let journeys = criteria.iter()
            .map(|&(departure, duration, transfers, cost)| journey(departure * 60, departure * 60 + duration * 60, transfers, cost))
            .collect::<Vec<_>>();
        let mut reversed = journeys.clone();
        reversed.reverse();

        for profile in [Profile::Standard, Profile::MultiCriteria] {
            let request = RaptorRequest::builder().profile(profile).build();
            let (merged, _) = merge_results(&request, 4, worker_results(&journeys, chunks));
            let (merged_reversed, _) = merge_results(&request, 4, worker_results(&reversed, chunks));
            prop_assert_eq!(&merged, &merged_reversed);

            // nothing left dominates anything else
            let comparator = JourneyComparator::new(profile.is_multi_criteria());
            for a in &merged {
                prop_assert!(merged.iter().all(|b| !comparator.dominates(a, b)));
            }
        }
    }
}
