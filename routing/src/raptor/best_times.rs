use crate::raptor::calculator::TransitCalculator;
use crate::raptor::stop_arrivals::{merge_destination, DestinationBest, StopArrivals};
use common::types::StopId;

/// τ*(p) and friends: the best known times per stop, shared by all rounds and iterations of one
/// worker, plus the marks of which stops changed in the current and the last round.
#[derive(Debug)]
pub(crate) struct BestTimes {
    calc: TransitCalculator,
    // overall best time, called τ*(p) in the RAPTOR paper
    times: Vec<i32>,
    // best time by transit. Only those arrivals may continue by walking or leave through egress.
    transit_times: Vec<i32>,
    best_by_transit: Vec<bool>,

    // snapshot of the stops improved in the last round, used for boarding
    last_round_times: Vec<i32>,
    last_round_by_transit: Vec<bool>,
    reached_last_round: Vec<bool>,
    last_round_stops: Vec<StopId>,

    reached_current_round: Vec<bool>,
    current_round_stops: Vec<StopId>,
    transit_current_round: Vec<bool>,
    transit_stops: Vec<StopId>,
}

impl BestTimes {
    pub fn new(calc: TransitCalculator, number_of_stops: usize) -> Self {
        let unreached = calc.unreached_time();
        Self {
            calc,
            times: vec![unreached; number_of_stops],
            transit_times: vec![unreached; number_of_stops],
            best_by_transit: vec![false; number_of_stops],
            last_round_times: vec![unreached; number_of_stops],
            last_round_by_transit: vec![false; number_of_stops],
            reached_last_round: vec![false; number_of_stops],
            last_round_stops: Vec::new(),
            reached_current_round: vec![false; number_of_stops],
            current_round_stops: Vec::new(),
            transit_current_round: vec![false; number_of_stops],
            transit_stops: Vec::new(),
        }
    }

    /// Times are kept, only the round marks are reset
    pub fn setup_iteration(&mut self) {
        clear_marks(&mut self.reached_last_round, &mut self.last_round_stops);
        clear_marks(&mut self.reached_current_round, &mut self.current_round_stops);
        clear_marks(&mut self.transit_current_round, &mut self.transit_stops);
    }

    /// The stops improved in the round just finished become the boarding stops of the next round
    pub fn prepare_for_next_round(&mut self) {
        clear_marks(&mut self.reached_last_round, &mut self.last_round_stops);
        clear_marks(&mut self.transit_current_round, &mut self.transit_stops);

        for &stop in &self.current_round_stops {
            let i = stop.idx();
            self.reached_last_round[i] = true;
            self.last_round_times[i] = self.times[i];
            self.last_round_by_transit[i] = self.best_by_transit[i];
        }
        std::mem::swap(&mut self.last_round_stops, &mut self.current_round_stops);
        self.last_round_stops.sort_unstable();
        for &stop in &self.last_round_stops {
            self.reached_current_round[stop.idx()] = false;
        }
    }

    #[inline]
    pub fn time(&self, stop: StopId) -> i32 {
        self.times[stop.idx()]
    }

    #[inline]
    pub fn transit_time(&self, stop: StopId) -> i32 {
        self.transit_times[stop.idx()]
    }

    pub fn is_new_best(&self, stop: StopId, time: i32) -> bool {
        self.calc.is_better(time, self.times[stop.idx()])
    }

    pub fn is_new_best_transit(&self, stop: StopId, time: i32) -> bool {
        self.calc.is_better(time, self.transit_times[stop.idx()])
    }

    /// Sets the overall best time and marks the stop for the next round
    pub fn update_best(&mut self, stop: StopId, time: i32, by_transit: bool) {
        let i = stop.idx();
        self.times[i] = time;
        self.best_by_transit[i] = by_transit;
        if !self.reached_current_round[i] {
            self.reached_current_round[i] = true;
            self.current_round_stops.push(stop);
        }
    }

    /// Sets the best transit time and marks the stop for the transfer phase
    pub fn update_best_transit(&mut self, stop: StopId, time: i32) {
        let i = stop.idx();
        self.transit_times[i] = time;
        if !self.transit_current_round[i] {
            self.transit_current_round[i] = true;
            self.transit_stops.push(stop);
        }
    }

    #[inline]
    pub fn is_reached_last_round(&self, stop: StopId) -> bool {
        self.reached_last_round[stop.idx()]
    }

    /// The time a stop was reached with in the last round, and whether it was reached by transit
    #[inline]
    pub fn last_round_arrival(&self, stop: StopId) -> (i32, bool) {
        (self.last_round_times[stop.idx()], self.last_round_by_transit[stop.idx()])
    }

    pub fn stops_reached_last_round(&self) -> &[StopId] {
        &self.last_round_stops
    }

    pub fn is_current_round_updated(&self) -> bool {
        !self.current_round_stops.is_empty()
    }

    /// Stops reached by transit in the current round, in ascending order
    pub fn stops_reached_by_transit_current_round(&mut self) -> Vec<StopId> {
        self.transit_stops.sort_unstable();
        self.transit_stops.clone()
    }

    pub fn to_stop_arrivals(&self, destination: Option<DestinationBest>) -> StopArrivals {
        let unreached = self.calc.unreached_time();
        let reached = |times: &[i32]| -> Vec<Option<i32>> { times.iter().map(|&t| (t != unreached).then_some(t)).collect() };
        StopArrivals::from_parts(
            self.calc.direction(),
            reached(&self.times),
            reached(&self.transit_times),
            destination,
        )
    }
}

fn clear_marks(marks: &mut [bool], stops: &mut Vec<StopId>) {
    for stop in stops.drain(..) {
        marks[stop.idx()] = false;
    }
}

/// Tracks the best destination arrival of one worker
#[derive(Debug, Clone)]
pub(crate) struct DestinationTracker {
    calc: TransitCalculator,
    best: Option<DestinationBest>,
    reached_current_round: bool,
}

impl DestinationTracker {
    pub fn new(calc: TransitCalculator) -> Self {
        Self { calc, best: None, reached_current_round: false }
    }

    pub fn prepare_for_next_round(&mut self) {
        self.reached_current_round = false;
    }

    /// `time` is the arrival at the destination, after the egress path
    pub fn arrived(&mut self, iteration_departure: i32, time: i32, number_of_transfers: u32) {
        let candidate = DestinationBest {
            time,
            number_of_transfers,
            min_travel_duration: self.calc.duration(iteration_departure, time),
        };
        self.reached_current_round = true;
        self.best = Some(match self.best {
            Some(best) => merge_destination(&self.calc, best, candidate),
            None => candidate,
        });
    }

    pub fn is_reached_current_round(&self) -> bool {
        self.reached_current_round
    }

    pub fn best(&self) -> Option<DestinationBest> {
        self.best
    }
}
