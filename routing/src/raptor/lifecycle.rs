use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Hooks into the steps of the Range Raptor loop. Iterations may run concurrently, so every
/// listener must be thread-safe.
pub trait LifeCycleListener: Send + Sync {
    fn setup_iteration(&self, _departure: i32) {}

    fn prepare_for_next_round(&self, _round: usize) {}

    fn transits_for_round_complete(&self) {}

    fn transfers_for_round_complete(&self) {}

    fn round_complete(&self, _round: usize, _destination_reached: bool) {}

    fn iteration_complete(&self, _departure: i32) {}
}

/// Collects listeners while the search is set up
#[derive(Default)]
pub struct LifeCycleSubscriptions {
    listeners: Vec<Arc<dyn LifeCycleListener>>,
}

impl LifeCycleSubscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Arc<dyn LifeCycleListener>) {
        self.listeners.push(listener);
    }

    /// No more subscriptions after this
    pub fn freeze(self) -> LifeCycleEventPublisher {
        LifeCycleEventPublisher { listeners: self.listeners.into_boxed_slice() }
    }
}

pub struct LifeCycleEventPublisher {
    listeners: Box<[Arc<dyn LifeCycleListener>]>,
}

impl LifeCycleEventPublisher {
    pub fn setup_iteration(&self, departure: i32) {
        self.listeners.iter().for_each(|l| l.setup_iteration(departure));
    }

    pub fn prepare_for_next_round(&self, round: usize) {
        self.listeners.iter().for_each(|l| l.prepare_for_next_round(round));
    }

    pub fn transits_for_round_complete(&self) {
        self.listeners.iter().for_each(|l| l.transits_for_round_complete());
    }

    pub fn transfers_for_round_complete(&self) {
        self.listeners.iter().for_each(|l| l.transfers_for_round_complete());
    }

    pub fn round_complete(&self, round: usize, destination_reached: bool) {
        self.listeners.iter().for_each(|l| l.round_complete(round, destination_reached));
    }

    pub fn iteration_complete(&self, departure: i32) {
        self.listeners.iter().for_each(|l| l.iteration_complete(departure));
    }
}

/// Counts the work done by one search
#[derive(Debug, Default)]
pub struct StatisticsCollector {
    iterations: AtomicUsize,
    rounds: AtomicUsize,
    route_scans: AtomicUsize,
}

impl StatisticsCollector {
    pub fn route_scanned(&self) {
        self.route_scans.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SearchStatistics {
        SearchStatistics {
            iterations: self.iterations.load(Ordering::Relaxed),
            rounds: self.rounds.load(Ordering::Relaxed),
            route_scans: self.route_scans.load(Ordering::Relaxed),
        }
    }
}

impl LifeCycleListener for StatisticsCollector {
    fn setup_iteration(&self, _departure: i32) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
    }

    fn prepare_for_next_round(&self, _round: usize) {
        self.rounds.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStatistics {
    pub iterations: usize,
    pub rounds: usize,
    pub route_scans: usize,
}

impl SearchStatistics {
    pub fn add(self, other: SearchStatistics) -> SearchStatistics {
        SearchStatistics {
            iterations: self.iterations + other.iterations,
            rounds: self.rounds + other.rounds,
            route_scans: self.route_scans + other.route_scans,
        }
    }
}
