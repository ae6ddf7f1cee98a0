use crate::journey::Journey;
use crate::raptor::lifecycle::LifeCycleListener;
use common::types::StopId;
use common::util::time::format_time;
use hashbrown::HashSet;
use log::debug;
use std::fmt;
use std::fmt::Debug;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugAction {
    Accept,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugEvent {
    StopArrival {
        action: DebugAction,
        stop: StopId,
        round: usize,
        time: i32,
        iteration_departure: i32,
    },
    Journey {
        action: DebugAction,
        journey: Journey,
    },
    RoundComplete {
        round: usize,
        destination_reached: bool,
    },
}

/// Receives the events of traced stops and journeys. Iterations may run concurrently, so a
/// listener has to synchronize itself.
pub trait DebugListener: Send + Sync {
    fn on_event(&self, event: &DebugEvent);
}

/// Writes every event to the log
#[derive(Debug, Default)]
pub struct LoggingDebugListener;

impl DebugListener for LoggingDebugListener {
    fn on_event(&self, event: &DebugEvent) {
        match event {
            DebugEvent::StopArrival { action, stop, round, time, iteration_departure } => debug!(
                target: "raptor::debug",
                "{:?} arrival at stop {} @{} (round {}, iteration {})",
                action, stop, format_time(*time), round, format_time(*iteration_departure)
            ),
            DebugEvent::Journey { action, journey } => debug!(
                target: "raptor::debug",
                "{:?} journey {} -> {} with {} transfers: {:?}",
                action, format_time(journey.departure()), format_time(journey.arrival()),
                journey.number_of_transfers(), journey.legs().collect::<Vec<_>>()
            ),
            DebugEvent::RoundComplete { round, destination_reached } => debug!(
                target: "raptor::debug",
                "Round {} complete, destination reached: {}", round, destination_reached
            ),
        }
    }
}

/// What to trace during a search
#[derive(Clone, Default)]
pub struct DebugRequest {
    /// Stops whose arrivals are reported
    pub stops: Vec<StopId>,
    /// Journeys visiting these stops in this order are reported
    pub path: Vec<StopId>,
    pub listeners: Vec<Arc<dyn DebugListener>>,
}

impl Debug for DebugRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugRequest")
            .field("stops", &self.stops)
            .field("path", &self.path)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Filters events by the traced stops and path and forwards them to the listeners
pub(crate) struct DebugHandler {
    stops: HashSet<StopId>,
    path: Vec<StopId>,
    listeners: Vec<Arc<dyn DebugListener>>,
}

impl DebugHandler {
    pub fn new(request: &DebugRequest) -> Self {
        Self {
            stops: request.stops.iter().chain(request.path.iter()).copied().collect(),
            path: request.path.clone(),
            listeners: request.listeners.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.listeners.is_empty() && !self.stops.is_empty()
    }

    #[inline]
    pub fn is_traced(&self, stop: StopId) -> bool {
        !self.listeners.is_empty() && self.stops.contains(&stop)
    }

    pub fn stop_arrival(&self, action: DebugAction, stop: StopId, round: usize, time: i32, iteration_departure: i32) {
        if self.is_traced(stop) {
            self.emit(&DebugEvent::StopArrival { action, stop, round, time, iteration_departure });
        }
    }

    pub fn journey(&self, action: DebugAction, journey: &Journey) {
        if !self.listeners.is_empty() && !self.path.is_empty() && journey.visits_in_order(&self.path) {
            self.emit(&DebugEvent::Journey { action, journey: journey.clone() });
        }
    }

    fn emit(&self, event: &DebugEvent) {
        self.listeners.iter().for_each(|l| l.on_event(event));
    }
}

impl LifeCycleListener for DebugHandler {
    fn round_complete(&self, round: usize, destination_reached: bool) {
        if self.is_enabled() {
            self.emit(&DebugEvent::RoundComplete { round, destination_reached });
        }
    }
}
