use crate::errors::{InvariantError, TimeoutError};
use crate::raptor::calculator::TransitCalculator;
use crate::raptor::debug::DebugHandler;
use crate::raptor::lifecycle::{LifeCycleEventPublisher, LifeCycleSubscriptions, StatisticsCollector};
use crate::raptor::stop_arrivals::StopArrivals;
use crate::request::access_egress::{AccessPaths, EgressPaths};
use crate::request::via::ViaStops;
use crate::request::{Profile, RaptorRequest, SearchDirection};
use crate::transit::constrained::ConstrainedTransferSearch;
use crate::transit::cost::{CostCalculator, DefaultCostCalculator};
use crate::transit::TransitDataProvider;
use std::sync::Arc;
use std::time::Instant;

/// Steps of one top-level search. Never goes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SearchPhase {
    Initialized,
    Relaxing,
    Merging,
    Done,
}

impl SearchPhase {
    pub fn advance(&mut self, to: SearchPhase) -> Result<(), InvariantError> {
        if to < *self {
            return Err(InvariantError::BackwardPhaseTransition { from: *self, to });
        }
        *self = to;
        Ok(())
    }
}

/// Everything a worker reads while searching. Shared by reference between concurrently running
/// workers of the same search.
pub(crate) struct SearchContext<'a> {
    pub data: &'a dyn TransitDataProvider,
    pub profile: Profile,
    pub calc: TransitCalculator,
    pub access: AccessPaths,
    pub egress: EgressPaths,
    /// Empty unless the profile is multi-criteria
    pub via: ViaStops,
    pub number_of_rounds: usize,
    /// Only set if the profile honors constraints and the data has some
    pub constraints: Option<&'a dyn ConstrainedTransferSearch>,
    provided_cost: Option<&'a dyn CostCalculator>,
    default_cost: DefaultCostCalculator,
    pub debug: Arc<DebugHandler>,
    pub lifecycle: LifeCycleEventPublisher,
    pub statistics: Arc<StatisticsCollector>,
    deadline: Option<Instant>,
}

impl<'a> SearchContext<'a> {
    pub fn new(request: &RaptorRequest, data: &'a dyn TransitDataProvider, deadline: Option<Instant>) -> Self {
        let params = &request.params;
        let profile = request.profile;

        let time_limit = match (profile, request.direction) {
            // shifted times cannot be compared to real ones
            (Profile::MinTravelDuration, _) => None,
            (_, SearchDirection::Forward) => params.latest_arrival_time,
            (_, SearchDirection::Reverse) => params.earliest_departure_time,
        };
        let calc = TransitCalculator::new(request.direction, time_limit);

        // a reverse search starts at the egress paths
        let (access, egress) = match request.direction {
            SearchDirection::Forward => (&params.access_paths, &params.egress_paths),
            SearchDirection::Reverse => (&params.egress_paths, &params.access_paths),
        };
        let multi_criteria = profile.is_multi_criteria();
        let provided_cost = data.cost_calculator();
        let default_cost = DefaultCostCalculator::default();
        let cost: &dyn CostCalculator = match provided_cost {
            Some(cost) => cost,
            None => &default_cost,
        };
        let access = AccessPaths::new(access, multi_criteria, cost);
        let egress = EgressPaths::new(egress, multi_criteria, cost);

        let constraints = if params.constrained_transfers && profile.supports_constrained_transfers() {
            data.constrained_transfer_search()
        } else {
            None
        };

        let debug = Arc::new(DebugHandler::new(&request.debug));
        let statistics = Arc::new(StatisticsCollector::default());
        let mut subscriptions = LifeCycleSubscriptions::new();
        subscriptions.subscribe(statistics.clone());
        if debug.is_enabled() {
            subscriptions.subscribe(debug.clone());
        }

        Self {
            data,
            profile,
            calc,
            access,
            egress,
            via: ViaStops::new(&params.via_locations, request.direction),
            number_of_rounds: params.number_of_rounds(),
            constraints,
            provided_cost,
            default_cost,
            debug,
            lifecycle: subscriptions.freeze(),
            statistics,
            deadline,
        }
    }

    pub fn number_of_stops(&self) -> usize {
        self.data.number_of_stops()
    }

    /// The calculator of the transit data, or the default one
    pub fn cost(&self) -> &dyn CostCalculator {
        match self.provided_cost {
            Some(cost) => cost,
            None => &self.default_cost,
        }
    }

    /// Polled between rounds. `best_times` is only evaluated if the search timed out.
    pub fn check_timeout(&self, best_times: impl FnOnce() -> StopArrivals) -> Result<(), TimeoutError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(TimeoutError { best_times: best_times() }),
            _ => Ok(()),
        }
    }
}
