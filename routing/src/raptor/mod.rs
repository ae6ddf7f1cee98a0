mod arrivals;
mod best_times;
pub mod calculator;
mod composite;
mod context;
pub mod debug;
pub mod heuristics;
mod lifecycle;
pub mod pareto;
mod path;
mod round_tracker;
pub mod search_window;
mod stop_arrivals;
mod strategy;
mod worker;
#[cfg(test)]
mod tests;

pub use context::SearchPhase;
pub use lifecycle::SearchStatistics;
pub use stop_arrivals::{DestinationBest, StopArrivals};

use crate::errors::{ConfigError, RaptorResult};
use crate::journey::Journey;
use crate::raptor::context::SearchContext;
use crate::raptor::path::{DestinationArrivals, JourneyComparator};
use crate::raptor::strategy::WorkerResult;
use crate::request::{Profile, RaptorRequest, SearchDirection, SearchParams};
use crate::transit::TransitDataProvider;
use common::types::config::RaptorConfig;
use common::util::time::{format_duration, format_time};
use log::{debug, error, info};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Result of one search. No journeys is a valid result: the destination could not be reached.
#[derive(Debug, Clone, Serialize)]
pub struct RaptorResponse {
    pub profile: Profile,
    pub direction: SearchDirection,
    /// The parameters the search ran with, after the heuristics filled in what was missing
    pub params: SearchParams,
    pub journeys: Vec<Journey>,
    pub stop_arrivals: StopArrivals,
    pub statistics: SearchStatistics,
}

impl RaptorResponse {
    fn empty(request: &RaptorRequest, number_of_stops: usize) -> Self {
        Self {
            profile: request.profile,
            direction: request.direction,
            params: request.params.clone(),
            journeys: Vec::new(),
            stop_arrivals: StopArrivals::new(request.direction, number_of_stops),
            statistics: SearchStatistics::default(),
        }
    }
}

/// Entry point of the engine. Holds the configuration and the thread pool iterations run on,
/// and is cheap to share between requests.
#[derive(Debug, Clone)]
pub struct RaptorService {
    config: RaptorConfig,
    thread_pool: Option<Arc<ThreadPool>>,
}

impl RaptorService {
    /// Builds the search thread pool if the configuration asks for one
    pub fn from_config(config: RaptorConfig) -> Result<Self, ThreadPoolBuildError> {
        let thread_pool = match config.search_thread_pool_size {
            0 => None,
            threads => Some(Arc::new(
                ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("raptor-{}", i))
                    .build()?,
            )),
        };
        Ok(Self { config, thread_pool })
    }

    /// Runs everything on the caller's thread
    pub fn sequential(config: RaptorConfig) -> Self {
        Self { config, thread_pool: None }
    }

    pub fn config(&self) -> &RaptorConfig {
        &self.config
    }

    pub fn route(&self, request: &RaptorRequest, data: &dyn TransitDataProvider) -> RaptorResult<RaptorResponse> {
        request.validate(data)?;
        let deadline = self.config.search_timeout
            .and_then(|timeout| timeout.to_std().ok())
            .map(|timeout| Instant::now() + timeout);

        let Some(params) = heuristics::resolve_search_params(request, data, &self.config, deadline)? else {
            info!(target: "raptor", "{} search: destination not reachable", request.profile);
            return Ok(RaptorResponse::empty(request, data.number_of_stops()));
        };
        let request = RaptorRequest { params, ..request.clone() };

        let outcome = search(&request, data, &self.config, self.thread_pool.as_deref(), deadline)?;
        info!(
            target: "raptor",
            "{} search found {} journeys ({} iterations, {} rounds, {} route scans)",
            request.profile,
            outcome.journeys.len(),
            outcome.statistics.iterations,
            outcome.statistics.rounds,
            outcome.statistics.route_scans
        );

        Ok(RaptorResponse {
            profile: request.profile,
            direction: request.direction,
            params: request.params,
            journeys: outcome.journeys,
            stop_arrivals: outcome.stop_arrivals,
            statistics: outcome.statistics,
        })
    }

    /// Searches the primary and the secondary data independently and merges the journeys. The
    /// best times are those of the primary search.
    pub fn route_composite(
        &self,
        request: &RaptorRequest,
        primary: &dyn TransitDataProvider,
        secondary: &dyn TransitDataProvider,
    ) -> RaptorResult<RaptorResponse> {
        let primary = self.route(request, primary)?;
        let secondary = self.route(request, secondary)?;
        Ok(composite::merge(primary, secondary))
    }
}

pub(crate) struct SearchOutcome {
    pub journeys: Vec<Journey>,
    pub stop_arrivals: StopArrivals,
    pub statistics: SearchStatistics,
}

/// Runs all Range Raptor iterations of a fully resolved request and merges their results
pub(crate) fn search(
    request: &RaptorRequest,
    data: &dyn TransitDataProvider,
    config: &RaptorConfig,
    pool: Option<&ThreadPool>,
    deadline: Option<Instant>,
) -> RaptorResult<SearchOutcome> {
    let mut phase = SearchPhase::Initialized;
    let params = &request.params;

    let start = match request.direction {
        SearchDirection::Forward => params.earliest_departure_time,
        SearchDirection::Reverse => params.latest_arrival_time,
    }.ok_or(ConfigError::NoTimeBound)?;

    let ctx = SearchContext::new(request, data, deadline);
    let step = config.iteration_departure_step.num_seconds() as i32;
    let minutes = ctx.calc.range_raptor_minutes(start, params.search_window_or_zero(), step);
    debug!(
        target: "raptor",
        "{} {:?} search from {}, window {}, {} iterations, {} rounds",
        request.profile, request.direction, format_time(start),
        format_duration(params.search_window_or_zero()), minutes.len(), ctx.number_of_rounds
    );

    phase.advance(SearchPhase::Relaxing)?;
    let results = match pool {
        Some(pool) if minutes.len() > 1 => {
            // contiguous chunks, so pruning still works within each of them
            let chunk_size = minutes.len().div_ceil(pool.current_num_threads().max(1));
            pool.install(|| {
                minutes.par_chunks(chunk_size)
                    .map(|chunk| worker::run_worker(&ctx, chunk))
                    .collect::<RaptorResult<Vec<_>>>()
            })
        }
        _ => worker::run_worker(&ctx, &minutes).map(|result| vec![result]),
    };
    let results = results.inspect_err(|err| {
        if !err.is_timeout() {
            error!(target: "raptor", "{}", err);
        }
    })?;

    phase.advance(SearchPhase::Merging)?;
    let (journeys, stop_arrivals) = merge_results(request, ctx.number_of_stops(), results);

    phase.advance(SearchPhase::Done)?;
    Ok(SearchOutcome { journeys, stop_arrivals, statistics: ctx.statistics.snapshot() })
}

/// Merges worker results. Neither the order of the workers nor the order of their journeys
/// changes the outcome.
fn merge_results(request: &RaptorRequest, number_of_stops: usize, results: Vec<WorkerResult>) -> (Vec<Journey>, StopArrivals) {
    let mut journeys = DestinationArrivals::new(JourneyComparator::new(request.profile.is_multi_criteria()));
    let mut stop_arrivals: Option<StopArrivals> = None;

    for result in results {
        journeys.extend(result.journeys);
        stop_arrivals = Some(match stop_arrivals {
            Some(merged) => merged.merge(result.stop_arrivals),
            None => result.stop_arrivals,
        });
    }

    let mut journeys = journeys.into_vec();
    journeys.sort();
    (journeys, stop_arrivals.unwrap_or_else(|| StopArrivals::new(request.direction, number_of_stops)))
}
