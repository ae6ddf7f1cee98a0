use crate::errors::RaptorResult;
use crate::raptor::context::SearchContext;
use crate::raptor::round_tracker::RoundTracker;
use crate::raptor::strategy::min_travel_duration::MinTravelDurationStrategy;
use crate::raptor::strategy::multi_criteria::McRoutingStrategy;
use crate::raptor::strategy::standard::{BestTimeArrivals, BestTimeStrategy, PathArrivals, StandardStrategy};
use crate::raptor::strategy::{RoutingStrategy, WorkerResult};
use crate::request::Profile;
use common::util::time::format_time;
use log::trace;

/// Runs the Range Raptor iterations of `minutes` with the strategy of the context's profile.
/// The strategy state is shared by all iterations run here, which is what makes later iterations
/// cheap.
pub(crate) fn run_worker(ctx: &SearchContext, minutes: &[i32]) -> RaptorResult<WorkerResult> {
    match ctx.profile {
        Profile::Standard => RangeRaptorWorker::new(ctx, StandardStrategy::new(ctx, PathArrivals::new(ctx))).route(minutes),
        Profile::BestTime => RangeRaptorWorker::new(ctx, BestTimeStrategy::new(ctx, BestTimeArrivals)).route(minutes),
        Profile::MinTravelDuration => RangeRaptorWorker::new(ctx, MinTravelDurationStrategy::new(ctx)).route(minutes),
        Profile::MultiCriteria => RangeRaptorWorker::new(ctx, McRoutingStrategy::new(ctx)).route(minutes),
    }
}

struct RangeRaptorWorker<'c, 'a, S> {
    ctx: &'c SearchContext<'a>,
    strategy: S,
    rounds: RoundTracker,
}

impl<'c, 'a, S: RoutingStrategy> RangeRaptorWorker<'c, 'a, S> {
    fn new(ctx: &'c SearchContext<'a>, strategy: S) -> Self {
        Self { ctx, strategy, rounds: RoundTracker::new(ctx.number_of_rounds) }
    }

    fn route(mut self, minutes: &[i32]) -> RaptorResult<WorkerResult> {
        for &departure in minutes {
            self.run_iteration(departure)?;
        }
        Ok(self.strategy.into_result())
    }

    fn run_iteration(&mut self, departure: i32) -> RaptorResult<()> {
        let ctx = self.ctx;
        trace!(target: "raptor", "Starting iteration at {}", format_time(departure));

        ctx.lifecycle.setup_iteration(departure);
        self.strategy.setup_iteration(ctx, departure);
        self.strategy.set_access(ctx);
        self.rounds.setup_iteration();

        while self.rounds.has_more_rounds() && self.strategy.is_new_round_available() {
            ctx.check_timeout(|| self.strategy.stop_arrivals())?;

            let round = self.rounds.next_round();
            ctx.lifecycle.prepare_for_next_round(round);
            self.strategy.prepare_for_next_round(round);

            let routes = ctx.data.routes_for_stops(self.strategy.stops_touched_previous_round());
            for route in routes {
                ctx.statistics.route_scanned();
                self.strategy.route(ctx, &ctx.data.route_timetable(route))?;
            }
            ctx.lifecycle.transits_for_round_complete();

            self.strategy.transfers(ctx)?;
            ctx.lifecycle.transfers_for_round_complete();

            let destination_reached = self.strategy.is_destination_reached_in_current_round();
            ctx.lifecycle.round_complete(round, destination_reached);
        }

        ctx.lifecycle.iteration_complete(departure);
        Ok(())
    }
}
