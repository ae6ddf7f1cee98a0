use crate::errors::RaptorResult;
use crate::raptor::search;
use crate::raptor::search_window::DynamicSearchWindow;
use crate::request::access_egress::AccessEgress;
use crate::request::{Profile, RaptorRequest, SearchDirection, SearchParams};
use crate::transit::TransitDataProvider;
use common::types::config::RaptorConfig;
use common::util::time::{format_duration, format_time};
use log::debug;
use std::time::Instant;

/// Lower bounds found by the heuristic searches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heuristics {
    /// Shortest possible travel duration, without any waiting
    pub min_transit_time: i32,
    /// Waiting the fastest connection adds on top of `min_transit_time`
    pub min_wait_time: i32,
}

/// Runs a min-travel-duration and a best-time search from the known time bound. None if the
/// destination cannot be reached.
pub(crate) fn calculate_heuristics(
    request: &RaptorRequest,
    data: &dyn TransitDataProvider,
    config: &RaptorConfig,
    deadline: Option<Instant>,
) -> RaptorResult<Option<Heuristics>> {
    let min_travel_duration = search(&heuristic_request(request, Profile::MinTravelDuration), data, config, None, deadline)?;
    let Some(min_transit_time) = min_travel_duration.stop_arrivals.destination().map(|d| d.min_travel_duration) else {
        debug!(target: "heuristics", "Destination not reachable");
        return Ok(None);
    };

    let best_time = search(&heuristic_request(request, Profile::BestTime), data, config, None, deadline)?;
    let Some(duration) = best_time.stop_arrivals.destination().map(|d| d.min_travel_duration) else {
        debug!(target: "heuristics", "Destination not reachable");
        return Ok(None);
    };

    let heuristics = Heuristics { min_transit_time, min_wait_time: (duration - min_transit_time).max(0) };
    debug!(
        target: "heuristics",
        "Min transit time {}, min wait time {}",
        format_duration(heuristics.min_transit_time), format_duration(heuristics.min_wait_time)
    );
    Ok(Some(heuristics))
}

// Single iteration from the known bound, in its direction
fn heuristic_request(request: &RaptorRequest, profile: Profile) -> RaptorRequest {
    let params = &request.params;
    let (direction, earliest_departure_time, latest_arrival_time) = match params.earliest_departure_time {
        Some(edt) => (SearchDirection::Forward, Some(edt), None),
        None => (SearchDirection::Reverse, None, params.latest_arrival_time),
    };

    RaptorRequest {
        profile,
        direction,
        params: SearchParams {
            earliest_departure_time,
            latest_arrival_time,
            search_window: Some(0),
            max_number_of_transfers: params.max_number_of_transfers,
            access_paths: params.access_paths.clone(),
            egress_paths: params.egress_paths.clone(),
            constrained_transfers: false,
            heuristics_enabled: false,
            via_locations: Vec::new(),
        },
        debug: Default::default(),
    }
}

/// Fills in the search window and the missing time bound. None if the heuristics show the
/// destination cannot be reached.
pub(crate) fn resolve_search_params(
    request: &RaptorRequest,
    data: &dyn TransitDataProvider,
    config: &RaptorConfig,
    deadline: Option<Instant>,
) -> RaptorResult<Option<SearchParams>> {
    let params = &request.params;
    if !params.requires_heuristics(request.profile, request.direction) {
        let mut resolved = params.clone();
        resolved.search_window = Some(params.search_window_or_zero());
        return Ok(Some(resolved));
    }

    let Some(heuristics) = calculate_heuristics(request, data, config, deadline)? else {
        return Ok(None);
    };
    let resolved = apply_heuristics(request, &heuristics, data.valid_data_time_window(), config);
    debug!(
        target: "heuristics",
        "Resolved search: EDT {}, LAT {}, window {}",
        resolved.earliest_departure_time.map_or("-".to_string(), format_time),
        resolved.latest_arrival_time.map_or("-".to_string(), format_time),
        format_duration(resolved.search_window_or_zero())
    );
    Ok(Some(resolved))
}

fn apply_heuristics(
    request: &RaptorRequest,
    heuristics: &Heuristics,
    (valid_from, valid_to): (i32, i32),
    config: &RaptorConfig,
) -> SearchParams {
    let dynamic = DynamicSearchWindow::new(&config.dynamic_search_window);
    let mut params = request.params.clone();
    let mtt = heuristics.min_transit_time;

    let window = match (params.search_window, params.earliest_departure_time, params.latest_arrival_time) {
        (Some(window), _, _) => window,
        (None, _, _) if request.profile == Profile::MinTravelDuration => 0,
        (None, Some(edt), Some(lat)) => dynamic.between(edt, lat, mtt),
        (None, _, _) => dynamic.calculate(mtt, heuristics.min_wait_time),
    };
    params.search_window = Some(window);

    // the data window bounds times at stops, the search bounds include walking to and from them
    match (params.earliest_departure_time, params.latest_arrival_time) {
        (Some(edt), None) => {
            let limit = valid_to + longest(&params.egress_paths);
            params.latest_arrival_time = Some((edt + window + mtt).min(limit));
        }
        (None, Some(lat)) => {
            let limit = valid_from - longest(&params.access_paths);
            params.earliest_departure_time = Some((lat - (window + mtt)).max(limit));
        }
        _ => {}
    }
    params
}

fn longest(paths: &[AccessEgress]) -> i32 {
    paths.iter().map(|p| p.duration).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::hm;
    use common::types::StopId;

    fn request(edt: Option<i32>, lat: Option<i32>, window: Option<i32>) -> RaptorRequest {
        let mut builder = RaptorRequest::builder()
            .access(StopId(0), 60)
            .egress(StopId(1), 60);
        if let Some(edt) = edt {
            builder = builder.earliest_departure_time(edt);
        }
        if let Some(lat) = lat {
            builder = builder.latest_arrival_time(lat);
        }
        if let Some(window) = window {
            builder = builder.search_window(window);
        }
        builder.build()
    }

    const HEURISTICS: Heuristics = Heuristics { min_transit_time: 900, min_wait_time: 300 };
    const DATA_WINDOW: (i32, i32) = (0, 48 * 3600);

    #[test]
    fn test_latest_arrival_from_earliest_departure() {
        let params = apply_heuristics(&request(Some(hm(8, 0)), None, None), &HEURISTICS, DATA_WINDOW, &RaptorConfig::default());
        assert_eq!(params.search_window, Some(3000));
        assert_eq!(params.latest_arrival_time, Some(hm(8, 0) + 3000 + 900));
    }

    #[test]
    fn test_earliest_departure_from_latest_arrival() {
        let params = apply_heuristics(&request(None, Some(hm(9, 0)), Some(1800)), &HEURISTICS, DATA_WINDOW, &RaptorConfig::default());
        assert_eq!(params.search_window, Some(1800));
        assert_eq!(params.earliest_departure_time, Some(hm(9, 0) - 2700));
    }

    #[test]
    fn test_window_between_bounds() {
        let params = apply_heuristics(&request(Some(hm(8, 0)), Some(hm(9, 0)), None), &HEURISTICS, DATA_WINDOW, &RaptorConfig::default());
        assert_eq!(params.search_window, Some(3000));
        assert_eq!(params.earliest_departure_time, Some(hm(8, 0)));
        assert_eq!(params.latest_arrival_time, Some(hm(9, 0)));
    }

    #[test]
    fn test_derived_bound_is_clamped_to_data() {
        let params = apply_heuristics(&request(Some(hm(8, 0)), None, Some(600)), &HEURISTICS, (0, hm(8, 10)), &RaptorConfig::default());
        assert_eq!(params.latest_arrival_time, Some(hm(8, 10) + 60));
    }

    #[test]
    fn test_derived_earliest_departure_leaves_room_for_access() {
        let params = apply_heuristics(&request(None, Some(hm(9, 0)), None), &HEURISTICS, (hm(8, 30), hm(23, 0)), &RaptorConfig::default());
        assert_eq!(params.earliest_departure_time, Some(hm(8, 30) - 60));
    }

    #[test]
    fn test_heuristic_request_runs_from_known_bound() {
        let reverse = heuristic_request(&request(None, Some(hm(9, 0)), None), Profile::BestTime);
        assert_eq!(reverse.direction, SearchDirection::Reverse);
        assert_eq!(reverse.params.search_window, Some(0));
        assert!(!reverse.params.heuristics_enabled);

        let forward = heuristic_request(&request(Some(hm(8, 0)), Some(hm(9, 0)), None), Profile::MinTravelDuration);
        assert_eq!(forward.direction, SearchDirection::Forward);
        assert_eq!(forward.params.latest_arrival_time, None);
    }
}
