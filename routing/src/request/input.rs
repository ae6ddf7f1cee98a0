use crate::request::access_egress::AccessEgress;
use crate::request::via::ViaLocation;
use crate::request::{Profile, RaptorRequest, SearchDirection, SearchParams};
use chrono::TimeDelta;
use common::types::StopId;
use common::util::time::TimeOfDay;
use serde::Deserialize;
use serde_with::serde_as;

/// A request as read from a file. Times accept the same formats as the timetable.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RaptorRequestInput {
    pub profile: Profile,
    pub direction: SearchDirection,
    pub earliest_departure_time: Option<TimeOfDay>,
    pub latest_arrival_time: Option<TimeOfDay>,
    #[serde_as(as = "Option<serde_with::DurationSeconds<i64>>")]
    pub search_window: Option<TimeDelta>,
    pub max_number_of_transfers: Option<i32>,
    pub access: Vec<AccessEgress>,
    pub egress: Vec<AccessEgress>,
    pub constrained_transfers: Option<bool>,
    pub heuristics: Option<bool>,
    pub via: Vec<ViaLocation>,
    pub debug_stops: Vec<StopId>,
    pub debug_path: Vec<StopId>,
}

impl RaptorRequestInput {
    /// `default_max_transfers` is used if the input does not set its own limit
    pub fn into_request(self, default_max_transfers: i32) -> RaptorRequest {
        let defaults = SearchParams::default();

        let mut request = RaptorRequest {
            profile: self.profile,
            direction: self.direction,
            params: SearchParams {
                earliest_departure_time: self.earliest_departure_time.map(|t| t.0),
                latest_arrival_time: self.latest_arrival_time.map(|t| t.0),
                search_window: self.search_window.map(|w| w.num_seconds() as i32),
                max_number_of_transfers: self.max_number_of_transfers.unwrap_or(default_max_transfers),
                access_paths: self.access,
                egress_paths: self.egress,
                constrained_transfers: self.constrained_transfers.unwrap_or(defaults.constrained_transfers),
                heuristics_enabled: self.heuristics.unwrap_or(defaults.heuristics_enabled),
                via_locations: self.via,
            },
            ..Default::default()
        };
        request.debug.stops = self.debug_stops;
        request.debug.path = self.debug_path;
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_input() {
        let json = r#"{
            "profile": "multi-criteria",
            "earliest_departure_time": "07:50",
            "search_window": 3600,
            "access": [{ "stop": 0, "duration": 300 }],
            "egress": [{ "stop": 1, "duration": 0, "cost": 500 }],
            "via": [{ "stops": [1] }],
            "debug_stops": [1]
        }"#;
        let input: RaptorRequestInput = serde_json::from_str(json).unwrap();
        let request = input.into_request(5);

        assert_eq!(request.profile, Profile::MultiCriteria);
        assert_eq!(request.direction, SearchDirection::Forward);
        assert_eq!(request.params.earliest_departure_time, Some(7 * 3600 + 50 * 60));
        assert_eq!(request.params.latest_arrival_time, None);
        assert_eq!(request.params.search_window, Some(3600));
        assert_eq!(request.params.max_number_of_transfers, 5);
        assert_eq!(request.params.egress_paths, vec![AccessEgress::with_cost(StopId(1), 0, 500)]);
        assert!(request.params.heuristics_enabled);
        assert_eq!(request.params.via_locations, vec![ViaLocation::new([StopId(1)])]);
        assert_eq!(request.debug.stops, vec![StopId(1)]);
    }
}
