use crate::request::SearchDirection;
use common::types::StopId;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

/// A place the journey has to stop at, given as a group of alternative stops. A journey visits
/// it by arriving at one of the stops, boarding or leaving again from there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViaLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub stops: Vec<StopId>,
}

impl ViaLocation {
    pub fn new(stops: impl IntoIterator<Item = StopId>) -> Self {
        Self { label: None, stops: stops.into_iter().collect() }
    }
}

/// The via locations in the order the search meets them
#[derive(Debug, Clone, Default)]
pub(crate) struct ViaStops {
    locations: Vec<HashSet<StopId>>,
}

impl ViaStops {
    pub fn new(locations: &[ViaLocation], direction: SearchDirection) -> Self {
        let mut locations = locations.iter()
            .map(|location| location.stops.iter().copied().collect::<HashSet<_>>())
            .collect::<Vec<_>>();
        // a reverse search meets the last one first
        if !direction.is_forward() {
            locations.reverse();
        }
        Self { locations }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Number of locations visited after arriving at `stop` with `visited` locations behind
    pub fn visit(&self, visited: usize, stop: StopId) -> usize {
        match self.locations.get(visited) {
            Some(next) if next.contains(&stop) => visited + 1,
            _ => visited,
        }
    }

    pub fn is_complete(&self, visited: usize) -> bool {
        visited >= self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locations() -> Vec<ViaLocation> {
        vec![ViaLocation::new([StopId(1), StopId(2)]), ViaLocation::new([StopId(4)])]
    }

    #[test]
    fn test_visit_in_order() {
        let via = ViaStops::new(&locations(), SearchDirection::Forward);

        assert_eq!(via.visit(0, StopId(4)), 0);
        assert_eq!(via.visit(0, StopId(2)), 1);
        assert_eq!(via.visit(1, StopId(1)), 1);
        assert_eq!(via.visit(1, StopId(4)), 2);
        assert_eq!(via.visit(2, StopId(4)), 2);
        assert!(!via.is_complete(1));
        assert!(via.is_complete(2));
    }

    #[test]
    fn test_reverse_visits_last_location_first() {
        let via = ViaStops::new(&locations(), SearchDirection::Reverse);

        assert_eq!(via.visit(0, StopId(1)), 0);
        assert_eq!(via.visit(0, StopId(4)), 1);
        assert_eq!(via.visit(1, StopId(1)), 2);
    }

    #[test]
    fn test_no_via_is_always_complete() {
        let via = ViaStops::default();
        assert_eq!(via.visit(0, StopId(3)), 0);
        assert!(via.is_complete(0));
    }

    #[test]
    fn test_parse_via_location() {
        let location: ViaLocation = serde_json::from_str(r#"{ "label": "B", "stops": [1, 2] }"#).unwrap();
        assert_eq!(location.label.as_deref(), Some("B"));
        assert_eq!(location.stops, vec![StopId(1), StopId(2)]);
    }
}
