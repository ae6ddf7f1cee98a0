use crate::transit::cost::{CostCalculator, RaptorCost};
use common::types::StopId;
use common::util::time::TimeOfDay;
use hashbrown::HashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A path between the origin (or destination) and a stop of the transit network, computed by a
/// street search outside of Raptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessEgress {
    pub stop: StopId,
    /// Seconds
    pub duration: i32,
    /// Generalized cost. Derived from the walk reluctance if not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<RaptorCost>,
    /// The path can only be started within these hours, e.g. a bike rental or a parking lot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<OpeningHours>,
}

/// Both ends included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OpeningHours {
    pub open: TimeOfDay,
    pub close: TimeOfDay,
}

impl AccessEgress {
    pub fn new(stop: StopId, duration: i32) -> Self {
        Self { stop, duration, cost: None, opening_hours: None }
    }

    pub fn with_cost(stop: StopId, duration: i32, cost: RaptorCost) -> Self {
        Self { stop, duration, cost: Some(cost), opening_hours: None }
    }

    pub fn with_opening_hours(self, open: i32, close: i32) -> Self {
        Self { opening_hours: Some(OpeningHours { open: TimeOfDay(open), close: TimeOfDay(close) }), ..self }
    }

    /// Earliest start at or after `time`. None if the path is closed for the rest of the day.
    pub fn earliest_start(&self, time: i32) -> Option<i32> {
        match self.opening_hours {
            None => Some(time),
            Some(hours) if time > hours.close.0 => None,
            Some(hours) => Some(time.max(hours.open.0)),
        }
    }

    /// Latest start at or before `time`. None if the path has not opened yet.
    pub fn latest_start(&self, time: i32) -> Option<i32> {
        match self.opening_hours {
            None => Some(time),
            Some(hours) if time < hours.open.0 => None,
            Some(hours) => Some(time.min(hours.close.0)),
        }
    }

    pub fn generalized_cost(&self, calculator: &dyn CostCalculator) -> RaptorCost {
        self.cost.unwrap_or_else(|| calculator.walk_cost(self.duration))
    }

    fn dominates(&self, other: &AccessEgress, calculator: &dyn CostCalculator) -> bool {
        let cost = self.generalized_cost(calculator);
        let other_cost = other.generalized_cost(calculator);
        self.duration <= other.duration && cost <= other_cost && (self.duration < other.duration || cost < other_cost)
    }
}

/// Keeps the fastest path per stop and opening hours. Ties are broken by cost, then by order.
/// With `multi_criteria` all paths non-dominated on (duration, cost) survive.
fn dedupe(paths: &[AccessEgress], multi_criteria: bool, calculator: &dyn CostCalculator) -> Vec<AccessEgress> {
    // paths open at different hours are not comparable
    let groups = paths.iter().copied().into_group_map_by(|p| (p.stop, p.opening_hours));

    groups.into_iter()
        .sorted_by_key(|(key, _)| *key)
        .flat_map(|(_, paths)| {
            if multi_criteria {
                let unique = paths.iter().copied().unique().collect_vec();
                unique.iter()
                    .filter(|p| !unique.iter().any(|other| other.dominates(p, calculator)))
                    .copied()
                    .collect_vec()
            } else {
                // min_by_key returns the first of equal elements
                paths.into_iter()
                    .min_by_key(|p| (p.duration, p.generalized_cost(calculator)))
                    .into_iter()
                    .collect_vec()
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct AccessPaths {
    paths: Vec<AccessEgress>,
}

impl AccessPaths {
    pub fn new(paths: &[AccessEgress], multi_criteria: bool, calculator: &dyn CostCalculator) -> Self {
        Self { paths: dedupe(paths, multi_criteria, calculator) }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccessEgress> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EgressPaths {
    by_stop: HashMap<StopId, Vec<AccessEgress>>,
}

impl EgressPaths {
    pub fn new(paths: &[AccessEgress], multi_criteria: bool, calculator: &dyn CostCalculator) -> Self {
        let by_stop = dedupe(paths, multi_criteria, calculator).into_iter().into_group_map_by(|p| p.stop);
        Self { by_stop: by_stop.into_iter().collect() }
    }

    /// All egress paths leaving the network at `stop`
    pub fn at(&self, stop: StopId) -> &[AccessEgress] {
        self.by_stop.get(&stop).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn stops(&self) -> impl Iterator<Item = StopId> + '_ {
        self.by_stop.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.by_stop.is_empty()
    }
}
