use crate::transit::{RoutePattern, TransitMode};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Generalized cost, in centi-seconds so reluctance factors can be applied without floats in the
/// hot loop.
pub type RaptorCost = i32;

/// Cost of one second of plain waiting/riding with a reluctance of 1.0
pub const COST_PER_SECOND: RaptorCost = 100;

pub fn to_raptor_cost(seconds: f64) -> RaptorCost {
    (seconds * COST_PER_SECOND as f64).round() as RaptorCost
}

/// Pure cost functions used by the multi-criteria search. Every component must be non-negative.
pub trait CostCalculator: Send + Sync {
    fn board_cost(&self, pattern: &RoutePattern) -> RaptorCost;

    fn transit_time_cost(&self, pattern: &RoutePattern, seconds: i32) -> RaptorCost;

    fn wait_cost(&self, seconds: i32) -> RaptorCost;

    /// Extra cost for `count` transfers
    fn transfer_cost(&self, count: u32) -> RaptorCost;

    fn walk_cost(&self, seconds: i32) -> RaptorCost;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostParameters {
    /// Seconds
    pub board_cost: i32,
    /// Seconds
    pub transfer_cost: i32,
    pub wait_reluctance: f64,
    pub walk_reluctance: f64,
    /// Modes not listed use a reluctance of 1.0
    pub transit_reluctance: HashMap<TransitMode, f64>,
}

impl Default for CostParameters {
    fn default() -> Self {
        Self {
            board_cost: 60,
            transfer_cost: 120,
            wait_reluctance: 0.8,
            walk_reluctance: 2.0,
            transit_reluctance: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DefaultCostCalculator {
    board_cost: RaptorCost,
    transfer_cost: RaptorCost,
    wait_factor: RaptorCost,
    walk_factor: RaptorCost,
    transit_factors: [RaptorCost; TransitMode::ALL.len()],
}

impl Default for DefaultCostCalculator {
    fn default() -> Self {
        Self::from(&CostParameters::default())
    }
}

impl From<&CostParameters> for DefaultCostCalculator {
    fn from(params: &CostParameters) -> Self {
        let mut transit_factors = [COST_PER_SECOND; TransitMode::ALL.len()];
        for mode in TransitMode::ALL {
            if let Some(reluctance) = params.transit_reluctance.get(&mode) {
                transit_factors[mode.ordinal()] = to_raptor_cost(reluctance.max(0.0));
            }
        }

        Self {
            board_cost: to_raptor_cost(params.board_cost.max(0) as f64),
            transfer_cost: to_raptor_cost(params.transfer_cost.max(0) as f64),
            wait_factor: to_raptor_cost(params.wait_reluctance.max(0.0)),
            walk_factor: to_raptor_cost(params.walk_reluctance.max(0.0)),
            transit_factors,
        }
    }
}

impl CostCalculator for DefaultCostCalculator {
    fn board_cost(&self, _pattern: &RoutePattern) -> RaptorCost {
        self.board_cost
    }

    fn transit_time_cost(&self, pattern: &RoutePattern, seconds: i32) -> RaptorCost {
        self.transit_factors[pattern.mode.ordinal()] * seconds.max(0)
    }

    fn wait_cost(&self, seconds: i32) -> RaptorCost {
        self.wait_factor * seconds.max(0)
    }

    fn transfer_cost(&self, count: u32) -> RaptorCost {
        self.transfer_cost * count as RaptorCost
    }

    fn walk_cost(&self, seconds: i32) -> RaptorCost {
        self.walk_factor * seconds.max(0)
    }
}
