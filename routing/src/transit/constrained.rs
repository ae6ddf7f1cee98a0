use crate::transit::{RouteIndex, TripRef};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// A rule attached to a transfer between two specific trips or routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TransferConstraint {
    /// The connecting trip waits for the feeder
    Guaranteed,
    /// The rider stays in the vehicle, the two trips are operated as one
    StaySeated,
    /// Replaces the generic minimum transfer time of the stop
    MinWaitTime { seconds: i32 },
    NotAllowed,
}

impl TransferConstraint {
    pub fn is_not_allowed(&self) -> bool {
        matches!(self, TransferConstraint::NotAllowed)
    }

    /// Guaranteed and stay-seated transfers are made no matter how short they are
    pub fn ignores_min_transfer_time(&self) -> bool {
        matches!(self, TransferConstraint::Guaranteed | TransferConstraint::StaySeated)
    }
}

pub trait ConstrainedTransferSearch: Send + Sync {
    /// The constraint for transferring from `from_trip` (alighting at `from_stop_pos`) to `to_trip`
    /// (boarding at `to_stop_pos`). Arguments are always in real time order, for both search
    /// directions.
    fn lookup(
        &self,
        from_trip: TripRef,
        from_stop_pos: usize,
        to_trip: TripRef,
        to_stop_pos: usize,
    ) -> Option<TransferConstraint>;

    /// Cheap pre-check, so the boarding search only looks up constraints where some exist
    fn has_constraints_to(&self, _route: RouteIndex, _stop_pos: usize) -> bool {
        true
    }

    /// Same pre-check as `has_constraints_to`, for the side a reverse search boards from
    fn has_constraints_from(&self, _route: RouteIndex, _stop_pos: usize) -> bool {
        true
    }
}

/// One side of a constrained transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPoint {
    Trip { trip: TripRef, stop_pos: usize },
    Route { route: RouteIndex, stop_pos: usize },
}

impl TransferPoint {
    fn route(&self) -> RouteIndex {
        match self {
            TransferPoint::Trip { trip, .. } => trip.route,
            TransferPoint::Route { route, .. } => *route,
        }
    }

    fn stop_pos(&self) -> usize {
        match self {
            TransferPoint::Trip { stop_pos, .. } | TransferPoint::Route { stop_pos, .. } => *stop_pos,
        }
    }

    fn matches(&self, trip: TripRef, stop_pos: usize) -> bool {
        match self {
            TransferPoint::Trip { trip: t, stop_pos: p } => *t == trip && *p == stop_pos,
            TransferPoint::Route { route, stop_pos: p } => *route == trip.route && *p == stop_pos,
        }
    }

    fn specificity(&self) -> u8 {
        match self {
            TransferPoint::Trip { .. } => 2,
            TransferPoint::Route { .. } => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstrainedTransfer {
    pub from: TransferPoint,
    pub to: TransferPoint,
    pub constraint: TransferConstraint,
}

impl ConstrainedTransfer {
    // trip-to-trip beats trip-to-route beats route-to-trip beats route-to-route
    fn specificity(&self) -> u8 {
        self.from.specificity() * 2 + self.to.specificity()
    }
}

/// In-memory constraint lookup, indexed by the boarding side
#[derive(Debug, Clone, Default)]
pub struct ConstrainedTransfers {
    by_target: HashMap<(RouteIndex, usize), Vec<ConstrainedTransfer>>,
    sources: HashMap<(RouteIndex, usize), usize>,
}

impl ConstrainedTransfers {
    pub fn new(transfers: impl IntoIterator<Item = ConstrainedTransfer>) -> Self {
        let mut by_target: HashMap<(RouteIndex, usize), Vec<ConstrainedTransfer>> = HashMap::new();
        let mut sources: HashMap<(RouteIndex, usize), usize> = HashMap::new();

        for transfer in transfers {
            *sources.entry((transfer.from.route(), transfer.from.stop_pos())).or_default() += 1;
            by_target.entry((transfer.to.route(), transfer.to.stop_pos()))
                .or_default()
                .push(transfer);
        }

        Self { by_target, sources }
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_target.values().map(Vec::len).sum()
    }
}

impl ConstrainedTransferSearch for ConstrainedTransfers {
    fn lookup(
        &self,
        from_trip: TripRef,
        from_stop_pos: usize,
        to_trip: TripRef,
        to_stop_pos: usize,
    ) -> Option<TransferConstraint> {
        let candidates = self.by_target.get(&(to_trip.route, to_stop_pos))?;

        let mut best: Option<&ConstrainedTransfer> = None;
        for transfer in candidates {
            if transfer.from.matches(from_trip, from_stop_pos) && transfer.to.matches(to_trip, to_stop_pos) {
                // On equal specificity the first registered constraint wins
                if best.is_none_or(|b| transfer.specificity() > b.specificity()) {
                    best = Some(transfer);
                }
            }
        }
        best.map(|t| t.constraint)
    }

    fn has_constraints_to(&self, route: RouteIndex, stop_pos: usize) -> bool {
        self.by_target.contains_key(&(route, stop_pos))
    }

    fn has_constraints_from(&self, route: RouteIndex, stop_pos: usize) -> bool {
        self.sources.contains_key(&(route, stop_pos))
    }
}
