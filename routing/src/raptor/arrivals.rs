use crate::errors::InvariantError;
use crate::request::access_egress::AccessEgress;
use crate::transit::constrained::TransferConstraint;
use crate::transit::cost::RaptorCost;
use crate::transit::TripRef;
use common::types::StopId;

/// Index of a `StopArrival` in its arena
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct ArrivalId(u32);

/// How a stop was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArrivalKind {
    Access {
        path: AccessEgress,
    },
    Transit {
        previous: ArrivalId,
        trip: TripRef,
        /// Positions in search order: the board position comes first
        board_pos: usize,
        alight_pos: usize,
        board_time: i32,
        constraint: Option<TransferConstraint>,
    },
    Transfer {
        previous: ArrivalId,
        from: StopId,
        duration: i32,
    },
}

/// Immutable record of reaching a stop. The records form a DAG through `previous`, rooted at
/// access arrivals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StopArrival {
    pub stop: StopId,
    pub round: usize,
    pub time: i32,
    /// Generalized cost, 0 for profiles without cost
    pub cost: RaptorCost,
    /// The Range Raptor iteration this arrival was found in
    pub iteration_departure: i32,
    pub kind: ArrivalKind,
}

impl StopArrival {
    pub fn previous(&self) -> Option<ArrivalId> {
        match self.kind {
            ArrivalKind::Access { .. } => None,
            ArrivalKind::Transit { previous, .. } | ArrivalKind::Transfer { previous, .. } => Some(previous),
        }
    }

    pub fn is_transit(&self) -> bool {
        matches!(self.kind, ArrivalKind::Transit { .. })
    }
}

/// Append-only storage of all arrivals of one worker. Records are never removed, so ids stay
/// valid even after the arrival lost its place in the best-times tables.
#[derive(Debug, Default)]
pub(crate) struct ArrivalArena {
    arrivals: Vec<StopArrival>,
}

impl ArrivalArena {
    pub fn push(&mut self, arrival: StopArrival) -> ArrivalId {
        debug_assert!(
            arrival.previous().is_none_or(|p| self.get(p).round <= arrival.round),
            "Round must not decrease along an arrival chain"
        );
        self.arrivals.push(arrival);
        ArrivalId(self.arrivals.len() as u32 - 1)
    }

    #[inline]
    pub fn get(&self, id: ArrivalId) -> &StopArrival {
        &self.arrivals[id.0 as usize]
    }

    /// The chain of arrivals from `last` back to its access arrival
    pub fn chain(&self, last: ArrivalId) -> Result<Vec<&StopArrival>, InvariantError> {
        let mut chain = vec![self.get(last)];
        while let Some(previous) = chain[chain.len() - 1].previous() {
            let arrival = self.get(previous);
            if chain.len() > self.arrivals.len() {
                return Err(InvariantError::BrokenArrivalChain(self.get(last).stop));
            }
            chain.push(arrival);
        }

        match chain.last() {
            Some(StopArrival { kind: ArrivalKind::Access { .. }, .. }) => Ok(chain),
            _ => Err(InvariantError::BrokenArrivalChain(self.get(last).stop)),
        }
    }

    pub fn len(&self) -> usize {
        self.arrivals.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Best arrival by transit in the round
    Transit = 0,
    /// Best arrival of any kind in the round
    Best = 1,
}

/// Arrival ids indexed by (round, stop, slot), the back-references of the standard profile
#[derive(Debug)]
pub(crate) struct ArrivalTable {
    number_of_stops: usize,
    slots: Vec<[Option<ArrivalId>; 2]>,
}

impl ArrivalTable {
    pub fn new(number_of_rounds: usize, number_of_stops: usize) -> Self {
        // round 0 plus one per transit leg
        Self { number_of_stops, slots: vec![[None; 2]; (number_of_rounds + 1) * number_of_stops] }
    }

    #[inline]
    pub fn get(&self, round: usize, stop: StopId, slot: Slot) -> Option<ArrivalId> {
        self.slots[round * self.number_of_stops + stop.idx()][slot as usize]
    }

    #[inline]
    pub fn set(&mut self, round: usize, stop: StopId, slot: Slot, id: ArrivalId) {
        self.slots[round * self.number_of_stops + stop.idx()][slot as usize] = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access(stop: u32, time: i32) -> StopArrival {
        StopArrival {
            stop: StopId(stop),
            round: 0,
            time,
            cost: 0,
            iteration_departure: 0,
            kind: ArrivalKind::Access { path: AccessEgress::new(StopId(stop), time) },
        }
    }

    #[test]
    fn test_chain_ends_at_access() {
        let mut arena = ArrivalArena::default();
        let first = arena.push(access(0, 60));
        let ride = arena.push(StopArrival {
            stop: StopId(1),
            round: 1,
            time: 600,
            cost: 0,
            iteration_departure: 0,
            kind: ArrivalKind::Transit {
                previous: first,
                trip: TripRef { route: 0, trip: 0 },
                board_pos: 0,
                alight_pos: 1,
                board_time: 120,
                constraint: None,
            },
        });
        let walk = arena.push(StopArrival {
            stop: StopId(2),
            round: 1,
            time: 700,
            cost: 0,
            iteration_departure: 0,
            kind: ArrivalKind::Transfer { previous: ride, from: StopId(1), duration: 100 },
        });

        let stops = arena.chain(walk).unwrap().iter().map(|a| a.stop).collect::<Vec<_>>();
        assert_eq!(stops, vec![StopId(2), StopId(1), StopId(0)]);
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn test_table_slots() {
        let mut table = ArrivalTable::new(2, 3);
        table.set(2, StopId(2), Slot::Best, ArrivalId(5));
        assert_eq!(table.get(2, StopId(2), Slot::Best), Some(ArrivalId(5)));
        assert_eq!(table.get(2, StopId(2), Slot::Transit), None);
        assert_eq!(table.get(1, StopId(2), Slot::Best), None);
    }
}
