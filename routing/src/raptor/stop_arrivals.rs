use crate::raptor::calculator::TransitCalculator;
use crate::request::SearchDirection;
use common::types::StopId;
use serde::Serialize;

/// Best arrival at the destination, over all egress paths and iterations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DestinationBest {
    /// Best arrival (forward) or departure (reverse) time at the destination
    pub time: i32,
    /// Fewest transfers among the arrivals at `time`
    pub number_of_transfers: u32,
    /// Shortest duration from an iteration's start to the destination
    pub min_travel_duration: i32,
}

/// Best times per stop. This is all the best-time and min-travel-duration profiles return, and
/// what a timeout hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopArrivals {
    direction: SearchDirection,
    best_times: Vec<Option<i32>>,
    best_transit_times: Vec<Option<i32>>,
    destination: Option<DestinationBest>,
}

impl StopArrivals {
    pub fn new(direction: SearchDirection, number_of_stops: usize) -> Self {
        Self {
            direction,
            best_times: vec![None; number_of_stops],
            best_transit_times: vec![None; number_of_stops],
            destination: None,
        }
    }

    pub(crate) fn from_parts(
        direction: SearchDirection,
        best_times: Vec<Option<i32>>,
        best_transit_times: Vec<Option<i32>>,
        destination: Option<DestinationBest>,
    ) -> Self {
        debug_assert_eq!(best_times.len(), best_transit_times.len());
        Self { direction, best_times, best_transit_times, destination }
    }

    pub fn direction(&self) -> SearchDirection {
        self.direction
    }

    pub fn best_time(&self, stop: StopId) -> Option<i32> {
        self.best_times.get(stop.idx()).copied().flatten()
    }

    pub fn best_transit_time(&self, stop: StopId) -> Option<i32> {
        self.best_transit_times.get(stop.idx()).copied().flatten()
    }

    pub fn reached_stops(&self) -> impl Iterator<Item = StopId> + '_ {
        self.best_times.iter()
            .enumerate()
            .filter(|(_, time)| time.is_some())
            .map(|(stop, _)| StopId(stop as u32))
    }

    pub fn destination(&self) -> Option<&DestinationBest> {
        self.destination.as_ref()
    }

    pub fn is_destination_reached(&self) -> bool {
        self.destination.is_some()
    }

    /// Combines the results of two workers of the same search. Commutative.
    pub fn merge(mut self, other: StopArrivals) -> StopArrivals {
        let calc = TransitCalculator::new(self.direction, None);
        let best = |a: Option<i32>, b: Option<i32>| match (a, b) {
            (Some(a), Some(b)) => Some(calc.best(a, b)),
            (a, b) => a.or(b),
        };

        for (mine, theirs) in self.best_times.iter_mut().zip(other.best_times) {
            *mine = best(*mine, theirs);
        }
        for (mine, theirs) in self.best_transit_times.iter_mut().zip(other.best_transit_times) {
            *mine = best(*mine, theirs);
        }

        self.destination = match (self.destination, other.destination) {
            (Some(a), Some(b)) => Some(merge_destination(&calc, a, b)),
            (a, b) => a.or(b),
        };
        self
    }
}

pub(crate) fn merge_destination(calc: &TransitCalculator, a: DestinationBest, b: DestinationBest) -> DestinationBest {
    let (time, number_of_transfers) = if calc.is_better(a.time, b.time) {
        (a.time, a.number_of_transfers)
    } else if calc.is_better(b.time, a.time) {
        (b.time, b.number_of_transfers)
    } else {
        (a.time, a.number_of_transfers.min(b.number_of_transfers))
    };

    DestinationBest {
        time,
        number_of_transfers,
        min_travel_duration: a.min_travel_duration.min(b.min_travel_duration),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_is_commutative() {
        let a = StopArrivals::from_parts(
            SearchDirection::Forward,
            vec![Some(100), None, Some(500)],
            vec![None, None, Some(500)],
            Some(DestinationBest { time: 500, number_of_transfers: 1, min_travel_duration: 400 }),
        );
        let b = StopArrivals::from_parts(
            SearchDirection::Forward,
            vec![Some(160), Some(300), Some(500)],
            vec![None, Some(300), Some(500)],
            Some(DestinationBest { time: 500, number_of_transfers: 0, min_travel_duration: 340 }),
        );

        let merged = a.clone().merge(b.clone());
        assert_eq!(merged, b.merge(a));
        assert_eq!(merged.best_time(StopId(0)), Some(100));
        assert_eq!(merged.best_transit_time(StopId(1)), Some(300));
        assert_eq!(merged.reached_stops().count(), 3);
        assert_eq!(
            merged.destination(),
            Some(&DestinationBest { time: 500, number_of_transfers: 0, min_travel_duration: 340 })
        );
    }

    #[test]
    fn test_reverse_merge_keeps_latest() {
        let a = StopArrivals::from_parts(SearchDirection::Reverse, vec![Some(100)], vec![None], None);
        let b = StopArrivals::from_parts(SearchDirection::Reverse, vec![Some(200)], vec![None], None);
        assert_eq!(a.merge(b).best_time(StopId(0)), Some(200));
    }
}
