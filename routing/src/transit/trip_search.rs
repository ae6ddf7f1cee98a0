use crate::request::SearchDirection;
use crate::transit::TripSchedule;
use itertools::Either;

/// Binary search over the trips of one timetable.
///
/// The trips must be sorted so that no trip overtakes another, i.e. at every stop position both
/// arrival and departure times are non-decreasing with the trip index.
#[derive(Debug, Clone, Copy)]
pub struct TripScheduleSearch<'a> {
    trips: &'a [TripSchedule],
    direction: SearchDirection,
}

impl<'a> TripScheduleSearch<'a> {
    pub fn new(trips: &'a [TripSchedule], direction: SearchDirection) -> Self {
        Self { trips, direction }
    }

    /// Forward: the earliest trip departing from `stop_pos` at or after `time`.
    /// Reverse: the latest trip arriving at `stop_pos` at or before `time`.
    ///
    /// `bound` is the trip currently boarded on this route. Only trips better than it are
    /// considered, which keeps the cursor monotone while scanning along the pattern.
    pub fn search(&self, time: i32, stop_pos: usize, bound: Option<usize>) -> Option<usize> {
        match self.direction {
            SearchDirection::Forward => {
                let upper = bound.unwrap_or(self.trips.len()).min(self.trips.len());
                let idx = self.trips[..upper].partition_point(|trip| trip.departure(stop_pos) < time);
                (idx < upper).then_some(idx)
            }
            SearchDirection::Reverse => {
                let lower = bound.map_or(0, |b| b + 1).min(self.trips.len());
                let n = self.trips[lower..].partition_point(|trip| trip.arrival(stop_pos) <= time);
                (n > 0).then(|| lower + n - 1)
            }
        }
    }

    /// All trips boardable at `time`, ordered from best to worst: the first one is what `search`
    /// returns without a bound.
    pub fn candidates(&self, time: i32, stop_pos: usize) -> impl Iterator<Item = usize> {
        let len = self.trips.len();
        match self.direction {
            SearchDirection::Forward => {
                let start = self.trips.partition_point(|trip| trip.departure(stop_pos) < time);
                Either::Left(start..len)
            }
            SearchDirection::Reverse => {
                let end = self.trips.partition_point(|trip| trip.arrival(stop_pos) <= time);
                Either::Right((0..end).rev())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::TripId;

    fn trips() -> Vec<TripSchedule> {
        // Three trips over two stops, departing every 10 minutes
        (0..3).map(|i| TripSchedule {
            trip: TripId(i),
            arrivals: vec![100 + 600 * i as i32, 400 + 600 * i as i32],
            departures: vec![100 + 600 * i as i32, 400 + 600 * i as i32],
        }).collect()
    }

    #[test]
    fn test_forward_search() {
        let trips = trips();
        let search = TripScheduleSearch::new(&trips, SearchDirection::Forward);

        assert_eq!(search.search(0, 0, None), Some(0));
        assert_eq!(search.search(100, 0, None), Some(0));
        assert_eq!(search.search(101, 0, None), Some(1));
        assert_eq!(search.search(1300, 0, None), None);
        // Bounded by the trip already boarded
        assert_eq!(search.search(101, 0, Some(1)), None);
        assert_eq!(search.search(0, 0, Some(2)), Some(0));
    }

    #[test]
    fn test_reverse_search() {
        let trips = trips();
        let search = TripScheduleSearch::new(&trips, SearchDirection::Reverse);

        assert_eq!(search.search(2000, 1, None), Some(2));
        assert_eq!(search.search(1000, 1, None), Some(1));
        assert_eq!(search.search(399, 1, None), None);
        assert_eq!(search.search(2000, 1, Some(2)), None);
        assert_eq!(search.search(1000, 1, Some(0)), Some(1));
    }

    #[test]
    fn test_candidates() {
        let trips = trips();
        let forward = TripScheduleSearch::new(&trips, SearchDirection::Forward);
        assert_eq!(forward.candidates(650, 0).collect::<Vec<_>>(), vec![1, 2]);

        let reverse = TripScheduleSearch::new(&trips, SearchDirection::Reverse);
        assert_eq!(reverse.candidates(1000, 1).collect::<Vec<_>>(), vec![1, 0]);
    }
}
