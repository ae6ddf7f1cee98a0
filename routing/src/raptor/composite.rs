use crate::journey::Leg;
use crate::raptor::path::{DestinationArrivals, JourneyComparator};
use crate::raptor::RaptorResponse;
use hashbrown::HashSet;

/// Merges the response of a secondary data set into the primary one. A secondary journey with
/// the same legs as a primary journey is the same journey and dropped. What is left competes by
/// the profile's journey dominance.
pub(crate) fn merge(primary: RaptorResponse, secondary: RaptorResponse) -> RaptorResponse {
    let known: HashSet<&[Leg]> = primary.journeys.iter().map(|j| j.legs().as_slice()).collect();
    let additional = secondary.journeys.iter()
        .filter(|journey| !known.contains(journey.legs().as_slice()))
        .cloned()
        .collect::<Vec<_>>();

    let mut journeys = DestinationArrivals::new(JourneyComparator::new(primary.profile.is_multi_criteria()));
    journeys.extend(primary.journeys.iter().cloned());
    journeys.extend(additional);

    let mut journeys = journeys.into_vec();
    journeys.sort();
    RaptorResponse {
        journeys,
        statistics: primary.statistics.add(secondary.statistics),
        ..primary
    }
}
