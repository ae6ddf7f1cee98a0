use std::fmt;
use std::fmt::Display;

use common::types::StopId;
use serde::{Deserialize, Serialize};

/// A walking connection between two stops. Depending on the direction it is looked up in, `stop`
/// is the target (transfers from a stop) or the source (transfers to a stop).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transfer {
    pub stop: StopId,
    pub duration: i32,
}

/// Transfers indexed by both of their ends, so forward and reverse searches can look them up
/// without scanning.
#[derive(Debug, Clone, Default)]
pub struct TransferIndex {
    from: Vec<Vec<Transfer>>,
    to: Vec<Vec<Transfer>>,
}

impl TransferIndex {
    pub fn new(
        number_of_stops: usize,
        transfers: impl IntoIterator<Item = (StopId, StopId, i32)>,
    ) -> Result<Self, TransferError> {
        let mut from = vec![Vec::new(); number_of_stops];
        let mut to = vec![Vec::new(); number_of_stops];

        for (start, end, duration) in transfers {
            if start.idx() >= number_of_stops {
                return Err(TransferError::StopNotFound(start));
            }
            if end.idx() >= number_of_stops {
                return Err(TransferError::StopNotFound(end));
            }
            if duration < 0 {
                return Err(TransferError::NegativeDuration { start, end, duration });
            }
            // A transfer to the same stop never improves anything
            if start == end {
                continue;
            }

            from[start.idx()].push(Transfer { stop: end, duration });
            to[end.idx()].push(Transfer { stop: start, duration });
        }

        for transfers in from.iter_mut().chain(to.iter_mut()) {
            transfers.sort_by_key(|t| (t.stop, t.duration));
            transfers.dedup_by_key(|t| t.stop);
        }

        Ok(Self { from, to })
    }

    // All transfers that are possible from the starting stop. Never includes the stop itself.
    pub fn transfers_from(&self, stop: StopId) -> &[Transfer] {
        self.from.get(stop.idx()).map(Vec::as_slice).unwrap_or(&[])
    }

    // All transfers that end at the given stop. `Transfer::stop` is the source stop here.
    pub fn transfers_to(&self, stop: StopId) -> &[Transfer] {
        self.to.get(stop.idx()).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    StopNotFound(StopId),
    NegativeDuration { start: StopId, end: StopId, duration: i32 },
}

impl Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransferError::StopNotFound(stop) => write!(f, "Transfer references unknown stop {}", stop),
            TransferError::NegativeDuration { start, end, duration } => {
                write!(f, "Transfer {} -> {} has a negative duration ({}s)", start, end, duration)
            }
        }
    }
}
