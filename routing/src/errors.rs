use crate::raptor::{SearchPhase, StopArrivals};
use crate::request::Profile;
use common::types::errors::UnknownStopIdError;
use common::types::StopId;
use serde::{Serialize, Serializer};
use std::fmt;
use std::fmt::Display;

pub type RaptorResult<O> = Result<O, RaptorError>;

#[derive(thiserror::Error, Debug)]
pub enum RaptorError {
    Config(#[from] ConfigError),
    Timeout(#[from] TimeoutError),
    Invariant(#[from] InvariantError),
}

impl RaptorError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RaptorError::Timeout(_))
    }
}

impl Display for RaptorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let err: &dyn Display = match self {
            RaptorError::Config(err) => err,
            RaptorError::Timeout(err) => err,
            RaptorError::Invariant(err) => err,
        };
        let prefix = match self {
            RaptorError::Config(_) => "Invalid search configuration",
            RaptorError::Timeout(_) => "Search aborted",
            RaptorError::Invariant(_) => "Internal error",
        };
        write!(f, "{}: {}", prefix, err)
    }
}

impl Serialize for RaptorError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Rejected before any round runs. Retrying the same request fails the same way.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MinTravelDurationWithSearchWindow,
    NoTimeBound,
    HeuristicsRequired,
    InvalidRoundLimit(i32),
    NoAccessPaths,
    NoEgressPaths,
    UnknownStop(#[from] UnknownStopIdError),
    NegativeDuration(StopId),
    DepartureAfterArrival,
    NegativeSearchWindow,
    OutsideDataWindow,
    InvalidOpeningHours(StopId),
    ViaSearchNotSupported(Profile),
    EmptyViaLocation(usize),
    ViaSearchWithoutWindow,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::MinTravelDurationWithSearchWindow => {
                write!(f, "The min-travel-duration profile only supports a single iteration, but a search window was given")
            }
            ConfigError::NoTimeBound => write!(f, "Either earliest departure time or latest arrival time is required"),
            ConfigError::HeuristicsRequired => {
                write!(f, "The search window or a time bound is missing, but heuristics are disabled")
            }
            ConfigError::InvalidRoundLimit(n) => write!(f, "Max number of transfers must not be negative, got {}", n),
            ConfigError::NoAccessPaths => write!(f, "At least one access path is required"),
            ConfigError::NoEgressPaths => write!(f, "At least one egress path is required"),
            ConfigError::UnknownStop(err) => write!(f, "{}", err),
            ConfigError::NegativeDuration(stop) => write!(f, "Access/egress path at stop {} has a negative duration", stop),
            ConfigError::DepartureAfterArrival => write!(f, "Earliest departure time is after latest arrival time"),
            ConfigError::NegativeSearchWindow => write!(f, "Search window must not be negative"),
            ConfigError::OutsideDataWindow => write!(f, "The requested time bounds lie outside the loaded timetable"),
            ConfigError::InvalidOpeningHours(stop) => {
                write!(f, "Access/egress path at stop {} closes before it opens", stop)
            }
            ConfigError::ViaSearchNotSupported(profile) => write!(f, "The {} profile does not support via stops", profile),
            ConfigError::EmptyViaLocation(i) => write!(f, "Via location {} has no stops", i),
            ConfigError::ViaSearchWithoutWindow => {
                write!(f, "A search with via stops needs its start time and search window, heuristics cannot derive them")
            }
        }
    }
}

/// Raised when the search timeout expires. Carries the best times computed so far, so callers can
/// still use them, e.g. as heuristics.
#[derive(thiserror::Error, Debug, Clone)]
pub struct TimeoutError {
    pub best_times: StopArrivals,
}

impl Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Search timed out ({} stops reached before the timeout)",
            self.best_times.reached_stops().count()
        )
    }
}

/// A data or logic defect. These are never recovered from.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantError {
    NegativeTransferDuration { from: StopId, to: StopId, duration: i32 },
    BackwardPhaseTransition { from: SearchPhase, to: SearchPhase },
    BrokenArrivalChain(StopId),
    ClosedAccessEgress(StopId),
}

impl Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InvariantError::NegativeTransferDuration { from, to, duration } => {
                write!(f, "Transfer {} -> {} has negative duration {}s", from, to, duration)
            }
            InvariantError::BackwardPhaseTransition { from, to } => {
                write!(f, "Search phase must not go back from {:?} to {:?}", from, to)
            }
            InvariantError::BrokenArrivalChain(stop) => {
                write!(f, "Arrival chain ending at stop {} does not start with an access arrival", stop)
            }
            InvariantError::ClosedAccessEgress(stop) => {
                write!(f, "The access or egress path at stop {} is closed when the journey needs it", stop)
            }
        }
    }
}
