use either::Either;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::OnceLock;

/// A time of the service day in seconds since its start (noon minus 12h). Values may exceed 24h for
/// trips running past midnight, and may be negative after time-shifting.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(try_from = "SerializedTime", into = "String")]
pub struct TimeOfDay(pub i32);

/// Serialized representation of a TimeOfDay
/// Either 28800 (seconds) or "08:00" / "08:00:00" (String)
#[derive(Debug, Deserialize, Clone)]
#[serde(transparent)]
struct SerializedTime {
    #[serde(with = "either::serde_untagged")]
    value: Either<i32, String>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub struct TimeFormatError(pub String);

impl Display for TimeFormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Wrong time format '{}'. Example of valid format: 08:15 or 25:10:30", self.0)
    }
}

impl TryFrom<SerializedTime> for TimeOfDay {
    type Error = TimeFormatError;

    fn try_from(value: SerializedTime) -> Result<Self, Self::Error> {
        match value.value {
            Either::Left(seconds) => Ok(Self(seconds)),
            Either::Right(text) => parse_time(&text).map(Self),
        }
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        format_time(value.0)
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_time(s).map(Self)
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_time(self.0))
    }
}

fn time_regex() -> Option<&'static Regex> {
    static REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^(\d{1,3}):(\d{2})(?::(\d{2}))?$").ok()).as_ref()
}

/// Parse "HH:MM" or "HH:MM:SS" into seconds. Hours are not limited to 23.
pub fn parse_time(value: &str) -> Result<i32, TimeFormatError> {
    let err = || TimeFormatError(value.to_string());
    let caps = time_regex().and_then(|regex| regex.captures(value.trim())).ok_or_else(err)?;

    let hours = i32::from_str(&caps[1]).map_err(|_| err())?;
    let minutes = i32::from_str(&caps[2]).map_err(|_| err())?;
    let seconds = caps.get(3)
        .map(|s| i32::from_str(s.as_str()))
        .transpose()
        .map_err(|_| err())?
        .unwrap_or(0);

    if minutes > 59 || seconds > 59 {
        return Err(err());
    }

    Ok(hours * 3600 + minutes * 60 + seconds)
}

/// Format seconds as "HH:MM:SS" (with a leading '-' for negative times)
pub fn format_time(time: i32) -> String {
    let sign = if time < 0 { "-" } else { "" };
    let abs = time.unsigned_abs();
    format!("{}{:02}:{:02}:{:02}", sign, abs / 3600, (abs / 60) % 60, abs % 60)
}

/// Format a duration in seconds in a compact human form, e.g. "1h05m" or "4m30s"
pub fn format_duration(seconds: i32) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let abs = seconds.unsigned_abs();
    let (h, m, s) = (abs / 3600, (abs / 60) % 60, abs % 60);
    match (h, s) {
        (0, 0) => format!("{sign}{m}m"),
        (0, _) => format!("{sign}{m}m{s:02}s"),
        (_, 0) => format!("{sign}{h}h{m:02}m"),
        _ => format!("{sign}{h}h{m:02}m{s:02}s"),
    }
}

/// Serialize a plain second count as "HH:MM:SS". Use with `#[serde(serialize_with = ..)]`.
pub fn serialize_time<S: Serializer>(time: &i32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_time(*time))
}
