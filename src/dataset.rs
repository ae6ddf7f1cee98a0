use log::{debug, info};
use routing::request::input::RaptorRequestInput;
use routing::request::RaptorRequest;
use routing::transit::timetable::{Timetable, TimetableError, TimetableTransitData};
use serde::de::DeserializeOwned;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    IO(#[from] std::io::Error),
    Json(#[from] serde_json::Error),
    Yaml(#[from] serde_yml::Error),
    Timetable(#[from] TimetableError),
    UnsupportedFormat(String),
}

impl Display for DatasetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::IO(err) => write!(f, "{}", err),
            DatasetError::Json(err) => write!(f, "Invalid JSON: {}", err),
            DatasetError::Yaml(err) => write!(f, "Invalid YAML: {}", err),
            DatasetError::Timetable(err) => write!(f, "Invalid timetable: {}", err),
            DatasetError::UnsupportedFormat(path) => {
                write!(f, "Cannot tell the format of '{}', expected a .json, .yaml or .yml file", path)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Result<Self, DatasetError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            _ => Err(DatasetError::UnsupportedFormat(path.display().to_string())),
        }
    }

    fn parse<T: DeserializeOwned>(self, reader: impl Read) -> Result<T, DatasetError> {
        Ok(match self {
            Format::Json => serde_json::from_reader(reader)?,
            Format::Yaml => serde_yml::from_reader(reader)?,
        })
    }
}

/// Reads a timetable (JSON) and builds the in-memory transit data from it
pub(super) fn load_timetable(path: &str) -> Result<TimetableTransitData, DatasetError> {
    let file = BufReader::new(File::open(path)?);
    let timetable: Timetable = Format::Json.parse(file)?;
    debug!(
        target: "main",
        "Timetable '{}' has {} stops, {} routes, {} transfers",
        path, timetable.stops.len(), timetable.routes.len(), timetable.transfers.len()
    );

    let data = TimetableTransitData::try_from(timetable)?;
    info!(target: "main", "Timetable loaded from '{}'", path);
    Ok(data)
}

/// Reads a request file, JSON or YAML depending on its extension
pub(super) fn load_request(path: &str, default_max_transfers: i32) -> Result<RaptorRequest, DatasetError> {
    let path = Path::new(path);
    let format = Format::of(path)?;
    let input: RaptorRequestInput = format.parse(BufReader::new(File::open(path)?))?;
    Ok(input.into_request(default_max_transfers))
}
