pub mod bootstrap_config;
mod config;
mod dataset;

use crate::config::load_config;
use crate::dataset::{load_request, load_timetable, DatasetError};
use bootstrap_config::BootstrapConfig;
use common::types::config::Config;
use common::util::logging;
use common::util::time::{format_duration, format_time};
use log::{error, info};
use rayon::ThreadPoolBuildError;
use routing::errors::RaptorError;
use routing::raptor::debug::LoggingDebugListener;
use routing::raptor::{RaptorResponse, RaptorService};
use std::fmt::{Display, Formatter};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(target: "main", "{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), RangoError> {
    let bootstrap_config = BootstrapConfig::read();

    logging::init(bootstrap_config.clone().log_level.into());
    print_startup_message();

    let Config::Version1 { timetable, raptor } = load_config(&bootstrap_config)?;

    let data = logging::run_with_spinner("main", "Loading timetable", || load_timetable(&timetable))?;

    let mut request = load_request(&bootstrap_config.request_file, raptor.max_number_of_transfers)?;
    if !request.debug.stops.is_empty() || !request.debug.path.is_empty() {
        request.debug.listeners.push(Arc::new(LoggingDebugListener));
    }

    let service = RaptorService::from_config(raptor)?;
    let response = logging::run_with_spinner("main", "Routing", || service.route(&request, &data))?;

    print_summary(&response);
    println!("{}", serde_json::to_string_pretty(&response).map_err(RangoError::Output)?);

    Ok(())
}

fn print_summary(response: &RaptorResponse) {
    if response.journeys.is_empty() {
        info!(target: "main", "No journey found");
    }
    for journey in &response.journeys {
        info!(
            target: "main",
            "{} -> {} ({}, {} transfers)",
            format_time(journey.departure()),
            format_time(journey.arrival()),
            format_duration(journey.duration()),
            journey.number_of_transfers()
        );
    }
}

fn print_startup_message() {
    info!("\n  _ __ __ _ _ __   __ _  ___  \n | '__/ _` | '_ \\ / _` |/ _ \\ \n | | | (_| | | | | (_| | (_) |\n |_|  \\__,_|_| |_|\\__, |\\___/ \n                  |___/       \n R A N G E   R A P T O R\n");
}

#[derive(thiserror::Error, Debug)]
pub enum RangoError {
    Config(#[from] config::ConfigError),
    Dataset(#[from] DatasetError),
    ThreadPool(#[from] ThreadPoolBuildError),
    Routing(#[from] RaptorError),
    Output(serde_json::Error),
}

impl Display for RangoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let err: &dyn Display = match self {
            RangoError::Config(err) => err,
            RangoError::Dataset(err) => err,
            RangoError::ThreadPool(err) => err,
            RangoError::Routing(err) => err,
            RangoError::Output(err) => err,
        };
        let prefix = match self {
            RangoError::Config(_) => "Reading config file",
            RangoError::Dataset(_) => "Loading timetable or request",
            RangoError::ThreadPool(_) => "Starting search threads",
            RangoError::Routing(_) => "Routing",
            RangoError::Output(_) => "Writing response",
        };
        write!(f, "{}: {}", prefix, err)
    }
}
