use crate::bootstrap_config::BootstrapConfig;
use common::types::config::Config;
use log::info;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    IO(#[from] std::io::Error),
    Yaml(#[from] serde_yml::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let err: &dyn Display = match self {
            ConfigError::IO(err) => err,
            ConfigError::Yaml(err) => err,
        };
        write!(f, "{}", err)
    }
}

pub(super) fn load_config(bootstrap_config: &BootstrapConfig) -> Result<Config, ConfigError> {
    let path = Path::new(&bootstrap_config.config_file);

    let config = parse_config(File::open(path)?)?;
    info!(target: "main", "Config read successfully from '{path:?}'");

    Ok(config)
}

fn parse_config(reader: impl Read) -> Result<Config, ConfigError> {
    Ok(serde_yml::from_reader(reader)?)
}
