use crate::args::Args;
use crate::poll::*;

use log::debug;
use snafu::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_CATALOG_PATH: &str = "data/dog_breeds_groups.csv";
pub const DEFAULT_RESPONSES_PATH: &str = "data/responses.csv";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5000";

/// The optional JSON configuration file.
///
/// Relative paths are resolved against the directory of the file.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(rename = "catalogPath")]
    pub catalog_path: Option<String>,
    #[serde(rename = "catalogType")]
    pub catalog_type: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "responsesPath")]
    pub responses_path: Option<String>,
    #[serde(rename = "bindAddress")]
    pub bind_address: Option<String>,
    #[serde(rename = "schemaPolicy")]
    pub schema_policy: Option<String>,
    #[serde(rename = "groupOrder")]
    pub group_order: Option<String>,
    #[serde(skip)]
    pub root_dir: Option<PathBuf>,
}

/// The resolved settings the service runs with.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Settings {
    pub catalog_path: String,
    pub catalog_type: Option<String>,
    pub excel_worksheet_name: Option<String>,
    pub responses_path: String,
    pub bind_address: SocketAddr,
    pub schema_policy: SchemaPolicy,
    pub group_order: GroupOrder,
}

pub fn read_config(path: &str) -> ServiceResult<PollConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let mut config: PollConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    config.root_dir = Path::new(path).parent().map(|p| p.to_path_buf());
    debug!("read_config: {:?}", config);
    Ok(config)
}

/// Command line first, then the config file, then the defaults.
pub fn resolve_settings(args: &Args, config: Option<PollConfig>) -> ServiceResult<Settings> {
    let config = config.unwrap_or_default();
    let in_config_dir = |p: &String| -> String {
        match &config.root_dir {
            Some(root) => root.join(p).display().to_string(),
            None => p.clone(),
        }
    };

    let catalog_path = args
        .catalog
        .clone()
        .or_else(|| config.catalog_path.as_ref().map(in_config_dir))
        .unwrap_or_else(|| DEFAULT_CATALOG_PATH.to_string());
    let responses_path = args
        .responses
        .clone()
        .or_else(|| config.responses_path.as_ref().map(in_config_dir))
        .unwrap_or_else(|| DEFAULT_RESPONSES_PATH.to_string());

    let bind = args
        .bind
        .clone()
        .or_else(|| config.bind_address.clone())
        .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
    let bind_address = bind
        .parse::<SocketAddr>()
        .context(InvalidBindAddressSnafu { value: bind.clone() })?;

    let schema_policy = match args
        .schema_policy
        .as_deref()
        .or(config.schema_policy.as_deref())
    {
        Some(s) => parse_schema_policy(s)?,
        None => SchemaPolicy::Reject,
    };
    let group_order = match args.group_order.as_deref().or(config.group_order.as_deref()) {
        Some(s) => parse_group_order(s)?,
        None => GroupOrder::FirstSeen,
    };

    Ok(Settings {
        catalog_path,
        catalog_type: args.catalog_type.clone().or_else(|| config.catalog_type.clone()),
        excel_worksheet_name: args
            .excel_worksheet_name
            .clone()
            .or_else(|| config.excel_worksheet_name.clone()),
        responses_path,
        bind_address,
        schema_policy,
        group_order,
    })
}

fn parse_schema_policy(s: &str) -> ServiceResult<SchemaPolicy> {
    match s {
        "reject" => Ok(SchemaPolicy::Reject),
        "map_by_name" | "mapByName" => Ok(SchemaPolicy::MapByName),
        _ => InvalidSettingSnafu {
            name: "schema policy",
            value: s,
        }
        .fail(),
    }
}

fn parse_group_order(s: &str) -> ServiceResult<GroupOrder> {
    match s {
        "first_seen" | "firstSeen" => Ok(GroupOrder::FirstSeen),
        "alphabetical" => Ok(GroupOrder::Alphabetical),
        _ => InvalidSettingSnafu {
            name: "group order",
            value: s,
        }
        .fail(),
    }
}
