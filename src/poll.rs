pub mod config_reader;
pub mod handlers;
mod io_common;
mod io_csv;
mod io_excel;

use log::{error, info};

use breed_poll::response_log::ResponseLog;
use breed_poll::*;
use snafu::{prelude::*, Snafu};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use std::sync::Arc;

use crate::args::Args;
use crate::poll::config_reader::*;
use crate::poll::handlers::{build_router, AppState};
use crate::poll::io_common::CatalogProvider;

#[derive(Debug, Snafu)]
pub enum ServiceError {
    #[snafu(display("Error opening catalog {path}"))]
    OpeningCatalog { source: csv::Error, path: String },
    #[snafu(display("Error reading catalog {path} at line {lineno}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Catalog {path} has no {column:?} column"))]
    MissingCatalogColumn { column: String, path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet found in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("No worksheet named {name:?} in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("Unexpected cell at line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: usize, content: String },
    #[snafu(display("Unknown catalog provider {provider:?} (expected csv or xlsx)"))]
    UnknownProvider { provider: String },
    #[snafu(display("Invalid catalog {path}: {source}"))]
    InvalidCatalog { source: PollError, path: String },

    #[snafu(display("Error opening config file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing config file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Invalid value {value:?} for {name}"))]
    InvalidSetting { name: String, value: String },
    #[snafu(display("Invalid bind address {value:?}"))]
    InvalidBindAddress {
        source: std::net::AddrParseError,
        value: String,
    },
    #[snafu(display("Cannot listen on {addr}"))]
    Bind {
        source: std::io::Error,
        addr: String,
    },
    #[snafu(display("Server error"))]
    Serve { source: std::io::Error },

    #[snafu(display("{source}"))]
    ResponseLogFailure { source: PollError },
    #[snafu(display("Background task failed"))]
    BlockingTask { source: tokio::task::JoinError },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::ResponseLogFailure {
                source: PollError::SchemaMismatch { .. },
            } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!("request failed ({}): {}", status, self);
        let msg = status.canonical_reason().unwrap_or("Error");
        (status, Json(json!({ "error": msg }))).into_response()
    }
}

/// Reads and validates the catalog. Any failure here is fatal.
pub fn load_catalog(settings: &Settings) -> ServiceResult<Catalog> {
    let path = settings.catalog_path.clone();
    let provider =
        io_common::catalog_provider(path.as_str(), settings.catalog_type.as_deref())?;
    info!("Attempting to read catalog {:?} ({:?})", path, provider);
    let records = match provider {
        CatalogProvider::Csv => io_csv::read_csv_catalog(path.as_str())?,
        CatalogProvider::Xlsx => io_excel::read_excel_catalog(
            path.as_str(),
            settings.excel_worksheet_name.as_deref(),
        )?,
    };

    let mut builder = builder::CatalogBuilder::new(settings.group_order);
    builder
        .add_records(&records)
        .context(InvalidCatalogSnafu { path: path.clone() })?;
    let catalog = builder.build().context(InvalidCatalogSnafu { path })?;
    info!(
        "Catalog: {} breeds in {} groups",
        catalog.all_breeds().len(),
        catalog.groups().len()
    );
    for (key, name) in catalog.group_keys() {
        info!("Group: {} -> {}", key, name);
    }
    Ok(catalog)
}

pub async fn run_server(settings: Settings) -> ServiceResult<()> {
    let catalog = load_catalog(&settings)?;
    let log = ResponseLog::new(settings.responses_path.clone(), settings.schema_policy);
    info!(
        "Response log: {:?} (schema policy {:?})",
        log.path(),
        log.policy()
    );

    let state = Arc::new(AppState { catalog, log });
    let app = build_router(state);

    let addr = settings.bind_address;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(BindSnafu {
            addr: addr.to_string(),
        })?;
    info!("Listening on {}", addr);
    axum::serve(listener, app).await.context(ServeSnafu {})
}

pub async fn run(args: &Args) -> ServiceResult<()> {
    let config = match args.config.as_deref() {
        Some(p) => Some(read_config(p)?),
        None => None,
    };
    let settings = resolve_settings(args, config)?;
    info!("settings: {:?}", settings);
    run_server(settings).await
}
