// Primitives for reading CSV catalogs.

use log::debug;
use snafu::prelude::*;

use crate::poll::{io_common::find_column, *};

pub fn read_csv_catalog(path: &str) -> ServiceResult<Vec<CatalogRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context(OpeningCatalogSnafu { path })?;
    let header: Vec<String> = rdr
        .headers()
        .context(OpeningCatalogSnafu { path })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    debug!("read_csv_catalog: header: {:?}", header);

    let breed_idx = find_column(&header, "breed").context(MissingCatalogColumnSnafu {
        column: "breed",
        path,
    })?;
    let group_idx = find_column(&header, "group").context(MissingCatalogColumnSnafu {
        column: "group",
        path,
    })?;

    let mut res: Vec<CatalogRecord> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let record = CatalogRecord {
            breed: line.get(breed_idx).unwrap_or("").to_string(),
            group: line.get(group_idx).unwrap_or("").to_string(),
            lineno,
        };
        debug!("read_csv_catalog: {:?}", record);
        res.push(record);
    }
    Ok(res)
}
