use calamine::{open_workbook, DataType, Reader, Xlsx};
use log::debug;
use snafu::prelude::*;

use crate::poll::{io_common::find_column, *};

/// Reads a catalog from an Excel workbook.
///
/// The first row of the sheet is the header. The first sheet is used unless a
/// worksheet name is given.
pub fn read_excel_catalog(
    path: &str,
    worksheet_name: Option<&str>,
) -> ServiceResult<Vec<CatalogRecord>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };

    let mut iter = wrange.rows();
    let header: Vec<String> = iter
        .next()
        .context(EmptyExcelSnafu { path })?
        .iter()
        // Non-text header cells cannot name a column.
        .map(|cell| read_cell(cell, 1).unwrap_or_default())
        .collect();
    debug!("read_excel_catalog: header: {:?}", header);

    let breed_idx = find_column(&header, "breed").context(MissingCatalogColumnSnafu {
        column: "breed",
        path,
    })?;
    let group_idx = find_column(&header, "group").context(MissingCatalogColumnSnafu {
        column: "group",
        path,
    })?;

    let mut res: Vec<CatalogRecord> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let lineno = idx + 2;
        let breed = match row.get(breed_idx) {
            Some(cell) => read_cell(cell, lineno)?,
            None => String::new(),
        };
        let group = match row.get(group_idx) {
            Some(cell) => read_cell(cell, lineno)?,
            None => String::new(),
        };
        // Trailing blank rows are common in spreadsheets.
        if breed.is_empty() && group.is_empty() {
            debug!("read_excel_catalog: skipping blank line {}", lineno);
            continue;
        }
        res.push(CatalogRecord {
            breed,
            group,
            lineno,
        });
    }
    Ok(res)
}

fn read_cell(cell: &DataType, lineno: usize) -> ServiceResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        DataType::Empty => Ok(String::new()),
        _ => ExcelWrongCellTypeSnafu {
            lineno,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Sheets: "Breeds" (with a blank third row), "Numbers" (a numeric breed
    // cell) and "NoGroup" (header without a group column).
    const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/breeds.xlsx");

    #[test]
    fn reads_first_sheet_and_skips_blank_rows() {
        let records = read_excel_catalog(FIXTURE, None).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].breed, "Border Collie");
        assert_eq!(records[0].group, "Herding");
        assert_eq!(records[0].lineno, 2);
        assert_eq!(records[1].breed, "Poodle");
        assert_eq!(records[1].group, "Non-Sporting");
        assert_eq!(records[1].lineno, 4);
    }

    #[test]
    fn reads_named_sheet() {
        let records = read_excel_catalog(FIXTURE, Some("Breeds")).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn missing_worksheet() {
        assert!(matches!(
            read_excel_catalog(FIXTURE, Some("Cats")),
            Err(ServiceError::MissingWorksheet { .. })
        ));
    }

    #[test]
    fn header_without_group_column() {
        assert!(matches!(
            read_excel_catalog(FIXTURE, Some("NoGroup")),
            Err(ServiceError::MissingCatalogColumn { .. })
        ));
    }

    #[test]
    fn numeric_breed_cell() {
        assert!(matches!(
            read_excel_catalog(FIXTURE, Some("Numbers")),
            Err(ServiceError::ExcelWrongCellType { lineno: 2, .. })
        ));
    }

    #[test]
    fn missing_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.xlsx");
        assert!(matches!(
            read_excel_catalog(path.to_str().unwrap(), None),
            Err(ServiceError::OpeningExcel { .. })
        ));
    }

    #[test]
    fn cell_types() {
        assert_eq!(
            read_cell(&DataType::String("Pug".to_string()), 3).unwrap(),
            "Pug"
        );
        assert_eq!(read_cell(&DataType::Empty, 3).unwrap(), "");
        assert!(matches!(
            read_cell(&DataType::Float(1.5), 7),
            Err(ServiceError::ExcelWrongCellType { lineno: 7, .. })
        ));
        assert!(matches!(
            read_cell(&DataType::Bool(true), 7),
            Err(ServiceError::ExcelWrongCellType { .. })
        ));
    }
}
