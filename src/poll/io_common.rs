use std::path::Path;

use crate::poll::*;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum CatalogProvider {
    Csv,
    Xlsx,
}

/// Picks the reader for a catalog: the explicit type if given, the file
/// extension otherwise. Unknown extensions are read as CSV.
pub fn catalog_provider(path: &str, explicit: Option<&str>) -> ServiceResult<CatalogProvider> {
    let provider = match explicit {
        Some(p) => p.to_lowercase(),
        None => Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_else(|| "csv".to_string()),
    };
    match provider.as_str() {
        "csv" => Ok(CatalogProvider::Csv),
        "xlsx" | "excel" => Ok(CatalogProvider::Xlsx),
        _ if explicit.is_none() => Ok(CatalogProvider::Csv),
        _ => UnknownProviderSnafu { provider }.fail(),
    }
}

/// The position of a named column in a header row.
pub fn find_column(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|h| h.trim() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_extension() {
        assert_eq!(
            catalog_provider("data/breeds.csv", None).unwrap(),
            CatalogProvider::Csv
        );
        assert_eq!(
            catalog_provider("data/Breeds.XLSX", None).unwrap(),
            CatalogProvider::Xlsx
        );
        assert_eq!(
            catalog_provider("data/breeds.txt", None).unwrap(),
            CatalogProvider::Csv
        );
    }

    #[test]
    fn explicit_provider_wins() {
        assert_eq!(
            catalog_provider("data/breeds.csv", Some("xlsx")).unwrap(),
            CatalogProvider::Xlsx
        );
        assert!(matches!(
            catalog_provider("data/breeds.csv", Some("parquet")),
            Err(ServiceError::UnknownProvider { .. })
        ));
    }

    #[test]
    fn columns_are_found_by_name() {
        let header: Vec<String> = vec!["id".into(), " group".into(), "breed".into()];
        assert_eq!(find_column(&header, "breed"), Some(2));
        assert_eq!(find_column(&header, "group"), Some(1));
        assert_eq!(find_column(&header, "size"), None);
    }
}
