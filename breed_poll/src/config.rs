// ********* Input data structures ***********

use serde::Serialize;
use snafu::Snafu;
use std::collections::HashMap;

/// Column holding the capture time of a submission.
pub const TIMESTAMP_COLUMN: &str = "timestamp";
/// Column holding the free-text name of the voter.
pub const NAME_COLUMN: &str = "Name";
/// Column holding the overall favorite.
pub const BEST_IN_SHOW_COLUMN: &str = "Best in Show";

/// Form key carrying the voter's name.
pub const PERSON_NAME_KEY: &str = "person_name";
/// Form key carrying the Best in Show pick.
pub const BEST_IN_SHOW_KEY: &str = "best_in_show";

/// One line of the catalog source, as parsed by the readers.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CatalogRecord {
    pub breed: String,
    pub group: String,
    /// Line number in the source, for error reporting. 1-based, header included.
    pub lineno: usize,
}

/// The order in which groups (and therefore form fields and log columns) appear.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum GroupOrder {
    /// Groups appear in the order of their first breed in the source.
    FirstSeen,
    /// Groups are sorted by display name.
    Alphabetical,
}

/// What to do when the response log already carries a header that does not
/// match the columns of the current catalog.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SchemaPolicy {
    /// Refuse the append. Nothing is written.
    Reject,
    /// Write the row in the existing header's column order, filling each column
    /// by name. Catalog columns missing from the header are dropped.
    MapByName,
}

/// One voter's picks, with every field explicitly named.
///
/// `group_picks` is indexed like `Catalog::groups`. A `None` entry is a
/// field the form did not send, and is written out as an empty cell.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Submission {
    pub person_name: Option<String>,
    pub group_picks: Vec<Option<String>>,
    pub best_in_show: Option<String>,
}

// ******** Output data structures *********

/// A fully resolved row of the response log.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResponseRow {
    pub timestamp: String,
    pub name: String,
    /// (group display name, chosen breed), in catalog order.
    pub picks: Vec<(String, String)>,
    pub best_in_show: String,
}

impl ResponseRow {
    /// The header matching this row: timestamp, Name, groups, Best in Show.
    pub fn columns(&self) -> Vec<String> {
        let mut cols = vec![TIMESTAMP_COLUMN.to_string(), NAME_COLUMN.to_string()];
        cols.extend(self.picks.iter().map(|(group, _)| group.clone()));
        cols.push(BEST_IN_SHOW_COLUMN.to_string());
        cols
    }

    /// The cell values, in the same order as `columns`.
    pub fn values(&self) -> Vec<String> {
        let mut vals = vec![self.timestamp.clone(), self.name.clone()];
        vals.extend(self.picks.iter().map(|(_, pick)| pick.clone()));
        vals.push(self.best_in_show.clone());
        vals
    }

    /// Looks up a cell by column name.
    pub fn value_for(&self, column: &str) -> Option<&str> {
        match column {
            TIMESTAMP_COLUMN => Some(self.timestamp.as_str()),
            NAME_COLUMN => Some(self.name.as_str()),
            BEST_IN_SHOW_COLUMN => Some(self.best_in_show.as_str()),
            _ => self
                .picks
                .iter()
                .find(|(group, _)| group == column)
                .map(|(_, pick)| pick.as_str()),
        }
    }
}

/// Everything stored in the response log, oldest row first.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize)]
pub struct LogContents {
    pub columns: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

impl LogContents {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }
}

// ********* Errors **********

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PollError {
    #[snafu(display("Catalog line {lineno}: breed {breed:?} is listed under both {first:?} and {second:?}"))]
    BreedInMultipleGroups {
        breed: String,
        first: String,
        second: String,
        lineno: usize,
    },
    #[snafu(display("Catalog line {lineno}: empty {column} cell"))]
    EmptyCatalogCell { column: String, lineno: usize },
    #[snafu(display("Groups {first:?} and {second:?} both normalize to the form key {key:?}"))]
    DuplicateGroupKey {
        key: String,
        first: String,
        second: String,
    },
    #[snafu(display("Group {name:?} (form key {key:?}) collides with a fixed column or form field"))]
    ReservedGroupName { name: String, key: String },
    #[snafu(display("The catalog contains no breeds"))]
    EmptyCatalog {},

    #[snafu(display("Error opening response log {path}"))]
    LogOpen {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing response log {path}"))]
    LogWrite {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error encoding a response row"))]
    LogEncode { source: csv::Error },
    #[snafu(display("Error reading response log {path}"))]
    LogRead { source: csv::Error, path: String },
    #[snafu(display(
        "Response log {path} has columns [{}] but the catalog expects [{}]",
        found.join(", "),
        expected.join(", ")
    ))]
    SchemaMismatch {
        path: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[snafu(display("The response log writer lock is poisoned"))]
    WriterPoisoned {},
}

pub type PollResult<T> = Result<T, PollError>;
