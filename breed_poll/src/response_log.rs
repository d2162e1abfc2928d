// The append-only store of all the submissions.

use chrono::{Local, NaiveDateTime};
use log::{debug, info, warn};
use snafu::prelude::*;

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::*;

/// Formats a capture time the way it is stored in the log: ISO-8601, seconds.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// A CSV file accumulating one row per submission.
///
/// The file is created on the first append, together with its header. Rows are
/// never rewritten. All the appends going through the same `ResponseLog` are
/// serialized; writers in other processes are not coordinated with.
#[derive(Debug)]
pub struct ResponseLog {
    path: PathBuf,
    policy: SchemaPolicy,
    write_lock: Mutex<()>,
}

impl ResponseLog {
    pub fn new<P: Into<PathBuf>>(path: P, policy: SchemaPolicy) -> ResponseLog {
        ResponseLog {
            path: path.into(),
            policy,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> SchemaPolicy {
        self.policy
    }

    /// Records a submission, stamped with the current local time.
    pub fn append(&self, catalog: &Catalog, submission: &Submission) -> PollResult<ResponseRow> {
        self.append_at(catalog, submission, &Local::now().naive_local())
    }

    /// Records a submission with an explicit capture time.
    pub fn append_at(
        &self,
        catalog: &Catalog,
        submission: &Submission,
        ts: &NaiveDateTime,
    ) -> PollResult<ResponseRow> {
        let row = catalog.response_row(&format_timestamp(ts), submission);
        self.append_row(&row)?;
        Ok(row)
    }

    /// Appends exactly one row, writing the header first if the file is new.
    ///
    /// The bytes of the header and the row go out in a single write on a file
    /// opened in append mode, and are synced before returning.
    pub fn append_row(&self, row: &ResponseRow) -> PollResult<()> {
        let path = self.path_str();
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| WriterPoisonedSnafu {}.build())?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .context(LogOpenSnafu { path: path.clone() })?;
        let len = file
            .metadata()
            .context(LogOpenSnafu { path: path.clone() })?
            .len();

        let expected = row.columns();
        let mut records: Vec<Vec<String>> = Vec::new();
        if len == 0 {
            info!("append_row: creating response log {:?}", path);
            records.push(expected);
            records.push(row.values());
        } else {
            let found = self.read_header()?;
            if found == expected {
                records.push(row.values());
            } else {
                records.push(self.remap(row, expected, found)?);
            }
        }

        let mut bytes: Vec<u8> = Vec::new();
        let terminated = len == 0
            || ends_with_terminator(&mut file, len).context(LogOpenSnafu { path: path.clone() })?;
        if !terminated {
            warn!("append_row: {:?} does not end with a line break, adding one", path);
            bytes.push(b'\n');
        }
        bytes.extend(encode_records(&records)?);
        file.write_all(&bytes)
            .context(LogWriteSnafu { path: path.clone() })?;
        file.sync_data().context(LogWriteSnafu { path })?;
        debug!("append_row: wrote {} bytes", bytes.len());
        Ok(())
    }

    /// Reads the whole log. A log that was never written reads as empty.
    pub fn read_all(&self) -> PollResult<LogContents> {
        let path = self.path_str();
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("read_all: no response log at {:?} yet", path);
                return Ok(LogContents::default());
            }
            Err(e) => return Err(e).context(LogOpenSnafu { path }),
        };

        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        let columns: Vec<String> = rdr
            .headers()
            .context(LogReadSnafu { path: path.clone() })?
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut rows: Vec<HashMap<String, String>> = Vec::new();
        for record_r in rdr.records() {
            let record = record_r.context(LogReadSnafu { path: path.clone() })?;
            // Short rows are padded with empty cells, extra cells are dropped.
            let row: HashMap<String, String> = columns
                .iter()
                .enumerate()
                .map(|(idx, col)| (col.clone(), record.get(idx).unwrap_or("").to_string()))
                .collect();
            rows.push(row);
        }
        info!("read_all: {} rows, {} columns", rows.len(), columns.len());
        Ok(LogContents { columns, rows })
    }

    fn read_header(&self) -> PollResult<Vec<String>> {
        let path = self.path_str();
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .context(LogReadSnafu { path: path.clone() })?;
        let header = rdr.headers().context(LogReadSnafu { path })?;
        Ok(header.iter().map(|s| s.to_string()).collect())
    }

    // Lays the row out under a header that does not match the catalog.
    fn remap(
        &self,
        row: &ResponseRow,
        expected: Vec<String>,
        found: Vec<String>,
    ) -> PollResult<Vec<String>> {
        match self.policy {
            SchemaPolicy::Reject => SchemaMismatchSnafu {
                path: self.path_str(),
                expected,
                found,
            }
            .fail(),
            SchemaPolicy::MapByName => {
                for col in expected.iter().filter(|c| !found.contains(c)) {
                    warn!(
                        "append_row: column {:?} is not in the log header, dropping its value",
                        col
                    );
                }
                Ok(found
                    .iter()
                    .map(|col| row.value_for(col).unwrap_or("").to_string())
                    .collect())
            }
        }
    }

    fn path_str(&self) -> String {
        self.path.display().to_string()
    }
}

// Whether the last byte of a non-empty file closes a record.
fn ends_with_terminator(file: &mut File, len: u64) -> std::io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n' || last[0] == b'\r')
}

fn encode_records(records: &[Vec<String>]) -> PollResult<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for record in records {
        wtr.write_record(record).context(LogEncodeSnafu {})?;
    }
    wtr.into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
        .context(LogEncodeSnafu {})
}
