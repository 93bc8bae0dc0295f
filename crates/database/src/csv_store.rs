use crate::DbError;
use crate::repository::{filter_rows, LedgerStore, Revision, StoreSnapshot};
use core_types::{Owner, RawRow};
use csv::{ByteRecord, ReaderBuilder, Trim, WriterBuilder};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// A shared ledger kept in a single CSV file with `owner,date,amount` columns.
///
/// The revision is a digest of the file contents, so an edit made by anyone
/// else, including another process, shows up as a conflict on the next save.
/// A missing file is an empty store at [`Revision::INITIAL`].
#[derive(Debug)]
pub struct CsvLedgerStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<StoreSnapshot, DbError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Ledger file does not exist yet.");
                return Ok(StoreSnapshot::default());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(StoreSnapshot {
            rows: decode_rows(&bytes)?,
            revision: digest(&bytes),
        })
    }
}

impl LedgerStore for CsvLedgerStore {
    fn load(&self, owner: Option<&Owner>) -> Result<StoreSnapshot, DbError> {
        let snapshot = self.read_all()?;
        Ok(StoreSnapshot {
            rows: filter_rows(snapshot.rows, owner),
            revision: snapshot.revision,
        })
    }

    fn save(&self, rows: &[RawRow], expected: Revision) -> Result<Revision, DbError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let current = self.read_all()?.revision;
        if current != expected {
            tracing::warn!(%expected, actual = %current, path = %self.path.display(), "Refusing to overwrite a ledger that changed.");
            return Err(DbError::Conflict {
                expected,
                actual: current,
            });
        }

        let bytes = encode_rows(rows)?;

        // Write beside the target and rename, so readers never see a half-written
        // file. A staging file that is never persisted is deleted on drop.
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staging = NamedTempFile::new_in(directory)?;
        staging.write_all(&bytes)?;
        staging
            .persist(&self.path)
            .map_err(|e| DbError::Io(e.error))?;

        let revision = digest(&bytes);
        tracing::info!(rows = rows.len(), %revision, path = %self.path.display(), "Saved ledger.");
        Ok(revision)
    }
}

/// Positions of the `owner`, `date` and `amount` columns in the header row.
#[derive(Debug, Default)]
struct Columns {
    owner: Option<usize>,
    date: Option<usize>,
    amount: Option<usize>,
}

impl Columns {
    /// Matches header names case-insensitively, accepting the spreadsheet
    /// names `User` and `Cashflow`. The first matching column wins.
    fn locate(headers: &ByteRecord) -> Self {
        let mut columns = Columns::default();
        for (index, header) in headers.iter().enumerate() {
            let name = String::from_utf8_lossy(header);
            let name = name.trim_start_matches('\u{feff}').trim().to_ascii_lowercase();
            let slot = match name.as_str() {
                "owner" | "user" => &mut columns.owner,
                "date" => &mut columns.date,
                "amount" | "cashflow" => &mut columns.amount,
                _ => continue,
            };
            slot.get_or_insert(index);
        }
        columns
    }

    /// Reads one record. Missing cells are empty strings.
    fn row(&self, record: &ByteRecord) -> RawRow {
        let cell = |column: Option<usize>| {
            column
                .and_then(|index| record.get(index))
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                .unwrap_or_default()
        };
        RawRow {
            owner: cell(self.owner),
            date: cell(self.date),
            amount: cell(self.amount),
        }
    }
}

/// Decodes every record of the file. Short, long or non-UTF-8 rows are kept
/// as they are; judging them is the ledger's job.
fn decode_rows(bytes: &[u8]) -> Result<Vec<RawRow>, DbError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);
    let columns = Columns::locate(reader.byte_headers()?);

    let mut rows = Vec::new();
    let mut record = ByteRecord::new();
    while reader.read_byte_record(&mut record)? {
        rows.push(columns.row(&record));
    }
    Ok(rows)
}

fn encode_rows(rows: &[RawRow]) -> Result<Vec<u8>, DbError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    if rows.is_empty() {
        writer.write_record(["owner", "date", "amount"])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| DbError::Io(e.into_error()))
}

fn digest(bytes: &[u8]) -> Revision {
    let hash = Sha256::digest(bytes);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash[..8]);
    Revision(u64::from_be_bytes(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_an_empty_store() {
        let dir = tempdir().unwrap();
        let store = CsvLedgerStore::new(dir.path().join("ledger.csv"));
        let snapshot = store.load(None).unwrap();
        assert!(snapshot.rows.is_empty());
        assert_eq!(snapshot.revision, Revision::INITIAL);
    }

    #[test]
    fn save_then_load_preserves_rows_and_order() {
        let dir = tempdir().unwrap();
        let store = CsvLedgerStore::new(dir.path().join("ledger.csv"));
        let rows = vec![
            RawRow::new("bob", "2023-01-02", "-200"),
            RawRow::new("alice", "2023-01-01", "-100.50"),
            RawRow::new("alice", "not a date", "x"),
        ];

        let revision = store.save(&rows, Revision::INITIAL).unwrap();
        let snapshot = store.load(None).unwrap();
        assert_eq!(snapshot.rows, rows);
        assert_eq!(snapshot.revision, revision);

        let alice = store.load(Some(&Owner::new("alice").unwrap())).unwrap();
        assert_eq!(alice.rows.len(), 2);
        assert_eq!(alice.revision, revision);
    }

    #[test]
    fn reads_spreadsheet_style_headers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        fs::write(
            &path,
            "User,Date,Cashflow\nalice, 2023-01-01 ,-3000\nalice,2024-01-01\n",
        )
        .unwrap();

        let rows = CsvLedgerStore::new(&path).load(None).unwrap().rows;
        assert_eq!(
            rows,
            vec![
                RawRow::new("alice", "2023-01-01", "-3000"),
                RawRow::new("alice", "2024-01-01", ""),
            ]
        );
    }

    #[test]
    fn short_rows_do_not_break_the_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        fs::write(
            &path,
            "owner,date,amount\nalice,2023-01-01,-3000\nalice,2024-01-01,3600\nbob,2024-02-01\n",
        )
        .unwrap();

        let store = CsvLedgerStore::new(&path);
        let rows = store.load(None).unwrap().rows;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], RawRow::new("bob", "2024-02-01", ""));

        let alice = store.load(Some(&Owner::new("alice").unwrap())).unwrap();
        assert_eq!(alice.rows.len(), 2);
    }

    #[test]
    fn reordered_extra_and_invalid_utf8_columns_are_tolerated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        let mut contents = b"Amount,Note,Owner,Date\n-10,first,alice,2023-01-01,surplus\n".to_vec();
        contents.extend_from_slice(b"5,\xff,alice,2023-02-01\n");
        fs::write(&path, contents).unwrap();

        let rows = CsvLedgerStore::new(&path).load(None).unwrap().rows;
        assert_eq!(
            rows,
            vec![
                RawRow::new("alice", "2023-01-01", "-10"),
                RawRow::new("alice", "2023-02-01", "5"),
            ]
        );
    }

    #[test]
    fn saves_leave_no_staging_files_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        let store = CsvLedgerStore::new(&path);
        assert_eq!(store.path(), path.as_path());

        let revision = store
            .save(&[RawRow::new("alice", "2023-01-01", "-1")], Revision::INITIAL)
            .unwrap();
        store.save(&[], revision).unwrap();
        assert!(store.save(&[], revision).is_err());

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("ledger.csv")]);
    }

    #[test]
    fn external_edit_causes_a_conflict() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        let store = CsvLedgerStore::new(&path);
        let revision = store
            .save(&[RawRow::new("alice", "2023-01-01", "-1")], Revision::INITIAL)
            .unwrap();

        fs::write(&path, "owner,date,amount\nbob,2023-01-01,-5\n").unwrap();

        let err = store.save(&[], revision).unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
        assert_eq!(store.load(None).unwrap().rows.len(), 1);
    }

    #[test]
    fn saving_nothing_still_writes_a_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        let store = CsvLedgerStore::new(&path);
        let revision = store.save(&[], Revision::INITIAL).unwrap();
        assert_ne!(revision, Revision::INITIAL);
        assert_eq!(fs::read_to_string(&path).unwrap(), "owner,date,amount\n");
        assert!(store.load(None).unwrap().rows.is_empty());
    }
}
