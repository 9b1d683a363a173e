use std::path::PathBuf;

use chrono::NaiveDate;
use rusqlite::{Connection, ErrorCode, params};

use crate::types::{StoredUpdate, VaccineUpdate};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS updates (
    date TEXT PRIMARY KEY,
    criterion TEXT
);
"#;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("An update dated {0} is already stored")]
    Conflict(NaiveDate),
    #[error("Stored date is not ISO formatted: {0}")]
    CorruptDate(String),
    #[error("Unsupported database engine '{0}'. Expected a sqlite:/// URL or a file path")]
    UnsupportedEngine(String),
}

/// Where a connection string points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Memory,
    File(PathBuf),
}

impl Location {
    /// Accepts SQLAlchemy style `sqlite:///relative.db`, `sqlite:////absolute.db`,
    /// `sqlite://` for memory, or a bare path.
    pub fn from_engine(engine: &str) -> Result<Self, StoreError> {
        let engine = engine.trim();
        if engine == ":memory:" {
            return Ok(Location::Memory);
        }

        let Some((scheme, rest)) = engine.split_once("://") else {
            return Ok(Location::File(PathBuf::from(engine)));
        };
        if scheme != "sqlite" {
            return Err(StoreError::UnsupportedEngine(engine.to_string()));
        }

        match rest.strip_prefix('/') {
            None if rest.is_empty() => Ok(Location::Memory),
            Some("") | Some(":memory:") => Ok(Location::Memory),
            Some(path) => Ok(Location::File(PathBuf::from(path))),
            None => Err(StoreError::UnsupportedEngine(engine.to_string())),
        }
    }
}

pub struct UpdateStore {
    conn: Connection,
}

impl UpdateStore {
    pub fn open(engine: &str) -> Result<Self, StoreError> {
        let conn = match Location::from_engine(engine)? {
            Location::Memory => Connection::open_in_memory()?,
            Location::File(path) => {
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    std::fs::create_dir_all(parent)?;
                }
                log::debug!("Opening update store at {}", path.display());
                Connection::open(&path)?
            }
        };
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// The greatest stored date. ISO text sorts chronologically, so the
    /// ordering is done by SQLite.
    pub fn latest_date(&self) -> Result<Option<NaiveDate>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT date FROM updates ORDER BY date DESC LIMIT 1")?;
        let result = stmt.query_row([], |row| row.get::<_, String>(0));
        match result {
            Ok(raw) => Ok(Some(parse_stored_date(&raw)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn record(&self, update: &VaccineUpdate) -> Result<(), StoreError> {
        let result = self.conn.execute(
            "INSERT INTO updates(date, criterion) VALUES (?1, ?2)",
            params![update.date.format(DATE_FORMAT).to_string(), update.criterion],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Conflict(update.date))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Stored updates, newest first.
    pub fn history(&self, limit: Option<usize>) -> Result<Vec<StoredUpdate>, StoreError> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = self.conn.prepare(
            r#"
SELECT date, criterion
FROM updates
ORDER BY date DESC
LIMIT ?1
"#,
        )?;
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(date, criterion)| {
                parse_stored_date(&date).map(|date| StoredUpdate {
                    date,
                    criterion: criterion.unwrap_or_default(),
                })
            })
            .collect()
    }
}

fn parse_stored_date(raw: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| StoreError::CorruptDate(raw.into()))
}
