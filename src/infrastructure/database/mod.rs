//! SQLite-backed sleep store

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use crate::application::errors::StoreError;
use crate::domain::entities::{ClosedInterval, RecordId, SleepRecord, User, UserId, UserState};
use crate::domain::rules::{elapsed_secs, Quality, Refusal};
use crate::domain::traits::{AverageScope, Averages, Registration, SleepStore, StoreResult};

const RECORD_COLUMNS: &str =
    "record_id, user_id, sleep_time, wake_time, duration, quality, notes";

/// Columns that can be annotated after a record is closed
#[derive(Debug, Clone, Copy)]
enum Annotation {
    Quality,
    Notes,
}

impl Annotation {
    fn column(self) -> &'static str {
        match self {
            Annotation::Quality => "quality",
            Annotation::Notes => "notes",
        }
    }

    fn is_set(self, record: &SleepRecord) -> bool {
        match self {
            Annotation::Quality => record.quality.is_some(),
            Annotation::Notes => record.notes.is_some(),
        }
    }
}

/// Single-writer SQLite store.
///
/// One connection behind a mutex; every mutation runs in an `IMMEDIATE`
/// transaction so other processes sharing the file are serialised too.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let db = Self { conn: Mutex::new(conn) };
        db.init_tables()?;
        Ok(db)
    }

    fn init_tables(&self) -> StoreResult<()> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                current_record INTEGER DEFAULT NULL REFERENCES sleep_records(record_id),
                is_asleep BOOLEAN NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS sleep_records (
                record_id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                sleep_time DATETIME NOT NULL,
                wake_time DATETIME DEFAULT NULL,
                duration FLOAT DEFAULT NULL,
                quality INTEGER DEFAULT NULL,
                notes TEXT DEFAULT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sleep_records_user_wake
                ON sleep_records(user_id, wake_time);",
        )?;
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&conn)
    }

    /// Runs `f` in a write transaction; an `Err` from `f` rolls everything back
    fn write<T>(&self, f: impl FnOnce(&Transaction<'_>) -> StoreResult<T>) -> StoreResult<T> {
        let mut conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    fn annotate(&self, user: UserId, field: Annotation, value: &dyn ToSql, guarded: bool) -> StoreResult<()> {
        self.write(|tx| {
            let user = registered(tx, user)?;
            let state = UserState::of(Some(&user));
            if guarded && state.is_asleep() {
                return Err(Refusal::NotAwake.into());
            }
            let record = match user.current_record {
                Some(id) => load_record(tx, id)?,
                None => None,
            }
            .ok_or(Refusal::NoRecord)?;
            if guarded && field.is_set(&record) {
                return Err(Refusal::AlreadySet.into());
            }

            let sql = format!("UPDATE sleep_records SET {} = ?1 WHERE record_id = ?2", field.column());
            let args: [&dyn ToSql; 2] = [value, &record.id.0];
            tx.execute(&sql, &args[..])?;
            tracing::debug!("Set {} on record {} for user {}", field.column(), record.id, user.id);
            Ok(())
        })
    }
}

fn load_user(conn: &Connection, id: UserId) -> StoreResult<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, name, current_record, is_asleep FROM users WHERE id = ?1",
            [id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    current_record: row.get::<_, Option<i64>>(2)?.map(RecordId),
                    is_asleep: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

fn registered(conn: &Connection, id: UserId) -> StoreResult<User> {
    load_user(conn, id)?.ok_or_else(|| Refusal::NotRegistered.into())
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<SleepRecord> {
    Ok(SleepRecord {
        id: RecordId(row.get(0)?),
        user_id: row.get(1)?,
        sleep_time: row.get(2)?,
        wake_time: row.get(3)?,
        duration_secs: row.get(4)?,
        quality: row.get::<_, Option<i64>>(5)?.map(Quality::from_stored),
        notes: row.get(6)?,
    })
}

fn load_record(conn: &Connection, id: RecordId) -> StoreResult<Option<SleepRecord>> {
    let record = conn
        .query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM sleep_records WHERE record_id = ?1"),
            [id.0],
            record_from_row,
        )
        .optional()?;
    Ok(record)
}

impl SleepStore for Database {
    fn register_user(&self, id: UserId, name: &str) -> StoreResult<Registration> {
        self.write(|tx| {
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO users (id, name) VALUES (?1, ?2)",
                params![id, name],
            )?;
            Ok(if inserted > 0 {
                Registration::Created
            } else {
                Registration::AlreadyExists
            })
        })
    }

    fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        self.read(|conn| load_user(conn, id))
    }

    fn record(&self, id: RecordId) -> StoreResult<Option<SleepRecord>> {
        self.read(|conn| load_record(conn, id))
    }

    fn begin_sleep(&self, user: UserId, at: NaiveDateTime) -> StoreResult<RecordId> {
        self.write(|tx| {
            let user = registered(tx, user)?;
            if UserState::of(Some(&user)).is_asleep() {
                return Err(Refusal::AlreadyAsleep.into());
            }

            tx.execute(
                "INSERT INTO sleep_records (user_id, sleep_time) VALUES (?1, ?2)",
                params![user.id, at],
            )?;
            let record = RecordId(tx.last_insert_rowid());
            tx.execute(
                "UPDATE users SET current_record = ?1, is_asleep = 1 WHERE id = ?2",
                params![record.0, user.id],
            )?;
            Ok(record)
        })
    }

    fn end_sleep(&self, user: UserId, at: NaiveDateTime) -> StoreResult<ClosedInterval> {
        self.write(|tx| {
            let user = registered(tx, user)?;
            let UserState::Asleep { open_record: record } = UserState::of(Some(&user)) else {
                return Err(Refusal::NotAsleep.into());
            };
            let sleep_time = load_record(tx, record)?
                .filter(SleepRecord::is_open)
                .map(|open| open.sleep_time)
                .ok_or_else(|| {
                    StoreError::Corrupt(format!("user {} points at missing open record {}", user.id, record))
                })?;

            let duration_secs = elapsed_secs(sleep_time, at);
            tx.execute(
                "UPDATE sleep_records SET wake_time = ?1, duration = ?2 WHERE record_id = ?3",
                params![at, duration_secs, record.0],
            )?;
            tx.execute("UPDATE users SET is_asleep = 0 WHERE id = ?1", [user.id])?;

            Ok(ClosedInterval {
                record,
                sleep_time,
                wake_time: at,
                duration_secs,
            })
        })
    }

    fn set_quality(&self, user: UserId, quality: Quality) -> StoreResult<()> {
        self.annotate(user, Annotation::Quality, &quality.value(), true)
    }

    fn set_notes(&self, user: UserId, notes: &str) -> StoreResult<()> {
        self.annotate(user, Annotation::Notes, &notes, true)
    }

    fn force_set_quality(&self, user: UserId, quality: Quality) -> StoreResult<()> {
        self.annotate(user, Annotation::Quality, &quality.value(), false)
    }

    fn force_set_notes(&self, user: UserId, notes: &str) -> StoreResult<()> {
        self.annotate(user, Annotation::Notes, &notes, false)
    }

    fn discard_open_record(&self, user: UserId) -> StoreResult<bool> {
        self.write(|tx| {
            let user = registered(tx, user)?;
            let record = match UserState::of(Some(&user)) {
                UserState::Asleep { open_record } => open_record,
                // A just-closed record can be taken back until it is annotated
                UserState::Awake { last_record: Some(last) } => match load_record(tx, last)? {
                    Some(closed) if !closed.is_open() && !closed.is_annotated() => last,
                    _ => return Ok(false),
                },
                UserState::Awake { last_record: None } | UserState::Unregistered => return Ok(false),
            };

            // Unlink first so the foreign key never dangles
            tx.execute(
                "UPDATE users SET current_record = NULL, is_asleep = 0 WHERE id = ?1",
                [user.id],
            )?;
            let deleted = tx.execute("DELETE FROM sleep_records WHERE record_id = ?1", [record.0])?;
            tracing::debug!("Discarded record {} for user {}", record, user.id);
            Ok(deleted > 0)
        })
    }

    fn averages(&self, scope: AverageScope) -> StoreResult<Averages> {
        self.read(|conn| {
            let map = |row: &Row<'_>| {
                Ok(Averages {
                    duration_secs: row.get(0)?,
                    quality: row.get(1)?,
                })
            };
            let averages = match scope {
                // Durations exist only on closed rows; any rated row counts for quality
                AverageScope::Global => conn.query_row(
                    "SELECT AVG(duration), AVG(quality) FROM sleep_records",
                    [],
                    map,
                )?,
                AverageScope::User(id) => conn.query_row(
                    "SELECT AVG(duration), AVG(quality) FROM sleep_records WHERE user_id = ?1",
                    [id],
                    map,
                )?,
            };
            Ok(averages)
        })
    }

    fn records_on_date(&self, user: UserId, date: NaiveDate) -> StoreResult<Vec<SleepRecord>> {
        let Some(next_day) = date.succ_opt() else {
            return Ok(Vec::new());
        };
        let from = date.and_time(NaiveTime::MIN);
        let until = next_day.and_time(NaiveTime::MIN);

        self.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM sleep_records
                 WHERE user_id = ?1 AND wake_time IS NOT NULL
                   AND wake_time >= ?2 AND wake_time < ?3
                 ORDER BY wake_time, record_id"
            ))?;
            let rows = stmt.query_map(params![user, from, until], record_from_row)?;

            let mut records = Vec::new();
            for record in rows {
                records.push(record?);
            }
            Ok(records)
        })
    }
}
