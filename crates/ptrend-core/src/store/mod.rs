//! SQLite persistence for runs and their statistics.
//!
//! Runs are append-only. Their insertion order (`test_id`) is the canonical
//! column order of every comparison.

mod schema;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode};
use serde::Serialize;
use thiserror::Error;

use crate::align::ObservedSeries;
use crate::ingest::wpt::{WptReport, WptStatistic, WPT_FIELDS};
use crate::ingest::WptMetrics;
use crate::stats::StatisticRecord;

/// Errors produced by the run store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Test description '{0}' is not unique")]
    DuplicateDescription(String),

    #[error("Test description is empty")]
    EmptyDescription,

    #[error("Value of '{field}' does not fit in the database")]
    ValueOutOfRange { field: &'static str },
}

/// Source of a run's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    /// Load test transaction logs.
    Jmeter,
    /// WebPageTest page results.
    Wpt,
}

impl TestType {
    fn id(self) -> i64 {
        match self {
            TestType::Jmeter => 1,
            TestType::Wpt => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::Jmeter => "jmeter",
            TestType::Wpt => "wpt",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jmeter" => Ok(TestType::Jmeter),
            "wpt" => Ok(TestType::Wpt),
            other => Err(format!("unknown test type '{other}' (expected jmeter or wpt)")),
        }
    }
}

/// One recorded test execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Run {
    pub id: i64,
    pub description: String,
    pub test_type: TestType,
    /// Position among runs of the same type, starting at 0.
    pub order_index: usize,
}

/// Remove characters that are not allowed in run descriptions.
pub fn sanitize_description(description: &str) -> String {
    description.replace(',', "").trim().to_owned()
}

/// SQLite-backed store of runs and per-run statistics.
pub struct RunStore {
    conn: Connection,
}

impl fmt::Debug for RunStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunStore")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl RunStore {
    /// Open (or create) a database file and make sure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "Opened trends database");
        Self::initialize(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        for statement in schema::ALL {
            conn.execute_batch(statement)?;
        }
        Ok(Self { conn })
    }

    /// Register a new run.
    pub fn insert_run(&self, description: &str, test_type: TestType) -> Result<Run, StoreError> {
        insert_run(&self.conn, description, test_type)
    }

    /// Store statistic records for an existing run.
    pub fn insert_statistics(
        &self,
        run: &Run,
        records: &[StatisticRecord],
    ) -> Result<(), StoreError> {
        insert_statistics(&self.conn, run, records)
    }

    /// Store one WebPageTest metric set for an existing run.
    pub fn insert_wpt_metrics(
        &self,
        run: &Run,
        statistic: WptStatistic,
        metrics: &WptMetrics,
    ) -> Result<(), StoreError> {
        insert_wpt_metrics(&self.conn, run, statistic, metrics)
    }

    /// Register a load-test run together with all its records, atomically.
    pub fn record_run(
        &mut self,
        description: &str,
        records: &[StatisticRecord],
    ) -> Result<Run, StoreError> {
        let tx = self.conn.transaction()?;
        let run = insert_run(&tx, description, TestType::Jmeter)?;
        insert_statistics(&tx, &run, records)?;
        tx.commit()?;

        tracing::info!(
            run = %run.description,
            requests = records.len(),
            "Recorded load test run"
        );
        Ok(run)
    }

    /// Register a WebPageTest run with its three metric sets, atomically.
    pub fn record_wpt_run(&mut self, report: &WptReport) -> Result<Run, StoreError> {
        let tx = self.conn.transaction()?;
        let run = insert_run(&tx, &report.description(), TestType::Wpt)?;
        for statistic in WptStatistic::ALL {
            insert_wpt_metrics(&tx, &run, statistic, report.metrics(statistic))?;
        }
        tx.commit()?;

        tracing::info!(run = %run.description, "Recorded WebPageTest run");
        Ok(run)
    }

    /// Runs of one type in canonical (insertion) order.
    pub fn runs(&self, test_type: TestType) -> Result<Vec<Run>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT test_id, description FROM tests WHERE type_id = ?1 ORDER BY test_id ASC",
        )?;
        let runs = stmt
            .query_map(params![test_type.id()], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .enumerate()
            .map(|(order_index, row)| {
                row.map(|(id, description)| Run {
                    id,
                    description,
                    test_type,
                    order_index,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    /// Per-label series of statistic records, labels in lexicographic order
    /// and runs ascending within each label.
    pub fn request_series(
        &self,
        test_type: TestType,
    ) -> Result<Vec<ObservedSeries<StatisticRecord>>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT r.label, t.description, r.samples, r.average, r.median,
                    r.perc90, r.perc95, r.min, r.max
             FROM request_statistics AS r
             JOIN tests AS t ON r.test_id = t.test_id
             WHERE t.type_id = ?1
             ORDER BY r.label ASC, t.test_id ASC",
        )?;

        let rows = stmt.query_map(params![test_type.id()], |row| {
            let description: String = row.get(1)?;
            let record = StatisticRecord {
                label: row.get(0)?,
                sample_count: unsigned(row, 2)?,
                average: row.get(3)?,
                median: row.get(4)?,
                perc90: row.get(5)?,
                perc95: row.get(6)?,
                min: unsigned(row, 7)?,
                max: unsigned(row, 8)?,
            };
            Ok((description, record))
        })?;

        let mut series: Vec<ObservedSeries<StatisticRecord>> = Vec::new();
        for row in rows {
            let (description, record) = row?;
            match series.last_mut() {
                Some(current) if current.label == record.label => {
                    current.push(description, record);
                }
                _ => {
                    let mut next = ObservedSeries::new(record.label.clone());
                    next.push(description, record);
                    series.push(next);
                }
            }
        }
        Ok(series)
    }

    /// One series per WebPageTest metric for the given aggregate, labelled
    /// with the WebPageTest key.
    pub fn wpt_series(
        &self,
        statistic: WptStatistic,
    ) -> Result<Vec<ObservedSeries<f64>>, StoreError> {
        let columns = WPT_FIELDS
            .iter()
            .map(|(column, _)| format!("w.{column}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT t.description, {columns}
             FROM wpt_statistics AS w
             JOIN tests AS t ON w.test_id = t.test_id
             WHERE w.metric = ?1 AND t.type_id = ?2
             ORDER BY t.test_id ASC"
        );

        let mut series: Vec<ObservedSeries<f64>> = WPT_FIELDS
            .iter()
            .map(|(_, key)| ObservedSeries::new(*key))
            .collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![statistic.as_str(), TestType::Wpt.id()])?;
        while let Some(row) = rows.next()? {
            let description: String = row.get(0)?;
            for (i, s) in series.iter_mut().enumerate() {
                s.push(description.clone(), row.get::<_, f64>(i + 1)?);
            }
        }
        Ok(series)
    }
}

fn unsigned<T: TryFrom<i64>>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let value: i64 = row.get(idx)?;
    T::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, value))
}

fn signed<T: TryInto<i64>>(value: T, field: &'static str) -> Result<i64, StoreError> {
    value
        .try_into()
        .map_err(|_| StoreError::ValueOutOfRange { field })
}

fn insert_run(conn: &Connection, description: &str, test_type: TestType) -> Result<Run, StoreError> {
    let description = sanitize_description(description);
    if description.is_empty() {
        return Err(StoreError::EmptyDescription);
    }

    match conn.execute(
        "INSERT INTO tests (description, type_id) VALUES (?1, ?2)",
        params![description, test_type.id()],
    ) {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            return Err(StoreError::DuplicateDescription(description));
        }
        Err(e) => return Err(e.into()),
    }

    let id = conn.last_insert_rowid();
    let earlier: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tests WHERE type_id = ?1 AND test_id < ?2",
        params![test_type.id(), id],
        |row| row.get(0),
    )?;

    Ok(Run {
        id,
        description,
        test_type,
        order_index: usize::try_from(earlier).unwrap_or_default(),
    })
}

fn insert_statistics(
    conn: &Connection,
    run: &Run,
    records: &[StatisticRecord],
) -> Result<(), StoreError> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO request_statistics
            (test_id, label, samples, average, median, perc90, perc95, min, max)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    for r in records {
        stmt.execute(params![
            run.id,
            r.label,
            signed(r.sample_count, "samples")?,
            r.average,
            r.median,
            r.perc90,
            r.perc95,
            signed(r.min, "min")?,
            signed(r.max, "max")?,
        ])?;
    }
    Ok(())
}

fn insert_wpt_metrics(
    conn: &Connection,
    run: &Run,
    statistic: WptStatistic,
    metrics: &WptMetrics,
) -> Result<(), StoreError> {
    let columns = WPT_FIELDS
        .iter()
        .map(|(column, _)| *column)
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=WPT_FIELDS.len() + 2)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO wpt_statistics (test_id, metric, {columns}) VALUES ({placeholders})"
    );

    let mut values = Vec::with_capacity(WPT_FIELDS.len() + 2);
    values.push(Value::Integer(run.id));
    values.push(Value::Text(statistic.as_str().to_owned()));
    values.extend(metrics.values().into_iter().map(Value::Real));

    conn.execute(&sql, params_from_iter(values))?;
    Ok(())
}
