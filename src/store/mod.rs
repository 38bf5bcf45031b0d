//! Relational store backed by a single SQLite file.
//!
//! Every write replaces the whole table (drop and recreate inside one
//! transaction). The handle is opened per run and passed by reference to the
//! components that need it.

pub mod convert;

use crate::error::{PipelineError, Result};
use convert::{ColumnBuffer, SqlType};
use itertools::Itertools;
use polars::prelude::*;
use rusqlite::types::FromSql;
use rusqlite::{params_from_iter, Connection, Row};
use std::path::Path;
use tracing::{debug, info};

pub struct Store {
    conn: Connection,
}

pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl Store {
    /// Open or create the store file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        info!("Opened store {}", path.display());
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Replace `table` with the contents of `frame`. Returns rows written.
    ///
    /// A frame the store cannot represent fails with `SchemaLoad` and leaves
    /// any previous copy of the table untouched.
    pub fn replace_table(&mut self, table: &str, frame: &DataFrame) -> Result<usize> {
        let mut columns = Vec::with_capacity(frame.width());
        for series in frame.get_columns() {
            let sql_type = SqlType::for_dtype(series.dtype()).ok_or_else(|| {
                PipelineError::schema_load(
                    table,
                    format!("column {} has unsupported type {}", series.name(), series.dtype()),
                )
            })?;
            columns.push((series.name().to_string(), sql_type));
        }
        if columns.is_empty() {
            return Err(PipelineError::schema_load(table, "frame has no columns"));
        }

        let create_sql = format!(
            "CREATE TABLE {} ({})",
            quote_ident(table),
            columns
                .iter()
                .map(|(name, sql_type)| format!("{} {}", quote_ident(name), sql_type.decl()))
                .join(", ")
        );
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            columns.iter().map(|(name, _)| quote_ident(name)).join(", "),
            (1..=columns.len()).map(|i| format!("?{}", i)).join(", ")
        );

        let tx = self.conn.transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)), [])?;
        tx.execute(&create_sql, [])
            .map_err(|e| PipelineError::schema_load(table, e))?;
        {
            let mut stmt = tx.prepare(&insert_sql)?;
            let series = frame.get_columns();
            let mut values = Vec::with_capacity(series.len());
            for row in 0..frame.height() {
                values.clear();
                for s in series {
                    let value = convert::to_sql_value(s.get(row)?).map_err(|reason| {
                        PipelineError::schema_load(table, format!("column {}: {}", s.name(), reason))
                    })?;
                    values.push(value);
                }
                stmt.execute(params_from_iter(values.iter()))?;
            }
        }
        tx.commit()?;

        debug!("Wrote {} rows x {} columns to {}", frame.height(), columns.len(), table);
        Ok(frame.height())
    }

    /// Read a stored table back into a typed frame.
    pub fn read_table(&self, table: &str) -> Result<DataFrame> {
        let columns = self.table_columns(table)?;
        if columns.is_empty() {
            return Err(PipelineError::TableNotFound(table.to_string()));
        }

        let mut buffers: Vec<ColumnBuffer> = columns
            .iter()
            .map(|(_, sql_type)| ColumnBuffer::new(*sql_type))
            .collect();

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM {}",
            columns.iter().map(|(name, _)| quote_ident(name)).join(", "),
            quote_ident(table)
        ))?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            for (idx, buffer) in buffers.iter_mut().enumerate() {
                buffer.push(row.get_ref(idx)?);
            }
        }

        let series = columns
            .iter()
            .zip(buffers)
            .map(|((name, _), buffer)| buffer.into_series(name))
            .collect::<PolarsResult<Vec<_>>>()?;
        Ok(DataFrame::new(series)?)
    }

    /// Column names and declared types, in table order.
    fn table_columns(&self, table: &str) -> Result<Vec<(String, SqlType)>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
        let columns = stmt
            .query_map([], |row| {
                let name: String = row.get(1)?;
                let decl: String = row.get(2)?;
                Ok((name, SqlType::from_decl(&decl)))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }

    pub fn table_names(&self) -> Result<Vec<String>> {
        self.query(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
            |row| row.get(0),
        )
    }

    pub fn has_table(&self, table: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn row_count(&self, table: &str) -> Result<usize> {
        if !self.has_table(table)? {
            return Err(PipelineError::TableNotFound(table.to_string()));
        }
        let count: i64 =
            self.query_scalar(&format!("SELECT COUNT(*) FROM {}", quote_ident(table)))?;
        Ok(count as usize)
    }

    /// Run a read query and map every row.
    pub fn query<T, F>(&self, sql: &str, map: F) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        debug!("Query: {}", sql.split_whitespace().join(" "));
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map([], map)?
            .collect::<rusqlite::Result<Vec<T>>>()?;
        Ok(rows)
    }

    /// Run a query that returns a single value.
    pub fn query_scalar<T: FromSql>(&self, sql: &str) -> Result<T> {
        Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
    }

    /// Raw statement execution, used for fixtures and maintenance.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}
