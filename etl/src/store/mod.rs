//! Relational store for the load stage (SQLite via rusqlite).
//!
//! [`Store::replace_tables`] drops and recreates each table and bulk-inserts
//! its rows, all inside one transaction. The transaction guard rolls back
//! when dropped, so an error on any table leaves the database as it was.

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, Transaction};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{LoadError, LoadResult};
use crate::logs::log_info;
use crate::models::{cell_text, Dataset};
use crate::report::TableLoad;

/// Upper bound on bound parameters per statement in bundled SQLite.
pub const MAX_BIND_PARAMS: usize = 32_766;

/// Where a connection string points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    Memory,
    File(PathBuf),
}

impl DatabaseTarget {
    /// Accepts `sqlite::memory:`, `sqlite://<path>`, `sqlite:<path>` or a
    /// bare path.
    pub fn parse(url: &str) -> LoadResult<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(LoadError::UnsupportedUrl(url.to_string()));
        }
        if url == "sqlite::memory:" || url == ":memory:" {
            return Ok(DatabaseTarget::Memory);
        }
        if let Some(rest) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")) {
            return Ok(DatabaseTarget::File(PathBuf::from(rest)));
        }
        if url.contains("://") {
            return Err(LoadError::UnsupportedUrl(url.to_string()));
        }
        Ok(DatabaseTarget::File(PathBuf::from(url)))
    }
}

/// Declared type of a loaded column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Text,
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
        })
    }
}

impl SqlType {
    /// Narrowest type holding every present cell; missing cells are ignored.
    pub fn infer<'a>(cells: impl Iterator<Item = &'a Value>) -> Self {
        let mut ty = SqlType::Integer;
        for cell in cells {
            let Some(text) = cell_text(cell) else { continue };
            let text = text.trim();
            if ty == SqlType::Integer && text.parse::<i64>().is_ok() {
                continue;
            }
            if text.parse::<f64>().is_ok_and(f64::is_finite) {
                ty = SqlType::Real;
            } else {
                return SqlType::Text;
            }
        }
        ty
    }

    fn bind(self, cell: &Value) -> SqlValue {
        let Some(text) = cell_text(cell) else {
            return SqlValue::Null;
        };
        match self {
            SqlType::Integer => text.trim().parse().map_or(SqlValue::Text(text), SqlValue::Integer),
            SqlType::Real => text.trim().parse().map_or(SqlValue::Text(text), SqlValue::Real),
            SqlType::Text => SqlValue::Text(text),
        }
    }
}

/// A dataset bound for a named table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub data: Dataset,
}

/// Open SQLite database.
pub struct Store {
    conn: Connection,
    url: String,
}

impl Store {
    /// Open the database a connection string names, creating the file (and
    /// its directory) if needed.
    pub fn open(url: &str) -> LoadResult<Self> {
        let conn = match DatabaseTarget::parse(url)? {
            DatabaseTarget::Memory => Connection::open_in_memory(),
            DatabaseTarget::File(path) => {
                create_parent(&path)?;
                Connection::open(&path)
            }
        }
        .map_err(|source| LoadError::Connect {
            url: url.to_string(),
            source,
        })?;

        Ok(Self {
            conn,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Replace every table, in order, inside one transaction.
    pub fn replace_tables(&mut self, tables: &[Table], chunk_size: usize) -> LoadResult<Vec<TableLoad>> {
        let tx = self.conn.transaction().map_err(LoadError::Transaction)?;

        let mut loaded = Vec::with_capacity(tables.len());
        for table in tables {
            log_info(format!("Loading {}...", table.name));
            let rows = replace_table(&tx, table, chunk_size).map_err(|source| LoadError::TableWrite {
                table: table.name.clone(),
                source,
            })?;
            loaded.push(TableLoad {
                table: table.name.clone(),
                rows,
            });
        }

        tx.commit().map_err(LoadError::Transaction)?;
        Ok(loaded)
    }
}

fn create_parent(path: &Path) -> LoadResult<()> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => std::fs::create_dir_all(parent).map_err(|source| LoadError::CreateDir {
            path: parent.to_path_buf(),
            source,
        }),
        None => Ok(()),
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn replace_table(tx: &Transaction<'_>, table: &Table, chunk_size: usize) -> rusqlite::Result<usize> {
    let data = &table.data;
    let name = quote_ident(&table.name);
    let types: Vec<SqlType> = (0..data.headers.len())
        .map(|i| SqlType::infer(data.column(i)))
        .collect();

    let column_defs: Vec<String> = data
        .headers
        .iter()
        .zip(&types)
        .map(|(h, ty)| format!("{} {}", quote_ident(h), ty))
        .collect();
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {name}; CREATE TABLE {name} ({});",
        column_defs.join(", ")
    ))?;

    if data.rows.is_empty() || data.headers.is_empty() {
        return Ok(0);
    }

    let width = data.headers.len();
    let rows_per_stmt = chunk_size.clamp(1, (MAX_BIND_PARAMS / width).max(1));
    let column_list: Vec<String> = data.headers.iter().map(|h| quote_ident(h)).collect();
    let row_placeholder = format!("({})", vec!["?"; width].join(", "));

    let mut written = 0;
    for chunk in data.rows.chunks(rows_per_stmt) {
        let sql = format!(
            "INSERT INTO {name} ({}) VALUES {}",
            column_list.join(", "),
            vec![row_placeholder.as_str(); chunk.len()].join(", ")
        );
        let params = chunk
            .iter()
            .flat_map(|row| row.iter().zip(&types).map(|(cell, ty)| ty.bind(cell)));
        let mut stmt = tx.prepare_cached(&sql)?;
        written += stmt.execute(params_from_iter(params))?;
    }
    Ok(written)
}
