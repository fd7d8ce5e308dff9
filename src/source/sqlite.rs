use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags};

use crate::error::FetchError;
use crate::nav::model::{ColumnInfo, Field, Row, TableSchema};
use crate::source::DatabaseReader;

/// Reads SQLite files without ever writing to them.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteReader;

fn open(path: &Path) -> Result<Connection, FetchError> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| FetchError::read(path, e))
}

/// Quote an identifier for interpolation into SQL.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn table_names(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "
        SELECT name
        FROM sqlite_master
        WHERE type = 'table'
          AND name NOT LIKE 'sqlite_%'
        ORDER BY name ASC
        ",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    rows.collect()
}

fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_identifier(table)))?;
    let rows = stmt.query_map([], |row| {
        Ok(ColumnInfo {
            name: row.get(1)?,
            decl_type: row.get(2)?,
        })
    })?;
    rows.collect()
}

fn row_count(conn: &Connection, table: &str) -> rusqlite::Result<usize> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_identifier(table)),
        [],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as usize)
}

fn field(value: ValueRef<'_>) -> Field {
    match value {
        ValueRef::Null => Field::Null,
        ValueRef::Integer(v) => Field::Integer(v),
        ValueRef::Real(v) => Field::Real(v),
        ValueRef::Text(v) => Field::Text(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => Field::Blob(v.to_vec()),
    }
}

impl DatabaseReader for SqliteReader {
    fn list_tables(&self, path: &Path) -> Result<Vec<TableSchema>, FetchError> {
        let conn = open(path)?;
        let err = |e: rusqlite::Error| FetchError::read(path, e);
        let mut tables = Vec::new();
        for name in table_names(&conn).map_err(err)? {
            let columns = table_columns(&conn, &name).map_err(err)?;
            let row_count = row_count(&conn, &name).map_err(err)?;
            tables.push(TableSchema {
                name,
                columns,
                row_count,
            });
        }
        Ok(tables)
    }

    /// At most `limit` rows starting at `offset`; fewer at the end of the
    /// table, none past it.
    fn fetch_rows(
        &self,
        path: &Path,
        table: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Row>, FetchError> {
        let conn = open(path)?;
        let err = |e: rusqlite::Error| FetchError::read(path, e);
        let mut stmt = conn
            .prepare(&format!(
                "SELECT * FROM {} LIMIT ?1 OFFSET ?2",
                quote_identifier(table)
            ))
            .map_err(err)?;
        let width = stmt.column_count();
        let rows = stmt
            .query_map(params![limit as i64, offset as i64], |row| {
                (0..width)
                    .map(|i| row.get_ref(i).map(field))
                    .collect::<rusqlite::Result<Row>>()
            })
            .map_err(err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(err)
    }
}
