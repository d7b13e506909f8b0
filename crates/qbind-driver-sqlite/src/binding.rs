//! Binding normalized queries to rusqlite statements

use std::time::Instant;

use qbind_core::{
    ColumnMeta, DataTransformer, QbindError, QueryResult, Result, Row, StatementResult, Value,
};
use qbind_query::NormalizedQuery;
use rusqlite::{Connection as RusqliteConnection, Statement};

/// Prepare and run a normalized statement, returning the affected row count.
pub(crate) fn execute(
    conn: &RusqliteConnection,
    normalized: &NormalizedQuery,
    transformer: &dyn DataTransformer,
) -> Result<StatementResult> {
    let start_time = Instant::now();

    let mut stmt = prepare(conn, normalized, transformer)?;
    let affected_rows = stmt
        .raw_execute()
        .map_err(|e| QbindError::Query(format!("Failed to execute statement: {}", e)))?;

    Ok(StatementResult {
        affected_rows: affected_rows as u64,
        execution_time_ms: start_time.elapsed().as_millis() as u64,
    })
}

/// Prepare and run a normalized query, collecting every row.
pub(crate) fn query(
    conn: &RusqliteConnection,
    normalized: &NormalizedQuery,
    transformer: &dyn DataTransformer,
) -> Result<QueryResult> {
    let start_time = Instant::now();

    let mut stmt = prepare(conn, normalized, transformer)?;

    let columns: Vec<ColumnMeta> = stmt
        .columns()
        .iter()
        .enumerate()
        .map(|(ordinal, col)| ColumnMeta {
            name: col.name().to_string(),
            // Declared type from CREATE TABLE, if the column maps to one
            data_type: col.decl_type().unwrap_or("DYNAMIC").to_string(),
            ordinal,
        })
        .collect();
    let column_names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();

    let mut rows = Vec::new();
    let mut query_rows = stmt.raw_query();
    while let Some(row) = query_rows
        .next()
        .map_err(|e| QbindError::Query(format!("Failed to fetch row: {}", e)))?
    {
        let mut values = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            values.push(transformer.decode(rusqlite_to_value(row, i)?));
        }
        rows.push(Row::new(column_names.clone(), values));
    }

    Ok(QueryResult {
        id: uuid::Uuid::new_v4(),
        columns,
        rows,
        affected_rows: 0,
        execution_time_ms: start_time.elapsed().as_millis() as u64,
    })
}

fn prepare<'c>(
    conn: &'c RusqliteConnection,
    normalized: &NormalizedQuery,
    transformer: &dyn DataTransformer,
) -> Result<Statement<'c>> {
    let mut stmt = conn
        .prepare(normalized.query())
        .map_err(|e| QbindError::Query(format!("Failed to prepare query: {}", e)))?;
    bind_parameters(&mut stmt, normalized, transformer)?;
    Ok(stmt)
}

/// Bind every normalized parameter to its `:name` slot.
fn bind_parameters(
    stmt: &mut Statement<'_>,
    normalized: &NormalizedQuery,
    transformer: &dyn DataTransformer,
) -> Result<()> {
    for (name, value) in normalized.parameters() {
        let placeholder = format!(":{}", name);
        let index = stmt
            .parameter_index(&placeholder)
            .map_err(|e| QbindError::Query(format!("Failed to resolve {}: {}", placeholder, e)))?
            .ok_or_else(|| {
                QbindError::Query(format!("Statement has no parameter named {}", placeholder))
            })?;

        let value = value_to_rusqlite(&transformer.encode(value))?;
        stmt.raw_bind_parameter(index, value)
            .map_err(|e| QbindError::Query(format!("Failed to bind {}: {}", placeholder, e)))?;
    }

    tracing::trace!(
        bound = normalized.parameters().len(),
        "parameters bound to statement"
    );
    Ok(())
}

/// Convert our Value types to rusqlite storage classes
pub(crate) fn value_to_rusqlite(value: &Value) -> Result<rusqlite::types::Value> {
    let value = match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(if *b { 1 } else { 0 }),
        Value::Int32(i) => rusqlite::types::Value::Integer(*i as i64),
        Value::Int64(i) => rusqlite::types::Value::Integer(*i),
        Value::Float32(f) => rusqlite::types::Value::Real(*f as f64),
        Value::Float64(f) => rusqlite::types::Value::Real(*f),
        Value::Decimal(d) => rusqlite::types::Value::Text(d.clone()),
        Value::String(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Bytes(b) => rusqlite::types::Value::Blob(b.clone()),
        Value::Json(j) => rusqlite::types::Value::Text(j.to_string()),
        // Normalization expands arrays, so one here came from a transformer
        Value::Array(_) => {
            return Err(QbindError::Query(
                "Array value cannot be bound to a single parameter".into(),
            ));
        }
    };

    Ok(value)
}

/// Convert rusqlite row value to our Value type
fn rusqlite_to_value(row: &rusqlite::Row, idx: usize) -> Result<Value> {
    use rusqlite::types::ValueRef;

    let value_ref = row
        .get_ref(idx)
        .map_err(|e| QbindError::Query(e.to_string()))?;

    let value = match value_ref {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int64(i),
        ValueRef::Real(f) => Value::Float64(f),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    };

    Ok(value)
}
