use serde::Serialize;
use sqlx::PgPool;

use crate::model::{CompletedCall, SimTime};

/// Load completed calls into Postgres using COPY FROM STDIN (text format).
///
/// Order respects FK constraints: calls → call_units.
pub async fn load_call_log(pool: &PgPool, records: &[CompletedCall]) -> Result<(), sqlx::Error> {
    // Calls
    {
        let mut buf = String::new();
        for c in records {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                c.id,
                escape(&c.event_name),
                escape(&c.parent_event),
                enum_str(&c.category)?,
                enum_str(&c.priority)?,
                enum_str(&c.response)?,
                c.location_id,
                escape(&c.location_name),
                c.created_at.as_seconds(),
                opt_time(c.dispatched_at),
                opt_time(c.on_scene_at),
                c.completed_at.as_seconds(),
                enum_str(&c.outcome)?,
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_calls.sql"), &buf).await?;
    }

    // Call units (after calls due to FK)
    {
        let mut buf = String::new();
        for row in records.iter().flat_map(CompletedCall::unit_rows) {
            buf.push_str(&format!(
                "{}\t{}\t{}\t{}\n",
                row.call_id,
                escape(row.call_sign),
                row.position,
                if row.primary { "t" } else { "f" },
            ));
        }
        copy_in(pool, include_str!("../../sql/copy_call_units.sql"), &buf).await?;
    }

    tracing::info!("loaded {} completed calls into postgres", records.len());
    Ok(())
}

/// Execute a COPY FROM STDIN with the given text-format payload.
async fn copy_in(pool: &PgPool, statement: &str, data: &str) -> Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await?;
    let mut copy = conn.copy_in_raw(statement).await?;
    copy.send(data.as_bytes()).await?;
    copy.finish().await?;
    Ok(())
}

/// Escape a string for Postgres COPY text format.
/// Backslash must be escaped first, then the special whitespace characters.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Render an optional time as seconds, or `\N` for NULL.
fn opt_time(t: Option<SimTime>) -> String {
    match t {
        Some(t) => t.as_seconds().to_string(),
        None => "\\N".to_string(),
    }
}

/// Serialize a unit enum variant to its name (strips JSON quotes).
fn enum_str<T: Serialize>(val: &T) -> Result<String, sqlx::Error> {
    let json = serde_json::to_string(val).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    Ok(json.trim_matches('"').to_string())
}
