use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::model::{
    CallCategory, CallId, CallOutcome, CallPriority, CompletedCall, ResponseCode, SimTime,
};

/// A completed call without its unit list, which goes to `call_units.jsonl`.
#[derive(Serialize)]
struct CallRow<'a> {
    id: CallId,
    event_name: &'a str,
    parent_event: &'a str,
    category: CallCategory,
    priority: CallPriority,
    response: ResponseCode,
    location_id: u64,
    location_name: &'a str,
    created_at: SimTime,
    dispatched_at: Option<SimTime>,
    on_scene_at: Option<SimTime>,
    completed_at: SimTime,
    outcome: CallOutcome,
}

impl<'a> From<&'a CompletedCall> for CallRow<'a> {
    fn from(call: &'a CompletedCall) -> Self {
        Self {
            id: call.id,
            event_name: &call.event_name,
            parent_event: &call.parent_event,
            category: call.category,
            priority: call.priority,
            response: call.response,
            location_id: call.location_id,
            location_name: &call.location_name,
            created_at: call.created_at,
            dispatched_at: call.dispatched_at,
            on_scene_at: call.on_scene_at,
            completed_at: call.completed_at,
            outcome: call.outcome,
        }
    }
}

/// Write an iterator of serializable items to a JSONL file (one JSON object per line).
fn write_jsonl<T: Serialize>(path: &Path, items: impl Iterator<Item = T>) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, &item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Flush completed calls to JSONL files in the given output directory.
///
/// Creates the output directory if it does not exist. Writes 2 files:
/// - `calls.jsonl`: one completed call per line (without its units)
/// - `call_units.jsonl`: one responding unit per line, primary first
pub fn flush_call_log(records: &[CompletedCall], output_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(output_dir)?;

    write_jsonl(
        &output_dir.join("calls.jsonl"),
        records.iter().map(CallRow::from),
    )?;
    write_jsonl(
        &output_dir.join("call_units.jsonl"),
        records.iter().flat_map(CompletedCall::unit_rows),
    )?;

    tracing::info!(
        "flushed {} completed calls to {}",
        records.len(),
        output_dir.display()
    );
    Ok(())
}
