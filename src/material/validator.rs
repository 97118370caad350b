//! Field checks shared by full documents and patches.
//!
//! Checks stop at the first violation and report its dotted path
//! (`drawings[2].units[0].durationSec`).

use super::document::{LaneKind, TimedEntry};
use super::errors::{MaterialError, MaterialResult};
use super::lanes::LessonDrawing;

fn is_non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

pub(crate) fn check_duration(field: impl FnOnce() -> String, value: f32) -> MaterialResult<()> {
    if is_non_negative(value) {
        Ok(())
    } else {
        Err(MaterialError::NegativeDuration {
            field: field(),
            value,
        })
    }
}

pub(crate) fn check_elapsed_time(
    field: impl FnOnce() -> String,
    value: f32,
) -> MaterialResult<()> {
    if is_non_negative(value) {
        Ok(())
    } else {
        Err(MaterialError::NegativeElapsedTime {
            field: field(),
            value,
        })
    }
}

fn check_entry<T: TimedEntry>(prefix: &str, entry: &T) -> MaterialResult<()> {
    check_elapsed_time(|| format!("{}.elapsedTime", prefix), entry.elapsed_time())?;
    if let Some(duration) = entry.duration_sec() {
        check_duration(|| format!("{}.durationSec", prefix), duration)?;
    }
    Ok(())
}

/// Checks every entry of one lane.
pub(crate) fn check_lane<T: TimedEntry>(kind: LaneKind, entries: &[T]) -> MaterialResult<()> {
    for (index, entry) in entries.iter().enumerate() {
        check_entry(&format!("{}[{}]", kind, index), entry)?;
    }
    Ok(())
}

/// Drawings also carry nested stroke units with their own timing.
pub(crate) fn check_drawings(drawings: &[LessonDrawing]) -> MaterialResult<()> {
    check_lane(LaneKind::Drawings, drawings)?;
    for (index, drawing) in drawings.iter().enumerate() {
        for (unit_index, unit) in drawing.units.iter().enumerate() {
            check_entry(
                &format!("{}[{}].units[{}]", LaneKind::Drawings, index, unit_index),
                unit,
            )?;
        }
    }
    Ok(())
}
