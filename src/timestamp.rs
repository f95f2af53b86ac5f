//! Timestamp detection and conversion heuristics
//!
//! Forensic SQLite sources encode timestamps under several epoch schemes.
//! This module guesses, per column, whether the values are timestamps and
//! under which scheme, and converts raw values into calendar datetimes.
//!
//! Classification combines two signals:
//! - the column name contains a timestamp-suggestive keyword, or
//! - a majority of sampled non-null numeric values fall inside a scheme's
//!   plausible magnitude range.
//!
//! When several schemes fit, a fixed priority order breaks the tie
//! (Webkit > Unix seconds > Unix milliseconds > Cocoa), so ambiguity is a
//! named policy rather than an artifact of iteration order. Without name
//! evidence the bar is higher: every sampled numeric value must fit, and a
//! minimum sample count is required, to keep plain counters from being
//! misread as dates.
//!
//! The magnitude thresholds below are heuristic and tunable; values near
//! range edges (e.g. the Unix-seconds / Cocoa overlap around 1e9) resolve
//! via the priority order.

use crate::db::reader::{Row, Value};
use crate::db::schema::TableDescriptor;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::LazyLock;

/// Column-name substrings that suggest a timestamp
const NAME_KEYWORDS: &[&str] = &[
    "time", "date", "stamp", "created", "modified", "accessed", "last", "epoch", "visit",
];

/// Minimum sampled numeric values to classify a column on magnitude alone
const MIN_UNNAMED_SAMPLES: usize = 3;

/// Fraction of sampled numeric values that must fit a scheme's range when
/// the column name already suggests a timestamp
const NAMED_MAJORITY: f64 = 0.5;

/// Plausible magnitude ranges per scheme. Tunable constants, not
/// structural assumptions.
///
/// Webkit: microseconds since 1601-01-01; ~1981..~2060
const WEBKIT_RANGE: (f64, f64) = (1.2e16, 1.45e16);
/// Unix seconds: ~2001..~2099
const UNIX_SECONDS_RANGE: (f64, f64) = (1.0e9, 4.1e9);
/// Unix milliseconds: ~2001..~2099
const UNIX_MILLIS_RANGE: (f64, f64) = (1.0e12, 4.1e12);
/// Cocoa: seconds since 2001-01-01; ~2004 onwards
const COCOA_RANGE: (f64, f64) = (1.0e8, 3.2e9);

static WEBKIT_EPOCH: LazyLock<DateTime<Utc>> = LazyLock::new(|| {
    Utc.with_ymd_and_hms(1601, 1, 1, 0, 0, 0)
        .single()
        .expect("valid Webkit epoch")
});

static COCOA_EPOCH: LazyLock<DateTime<Utc>> = LazyLock::new(|| {
    Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0)
        .single()
        .expect("valid Cocoa epoch")
});

/// A candidate timestamp encoding scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampScheme {
    /// Integer microseconds since 1601-01-01 (Chrome/Webkit)
    Webkit,
    /// Seconds since 1970-01-01
    UnixSeconds,
    /// Milliseconds since 1970-01-01
    UnixMillis,
    /// Real seconds since 2001-01-01 (Apple Cocoa)
    Cocoa,
}

impl TimestampScheme {
    /// Fixed priority order used to break classification ties
    pub const PRIORITY: [TimestampScheme; 4] = [
        TimestampScheme::Webkit,
        TimestampScheme::UnixSeconds,
        TimestampScheme::UnixMillis,
        TimestampScheme::Cocoa,
    ];

    /// Label written to the `<column>_type` CSV column
    pub fn label(&self) -> &'static str {
        match self {
            TimestampScheme::Webkit => "webkit",
            TimestampScheme::UnixSeconds => "unix",
            TimestampScheme::UnixMillis => "unix_ms",
            TimestampScheme::Cocoa => "cocoa",
        }
    }

    fn range(&self) -> (f64, f64) {
        match self {
            TimestampScheme::Webkit => WEBKIT_RANGE,
            TimestampScheme::UnixSeconds => UNIX_SECONDS_RANGE,
            TimestampScheme::UnixMillis => UNIX_MILLIS_RANGE,
            TimestampScheme::Cocoa => COCOA_RANGE,
        }
    }

    /// True when a raw numeric magnitude is plausible under this scheme
    pub fn plausible(&self, value: f64) -> bool {
        let (min, max) = self.range();
        value >= min && value <= max
    }

    /// Convert a raw value under this scheme.
    ///
    /// Returns `None` for non-numeric values and values outside the
    /// scheme's plausible range; a failure never aborts the row.
    pub fn convert(&self, value: &Value) -> Option<DateTime<Utc>> {
        let raw = numeric_value(value)?;
        if !self.plausible(raw) {
            return None;
        }

        match self {
            TimestampScheme::Webkit => {
                WEBKIT_EPOCH.checked_add_signed(Duration::microseconds(raw as i64))
            }
            TimestampScheme::UnixSeconds => {
                let secs = raw.floor();
                let nanos = ((raw - secs) * 1e9) as u32;
                DateTime::from_timestamp(secs as i64, nanos)
            }
            TimestampScheme::UnixMillis => DateTime::from_timestamp_millis(raw as i64),
            TimestampScheme::Cocoa => {
                COCOA_EPOCH.checked_add_signed(Duration::milliseconds((raw * 1000.0) as i64))
            }
        }
    }
}

/// A (column index, scheme) pair selected for one table.
///
/// Recomputed per table, never cached across tables or files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampHypothesis {
    pub column: usize,
    pub scheme: TimestampScheme,
}

/// Extract a numeric magnitude from a cell, if it has one
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Real(r) if r.is_finite() => Some(*r),
        Value::Text(t) => t.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn name_suggests_timestamp(column_name: &str) -> bool {
    let lower = column_name.to_ascii_lowercase();
    NAME_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Classify one column from its name and sampled values.
///
/// Returns the selected scheme, or `None` when the column should pass
/// through unconverted.
pub fn classify(column_name: &str, samples: &[&Value]) -> Option<TimestampScheme> {
    let numeric: Vec<f64> = samples.iter().copied().filter_map(numeric_value).collect();
    if numeric.is_empty() {
        return None;
    }

    let named = name_suggests_timestamp(column_name);
    let required = if named {
        NAMED_MAJORITY
    } else {
        if numeric.len() < MIN_UNNAMED_SAMPLES {
            return None;
        }
        1.0
    };

    TimestampScheme::PRIORITY.iter().copied().find(|scheme| {
        let fitting = numeric.iter().filter(|v| scheme.plausible(**v)).count();
        fitting as f64 / numeric.len() as f64 >= required && fitting > 0
    })
}

/// Compute timestamp hypotheses for a table from sampled rows.
///
/// At most one scheme is selected per column; the priority order in
/// [`TimestampScheme::PRIORITY`] breaks ties.
pub fn hypotheses(descriptor: &TableDescriptor, samples: &[Row]) -> Vec<TimestampHypothesis> {
    descriptor
        .columns
        .iter()
        .enumerate()
        .filter_map(|(column, name)| {
            let values: Vec<&Value> = samples
                .iter()
                .filter_map(|row| row.get(column))
                .filter(|v| !v.is_null())
                .collect();
            classify(name, &values).map(|scheme| TimestampHypothesis { column, scheme })
        })
        .collect()
}

/// Render a converted datetime for CSV output (ISO 8601, UTC)
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}
