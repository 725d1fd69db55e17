//! Pure transformations from raw readings to published values.

use crate::domain::errors::StatError;

/// Splits a combined counter into its auxiliary ("dirty") part: `all - normal`.
///
/// A combined counter smaller than its normal part means the source returned
/// inconsistent readings; the result is an error, never a clamped zero.
pub fn dirty_split(metric: &str, all: u64, normal: u64) -> Result<u64, StatError> {
    all.checked_sub(normal).ok_or_else(|| StatError::Inconsistent {
        metric: metric.to_string(),
        all,
        normal,
    })
}

/// Downstream consumers have no boolean type
pub fn flag_value(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}

/// Parses the major component of a runtime version string (`"26"`, `"26.2.1"`).
pub fn major_version(raw: &str) -> Result<u64, StatError> {
    let major = raw.trim().split('.').next().unwrap_or_default();
    if major.is_empty() || !major.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StatError::Malformed {
            metric: "version".to_string(),
            raw: raw.to_string(),
        });
    }

    major.parse::<u64>().map_err(|_| StatError::Malformed {
        metric: "version".to_string(),
        raw: raw.to_string(),
    })
}
