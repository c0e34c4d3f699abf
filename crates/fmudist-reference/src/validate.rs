//! Tolerance validation of a result against a stored reference.
//!
//! For every numeric reference signal the result is linearly interpolated
//! at the reference sample times. The deviation at each time is divided by
//! the signal's range in the reference (or by 1 for a constant signal); the
//! signal passes when the largest normalized deviation stays below the
//! tolerance.

use crate::result::ResultTable;

/// Default maximum normalized deviation.
pub const DEFAULT_TOLERANCE: f64 = 0.2;

/// Outcome for one signal.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalCheck {
    pub name: String,
    /// Largest normalized deviation; `None` if the result lacks the signal.
    pub max_deviation: Option<f64>,
    pub passed: bool,
}

/// Outcome of validating one result.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub tolerance: f64,
    pub signals: Vec<SignalCheck>,
}

impl ValidationReport {
    /// Whether every signal passed.
    pub fn passed(&self) -> bool {
        self.signals.iter().all(|s| s.passed)
    }

    /// Signals that did not pass.
    pub fn failures(&self) -> impl Iterator<Item = &SignalCheck> {
        self.signals.iter().filter(|s| !s.passed)
    }
}

/// Compare `result` with `reference`.
pub fn validate(result: &ResultTable, reference: &ResultTable, tolerance: f64) -> ValidationReport {
    let mut signals = Vec::new();
    for name in reference.signals() {
        let Some(expected) = reference.numeric(name) else {
            continue;
        };
        let max_deviation = result.numeric(name).and_then(|actual| {
            max_normalized_deviation(result.times(), &actual, reference.times(), &expected)
        });
        let passed = max_deviation.is_some_and(|d| d < tolerance);
        signals.push(SignalCheck {
            name: name.clone(),
            max_deviation,
            passed,
        });
    }
    ValidationReport { tolerance, signals }
}

fn max_normalized_deviation(
    times: &[f64],
    values: &[f64],
    ref_times: &[f64],
    ref_values: &[f64],
) -> Option<f64> {
    if times.is_empty() {
        return None;
    }
    let lo = ref_values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = ref_values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if hi > lo { hi - lo } else { 1.0 };

    let mut max = 0.0_f64;
    for (t, expected) in ref_times.iter().zip(ref_values) {
        let actual = interpolate(times, values, *t);
        let deviation = (actual - expected).abs() / range;
        if deviation.is_nan() {
            return Some(f64::INFINITY);
        }
        max = max.max(deviation);
    }
    Some(max)
}

/// Linear interpolation of `values` at `t`, clamped to the end points.
///
/// At an event (two samples with the same time) the later sample wins.
fn interpolate(times: &[f64], values: &[f64], t: f64) -> f64 {
    let n = times.len();
    if t <= times[0] {
        return values[0];
    }
    if t >= times[n - 1] {
        return values[n - 1];
    }
    let i = times.partition_point(|x| *x <= t);
    let (t0, t1) = (times[i - 1], times[i]);
    let (v0, v1) = (values[i - 1], values[i]);
    if t1 == t0 {
        return v1;
    }
    v0 + (v1 - v0) * (t - t0) / (t1 - t0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn table(text: &str) -> ResultTable {
        ResultTable::parse(text, Path::new("t.csv")).unwrap()
    }

    #[test]
    fn identical_tables_pass() {
        let t = table("\"time\",\"x\"\n0,1\n1,2\n2,3\n");
        let report = validate(&t, &t, DEFAULT_TOLERANCE);
        assert!(report.passed());
        assert_eq!(report.signals[0].max_deviation, Some(0.0));
    }

    #[test]
    fn interpolates_at_reference_times() {
        let result = table("\"time\",\"x\"\n0,0\n2,2\n");
        let reference = table("\"time\",\"x\"\n0,0\n1,1\n2,2\n");
        let report = validate(&result, &reference, 0.01);
        assert!(report.passed(), "{report:?}");
    }

    #[test]
    fn large_deviation_fails() {
        let result = table("\"time\",\"x\"\n0,0\n1,5\n");
        let reference = table("\"time\",\"x\"\n0,0\n1,1\n");
        let report = validate(&result, &reference, DEFAULT_TOLERANCE);
        assert!(!report.passed());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.signals[0].max_deviation, Some(4.0));
    }

    #[test]
    fn missing_signal_fails() {
        let result = table("\"time\",\"y\"\n0,0\n");
        let reference = table("\"time\",\"x\"\n0,0\n");
        let report = validate(&result, &reference, DEFAULT_TOLERANCE);
        assert_eq!(report.signals[0].max_deviation, None);
        assert!(!report.passed());
    }

    #[test]
    fn event_takes_later_sample() {
        assert_eq!(interpolate(&[0.0, 1.0, 1.0, 2.0], &[0.0, 1.0, 5.0, 5.0], 1.0), 5.0);
    }
}
