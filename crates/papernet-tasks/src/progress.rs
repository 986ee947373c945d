//! Progress bar width derived from the last fetched task.

use serde::Serialize;

use crate::models::{Task, TaskInfo};

const DEFAULT_CURRENT: f64 = 1.0;
const DEFAULT_TOTAL: f64 = 100.0;

/// Display state for the progress indicator.
///
/// The width always lies in `[1%, 100%]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressView {
    percent: f64,
}

impl ProgressView {
    pub const MIN_PERCENT: f64 = 1.0;
    pub const MAX_PERCENT: f64 = 100.0;

    pub fn from_task(task: &Task) -> Self {
        Self::from_info(&task.info)
    }

    /// A missing or zero `current` counts as 1 and a missing or non-positive
    /// `total` as 100. Negative ratios clamp to the 1% floor.
    pub fn from_info(info: &TaskInfo) -> Self {
        let current = info.current.filter(|c| *c != 0.0).unwrap_or(DEFAULT_CURRENT);
        let total = info.total.filter(|t| *t > 0.0).unwrap_or(DEFAULT_TOTAL);
        Self::from_counts(current, total)
    }

    fn from_counts(current: f64, total: f64) -> Self {
        let percent = (current * 100.0 / total).clamp(Self::MIN_PERCENT, Self::MAX_PERCENT);
        Self { percent }
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub fn fraction(&self) -> f64 {
        self.percent / 100.0
    }

    /// CSS-style width, e.g. `"20%"` or `"33.33%"`.
    pub fn width_percent(&self) -> String {
        let rounded = (self.percent * 100.0).round() / 100.0;
        if rounded.fract() == 0.0 {
            format!("{rounded:.0}%")
        } else {
            let s = format!("{rounded:.2}");
            format!("{}%", s.trim_end_matches('0'))
        }
    }
}

impl Default for ProgressView {
    fn default() -> Self {
        Self { percent: Self::MIN_PERCENT }
    }
}

impl std::fmt::Display for ProgressView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.width_percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn width(info: serde_json::Value) -> String {
        ProgressView::from_info(&TaskInfo::from(info)).width_percent()
    }

    #[test]
    fn test_ratio_of_counters() {
        assert_eq!(width(json!({ "current": 10, "total": 50 })), "20%");
        assert_eq!(width(json!({ "current": 50, "total": 50 })), "100%");
        assert_eq!(width(json!({ "current": 1, "total": 3 })), "33.33%");
        assert_eq!(width(json!({ "current": 1, "total": 8 })), "12.5%");
    }

    #[test]
    fn test_absent_info_is_one_percent() {
        assert_eq!(ProgressView::from_info(&TaskInfo::default()).width_percent(), "1%");
        assert_eq!(ProgressView::default().width_percent(), "1%");
        assert_eq!(width(json!("Traceback ...")), "1%");
    }

    #[test]
    fn test_missing_counters_use_defaults() {
        // current defaults to 1
        assert_eq!(width(json!({ "total": 4 })), "25%");
        // total defaults to 100
        assert_eq!(width(json!({ "current": 40 })), "40%");
        // zero counters behave like missing ones
        assert_eq!(width(json!({ "current": 0, "total": 0 })), "1%");
    }

    #[test]
    fn test_width_is_clamped() {
        assert_eq!(width(json!({ "current": 120, "total": 100 })), "100%");
        assert_eq!(width(json!({ "current": 1, "total": 1000 })), "1%");
        assert_eq!(width(json!({ "current": -5, "total": 10 })), "1%");
    }

    #[test]
    fn test_fraction_matches_percent() {
        let view = ProgressView::from_info(&TaskInfo::counters(3, 4));
        assert_eq!(view.percent(), 75.0);
        assert_eq!(view.fraction(), 0.75);
    }
}
