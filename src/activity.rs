//! Activity labels and calorie estimates from MET values.
//!
//! One MET is the energy spent sitting quietly. Calories for an activity are
//! `seconds * MET * 3.5 * weight_kg / (200 * 60)` kcal.

use crate::error::{Result, TmdError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of one sensor window, in seconds
pub const WINDOW_SECONDS: f64 = 5.0;

/// Transportation mode recognized by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Activity {
    Walking,
    Still,
    /// Any other label (car, bus, train, ...)
    Vehicle,
}

impl Activity {
    /// Metabolic equivalent of the activity
    pub fn met(self) -> f64 {
        match self {
            Activity::Walking => 3.8,
            Activity::Still => 1.0,
            Activity::Vehicle => 1.5,
        }
    }
}

impl From<&str> for Activity {
    fn from(label: &str) -> Self {
        match label {
            "walking" => Activity::Walking,
            "still" => Activity::Still,
            _ => Activity::Vehicle,
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Activity::Walking => "walking",
            Activity::Still => "still",
            Activity::Vehicle => "vehicle",
        };
        f.write_str(s)
    }
}

/// Calories (kcal) burnt doing `activity` for `seconds`
pub fn activity_calories(activity: Activity, weight_kg: f64, seconds: f64) -> f64 {
    seconds * activity.met() * 3.5 * weight_kg / (200.0 * 60.0)
}

/// Result of recording one predicted window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowReport {
    pub activity: Activity,
    /// `count * window` for this activity, as of this window
    pub elapsed_seconds: f64,
    /// Calories credited for this window
    pub calories: f64,
    /// Running total after this window
    pub total_calories: f64,
}

/// Counts per activity and the running calorie total
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerSummary {
    pub walking: usize,
    pub still: usize,
    pub vehicle: usize,
    pub total_calories: f64,
}

/// Accumulates calories over a stream of predicted windows.
///
/// Each window credits the calories for the activity's whole elapsed time
/// so far (`count * window_seconds`), so the total grows quadratically with
/// the number of windows of one activity.
#[derive(Debug, Clone)]
pub struct CalorieTracker {
    weight_kg: f64,
    window_seconds: f64,
    summary: TrackerSummary,
}

impl CalorieTracker {
    pub fn new(weight_kg: f64) -> Result<Self> {
        if !(weight_kg.is_finite() && weight_kg > 0.0) {
            return Err(TmdError::InvalidParameter {
                name: "weight".to_string(),
                value: weight_kg.to_string(),
                reason: "must be a positive number of kilograms".to_string(),
            });
        }
        Ok(Self {
            weight_kg,
            window_seconds: WINDOW_SECONDS,
            summary: TrackerSummary::default(),
        })
    }

    pub fn with_window_seconds(mut self, seconds: f64) -> Self {
        self.window_seconds = seconds;
        self
    }

    pub fn record(&mut self, activity: Activity) -> WindowReport {
        let count = match activity {
            Activity::Walking => &mut self.summary.walking,
            Activity::Still => &mut self.summary.still,
            Activity::Vehicle => &mut self.summary.vehicle,
        };
        *count += 1;
        let elapsed_seconds = *count as f64 * self.window_seconds;

        let calories = activity_calories(activity, self.weight_kg, elapsed_seconds);
        self.summary.total_calories += calories;

        WindowReport {
            activity,
            elapsed_seconds,
            calories,
            total_calories: self.summary.total_calories,
        }
    }

    pub fn summary(&self) -> TrackerSummary {
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(Activity::from("walking"), Activity::Walking);
        assert_eq!(Activity::from("still"), Activity::Still);
        assert_eq!(Activity::from("car"), Activity::Vehicle);
        assert_eq!(Activity::from("Walking"), Activity::Vehicle);
    }

    #[test]
    fn test_activity_calories() {
        // 60 s walking at 70 kg: 60 * 3.8 * 3.5 * 70 / 12000
        let kcal = activity_calories(Activity::Walking, 70.0, 60.0);
        assert!((kcal - 4.655).abs() < 1e-9);
        assert_eq!(activity_calories(Activity::Still, 70.0, 0.0), 0.0);
    }

    #[test]
    fn test_tracker_accumulates_elapsed_time() {
        let mut tracker = CalorieTracker::new(60.0).unwrap();
        let first = tracker.record(Activity::Still);
        let second = tracker.record(Activity::Still);
        tracker.record(Activity::Walking);

        assert_eq!(first.elapsed_seconds, 5.0);
        assert_eq!(second.elapsed_seconds, 10.0);
        assert!((second.calories - 2.0 * first.calories).abs() < 1e-12);

        let summary = tracker.summary();
        assert_eq!((summary.walking, summary.still, summary.vehicle), (1, 2, 0));
        let expected = activity_calories(Activity::Still, 60.0, 5.0)
            + activity_calories(Activity::Still, 60.0, 10.0)
            + activity_calories(Activity::Walking, 60.0, 5.0);
        assert!((summary.total_calories - expected).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_weight() {
        assert!(CalorieTracker::new(0.0).is_err());
        assert!(CalorieTracker::new(f64::NAN).is_err());
    }
}
