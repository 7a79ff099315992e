//! Technician day-level utilization classification and aggregation.
//!
//! This is the single home of the utilization thresholds. Both the REST
//! responses and the broadcast payloads derive their figures from
//! [`classify`], so the under/optimal/over boundaries cannot drift between
//! call sites.
//!
//! | Status  | Condition |
//! |---------|-----------|
//! | under   | percentage < 80 |
//! | optimal | 80 <= percentage <= 100 |
//! | over    | percentage > 100 |

use serde::{Deserialize, Serialize};

use crate::api::Schedule;

/// Percentage below which a day is considered underutilized.
pub const UNDER_THRESHOLD: f64 = 80.0;
/// Percentage above which a day is considered overallocated.
pub const OVER_THRESHOLD: f64 = 100.0;

/// Classification of a technician's day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UtilizationStatus {
    Under,
    Optimal,
    Over,
}

/// Derived utilization figures for one schedule day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utilization {
    /// `round(scheduled / available * 100)`; 0 when no hours are available.
    pub utilization_percentage: f64,
    pub remaining_hours: f64,
    pub is_overallocated: bool,
    pub utilization_status: UtilizationStatus,
}

/// Classify a day's utilization from its available and scheduled hours.
///
/// Total over all inputs: `available_hours == 0` yields percentage 0 and
/// status `Under` rather than a division error.
pub fn classify(available_hours: f64, scheduled_hours: f64) -> Utilization {
    let percentage = if available_hours > 0.0 {
        (scheduled_hours / available_hours * 100.0).round()
    } else {
        0.0
    };

    let status = if percentage < UNDER_THRESHOLD {
        UtilizationStatus::Under
    } else if percentage > OVER_THRESHOLD {
        UtilizationStatus::Over
    } else {
        UtilizationStatus::Optimal
    };

    Utilization {
        utilization_percentage: percentage,
        remaining_hours: available_hours - scheduled_hours,
        is_overallocated: scheduled_hours > available_hours,
        utilization_status: status,
    }
}

/// Aggregate utilization figures over a collection of schedules.
///
/// All fields are simple reductions; there is no hidden state and
/// recomputing from the same input yields the same summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilizationSummary {
    pub total_schedules: usize,
    pub total_available_hours: f64,
    pub total_scheduled_hours: f64,
    /// Mean of the per-schedule rounded percentages, to two decimals.
    pub average_utilization: f64,
    pub overallocated_count: usize,
    pub underutilized_count: usize,
    pub optimal_count: usize,
}

/// Reduce a set of schedules into aggregate counts and totals.
pub fn summarize(schedules: &[Schedule]) -> UtilizationSummary {
    let mut total_available = 0.0;
    let mut total_scheduled = 0.0;
    let mut percentage_sum = 0.0;
    let mut over = 0usize;
    let mut under = 0usize;
    let mut optimal = 0usize;

    for schedule in schedules {
        let utilization = schedule.utilization();
        total_available += schedule.available_hours;
        total_scheduled += schedule.scheduled_hours;
        percentage_sum += utilization.utilization_percentage;
        match utilization.utilization_status {
            UtilizationStatus::Under => under += 1,
            UtilizationStatus::Optimal => optimal += 1,
            UtilizationStatus::Over => over += 1,
        }
    }

    let average = if schedules.is_empty() {
        0.0
    } else {
        (percentage_sum / schedules.len() as f64 * 100.0).round() / 100.0
    };

    UtilizationSummary {
        total_schedules: schedules.len(),
        total_available_hours: total_available,
        total_scheduled_hours: total_scheduled,
        average_utilization: average,
        overallocated_count: over,
        underutilized_count: under,
        optimal_count: optimal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ScheduleId, TechnicianId};
    use chrono::NaiveDate;

    fn make_schedule(available: f64, scheduled: f64) -> Schedule {
        Schedule {
            id: ScheduleId::new(1),
            technician_id: TechnicianId::new(1),
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            available_hours: available,
            scheduled_hours: scheduled,
            is_available: true,
            notes: None,
        }
    }

    #[test]
    fn test_classify_underutilized() {
        // 6 of 8 hours -> 75%, under
        let u = classify(8.0, 6.0);
        assert_eq!(u.utilization_percentage, 75.0);
        assert_eq!(u.utilization_status, UtilizationStatus::Under);
        assert_eq!(u.remaining_hours, 2.0);
        assert!(!u.is_overallocated);
    }

    #[test]
    fn test_classify_overallocated() {
        // 8.8 of 8 hours -> 110%, over
        let u = classify(8.0, 8.8);
        assert_eq!(u.utilization_percentage, 110.0);
        assert_eq!(u.utilization_status, UtilizationStatus::Over);
        assert!(u.is_overallocated);
        assert!(u.remaining_hours < 0.0);
    }

    #[test]
    fn test_classify_zero_available_hours() {
        let u = classify(0.0, 4.0);
        assert_eq!(u.utilization_percentage, 0.0);
        assert_eq!(u.utilization_status, UtilizationStatus::Under);
        assert!(u.is_overallocated, "hours scheduled against an empty day");
    }

    #[test]
    fn test_classify_threshold_boundaries() {
        // Exactly 80% is optimal, not under.
        let at_80 = classify(10.0, 8.0);
        assert_eq!(at_80.utilization_percentage, 80.0);
        assert_eq!(at_80.utilization_status, UtilizationStatus::Optimal);

        // Exactly 100% is optimal, not over.
        let at_100 = classify(8.0, 8.0);
        assert_eq!(at_100.utilization_percentage, 100.0);
        assert_eq!(at_100.utilization_status, UtilizationStatus::Optimal);
        assert!(!at_100.is_overallocated);

        let just_under = classify(100.0, 79.0);
        assert_eq!(just_under.utilization_status, UtilizationStatus::Under);

        let just_over = classify(100.0, 101.0);
        assert_eq!(just_over.utilization_status, UtilizationStatus::Over);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let first = classify(8.0, 6.5);
        let second = classify(8.0, 6.5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_percentage_rounds_to_nearest_integer() {
        // 7 / 9 = 77.78% -> 78
        let u = classify(9.0, 7.0);
        assert_eq!(u.utilization_percentage, 78.0);
    }

    #[test]
    fn test_summarize_counts_and_totals() {
        let schedules = vec![
            make_schedule(8.0, 6.0), // 75, under
            make_schedule(8.0, 8.0), // 100, optimal
            make_schedule(8.0, 8.8), // 110, over
        ];

        let summary = summarize(&schedules);
        assert_eq!(summary.total_schedules, 3);
        assert_eq!(summary.total_available_hours, 24.0);
        assert!((summary.total_scheduled_hours - 22.8).abs() < 1e-9);
        assert_eq!(summary.underutilized_count, 1);
        assert_eq!(summary.optimal_count, 1);
        assert_eq!(summary.overallocated_count, 1);
        // (75 + 100 + 110) / 3 = 95
        assert_eq!(summary.average_utilization, 95.0);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_schedules, 0);
        assert_eq!(summary.average_utilization, 0.0);
        assert_eq!(summary.total_available_hours, 0.0);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&UtilizationStatus::Under).unwrap(),
            "\"under\""
        );
        assert_eq!(
            serde_json::to_string(&UtilizationStatus::Optimal).unwrap(),
            "\"optimal\""
        );
        assert_eq!(
            serde_json::to_string(&UtilizationStatus::Over).unwrap(),
            "\"over\""
        );
    }
}
