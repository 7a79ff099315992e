//! Core domain types shared across the repository, service, and HTTP layers.
//!
//! Entity ids are newtypes over `i64` so a schedule id can never be passed
//! where a work order id is expected. All types serialize with camelCase
//! field names to match the wire format consumed by the dashboard and the
//! field-technician app.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::utilization::{self, Utilization};

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of a technician day schedule.
    ScheduleId
);
entity_id!(
    /// Identifier of a work order.
    WorkOrderId
);
entity_id!(
    /// Identifier of a technician.
    TechnicianId
);

/// A technician's capacity record for one calendar day.
///
/// Utilization fields are never stored; they are derived on read via
/// [`Schedule::utilization`] so the 80/100 thresholds live in exactly one
/// place ([`crate::models::utilization::classify`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: ScheduleId,
    pub technician_id: TechnicianId,
    /// Calendar day granularity. At most one schedule exists per
    /// (technician, date) pair; the repository enforces this.
    pub date: NaiveDate,
    pub available_hours: f64,
    pub scheduled_hours: f64,
    pub is_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Schedule {
    /// Derived utilization figures for this day. Pure; recomputing from the
    /// same stored hours always yields the same result.
    pub fn utilization(&self) -> Utilization {
        utilization::classify(self.available_hours, self.scheduled_hours)
    }
}

/// A schedule together with its derived utilization fields, as serialized
/// in REST responses and broadcast payloads. Built via `From<Schedule>` so
/// every surface derives the figures through the same classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleWithUtilization {
    #[serde(flatten)]
    pub schedule: Schedule,
    #[serde(flatten)]
    pub utilization: Utilization,
}

impl From<Schedule> for ScheduleWithUtilization {
    fn from(schedule: Schedule) -> Self {
        let utilization = schedule.utilization();
        Self {
            schedule,
            utilization,
        }
    }
}

/// Lifecycle status of a work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    Open,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

/// Priority of a work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// A maintenance/repair work order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: WorkOrderId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: WorkOrderStatus,
    pub priority: WorkOrderPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_id: Option<TechnicianId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A field technician.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Technician {
    pub id: TechnicianId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub is_active: bool,
}

/// Severity of an assignment advisory.
///
/// `Warning` advisories are non-fatal; the operation proceeded and the UI
/// should surface the message. `Error` advisories are fatal; no state was
/// mutated and the caller must not proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A single advisory returned by the assignment operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisory {
    pub severity: Severity,
    pub message: String,
}

impl Advisory {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}
