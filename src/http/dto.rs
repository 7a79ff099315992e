//! Data Transfer Objects for the HTTP API.
//!
//! Wire names are camelCase to match what the dashboard and the mobile app
//! consume. Domain types that already serialize the right way (schedules
//! with derived utilization, work orders, advisories) are re-exported from
//! [`crate::api`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// Re-export domain types that already serialize with camelCase wire names
pub use crate::api::{
    Advisory, Schedule, ScheduleWithUtilization, Severity, Technician, WorkOrder,
    WorkOrderPriority, WorkOrderStatus,
};
pub use crate::models::utilization::UtilizationSummary;

/// Request body for creating a schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub technician_id: i64,
    pub date: NaiveDate,
    /// Defaults to a standard 8-hour day.
    #[serde(default = "default_available_hours")]
    pub available_hours: f64,
    #[serde(default)]
    pub scheduled_hours: f64,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_available_hours() -> f64 {
    8.0
}

/// Request body for a direct schedule edit. Absent fields are unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduleRequest {
    #[serde(default)]
    pub available_hours: Option<f64>,
    #[serde(default)]
    pub scheduled_hours: Option<f64>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Query parameters for schedule listings and utilization stats.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleQuery {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub technician_id: Option<i64>,
}

/// Schedule list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleListResponse {
    pub schedules: Vec<ScheduleWithUtilization>,
    pub total: usize,
}

/// Utilization statistics response: aggregate reductions plus the
/// schedules they were computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilizationStatsResponse {
    #[serde(flatten)]
    pub summary: UtilizationSummary,
    pub schedules: Vec<ScheduleWithUtilization>,
}

/// Request body for creating a work order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkOrderRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: WorkOrderPriority,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
}

fn default_priority() -> WorkOrderPriority {
    WorkOrderPriority::Medium
}

/// Work order list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderListResponse {
    pub work_orders: Vec<WorkOrder>,
    pub total: usize,
}

/// Request body for the assignment endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignWorkOrderRequest {
    pub assigned_to_id: i64,
    pub scheduled_start_date: DateTime<Utc>,
    pub estimated_hours: f64,
    #[serde(default)]
    pub force_assign: bool,
}

/// Assignment response: the updated work order plus any non-fatal
/// advisories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignWorkOrderResponse {
    pub work_order: WorkOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<Advisory>>,
}

/// Request body for creating a technician.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTechnicianRequest {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Technician list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianListResponse {
    pub technicians: Vec<Technician>,
    pub total: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Repository status
    pub repository: String,
}
