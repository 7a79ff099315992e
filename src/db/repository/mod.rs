//! Repository trait definitions.
//!
//! Each entity gets its own narrow trait; [`FullRepository`] is the umbrella
//! bound the application state carries. Implementations live in
//! [`crate::db::repositories`].

mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::api::{
    Schedule, ScheduleId, Technician, TechnicianId, WorkOrder, WorkOrderId, WorkOrderPriority,
};

/// Fields for creating a schedule. Hours default to an 8-hour day with
/// nothing scheduled.
#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub technician_id: TechnicianId,
    pub date: NaiveDate,
    pub available_hours: f64,
    pub scheduled_hours: f64,
    pub is_available: bool,
    pub notes: Option<String>,
}

impl NewSchedule {
    /// A default day for a technician: 8 available hours, nothing scheduled.
    pub fn default_day(technician_id: TechnicianId, date: NaiveDate) -> Self {
        Self {
            technician_id,
            date,
            available_hours: 8.0,
            scheduled_hours: 0.0,
            is_available: true,
            notes: None,
        }
    }
}

/// Fields for creating a work order.
#[derive(Debug, Clone)]
pub struct NewWorkOrder {
    pub title: String,
    pub description: Option<String>,
    pub priority: WorkOrderPriority,
    pub estimated_hours: Option<f64>,
}

/// Fields for creating a technician.
#[derive(Debug, Clone)]
pub struct NewTechnician {
    pub name: String,
    pub email: Option<String>,
}

/// Filter for schedule listings. `None` bounds are open.
#[derive(Debug, Clone, Default)]
pub struct ScheduleFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub technician_id: Option<TechnicianId>,
}

/// Storage operations for technician day schedules.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Insert a new schedule. Fails with [`RepositoryError::Conflict`] when
    /// a schedule already exists for the same (technician, date) pair.
    async fn insert_schedule(&self, new: NewSchedule) -> RepositoryResult<Schedule>;

    async fn get_schedule(&self, id: ScheduleId) -> RepositoryResult<Schedule>;

    /// Look up the schedule occupying a (technician, date) slot, if any.
    async fn find_schedule_for_slot(
        &self,
        technician_id: TechnicianId,
        date: NaiveDate,
    ) -> RepositoryResult<Option<Schedule>>;

    /// Persist changed fields of an existing schedule.
    async fn update_schedule(&self, schedule: Schedule) -> RepositoryResult<Schedule>;

    /// List schedules matching the filter, ordered by (date, technician).
    async fn list_schedules(&self, filter: ScheduleFilter) -> RepositoryResult<Vec<Schedule>>;
}

/// Storage operations for work orders.
#[async_trait]
pub trait WorkOrderRepository: Send + Sync {
    async fn insert_work_order(&self, new: NewWorkOrder) -> RepositoryResult<WorkOrder>;

    async fn get_work_order(&self, id: WorkOrderId) -> RepositoryResult<WorkOrder>;

    async fn update_work_order(&self, work_order: WorkOrder) -> RepositoryResult<WorkOrder>;

    /// List all work orders, newest first.
    async fn list_work_orders(&self) -> RepositoryResult<Vec<WorkOrder>>;
}

/// Storage operations for technicians.
#[async_trait]
pub trait TechnicianRepository: Send + Sync {
    async fn insert_technician(&self, new: NewTechnician) -> RepositoryResult<Technician>;

    async fn get_technician(&self, id: TechnicianId) -> RepositoryResult<Technician>;

    /// Persist changed fields of an existing technician (e.g. deactivation).
    async fn update_technician(&self, technician: Technician) -> RepositoryResult<Technician>;

    async fn list_technicians(&self) -> RepositoryResult<Vec<Technician>>;
}

/// Umbrella trait implemented by complete storage backends.
#[async_trait]
pub trait FullRepository:
    ScheduleRepository + WorkOrderRepository + TechnicianRepository
{
    /// Whether the backend is reachable and serving.
    async fn health_check(&self) -> RepositoryResult<bool>;
}
