//! In-memory repository implementation.
//!
//! Backs the test suite and local development. All state lives behind a
//! single `parking_lot::RwLock`, so every repository call is one atomic
//! read-modify-write section; the slot index makes the one-schedule-per-
//! (technician, date) invariant authoritative here rather than in handlers.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;

use crate::api::{
    Schedule, ScheduleId, Technician, TechnicianId, WorkOrder, WorkOrderId, WorkOrderStatus,
};

use crate::db::repository::{
    ErrorContext, FullRepository, NewSchedule, NewTechnician, NewWorkOrder, RepositoryError,
    RepositoryResult, ScheduleFilter, ScheduleRepository, TechnicianRepository,
    WorkOrderRepository,
};

#[derive(Default)]
struct Store {
    schedules: HashMap<i64, Schedule>,
    /// Unique index enforcing one schedule per (technician, date).
    slot_index: HashMap<(i64, NaiveDate), i64>,
    work_orders: HashMap<i64, WorkOrder>,
    technicians: HashMap<i64, Technician>,
    next_schedule_id: i64,
    next_work_order_id: i64,
    next_technician_id: i64,
}

impl Store {
    fn new() -> Self {
        Self {
            next_schedule_id: 1,
            next_work_order_id: 1,
            next_technician_id: 1,
            ..Default::default()
        }
    }
}

/// In-memory implementation of [`FullRepository`].
pub struct LocalRepository {
    store: RwLock<Store>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Store::new()),
        }
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScheduleRepository for LocalRepository {
    async fn insert_schedule(&self, new: NewSchedule) -> RepositoryResult<Schedule> {
        let mut store = self.store.write();
        let slot = (new.technician_id.value(), new.date);

        if store.slot_index.contains_key(&slot) {
            return Err(RepositoryError::conflict_with_context(
                format!(
                    "schedule already exists for technician {} on {}",
                    new.technician_id, new.date
                ),
                ErrorContext::new("insert_schedule").with_entity("schedule"),
            ));
        }

        let id = store.next_schedule_id;
        store.next_schedule_id += 1;

        let schedule = Schedule {
            id: ScheduleId::new(id),
            technician_id: new.technician_id,
            date: new.date,
            available_hours: new.available_hours,
            scheduled_hours: new.scheduled_hours,
            is_available: new.is_available,
            notes: new.notes,
        };

        store.slot_index.insert(slot, id);
        store.schedules.insert(id, schedule.clone());
        Ok(schedule)
    }

    async fn get_schedule(&self, id: ScheduleId) -> RepositoryResult<Schedule> {
        self.store.read().schedules.get(&id.value()).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("schedule {} not found", id),
                ErrorContext::new("get_schedule").with_entity_id(id),
            )
        })
    }

    async fn find_schedule_for_slot(
        &self,
        technician_id: TechnicianId,
        date: NaiveDate,
    ) -> RepositoryResult<Option<Schedule>> {
        let store = self.store.read();
        Ok(store
            .slot_index
            .get(&(technician_id.value(), date))
            .and_then(|id| store.schedules.get(id))
            .cloned())
    }

    async fn update_schedule(&self, schedule: Schedule) -> RepositoryResult<Schedule> {
        let mut store = self.store.write();
        let id = schedule.id.value();

        let existing = store.schedules.get(&id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("schedule {} not found", schedule.id),
                ErrorContext::new("update_schedule").with_entity_id(schedule.id),
            )
        })?;

        // The slot is immutable once created; updates may only change hours,
        // availability, and notes.
        if existing.technician_id != schedule.technician_id || existing.date != schedule.date {
            return Err(RepositoryError::validation(
                "schedule technician and date cannot be changed",
            ));
        }

        store.schedules.insert(id, schedule.clone());
        Ok(schedule)
    }

    async fn list_schedules(&self, filter: ScheduleFilter) -> RepositoryResult<Vec<Schedule>> {
        let store = self.store.read();
        let mut schedules: Vec<Schedule> = store
            .schedules
            .values()
            .filter(|s| filter.start_date.map_or(true, |start| s.date >= start))
            .filter(|s| filter.end_date.map_or(true, |end| s.date <= end))
            .filter(|s| {
                filter
                    .technician_id
                    .map_or(true, |technician| s.technician_id == technician)
            })
            .cloned()
            .collect();
        schedules.sort_by_key(|s| (s.date, s.technician_id));
        Ok(schedules)
    }
}

#[async_trait]
impl WorkOrderRepository for LocalRepository {
    async fn insert_work_order(&self, new: NewWorkOrder) -> RepositoryResult<WorkOrder> {
        let mut store = self.store.write();
        let id = store.next_work_order_id;
        store.next_work_order_id += 1;

        let now = Utc::now();
        let work_order = WorkOrder {
            id: WorkOrderId::new(id),
            title: new.title,
            description: new.description,
            status: WorkOrderStatus::Open,
            priority: new.priority,
            assigned_to_id: None,
            scheduled_start_date: None,
            scheduled_end_date: None,
            estimated_hours: new.estimated_hours,
            created_at: now,
            updated_at: now,
        };

        store.work_orders.insert(id, work_order.clone());
        Ok(work_order)
    }

    async fn get_work_order(&self, id: WorkOrderId) -> RepositoryResult<WorkOrder> {
        self.store.read().work_orders.get(&id.value()).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("work order {} not found", id),
                ErrorContext::new("get_work_order").with_entity_id(id),
            )
        })
    }

    async fn update_work_order(&self, mut work_order: WorkOrder) -> RepositoryResult<WorkOrder> {
        let mut store = self.store.write();
        let id = work_order.id.value();

        if !store.work_orders.contains_key(&id) {
            return Err(RepositoryError::not_found_with_context(
                format!("work order {} not found", work_order.id),
                ErrorContext::new("update_work_order").with_entity_id(work_order.id),
            ));
        }

        work_order.updated_at = Utc::now();
        store.work_orders.insert(id, work_order.clone());
        Ok(work_order)
    }

    async fn list_work_orders(&self) -> RepositoryResult<Vec<WorkOrder>> {
        let store = self.store.read();
        let mut work_orders: Vec<WorkOrder> = store.work_orders.values().cloned().collect();
        work_orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(work_orders)
    }
}

#[async_trait]
impl TechnicianRepository for LocalRepository {
    async fn insert_technician(&self, new: NewTechnician) -> RepositoryResult<Technician> {
        let mut store = self.store.write();
        let id = store.next_technician_id;
        store.next_technician_id += 1;

        let technician = Technician {
            id: TechnicianId::new(id),
            name: new.name,
            email: new.email,
            is_active: true,
        };

        store.technicians.insert(id, technician.clone());
        Ok(technician)
    }

    async fn get_technician(&self, id: TechnicianId) -> RepositoryResult<Technician> {
        self.store.read().technicians.get(&id.value()).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("technician {} not found", id),
                ErrorContext::new("get_technician").with_entity_id(id),
            )
        })
    }

    async fn update_technician(&self, technician: Technician) -> RepositoryResult<Technician> {
        let mut store = self.store.write();
        let id = technician.id.value();

        if !store.technicians.contains_key(&id) {
            return Err(RepositoryError::not_found_with_context(
                format!("technician {} not found", technician.id),
                ErrorContext::new("update_technician").with_entity_id(technician.id),
            ));
        }

        store.technicians.insert(id, technician.clone());
        Ok(technician)
    }

    async fn list_technicians(&self) -> RepositoryResult<Vec<Technician>> {
        let store = self.store.read();
        let mut technicians: Vec<Technician> = store.technicians.values().cloned().collect();
        technicians.sort_by_key(|t| t.id);
        Ok(technicians)
    }
}

#[async_trait]
impl FullRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}
