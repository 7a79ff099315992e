//! Scheduling business logic: schedule lifecycle, work-order assignment,
//! and utilization statistics.
//!
//! Assignment distinguishes two advisory severities. `warning` means the
//! operation proceeded and the caller should surface the message; `error`
//! means the operation was rejected with no state mutation. `force_assign`
//! downgrades capacity/availability errors to warnings.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::api::{
    Advisory, Schedule, ScheduleId, ScheduleWithUtilization, Severity, TechnicianId, WorkOrder,
    WorkOrderId, WorkOrderStatus,
};
use crate::db::repository::{
    FullRepository, NewSchedule, RepositoryError, ScheduleFilter, ScheduleRepository,
    TechnicianRepository, WorkOrderRepository,
};
use crate::models::utilization::{self, UtilizationSummary};
use crate::realtime::{EventKind, Hub, Room, ServerEvent};

/// Errors produced by the scheduling service.
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The assignment was rejected; `advisories` contains at least one
    /// `error`-severity entry and nothing was mutated.
    #[error("{message}")]
    Rejected {
        message: String,
        advisories: Vec<Advisory>,
    },

    #[error("validation error: {0}")]
    Validation(String),
}

/// Parameters of an assignment/reassignment.
#[derive(Debug, Clone)]
pub struct AssignmentRequest {
    pub assigned_to_id: TechnicianId,
    pub scheduled_start_date: DateTime<Utc>,
    pub estimated_hours: f64,
    pub force_assign: bool,
}

/// Result of a successful assignment: the updated work order plus any
/// non-fatal advisories.
#[derive(Debug, Clone)]
pub struct AssignmentOutcome {
    pub work_order: WorkOrder,
    pub warnings: Vec<Advisory>,
}

/// Patchable schedule fields.
#[derive(Debug, Clone, Default)]
pub struct ScheduleUpdate {
    pub available_hours: Option<f64>,
    pub scheduled_hours: Option<f64>,
    pub is_available: Option<bool>,
    pub notes: Option<String>,
}

/// Utilization statistics over a schedule selection.
#[derive(Debug, Clone)]
pub struct UtilizationReport {
    pub summary: UtilizationSummary,
    pub schedules: Vec<ScheduleWithUtilization>,
}

fn validate_day_hours(available: f64, scheduled: f64) -> Result<(), SchedulingError> {
    if !(0.0..=24.0).contains(&available) {
        return Err(SchedulingError::Validation(format!(
            "available hours must be between 0 and 24, got {}",
            available
        )));
    }
    if scheduled < 0.0 || !scheduled.is_finite() {
        return Err(SchedulingError::Validation(format!(
            "scheduled hours must be non-negative, got {}",
            scheduled
        )));
    }
    Ok(())
}

fn schedule_rooms(schedule: &Schedule) -> [Room; 3] {
    [
        Room::TechnicianSchedules {
            technician_id: schedule.technician_id,
        },
        Room::DateSchedules {
            date: schedule.date,
        },
        Room::Schedules,
    ]
}

fn broadcast_schedule_update(hub: &Hub, schedule: &Schedule) {
    let payload = serde_json::to_value(ScheduleWithUtilization::from(schedule.clone()))
        .unwrap_or_default();
    hub.publish_to_all(
        &schedule_rooms(schedule),
        ServerEvent::new(EventKind::ScheduleUpdate, payload),
    );
}

/// Create a schedule for a technician/day slot.
///
/// The repository owns the one-schedule-per-slot invariant; a duplicate
/// surfaces as a conflict.
pub async fn create_schedule(
    repo: &dyn FullRepository,
    hub: &Hub,
    new: NewSchedule,
) -> Result<Schedule, SchedulingError> {
    validate_day_hours(new.available_hours, new.scheduled_hours)?;

    // Reject unknown technicians before touching the slot index.
    repo.get_technician(new.technician_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound { .. } => SchedulingError::Validation(format!(
                "technician {} does not exist",
                new.technician_id
            )),
            other => SchedulingError::Repository(other),
        })?;

    let schedule = repo.insert_schedule(new).await?;
    tracing::info!(
        schedule_id = %schedule.id,
        technician_id = %schedule.technician_id,
        date = %schedule.date,
        "schedule created"
    );
    broadcast_schedule_update(hub, &schedule);
    Ok(schedule)
}

/// Apply a direct edit to a schedule and broadcast the new state.
pub async fn update_schedule(
    repo: &dyn FullRepository,
    hub: &Hub,
    id: ScheduleId,
    patch: ScheduleUpdate,
) -> Result<Schedule, SchedulingError> {
    let mut schedule = repo.get_schedule(id).await?;

    if let Some(available) = patch.available_hours {
        schedule.available_hours = available;
    }
    if let Some(scheduled) = patch.scheduled_hours {
        schedule.scheduled_hours = scheduled;
    }
    if let Some(is_available) = patch.is_available {
        schedule.is_available = is_available;
    }
    if let Some(notes) = patch.notes {
        schedule.notes = Some(notes);
    }

    validate_day_hours(schedule.available_hours, schedule.scheduled_hours)?;

    let schedule = repo.update_schedule(schedule).await?;
    broadcast_schedule_update(hub, &schedule);
    Ok(schedule)
}

/// Aggregate utilization over a date range, optionally for one technician.
pub async fn utilization_stats(
    repo: &dyn FullRepository,
    filter: ScheduleFilter,
) -> Result<UtilizationReport, SchedulingError> {
    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
        if end < start {
            return Err(SchedulingError::Validation(format!(
                "endDate {} precedes startDate {}",
                end, start
            )));
        }
    }

    let schedules = repo.list_schedules(filter).await?;
    let summary = utilization::summarize(&schedules);
    Ok(UtilizationReport {
        summary,
        schedules: schedules.into_iter().map(Into::into).collect(),
    })
}

/// Bind a work order to a technician/day slot.
///
/// Validation failures reject before any mutation. Capacity and
/// availability problems become `error` advisories (fatal) unless
/// `force_assign` downgrades them to warnings; exceeding 100% utilization
/// on an otherwise open slot is always just a warning. On success the
/// target slot's scheduled hours grow by the estimate and, for a
/// reassignment, the previous slot's hours shrink by the old estimate.
pub async fn assign_work_order(
    repo: &dyn FullRepository,
    hub: &Hub,
    id: WorkOrderId,
    request: AssignmentRequest,
) -> Result<AssignmentOutcome, SchedulingError> {
    if !request.estimated_hours.is_finite()
        || request.estimated_hours <= 0.0
        || request.estimated_hours > 24.0
    {
        return Err(SchedulingError::Validation(format!(
            "estimated hours must be in (0, 24], got {}",
            request.estimated_hours
        )));
    }

    let technician = repo
        .get_technician(request.assigned_to_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound { .. } => SchedulingError::Validation(format!(
                "technician {} does not exist",
                request.assigned_to_id
            )),
            other => SchedulingError::Repository(other),
        })?;
    if !technician.is_active {
        return Err(SchedulingError::Validation(format!(
            "technician {} is inactive",
            technician.id
        )));
    }

    let work_order = repo.get_work_order(id).await?;
    if matches!(
        work_order.status,
        WorkOrderStatus::Completed | WorkOrderStatus::Cancelled
    ) {
        return Err(SchedulingError::Validation(format!(
            "work order {} is {:?} and cannot be assigned",
            id, work_order.status
        )));
    }

    let date = request.scheduled_start_date.date_naive();
    let target = match repo
        .find_schedule_for_slot(request.assigned_to_id, date)
        .await?
    {
        Some(schedule) => schedule,
        None => {
            // First booking for this slot; a concurrent insert loses the
            // race at the repository's unique index, so fall back to a
            // re-read on conflict.
            match repo
                .insert_schedule(NewSchedule::default_day(request.assigned_to_id, date))
                .await
            {
                Ok(schedule) => schedule,
                Err(RepositoryError::Conflict { .. }) => repo
                    .find_schedule_for_slot(request.assigned_to_id, date)
                    .await?
                    .ok_or_else(|| {
                        SchedulingError::Repository(RepositoryError::internal(
                            "slot vanished after insert conflict",
                        ))
                    })?,
                Err(e) => return Err(e.into()),
            }
        }
    };

    // Reassignment onto the same slot replaces the old estimate rather
    // than stacking on top of it.
    let same_slot = work_order.assigned_to_id == Some(request.assigned_to_id)
        && work_order
            .scheduled_start_date
            .map(|d| d.date_naive())
            == Some(date);
    let previous_estimate = work_order.estimated_hours.unwrap_or(0.0);
    let base_hours = if same_slot {
        (target.scheduled_hours - previous_estimate).max(0.0)
    } else {
        target.scheduled_hours
    };

    let mut advisories: Vec<Advisory> = Vec::new();

    if !target.is_available {
        if request.force_assign {
            advisories.push(Advisory::warning(format!(
                "technician {} is marked unavailable on {}; assignment forced",
                technician.name, date
            )));
        } else {
            advisories.push(Advisory::error(format!(
                "technician {} is not available on {}",
                technician.name, date
            )));
        }
    }

    let prospective = utilization::classify(
        target.available_hours,
        base_hours + request.estimated_hours,
    );
    if base_hours >= target.available_hours {
        let message = format!(
            "technician {} is already at capacity on {} ({:.1} of {:.1} hours scheduled)",
            technician.name, date, base_hours, target.available_hours
        );
        if request.force_assign {
            advisories.push(Advisory::warning(format!("{}; assignment forced", message)));
        } else {
            advisories.push(Advisory::error(message));
        }
    } else if prospective.is_overallocated {
        advisories.push(Advisory::warning(format!(
            "this assignment raises technician {}'s utilization on {} to {}%, exceeding 100% utilization",
            technician.name, date, prospective.utilization_percentage
        )));
    }

    if advisories.iter().any(|a| a.severity == Severity::Error) {
        let message = advisories
            .iter()
            .find(|a| a.severity == Severity::Error)
            .map(|a| a.message.clone())
            .unwrap_or_else(|| "assignment rejected".to_string());
        return Err(SchedulingError::Rejected {
            message,
            advisories,
        });
    }

    // Past this point every advisory is a warning; mutate.
    let from_technician = work_order.assigned_to_id;
    let from_date = work_order.scheduled_start_date.map(|d| d.date_naive());

    // Release hours held on a previous, different slot.
    if !same_slot {
        if let (Some(old_technician), Some(old_date)) = (from_technician, from_date) {
            if let Some(mut old_schedule) = repo
                .find_schedule_for_slot(old_technician, old_date)
                .await?
            {
                old_schedule.scheduled_hours =
                    (old_schedule.scheduled_hours - previous_estimate).max(0.0);
                let old_schedule = repo.update_schedule(old_schedule).await?;
                broadcast_schedule_update(hub, &old_schedule);
            }
        }
    }

    let mut target = target;
    target.scheduled_hours = base_hours + request.estimated_hours;
    let target = repo.update_schedule(target).await?;

    let mut updated = work_order;
    updated.assigned_to_id = Some(request.assigned_to_id);
    updated.scheduled_start_date = Some(request.scheduled_start_date);
    updated.scheduled_end_date = Some(
        request.scheduled_start_date
            + Duration::milliseconds((request.estimated_hours * 3_600_000.0) as i64),
    );
    updated.estimated_hours = Some(request.estimated_hours);
    if updated.status == WorkOrderStatus::Open {
        updated.status = WorkOrderStatus::Assigned;
    }
    let updated = repo.update_work_order(updated).await?;

    tracing::info!(
        work_order_id = %updated.id,
        technician_id = %request.assigned_to_id,
        date = %date,
        warnings = advisories.len(),
        "work order assigned"
    );

    hub.publish_to_all(
        &[
            Room::WorkOrder { id: updated.id },
            Room::Schedules,
        ],
        ServerEvent::new(
            EventKind::WorkOrderReassignment,
            serde_json::json!({
                "workOrder": updated,
                "fromTechnicianId": from_technician,
                "fromDate": from_date,
                "toTechnicianId": request.assigned_to_id,
                "toDate": date,
            }),
        ),
    );
    broadcast_schedule_update(hub, &target);

    if prospective.is_overallocated {
        let conflict = Arc::new(ServerEvent::new(
            EventKind::ScheduleConflict,
            serde_json::json!({
                "message": format!(
                    "technician {} is overallocated on {} ({}% utilization)",
                    technician.name, date, prospective.utilization_percentage
                ),
                "technicianId": request.assigned_to_id,
                "date": date,
                "utilizationPercentage": prospective.utilization_percentage,
            }),
        ));
        for room in schedule_rooms(&target) {
            hub.publish(room, &conflict);
        }
    }

    Ok(AssignmentOutcome {
        work_order: updated,
        warnings: advisories,
    })
}
