//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    AssignWorkOrderRequest, AssignWorkOrderResponse, CreateScheduleRequest,
    CreateTechnicianRequest, CreateWorkOrderRequest, HealthResponse, ScheduleListResponse,
    ScheduleQuery, ScheduleWithUtilization, Technician, TechnicianListResponse,
    UpdateScheduleRequest, UtilizationStatsResponse, WorkOrder, WorkOrderListResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{ScheduleId, TechnicianId, WorkOrderId};
use crate::db::repository::{
    FullRepository, NewSchedule, NewTechnician, NewWorkOrder, ScheduleFilter,
    ScheduleRepository, TechnicianRepository, WorkOrderRepository,
};
use crate::services;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the
/// repository is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let repository = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        repository,
    }))
}

// =============================================================================
// Schedules
// =============================================================================

/// POST /v1/schedules
///
/// Create a schedule for a technician/day slot. A second schedule for the
/// same slot is a conflict.
pub async fn create_schedule(
    State(state): State<AppState>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<ScheduleWithUtilization>), AppError> {
    let schedule = services::create_schedule(
        state.repository.as_ref(),
        &state.hub,
        NewSchedule {
            technician_id: TechnicianId::new(request.technician_id),
            date: request.date,
            available_hours: request.available_hours,
            scheduled_hours: request.scheduled_hours,
            is_available: request.is_available,
            notes: request.notes,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(schedule.into())))
}

/// GET /v1/schedules
///
/// List schedules, optionally bounded by date range and technician.
pub async fn list_schedules(
    State(state): State<AppState>,
    Query(query): Query<ScheduleQuery>,
) -> HandlerResult<ScheduleListResponse> {
    let schedules = state
        .repository
        .list_schedules(ScheduleFilter {
            start_date: query.start_date,
            end_date: query.end_date,
            technician_id: query.technician_id.map(TechnicianId::new),
        })
        .await?;

    let schedules: Vec<ScheduleWithUtilization> =
        schedules.into_iter().map(Into::into).collect();
    let total = schedules.len();

    Ok(Json(ScheduleListResponse { schedules, total }))
}

/// GET /v1/schedules/utilization
///
/// Aggregate utilization statistics over a date range, optionally for a
/// single technician.
pub async fn utilization_stats(
    State(state): State<AppState>,
    Query(query): Query<ScheduleQuery>,
) -> HandlerResult<UtilizationStatsResponse> {
    let report = services::utilization_stats(
        state.repository.as_ref(),
        ScheduleFilter {
            start_date: query.start_date,
            end_date: query.end_date,
            technician_id: query.technician_id.map(TechnicianId::new),
        },
    )
    .await?;

    Ok(Json(UtilizationStatsResponse {
        summary: report.summary,
        schedules: report.schedules,
    }))
}

/// GET /v1/schedules/{schedule_id}
pub async fn get_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<i64>,
) -> HandlerResult<ScheduleWithUtilization> {
    let schedule = state
        .repository
        .get_schedule(ScheduleId::new(schedule_id))
        .await?;
    Ok(Json(schedule.into()))
}

/// PATCH /v1/schedules/{schedule_id}
///
/// Direct edit of hours, availability, or notes.
pub async fn update_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<i64>,
    Json(request): Json<UpdateScheduleRequest>,
) -> HandlerResult<ScheduleWithUtilization> {
    let schedule = services::update_schedule(
        state.repository.as_ref(),
        &state.hub,
        ScheduleId::new(schedule_id),
        services::ScheduleUpdate {
            available_hours: request.available_hours,
            scheduled_hours: request.scheduled_hours,
            is_available: request.is_available,
            notes: request.notes,
        },
    )
    .await?;

    Ok(Json(schedule.into()))
}

// =============================================================================
// Technicians
// =============================================================================

/// POST /v1/technicians
pub async fn create_technician(
    State(state): State<AppState>,
    Json(request): Json<CreateTechnicianRequest>,
) -> Result<(StatusCode, Json<Technician>), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::BadRequest("technician name is required".to_string()));
    }

    let technician = state
        .repository
        .insert_technician(NewTechnician {
            name: request.name,
            email: request.email,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(technician)))
}

/// GET /v1/technicians
pub async fn list_technicians(
    State(state): State<AppState>,
) -> HandlerResult<TechnicianListResponse> {
    let technicians = state.repository.list_technicians().await?;
    let total = technicians.len();
    Ok(Json(TechnicianListResponse { technicians, total }))
}

/// GET /v1/technicians/{technician_id}
pub async fn get_technician(
    State(state): State<AppState>,
    Path(technician_id): Path<i64>,
) -> HandlerResult<Technician> {
    let technician = state
        .repository
        .get_technician(TechnicianId::new(technician_id))
        .await?;
    Ok(Json(technician))
}

// =============================================================================
// Work Orders
// =============================================================================

/// POST /v1/work-orders
pub async fn create_work_order(
    State(state): State<AppState>,
    Json(request): Json<CreateWorkOrderRequest>,
) -> Result<(StatusCode, Json<WorkOrder>), AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::BadRequest("work order title is required".to_string()));
    }

    let work_order = state
        .repository
        .insert_work_order(NewWorkOrder {
            title: request.title,
            description: request.description,
            priority: request.priority,
            estimated_hours: request.estimated_hours,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(work_order)))
}

/// GET /v1/work-orders
pub async fn list_work_orders(
    State(state): State<AppState>,
) -> HandlerResult<WorkOrderListResponse> {
    let work_orders = state.repository.list_work_orders().await?;
    let total = work_orders.len();
    Ok(Json(WorkOrderListResponse { work_orders, total }))
}

/// GET /v1/work-orders/{work_order_id}
pub async fn get_work_order(
    State(state): State<AppState>,
    Path(work_order_id): Path<i64>,
) -> HandlerResult<WorkOrder> {
    let work_order = state
        .repository
        .get_work_order(WorkOrderId::new(work_order_id))
        .await?;
    Ok(Json(work_order))
}

/// POST /v1/work-orders/{work_order_id}/assign
///
/// Bind a work order to a technician/day slot. Warning advisories come
/// back alongside the updated work order; error advisories reject with a
/// conflict response carrying them, and nothing is mutated.
pub async fn assign_work_order(
    State(state): State<AppState>,
    Path(work_order_id): Path<i64>,
    Json(request): Json<AssignWorkOrderRequest>,
) -> HandlerResult<AssignWorkOrderResponse> {
    let outcome = services::assign_work_order(
        state.repository.as_ref(),
        &state.hub,
        WorkOrderId::new(work_order_id),
        services::AssignmentRequest {
            assigned_to_id: TechnicianId::new(request.assigned_to_id),
            scheduled_start_date: request.scheduled_start_date,
            estimated_hours: request.estimated_hours,
            force_assign: request.force_assign,
        },
    )
    .await?;

    Ok(Json(AssignWorkOrderResponse {
        work_order: outcome.work_order,
        warnings: if outcome.warnings.is_empty() {
            None
        } else {
            Some(outcome.warnings)
        },
    }))
}
