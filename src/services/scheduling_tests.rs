use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use super::scheduling::*;
use crate::api::{
    Severity, Technician, TechnicianId, WorkOrder, WorkOrderPriority, WorkOrderStatus,
};
use crate::db::repository::{
    NewSchedule, NewTechnician, NewWorkOrder, RepositoryError, ScheduleFilter,
    ScheduleRepository, TechnicianRepository, WorkOrderRepository,
};
use crate::db::LocalRepository;
use crate::realtime::{EventKind, Hub, Room};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn start_at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

async fn seed_technician(repo: &LocalRepository) -> Technician {
    repo.insert_technician(NewTechnician {
        name: "Dana".to_string(),
        email: None,
    })
    .await
    .unwrap()
}

async fn seed_work_order(repo: &LocalRepository) -> WorkOrder {
    repo.insert_work_order(NewWorkOrder {
        title: "Replace compressor".to_string(),
        description: None,
        priority: WorkOrderPriority::High,
        estimated_hours: None,
    })
    .await
    .unwrap()
}

fn assignment(technician: TechnicianId, hours: f64, force: bool) -> AssignmentRequest {
    AssignmentRequest {
        assigned_to_id: technician,
        scheduled_start_date: start_at(2025, 6, 2, 9),
        estimated_hours: hours,
        force_assign: force,
    }
}

#[tokio::test]
async fn test_assign_creates_default_slot() {
    let repo = LocalRepository::new();
    let hub = Hub::new();
    let technician = seed_technician(&repo).await;
    let work_order = seed_work_order(&repo).await;

    let outcome = assign_work_order(
        &repo,
        &hub,
        work_order.id,
        assignment(technician.id, 4.0, false),
    )
    .await
    .unwrap();

    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.work_order.status, WorkOrderStatus::Assigned);
    assert_eq!(outcome.work_order.assigned_to_id, Some(technician.id));
    assert_eq!(outcome.work_order.estimated_hours, Some(4.0));
    assert_eq!(
        outcome.work_order.scheduled_end_date,
        Some(start_at(2025, 6, 2, 13))
    );

    let slot = repo
        .find_schedule_for_slot(technician.id, date(2025, 6, 2))
        .await
        .unwrap()
        .expect("slot should have been created");
    assert_eq!(slot.available_hours, 8.0);
    assert_eq!(slot.scheduled_hours, 4.0);
}

#[tokio::test]
async fn test_assign_over_capacity_warns_but_proceeds() {
    let repo = LocalRepository::new();
    let hub = Hub::new();
    let technician = seed_technician(&repo).await;
    let work_order = seed_work_order(&repo).await;

    let mut slot = NewSchedule::default_day(technician.id, date(2025, 6, 2));
    slot.scheduled_hours = 6.0;
    repo.insert_schedule(slot).await.unwrap();

    // 6 + 4 = 10 of 8 hours -> 125%, warning but not fatal.
    let outcome = assign_work_order(
        &repo,
        &hub,
        work_order.id,
        assignment(technician.id, 4.0, false),
    )
    .await
    .unwrap();

    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].severity, Severity::Warning);
    assert!(outcome.warnings[0].message.contains("exceeding 100% utilization"));

    let slot = repo
        .find_schedule_for_slot(technician.id, date(2025, 6, 2))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(slot.scheduled_hours, 10.0);
    assert!(slot.utilization().is_overallocated);
}

#[tokio::test]
async fn test_assign_at_capacity_is_rejected_without_force() {
    let repo = LocalRepository::new();
    let hub = Hub::new();
    let technician = seed_technician(&repo).await;
    let work_order = seed_work_order(&repo).await;

    let mut slot = NewSchedule::default_day(technician.id, date(2025, 6, 2));
    slot.scheduled_hours = 8.0;
    repo.insert_schedule(slot).await.unwrap();

    let err = assign_work_order(
        &repo,
        &hub,
        work_order.id,
        assignment(technician.id, 2.0, false),
    )
    .await
    .unwrap_err();

    match err {
        SchedulingError::Rejected { advisories, .. } => {
            assert!(advisories.iter().any(|a| a.severity == Severity::Error));
            assert!(advisories[0].message.contains("already at capacity"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }

    // No mutation happened.
    let slot = repo
        .find_schedule_for_slot(technician.id, date(2025, 6, 2))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(slot.scheduled_hours, 8.0);
    let work_order = repo.get_work_order(work_order.id).await.unwrap();
    assert_eq!(work_order.status, WorkOrderStatus::Open);
    assert!(work_order.assigned_to_id.is_none());
}

#[tokio::test]
async fn test_force_assign_downgrades_capacity_error() {
    let repo = LocalRepository::new();
    let hub = Hub::new();
    let technician = seed_technician(&repo).await;
    let work_order = seed_work_order(&repo).await;

    let mut slot = NewSchedule::default_day(technician.id, date(2025, 6, 2));
    slot.scheduled_hours = 8.0;
    repo.insert_schedule(slot).await.unwrap();

    let outcome = assign_work_order(
        &repo,
        &hub,
        work_order.id,
        assignment(technician.id, 2.0, true),
    )
    .await
    .unwrap();

    assert!(outcome
        .warnings
        .iter()
        .all(|a| a.severity == Severity::Warning));
    assert!(outcome.warnings[0].message.contains("assignment forced"));

    let slot = repo
        .find_schedule_for_slot(technician.id, date(2025, 6, 2))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(slot.scheduled_hours, 10.0);
}

#[tokio::test]
async fn test_assign_unavailable_day_is_rejected() {
    let repo = LocalRepository::new();
    let hub = Hub::new();
    let technician = seed_technician(&repo).await;
    let work_order = seed_work_order(&repo).await;

    let mut slot = NewSchedule::default_day(technician.id, date(2025, 6, 2));
    slot.is_available = false;
    repo.insert_schedule(slot).await.unwrap();

    let err = assign_work_order(
        &repo,
        &hub,
        work_order.id,
        assignment(technician.id, 2.0, false),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SchedulingError::Rejected { .. }));

    // Forcing turns the rejection into a warning.
    let outcome = assign_work_order(
        &repo,
        &hub,
        work_order.id,
        assignment(technician.id, 2.0, true),
    )
    .await
    .unwrap();
    assert!(outcome.warnings[0].message.contains("unavailable"));
}

#[tokio::test]
async fn test_reassignment_moves_hours_between_slots() {
    let repo = LocalRepository::new();
    let hub = Hub::new();
    let first = seed_technician(&repo).await;
    let second = repo
        .insert_technician(NewTechnician {
            name: "Lee".to_string(),
            email: None,
        })
        .await
        .unwrap();
    let work_order = seed_work_order(&repo).await;

    assign_work_order(&repo, &hub, work_order.id, assignment(first.id, 4.0, false))
        .await
        .unwrap();

    // Move to the second technician on a different day.
    let outcome = assign_work_order(
        &repo,
        &hub,
        work_order.id,
        AssignmentRequest {
            assigned_to_id: second.id,
            scheduled_start_date: start_at(2025, 6, 3, 8),
            estimated_hours: 3.0,
            force_assign: false,
        },
    )
    .await
    .unwrap();

    assert_eq!(outcome.work_order.assigned_to_id, Some(second.id));

    let old_slot = repo
        .find_schedule_for_slot(first.id, date(2025, 6, 2))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(old_slot.scheduled_hours, 0.0, "source slot released");

    let new_slot = repo
        .find_schedule_for_slot(second.id, date(2025, 6, 3))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(new_slot.scheduled_hours, 3.0);
}

#[tokio::test]
async fn test_reassignment_same_slot_replaces_estimate() {
    let repo = LocalRepository::new();
    let hub = Hub::new();
    let technician = seed_technician(&repo).await;
    let work_order = seed_work_order(&repo).await;

    assign_work_order(
        &repo,
        &hub,
        work_order.id,
        assignment(technician.id, 6.0, false),
    )
    .await
    .unwrap();

    // Same technician and day, smaller estimate: 6 is replaced by 3.
    assign_work_order(
        &repo,
        &hub,
        work_order.id,
        assignment(technician.id, 3.0, false),
    )
    .await
    .unwrap();

    let slot = repo
        .find_schedule_for_slot(technician.id, date(2025, 6, 2))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(slot.scheduled_hours, 3.0);
}

#[tokio::test]
async fn test_assign_validation_failures() {
    let repo = LocalRepository::new();
    let hub = Hub::new();
    let technician = seed_technician(&repo).await;
    let work_order = seed_work_order(&repo).await;

    // Non-positive hours.
    let err = assign_work_order(
        &repo,
        &hub,
        work_order.id,
        assignment(technician.id, 0.0, false),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SchedulingError::Validation(_)));

    // Unknown technician.
    let err = assign_work_order(
        &repo,
        &hub,
        work_order.id,
        assignment(TechnicianId::new(404), 2.0, false),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SchedulingError::Validation(_)));

    // Inactive technician.
    let mut inactive = technician.clone();
    inactive.is_active = false;
    repo.update_technician(inactive).await.unwrap();
    let err = assign_work_order(
        &repo,
        &hub,
        work_order.id,
        assignment(technician.id, 2.0, false),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SchedulingError::Validation(_)));
}

#[tokio::test]
async fn test_assign_terminal_work_order_is_rejected() {
    let repo = LocalRepository::new();
    let hub = Hub::new();
    let technician = seed_technician(&repo).await;
    let work_order = seed_work_order(&repo).await;

    let mut completed = work_order.clone();
    completed.status = WorkOrderStatus::Completed;
    repo.update_work_order(completed).await.unwrap();

    let err = assign_work_order(
        &repo,
        &hub,
        work_order.id,
        assignment(technician.id, 2.0, false),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SchedulingError::Validation(_)));
}

#[tokio::test]
async fn test_create_schedule_rejects_unknown_technician_and_duplicates() {
    let repo = LocalRepository::new();
    let hub = Hub::new();
    let technician = seed_technician(&repo).await;

    let err = create_schedule(
        &repo,
        &hub,
        NewSchedule::default_day(TechnicianId::new(404), date(2025, 6, 2)),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SchedulingError::Validation(_)));

    create_schedule(
        &repo,
        &hub,
        NewSchedule::default_day(technician.id, date(2025, 6, 2)),
    )
    .await
    .unwrap();

    let err = create_schedule(
        &repo,
        &hub,
        NewSchedule::default_day(technician.id, date(2025, 6, 2)),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        SchedulingError::Repository(RepositoryError::Conflict { .. })
    ));
}

#[tokio::test]
async fn test_update_schedule_broadcasts_new_state() {
    let repo = LocalRepository::new();
    let hub = Hub::new();
    let technician = seed_technician(&repo).await;
    let schedule = create_schedule(
        &repo,
        &hub,
        NewSchedule::default_day(technician.id, date(2025, 6, 2)),
    )
    .await
    .unwrap();

    let mut rx = hub.subscribe(Room::TechnicianSchedules {
        technician_id: technician.id,
    });

    let updated = update_schedule(
        &repo,
        &hub,
        schedule.id,
        ScheduleUpdate {
            available_hours: Some(6.0),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.available_hours, 6.0);

    let event = rx.recv().await.unwrap();
    assert_eq!(event.event, EventKind::ScheduleUpdate);
    assert_eq!(event.payload["availableHours"], 6.0);
}

#[tokio::test]
async fn test_overallocation_broadcasts_conflict() {
    let repo = LocalRepository::new();
    let hub = Hub::new();
    let technician = seed_technician(&repo).await;
    let work_order = seed_work_order(&repo).await;

    let mut slot = NewSchedule::default_day(technician.id, date(2025, 6, 2));
    slot.scheduled_hours = 6.0;
    repo.insert_schedule(slot).await.unwrap();

    let mut date_rx = hub.subscribe(Room::DateSchedules {
        date: date(2025, 6, 2),
    });
    let mut global_rx = hub.subscribe(Room::Schedules);

    assign_work_order(
        &repo,
        &hub,
        work_order.id,
        assignment(technician.id, 4.0, false),
    )
    .await
    .unwrap();

    // The date room sees the schedule update then the conflict.
    let first = date_rx.recv().await.unwrap();
    assert_eq!(first.event, EventKind::ScheduleUpdate);
    let second = date_rx.recv().await.unwrap();
    assert_eq!(second.event, EventKind::ScheduleConflict);
    assert!(second.payload["message"]
        .as_str()
        .unwrap()
        .contains("overallocated"));

    // The global room additionally sees the reassignment event first.
    let kinds: Vec<EventKind> = [
        global_rx.recv().await.unwrap().event,
        global_rx.recv().await.unwrap().event,
        global_rx.recv().await.unwrap().event,
    ]
    .into();
    assert_eq!(
        kinds,
        vec![
            EventKind::WorkOrderReassignment,
            EventKind::ScheduleUpdate,
            EventKind::ScheduleConflict,
        ]
    );
}

#[tokio::test]
async fn test_utilization_stats_report() {
    let repo = LocalRepository::new();
    let hub = Hub::new();
    let technician = seed_technician(&repo).await;

    for (day, scheduled) in [(2, 6.0), (3, 8.0), (4, 8.8)] {
        let mut slot = NewSchedule::default_day(technician.id, date(2025, 6, day));
        slot.scheduled_hours = scheduled;
        create_schedule(&repo, &hub, slot).await.unwrap();
    }

    let report = utilization_stats(
        &repo,
        ScheduleFilter {
            start_date: Some(date(2025, 6, 1)),
            end_date: Some(date(2025, 6, 30)),
            technician_id: Some(technician.id),
        },
    )
    .await
    .unwrap();

    assert_eq!(report.summary.total_schedules, 3);
    assert_eq!(report.summary.underutilized_count, 1);
    assert_eq!(report.summary.optimal_count, 1);
    assert_eq!(report.summary.overallocated_count, 1);
    assert_eq!(report.schedules.len(), 3);
    assert_eq!(
        report.schedules[0].utilization.utilization_percentage,
        75.0
    );

    let err = utilization_stats(
        &repo,
        ScheduleFilter {
            start_date: Some(date(2025, 6, 30)),
            end_date: Some(date(2025, 6, 1)),
            technician_id: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SchedulingError::Validation(_)));
}
