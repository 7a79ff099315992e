use crate::api::*;

#[test]
fn test_schedule_id_new() {
    let id = ScheduleId::new(42);
    assert_eq!(id.value(), 42);
}

#[test]
fn test_entity_id_equality() {
    let id1 = TechnicianId::new(100);
    let id2 = TechnicianId::new(100);
    let id3 = TechnicianId::new(101);

    assert_eq!(id1, id2);
    assert_ne!(id1, id3);
}

#[test]
fn test_entity_id_ordering() {
    let id1 = WorkOrderId::new(1);
    let id2 = WorkOrderId::new(2);

    assert!(id1 < id2);
    assert!(id2 > id1);
}

#[test]
fn test_entity_id_hash() {
    use std::collections::HashSet;

    let mut set = HashSet::new();
    set.insert(ScheduleId::new(1));
    set.insert(ScheduleId::new(2));
    set.insert(ScheduleId::new(1)); // Duplicate

    assert_eq!(set.len(), 2);
}

#[test]
fn test_entity_id_serializes_transparently() {
    let json = serde_json::to_string(&WorkOrderId::new(7)).unwrap();
    assert_eq!(json, "7");
}

#[test]
fn test_schedule_serializes_camel_case() {
    let schedule = Schedule {
        id: ScheduleId::new(1),
        technician_id: TechnicianId::new(2),
        date: chrono::NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        available_hours: 8.0,
        scheduled_hours: 6.0,
        is_available: true,
        notes: None,
    };

    let value = serde_json::to_value(&schedule).unwrap();
    assert_eq!(value["technicianId"], 2);
    assert_eq!(value["availableHours"], 8.0);
    assert_eq!(value["date"], "2025-03-14");
    assert!(value.get("notes").is_none());
}

#[test]
fn test_advisory_constructors() {
    let warning = Advisory::warning("heads up");
    assert_eq!(warning.severity, Severity::Warning);

    let error = Advisory::error("stop");
    assert_eq!(error.severity, Severity::Error);
    assert_eq!(error.message, "stop");
}

#[test]
fn test_severity_serializes_lowercase() {
    assert_eq!(
        serde_json::to_string(&Severity::Warning).unwrap(),
        "\"warning\""
    );
    assert_eq!(serde_json::to_string(&Severity::Error).unwrap(), "\"error\"");
}
