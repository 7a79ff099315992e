//! Persistence module for schedules, work orders, and technicians.
//!
//! This module provides abstractions for storage operations via the
//! Repository pattern, allowing different backends to be swapped without
//! touching the service layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP Layer (handlers, middleware)                      │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services::scheduling) - Business Logic  │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Trait (repository) - Abstract Interface     │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌──────────────────────────────────────────────┐
//!     │             Local Repository                  │
//!     │               (in-memory)                     │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! The `(technician, date)` uniqueness invariant for schedules is owned by
//! the repository, standing in for a database unique index, so concurrent
//! check-then-write sequences in handlers cannot create duplicate slots.
//!
//! There is no module-level repository singleton: callers construct a
//! repository at process start and pass it down explicitly (it lives in the
//! HTTP layer's `AppState`). An ORM-backed implementation would plug in at
//! the [`repository::FullRepository`] seam.

pub mod repositories;
pub mod repository;

pub use repositories::LocalRepository;
pub use repository::{
    ErrorContext, FullRepository, NewSchedule, NewTechnician, NewWorkOrder, RepositoryError,
    RepositoryResult, ScheduleFilter, ScheduleRepository, TechnicianRepository,
    WorkOrderRepository,
};
