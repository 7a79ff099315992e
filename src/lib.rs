//! # WOMS Rust Backend
//!
//! Backend service for the Work Order Management System (WOMS).
//!
//! This crate tracks maintenance work orders and technician day schedules,
//! computes day-level capacity utilization, and exposes a REST API plus a
//! WebSocket broadcast layer via Axum. Request admission on the API surface
//! is guarded by a per-identity, per-route fixed-window rate limiter.
//!
//! ## Features
//!
//! - **Schedules**: one record per technician per calendar day with
//!   available/scheduled hours and derived utilization classification
//! - **Work Orders**: creation, lookup, and assignment onto technician/day
//!   slots with warning/error advisories
//! - **Utilization Stats**: aggregate reductions over a date range
//! - **Real-Time**: room-based broadcast of schedule and assignment events
//! - **Rate Limiting**: fixed-window request admission with preset quotas
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: Newtype ids and core serializable domain types
//! - [`config`]: Server configuration from file and environment
//! - [`models`]: Pure domain logic (utilization classification)
//! - [`db`]: Repository trait, error types, and the in-memory backend
//! - [`services`]: Business orchestration between the repository and HTTP
//! - [`realtime`]: Room/channel broadcast hub and event envelopes
//! - [`http`]: Axum-based HTTP server, handlers, and middleware

pub mod api;

#[cfg(test)]
mod api_tests;

pub mod config;
pub mod db;
pub mod models;

pub mod realtime;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
