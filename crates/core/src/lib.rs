//! Core business logic for lms-rs.
//!
//! Services validate input, enforce the write rules of each resource and
//! call into the repositories of `lms-db`. They know nothing about HTTP.

pub mod services;

pub use services::*;
