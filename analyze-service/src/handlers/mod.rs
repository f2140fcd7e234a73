//! HTTP handlers for the analyze service.

pub mod analyze;
pub mod health;
