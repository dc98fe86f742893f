//! Data models and serialization helpers.
//!
//! This module contains the parameter descriptor types the host introspects,
//! the per-call invocation request, the launch report returned by the
//! dispatcher, and the lenient deserializers used for host-supplied values.
pub mod report;
pub mod request;
pub mod schema;
pub mod serde_helpers;
