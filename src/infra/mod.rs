//! Infrastructure adapters and runtime bootstrap.

pub mod email;
pub mod error;
pub mod http;
pub mod telemetry;
