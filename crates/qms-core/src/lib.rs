//! # QMS Core
//!
//! The domain layer of the QuickMySlot admin client.
//! This crate contains the session model, the request description consumed by
//! transports, the error taxonomy and the port traits. It has zero
//! infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;

pub use error::{ApiError, AuthError};
