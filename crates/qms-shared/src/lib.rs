//! # QMS Shared
//!
//! Wire types exchanged with the QuickMySlot REST backend: login payloads,
//! list parameters, the paginated envelope and error-body parsing.

pub mod dto;
pub mod response;

pub use dto::{ListParams, LoginResponse, Page, PageError};
pub use response::{ApiResponse, ErrorBody};
