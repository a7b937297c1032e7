//! REST transport implementations.

mod http;

pub use http::{HttpConfig, ReqwestTransport};
