use serde_json::Value;

use qms_core::ApiError;
use qms_core::domain::{HttpRequest, Tag};

use crate::cache::{QueryCache, QueryEndpoint};

pub const TAG: Tag = Tag::new("ordersApi");

pub const GET_ORDERS: QueryEndpoint<()> = QueryEndpoint::new(
    "ordersApi",
    "getorders",
    |_| HttpRequest::get("admin/all-bookings"),
    &[TAG],
);

/// Bookings placed through the platform. Read-only.
#[derive(Clone)]
pub struct OrdersApi {
    cache: QueryCache,
}

impl OrdersApi {
    pub fn new(cache: QueryCache) -> Self {
        Self { cache }
    }

    pub async fn list(&self) -> Result<Value, ApiError> {
        self.cache.query(&GET_ORDERS, &()).await
    }
}
