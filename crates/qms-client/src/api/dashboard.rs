use serde_json::Value;

use qms_core::ApiError;
use qms_core::domain::{HttpRequest, Tag};

use crate::cache::{QueryCache, QueryEndpoint};

pub const TAG: Tag = Tag::new("dashboard");

pub const GET_OVERVIEW: QueryEndpoint<()> = QueryEndpoint::new(
    "dashboard",
    "getdashboard",
    |_| HttpRequest::get("admin/overview"),
    &[TAG],
);

/// Headline counters of the dashboard landing page.
#[derive(Clone)]
pub struct DashboardApi {
    cache: QueryCache,
}

impl DashboardApi {
    pub fn new(cache: QueryCache) -> Self {
        Self { cache }
    }

    pub async fn overview(&self) -> Result<Value, ApiError> {
        self.cache.query(&GET_OVERVIEW, &()).await
    }
}
