use serde_json::Value;

use qms_core::ApiError;
use qms_core::domain::{HttpRequest, Tag};

use super::RoleFilter;
use crate::cache::{QueryCache, QueryEndpoint};

pub const TAG: Tag = Tag::new("transactionApi");

pub const GET_TRANSACTIONS: QueryEndpoint<RoleFilter> = QueryEndpoint::new(
    "transactionApi",
    "gettransaction",
    |filter| HttpRequest::get("admin/all-transactions").with_query("role", &filter.role),
    &[TAG],
);

/// Payment history, filtered by the paying role (`user` or `vendor`).
#[derive(Clone)]
pub struct TransactionsApi {
    cache: QueryCache,
}

impl TransactionsApi {
    pub fn new(cache: QueryCache) -> Self {
        Self { cache }
    }

    pub async fn list(&self, role: &str) -> Result<Value, ApiError> {
        self.cache.query(&GET_TRANSACTIONS, &RoleFilter::new(role)).await
    }
}
