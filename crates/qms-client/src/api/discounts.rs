//! Cashback ranges applied to booking totals.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use qms_core::ApiError;
use qms_core::domain::{HttpRequest, Tag};

use super::Id;
use crate::cache::{MutationEndpoint, QueryCache, QueryEndpoint};

pub const TAG: Tag = Tag::new("setDiscountApi");
const RESOURCE: &str = "setDiscountApi";

pub const GET_DISCOUNTS: QueryEndpoint<()> = QueryEndpoint::new(
    RESOURCE,
    "getsetDiscount",
    |_| HttpRequest::get("admin/cashback-setting-list"),
    &[TAG],
);

pub const ADD_DISCOUNT: MutationEndpoint<DiscountRange> = MutationEndpoint::new(
    RESOURCE,
    "addDiscount",
    |range| HttpRequest::post("admin/cashback-setting-store").with_json(range.to_json()),
    &[TAG],
);

pub const UPDATE_DISCOUNT: MutationEndpoint<(Id, DiscountRange)> = MutationEndpoint::new(
    RESOURCE,
    "updateDiscount",
    |(id, range)| {
        HttpRequest::post(format!("admin/cashback-setting-update/{id}")).with_json(range.to_json())
    },
    &[TAG],
);

pub const DELETE_DISCOUNT: MutationEndpoint<Id> = MutationEndpoint::new(
    RESOURCE,
    "deleteDiscount",
    |id| HttpRequest::delete(format!("admin/cashback-setting-update/{id}")),
    &[TAG],
);

/// Fixed cashback for booking totals between `min_amount` and `max_amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountRange {
    pub min_amount: f64,
    pub max_amount: f64,
    pub cashback_amount: f64,
}

impl DiscountRange {
    fn to_json(&self) -> Value {
        serde_json::json!({
            "min_amount": self.min_amount,
            "max_amount": self.max_amount,
            "cashback_amount": self.cashback_amount,
        })
    }
}

#[derive(Clone)]
pub struct DiscountsApi {
    cache: QueryCache,
}

impl DiscountsApi {
    pub fn new(cache: QueryCache) -> Self {
        Self { cache }
    }

    pub async fn list(&self) -> Result<Value, ApiError> {
        self.cache.query(&GET_DISCOUNTS, &()).await
    }

    pub async fn add(&self, range: DiscountRange) -> Result<Value, ApiError> {
        self.cache.mutate(&ADD_DISCOUNT, &range).await
    }

    pub async fn update(&self, id: Id, range: DiscountRange) -> Result<Value, ApiError> {
        self.cache.mutate(&UPDATE_DISCOUNT, &(id, range)).await
    }

    pub async fn delete(&self, id: Id) -> Result<Value, ApiError> {
        self.cache.mutate(&DELETE_DISCOUNT, &id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qms_core::domain::{HttpMethod, RequestBody};
    use serde_json::json;

    #[test]
    fn test_ranges_are_sent_as_json() {
        let range = DiscountRange {
            min_amount: 100.0,
            max_amount: 500.0,
            cashback_amount: 25.0,
        };
        let request = UPDATE_DISCOUNT.request(&(3, range));

        assert_eq!(request.path, "admin/cashback-setting-update/3");
        assert_eq!(
            request.body,
            RequestBody::Json(json!({"min_amount": 100.0, "max_amount": 500.0, "cashback_amount": 25.0}))
        );
    }

    #[test]
    fn test_delete_uses_the_delete_verb() {
        assert_eq!(DELETE_DISCOUNT.request(&3).method, HttpMethod::Delete);
    }
}
