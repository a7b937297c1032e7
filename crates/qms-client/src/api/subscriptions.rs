//! Subscription plans sold to users and vendors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use qms_core::ApiError;
use qms_core::domain::{FormData, HttpRequest, Tag};

use super::{Id, empty_form};
use crate::cache::{MutationEndpoint, QueryCache, QueryEndpoint};

pub const TAG: Tag = Tag::new("subscriptionApi");
const RESOURCE: &str = "subscriptionApi";

pub const GET_SUBSCRIPTIONS: QueryEndpoint<PlanFilter> = QueryEndpoint::new(
    RESOURCE,
    "getsubscription",
    |filter| {
        HttpRequest::get("subscriptions")
            .with_query("type", &filter.kind)
            .with_query("validity", &filter.validity)
    },
    &[TAG],
);

pub const ADD_SUBSCRIPTION: MutationEndpoint<PlanForm> = MutationEndpoint::new(
    RESOURCE,
    "addsubscription",
    |form| HttpRequest::post("admin/subscriptions").with_form(form.to_form()),
    &[TAG],
);

pub const UPDATE_SUBSCRIPTION: MutationEndpoint<(Id, PlanForm)> = MutationEndpoint::new(
    RESOURCE,
    "updatesubscription",
    |(id, form)| HttpRequest::post(format!("admin/subscriptions/update/{id}")).with_form(form.to_form()),
    &[TAG],
);

pub const DELETE_SUBSCRIPTION: MutationEndpoint<Id> = MutationEndpoint::new(
    RESOURCE,
    "deletesubscription",
    |id| HttpRequest::post(format!("admin/subscriptions/delete/{id}")).with_form(empty_form()),
    &[TAG],
);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanFilter {
    /// `user` or `vendor`.
    #[serde(rename = "type")]
    pub kind: String,
    /// `monthly`, `yearly`, ...
    pub validity: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanForm {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub kind: String,
    pub validity: String,
    pub valid_days: u32,
    /// Feature bullet points.
    pub extra: Vec<String>,
    pub key_word: Option<String>,
}

impl PlanForm {
    pub fn to_form(&self) -> FormData {
        FormData::new()
            .text("subscription_name", &self.name)
            .text("description", &self.description)
            .text("price", self.price)
            .text("type", &self.kind)
            .text("validity", &self.validity)
            .text("valid_days", self.valid_days)
            .indexed("extra", &self.extra)
            .optional_text("extra[key_word]", self.key_word.as_deref().filter(|k| !k.is_empty()))
    }
}

#[derive(Clone)]
pub struct SubscriptionsApi {
    cache: QueryCache,
}

impl SubscriptionsApi {
    pub fn new(cache: QueryCache) -> Self {
        Self { cache }
    }

    pub async fn list(&self, filter: &PlanFilter) -> Result<Value, ApiError> {
        self.cache.query(&GET_SUBSCRIPTIONS, filter).await
    }

    pub async fn add(&self, form: PlanForm) -> Result<Value, ApiError> {
        self.cache.mutate(&ADD_SUBSCRIPTION, &form).await
    }

    pub async fn update(&self, id: Id, form: PlanForm) -> Result<Value, ApiError> {
        self.cache.mutate(&UPDATE_SUBSCRIPTION, &(id, form)).await
    }

    pub async fn delete(&self, id: Id) -> Result<Value, ApiError> {
        self.cache.mutate(&DELETE_SUBSCRIPTION, &id).await
    }
}
