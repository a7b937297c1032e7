//! Bids and their entries.

use serde_json::Value;

use qms_core::ApiError;
use qms_core::domain::{FormData, HttpRequest, Tag};

use super::{Id, empty_form};
use crate::cache::{MutationEndpoint, QueryCache, QueryEndpoint};

pub const TAG: Tag = Tag::new("bidApi");
const RESOURCE: &str = "bidApi";

pub const GET_BIDS: QueryEndpoint<()> =
    QueryEndpoint::new(RESOURCE, "getbid", |_| HttpRequest::get("admin/bids"), &[TAG]);

pub const GET_BID_DETAILS: QueryEndpoint<Id> = QueryEndpoint::new(
    RESOURCE,
    "getbidDetails",
    |id| HttpRequest::get(format!("admin/bids/{id}")),
    &[TAG],
);

pub const GET_BID_ENTRIES: QueryEndpoint<Id> = QueryEndpoint::new(
    RESOURCE,
    "getbidEntryList",
    |id| HttpRequest::get(format!("bids/{id}/entries")),
    &[TAG],
);

pub const ADD_BID: MutationEndpoint<FormData> = MutationEndpoint::new(
    RESOURCE,
    "addBid",
    |form| HttpRequest::post("admin/bids").with_form(form.clone()),
    &[TAG],
);

pub const UPDATE_BID: MutationEndpoint<(Id, FormData)> = MutationEndpoint::new(
    RESOURCE,
    "updateBid",
    |(id, form)| HttpRequest::post(format!("admin/bids/update/{id}")).with_form(form.clone()),
    &[TAG],
);

pub const DELETE_BID: MutationEndpoint<Id> = MutationEndpoint::new(
    RESOURCE,
    "deleteBid",
    |id| HttpRequest::post(format!("admin/bids/delete/{id}")).with_form(empty_form()),
    &[TAG],
);

pub const APPROVE_ENTRY: MutationEndpoint<Id> = MutationEndpoint::new(
    RESOURCE,
    "BidApproved",
    |id| HttpRequest::post(format!("bid-entri-aaproved/{id}")).with_form(empty_form()),
    &[TAG],
);

pub const REJECT_ENTRY: MutationEndpoint<Id> = MutationEndpoint::new(
    RESOURCE,
    "BidReject",
    |id| HttpRequest::post(format!("bid-entri-reject/{id}")).with_form(empty_form()),
    &[TAG],
);

#[derive(Clone)]
pub struct BidsApi {
    cache: QueryCache,
}

impl BidsApi {
    pub fn new(cache: QueryCache) -> Self {
        Self { cache }
    }

    pub async fn list(&self) -> Result<Value, ApiError> {
        self.cache.query(&GET_BIDS, &()).await
    }

    pub async fn details(&self, id: Id) -> Result<Value, ApiError> {
        self.cache.query(&GET_BID_DETAILS, &id).await
    }

    pub async fn entries(&self, bid: Id) -> Result<Value, ApiError> {
        self.cache.query(&GET_BID_ENTRIES, &bid).await
    }

    pub async fn add(&self, form: FormData) -> Result<Value, ApiError> {
        self.cache.mutate(&ADD_BID, &form).await
    }

    pub async fn update(&self, id: Id, form: FormData) -> Result<Value, ApiError> {
        self.cache.mutate(&UPDATE_BID, &(id, form)).await
    }

    pub async fn delete(&self, id: Id) -> Result<Value, ApiError> {
        self.cache.mutate(&DELETE_BID, &id).await
    }

    pub async fn approve_entry(&self, entry: Id) -> Result<Value, ApiError> {
        self.cache.mutate(&APPROVE_ENTRY, &entry).await
    }

    pub async fn reject_entry(&self, entry: Id) -> Result<Value, ApiError> {
        self.cache.mutate(&REJECT_ENTRY, &entry).await
    }
}
