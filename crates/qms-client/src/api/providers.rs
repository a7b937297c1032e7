//! Service providers (vendors).

use serde_json::Value;

use qms_core::ApiError;
use qms_core::domain::{FormData, HttpRequest, Tag};

use super::{Id, empty_form, flag};
use crate::cache::{MutationEndpoint, QueryCache, QueryEndpoint};

pub const TAG: Tag = Tag::new("provider");
const RESOURCE: &str = "providerApi";

pub const GET_PROVIDERS: QueryEndpoint<()> = QueryEndpoint::new(
    RESOURCE,
    "getproviders",
    |_| HttpRequest::get("admin/vendor/list"),
    &[TAG],
);

pub const ADD_PROVIDER: MutationEndpoint<FormData> = MutationEndpoint::new(
    RESOURCE,
    "addprovider",
    |form| HttpRequest::post("admin/provider-register").with_form(form.clone()),
    &[TAG],
);

pub const DELETE_PROVIDER: MutationEndpoint<Id> = MutationEndpoint::new(
    RESOURCE,
    "deleteprovider",
    |id| HttpRequest::post(format!("delete/{id}")).with_form(empty_form()),
    &[TAG],
);

pub const EDIT_PROVIDER: MutationEndpoint<(Id, FormData)> = MutationEndpoint::new(
    RESOURCE,
    "editprovider",
    |(id, form)| HttpRequest::put(format!("admin/provider-update/{id}")).with_form(form.clone()),
    &[TAG],
);

pub const UPDATE_PROVIDER_STATUS: MutationEndpoint<(Id, FormData)> = MutationEndpoint::new(
    RESOURCE,
    "updateproviderStatus",
    |(id, form)| HttpRequest::post(format!("change/status/{id}")).with_form(form.clone()),
    &[TAG],
);

pub const UPDATE_PROVIDER_HIGHLIGHT: MutationEndpoint<HighlightForm> = MutationEndpoint::new(
    RESOURCE,
    "updateproviderIsHighlighted",
    |form| HttpRequest::post("admin/vendor_highlighted").with_form(form.to_form()),
    &[TAG],
);

pub const ADD_PROVIDER_CASHBACK: MutationEndpoint<CashbackForm> = MutationEndpoint::new(
    RESOURCE,
    "addproviderCashback",
    |form| HttpRequest::post("admin/vendor_cashback").with_form(form.to_form()),
    &[TAG],
);

/// Show or hide a provider in the highlighted section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightForm {
    pub vendor: Id,
    pub highlighted: bool,
}

impl HighlightForm {
    pub fn to_form(&self) -> FormData {
        FormData::new()
            .text("is_highlighted", flag(self.highlighted))
            .text("vendor", self.vendor)
    }
}

/// Tie-up cashback percentage of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CashbackForm {
    pub vendor: Id,
    pub percent: u32,
}

impl CashbackForm {
    pub fn to_form(&self) -> FormData {
        FormData::new()
            .text("vendor", self.vendor)
            .text("is_cashback", format!("{}%", self.percent))
    }
}

#[derive(Clone)]
pub struct ProvidersApi {
    cache: QueryCache,
}

impl ProvidersApi {
    pub fn new(cache: QueryCache) -> Self {
        Self { cache }
    }

    pub async fn list(&self) -> Result<Value, ApiError> {
        self.cache.query(&GET_PROVIDERS, &()).await
    }

    pub async fn add(&self, form: FormData) -> Result<Value, ApiError> {
        self.cache.mutate(&ADD_PROVIDER, &form).await
    }

    pub async fn delete(&self, id: Id) -> Result<Value, ApiError> {
        self.cache.mutate(&DELETE_PROVIDER, &id).await
    }

    pub async fn edit(&self, id: Id, form: FormData) -> Result<Value, ApiError> {
        self.cache.mutate(&EDIT_PROVIDER, &(id, form)).await
    }

    pub async fn update_status(&self, id: Id, form: FormData) -> Result<Value, ApiError> {
        self.cache.mutate(&UPDATE_PROVIDER_STATUS, &(id, form)).await
    }

    pub async fn set_highlighted(&self, vendor: Id, highlighted: bool) -> Result<Value, ApiError> {
        self.cache
            .mutate(&UPDATE_PROVIDER_HIGHLIGHT, &HighlightForm { vendor, highlighted })
            .await
    }

    pub async fn set_cashback(&self, vendor: Id, percent: u32) -> Result<Value, ApiError> {
        self.cache
            .mutate(&ADD_PROVIDER_CASHBACK, &CashbackForm { vendor, percent })
            .await
    }
}
