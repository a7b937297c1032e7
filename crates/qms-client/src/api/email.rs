//! Email templates and sends.

use serde_json::Value;

use qms_core::ApiError;
use qms_core::domain::{FormData, HttpRequest, Tag};

use super::{Id, empty_form};
use crate::cache::{MutationEndpoint, QueryCache, QueryEndpoint};

pub const TAG: Tag = Tag::new("emailApi");
const RESOURCE: &str = "emailApi";

pub const GET_EMAILS: QueryEndpoint<()> = QueryEndpoint::new(
    RESOURCE,
    "getemail",
    |_| HttpRequest::get("admin/email-shortcuts"),
    &[TAG],
);

pub const ADD_EMAIL: MutationEndpoint<FormData> = MutationEndpoint::new(
    RESOURCE,
    "addemail",
    |form| HttpRequest::post("admin/email-shortcuts").with_form(form.clone()),
    &[TAG],
);

pub const SEND_EMAIL: MutationEndpoint<(Id, FormData)> = MutationEndpoint::new(
    RESOURCE,
    "sendemail",
    |(id, form)| HttpRequest::post(format!("admin/email-shortcuts/send/{id}")).with_form(form.clone()),
    &[TAG],
);

pub const UPDATE_EMAIL: MutationEndpoint<(Id, FormData)> = MutationEndpoint::new(
    RESOURCE,
    "updateemail",
    |(id, form)| HttpRequest::post(format!("admin/email-shortcuts/update/{id}")).with_form(form.clone()),
    &[TAG],
);

pub const DELETE_EMAIL: MutationEndpoint<Id> = MutationEndpoint::new(
    RESOURCE,
    "deleteemail",
    |id| HttpRequest::post(format!("admin/email-shortcuts/delete/{id}")).with_form(empty_form()),
    &[TAG],
);

#[derive(Clone)]
pub struct EmailApi {
    cache: QueryCache,
}

impl EmailApi {
    pub fn new(cache: QueryCache) -> Self {
        Self { cache }
    }

    pub async fn list(&self) -> Result<Value, ApiError> {
        self.cache.query(&GET_EMAILS, &()).await
    }

    pub async fn add(&self, form: FormData) -> Result<Value, ApiError> {
        self.cache.mutate(&ADD_EMAIL, &form).await
    }

    /// Send the template `id` to the recipients in `form`.
    pub async fn send(&self, id: Id, form: FormData) -> Result<Value, ApiError> {
        self.cache.mutate(&SEND_EMAIL, &(id, form)).await
    }

    pub async fn update(&self, id: Id, form: FormData) -> Result<Value, ApiError> {
        self.cache.mutate(&UPDATE_EMAIL, &(id, form)).await
    }

    pub async fn delete(&self, id: Id) -> Result<Value, ApiError> {
        self.cache.mutate(&DELETE_EMAIL, &id).await
    }
}
