//! Customer accounts.

use serde_json::Value;

use qms_core::ApiError;
use qms_core::domain::{FormData, HttpRequest, Tag};
use qms_shared::{ListParams, Page};

use super::{Id, empty_form, page};
use crate::cache::{MutationEndpoint, QueryCache, QueryEndpoint};

pub const TAG: Tag = Tag::new("User");
const RESOURCE: &str = "UserApi";

pub const GET_USERS: QueryEndpoint<ListParams> =
    QueryEndpoint::new(RESOURCE, "getUsers", list_request, &[TAG]);

pub const GET_USER_DETAILS: QueryEndpoint<Id> = QueryEndpoint::new(
    RESOURCE,
    "getUsersDetails",
    |id| HttpRequest::get(format!("customer/shops/{id}")),
    &[TAG],
);

pub const GET_USERS_ANALYSIS: QueryEndpoint<()> = QueryEndpoint::new(
    RESOURCE,
    "getUsersAnalysis",
    |_| HttpRequest::get("analytics/customers"),
    &[TAG],
);

pub const ADD_USER: MutationEndpoint<FormData> = MutationEndpoint::new(
    RESOURCE,
    "addUser",
    |form| HttpRequest::post("admin/user-register").with_form(form.clone()),
    &[TAG],
);

pub const DELETE_USER: MutationEndpoint<Id> = MutationEndpoint::new(
    RESOURCE,
    "deleteUser",
    |id| HttpRequest::post(format!("admin/user/delete/{id}")).with_form(empty_form()),
    &[TAG],
);

pub const UPDATE_USER_STATUS: MutationEndpoint<Id> = MutationEndpoint::new(
    RESOURCE,
    "updateUserStatus",
    |id| HttpRequest::post(format!("admin/user/status/{id}")).with_form(empty_form()),
    &[TAG],
);

pub const EDIT_USER: MutationEndpoint<(Id, FormData)> = MutationEndpoint::new(
    RESOURCE,
    "editUser",
    |(id, form)| HttpRequest::put(format!("admin/user-update/{id}")).with_form(form.clone()),
    &[TAG],
);

fn list_request(params: &ListParams) -> HttpRequest {
    let mut request = HttpRequest::get("admin/user/list");
    request.query = params.to_query();
    request
}

#[derive(Clone)]
pub struct UsersApi {
    cache: QueryCache,
}

impl UsersApi {
    pub fn new(cache: QueryCache) -> Self {
        Self { cache }
    }

    /// One page of customers matching `params.search`.
    pub async fn list(&self, params: &ListParams) -> Result<Page<Value>, ApiError> {
        page(&self.cache.query(&GET_USERS, params).await?)
    }

    /// A customer's shops and bookings.
    pub async fn details(&self, id: Id) -> Result<Value, ApiError> {
        self.cache.query(&GET_USER_DETAILS, &id).await
    }

    pub async fn analysis(&self) -> Result<Value, ApiError> {
        self.cache.query(&GET_USERS_ANALYSIS, &()).await
    }

    pub async fn add(&self, form: FormData) -> Result<Value, ApiError> {
        self.cache.mutate(&ADD_USER, &form).await
    }

    pub async fn delete(&self, id: Id) -> Result<Value, ApiError> {
        self.cache.mutate(&DELETE_USER, &id).await
    }

    /// Flip a customer between active and blocked.
    pub async fn toggle_status(&self, id: Id) -> Result<Value, ApiError> {
        self.cache.mutate(&UPDATE_USER_STATUS, &id).await
    }

    pub async fn edit(&self, id: Id, form: FormData) -> Result<Value, ApiError> {
        self.cache.mutate(&EDIT_USER, &(id, form)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qms_core::domain::{HttpMethod, RequestBody};

    #[test]
    fn test_list_query_parameters() {
        let request = GET_USERS.request(&ListParams::page(2, 25).with_search("asha"));

        assert_eq!(request.path, "admin/user/list");
        assert_eq!(request.query_param("search"), Some("asha"));
        assert_eq!(request.query_param("per_page"), Some("25"));
        assert_eq!(request.query_param("page"), Some("2"));
    }

    #[test]
    fn test_edit_is_a_put_with_the_form() {
        let form = FormData::new().text("name", "Asha");
        let request = EDIT_USER.request(&(7, form.clone()));

        assert_eq!(request.method, HttpMethod::Put);
        assert_eq!(request.path, "admin/user-update/7");
        assert_eq!(request.body, RequestBody::Form(form));
    }
}
