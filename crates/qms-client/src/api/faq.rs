//! FAQ and support entries, per app role.

use serde_json::Value;

use qms_core::ApiError;
use qms_core::domain::{FormData, HttpRequest, Tag};

use super::{Id, RoleFilter, empty_form, flag};
use crate::cache::{MutationEndpoint, QueryCache, QueryEndpoint};

pub const TAG: Tag = Tag::new("faqApi");
const RESOURCE: &str = "faqApi";

pub const GET_FAQ: QueryEndpoint<RoleFilter> = QueryEndpoint::new(
    RESOURCE,
    "getfaq",
    |filter| HttpRequest::get("admin/faq-support").with_query("role", &filter.role),
    &[TAG],
);

pub const ADD_FAQ: MutationEndpoint<FaqForm> = MutationEndpoint::new(
    RESOURCE,
    "addfaq",
    |form| HttpRequest::post("admin/faq-support").with_form(form.to_form()),
    &[TAG],
);

pub const UPDATE_FAQ: MutationEndpoint<(Id, FaqForm)> = MutationEndpoint::new(
    RESOURCE,
    "updatefaq",
    |(id, form)| HttpRequest::post(format!("admin/faq-support/update/{id}")).with_form(form.to_form()),
    &[TAG],
);

pub const DELETE_FAQ: MutationEndpoint<Id> = MutationEndpoint::new(
    RESOURCE,
    "deletefaq",
    |id| HttpRequest::post(format!("admin/faq-support/delete/{id}")).with_form(empty_form()),
    &[TAG],
);

pub const APPROVE_FAQ: MutationEndpoint<Id> = MutationEndpoint::new(
    RESOURCE,
    "faqApproved",
    |id| HttpRequest::post(format!("faq-entri-aaproved/{id}")).with_form(empty_form()),
    &[TAG],
);

#[derive(Debug, Clone, PartialEq)]
pub struct FaqForm {
    pub category: String,
    pub question: String,
    pub answer: String,
    pub is_active: bool,
    /// App the entry belongs to; omitted when editing.
    pub role: Option<String>,
}

impl FaqForm {
    pub fn to_form(&self) -> FormData {
        FormData::new()
            .text("category", &self.category)
            .text("question", &self.question)
            .text("answer", &self.answer)
            .text("is_active", flag(self.is_active))
            .optional_text("role", self.role.as_deref())
    }
}

#[derive(Clone)]
pub struct FaqApi {
    cache: QueryCache,
}

impl FaqApi {
    pub fn new(cache: QueryCache) -> Self {
        Self { cache }
    }

    pub async fn list(&self, role: &str) -> Result<Value, ApiError> {
        self.cache.query(&GET_FAQ, &RoleFilter::new(role)).await
    }

    pub async fn add(&self, form: FaqForm) -> Result<Value, ApiError> {
        self.cache.mutate(&ADD_FAQ, &form).await
    }

    pub async fn update(&self, id: Id, form: FaqForm) -> Result<Value, ApiError> {
        self.cache.mutate(&UPDATE_FAQ, &(id, form)).await
    }

    pub async fn delete(&self, id: Id) -> Result<Value, ApiError> {
        self.cache.mutate(&DELETE_FAQ, &id).await
    }

    pub async fn approve(&self, id: Id) -> Result<Value, ApiError> {
        self.cache.mutate(&APPROVE_FAQ, &id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faq_form_fields() {
        let form = FaqForm {
            category: "Booking".to_string(),
            question: "How do I cancel?".to_string(),
            answer: "From the bookings tab.".to_string(),
            is_active: true,
            role: Some("vendor".to_string()),
        }
        .to_form();

        assert_eq!(form.get_text("is_active"), Some("1"));
        assert_eq!(form.get_text("role"), Some("vendor"));
    }

    #[test]
    fn test_list_is_filtered_by_role() {
        let request = GET_FAQ.request(&RoleFilter::new("user"));
        assert_eq!(request.query_param("role"), Some("user"));
    }
}
