//! Service categories.

use serde_json::Value;

use qms_core::ApiError;
use qms_core::domain::{FilePart, FormData, HttpRequest, Tag};

use super::Id;
use crate::cache::{MutationEndpoint, QueryCache, QueryEndpoint};

pub const TAG: Tag = Tag::new("categoryApi");
const RESOURCE: &str = "categoryApi";

pub const GET_CATEGORIES: QueryEndpoint<()> =
    QueryEndpoint::new(RESOURCE, "getcategory", |_| HttpRequest::get("category"), &[TAG]);

pub const UPDATE_CATEGORY: MutationEndpoint<(Id, CategoryForm)> = MutationEndpoint::new(
    RESOURCE,
    "updateCategory",
    |(id, form)| HttpRequest::post(format!("admin/category/update/{id}")).with_form(form.to_form()),
    &[TAG],
);

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryForm {
    pub name: String,
    /// Replacement icon; the current one is kept when absent.
    pub image: Option<FilePart>,
}

impl CategoryForm {
    pub fn to_form(&self) -> FormData {
        let form = FormData::new().text("name", &self.name);
        match &self.image {
            Some(image) => form.file("image", image.clone()),
            None => form,
        }
    }
}

#[derive(Clone)]
pub struct CategoriesApi {
    cache: QueryCache,
}

impl CategoriesApi {
    pub fn new(cache: QueryCache) -> Self {
        Self { cache }
    }

    pub async fn list(&self) -> Result<Value, ApiError> {
        self.cache.query(&GET_CATEGORIES, &()).await
    }

    pub async fn update(&self, id: Id, form: CategoryForm) -> Result<Value, ApiError> {
        self.cache.mutate(&UPDATE_CATEGORY, &(id, form)).await
    }
}
