//! Static content pages (terms, privacy policy, about).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use qms_core::ApiError;
use qms_core::domain::{FormData, HttpRequest, Tag};

use super::Id;
use crate::cache::{MutationEndpoint, QueryCache, QueryEndpoint};

pub const TAG: Tag = Tag::new("cmsApi");
const RESOURCE: &str = "cmsApi";

pub const GET_CMS: QueryEndpoint<CmsPage> = QueryEndpoint::new(
    RESOURCE,
    "getCms",
    |page| {
        HttpRequest::get("admin/cms")
            .with_query("type", &page.kind)
            .with_query("slug", &page.slug)
    },
    &[TAG],
);

pub const EDIT_CMS: MutationEndpoint<CmsEdit> = MutationEndpoint::new(
    RESOURCE,
    "editCms",
    |edit| HttpRequest::post("admin/cms/update").with_form(edit.to_form()),
    &[TAG],
);

/// Address of one content page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CmsPage {
    /// App the page belongs to, `user` or `vendor`.
    #[serde(rename = "type")]
    pub kind: String,
    pub slug: String,
}

impl CmsPage {
    pub fn new(kind: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            slug: slug.into(),
        }
    }
}

/// New HTML body of an existing page.
#[derive(Debug, Clone, PartialEq)]
pub struct CmsEdit {
    pub id: Id,
    pub body: String,
}

impl CmsEdit {
    pub fn to_form(&self) -> FormData {
        FormData::new().text("id", self.id).text("body", &self.body)
    }
}

#[derive(Clone)]
pub struct CmsApi {
    cache: QueryCache,
}

impl CmsApi {
    pub fn new(cache: QueryCache) -> Self {
        Self { cache }
    }

    /// The page as last saved; always read from the server.
    pub async fn get(&self, page: &CmsPage) -> Result<Value, ApiError> {
        self.cache.refetch(&GET_CMS, page).await
    }

    pub async fn edit(&self, edit: CmsEdit) -> Result<Value, ApiError> {
        self.cache.mutate(&EDIT_CMS, &edit).await
    }
}
