//! Promotional banners shown in the user and vendor apps.

use serde_json::Value;

use qms_core::ApiError;
use qms_core::domain::{FilePart, FormData, HttpRequest, Tag};

use super::Id;
use crate::cache::{MutationEndpoint, QueryCache, QueryEndpoint};

pub const TAG: Tag = Tag::new("AdsApi");
const RESOURCE: &str = "AdsApi";

pub const GET_ADS: QueryEndpoint<()> =
    QueryEndpoint::new(RESOURCE, "getAds", |_| HttpRequest::get("admin/banner"), &[TAG]);

pub const ADD_AD: MutationEndpoint<AdForm> = MutationEndpoint::new(
    RESOURCE,
    "addAd",
    |form| HttpRequest::post("admin/banner").with_form(form.to_form()),
    &[TAG],
);

pub const DELETE_AD: MutationEndpoint<Id> = MutationEndpoint::new(
    RESOURCE,
    "deleteAd",
    |id| HttpRequest::post("admin/banner/delete").with_form(FormData::new().text("id", id)),
    &[TAG],
);

/// App the banner is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdAudience {
    User,
    Vendor,
}

impl AdAudience {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdAudience::User => "user",
            AdAudience::Vendor => "vendor",
        }
    }
}

/// Banner media: an uploaded file or a link to hosted content.
#[derive(Debug, Clone, PartialEq)]
pub enum AdMedia {
    Upload(FilePart),
    Url(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdForm {
    pub media: AdMedia,
    pub audience: AdAudience,
    /// Media kind, `image` or `video`.
    pub extensions: String,
    pub position: u32,
}

impl AdForm {
    pub fn to_form(&self) -> FormData {
        let form = match &self.media {
            AdMedia::Upload(file) => FormData::new().file("image", file.clone()),
            AdMedia::Url(url) => FormData::new().text("image", url.trim()),
        };
        form.text("type", self.audience.as_str())
            .text("extensions", &self.extensions)
            .text("position", self.position)
    }
}

#[derive(Clone)]
pub struct AdsApi {
    cache: QueryCache,
}

impl AdsApi {
    pub fn new(cache: QueryCache) -> Self {
        Self { cache }
    }

    pub async fn list(&self) -> Result<Value, ApiError> {
        self.cache.query(&GET_ADS, &()).await
    }

    pub async fn add(&self, form: AdForm) -> Result<Value, ApiError> {
        self.cache.mutate(&ADD_AD, &form).await
    }

    pub async fn delete(&self, id: Id) -> Result<Value, ApiError> {
        self.cache.mutate(&DELETE_AD, &id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qms_core::domain::{FormValue, RequestBody};

    #[test]
    fn test_uploaded_banner_form() {
        let form = AdForm {
            media: AdMedia::Upload(FilePart::new("summer.png", vec![1, 2, 3])),
            audience: AdAudience::Vendor,
            extensions: "image".to_string(),
            position: 2,
        }
        .to_form();

        assert!(matches!(&form.parts()[0].value, FormValue::File(f) if f.file_name == "summer.png"));
        assert_eq!(form.get_text("type"), Some("vendor"));
        assert_eq!(form.get_text("position"), Some("2"));
    }

    #[test]
    fn test_delete_sends_the_id_in_the_body() {
        let request = DELETE_AD.request(&9);
        assert_eq!(request.path, "admin/banner/delete");
        assert!(matches!(&request.body, RequestBody::Form(f) if f.get_text("id") == Some("9")));
    }
}
