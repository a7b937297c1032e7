//! Endpoint declarations for every backend resource.
//!
//! Each module holds one resource: its tag, its endpoint constants, the typed
//! forms that map onto request bodies, and a thin API handle over the shared
//! [`QueryCache`](crate::QueryCache). Queries provide the resource tag and
//! mutations invalidate it.

pub mod ads;
pub mod auth;
pub mod bids;
pub mod categories;
pub mod cms;
pub mod dashboard;
pub mod discounts;
pub mod email;
pub mod faq;
pub mod notifications;
pub mod orders;
pub mod providers;
pub mod subscriptions;
pub mod transactions;
pub mod users;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use qms_core::ApiError;
use qms_core::domain::FormData;
use qms_shared::Page;

pub use ads::AdsApi;
pub use bids::BidsApi;
pub use categories::CategoriesApi;
pub use cms::CmsApi;
pub use dashboard::DashboardApi;
pub use discounts::DiscountsApi;
pub use email::EmailApi;
pub use faq::FaqApi;
pub use notifications::NotificationsApi;
pub use orders::OrdersApi;
pub use providers::ProvidersApi;
pub use subscriptions::SubscriptionsApi;
pub use transactions::TransactionsApi;
pub use users::UsersApi;

/// Backend record id.
pub type Id = u64;

/// Role filter shared by the FAQ and transaction lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleFilter {
    pub role: String,
}

impl RoleFilter {
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into() }
    }
}

/// Read a list payload into a page of records.
pub fn page<T: DeserializeOwned>(value: &Value) -> Result<Page<T>, ApiError> {
    Page::from_response(value).map_err(|e| ApiError::Parse(e.to_string()))
}

/// Body of the action endpoints that take no fields.
pub(crate) fn empty_form() -> FormData {
    FormData::new()
}

pub(crate) fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}
