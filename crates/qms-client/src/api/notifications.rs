//! Push notification shortcuts.

use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;

use qms_core::ApiError;
use qms_core::domain::{FormData, HttpRequest, Tag};

use super::{Id, empty_form, flag};
use crate::cache::{MutationEndpoint, QueryCache, QueryEndpoint};

pub const TAG: Tag = Tag::new("notificationApi");
const RESOURCE: &str = "notificationApi";

pub const GET_NOTIFICATIONS: QueryEndpoint<()> = QueryEndpoint::new(
    RESOURCE,
    "getnotification",
    |_| HttpRequest::get("admin/notification-shortcuts"),
    &[TAG],
);

pub const SEND_NOTIFICATION: MutationEndpoint<NotificationForm> = MutationEndpoint::new(
    RESOURCE,
    "sendNotification",
    |form| HttpRequest::post("admin/notification-shortcuts").with_form(form.to_form()),
    &[TAG],
);

pub const DELETE_NOTIFICATION: MutationEndpoint<Id> = MutationEndpoint::new(
    RESOURCE,
    "deleteNotification",
    |id| {
        HttpRequest::post(format!("admin/notification-shortcuts/delete/{id}")).with_form(empty_form())
    },
    &[TAG],
);

/// Who receives a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    AllUsers,
    Users(Vec<Id>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationForm {
    pub title: String,
    pub description: String,
    /// Delivery time; sent immediately when absent.
    pub schedule: Option<(NaiveDate, NaiveTime)>,
    pub audience: Audience,
}

impl NotificationForm {
    pub fn to_form(&self) -> FormData {
        let mut form = FormData::new()
            .text("title", &self.title)
            .text("description", &self.description);

        if let Some((date, time)) = self.schedule {
            form = form
                .text("schedule_date", date.format("%Y-%m-%d"))
                .text("scheduled_time", time.format("%H:%M:%S"));
        }

        match &self.audience {
            Audience::AllUsers => form.text("is_all_users", flag(true)),
            Audience::Users(ids) => form
                .text("is_all_users", flag(false))
                .indexed("user_ids", ids.iter()),
        }
    }
}

#[derive(Clone)]
pub struct NotificationsApi {
    cache: QueryCache,
}

impl NotificationsApi {
    pub fn new(cache: QueryCache) -> Self {
        Self { cache }
    }

    pub async fn list(&self) -> Result<Value, ApiError> {
        self.cache.query(&GET_NOTIFICATIONS, &()).await
    }

    pub async fn send(&self, form: NotificationForm) -> Result<Value, ApiError> {
        self.cache.mutate(&SEND_NOTIFICATION, &form).await
    }

    pub async fn delete(&self, id: Id) -> Result<Value, ApiError> {
        self.cache.mutate(&DELETE_NOTIFICATION, &id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targeted_notification_lists_user_ids() {
        let form = NotificationForm {
            title: "Offer".to_string(),
            description: "20% off today".to_string(),
            schedule: Some((
                NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            )),
            audience: Audience::Users(vec![4, 8]),
        }
        .to_form();

        assert_eq!(form.get_text("is_all_users"), Some("0"));
        assert_eq!(form.get_text("user_ids[0]"), Some("4"));
        assert_eq!(form.get_text("user_ids[1]"), Some("8"));
        assert_eq!(form.get_text("schedule_date"), Some("2025-03-01"));
        assert_eq!(form.get_text("scheduled_time"), Some("09:30:00"));
    }

    #[test]
    fn test_broadcast_has_no_user_ids() {
        let form = NotificationForm {
            title: "Maintenance".to_string(),
            description: "Tonight".to_string(),
            schedule: None,
            audience: Audience::AllUsers,
        }
        .to_form();

        assert_eq!(form.get_text("is_all_users"), Some("1"));
        assert_eq!(form.get_text("user_ids[0]"), None);
        assert_eq!(form.get_text("schedule_date"), None);
    }
}
