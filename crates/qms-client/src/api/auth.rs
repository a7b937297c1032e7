//! Authentication endpoints, driven by the session store.

use qms_core::domain::{Credentials, FormData, HttpRequest, Tag};

use crate::cache::MutationEndpoint;

pub const TAG: Tag = Tag::new("authApi");
const RESOURCE: &str = "authApi";

pub const LOGIN: MutationEndpoint<Credentials> =
    MutationEndpoint::new(RESOURCE, "loginAdmin", login_request, &[TAG]);

pub const CHANGE_PASSWORD: MutationEndpoint<ChangePasswordForm> = MutationEndpoint::new(
    RESOURCE,
    "changeAdminPassword",
    |form| HttpRequest::post("reset-pass/all").with_form(form.to_form()),
    &[TAG],
);

fn login_request(credentials: &Credentials) -> HttpRequest {
    HttpRequest::post("login").with_form(
        FormData::new()
            .text("email_or_phone", &credentials.email)
            .text("password", &credentials.password),
    )
}

/// Password change submitted by the logged-in administrator.
#[derive(Clone)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirmation: String,
}

impl ChangePasswordForm {
    pub fn new(current: impl Into<String>, new: impl Into<String>) -> Self {
        let new = new.into();
        Self {
            current_password: current.into(),
            confirmation: new.clone(),
            new_password: new,
        }
    }

    pub fn to_form(&self) -> FormData {
        FormData::new()
            .text("current_password", &self.current_password)
            .text("new_password", &self.new_password)
            .text("new_password_confirmation", &self.confirmation)
    }
}

impl std::fmt::Debug for ChangePasswordForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangePasswordForm").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qms_core::domain::{HttpMethod, RequestBody};

    #[test]
    fn test_login_sends_the_login_form() {
        let request = LOGIN.request(&Credentials::new("admin@example.com", "secret"));

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.path, "login");
        let RequestBody::Form(form) = &request.body else {
            panic!("login must be a form");
        };
        assert_eq!(form.get_text("email_or_phone"), Some("admin@example.com"));
        assert_eq!(form.get_text("password"), Some("secret"));
    }

    #[test]
    fn test_change_password_form() {
        let form = ChangePasswordForm::new("old", "new-pass").to_form();
        assert_eq!(form.get_text("current_password"), Some("old"));
        assert_eq!(form.get_text("new_password_confirmation"), Some("new-pass"));
    }
}
