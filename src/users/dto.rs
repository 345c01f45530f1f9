use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /users`. Every field is optional at the JSON level so a
/// missing field is reported as a validation error, not a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Body of `PUT /users/{id}`; only supplied fields are validated and applied.
///
/// The outer `Option` says whether the key was present, the inner one whether
/// it held a value: `{"firstName": null}` is `Some(None)` and fails validation
/// the same way a blank string does.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub status: Option<Option<String>>,
}

// Only called for keys that are present, so `null` lands as `Some(None)`.
fn present<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(de).map(Some)
}

impl CreateUserRequest {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            email: Some(email.into()),
            phone: Some(phone.into()),
        }
    }
}

impl UpdateUserRequest {
    pub fn first_name(mut self, v: impl Into<String>) -> Self {
        self.first_name = Some(Some(v.into()));
        self
    }

    pub fn last_name(mut self, v: impl Into<String>) -> Self {
        self.last_name = Some(Some(v.into()));
        self
    }

    pub fn email(mut self, v: impl Into<String>) -> Self {
        self.email = Some(Some(v.into()));
        self
    }

    pub fn phone(mut self, v: impl Into<String>) -> Self {
        self.phone = Some(Some(v.into()));
        self
    }

    pub fn status(mut self, v: impl Into<String>) -> Self {
        self.status = Some(Some(v.into()));
        self
    }
}
