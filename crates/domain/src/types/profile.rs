//! User profile types
//!
//! Profiles as returned by a remote site's user web service. Field names on
//! the wire follow the web service (`fullname`, `phone1`, `customfields`, ...).

use serde::{Deserialize, Serialize};

/// A user's profile as seen from one site and, optionally, one context.
///
/// Instances are never mutated after construction. A refresh yields a new
/// instance; callers share them behind `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileEntity {
    pub id: i64,
    #[serde(rename = "fullname", default)]
    pub full_name: String,
    #[serde(rename = "firstname", default)]
    pub first_name: Option<String>,
    #[serde(rename = "lastname", default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,

    // Contact group
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone1: Option<String>,
    #[serde(default)]
    pub phone2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub address: Option<String>,

    // Details group
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub interests: Option<String>,
    #[serde(rename = "customfields", default)]
    pub custom_fields: Vec<CustomField>,

    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "profileimageurl", default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub roles: Vec<ProfileRole>,
}

/// Site-defined profile field, possibly scoped to a context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub shortname: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Role held by the user in the requested context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRole {
    #[serde(rename = "roleid")]
    pub role_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub shortname: String,
}

impl ProfileEntity {
    /// True when any contact field carries a non-empty value.
    pub fn has_contact(&self) -> bool {
        [&self.email, &self.phone1, &self.phone2, &self.city, &self.country, &self.address]
            .into_iter()
            .any(is_present)
    }

    /// True when the url, the interests or at least one custom field is set.
    pub fn has_details(&self) -> bool {
        is_present(&self.url) || is_present(&self.interests) || !self.custom_fields.is_empty()
    }
}

fn is_present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}
