use std::fmt::{Display, Formatter};

use base64::{Engine, engine::general_purpose::URL_SAFE};
use serde::Serialize;

use super::QueryOptions;
use crate::error::ProtocolError;

/// Options for pulling an image.
///
/// # Examples
///
/// ```
/// use docker_modem::models::PullOptions;
///
/// let options = PullOptions::from_reference("registry.local:5000/team/app:1.2");
/// assert_eq!(options.from_image, "registry.local:5000/team/app");
/// assert_eq!(options.tag.as_deref(), Some("1.2"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, typed_builder::TypedBuilder)]
#[builder(doc)]
pub struct PullOptions {
    /// Image name, optionally prefixed with a registry
    #[builder(setter(into))]
    pub from_image: String,
    /// Tag or digest; the daemon pulls every tag when unset
    #[builder(default, setter(strip_option, into))]
    pub tag: Option<String>,
    /// Platform in `os[/arch[/variant]]` form
    #[builder(default, setter(strip_option, into))]
    pub platform: Option<String>,
}

impl PullOptions {
    /// Splits an `image[:tag]` or `image@digest` reference. A colon that belongs to a
    /// registry port is not a tag separator.
    pub fn from_reference(reference: &str) -> Self {
        if let Some((image, digest)) = reference.split_once('@') {
            return PullOptions {
                from_image: image.to_string(),
                tag: Some(digest.to_string()),
                platform: None,
            };
        }

        let name_start = reference.rfind('/').map_or(0, |i| i + 1);
        match reference[name_start..].rfind(':') {
            Some(i) => PullOptions {
                from_image: reference[..name_start + i].to_string(),
                tag: Some(reference[name_start + i + 1..].to_string()),
                platform: None,
            },
            None => PullOptions {
                from_image: reference.to_string(),
                tag: None,
                platform: None,
            },
        }
    }
}

impl From<PullOptions> for QueryOptions {
    fn from(options: PullOptions) -> Self {
        let mut query = QueryOptions::new().set("fromImage", options.from_image);
        if let Some(tag) = options.tag {
            query.insert("tag", tag);
        }
        if let Some(platform) = options.platform {
            query.insert("platform", platform);
        }
        query
    }
}

/// Registry credentials sent in the `X-Registry-Auth` header.
#[derive(Clone, Default, PartialEq, Serialize, typed_builder::TypedBuilder)]
#[builder(doc)]
#[serde(rename_all = "lowercase")]
pub struct RegistryAuth {
    #[builder(default, setter(strip_option, into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[builder(default, setter(strip_option, into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[builder(default, setter(strip_option, into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[builder(default, setter(strip_option, into))]
    #[serde(rename = "serveraddress", skip_serializing_if = "Option::is_none")]
    pub server_address: Option<String>,
    /// Token used instead of username and password
    #[builder(default, setter(strip_option, into))]
    #[serde(rename = "identitytoken", skip_serializing_if = "Option::is_none")]
    pub identity_token: Option<String>,
}

impl RegistryAuth {
    /// Encodes the credentials as URL-safe base64 JSON, the form the daemon expects.
    pub fn header_value(&self) -> Result<String, ProtocolError> {
        let json = serde_json::to_vec(self).map_err(ProtocolError::Serialize)?;
        Ok(URL_SAFE.encode(json))
    }
}

impl std::fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryAuth")
            .field("username", &self.username)
            .field("server_address", &self.server_address)
            .finish_non_exhaustive()
    }
}

impl Display for PullOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.tag {
            Some(tag) if tag.contains(':') => write!(f, "{}@{}", self.from_image, tag),
            Some(tag) => write!(f, "{}:{}", self.from_image, tag),
            None => write!(f, "{}", self.from_image),
        }
    }
}
