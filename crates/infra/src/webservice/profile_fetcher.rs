//! Web-service profile fetcher
//!
//! Fetches user profiles from a site's REST web service endpoint
//! (`/webservice/rest/server.php`).
//!
//! ## Functions used
//! - With a context: `core_user_get_course_user_profiles`
//!   (`userlist[0][userid]`, `userlist[0][courseid]`)
//! - Without a context: `core_user_get_users_by_field`
//!   (`field=id`, `values[0]`)
//!
//! Both return a JSON array of users; an empty array means the user is not
//! visible on that site. Failures are reported by the service as a JSON
//! object carrying `exception`, `errorcode` and `message`.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;
use userdeck_core::ProfileFetcher;
use userdeck_domain::{
    Config, ConfigError, ConfigResult, FetchError, FetchResult, ProfileEntity, ProfileKey,
    SiteConfig, SiteId,
};

use crate::errors::{exception_to_fetch_error, status_to_fetch_error, InfraError};
use crate::http::HttpClient;

const REST_ENDPOINT: &str = "webservice/rest/server.php";
const COURSE_PROFILES_FUNCTION: &str = "core_user_get_course_user_profiles";
const USERS_BY_FIELD_FUNCTION: &str = "core_user_get_users_by_field";

#[derive(Debug, Clone)]
struct SiteEndpoint {
    url: Url,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ServiceException {
    #[serde(default)]
    errorcode: String,
    #[serde(default)]
    message: String,
}

/// `ProfileFetcher` backed by the sites' REST web service
pub struct WebServiceProfileFetcher {
    http: HttpClient,
    sites: HashMap<SiteId, SiteEndpoint>,
}

impl WebServiceProfileFetcher {
    /// Create a fetcher for the given sites.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if a site's base URL cannot be parsed.
    pub fn new(http: HttpClient, sites: &[SiteConfig]) -> ConfigResult<Self> {
        let sites = sites
            .iter()
            .map(|site| Ok((site.id.clone(), SiteEndpoint::from_config(site)?)))
            .collect::<ConfigResult<HashMap<_, _>>>()?;

        Ok(Self { http, sites })
    }

    /// Create a fetcher using the `http` and `sites` configuration sections.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` if the HTTP client cannot be built or a
    /// site is misconfigured.
    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        let http = HttpClient::from_config(&config.http)
            .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {e}")))?;
        Self::new(http, &config.sites)
    }

    /// Sites this fetcher can reach.
    pub fn sites(&self) -> impl Iterator<Item = &SiteId> {
        self.sites.keys()
    }

    fn request_params(key: &ProfileKey) -> (&'static str, Vec<(&'static str, String)>) {
        match key.context_id {
            Some(context_id) => (
                COURSE_PROFILES_FUNCTION,
                vec![
                    ("userlist[0][userid]", key.user_id.to_string()),
                    ("userlist[0][courseid]", context_id.to_string()),
                ],
            ),
            None => (
                USERS_BY_FIELD_FUNCTION,
                vec![("field", "id".to_string()), ("values[0]", key.user_id.to_string())],
            ),
        }
    }
}

impl SiteEndpoint {
    fn from_config(site: &SiteConfig) -> ConfigResult<Self> {
        let mut base = site.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let url = Url::parse(&base)
            .and_then(|base| base.join(REST_ENDPOINT))
            .map_err(|e| ConfigError::Invalid(format!("site {}: invalid base_url: {e}", site.id)))?;

        Ok(Self { url, token: site.token.clone() })
    }
}

#[async_trait]
impl ProfileFetcher for WebServiceProfileFetcher {
    async fn fetch_profile(&self, key: &ProfileKey) -> FetchResult<ProfileEntity> {
        let site = self
            .sites
            .get(&key.site_id)
            .ok_or_else(|| FetchError::Internal(format!("unknown site: {}", key.site_id)))?;

        let (function, args) = Self::request_params(key);
        let mut form = vec![
            ("wstoken", site.token.clone()),
            ("wsfunction", function.to_string()),
            ("moodlewsrestformat", "json".to_string()),
        ];
        form.extend(args);

        debug!(user_id = key.user_id, context_id = ?key.context_id, site_id = %key.site_id, function, "fetching profile");

        let response = self.http.post_form(site.url.clone(), &form).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_to_fetch_error(status));
        }

        let body = response.text().await.map_err(|e| FetchError::from(InfraError::from(e)))?;
        parse_profiles(&body)?
            .into_iter()
            .find(|profile| profile.id == key.user_id)
            .ok_or_else(|| FetchError::NotFound(format!("user {} not found on {}", key.user_id, key.site_id)))
    }
}

/// Decode a web-service reply into profiles, surfacing service exceptions.
fn parse_profiles(body: &str) -> FetchResult<Vec<ProfileEntity>> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| FetchError::from(InfraError::from(e)))?;

    if value.get("exception").is_some() {
        let exception: ServiceException =
            serde_json::from_value(value).map_err(|e| FetchError::from(InfraError::from(e)))?;
        return Err(exception_to_fetch_error(&exception.errorcode, &exception.message));
    }

    serde_json::from_value(value).map_err(|e| FetchError::from(InfraError::from(e)))
}
