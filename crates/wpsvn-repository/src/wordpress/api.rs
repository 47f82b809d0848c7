//! WordPress.org plugin and theme API client.

use crate::error::{RepositoryError, Result};
use dashmap::DashMap;
use indexmap::IndexMap;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default API locations.
pub const PLUGIN_INFO_URL: &str = "https://api.wordpress.org/plugins/info/1.0/";
/// Plugin queries (search, newest).
pub const PLUGIN_QUERY_URL: &str = "https://api.wordpress.org/plugins/info/1.2/";
/// Theme information and queries.
pub const THEME_API_URL: &str = "https://api.wordpress.org/themes/info/1.1/";

/// Where the APIs live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    /// `{plugin_info}{slug}.json`.
    pub plugin_info: String,
    /// `query_plugins` endpoint.
    pub plugin_query: String,
    /// `theme_information` and `query_themes` endpoint.
    pub theme_api: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            plugin_info: PLUGIN_INFO_URL.to_string(),
            plugin_query: PLUGIN_QUERY_URL.to_string(),
            theme_api: THEME_API_URL.to_string(),
        }
    }
}

impl ApiEndpoints {
    /// The same paths under another host, e.g. a mock server.
    #[must_use]
    pub fn at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            plugin_info: format!("{base}/plugins/info/1.0/"),
            plugin_query: format!("{base}/plugins/info/1.2/"),
            theme_api: format!("{base}/themes/info/1.1/"),
        }
    }
}

/// A `{key: value}` object that PHP encodes as `[]` when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LooseMap(pub IndexMap<String, String>);

impl<'de> Deserialize<'de> for LooseMap {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Map(IndexMap<String, String>),
            List(Vec<String>),
        }
        Ok(match Repr::deserialize(deserializer)? {
            Repr::Map(map) => Self(map),
            Repr::List(list) => Self(list.into_iter().map(|v| (v.clone(), v)).collect()),
        })
    }
}

/// Plugin information (`plugins/info/1.0/{slug}.json`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginInfo {
    /// Slug.
    #[serde(default)]
    pub slug: String,
    /// One-line description.
    #[serde(default)]
    pub short_description: Option<String>,
    /// Contributor name to profile URL.
    #[serde(default)]
    pub contributors: LooseMap,
    /// Tag slug to tag name.
    #[serde(default)]
    pub tags: LooseMap,
    /// Set instead of the fields above for unknown slugs.
    #[serde(default)]
    pub error: Option<String>,
}

/// Theme sections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThemeSections {
    /// Long description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Theme information (`theme_information`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThemeInfo {
    /// Slug.
    #[serde(default)]
    pub slug: String,
    /// Author display name.
    #[serde(default)]
    pub author: Option<String>,
    /// Description sections.
    #[serde(default)]
    pub sections: ThemeSections,
    /// Tag slug to tag name.
    #[serde(default)]
    pub tags: LooseMap,
    /// Set instead of the fields above for unknown slugs.
    #[serde(default)]
    pub error: Option<String>,
}

/// One entry of a query result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryEntry {
    /// Slug.
    pub slug: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Plugin description.
    #[serde(default)]
    pub short_description: Option<String>,
    /// Theme description.
    #[serde(default)]
    pub description: Option<String>,
    /// Homepage.
    #[serde(default)]
    pub homepage: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PluginQueryResponse {
    #[serde(default)]
    plugins: Vec<QueryEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct ThemeQueryResponse {
    #[serde(default)]
    themes: Vec<QueryEntry>,
}

/// WordPress.org API client with a per-process info cache.
///
/// Info lookups are memoized, including "no such slug" answers; failed
/// requests are not, so they are retried on the next lookup.
#[derive(Debug, Clone)]
pub struct WordPressApi {
    client: Client,
    endpoints: ApiEndpoints,
    plugins: Arc<DashMap<String, Option<Arc<PluginInfo>>>>,
    themes: Arc<DashMap<String, Option<Arc<ThemeInfo>>>>,
}

impl WordPressApi {
    /// Client for api.wordpress.org.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_endpoints(ApiEndpoints::default())
    }

    /// Client for custom endpoints.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn with_endpoints(endpoints: ApiEndpoints) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("wpsvn/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoints,
            plugins: Arc::new(DashMap::new()),
            themes: Arc::new(DashMap::new()),
        })
    }

    /// Configured endpoints.
    #[must_use]
    pub const fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    /// Plugin information; `None` if the plugin is closed or unknown.
    ///
    /// # Errors
    /// Returns error if the API cannot be reached or answers garbage.
    pub async fn plugin_info(&self, slug: &str) -> Result<Option<Arc<PluginInfo>>> {
        if let Some(cached) = self.plugins.get(slug) {
            return Ok(cached.clone());
        }
        let url = format!("{}{}.json", self.endpoints.plugin_info, encode(slug));
        info!(plugin = %slug, url = %url, "requesting plugin information");
        let info = self
            .get_optional::<PluginInfo>(&url, &[])
            .await?
            .filter(|info| info.error.is_none())
            .map(Arc::new);
        self.plugins.insert(slug.to_string(), info.clone());
        Ok(info)
    }

    /// Theme information; `None` if the theme is unknown.
    ///
    /// # Errors
    /// Returns error if the API cannot be reached or answers garbage.
    pub async fn theme_info(&self, slug: &str) -> Result<Option<Arc<ThemeInfo>>> {
        if let Some(cached) = self.themes.get(slug) {
            return Ok(cached.clone());
        }
        info!(theme = %slug, "requesting theme information");
        let query = [("action", "theme_information"), ("request[slug]", slug)];
        let info = self
            .get_optional::<ThemeInfo>(&self.endpoints.theme_api, &query)
            .await?
            .filter(|info| info.error.is_none())
            .map(Arc::new);
        self.themes.insert(slug.to_string(), info.clone());
        Ok(info)
    }

    /// Search plugins.
    ///
    /// # Errors
    /// Returns error if the API cannot be reached.
    pub async fn search_plugins(&self, term: &str) -> Result<Vec<QueryEntry>> {
        let query = [("action", "query_plugins"), ("request[search]", term)];
        let response: Option<PluginQueryResponse> =
            self.get_optional(&self.endpoints.plugin_query, &query).await?;
        Ok(response.unwrap_or_default().plugins)
    }

    /// Search themes.
    ///
    /// # Errors
    /// Returns error if the API cannot be reached.
    pub async fn search_themes(&self, term: &str) -> Result<Vec<QueryEntry>> {
        let query = [("action", "query_themes"), ("request[search]", term)];
        let response: Option<ThemeQueryResponse> =
            self.get_optional(&self.endpoints.theme_api, &query).await?;
        Ok(response.unwrap_or_default().themes)
    }

    /// Slugs of the `count` most recently added plugins.
    ///
    /// # Errors
    /// Returns error if the API cannot be reached.
    pub async fn newest_plugins(&self, count: usize) -> Result<Vec<String>> {
        let per_page = count.to_string();
        let query = [
            ("action", "query_plugins"),
            ("request[browse]", "new"),
            ("request[per_page]", per_page.as_str()),
        ];
        let response: Option<PluginQueryResponse> =
            self.get_optional(&self.endpoints.plugin_query, &query).await?;
        Ok(slugs(response.unwrap_or_default().plugins))
    }

    /// Slugs of the `count` most recently added themes.
    ///
    /// # Errors
    /// Returns error if the API cannot be reached.
    pub async fn newest_themes(&self, count: usize) -> Result<Vec<String>> {
        let per_page = count.to_string();
        let query = [
            ("action", "query_themes"),
            ("request[browse]", "new"),
            ("request[per_page]", per_page.as_str()),
        ];
        let response: Option<ThemeQueryResponse> =
            self.get_optional(&self.endpoints.theme_api, &query).await?;
        Ok(slugs(response.unwrap_or_default().themes))
    }

    /// GET and decode; `null`, `false` and 404 mean "nothing".
    async fn get_optional<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(url = %url, "not found");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(RepositoryError::Network {
                url: url.to_string(),
                message: format!("HTTP {status}"),
                status: Some(status.as_u16()),
            });
        }
        let body = response.bytes().await?;
        let trimmed = body.trim_ascii();
        if trimmed.is_empty() || trimmed == b"null" || trimmed == b"false" {
            return Ok(None);
        }
        sonic_rs::from_slice(trimmed)
            .map(Some)
            .map_err(|e| RepositoryError::ParseError {
                source: url.to_string(),
                message: e.to_string(),
            })
    }
}

fn slugs(entries: Vec<QueryEntry>) -> Vec<String> {
    entries.into_iter().map(|e| e.slug).collect()
}

/// Percent-encode a slug for use in a URL path.
pub(crate) fn encode(slug: &str) -> String {
    url::form_urlencoded::byte_serialize(slug.as_bytes()).collect()
}
