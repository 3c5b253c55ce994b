//! PMC search through the NCBI E-utilities `esearch` endpoint.

use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::error::{CoreError, Result};
use crate::http::build_client;

#[derive(Debug, Deserialize)]
struct ESearchResult {
    #[serde(rename = "Count", default)]
    count: Option<String>,
    #[serde(rename = "IdList", default)]
    id_list: Option<IdList>,
    #[serde(rename = "ERROR", default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IdList {
    #[serde(rename = "Id", default)]
    ids: Vec<String>,
}

pub struct EutilsClient {
    client: reqwest::Client,
    base_url: String,
}

impl EutilsClient {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&config.tool, config.proxy.as_deref())?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the `esearch` URL. `terms` is passed through as-is, so callers
    /// supply an already URL-encoded query such as `(covid)+AND+(gel%20electrophoresis)`.
    pub fn search_url(&self, terms: &str, config: &SearchConfig) -> String {
        let mut url = format!(
            "{}/esearch.fcgi?db=pmc&term={}&tool={}&email={}",
            self.base_url,
            terms,
            urlencoding::encode(&config.tool),
            urlencoding::encode(&config.email),
        );
        if let Some(max) = config.max_pmcids {
            url.push_str(&format!("&retmax={max}"));
        }
        url
    }

    /// Return the PMC ids (without the `PMC` prefix) matching `terms`.
    pub async fn search(&self, terms: &str, config: &SearchConfig) -> Result<Vec<String>> {
        if config.email.trim().is_empty() {
            return Err(CoreError::Config(
                "search.email is empty; add an email address to the config file".to_string(),
            ));
        }

        let url = self.search_url(terms, config);
        debug!(%url, "querying PMC esearch");

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(CoreError::ApiError(url, format!("HTTP {status}: {body}")));
        }

        let xml = resp.text().await?;
        let ids = parse_esearch_response(&xml)?;
        info!(count = ids.len(), "retrieved PMC ids");
        Ok(ids)
    }
}

pub fn parse_esearch_response(xml: &str) -> Result<Vec<String>> {
    let result: ESearchResult =
        from_str(xml).map_err(|e| CoreError::Parse(format!("invalid esearch xml: {e}")))?;

    if let Some(error) = result.error.filter(|e| !e.trim().is_empty()) {
        return Err(CoreError::ApiError("esearch".to_string(), error));
    }
    debug!(count = ?result.count, "esearch total hits");

    Ok(result
        .id_list
        .unwrap_or_default()
        .ids
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect())
}
