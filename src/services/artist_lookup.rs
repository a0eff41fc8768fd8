use std::time::Duration;

use futures::future::BoxFuture;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::error::{Resolved, Result, Unresolved};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

/// Remote lookup of an artist name by song title.
///
/// Like the local resolver it never raises: network trouble, bad payloads
/// and empty result sets all come back as [`Unresolved`].
pub trait ArtistLookup: Send + Sync {
    fn artist_for_title<'a>(&'a self, title: &'a str) -> BoxFuture<'a, Resolved<String>>;
}

/// Queries the iTunes Search API for the first matching track.
#[derive(Debug, Clone)]
pub struct ItunesLookup {
    client: Client,
    search_url: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(rename = "resultCount")]
    result_count: u64,
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    #[serde(rename = "artistName")]
    artist_name: Option<String>,
}

impl ItunesLookup {
    pub fn new(search_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            search_url: search_url.into(),
        })
    }

    async fn search(&self, title: &str) -> Resolved<String> {
        let response = self
            .client
            .get(&self.search_url)
            .query(&[("term", title), ("entity", "musicTrack"), ("limit", "1")])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Unresolved::LookupFailed(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| Unresolved::LookupFailed(e.to_string()))?;

        parse_search_response(&body)
    }
}

impl ArtistLookup for ItunesLookup {
    fn artist_for_title<'a>(&'a self, title: &'a str) -> BoxFuture<'a, Resolved<String>> {
        Box::pin(async move {
            if title.trim().is_empty() {
                return Err(Unresolved::NoMatch);
            }

            let result = self.search(title).await;
            match &result {
                Ok(artist) => debug!("Artist lookup for \"{}\" found {}", title, artist),
                Err(e) => warn!("Artist lookup failed for \"{}\": {}", title, e),
            }
            result
        })
    }
}

/// Used when remote lookups are switched off in the configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledLookup;

impl ArtistLookup for DisabledLookup {
    fn artist_for_title<'a>(&'a self, _title: &'a str) -> BoxFuture<'a, Resolved<String>> {
        Box::pin(async { Err(Unresolved::Disabled) })
    }
}

/// Picks the lookup the configuration asks for.
pub fn from_config(config: &Config) -> Result<Box<dyn ArtistLookup>> {
    if config.artist_lookup {
        Ok(Box::new(ItunesLookup::new(
            config.artist_lookup_url.clone(),
            config.artist_lookup_timeout,
        )?))
    } else {
        Ok(Box::new(DisabledLookup))
    }
}

/// Extracts the first artist name from an iTunes search payload.
pub fn parse_search_response(body: &str) -> Resolved<String> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| Unresolved::LookupFailed(e.to_string()))?;

    if response.result_count == 0 {
        return Err(Unresolved::NoMatch);
    }

    response
        .results
        .into_iter()
        .next()
        .and_then(|r| r.artist_name)
        .filter(|name| !name.trim().is_empty())
        .ok_or(Unresolved::NoMatch)
}
