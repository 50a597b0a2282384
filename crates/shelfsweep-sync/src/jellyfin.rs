//! Jellyfin library cleanup.
//!
//! Lists every `Book` item, removes entries that point at nothing (no path,
//! a metadata file, or a file that no longer exists), and asks the server to
//! rescan its libraries afterwards.

use std::path::Path;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use shelfsweep_core::is_sidecar_extension;

use crate::error::SyncError;
use crate::path_map::PathMapper;

const AUTH_HEADER: &str = "X-MediaBrowser-Token";
const BOOKS_ENDPOINT: &str = "/Items?IncludeItemTypes=Book&Recursive=true&Fields=Path";
const REFRESH_ENDPOINT: &str = "/Library/Refresh";

/// One library item as returned by `/Items`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JellyfinItem {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Path", default)]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemsResponse {
    #[serde(rename = "Items", default)]
    items: Vec<JellyfinItem>,
}

/// Why an item should be removed, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Present,
    NoPath,
    MetadataFile,
    MissingFile,
}

/// Classify an item. `exists` decides whether a host path is on disk.
///
/// Paths under the container root are mapped to the host first. Anything
/// else (another library, or a look-alike prefix such as `/bookshelf`) is
/// checked as-is, so items this tool cannot map are not removed blindly.
pub fn classify(
    item: &JellyfinItem,
    mapper: &PathMapper,
    exists: impl Fn(&Path) -> bool,
) -> ItemState {
    let Some(path) = item.path.as_deref().filter(|p| !p.is_empty()) else {
        return ItemState::NoPath;
    };

    let is_metadata = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| is_sidecar_extension(&e.to_ascii_lowercase()));
    if is_metadata {
        return ItemState::MetadataFile;
    }

    let on_disk = match mapper.to_host(path) {
        Some(host) => exists(&host),
        None => exists(Path::new(path)),
    };
    if on_disk {
        ItemState::Present
    } else {
        ItemState::MissingFile
    }
}

/// Counts from one cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JellyfinStats {
    pub total_books: usize,
    pub no_path: usize,
    pub metadata_entries: usize,
    pub missing_files: usize,
    /// Entries removed (or that would be in a dry run).
    pub entries_removed: usize,
    /// Item deletes or the refresh that failed.
    pub failures: usize,
    pub refreshed: bool,
}

/// Minimal Jellyfin API client.
#[derive(Debug, Clone)]
pub struct JellyfinClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl JellyfinClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, SyncError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| SyncError::Http {
                method: "INIT",
                endpoint: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http,
        })
    }

    /// Full URL for an endpoint path.
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(endpoint))
            .header(AUTH_HEADER, &self.api_key)
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
    ) -> Result<reqwest::Response, SyncError> {
        let name = method_name(&method);
        let response = self
            .request(method, endpoint)
            .send()
            .await
            .map_err(|source| SyncError::Http {
                method: name,
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status {
                method: name,
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// All `Book` items with their paths.
    pub async fn list_books(&self) -> Result<Vec<JellyfinItem>, SyncError> {
        let response = self.send(Method::GET, BOOKS_ENDPOINT).await?;
        let body: ItemsResponse = response.json().await.map_err(|source| SyncError::Http {
            method: "GET",
            endpoint: BOOKS_ENDPOINT.to_string(),
            source,
        })?;
        Ok(body.items)
    }

    pub async fn delete_item(&self, id: &str) -> Result<(), SyncError> {
        self.send(Method::DELETE, &format!("/Items/{id}")).await?;
        Ok(())
    }

    pub async fn refresh_library(&self) -> Result<(), SyncError> {
        self.send(Method::POST, REFRESH_ENDPOINT).await?;
        Ok(())
    }

    /// Remove orphan entries and trigger a rescan.
    ///
    /// Only a failure to list items is returned as an error; failed deletes
    /// and a failed refresh are counted in the stats. The refresh runs when
    /// something was removed here or `files_deleted` is set, and never in a
    /// dry run.
    pub async fn clean_library(
        &self,
        mapper: &PathMapper,
        dry_run: bool,
        files_deleted: bool,
    ) -> Result<JellyfinStats, SyncError> {
        info!("Fetching books from Jellyfin");
        let items = self.list_books().await?;

        let mut stats = JellyfinStats {
            total_books: items.len(),
            ..Default::default()
        };
        info!(count = items.len(), "Jellyfin book entries found");

        for item in &items {
            let state = classify(item, mapper, Path::exists);
            let name = item.name.as_deref().unwrap_or("<unnamed>");
            match state {
                ItemState::Present => continue,
                ItemState::NoPath => {
                    warn!(id = %item.id, title = name, "Book entry has no path");
                    stats.no_path += 1;
                }
                ItemState::MetadataFile => {
                    info!(id = %item.id, title = name, path = ?item.path, "Metadata file indexed as a book");
                    stats.metadata_entries += 1;
                }
                ItemState::MissingFile => {
                    warn!(id = %item.id, title = name, path = ?item.path, "Book file missing");
                    stats.missing_files += 1;
                }
            }

            if dry_run {
                info!(id = %item.id, title = name, "[DRY RUN] Would remove Jellyfin entry");
                stats.entries_removed += 1;
                continue;
            }

            match self.delete_item(&item.id).await {
                Ok(()) => {
                    info!(id = %item.id, title = name, "Removed Jellyfin entry");
                    stats.entries_removed += 1;
                }
                Err(err) => {
                    warn!(error = %err, "Jellyfin delete failed");
                    stats.failures += 1;
                }
            }
        }

        if !dry_run && (stats.entries_removed > 0 || files_deleted) {
            info!("Triggering Jellyfin library refresh");
            match self.refresh_library().await {
                Ok(()) => stats.refreshed = true,
                Err(err) => {
                    warn!(error = %err, "Jellyfin refresh failed");
                    stats.failures += 1;
                }
            }
        } else {
            debug!(dry_run, "Skipping Jellyfin library refresh");
        }

        Ok(stats)
    }
}

fn method_name(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::DELETE => "DELETE",
        _ => "REQUEST",
    }
}
