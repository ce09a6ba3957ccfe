// Remote listings in the contents-API shape: the root URL answers with a JSON
// array of entries, each folder entry carries the URL of its own listing and
// each file entry a `download_url` for its bytes.

use std::io::Read;
use std::time::Duration;

use crate::error::SourceError;

use super::source::{ListingEntry, ListingSource};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_secs(20);
const MAX_LISTING_BYTES: u64 = 4 * 1024 * 1024;
const MAX_SOUND_BYTES: u64 = 64 * 1024 * 1024;

pub struct HttpSource {
    root_url: String,
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new(root_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .user_agent(concat!("lapseq/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            root_url: root_url.into().trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn get(&self, url: &str, limit: u64) -> Result<Vec<u8>, SourceError> {
        let response = self.agent.get(url).call().map_err(|e| request_error(url, e))?;
        let mut body = Vec::new();
        response.into_reader().take(limit).read_to_end(&mut body)?;
        Ok(body)
    }

    fn list(&self, url: &str) -> Result<Vec<ListingEntry>, SourceError> {
        log::debug!(target: "catalog", "GET {url}");
        let body = self.get(url, MAX_LISTING_BYTES)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl ListingSource for HttpSource {
    fn describe(&self) -> String {
        self.root_url.clone()
    }

    fn list_root(&self) -> Result<Vec<ListingEntry>, SourceError> {
        self.list(&self.root_url)
    }

    fn list_folder(&self, folder: &ListingEntry) -> Result<Vec<ListingEntry>, SourceError> {
        match &folder.url {
            Some(url) => self.list(url),
            None => self.list(&format!("{}/{}", self.root_url, folder.name)),
        }
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        self.get(url, MAX_SOUND_BYTES)
    }
}

fn request_error(url: &str, err: ureq::Error) -> SourceError {
    match err {
        ureq::Error::Status(404, _) => SourceError::NotFound(url.to_string()),
        ureq::Error::Status(status, _) => SourceError::Status { url: url.to_string(), status },
        ureq::Error::Transport(t) => SourceError::Transport { url: url.to_string(), reason: t.to_string() },
    }
}
