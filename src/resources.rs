// ABOUTME: Resource handling for the slidesmith application
// ABOUTME: Loads generated image bytes from remote URLs or local paths

use crate::errors::{DeckError, Result};
use log::info;
use reqwest::blocking::Client;
use std::fs;
use std::path::Path;
use std::time::Duration;

const FETCH_ATTEMPTS: u32 = 3;
const INITIAL_RETRY_DELAY_MS: u64 = 500;

/// Represents a resource that can be either local or remote.
#[derive(Debug, Clone)]
pub struct ResourceFile {
    pub path: String,
    pub is_remote: bool,
    timeout: Duration,
}

impl ResourceFile {
    /// Create a new ResourceFile from a path string.
    /// The path can be either a local file path or a URL.
    pub fn new(path: &str) -> Self {
        let is_remote = path.starts_with("http://") || path.starts_with("https://");
        Self {
            path: path.to_string(),
            is_remote,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the raw bytes of the resource.
    pub fn bytes(&self) -> Result<Vec<u8>> {
        if self.is_remote {
            self.fetch_remote_bytes()
        } else {
            self.read_local_bytes()
        }
    }

    /// Fetch bytes from a remote URL with a bounded number of retries
    fn fetch_remote_bytes(&self) -> Result<Vec<u8>> {
        info!("Fetching remote resource: {}", self.path);

        let client = Client::builder().timeout(self.timeout).build()?;

        let mut retry_delay = INITIAL_RETRY_DELAY_MS;
        let mut last_error = None;

        for attempt in 1..=FETCH_ATTEMPTS {
            match client.get(&self.path).send() {
                Ok(response) => {
                    if response.status().is_success() {
                        return Ok(response.bytes()?.to_vec());
                    }
                    last_error = Some(DeckError::Provider(format!(
                        "HTTP error: {}",
                        response.status()
                    )));
                }
                Err(e) => {
                    last_error = Some(DeckError::Fetch(e));
                }
            }

            if attempt < FETCH_ATTEMPTS {
                info!(
                    "Fetch attempt {} failed, retrying in {} ms",
                    attempt, retry_delay
                );
                std::thread::sleep(Duration::from_millis(retry_delay));
                retry_delay *= 2;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            DeckError::Provider("Unknown error fetching resource".to_string())
        }))
    }

    fn read_local_bytes(&self) -> Result<Vec<u8>> {
        info!("Reading local resource: {}", self.path);
        let path = Path::new(&self.path);
        if !path.exists() {
            return Err(DeckError::PathNotFound(path.to_path_buf()));
        }
        Ok(fs::read(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn detects_remote_paths() {
        assert!(ResourceFile::new("https://example.com/a.png").is_remote);
        assert!(ResourceFile::new("http://example.com/a.png").is_remote);
        assert!(!ResourceFile::new("/tmp/a.png").is_remote);
    }

    #[test]
    fn reads_local_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        fs::write(&path, [1u8, 2, 3]).unwrap();

        let resource = ResourceFile::new(path.to_str().unwrap());
        assert_eq!(resource.bytes().unwrap(), vec![1, 2, 3]);

        let missing = ResourceFile::new(dir.path().join("nope").to_str().unwrap());
        assert!(matches!(missing.bytes(), Err(DeckError::PathNotFound(_))));
    }
}
