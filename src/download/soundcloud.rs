//! Resolve-and-stream downloads from the SoundCloud API

use std::{
    fs::File,
    path::{Path, PathBuf},
    time::Duration,
};

use reqwest::{
    blocking::{Client, Response},
    header::LOCATION,
    redirect,
};
use serde::Deserialize;

use crate::{
    config,
    download::{backend::Backend, error::BackendError},
};

/// Fields of a resolved resource we care about
#[derive(Debug, Default, Deserialize)]
struct Resource {
    #[serde(default)]
    streamable: bool,
    stream_url: Option<String>,
}

impl Resource {
    fn stream_endpoint(&self) -> Result<&str, BackendError> {
        match self.stream_url.as_deref() {
            Some(url) if self.streamable && !url.is_empty() => Ok(url),
            _ => Err(BackendError::NotStreamable),
        }
    }
}

pub struct SoundCloudBackend {
    client: Client,
    /// used for the stream endpoint, whose redirect target is the actual file
    no_redirect: Client,
    client_id: String,
    api_base: String,
}

impl SoundCloudBackend {
    pub fn new(client_id: &str, config: &config::SoundCloud) -> Result<Self, BackendError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder().timeout(timeout).build()?;
        let no_redirect = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            no_redirect,
            client_id: client_id.to_string(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn resolve(&self, track_url: &str) -> Result<Resource, BackendError> {
        let response = self
            .client
            .get(format!("{}/resolve", self.api_base))
            .query(&[("url", track_url), ("client_id", self.client_id.as_str())])
            .send()?;
        let body = ensure_success(response)?.text()?;

        serde_json::from_str(&body)
            .map_err(|e| BackendError::BadResponse(format!("resolve returned invalid json: {e}")))
    }

    /// Location the stream endpoint redirects to
    fn stream_location(&self, stream_url: &str) -> Result<String, BackendError> {
        let response = self
            .no_redirect
            .get(stream_url)
            .query(&[("client_id", &self.client_id)])
            .send()?;

        if let Some(location) = response
            .headers()
            .get(LOCATION)
            .and_then(|h| h.to_str().ok())
        {
            return Ok(location.to_string());
        }

        ensure_success(response)?;
        Err(BackendError::BadResponse(
            "stream endpoint did not redirect".to_string(),
        ))
    }

    fn save(&self, url: &str, destination: &Path) -> Result<(), BackendError> {
        let mut response = ensure_success(self.client.get(url).send()?)?;

        let partial = partial_path(destination);
        let written = File::create(&partial)
            .map_err(BackendError::from)
            .and_then(|mut file| response.copy_to(&mut file).map_err(BackendError::from));

        match written {
            Ok(bytes) => {
                log::debug!("wrote {bytes} bytes to {}", partial.display());
                std::fs::rename(&partial, destination)?;
                Ok(())
            }
            Err(e) => {
                let _ = std::fs::remove_file(&partial);
                Err(e)
            }
        }
    }
}

impl Backend for SoundCloudBackend {
    fn name(&self) -> &str {
        "SoundCloud"
    }

    fn fetch(&self, url: &str, destination: &Path) -> Result<(), BackendError> {
        let resource = self.resolve(url)?;
        let stream_url = resource.stream_endpoint()?;
        log::debug!("resolved {url} to stream {stream_url}");

        let location = self.stream_location(stream_url)?;
        self.save(&location, destination)
    }
}

/// Turns an error status into [`BackendError::Http`] carrying the response body
fn ensure_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(BackendError::Http {
        status: status.as_u16(),
        body,
    })
}

/// `song.mp3` -> `song.mp3.part`
fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
