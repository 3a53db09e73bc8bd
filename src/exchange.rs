//! The upload-then-download exchange with the processing endpoint.

use std::io;

use bytes::Bytes;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::disposition::{self, DispositionError};
use crate::selection::SelectedFile;

/// Multipart key of the file part.
pub const FILE_FIELD: &str = "file";
/// Multipart key of the text part repeating the filename.
pub const NAME_FIELD: &str = "name";

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("failed to read {name} for upload")]
    ReadFile {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("request to the upload endpoint failed")]
    Transport(#[from] reqwest::Error),
    #[error("the server could not process the uploaded file")]
    NotOk,
    #[error("the server response does not name a download")]
    MalformedDisposition(#[from] DispositionError),
    #[error("the download could not be saved")]
    Save(#[source] io::Error),
}

/// A payload returned by the server, ready to be saved by the host.
///
/// Handed to the host by value and dropped once the save step finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub name: String,
    pub content: Bytes,
}

#[derive(Debug, Clone)]
pub struct Uploader {
    client: Client,
    endpoint: Url,
}

impl Uploader {
    pub fn new(endpoint: Url) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Posts `file` and returns the download the server answered with.
    #[instrument(skip_all, fields(file = %file.name(), endpoint = %self.endpoint))]
    pub async fn exchange(&self, file: &SelectedFile) -> Result<Download, ExchangeError> {
        let content = file.read().await.map_err(|source| ExchangeError::ReadFile {
            name: file.name().to_string(),
            source,
        })?;

        let length = content.len() as u64;
        let mut part = Part::stream_with_length(content, length).file_name(file.name().to_string());
        if !file.media_type().is_empty() {
            part = part.mime_str(file.media_type())?;
        }
        let form = Form::new()
            .part(FILE_FIELD, part)
            .text(NAME_FIELD, file.name().to_string());

        debug!(size = file.size(), "sending upload");
        let response = self.client.post(self.endpoint.clone()).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "upload rejected");
            return Err(ExchangeError::NotOk);
        }

        let header = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .ok_or(DispositionError::Missing)?
            .to_str()
            .map_err(|_| DispositionError::NotText)?;
        let name = disposition::suggested_filename(header)?;

        let content = response.bytes().await?;
        debug!(download = %name, size = content.len(), "received download");

        Ok(Download { name, content })
    }
}
