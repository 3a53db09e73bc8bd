//! The user's current file choice.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;

/// Where the content of a [`SelectedFile`] lives.
///
/// Path-backed content is only read when the file is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Path(PathBuf),
    Memory(Bytes),
}

/// A file picked by the user, replaced wholesale on every new choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    media_type: String,
    size: u64,
    source: FileSource,
}

impl SelectedFile {
    /// Describes a file on disk without reading its content.
    ///
    /// The media type is guessed from the extension and left empty when the
    /// extension is unknown.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, format!("{} is not a file", path.display())));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let media_type = mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();

        Ok(Self {
            name,
            media_type,
            size: metadata.len(),
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    pub fn in_memory(name: impl Into<String>, media_type: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            media_type: media_type.into(),
            size: content.len() as u64,
            source: FileSource::Memory(content),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }

    /// The text shown next to the picker: `name - type`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.name, self.media_type)
    }

    /// Loads the content for upload.
    pub async fn read(&self) -> io::Result<Bytes> {
        match &self.source {
            FileSource::Path(path) => tokio::fs::read(path).await.map(Bytes::from),
            FileSource::Memory(content) => Ok(content.clone()),
        }
    }
}
