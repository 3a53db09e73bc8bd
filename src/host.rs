//! The environment the widget runs in: how files are picked and saved.

use std::io;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{info, warn};

use crate::exchange::Download;
use crate::selection::SelectedFile;

/// Host services used by the upload widget.
pub trait Host: Send + Sync + 'static {
    /// Asks the user for a file. An empty selection means nothing was chosen.
    fn pick_files(&self) -> BoxFuture<'static, Vec<SelectedFile>>;

    /// Stores a download. `Ok(None)` means the user declined to save it.
    fn save(&self, download: Download) -> BoxFuture<'static, io::Result<Option<PathBuf>>>;
}

/// Where [`DesktopHost`] puts downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTarget {
    /// Ask with a native save dialog, suggesting the server's filename.
    Dialog,
    /// Write into a directory without asking.
    Directory(PathBuf),
}

/// Native dialogs through `rfd`, files through `tokio::fs`.
#[derive(Debug, Clone)]
pub struct DesktopHost {
    target: SaveTarget,
}

impl DesktopHost {
    pub fn new(target: SaveTarget) -> Self {
        Self { target }
    }
}

impl Host for DesktopHost {
    fn pick_files(&self) -> BoxFuture<'static, Vec<SelectedFile>> {
        async move {
            let Some(handle) = rfd::AsyncFileDialog::new()
                .set_title("Select a protocol file")
                .pick_file()
                .await
            else {
                return Vec::new();
            };

            match SelectedFile::from_path(handle.path()) {
                Ok(file) => vec![file],
                Err(e) => {
                    warn!("failed to open {}: {}", handle.path().display(), e);
                    Vec::new()
                }
            }
        }
        .boxed()
    }

    fn save(&self, download: Download) -> BoxFuture<'static, io::Result<Option<PathBuf>>> {
        let target = self.target.clone();
        async move {
            let path = match target {
                SaveTarget::Dialog => {
                    let Some(handle) = rfd::AsyncFileDialog::new()
                        .set_title("Save processed file")
                        .set_file_name(&download.name)
                        .save_file()
                        .await
                    else {
                        info!("save of {} cancelled", download.name);
                        return Ok(None);
                    };
                    handle.path().to_path_buf()
                }
                SaveTarget::Directory(dir) => save_path_in(&dir, &download.name)?,
            };

            tokio::fs::write(&path, &download.content).await?;
            Ok(Some(path))
        }
        .boxed()
    }
}

/// Joins a server-suggested filename onto `dir`, keeping only its final
/// component so it cannot escape the directory.
pub fn save_path_in(dir: &Path, suggested: &str) -> io::Result<PathBuf> {
    let name = suggested.rsplit(['/', '\\']).next().unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{suggested:?} is not a usable filename"),
        ));
    }
    Ok(dir.join(name))
}
