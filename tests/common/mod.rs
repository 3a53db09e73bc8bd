#![allow(dead_code)]

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt;
use protocol_uploader::{Download, Host, SelectedFile};

/// Host that never opens dialogs and keeps every download in memory.
#[derive(Clone, Default)]
pub struct RecordingHost {
    saved: Arc<Mutex<Vec<Download>>>,
    declines: bool,
}

impl RecordingHost {
    /// A host whose save dialog is always cancelled.
    pub fn declining() -> Self {
        Self {
            declines: true,
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Vec<Download> {
        self.saved.lock().unwrap().clone()
    }
}

impl Host for RecordingHost {
    fn pick_files(&self) -> BoxFuture<'static, Vec<SelectedFile>> {
        futures::future::ready(Vec::new()).boxed()
    }

    fn save(&self, download: Download) -> BoxFuture<'static, io::Result<Option<PathBuf>>> {
        if self.declines {
            return futures::future::ready(Ok(None)).boxed();
        }
        let path = PathBuf::from(&download.name);
        self.saved.lock().unwrap().push(download);
        futures::future::ready(Ok(Some(path))).boxed()
    }
}

pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// A loopback address with nothing listening on it.
pub fn closed_endpoint() -> reqwest::Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    reqwest::Url::parse(&format!("http://127.0.0.1:{port}/icf")).unwrap()
}
