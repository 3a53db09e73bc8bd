//! Upload widget component.
//!
//! Holds the selected file and turns user events into the upload exchange.
//! Follows the message/update/action shape: [`UploadWidget::update`] mutates
//! state and returns an [`Action`] whose future resolves to the next message.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, error, info};

use crate::exchange::{ExchangeError, Uploader};
use crate::host::Host;
use crate::selection::SelectedFile;

/// Messages for the upload widget.
#[derive(Debug)]
pub enum Message {
    /// Open the host's file picker.
    PickFile,
    /// The host reported a selection, possibly empty.
    FileChosen(Vec<SelectedFile>),
    Submit,
    /// The exchange started by a submit resolved.
    ExchangeFinished(Result<Option<PathBuf>, ExchangeError>),
}

/// Result of processing a widget message.
pub enum Action {
    /// No action needed
    None,
    /// Run an async task and feed its output back into `update`
    Run(BoxFuture<'static, Message>),
}

impl Action {
    pub fn is_none(&self) -> bool {
        matches!(self, Action::None)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::None => f.write_str("None"),
            Action::Run(_) => f.write_str("Run(..)"),
        }
    }
}

pub struct UploadWidget<H: Host> {
    selected: Option<SelectedFile>,
    in_flight: bool,
    uploader: Arc<Uploader>,
    host: Arc<H>,
}

impl<H: Host> UploadWidget<H> {
    pub fn new(uploader: Uploader, host: H) -> Self {
        Self {
            selected: None,
            in_flight: false,
            uploader: Arc::new(uploader),
            host: Arc::new(host),
        }
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// The rendered selection line, `name - type`, or nothing before the first choice.
    pub fn view(&self) -> Option<String> {
        self.selected.as_ref().map(SelectedFile::label)
    }

    pub fn update(&mut self, message: Message) -> Action {
        match message {
            Message::PickFile => Action::Run(self.host.pick_files().map(Message::FileChosen).boxed()),

            Message::FileChosen(files) => {
                if let Some(file) = files.into_iter().next() {
                    info!(name = %file.name(), media_type = %file.media_type(), size = file.size(), "file selected");
                    self.selected = Some(file);
                }
                Action::None
            }

            Message::Submit => {
                let Some(file) = self.selected.clone() else {
                    return Action::None;
                };
                if self.in_flight {
                    debug!("upload already in progress, ignoring submit");
                    return Action::None;
                }
                self.in_flight = true;

                let uploader = self.uploader.clone();
                let host = self.host.clone();
                Action::Run(
                    async move {
                        let result: Result<_, ExchangeError> = async {
                            let download = uploader.exchange(&file).await?;
                            host.save(download).await.map_err(ExchangeError::Save)
                        }
                        .await;
                        Message::ExchangeFinished(result)
                    }
                    .boxed(),
                )
            }

            Message::ExchangeFinished(result) => {
                self.in_flight = false;
                match result {
                    Ok(Some(path)) => info!("saved download to {}", path.display()),
                    Ok(None) => {}
                    Err(e) => error!(error = &e as &(dyn Error + 'static), "upload failed"),
                }
                Action::None
            }
        }
    }
}
