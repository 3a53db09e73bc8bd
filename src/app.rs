//! Terminal event loop driving the upload widget.
//!
//! User commands arrive as a stream, widget tasks run on the runtime and post
//! their result back through a channel. Only this loop touches the widget.

use std::path::PathBuf;
use std::str::FromStr;

use futures::{Stream, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_stream::wrappers::LinesStream;
use tracing::{debug, warn};

use crate::host::Host;
use crate::selection::SelectedFile;
use crate::widget::{Action, Message, UploadWidget};

pub const HELP: &str = "commands: pick [PATH]...  upload  status  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open the native file picker.
    PickDialog,
    /// Select from explicit paths; the first readable one wins.
    PickPaths(Vec<PathBuf>),
    Submit,
    Status,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown command {0:?}")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = match words.next().unwrap_or_default() {
            "pick" | "choose" => {
                let paths: Vec<PathBuf> = words.map(PathBuf::from).collect();
                if paths.is_empty() {
                    Command::PickDialog
                } else {
                    Command::PickPaths(paths)
                }
            }
            "upload" | "submit" => Command::Submit,
            "status" => Command::Status,
            "quit" | "exit" => Command::Quit,
            other => return Err(UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

/// Reads commands line by line from stdin, skipping blank and unknown ones.
pub fn stdin_commands() -> impl Stream<Item = Command> {
    LinesStream::new(BufReader::new(tokio::io::stdin()).lines()).filter_map(|line| async move {
        match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => match line.parse::<Command>() {
                Ok(command) => Some(command),
                Err(e) => {
                    println!("{e}, {HELP}");
                    None
                }
            },
            Err(e) => {
                warn!("failed to read input: {}", e);
                None
            }
        }
    })
}

/// Turns a list of paths into the selection a file picker would report.
pub fn select_paths(paths: &[PathBuf]) -> Vec<SelectedFile> {
    paths
        .iter()
        .filter_map(|path| match SelectedFile::from_path(path) {
            Ok(file) => Some(file),
            Err(e) => {
                warn!("ignoring {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// File selected before any command is read.
    pub initial: Vec<PathBuf>,
    /// Submit after startup, ignore commands, and stop once every task resolved.
    pub submit_once: bool,
}

pub struct App<H: Host> {
    widget: UploadWidget<H>,
    tx: UnboundedSender<Message>,
    rx: UnboundedReceiver<Message>,
    pending: usize,
    rendered: Option<String>,
}

impl<H: Host> App<H> {
    pub fn new(widget: UploadWidget<H>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            widget,
            tx,
            rx,
            pending: 0,
            rendered: None,
        }
    }

    pub fn widget(&self) -> &UploadWidget<H> {
        &self.widget
    }

    pub fn into_widget(self) -> UploadWidget<H> {
        self.widget
    }

    /// Runs until input ends (or `quit`) and no widget task is outstanding.
    pub async fn run(&mut self, commands: impl Stream<Item = Command>, options: RunOptions) {
        tokio::pin!(commands);
        let mut input_open = !options.submit_once;

        if !options.initial.is_empty() {
            self.dispatch(Message::FileChosen(select_paths(&options.initial)));
        }
        if options.submit_once {
            self.dispatch(Message::Submit);
        }

        loop {
            self.render();
            if !input_open && self.pending == 0 {
                break;
            }

            tokio::select! {
                Some(message) = self.rx.recv() => {
                    self.pending -= 1;
                    self.dispatch(message);
                }
                command = commands.next(), if input_open => match command {
                    None | Some(Command::Quit) => {
                        debug!(pending = self.pending, "input closed");
                        input_open = false;
                    }
                    Some(Command::Status) => self.print_status(),
                    Some(Command::PickDialog) => self.dispatch(Message::PickFile),
                    Some(Command::PickPaths(paths)) => self.dispatch(Message::FileChosen(select_paths(&paths))),
                    Some(Command::Submit) => self.dispatch(Message::Submit),
                },
            }
        }
    }

    fn dispatch(&mut self, message: Message) {
        match self.widget.update(message) {
            Action::None => {}
            Action::Run(task) => {
                self.pending += 1;
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    // The loop owns the receiver for as long as tasks are counted.
                    let _ = tx.send(task.await);
                });
            }
        }
    }

    fn render(&mut self) {
        let view = self.widget.view();
        if view != self.rendered {
            if let Some(line) = &view {
                println!("{line}");
            }
            self.rendered = view;
        }
    }

    fn print_status(&self) {
        match self.widget.view() {
            Some(line) => println!("{line}"),
            None => println!("no file selected"),
        }
        if self.widget.in_flight() {
            println!("upload in progress");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!("pick".parse::<Command>(), Ok(Command::PickDialog));
        assert_eq!(
            "pick a.pdf b.pdf".parse::<Command>(),
            Ok(Command::PickPaths(vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]))
        );
        assert_eq!("  upload ".parse::<Command>(), Ok(Command::Submit));
        assert_eq!("submit".parse::<Command>(), Ok(Command::Submit));
        assert_eq!("status".parse::<Command>(), Ok(Command::Status));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn rejects_unknown_commands() {
        assert_eq!("send".parse::<Command>(), Err(UnknownCommand("send".to_string())));
    }

    #[test]
    fn select_paths_skips_unreadable_entries() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.pdf");
        std::fs::write(&present, b"%PDF").unwrap();

        let files = select_paths(&[dir.path().join("missing.pdf"), present]);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name(), "present.pdf");
    }
}
