//! Upload a protocol file to the processing endpoint and save what comes back.

pub mod app;
pub mod disposition;
pub mod exchange;
pub mod host;
#[cfg(feature = "mock-server")]
pub mod mock;
pub mod selection;
pub mod widget;

/// Endpoint of the local processing service.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/icf";

pub use exchange::{Download, ExchangeError, Uploader};
pub use host::{DesktopHost, Host, SaveTarget};
pub use selection::SelectedFile;
pub use widget::UploadWidget;
