use std::path::Path;

use futures::stream;
use protocol_uploader::app::{App, Command, RunOptions};
use protocol_uploader::{DesktopHost, SaveTarget, UploadWidget, Uploader};
use reqwest::Url;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn processing_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Disposition", "attachment; filename=\"protocol_icf.docx\"")
                .set_body_bytes(b"docx".to_vec()),
        )
        .mount(&server)
        .await;
    server
}

fn app_saving_to(server: &MockServer, dir: &Path) -> App<DesktopHost> {
    let endpoint = Url::parse(&format!("{}/icf", server.uri())).unwrap();
    let host = DesktopHost::new(SaveTarget::Directory(dir.to_path_buf()));
    App::new(UploadWidget::new(Uploader::new(endpoint), host))
}

#[tokio::test]
async fn commands_pick_then_upload() {
    let server = processing_server().await;
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let protocol = input.path().join("protocol.pdf");
    std::fs::write(&protocol, b"%PDF-1.7").unwrap();

    let mut app = app_saving_to(&server, output.path());
    let commands = stream::iter(vec![Command::PickPaths(vec![protocol]), Command::Status, Command::Submit]);
    app.run(commands, RunOptions::default()).await;

    assert_eq!(app.widget().view().as_deref(), Some("protocol.pdf - application/pdf"));
    assert!(!app.widget().in_flight());
    assert_eq!(std::fs::read(output.path().join("protocol_icf.docx")).unwrap(), b"docx");
}

#[tokio::test]
async fn quit_stops_reading_commands() {
    let server = processing_server().await;
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let protocol = input.path().join("protocol.pdf");
    std::fs::write(&protocol, b"%PDF-1.7").unwrap();

    let mut app = app_saving_to(&server, output.path());
    let commands = stream::iter(vec![Command::Quit, Command::PickPaths(vec![protocol]), Command::Submit]);
    app.run(commands, RunOptions::default()).await;

    assert!(app.widget().selected().is_none());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn submit_once_uploads_initial_file() {
    let server = processing_server().await;
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let protocol = input.path().join("protocol.pdf");
    std::fs::write(&protocol, b"%PDF-1.7").unwrap();

    let mut app = app_saving_to(&server, output.path());
    let options = RunOptions {
        initial: vec![protocol],
        submit_once: true,
    };
    app.run(stream::pending::<Command>(), options).await;

    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    assert!(output.path().join("protocol_icf.docx").is_file());
}

#[tokio::test]
async fn submit_once_without_file_exits_immediately() {
    let server = processing_server().await;
    let output = tempfile::tempdir().unwrap();

    let mut app = app_saving_to(&server, output.path());
    let options = RunOptions {
        initial: Vec::new(),
        submit_once: true,
    };
    app.run(stream::pending::<Command>(), options).await;

    assert!(app.into_widget().selected().is_none());
    assert!(server.received_requests().await.unwrap().is_empty());
}
