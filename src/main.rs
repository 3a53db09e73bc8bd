use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use color_eyre::eyre::{bail, WrapErr};
use reqwest::Url;
use tracing::{debug, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer};

use protocol_uploader::app::{self, App, RunOptions};
use protocol_uploader::{DesktopHost, SaveTarget, UploadWidget, Uploader, DEFAULT_ENDPOINT};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
struct Args {
    /// File to select on startup
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Upload the selected file once and exit when the exchange resolves
    #[arg(short, long)]
    submit: bool,

    /// Endpoint the file is posted to
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: Url,

    /// Save downloads into this directory instead of asking with a save dialog
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// How verbose the output should be, can be set up to 3 times. Has no effect if RUST_LOG is set
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to output log to
    #[arg(short, long)]
    log_path: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    tracing_init(&args)?;

    debug!(?args);

    let target = match &args.output_dir {
        Some(dir) if !dir.is_dir() => bail!("output directory {} does not exist", dir.display()),
        Some(dir) => SaveTarget::Directory(dir.clone()),
        None => SaveTarget::Dialog,
    };

    let widget = UploadWidget::new(Uploader::new(args.endpoint.clone()), DesktopHost::new(target));
    let mut app = App::new(widget);

    if !args.submit {
        println!("{}", app::HELP);
    }

    app.run(
        app::stdin_commands(),
        RunOptions {
            initial: args.file.iter().cloned().collect(),
            submit_once: args.submit,
        },
    )
    .await;

    if let Some(log_path) = &args.log_path {
        info!("wrote logs to {}", log_path.display());
    }

    Ok(())
}

fn tracing_init(args: &Args) -> color_eyre::Result<()> {
    tracing_log::LogTracer::init()?;

    let env_filter = EnvFilter::builder()
        .with_default_directive(
            match args.verbose {
                0 => "protocol_uploader=info",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
            .parse()?,
        )
        .from_env_lossy();

    // stdout carries the rendered widget, so logs go to stderr
    let console_log = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(io::stderr)
        .with_filter(env_filter);

    let file_log = if let Some(log_path) = &args.log_path {
        let log_file = File::create(log_path).wrap_err_with(|| format!("failed to create {}", log_path.display()))?;
        let file_log = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(Mutex::new(log_file))
            .with_filter(tracing::level_filters::LevelFilter::TRACE);
        Some(file_log)
    } else {
        None
    };

    let subscriber = tracing_subscriber::registry().with(console_log).with(file_log);

    tracing::subscriber::set_global_default(subscriber).wrap_err("unable to set up logging")?;

    Ok(())
}
