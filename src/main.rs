use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::{error, info, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, prelude::*};

mod client;
mod controller;
mod country;
mod domain;
mod inputter;
mod model;
mod ui;
mod view_state;

use client::{CountrySource, GraphQLClient};
use controller::Controller;
use country::SortField;
use domain::{CVConfig, CVError, COUNTRIES_ENDPOINT, Message};
use model::{Model, Status};
use ui::TableUI;
use view_state::DEFAULT_PAGE_SIZE;

/// Browse the countries of the world in your terminal.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// GraphQL endpoint serving the `countries` query
    #[arg(long, default_value = COUNTRIES_ENDPOINT)]
    endpoint: String,

    /// Rows per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE as u16, value_parser = clap::value_parser!(u16).range(1..))]
    page_size: u16,

    /// Write trace logs to this file (filter with RUST_LOG)
    #[arg(long)]
    log_file: Option<String>,

    /// Initial sort column (code, name, emoji, continent); anything else leaves the rows unsorted
    #[arg(long, default_value = "name")]
    sort: String,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_logging(log_file: Option<&str>) -> Result<(), CVError> {
    // Logging to the terminal would corrupt the TUI
    let Some(log_file) = log_file else {
        return Ok(());
    };
    let path = PathBuf::from(
        shellexpand::full(log_file)
            .map_err(|e| CVError::Logging(e.to_string()))?
            .as_ref(),
    );
    let file = File::create(&path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false),
        )
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| CVError::Logging(e.to_string()))?;
    info!("Logging to {}", path.display());
    Ok(())
}

/// Fetch the countries once on the runtime and hand the result to the UI loop.
fn spawn_fetch(runtime: &tokio::runtime::Runtime, source: Arc<dyn CountrySource>) -> Receiver<Message> {
    let (tx, rx) = mpsc::channel();
    runtime.spawn(async move {
        let result = source.fetch_countries().await.map_err(|e| {
            error!("Fetching countries failed: {e}");
            e.to_string()
        });
        // The receiver is gone once the UI has quit
        let _ = tx.send(Message::Loaded(result));
    });
    rx
}

fn run(args: Args) -> Result<(), CVError> {
    init_logging(args.log_file.as_deref())?;

    let cfg = CVConfig::default()
        .with_endpoint(args.endpoint)
        .with_page_size(args.page_size as usize)
        .with_sort_field(SortField::parse(&args.sort))
        .with_event_poll_time(args.poll_ms);
    info!("Starting cv with {:?}", cfg);

    if cfg.sort_field.is_none() {
        warn!("Unknown sort column {:?}, rows stay unsorted", args.sort);
    }

    let client = GraphQLClient::new(cfg.endpoint.clone())?;
    info!("Using endpoint {}", client.endpoint());
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;
    let loaded = spawn_fetch(&runtime, Arc::new(client));

    let mut model = Model::init(&cfg);
    let mut ui = TableUI::new(&cfg);
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut model, &mut ui, &controller, &loaded);
    ratatui::restore();

    info!("Quitting");
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    ui: &mut TableUI,
    controller: &Controller,
    loaded: &Receiver<Message>,
) -> Result<(), CVError> {
    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(model, f))?;

        if let Ok(message) = loaded.try_recv() {
            model.update(Some(message))?;
        }

        // Handle events and map to a Message
        let message = controller.handle_event(model)?;
        model.update(message)?;
    }
    Ok(())
}
