use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

mod calendar;
mod client;
mod config;
mod html;
mod server;
mod session;
#[cfg(test)]
mod testing;
mod types;
mod view;

use client::ApiClient;
use config::Settings;
use session::{Session, SyncPolicy};
use types::FormInputs;
use view::{CalendarView, Notice, RunStatus};

#[derive(Parser, Debug)]
#[command(name = "examgrid")]
#[command(about = "Calendar view and client for an exam-scheduling backend")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Backend base URL (overrides EXAMGRID_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the calendar UI (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Print the calendar stored by the backend
    Show,

    /// Create the student form
    CreateForm {
        /// Form title
        #[arg(long, default_value = "Exam Schedule Form")]
        title: String,
    },

    /// Run the scheduler and print the resulting calendar
    Run,
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level))
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("tower_http=warn".parse()?);

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_max_level(Level::TRACE)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args.log_level)?;

    let mut settings = Settings::from_env().context("Failed to load settings")?;
    if let Some(url) = args.api_url {
        settings.api_url = url;
    }
    let client = ApiClient::new(&settings.api_url, settings.request_timeout)
        .context("Failed to build HTTP client")?;
    info!(api_url = %client.base_url(), "Using scheduling backend");
    let session = Session::new(
        CalendarView::new(FormInputs::default()),
        client,
        SyncPolicy::from(&settings),
    );
    session.load_remote_config().await;

    match args.command.unwrap_or(Commands::Serve { port: 8080 }) {
        Commands::Serve { port } => {
            server::serve(port, session).await?;
        }
        Commands::Show => {
            print_calendar(&session).await;
        }
        Commands::CreateForm { title } => {
            session.create_form(&title).await;
            let mut view = session.view().await;
            report_notices(view.take_notices())?;
            if let Some(link) = view.form_link() {
                println!("{}", link.url);
            }
        }
        Commands::Run => {
            session.run_schedule().await;
            let notices = session.view().await.take_notices();
            report_notices(notices)?;
            print_calendar(&session).await;
        }
    }

    Ok(())
}

/// Log notices; an error notice fails the command
fn report_notices(notices: Vec<Notice>) -> Result<()> {
    let mut failure = None;
    for notice in notices {
        match notice {
            Notice::Info(text) => info!("{}", text),
            Notice::Warning(text) => warn!("{}", text),
            Notice::Error(text) => failure = Some(text),
        }
    }
    if let Some(text) = failure {
        bail!(text);
    }
    Ok(())
}

async fn print_calendar(session: &Session) {
    let view = session.view().await;
    if let RunStatus::Done = view.status() {
        if let Some(summary) = view.summary() {
            println!(
                "Algorithm: {}  Penalty: {}",
                summary.algo,
                summary.penalty_display()
            );
        }
    }
    for cell in &view.grids().result {
        println!("{cell}");
    }
}
