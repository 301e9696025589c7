use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use chalboard_core::{
    BoardController, BoardEvent, BoardOptions, BoardView, CatalogService, Location,
    MemoryLocation, RemoteCatalogClient,
};
use clap::{Args as ClapArgs, Parser, Subcommand};
use shared::domain::{AttemptStatus, CompletionState, SortKey};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

mod config;
mod render;

#[derive(Parser, Debug)]
#[command(name = "chalboard", about = "Terminal view of a challenge scoreboard")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[arg(long, global = true)]
    nonce: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug, Default)]
struct ViewArgs {
    /// Only show these categories (repeatable). Defaults to all.
    #[arg(long = "category")]
    categories: Vec<String>,
    /// completed or not_completed (repeatable). Defaults to both.
    #[arg(long = "completion")]
    completion: Vec<CompletionState>,
    #[arg(long, default_value_t = SortKey::PointsAsc)]
    sort: SortKey,
    /// Print the board as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch once and print the board.
    List {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Keep the board open and reprint whenever it changes.
    Watch {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Open one task by name and print who solved it.
    Show { name: String },
    /// Submit a key for the named task.
    Submit { name: String, key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = config::load_settings(cli.config.as_deref())?;
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }
    if let Some(nonce) = cli.nonce {
        settings.nonce = nonce;
    }

    let client = RemoteCatalogClient::with_timeout(&settings.server_url, settings.request_timeout())
        .context("failed to build scoreboard client")?;
    let service: Arc<dyn CatalogService> = Arc::new(client);
    let options = BoardOptions {
        refresh_interval: settings.refresh_interval(),
        nonce: settings.nonce.clone(),
        ..BoardOptions::default()
    };

    match cli.command {
        Command::List { view } => {
            let board = BoardController::new_with_location(
                service,
                Arc::new(MemoryLocation::default()),
                options,
            );
            board.start().await.context("failed to load scoreboard")?;
            board.shutdown();
            apply_view_args(&board, &view).await;
            print_view(&board.view().await, view.json)?;
        }
        Command::Watch { view } => watch(service, options, view).await?,
        Command::Show { name } => {
            let board = open_named(service, options, &name).await?;
            let view = board.view().await;
            println!("{}", render::detail(&view));
        }
        Command::Submit { name, key } => {
            let board = open_named(service, options, &name).await?;
            let feedback = board
                .submit_attempt(&key)
                .await
                .context("submission did not complete")?;
            println!("{}", render::feedback(&feedback));
            if feedback.status == AttemptStatus::Correct {
                println!("{}", render::totals(&board.view().await));
            }
        }
    }

    Ok(())
}

/// Opens the named task the same way a shared link does: through the
/// location fragment on startup.
async fn open_named(
    service: Arc<dyn CatalogService>,
    options: BoardOptions,
    name: &str,
) -> Result<Arc<BoardController>> {
    let location = Arc::new(MemoryLocation::default());
    location.set_fragment(Some(&chalboard_core::detail::encode_fragment(name)));
    let board = BoardController::new_with_location(service, location, options);
    board.start().await.context("failed to load scoreboard")?;
    board.shutdown();

    if board.view().await.active_task.is_none() {
        anyhow::bail!("no task named '{name}' on the board");
    }
    Ok(board)
}

async fn apply_view_args(board: &BoardController, view: &ViewArgs) {
    if !view.categories.is_empty() {
        board.update_category_filters(view.categories.clone()).await;
    }
    if !view.completion.is_empty() {
        board
            .update_completion_filters(view.completion.iter().copied())
            .await;
    }
    board.update_sort_key(view.sort).await;
}

fn print_view(view: &BoardView, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
    } else {
        println!("{}", render::board(view));
    }
    Ok(())
}

async fn watch(
    service: Arc<dyn CatalogService>,
    options: BoardOptions,
    view_args: ViewArgs,
) -> Result<()> {
    let board = BoardController::new_with_location(
        service,
        Arc::new(MemoryLocation::default()),
        options,
    );
    let mut events = board.subscribe_events();
    if let Err(err) = board.start().await {
        warn!("initial load failed, waiting for the next refresh: {err}");
    }
    apply_view_args(&board, &view_args).await;
    print_view(&board.view().await, view_args.json)?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(BoardEvent::CatalogReplaced { .. } | BoardEvent::SolvesReplaced { .. }) => {
                    print_view(&board.view().await, view_args.json)?;
                }
                Ok(BoardEvent::RefreshFailed(reason)) => warn!("refresh failed: {reason}"),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event stream lagged");
                    print_view(&board.view().await, view_args.json)?;
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    board.shutdown();
    Ok(())
}
