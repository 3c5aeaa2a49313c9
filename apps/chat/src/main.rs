use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{ChatEndpoint, DispatchError, HttpReplyFetcher, InputField, MessageDispatcher};
use shared::protocol::ReplyPayload;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    task::{JoinError, JoinSet},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod terminal;

use config::load_settings;
use terminal::{RenderMode, TerminalDisplay};

const QUIT_COMMAND: &str = "/quit";

#[derive(Parser, Debug)]
#[command(name = "lingobot-chat", about = "Talk to a lingobot chatbot endpoint")]
struct Args {
    /// Base URL of the chatbot server
    #[arg(long)]
    server_url: Option<String>,
    /// Route of the reply endpoint on the server
    #[arg(long)]
    endpoint_path: Option<String>,
    /// Request timeout in seconds; 0 disables it
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Settings file (defaults to ./lingobot.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Send one message and exit instead of starting a session
    #[arg(long)]
    message: Option<String>,
    /// Print exchanges as chat-box markup
    #[arg(long)]
    markup: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    settings.override_with(args.server_url, args.endpoint_path, args.timeout_secs);

    let endpoint = ChatEndpoint::with_path(&settings.server_url, &settings.endpoint_path)
        .context("failed to resolve chatbot endpoint")?;
    let fetcher = match settings.request_timeout() {
        Some(timeout) => HttpReplyFetcher::with_timeout(timeout)?,
        None => HttpReplyFetcher::new(),
    };
    let mode = if args.markup {
        RenderMode::Markup
    } else {
        RenderMode::Plain
    };
    let input = InputField::default();
    let dispatcher = MessageDispatcher::new_with_fetcher(
        endpoint,
        Arc::new(input.clone()),
        Arc::new(TerminalDisplay::new(tokio::io::stdout(), mode)),
        Arc::new(fetcher),
    );
    info!(endpoint = %dispatcher.endpoint().url(), "chat: client ready");

    match args.message {
        Some(message) => {
            input.set(message).await;
            dispatcher
                .dispatch()
                .await
                .context("chatbot request failed")?;
            Ok(())
        }
        None => run_session(dispatcher).await,
    }
}

/// Reads stdin line by line. Every line is its own dispatch; replies are
/// printed as they arrive, so overlapping requests may finish out of order.
async fn run_session(dispatcher: MessageDispatcher) -> Result<()> {
    eprintln!("Type a message and press Enter. {QUIT_COMMAND} or Ctrl-D to exit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight = JoinSet::new();

    while let Some(line) = lines
        .next_line()
        .await
        .context("failed to read from stdin")?
    {
        if line.trim() == QUIT_COMMAND {
            break;
        }

        // Snapshot the line in its own field so a fast typist cannot
        // overwrite it before the spawned dispatch reads it.
        let snapshot = dispatcher.with_input(Arc::new(InputField::new(line)));
        in_flight.spawn(async move { snapshot.dispatch().await });

        while let Some(done) = in_flight.try_join_next() {
            report(done);
        }
    }

    while let Some(done) = in_flight.join_next().await {
        report(done);
    }
    Ok(())
}

fn report(done: Result<Result<ReplyPayload, DispatchError>, JoinError>) {
    match done {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => eprintln!("error: {err}"),
        Err(err) => error!(error = %err, "chat: dispatch task aborted"),
    }
}
