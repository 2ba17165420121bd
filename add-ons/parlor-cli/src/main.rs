//! Interactive terminal front end for Parlor.
//!
//! Same pipeline as the gateway, one fixed session. Logs go to stderr so
//! they never interleave with the conversation.

use parlor_core::{bootstrap, CoreConfig, DialogueAdapter, Pipeline};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SESSION_ID: &str = "cli-user";

fn is_quit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("quit")
}

/// Reads lines until `quit` or end of input, writing one `Bot:` line per turn.
async fn run_repl<R, W>(
    pipeline: &Pipeline,
    app_name: &str,
    input: R,
    output: &mut W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    output
        .write_all(format!("{} (type 'quit' to exit)\n", app_name).as_bytes())
        .await?;

    loop {
        output.write_all(b"You: ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            output.write_all(b"\nBye!\n").await?;
            break;
        };
        if is_quit(&line) {
            output.write_all(b"Bye!\n").await?;
            break;
        }

        let reply = pipeline.ask(Some(SESSION_ID), &line).await;
        output.write_all(format!("Bot: {}\n", reply).as_bytes()).await?;
    }
    output.flush().await
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[parlor-cli] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match CoreConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Config load failed: {}", e);
            std::process::exit(1);
        }
    };

    let brain = match bootstrap(Path::new(&config.aiml_dir), Path::new(&config.brain_path)) {
        Ok((brain, source)) => {
            tracing::info!(target: "parlor::cli", source = ?source, categories = brain.category_count(), "Brain ready");
            brain
        }
        Err(e) => {
            tracing::error!("Brain bootstrap failed: {}", e);
            std::process::exit(1);
        }
    };
    let router = match parlor_skills::default_router(&config) {
        Ok(router) => router,
        Err(e) => {
            tracing::error!("HTTP client setup failed: {}", e);
            std::process::exit(1);
        }
    };
    let pipeline = Pipeline::new(Arc::new(router), DialogueAdapter::new(Arc::new(brain)));

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    if let Err(e) = run_repl(&pipeline, &config.app_name, stdin, &mut stdout).await {
        tracing::error!("Terminal I/O failed: {}", e);
        std::process::exit(1);
    }
}
