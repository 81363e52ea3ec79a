use std::sync::Arc;

use anyhow::Context;
use block::actors::{
    apply_command, close, edit, get_view, reload, set_status, DocumentSessionActor,
    DocumentSessionArguments,
};
use block::config::BlockConfig;
use block::store::InMemoryDocumentStore;
use block::view::{status_label, BlockView, Toolbar};
use ractor::Actor;
use shared_types::{BlockStatus, DisplayMode, DocumentView, UiBlock, VersionCommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const HELP: &str = "commands: type <text> | save <text> | prev | next | toggle | latest | \
                    show | stream | idle | reload | help | quit";

fn load_env_file() {
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            tracing::warn!(error = %e, "Could not determine current directory for .env lookup");
            return;
        }
    };

    let mut current = cwd.clone();
    loop {
        let candidate = current.join(".env");
        if candidate.exists() {
            match dotenvy::from_path(&candidate) {
                Ok(_) => {
                    tracing::info!(path = %candidate.display(), "Loaded environment from .env");
                }
                Err(e) => {
                    tracing::warn!(
                        path = %candidate.display(),
                        error = %e,
                        "Failed to load .env file"
                    );
                }
            }
            return;
        }

        if !current.pop() {
            break;
        }
    }

    tracing::debug!(cwd = %cwd.display(), "No .env file found; using process environment only");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the rendered view on stdout stays readable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if std::env::var("BLOCK_LOG_FORMAT").is_ok_and(|format| format == "json") {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    load_env_file();
    let config = BlockConfig::from_env()?;
    tracing::info!(
        document_id = %config.document_id,
        model = %config.model.api_identifier,
        debounce_ms = config.save_debounce.as_millis() as u64,
        flush_on_close = config.flush_on_close,
        "Starting block session"
    );

    let store = Arc::new(InMemoryDocumentStore::new(config.user_id.clone()));
    store
        .seed(
            &config.document_id,
            &config.document_title,
            [format!("# {}\n", config.document_title)],
        )
        .await;

    let (session, handle) = Actor::spawn(
        None,
        DocumentSessionActor,
        DocumentSessionArguments {
            document_id: config.document_id.clone(),
            title: config.document_title.clone(),
            store,
            save_debounce: config.save_debounce,
            flush_on_close: config.flush_on_close,
        },
    )
    .await
    .context("Failed to spawn document session")?;

    let mut block_view = BlockView::new(UiBlock::initial(1280.0, 800.0));
    block_view.open(&config.document_id, &config.document_title, None);

    println!("{HELP}");
    render(&get_view(&session).await?, &mut block_view);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, text) = line.split_once(' ').unwrap_or((line, ""));
        let text = text.replace("\\n", "\n");

        match command {
            "" => continue,
            "quit" | "exit" => break,
            "help" => {
                println!("{HELP}");
                continue;
            }
            "type" => edit(&session, text, true)?,
            "save" => edit(&session, text, false)?,
            "prev" | "next" | "toggle" | "latest" => {
                let command = match command {
                    "prev" => VersionCommand::Prev,
                    "next" => VersionCommand::Next,
                    "toggle" => VersionCommand::Toggle,
                    _ => VersionCommand::Latest,
                };
                apply_command(&session, command).await?;
            }
            "stream" | "idle" => {
                let status = if command == "stream" {
                    BlockStatus::Streaming
                } else {
                    BlockStatus::Idle
                };
                block_view.set_status(status);
                set_status(&session, status)?;
            }
            "reload" => {
                if let Err(e) = reload(&session).await {
                    println!("reload failed: {e}");
                }
            }
            "show" => {}
            other => {
                println!("unknown command '{other}'; {HELP}");
                continue;
            }
        }

        render(&get_view(&session).await?, &mut block_view);
    }

    let summary = close(&session).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    handle.await?;
    Ok(())
}

fn render(view: &DocumentView, block_view: &mut BlockView) {
    block_view.sync_content(view);
    let toolbar = Toolbar::derive(view);
    let position = match view.cursor {
        Some(cursor) => format!("{}/{}", cursor + 1, view.version_count),
        None => format!("-/{}", view.version_count),
    };

    println!("== {} [{}] ==", view.title, position);
    let label = status_label(view, chrono::Utc::now());
    if !label.is_empty() {
        println!("{label}");
    }
    if toolbar.history_overlay {
        println!("(viewing an older version; editing is disabled)");
    }
    match (&view.mode, &view.diff) {
        (DisplayMode::Diff, Some(diff)) => {
            for line in diff.previous.lines() {
                println!("- {line}");
            }
            for line in diff.current.lines() {
                println!("+ {line}");
            }
        }
        _ => println!("{}", view.content),
    }
    println!(
        "[prev:{} next:{} diff:{} copy:{}]",
        on_off(toolbar.can_prev),
        on_off(toolbar.can_next),
        on_off(toolbar.can_toggle_diff),
        on_off(toolbar.can_copy),
    );
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}
