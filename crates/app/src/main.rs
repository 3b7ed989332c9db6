use std::io::Write as _;
use std::process::ExitCode;
use std::sync::Arc;

use langai::presenter::{
    Command, ensure_summary_offered, help_text, render_in_flight, render_message, render_snapshot,
};
use langai::settings::SettingsStore;
use langai::workflow::SummarizePolicy;
use langai::{Indicators, StoreEvent, WorkflowCoordinator};
use langai_llm::create_gateway;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

/// Presenter entry point.
///
/// stdout carries the rendered messages; logs go to stderr, filtered by `RUST_LOG`.
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings_store = SettingsStore::load();
    let settings = settings_store.settings();
    tracing::info!(path = ?settings_store.config_path(), "settings loaded");

    let gateway = match create_gateway(settings.provider.to_provider_config()) {
        Ok(gateway) => gateway,
        Err(error) => {
            tracing::error!(error = %error, "failed to create capability gateway");
            return ExitCode::FAILURE;
        }
    };

    let coordinator = WorkflowCoordinator::new(gateway, settings.workflow.clone());
    let policy = Arc::new(settings.workflow.summarize.clone());
    let renderer = tokio::spawn(render_events(coordinator.clone(), policy.clone()));

    coordinator.initialize().await;
    println!("{}", help_text());

    let mut in_flight: Vec<JoinHandle<()>> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(error) => {
                tracing::error!(error = %error, "failed to read input");
                break;
            }
        };

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(error) => {
                println!("{error}");
                continue;
            }
        };

        in_flight.retain(|task| !task.is_finished());
        match command {
            Command::Submit(text) => {
                if let Some((_, task)) = coordinator.spawn_submit(text) {
                    in_flight.push(task);
                }
            }
            Command::Target { index, language } => {
                if let Err(error) = coordinator.set_target_language(index, language) {
                    println!("{error}");
                }
            }
            Command::Default(language) => {
                coordinator.set_default_target_language(language.clone());
                let mut workflow = settings_store.settings().workflow.clone();
                workflow.default_target_language = language;
                match settings_store.update_workflow(workflow) {
                    Ok(()) => println!(
                        "new messages will target {}",
                        coordinator.default_target_language()
                    ),
                    Err(error) => {
                        tracing::warn!(error = %error, "failed to save default target language");
                        println!("default changed for this session only: {error}");
                    }
                }
            }
            Command::Translate(index) => {
                let coordinator = coordinator.clone();
                in_flight.push(tokio::spawn(async move {
                    if let Err(error) = coordinator.translate(index).await {
                        println!("{error}");
                    }
                }));
            }
            Command::Summarize(index) => {
                let offered = coordinator
                    .message(index)
                    .map_err(|error| error.to_string())
                    .and_then(|record| {
                        ensure_summary_offered(&record, &policy).map_err(|error| error.to_string())
                    });
                if let Err(message) = offered {
                    println!("{message}");
                    continue;
                }
                let coordinator = coordinator.clone();
                in_flight.push(tokio::spawn(async move {
                    if let Err(error) = coordinator.summarize(index).await {
                        println!("{error}");
                    }
                }));
            }
            Command::List => print!("{}", render_snapshot(&coordinator.snapshot(), &policy)),
            Command::Help => println!("{}", help_text()),
            Command::Quit => break,
        }
    }

    // Let running operations land before exiting.
    for result in futures::future::join_all(in_flight).await {
        if let Err(error) = result {
            tracing::warn!(error = %error, "operation task failed");
        }
    }
    renderer.abort();
    let _ = std::io::stdout().flush();
    ExitCode::SUCCESS
}

async fn render_events(coordinator: WorkflowCoordinator, policy: Arc<SummarizePolicy>) {
    let mut events = coordinator.subscribe();
    let mut indicators = Indicators::default();
    loop {
        match events.recv().await {
            Ok(StoreEvent::Appended(record) | StoreEvent::Updated(record)) => {
                print!("{}", render_message(&record, &indicators, &policy));
            }
            Ok(StoreEvent::IndicatorsChanged(changed)) => {
                indicators = changed;
                let messages = coordinator.snapshot().messages;
                print!("{}", render_in_flight(&messages, &indicators, &policy));
            }
            Ok(StoreEvent::InitializationFailed(message)) => println!("! {message}"),
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "renderer lagged, re-rendering snapshot");
                let snapshot = coordinator.snapshot();
                indicators = snapshot.indicators;
                print!("{}", render_snapshot(&snapshot, &policy));
            }
            Err(RecvError::Closed) => break,
        }
    }
}
