// Will of Code - command line entry point
//
// Reads one request per line from stdin and prints the result. When a turn
// returns a proposal, the next line is read as the accept/reject decision.
// A file loaded by one turn is sent along with every later request.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use will_of_code::models::settings::CheckpointBackend;
use will_of_code::models::state::{ActionPayload, FileContext};
use will_of_code::models::turn::{Decision, ResumeRequest, TurnRequest, TurnResponse};
use will_of_code::services::graph_workflow::{
    CheckpointStore, InMemoryCheckpointStore, SqliteCheckpointStore,
};
use will_of_code::storage::{open_pool, ConfigService};
use will_of_code::utils::paths;
use will_of_code::{AppConfig, Orchestrator};
use will_of_code_llm::{BlockingGenerator, OpenAIProvider};
use will_of_code_tools::{local_registry, LocalToolConfig, RegistryToolBridge};

const PROMPT: &str = "> ";

fn checkpoint_store(config: &AppConfig) -> anyhow::Result<Arc<dyn CheckpointStore>> {
    match config.checkpoint_backend {
        CheckpointBackend::Memory => Ok(Arc::new(InMemoryCheckpointStore::new())),
        CheckpointBackend::Sqlite => {
            let path = match &config.checkpoint_db_path {
                Some(path) => path.clone(),
                None => paths::checkpoint_db_path()?,
            };
            let pool = open_pool(&path)
                .with_context(|| format!("opening checkpoint database {}", path.display()))?;
            Ok(Arc::new(SqliteCheckpointStore::new(pool)?))
        }
    }
}

fn build_orchestrator(config: &AppConfig) -> anyhow::Result<Orchestrator> {
    let provider = OpenAIProvider::new(config.provider.to_provider_config())?;
    let generator = BlockingGenerator::new(
        Arc::new(provider),
        Duration::from_secs(config.provider.timeout_secs),
    )?;

    let tool_timeout = Duration::from_secs(config.tool_timeout_secs);
    let registry = local_registry(&LocalToolConfig {
        interpreter: config.interpreter.clone(),
        exec_timeout: tool_timeout,
    });
    let bridge = RegistryToolBridge::new(
        Arc::new(registry),
        config.resolved_workspace_root(),
        tool_timeout,
    )?;

    let orchestrator = Orchestrator::new(
        config,
        Arc::new(generator),
        Arc::new(bridge),
        checkpoint_store(config)?,
    )?;
    Ok(orchestrator)
}

fn print_response(response: &TurnResponse) {
    println!("{}", response.result_text);
    if let Some(proposal) = &response.proposal {
        println!();
        println!("{} [accept/reject]", proposal.question);
    }
}

/// Keep the loaded file in step with an accepted edit to it.
fn apply_accepted_edit(loaded: &mut Option<FileContext>, payload: Option<&ActionPayload>) {
    if let (Some(file), Some(ActionPayload::ApplyEdit { path: Some(path), code, .. })) =
        (loaded.as_mut(), payload)
    {
        if *path == file.path {
            file.content = code.clone();
        }
    }
}

fn prompt() {
    print!("{}", PROMPT);
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_service = ConfigService::new()?;
    let config = config_service.get_config_clone();
    info!(config = %config_service.path().display(), "Configuration loaded");

    let orchestrator = build_orchestrator(&config)?;
    let sweeper = orchestrator.spawn_checkpoint_sweeper();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: Option<(String, Option<ActionPayload>)> = None;
    let mut loaded: Option<FileContext> = None;
    prompt();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            prompt();
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        if let Some((thread_id, payload)) = pending.take() {
            match line.parse::<Decision>() {
                Ok(decision) => {
                    match orchestrator
                        .resume(ResumeRequest {
                            thread_id,
                            decision,
                        })
                        .await
                    {
                        Ok(resumed) => {
                            if resumed.applied {
                                apply_accepted_edit(&mut loaded, payload.as_ref());
                            }
                            println!("{}", resumed.result_text);
                        }
                        Err(e) => eprintln!("{}", e),
                    }
                }
                Err(e) => {
                    println!("{}. Please answer accept or reject.", e);
                    pending = Some((thread_id, payload));
                }
            }
            prompt();
            continue;
        }

        let request = TurnRequest::new(line).with_loaded_file(loaded.as_ref());
        match orchestrator.run_turn(request).await {
            Ok(response) => {
                print_response(&response);
                if let Some(file) = &response.file_context {
                    if loaded.as_ref().map(|f| f.path.as_str()) != Some(file.path.as_str()) {
                        info!(path = %file.path, "File loaded for following requests");
                    }
                    loaded = Some(file.clone());
                }
                if response.is_suspended() {
                    pending = Some((response.thread_id, response.action_payload));
                }
            }
            Err(e) => eprintln!("{}", e),
        }
        prompt();
    }

    if let Some((thread_id, _)) = pending {
        orchestrator.abandon(&thread_id).await?;
    }
    sweeper.abort();
    Ok(())
}
