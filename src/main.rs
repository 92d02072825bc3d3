//! contextbuddy - Main CLI entry point

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;

use contextbuddy::cli::{Args, Commands};
use contextbuddy::config::ToolsConfig;
use contextbuddy::storage::FileStore;
use contextbuddy::tools::{RunRequest, RunResult, ToolOrchestrator};
use contextbuddy::workspace::WorkspaceContext;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let config = ToolsConfig::load(args.config.clone())?;
    let workspace = WorkspaceContext::from_host().with_workspace_root(args.workspace_root());
    let storage = Arc::new(FileStore::default_location()?);

    let orchestrator = ToolOrchestrator::new(workspace, storage);
    orchestrator.reload_config(&config.tools);

    match args.command {
        Commands::List => {
            let tools = orchestrator.list_tools();
            if tools.is_empty() {
                println!("{}", "No tools configured.".yellow());
            }
            for tool in tools {
                let auto = if tool.auto_run { " [auto]" } else { "" };
                println!(
                    "{} {}{}\n    {} {}",
                    tool.title.bold(),
                    format!("({})", tool.id).dimmed(),
                    auto.cyan(),
                    tool.command,
                    tool.args.join(" ")
                );
            }
        }

        Commands::Run { id, force } => {
            let request = if force {
                RunRequest::manual().forced()
            } else {
                RunRequest::manual()
            };

            let result = orchestrator.run_tool(&id, request).await?;
            print_result(&result);
            orchestrator.persist_now();
        }

        Commands::Results { id } => {
            let results: Vec<RunResult> = match id {
                Some(id) => orchestrator.last_result(&id).into_iter().collect(),
                None => orchestrator.store().all(),
            };

            if results.is_empty() {
                println!("{}", "No cached results.".yellow());
            }
            for result in results {
                print_result(&result);
            }
        }

        Commands::Refresh => {
            orchestrator.ensure_fresh().await;
            orchestrator.persist_now();

            let stats = orchestrator.telemetry().get_stats();
            println!(
                "Refreshed: {} run(s), {} succeeded, {} failed",
                stats.runs_completed, stats.runs_succeeded, stats.runs_failed
            );
        }

        Commands::Compose { max_chars } => match orchestrator.compose(max_chars) {
            Some(text) => println!("{text}"),
            None => println!("{}", "No cached results to compose.".yellow()),
        },
    }

    Ok(())
}

/// Print one run result, stderr included for failures
fn print_result(result: &RunResult) {
    let status = match result.status_label() {
        "OK" => "OK".green(),
        "TIMEOUT" => "TIMEOUT".red(),
        other => other.red(),
    };

    let exit = result
        .exit_code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string());

    println!(
        "{} {} {} (exit {}, {} ms, {})",
        status,
        result.title.bold(),
        format!("[{}]", result.id).dimmed(),
        exit,
        result.duration_ms,
        result.started_at.to_rfc3339()
    );

    if !result.success {
        if let Some(parse_error) = &result.parse_error {
            println!("  {}", parse_error.red());
        }
        if !result.stderr.is_empty() {
            println!("{}", result.stderr.red());
        }
    }

    if let Some(data) = &result.data {
        match serde_json::to_string_pretty(data) {
            Ok(payload) => println!("{payload}"),
            Err(_) => println!("{}", result.stdout),
        }
    } else if !result.stdout.is_empty() {
        println!("{}", result.stdout);
    }

    if result.stdout_truncated || result.stderr_truncated {
        println!("{}", "(output truncated)".yellow());
    }
}
