mod cli;
mod config;
mod core;
mod error;
mod tui;

use crate::cli::{Cli, Commands};
use crate::core::{FileEntry, StorageService, ToolEvent, ToolRequest, Toolkit};
use crate::error::Result;
use crate::tui::components::format_size;
use chrono::{DateTime, Local};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // A subscriber writing to the terminal would corrupt the TUI.
    if !matches!(cli.command, None | Some(Commands::Tui)) {
        init_tracing();
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.global.config();
    let storage = StorageService::default();

    match cli.command {
        Some(Commands::List) => run_cli_list(&storage),
        Some(Commands::Tui) | None => tui::run(Toolkit::new(config, storage)?),
        Some(command) => match command.tool_request() {
            Some(request) => run_cli_tool(Toolkit::new(config, storage)?, request).await,
            None => Ok(()),
        },
    }
}

async fn run_cli_tool(toolkit: Toolkit, request: ToolRequest) -> Result<()> {
    let output = toolkit
        .run(&request, |event| match event {
            ToolEvent::Status(status) => println!("{status}..."),
            ToolEvent::Page { progress, ceiling } => println!(
                "Page {}/{ceiling}: {} comments ({} total)",
                progress.page, progress.received, progress.total
            ),
        })
        .await?;

    println!();
    println!("{}", output.title);
    println!("{}", "=".repeat(output.title.chars().count()));
    println!("{}", output.body);

    Ok(())
}

fn run_cli_list(storage: &StorageService) -> Result<()> {
    let files = storage.list_files()?;

    if files.is_empty() {
        println!("No files found.");
        return Ok(());
    }

    println!("Found {} files:", files.len());
    println!();

    for file in &files {
        println!("{}", list_line(file));
    }

    Ok(())
}

fn list_line(file: &FileEntry) -> String {
    let modified: DateTime<Local> = file.modified.into();
    format!(
        "{:<12} {:<14} {:<40} {:>8}  {}",
        file.file_type.label(),
        file.video_id().unwrap_or_default(),
        file.name,
        format_size(file.size),
        modified.format("%Y-%m-%d %H:%M")
    )
}
