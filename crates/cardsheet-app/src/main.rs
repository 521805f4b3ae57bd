// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cardsheet: print-accurate 3x3 card sheet renderer.
//
// Entry point. Initialises logging, loads the config, and dispatches the
// `render` and `probe` subcommands.

mod cli;
mod services;

use std::process::ExitCode;
use std::time::Duration;

use cardsheet_core::error::{CardsheetError, Result};
use cardsheet_core::human_errors::humanize_error;
use cardsheet_core::types::UpscaleProgress;
use cardsheet_core::AppConfig;
use cardsheet_enhance::{EnhanceParams, EnhancementClient, Enhancer, HttpImageLoader, UpscalePipeline};
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use cli::{Cli, Commands, RenderArgs};
use services::export::{EnhancementSummary, Exporter};
use services::layout_file::LayoutFile;
use services::output::write_pages;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, cancelling");
            ctrl_c.cancel();
        }
    });

    let result = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Render(args) => render(&config, &args, &cancel).await,
            Commands::Probe => probe(&config, &cancel).await,
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "cardsheet failed");
            let human = humanize_error(&e);
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn render(config: &AppConfig, args: &RenderArgs, cancel: &CancellationToken) -> Result<()> {
    let layout = LayoutFile::load(&args.layout)?;
    let options = args.apply_to(&config.export);
    let format = args.output_format();

    let loader = HttpImageLoader::new(Duration::from_secs(config.enhancement.request_timeout_secs))?;
    let client = EnhancementClient::new(&config.enhancement)?;
    let pipeline = UpscalePipeline::new(client, EnhanceParams::from(&config.enhancement));
    let exporter = Exporter::new(loader, pipeline);

    let (tx, mut rx) = mpsc::unbounded_channel::<UpscaleProgress>();
    let progress_log = tokio::spawn(async move {
        while let Some(p) = rx.recv().await {
            info!(current = p.current, total = p.total, done = p.done, "Upscale progress");
        }
    });

    let batch = exporter
        .render(
            &layout.pages,
            &options,
            move |p| {
                let _ = tx.send(p);
            },
            cancel,
        )
        .await?;
    // The sender went away with the closure; drain the remaining events.
    let _ = progress_log.await;

    let report = &batch.report;
    if let EnhancementSummary::Unavailable { reason } = &report.enhancement {
        let human = humanize_error(&CardsheetError::EnhancementUnavailable(reason.clone()));
        eprintln!("{}\n{}", human.message, human.suggestion);
    }

    let files = write_pages(&batch.pages, format, &args.out)?;
    for file in &files {
        println!("{}", file.display());
    }
    info!(
        report = %serde_json::to_string(report)?,
        "Export complete"
    );
    Ok(())
}

async fn probe(config: &AppConfig, cancel: &CancellationToken) -> Result<()> {
    let client = EnhancementClient::new(&config.enhancement)?;
    if client.probe_availability(cancel).await {
        println!("enhancement service available at {}", client.base_url());
        Ok(())
    } else {
        Err(CardsheetError::EnhancementUnavailable(format!(
            "no answer from {}",
            client.base_url()
        )))
    }
}
