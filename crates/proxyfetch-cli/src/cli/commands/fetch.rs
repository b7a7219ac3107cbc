//! `proxyfetch fetch` – run one batch through the proxy and print results.

use anyhow::{bail, Result};
use proxyfetch_core::config::FetchConfig;
use proxyfetch_core::events::TracingSink;
use proxyfetch_core::executor::{execute_batch, BatchResult, FetchTask, TaskResult};
use proxyfetch_core::transport::CurlTransport;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Longest body excerpt printed in table mode.
const PREVIEW_CHARS: usize = 120;

/// Command-line overrides for one fetch run.
#[derive(Debug, Default)]
pub struct FetchArgs {
    pub urls: Vec<String>,
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub json: bool,
}

/// One printed line / JSON object per task.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct FetchReport {
    pub id: usize,
    pub url: String,
    pub status: &'static str,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn run_fetch(mut cfg: FetchConfig, args: FetchArgs) -> Result<()> {
    if let Some(n) = args.concurrency {
        cfg.concurrency = n;
    }
    if let Some(secs) = args.timeout_secs {
        cfg.request_timeout_secs = secs;
    }
    if let Some(n) = args.max_retries {
        cfg.max_retries = n;
    }
    let urls = if args.urls.is_empty() {
        cfg.target_urls.clone()
    } else {
        args.urls
    };
    if urls.is_empty() {
        bail!("no URLs given and target_urls in config is empty");
    }

    let tasks = FetchTask::batch(&urls)?;
    let options = cfg.batch_options()?;
    let transport = CurlTransport::new(cfg.proxy.settings()?);

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling batch");
                eprintln!("interrupted, cancelling...");
                cancel.cancel();
            }
        })
    };

    let batch = execute_batch(&tasks, &options, &transport, &TracingSink, &cancel).await;
    interrupt.abort();
    let batch = batch?;

    let reports = build_reports(&tasks, &batch);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_table(&reports);
    }

    let failed = batch.failed_count();
    if failed > 0 {
        bail!("{} of {} fetches failed", failed, batch.len());
    }
    Ok(())
}

pub(crate) fn build_reports(tasks: &[FetchTask], batch: &BatchResult) -> Vec<FetchReport> {
    tasks
        .iter()
        .zip(batch)
        .map(|(task, result)| {
            let (status, body, error) = match result {
                TaskResult::Completed { body, .. } => (
                    "completed",
                    Some(String::from_utf8_lossy(body).into_owned()),
                    None,
                ),
                TaskResult::Failed { reason, .. } => ("failed", None, Some(reason.to_string())),
            };
            FetchReport {
                id: task.id,
                url: task.url.to_string(),
                status,
                attempts: result.attempts(),
                body,
                error,
            }
        })
        .collect()
}

fn preview(body: &str) -> String {
    let line = body.trim().lines().next().unwrap_or("");
    let mut out: String = line.chars().take(PREVIEW_CHARS).collect();
    if line.chars().count() > PREVIEW_CHARS || body.trim().lines().nth(1).is_some() {
        out.push_str(" ...");
    }
    out
}

fn print_table(reports: &[FetchReport]) {
    println!("{:<4} {:<10} {:<8} {}", "ID", "STATE", "ATTEMPTS", "URL");
    for r in reports {
        println!("{:<4} {:<10} {:<8} {}", r.id, r.status, r.attempts, r.url);
        if let Some(body) = &r.body {
            println!("     {}", preview(body));
        }
        if let Some(error) = &r.error {
            println!("     error: {}", error);
        }
    }
}
