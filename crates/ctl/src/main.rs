use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use idea_validator_core::{
    api::{ErrorBody, VALIDATE_PATH},
    conform, export, normalize, report, IdeaSubmission, ListPolicy, ValidationResult,
};
use time::{Date, OffsetDateTime};
use tracing_subscriber::EnvFilter;

/// Client side waits as long as the daemon's own model timeout.
const CLIENT_TIMEOUT_SECS: u64 = 120;

#[derive(Parser, Debug)]
#[command(name = "idea-validatorctl")]
struct Args {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Submit an idea to a running daemon and print the analysis.
    Validate {
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        daemon: String,
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        idea: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        /// Print the raw result JSON instead of the text report.
        #[arg(long)]
        json: bool,
        /// Also write the .docx report into this directory.
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Build a .docx report from a saved result.
    Export {
        #[arg(long)]
        result: PathBuf,
        #[arg(long)]
        idea: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Run the reply normalizer on a saved model reply.
    Normalize {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        lenient: bool,
    },
}

// Single-threaded so the local UTC offset can be read.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let today = local_today();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.cmd {
        Cmd::Validate {
            daemon,
            idea,
            file,
            json,
            export,
        } => {
            let idea = match (idea, file) {
                (Some(idea), _) => idea,
                (None, Some(path)) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("read {}", path.display()))?,
                (None, None) => bail!("either --idea or --file is required"),
            };
            let idea = idea.trim();
            let result = submit(&daemon, idea).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", report::render_text(&report::blocks(&result, idea, today)));
            }

            if let Some(dir) = export {
                let path = dir.join(export::file_name(today));
                write_report(&result, idea, today, &path)?;
                eprintln!("report written to {}", path.display());
            }
        }
        Cmd::Export { result, idea, out } => {
            let bytes = tokio::fs::read(&result)
                .await
                .with_context(|| format!("read {}", result.display()))?;
            let result: ValidationResult =
                serde_json::from_slice(&bytes).context("parse result json")?;
            let result = conform(result, ListPolicy::Strict)
                .context("saved result does not match the report schema")?;
            write_report(&result, &idea, today, &out)?;
            println!("{}", out.display());
        }
        Cmd::Normalize { input, lenient } => {
            let raw = tokio::fs::read_to_string(&input)
                .await
                .with_context(|| format!("read {}", input.display()))?;
            let policy = if lenient {
                ListPolicy::Lenient
            } else {
                ListPolicy::Strict
            };
            let result = normalize(&raw, policy)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

async fn submit(daemon: &str, idea: &str) -> anyhow::Result<ValidationResult> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
        .build()?;
    let url = format!("{}{}", daemon.trim_end_matches('/'), VALIDATE_PATH);
    tracing::debug!(%url, idea_chars = idea.chars().count(), "submitting idea");

    let resp = client
        .post(&url)
        .json(&IdeaSubmission {
            idea: idea.to_string(),
        })
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                anyhow::anyhow!("분석 시간이 초과되었습니다. 잠시 후 다시 시도해주세요.")
            } else {
                anyhow::Error::new(e).context(format!("request to {url} failed"))
            }
        })?;

    let status = resp.status();
    if !status.is_success() {
        let bytes = resp.bytes().await?;
        match serde_json::from_slice::<ErrorBody>(&bytes) {
            Ok(body) => match body.details {
                Some(details) => bail!("{} ({}): {details}", body.error, body.code),
                None => bail!("{} ({})", body.error, body.code),
            },
            Err(_) => bail!("daemon answered {status}"),
        }
    }

    resp.json().await.context("parse daemon reply")
}

/// Calendar date in the local time zone; UTC when the offset is unknown.
fn local_today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|e| {
            tracing::debug!(error = %e, "local offset unavailable, using UTC");
            OffsetDateTime::now_utc()
        })
        .date()
}

/// Writes the report, then reads it back and checks every paragraph.
fn write_report(
    result: &ValidationResult,
    idea: &str,
    today: Date,
    path: &Path,
) -> anyhow::Result<()> {
    let blocks = report::blocks(result, idea, today);
    export::save(&blocks, path).with_context(|| format!("write {}", path.display()))?;

    let written = std::fs::read(path).with_context(|| format!("read back {}", path.display()))?;
    export::verify(&written, &blocks)?;
    tracing::info!(path = %path.display(), paragraphs = blocks.len(), "report exported");
    Ok(())
}
