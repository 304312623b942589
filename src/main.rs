//! rswebtech 命令行入口
//! 传入URL时逐个检测；未传入URL时进入交互模式（输入 quit 退出）

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

use rswebtech::{ConfigManager, DetectResult, TechDetector};

#[derive(Parser, Debug)]
#[command(name = "rswebtech")]
#[command(version, about = "Fingerprint the technology stack behind a URL", long_about = None)]
struct Cli {
    /// URLs to analyze; bare hosts default to https://
    urls: Vec<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Network timeout in seconds (primary fetch and every probe call)
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Custom signature file (JSON array of signatures)
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut builder = ConfigManager::custom();
    if let Some(secs) = cli.timeout {
        builder = builder.all_timeouts(Duration::from_secs(secs.max(1)));
    }
    if let Some(path) = &cli.rules {
        builder = builder.signature_file(path);
    }
    let detector = TechDetector::new(builder.build())
        .await
        .context("failed to initialize detector")?;

    if cli.urls.is_empty() {
        interactive(&detector, cli.json).await
    } else {
        for url in &cli.urls {
            analyze(&detector, url, cli.json).await?;
        }
        Ok(())
    }
}

fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// 裸主机名补全为 https://
fn normalize_url(input: &str) -> String {
    let input = input.trim();
    if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    }
}

async fn analyze(detector: &TechDetector, input: &str, json: bool) -> Result<()> {
    let url = normalize_url(input);
    if !json {
        println!("\nAnalyzing {}... Please wait.", url);
    }
    match detector.detect(&url).await {
        Ok(result) => print_result(&result, json)?,
        Err(e) => {
            if json {
                println!("{}", serde_json::json!({ "url": url, "error": e.to_string(), "labels": [] }));
            } else {
                println!("Could not analyze {}: {}", url, e);
            }
        }
    }
    Ok(())
}

fn print_result(result: &DetectResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    if result.is_empty() {
        println!("\nNo technologies detected.");
    } else {
        println!("\nDetected technologies and features:");
        for label in &result.labels {
            println!("  • {}", label);
        }
    }
    println!("\n{}", "=".repeat(50));
    Ok(())
}

async fn interactive(detector: &TechDetector, json: bool) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout
            .write_all(b"\nEnter a URL to analyze (or 'quit' to exit): ")
            .await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") {
            break;
        }
        analyze(detector, line, json).await?;
    }
    Ok(())
}
