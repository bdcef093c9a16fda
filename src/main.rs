use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use eyre::{Result, bail};
use log::info;

mod cli;

use cli::Cli;
use ytxt::config::Config;
use ytxt::pipeline::Pipeline;
use ytxt::whisper::{SpeechToText, WhisperApi, WhisperModel};
use ytxt::ytdlp::{VideoExtractor, YtDlp};

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytxt.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytxt")
        .join("logs")
}

fn tool_version(name: &str) -> Option<String> {
    Command::new(name)
        .arg("--version")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| {
            String::from_utf8_lossy(&o.stdout)
                .trim()
                .lines()
                .next()
                .unwrap_or("")
                .to_string()
        })
}

fn build_after_help() -> String {
    let yt_dlp = tool_version("yt-dlp");

    let yt_dlp_line = match &yt_dlp {
        Some(v) => format!("  \x1b[32m✅\x1b[0m yt-dlp     {v}"),
        None => "  \x1b[31m❌\x1b[0m yt-dlp     (not found — needed for subtitle and audio extraction)".to_string(),
    };

    let log_path = log_dir().join("ytxt.log");

    format!(
        "\nREQUIRED TOOLS:\n{yt_dlp_line}\n\nLogs are written to: {}",
        log_path.display()
    )
}

/// Bare 11-character IDs are accepted and expanded to a watch URL.
fn normalize_input(input: &str) -> String {
    if input.contains("://") {
        input.to_string()
    } else if let Some(id) = ytxt::extract_video_id(input) {
        format!("https://www.youtube.com/watch?v={id}")
    } else {
        input.to_string()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = Arc::new(Config::load().unwrap_or_default());

    if cli.verbose {
        let config_path = ytxt::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
    }

    let extractor: Arc<dyn VideoExtractor> = Arc::new(YtDlp::new(config.user_agents.clone()));
    let speech: Option<Arc<dyn SpeechToText>> = if cli.no_audio {
        None
    } else {
        let model = config
            .whisper_model
            .as_deref()
            .map(WhisperModel::from_name)
            .unwrap_or_default();
        Some(Arc::new(WhisperApi::new(reqwest::Client::new(), model)))
    };

    let pipeline = Pipeline::new(config, extractor, speech);

    // Collect URLs: from arg or stdin
    let urls = if let Some(ref url) = cli.url {
        vec![url.clone()]
    } else {
        let stdin = io::stdin();
        stdin.lock().lines().collect::<Result<Vec<_>, _>>()?
    };

    if urls.is_empty() {
        bail!("no URL or video ID provided\n\nUsage: ytxt <URL>\n       echo <URL> | ytxt");
    }

    for url_input in &urls {
        let url_input = url_input.trim();
        if url_input.is_empty() {
            continue;
        }

        let url = normalize_input(url_input);
        let (transcript, metadata) = pipeline.process(&url).await;

        if cli.verbose {
            eprintln!(
                "Video: {} ({})\nAuthor: {}\nTranscript chars: {}",
                metadata.title,
                metadata.video_id.as_deref().unwrap_or("unknown id"),
                metadata.author.as_deref().unwrap_or("unknown"),
                transcript.as_deref().map(|t| t.chars().count()).unwrap_or(0),
            );
        }

        if transcript.is_none() && !cli.json {
            eprintln!("No transcript or fallback content for: {url}");
        }

        let rendered = if cli.json {
            ytxt::output::render_json(transcript.as_deref(), &metadata)
        } else {
            ytxt::output::render_plain(transcript.as_deref())
        };

        if let Some(ref path) = cli.output {
            std::fs::write(path, &rendered)?;
            if cli.verbose {
                eprintln!("Output written to: {}", path.display());
            }
        } else {
            println!("{rendered}");
        }
    }

    Ok(())
}
