use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ytxt", about = "YouTube transcript and metadata extractor", version)]
pub struct Cli {
    /// YouTube video URL or video ID (reads from stdin if omitted)
    pub url: Option<String>,

    /// Emit transcript and metadata as a JSON object
    #[arg(short, long)]
    pub json: bool,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip the audio-download/transcription fallback
    #[arg(long)]
    pub no_audio: bool,

    /// Show acquisition details on stderr
    #[arg(short, long)]
    pub verbose: bool,
}
