use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ffpipe")]
#[command(author, version, about = "Typed ffmpeg command building, probing and frame capture")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe a source and display its first video stream
    Probe {
        /// File, URL or capture device index
        #[arg(required = true)]
        source: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build an ffmpeg command line from one input to one output
    Build(BuildArgs),

    /// Capture raw frames from a source and save them as images
    Capture {
        /// File, URL or capture device index
        #[arg(required = true)]
        source: String,

        /// Number of frames to save
        #[arg(short = 'n', long, default_value = "1")]
        frames: usize,

        /// Directory the images are written to
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Capture frame rate; defaults to the configured or probed rate
        #[arg(long)]
        fps: Option<f64>,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
pub struct BuildArgs {
    /// File, URL or capture device index
    #[arg(required = true)]
    pub input: String,

    /// Output destination
    #[arg(required = true)]
    pub output: String,

    /// Encoder name, e.g. libx264, h264_nvenc or copy
    #[arg(long)]
    pub codec: Option<String>,

    /// Output muxer name, e.g. mp4 or matroska
    #[arg(long)]
    pub format: Option<String>,

    /// Start position as HH:MM:SS
    #[arg(long)]
    pub seek: Option<String>,

    /// Stop position as HH:MM:SS
    #[arg(long)]
    pub to: Option<String>,

    /// Output duration in seconds
    #[arg(long)]
    pub duration: Option<f64>,

    /// Video filter graph
    #[arg(long)]
    pub video_filter: Option<String>,

    /// Replace the output if it exists
    #[arg(long)]
    pub overwrite: bool,

    /// Execute the command and wait for it to exit
    #[arg(long)]
    pub run: bool,
}
