use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framegrab::{
    ExtractOptions, FfmpegLogLevel, ImageFormat, ProgressCallback, ProgressInfo, VideoProbe,
    VideoSession, extract_all,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framegrab metadata input.mp4 --json\n  framegrab extract input.mp4 --out frames --format png --progress\n  framegrab frame input.mp4 --at 0:00:01.5 --out still.png\n  framegrab completions zsh > _framegrab";

#[derive(Debug, Parser)]
#[command(
    name = "framegrab",
    version,
    about = "Extract RGB frames and metadata from MP4 video files",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging from framegrab.
    #[arg(long, global = true)]
    verbose: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<FfmpegLogLevel>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print track metadata.
    #[command(
        visible_alias = "probe",
        after_help = "Examples:\n  framegrab metadata input.mp4\n  framegrab metadata input.mp4 --json"
    )]
    Metadata {
        /// Input MP4 path.
        input: PathBuf,

        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Write every frame plus a meta.txt sidecar into a new run directory.
    #[command(
        after_help = "Examples:\n  framegrab extract input.mp4\n  framegrab extract input.mp4 --out frames --format jpeg --progress"
    )]
    Extract {
        /// Input MP4 path.
        input: PathBuf,
        /// Directory the run directory is created in.
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Frame image format (png, jpeg, bmp).
        #[arg(long, default_value_t = ImageFormat::Png)]
        format: ImageFormat,
        /// Show a progress bar.
        #[arg(long)]
        progress: bool,
    },

    /// Save a single frame, chosen by index or by time.
    #[command(
        after_help = "Examples:\n  framegrab frame input.mp4 --index 42 --out frame42.png\n  framegrab frame input.mp4 --at 01:15 --out still.jpg"
    )]
    Frame {
        /// Input MP4 path.
        input: PathBuf,
        /// Zero-based frame index.
        #[arg(long, conflicts_with = "at", required_unless_present = "at")]
        index: Option<u64>,
        /// Time of the frame: seconds, MM:SS or HH:MM:SS(.fff).
        #[arg(long)]
        at: Option<String>,
        /// Output image path. The extension selects the encoder.
        #[arg(long)]
        out: PathBuf,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_timecode(value: &str) -> Result<Duration, Box<dyn std::error::Error>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("time value cannot be empty".into());
    }

    if let Ok(seconds) = trimmed.parse::<f64>() {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(format!("time must be a non-negative number: {trimmed}").into());
        }
        return Ok(Duration::from_secs_f64(seconds));
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(format!("invalid time format: {trimmed}").into());
    }

    let (hours, minutes, seconds_str) = if parts.len() == 3 {
        (parts[0].parse::<u64>()?, parts[1].parse::<u64>()?, parts[2])
    } else {
        (0_u64, parts[0].parse::<u64>()?, parts[1])
    };

    let seconds = seconds_str.parse::<f64>()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("invalid time format: {trimmed}").into());
    }
    let total_seconds = (hours as f64 * 3600.0) + (minutes as f64 * 60.0) + seconds;
    Ok(Duration::from_secs_f64(total_seconds))
}

fn init_logging(global: &GlobalOptions) {
    let default_filter = if global.verbose { "framegrab=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn apply_global_options(global: &GlobalOptions) {
    init_logging(global);
    if let Some(level) = global.log_level {
        framegrab::set_ffmpeg_log_level(level);
    }
}

/// Drives an indicatif bar from extraction progress callbacks.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(total: u64) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(total);
        let style = ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.current);
        if info.current_frame.is_none() {
            self.bar.finish_with_message("done");
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global);

    match cli.command {
        Commands::Metadata { input, json } => {
            let report = VideoProbe::probe(&input)?;
            let metadata = report.metadata;
            if json {
                let payload = json!({
                    "path": report.path.display().to_string(),
                    "format": report.format.to_string(),
                    "total_frames": metadata.total_frames,
                    "width": metadata.width,
                    "height": metadata.height,
                    "fps": metadata.frames_per_second(),
                    "duration_seconds": metadata.duration_seconds,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", report.format);
                println!("Frames: {}", metadata.total_frames);
                println!("Size: {}x{}", metadata.width, metadata.height);
                println!("Frame rate: {:.3} fps", metadata.frames_per_second());
                println!("Duration: {:.3}s", metadata.duration_seconds);
            }
        }
        Commands::Extract {
            input,
            out,
            format,
            progress,
        } => {
            let mut options = ExtractOptions::new()
                .with_output_root(&out)
                .with_image_format(format);

            if progress {
                let total = VideoProbe::probe(&input)?.metadata.total_frames;
                options = options.with_progress(Arc::new(BarProgress::new(total)?));
            }

            let report = extract_all(&input, &options)?;
            println!(
                "{} {}",
                "success:".green().bold(),
                format!(
                    "Extracted {} frame(s) to {}",
                    report.frames_written,
                    report.run_directory.display()
                )
                .green()
            );
        }
        Commands::Frame {
            input,
            index,
            at,
            out,
        } => {
            let mut session = VideoSession::open(&input)?;
            let index = match (index, at) {
                (Some(index), _) => index,
                (None, Some(at)) => session.seek_to_seconds(parse_timecode(&at)?.as_secs_f64())?,
                (None, None) => return Err("one of --index or --at is required".into()),
            };

            let frame = session.frame_at(index)?;
            frame.save(&out)?;
            if cli.global.verbose {
                eprintln!("saved frame {} -> {}", frame.index(), out.display());
            }
            println!("{} {}", "saved".green().bold(), out.display());
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framegrab", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
