use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framebar::{
    ExtractOptions, FfmpegLogLevel, FrameExtractor, KeyFrameRequest, MethodCall, MethodChannel,
    MethodResponse, OperationType, ProgressCallback, ProgressInfo, VideoFile,
    scan_key_frames_with_options,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Value, json};

const CLI_AFTER_HELP: &str = "Examples:\n  framebar key-frames input.mp4 --out thumbs --interval 2000 --progress\n  framebar first-frame input.mp4 --out poster.jpg\n  framebar scan input.mp4 --json\n  framebar call getKeyFrames --args '{\"path\":\"input.mp4\",\"frameCount\":8}'\n  framebar completions zsh > _framebar";

#[derive(Debug, Parser)]
#[command(
    name = "framebar",
    version,
    about = "Extract key-frame thumbnails for video scrubber bars",
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
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while rendering.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// JPEG quality, 1-100.
    #[arg(long, global = true)]
    quality: Option<u8>,

    /// Thumbnail bounding box width.
    #[arg(long, global = true)]
    max_width: Option<u32>,

    /// Thumbnail bounding box height.
    #[arg(long, global = true)]
    max_height: Option<u32>,

    /// Render worker thread count.
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Abort a call that runs longer than this many milliseconds.
    #[arg(long, global = true)]
    deadline_ms: Option<u64>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract key-frame thumbnails to a directory.
    #[command(
        about = "Extract key-frame thumbnails",
        after_help = "Examples:\n  framebar key-frames input.mp4 --out thumbs --count 10\n  framebar key-frames input.mp4 --out thumbs --interval 1000 --skip-first --json"
    )]
    KeyFrames {
        /// Input video path.
        input: PathBuf,
        /// Output directory for thumbnails.
        #[arg(long)]
        out: PathBuf,
        /// Return at most this many thumbnails.
        #[arg(long)]
        count: Option<i64>,
        /// One thumbnail per this many milliseconds of video.
        #[arg(long)]
        interval: Option<i64>,
        /// Drop the first selected thumbnail.
        #[arg(long)]
        skip_first: bool,
        /// Print a machine-readable summary.
        #[arg(long)]
        json: bool,
    },

    /// Render the first frame to a JPEG file.
    #[command(
        about = "Render the first frame",
        after_help = "Examples:\n  framebar first-frame input.mp4 --out poster.jpg"
    )]
    FirstFrame {
        /// Input video path.
        input: PathBuf,
        /// Output JPEG path.
        #[arg(long)]
        out: PathBuf,
    },

    /// List key-frame timestamps without decoding any pixels.
    #[command(
        about = "List key-frame timestamps",
        after_help = "Examples:\n  framebar scan input.mp4\n  framebar scan input.mp4 --json"
    )]
    Scan {
        /// Input video path.
        input: PathBuf,
        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Invoke a bridge method with JSON arguments.
    #[command(
        about = "Invoke a bridge method",
        after_help = "Examples:\n  framebar call getFirstFrame --args '{\"path\":\"input.mp4\"}'"
    )]
    Call {
        /// Method name (getKeyFrames, getFirstFrame).
        method: String,
        /// Arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_log_level(value: &str) -> Option<FfmpegLogLevel> {
    value.parse().ok()
}

fn thumbnail_file_name(index: usize) -> String {
    format!("frame_{index:04}.jpg")
}

fn is_thumbnail_file_name(name: &str) -> bool {
    name.strip_prefix("frame_")
        .and_then(|rest| rest.strip_suffix(".jpg"))
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Delete thumbnails left by an earlier run so the directory matches the
/// new sequence. Other files are kept.
fn remove_stale_thumbnails(directory: &Path) -> std::io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let is_thumbnail = entry.file_name().to_str().is_some_and(is_thumbnail_file_name);
        if is_thumbnail && entry.file_type()?.is_file() {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn base_extract_options(
    global: &GlobalOptions,
) -> Result<ExtractOptions, Box<dyn std::error::Error>> {
    let mut options = ExtractOptions::new();

    if let Some(quality) = global.quality {
        if !(1..=100).contains(&quality) {
            return Err(format!("--quality must be between 1 and 100, got {quality}").into());
        }
        options = options.with_quality(quality);
    }

    let (default_width, default_height) = options.max_size();
    if global.max_width.is_some() || global.max_height.is_some() {
        let width = global.max_width.unwrap_or(default_width);
        let height = global.max_height.unwrap_or(default_height);
        if width == 0 || height == 0 {
            return Err("--max-width and --max-height must be greater than 0".into());
        }
        options = options.with_max_size(width, height);
    }

    if let Some(deadline) = global.deadline_ms {
        options = options.with_deadline(Duration::from_millis(deadline));
    }

    if global.progress {
        options = options.with_progress(Arc::new(TerminalProgress::new()?));
    }

    Ok(options)
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed = parse_log_level(level).ok_or(format!("unsupported --log-level: {level}"))?;
        framebar::set_ffmpeg_log_level(parsed);
    } else if global.verbose {
        framebar::set_ffmpeg_log_level(FfmpegLogLevel::Info);
    }

    if let Some(threads) = global.threads {
        if threads == 0 {
            return Err("--threads must be greater than 0".into());
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    Ok(())
}

/// Drives an indicatif bar from pipeline progress reports.
struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new_spinner();
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        match info.operation {
            OperationType::KeyFrameScan => {
                self.bar.set_message(format!("scanning ({} key frames)", info.current));
                self.bar.tick();
            }
            _ => {
                if let Some(total) = info.total {
                    self.bar.set_length(total);
                }
                self.bar.set_message("rendering");
                self.bar.set_position(info.current);
                if info.total == Some(info.current) {
                    self.bar.finish_with_message("done");
                }
            }
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::KeyFrames {
            input,
            out,
            count,
            interval,
            skip_first,
            json,
        } => {
            if out.exists() {
                if !cli.global.overwrite {
                    return Err(format!(
                        "output directory already exists: {} (use --overwrite)",
                        out.display()
                    )
                    .into());
                }
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("writing into existing directory {}", out.display()).yellow()
                );
            }

            let mut request = KeyFrameRequest::new(&input).with_skip_first_frame(skip_first);
            if let Some(count) = count {
                request = request.with_frame_count(count);
            }
            if let Some(interval) = interval {
                request = request.with_frame_interval(interval);
            }

            let extractor = FrameExtractor::new(base_extract_options(&cli.global)?);
            let started = Instant::now();
            let thumbnails = extractor.key_frames(&request)?;
            let elapsed = started.elapsed();

            if out.is_dir() {
                let removed = remove_stale_thumbnails(&out)?;
                if removed > 0 && cli.global.verbose {
                    eprintln!("removed {removed} stale thumbnail(s) from {}", out.display());
                }
            }
            fs::create_dir_all(&out)?;
            let mut written = Vec::with_capacity(thumbnails.len());
            for (index, jpeg) in thumbnails.iter().enumerate() {
                let output_path = out.join(thumbnail_file_name(index));
                fs::write(&output_path, jpeg)?;
                if cli.global.verbose {
                    eprintln!("saved thumbnail {} -> {}", index, output_path.display());
                }
                written.push(json!({
                    "path": output_path.display().to_string(),
                    "bytes": jpeg.len(),
                }));
            }

            if json {
                let payload = json!({
                    "input": input.display().to_string(),
                    "count": thumbnails.len(),
                    "elapsed_seconds": elapsed.as_secs_f64(),
                    "thumbnails": written,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!(
                        "Extracted {} thumbnail(s) to {} in {:.3}s",
                        thumbnails.len(),
                        out.display(),
                        elapsed.as_secs_f64()
                    )
                    .green()
                );
            }
        }
        Commands::FirstFrame { input, out } => {
            ensure_writable_path(&out, cli.global.overwrite)?;
            let extractor = FrameExtractor::new(base_extract_options(&cli.global)?);
            let images = extractor.first_frame(&input)?;
            let jpeg = images.first().ok_or("no frame rendered")?;
            fs::write(&out, jpeg)?;
            println!("{} {}", "saved".green().bold(), out.display());
        }
        Commands::Scan { input, json } => {
            let options = base_extract_options(&cli.global)?;
            let mut file = VideoFile::open(&input)?;
            let key_frames = scan_key_frames_with_options(&mut file, &options)?;
            let metadata = file.metadata();

            if json {
                let payload = json!({
                    "format": metadata.format,
                    "duration_ms": metadata.duration_millis(),
                    "video_packets": key_frames.video_packets,
                    "video": metadata.video.as_ref().map(|video| {
                        let (width, height) = video.display_dimensions();
                        json!({
                            "width": width,
                            "height": height,
                            "fps": video.frames_per_second,
                            "codec": video.codec,
                            "rotation": video.orientation.rotation.degrees(),
                        })
                    }),
                    "key_frames_ms": key_frames
                        .timestamps
                        .iter()
                        .map(|timestamp| timestamp.as_millis())
                        .collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", metadata.format);
                println!("Duration: {:?}", metadata.duration);
                if let Some(video) = &metadata.video {
                    let (width, height) = video.display_dimensions();
                    println!(
                        "Video: {}x{} @ {:.2} fps [{}]",
                        width, height, video.frames_per_second, video.codec,
                    );
                }
                println!(
                    "Key frames: {} of {} video packets",
                    key_frames.len(),
                    key_frames.video_packets
                );
                for timestamp in &key_frames.timestamps {
                    println!("  {timestamp}");
                }
            }
        }
        Commands::Call { method, args } => {
            let arguments: Value = serde_json::from_str(&args)?;
            let channel = MethodChannel::new(FrameExtractor::new(base_extract_options(&cli.global)?));
            if cli.global.verbose {
                eprintln!("calling {} on {}", method, channel.name());
            }
            let response = channel.handle_blocking(&MethodCall::new(method, arguments));
            println!("{}", serde_json::to_string_pretty(&response.to_json())?);
            if let MethodResponse::Error { code, message } = response {
                return Err(format!("{code}: {message}").into());
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framebar", &mut std::io::stdout());
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

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{
        Cli, Commands, GlobalOptions, base_extract_options, is_thumbnail_file_name,
        parse_log_level, remove_stale_thumbnails, thumbnail_file_name,
    };
    use clap::Parser;

    #[test]
    fn parse_log_level_aliases() {
        assert!(parse_log_level("quiet").is_some());
        assert!(parse_log_level("WARN").is_some());
        assert!(parse_log_level("debug").is_some());
        assert!(parse_log_level("chatty").is_none());
    }

    #[test]
    fn thumbnails_sort_lexically_in_time_order() {
        assert_eq!(thumbnail_file_name(0), "frame_0000.jpg");
        assert_eq!(thumbnail_file_name(42), "frame_0042.jpg");
        assert!(thumbnail_file_name(9) < thumbnail_file_name(10));
    }

    #[test]
    fn key_frames_arguments_parse() {
        let cli = Cli::try_parse_from([
            "framebar",
            "key-frames",
            "in.mp4",
            "--out",
            "thumbs",
            "--count",
            "8",
            "--skip-first",
            "--quality",
            "40",
        ])
        .unwrap();
        assert_eq!(cli.global.quality, Some(40));
        match cli.command {
            Commands::KeyFrames {
                count, skip_first, interval, ..
            } => {
                assert_eq!(count, Some(8));
                assert!(skip_first);
                assert_eq!(interval, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn out_of_range_quality_is_rejected() {
        let global = GlobalOptions {
            quality: Some(0),
            ..GlobalOptions::default()
        };
        assert!(base_extract_options(&global).is_err());
    }

    #[test]
    fn partial_box_keeps_default_for_other_side() {
        let global = GlobalOptions {
            max_width: Some(320),
            ..GlobalOptions::default()
        };
        let options = base_extract_options(&global).unwrap();
        assert_eq!(options.max_size(), (320, 360));
    }

    #[test]
    fn thumbnail_names_are_recognised() {
        assert!(is_thumbnail_file_name(&thumbnail_file_name(7)));
        assert!(is_thumbnail_file_name("frame_12345.jpg"));
        assert!(!is_thumbnail_file_name("frame_.jpg"));
        assert!(!is_thumbnail_file_name("frame_0001.png"));
        assert!(!is_thumbnail_file_name("notes.txt"));
    }

    #[test]
    fn overwrite_clears_thumbnails_from_a_longer_run() {
        let directory = tempfile::tempdir().unwrap();
        for index in 0..5 {
            fs::write(directory.path().join(thumbnail_file_name(index)), b"old").unwrap();
        }
        fs::write(directory.path().join("notes.txt"), b"keep").unwrap();

        assert_eq!(remove_stale_thumbnails(directory.path()).unwrap(), 5);

        let remaining: Vec<String> = fs::read_dir(directory.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(remaining, vec!["notes.txt".to_string()]);
    }
}
