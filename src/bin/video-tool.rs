use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Value, json};
use video_tool::{
    BatchReport, FfmpegLogLevel, FrameSource, InputSet, MergeReport, ProcessOptions,
    ProgressCallback, ProgressInfo, StillFormat, Traversal, VideoHandle,
};

const CLI_AFTER_HELP: &str = "Examples:\n  video-tool extract-frames lecture.avi\n  video-tool extract-frames clips/ --out frames --format jpg --progress\n  video-tool convert recordings/ --out converted\n  video-tool merge trip/ --json\n  video-tool completions zsh > _video-tool";

#[derive(Debug, Parser)]
#[command(
    name = "video-tool",
    version,
    about = "Sample frames from, convert, and merge video files",
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
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar.
    #[arg(long, global = true)]
    progress: bool,

    /// Print the result as machine-readable JSON.
    #[arg(long, global = true)]
    json: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Save about one frame per second of video as still images.
    #[command(
        about = "Sample one frame per second",
        visible_alias = "getframe",
        after_help = "Examples:\n  video-tool extract-frames lecture.avi\n  video-tool extract-frames clips/ --out frames --format jpg"
    )]
    ExtractFrames {
        /// Video file, or directory of video files.
        input: PathBuf,
        /// Directory that receives the `<name>_frames` folders.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Image format (png, jpg, bmp).
        #[arg(long, default_value = "png")]
        format: String,
    },

    /// Re-encode videos as MP4 without audio.
    #[command(
        about = "Convert to MP4 (video only)",
        visible_alias = "getmp4",
        after_help = "Examples:\n  video-tool convert clip.avi\n  video-tool convert recordings/ --out converted"
    )]
    Convert {
        /// Video file, or directory of video files.
        input: PathBuf,
        /// Directory that receives the converted files.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Concatenate every video under a directory into one MP4.
    #[command(
        about = "Merge a directory tree into one video",
        visible_alias = "mergevideo",
        after_help = "Examples:\n  video-tool merge trip/\n  video-tool merge trip/ --out exports --progress"
    )]
    Merge {
        /// Root directory, searched recursively.
        input: PathBuf,
        /// Directory that receives `<root>_merged.mp4`.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the stream attributes of a video file.
    #[command(about = "Print video attributes", visible_alias = "info")]
    Probe {
        /// Video file.
        input: PathBuf,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Log filter used when `RUST_LOG` is unset. Only warnings are logged under
/// the progress bar, which shares stderr with the log.
fn default_log_filter(global: &GlobalOptions) -> &'static str {
    if global.progress {
        "warn"
    } else if global.verbose {
        "debug"
    } else {
        "info"
    }
}

fn init_logging(global: &GlobalOptions) {
    let default_filter = default_log_filter(global);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level
            .parse()
            .map_err(|_| format!("unsupported --log-level: {level}"))?;
        video_tool::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

fn build_options(
    global: &GlobalOptions,
    out: Option<PathBuf>,
    progress: Option<&Arc<TerminalProgress>>,
) -> ProcessOptions {
    let mut options = ProcessOptions::new();
    if let Some(dir) = out {
        options = options.with_output_dir(dir);
    }
    if let Some(progress) = progress {
        options = options
            .with_progress(progress.clone())
            .with_batch_size(if global.verbose { 1 } else { 10 });
    }
    options
}

/// Renders per-file progress as an `indicatif` bar on stderr.
struct TerminalProgress {
    bar: ProgressBar,
    current: Mutex<Option<(usize, PathBuf)>>,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{prefix}] {bar:40.cyan/blue} {pos}/{len} {msg}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self {
            bar,
            current: Mutex::new(None),
        })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Ok(mut current) = self.current.lock() {
            let key = (info.file_index, info.path.clone());
            if current.as_ref() != Some(&key) {
                self.bar.reset();
                self.bar.set_length(info.frames_total.unwrap_or(0));
                self.bar
                    .set_prefix(format!("{}/{}", info.file_index + 1, info.file_count));
                self.bar.set_message(display_name(&info.path));
                *current = Some(key);
            }
        }
        if let Some(total) = info.frames_total {
            // Container frame counts can be low; keep the bar from overflowing.
            if info.frames_processed > total {
                self.bar.set_length(info.frames_processed);
            }
        }
        self.bar.set_position(info.frames_processed);
    }
}

/// Resolve the `probe` argument the way the batch commands resolve theirs.
fn probe_target(input: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match video_tool::resolve_input(input, Traversal::Flat)? {
        InputSet::SingleFile(path) => Ok(path),
        InputSet::FileSet(_) => {
            Err(format!("probe expects a video file, not a directory: {}", input.display()).into())
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn batch_report_json(report: &BatchReport) -> Value {
    json!({
        "operation": report.operation.label(),
        "input": report.input.display().to_string(),
        "succeeded": report.success_count(),
        "completed": report.completed.iter().map(|completed| json!({
            "source": completed.source.display().to_string(),
            "frames": completed.frames,
            "outputs": completed.outputs.iter().map(|path| path.display().to_string()).collect::<Vec<_>>(),
        })).collect::<Vec<_>>(),
        "skipped": report.skipped.iter().map(|(source, reason)| json!({
            "source": source.display().to_string(),
            "reason": reason,
        })).collect::<Vec<_>>(),
        "failures": report.failures.iter().map(|failure| json!({
            "source": failure.path.display().to_string(),
            "error": failure.error.to_string(),
        })).collect::<Vec<_>>(),
    })
}

fn merge_report_json(report: &MergeReport) -> Value {
    json!({
        "operation": "merge",
        "output": report.output.display().to_string(),
        "frames_written": report.frames_written,
        "merged": report.merged.iter().map(|path| path.display().to_string()).collect::<Vec<_>>(),
        "resized": report.resized.iter().map(|path| path.display().to_string()).collect::<Vec<_>>(),
        "failures": report.failures.iter().map(|failure| json!({
            "source": failure.path.display().to_string(),
            "error": failure.error.to_string(),
        })).collect::<Vec<_>>(),
    })
}

fn print_batch_report(report: &BatchReport) {
    for completed in &report.completed {
        println!(
            "{} {} ({} frames, {} file(s) written)",
            "done".green().bold(),
            completed.source.display(),
            completed.frames,
            completed.outputs.len(),
        );
    }
    for (source, reason) in &report.skipped {
        println!("{} {}: {reason}", "skipped".yellow().bold(), source.display());
    }
    for failure in &report.failures {
        eprintln!(
            "{} {}: {}",
            "failed".red().bold(),
            failure.path.display(),
            failure.error
        );
    }
    println!(
        "{} succeeded, {} skipped, {} failed",
        report.success_count(),
        report.skipped.len(),
        report.failures.len(),
    );
}

fn print_merge_report(report: &MergeReport) {
    for path in &report.resized {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("resized frames of {}", path.display()).yellow()
        );
    }
    for failure in &report.failures {
        eprintln!(
            "{} {}: {}",
            "failed".red().bold(),
            failure.path.display(),
            failure.error
        );
    }
    println!(
        "{} {} ({} file(s), {} frames)",
        "saved".green().bold(),
        report.output.display(),
        report.merged.len(),
        report.frames_written,
    );
}

/// Runs the selected command. Returns whether every file succeeded.
fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    apply_global_options(&cli.global)?;

    let progress = if cli.global.progress {
        Some(Arc::new(TerminalProgress::new()?))
    } else {
        None
    };

    let success = match cli.command {
        Commands::ExtractFrames { input, out, format } => {
            let format: StillFormat = format.parse()?;
            let options =
                build_options(&cli.global, out, progress.as_ref()).with_still_format(format);
            let report = video_tool::extract_frames(&input, &options);
            finish_progress(progress.as_deref());
            let report = report?;
            emit_batch_report(&report, cli.global.json)?;
            report.is_success()
        }
        Commands::Convert { input, out } => {
            let options = build_options(&cli.global, out, progress.as_ref());
            let report = video_tool::convert_to_mp4(&input, &options);
            finish_progress(progress.as_deref());
            let report = report?;
            emit_batch_report(&report, cli.global.json)?;
            report.is_success()
        }
        Commands::Merge { input, out } => {
            let options = build_options(&cli.global, out, progress.as_ref());
            let report = video_tool::merge_videos(&input, &options);
            finish_progress(progress.as_deref());
            let report = report?;
            if cli.global.json {
                println!("{}", serde_json::to_string_pretty(&merge_report_json(&report))?);
            } else {
                print_merge_report(&report);
            }
            report.is_success()
        }
        Commands::Probe { input } => {
            let handle = VideoHandle::open(probe_target(&input)?)?;
            let info = handle.info();
            if cli.global.json {
                let payload = json!({
                    "path": info.path.display().to_string(),
                    "width": info.width,
                    "height": info.height,
                    "fps": info.frames_per_second,
                    "frame_count": info.frame_count,
                    "codec": info.codec,
                    "sampling_stride": video_tool::sampling_stride(info.frames_per_second),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("File: {}", info.path.display());
                println!(
                    "Video: {}x{} @ {:.2} fps [{}]",
                    info.width, info.height, info.frames_per_second, info.codec,
                );
                println!("Frames: ~{}", info.frame_count);
            }
            true
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "video-tool", &mut std::io::stdout());
            true
        }
    };

    Ok(success)
}

fn finish_progress(progress: Option<&TerminalProgress>) {
    if let Some(progress) = progress {
        progress.finish();
    }
}

fn emit_batch_report(report: &BatchReport, as_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(&batch_report_json(report))?);
    } else {
        print_batch_report(report);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.global);

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;
    use video_tool::{BatchReport, FileFailure, OperationType, VideoToolError};

    use super::{Cli, Commands, batch_report_json, default_log_filter, probe_target};

    #[test]
    fn legacy_command_names_still_parse() {
        let cli = Cli::try_parse_from(["video-tool", "getframe", "clip.avi"]).unwrap();
        assert!(matches!(cli.command, Commands::ExtractFrames { .. }));

        let cli = Cli::try_parse_from(["video-tool", "getmp4", "clips"]).unwrap();
        assert!(matches!(cli.command, Commands::Convert { .. }));

        let cli = Cli::try_parse_from(["video-tool", "mergevideo", "trip"]).unwrap();
        assert!(matches!(cli.command, Commands::Merge { .. }));
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "video-tool",
            "extract-frames",
            "clips",
            "--out",
            "frames",
            "--format",
            "jpg",
            "--json",
            "--verbose",
        ])
        .unwrap();
        assert!(cli.global.json);
        assert!(cli.global.verbose);
        match cli.command {
            Commands::ExtractFrames { out, format, .. } => {
                assert_eq!(out, Some(PathBuf::from("frames")));
                assert_eq!(format, "jpg");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn report_json_lists_failures() {
        let mut report = BatchReport {
            operation: OperationType::FrameExtraction,
            input: PathBuf::from("clips"),
            completed: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
        };
        report.failures.push(FileFailure {
            path: PathBuf::from("clips/bad.avi"),
            error: VideoToolError::NoReadableFrames {
                path: PathBuf::from("clips/bad.avi"),
            },
        });

        let value = batch_report_json(&report);
        assert_eq!(value["operation"], "extract-frames");
        assert_eq!(value["succeeded"], 0);
        assert_eq!(value["failures"][0]["source"], "clips/bad.avi");
    }

    #[test]
    fn progress_bar_quiets_info_logging() {
        let cli = Cli::try_parse_from(["video-tool", "convert", "clips"]).unwrap();
        assert_eq!(default_log_filter(&cli.global), "info");

        let cli = Cli::try_parse_from(["video-tool", "convert", "clips", "--verbose"]).unwrap();
        assert_eq!(default_log_filter(&cli.global), "debug");

        let cli =
            Cli::try_parse_from(["video-tool", "convert", "clips", "--progress", "--verbose"])
                .unwrap();
        assert_eq!(default_log_filter(&cli.global), "warn");
    }

    #[test]
    fn info_command_resolves_its_input() {
        let dir = tempfile::tempdir().unwrap();

        let error = probe_target(&dir.path().join("missing.mkv")).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<VideoToolError>(),
            Some(VideoToolError::InputNotFound { .. })
        ));

        let gif = dir.path().join("animation.gif");
        std::fs::write(&gif, b"GIF89a").unwrap();
        let error = probe_target(&gif).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<VideoToolError>(),
            Some(VideoToolError::UnsupportedFormat { .. })
        ));

        let clip = dir.path().join("clip.mkv");
        std::fs::write(&clip, b"").unwrap();
        assert_eq!(probe_target(&clip).unwrap(), clip);
        assert!(probe_target(dir.path()).is_err());
    }
}
