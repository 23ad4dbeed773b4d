use std::{
    path::PathBuf,
    sync::{Arc, OnceLock},
};

use clap::{CommandFactory, Parser, ValueEnum};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

use scenebook::{
    ContentSceneExtractor, FfmpegLogLevel, ImagePdfGenerator, KeyframeSceneExtractor,
    ProgressCallback, ProgressInfo, SceneExtractor, Summarizer, SummaryOutcome,
    default_output_path, set_ffmpeg_log_level,
};

const CLI_AFTER_HELP: &str = "Examples:\n  scenebook -i lecture.mp4\n  scenebook -i lecture.mp4 -o summary.pdf -t 20 --progress\n  scenebook -i long_recording.mkv --detector keyframes\n  scenebook --completions zsh > _scenebook";

#[derive(Debug, Parser)]
#[command(
    name = "scenebook",
    version,
    about = "Detect scene changes in a video and assemble one frame per scene into a PDF",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Source video file.
    #[arg(short, long, required_unless_present = "completions")]
    input: Option<PathBuf>,

    /// Output PDF file path. Defaults to <input-stem>_summary.pdf beside the
    /// input file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Scene-change sensitivity; lower values detect more cuts.
    #[arg(short, long, default_value_t = scenebook::DEFAULT_THRESHOLD)]
    threshold: f64,

    /// Scene detection strategy.
    #[arg(long, value_enum, default_value_t = Detector::Content)]
    detector: Detector,

    /// Allow overwriting an existing output file.
    #[arg(long)]
    overwrite: bool,

    /// Show a progress bar while frames are captured.
    #[arg(long)]
    progress: bool,

    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// Print the result summary as machine-readable JSON.
    #[arg(long)]
    json: bool,

    /// FFmpeg console log level (quiet, fatal, error, warning, info, verbose, debug).
    #[arg(long)]
    ffmpeg_log_level: Option<String>,

    /// Generate shell completion scripts and exit.
    #[arg(long, value_enum)]
    completions: Option<Shell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Detector {
    /// Full decode through FFmpeg's scdet filter (content-aware).
    Content,
    /// Packet-level keyframe boundaries (fast, approximate).
    Keyframes,
}

fn parse_ffmpeg_log_level(value: &str) -> Option<FfmpegLogLevel> {
    match value.to_ascii_lowercase().as_str() {
        "quiet" => Some(FfmpegLogLevel::Quiet),
        "fatal" => Some(FfmpegLogLevel::Fatal),
        "error" => Some(FfmpegLogLevel::Error),
        "warning" | "warn" => Some(FfmpegLogLevel::Warning),
        "info" => Some(FfmpegLogLevel::Info),
        "verbose" => Some(FfmpegLogLevel::Verbose),
        "debug" => Some(FfmpegLogLevel::Debug),
        _ => None,
    }
}

/// Renders an indicatif bar from extraction progress callbacks.
///
/// The bar is created lazily on the first callback that carries a total, so
/// nothing is drawn during scene detection (where the total is unknown).
struct TerminalProgress {
    bar: OnceLock<ProgressBar>,
}

impl TerminalProgress {
    fn new() -> Self {
        Self {
            bar: OnceLock::new(),
        }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let Some(total) = info.total else {
            return;
        };

        let bar = self.bar.get_or_init(|| {
            let bar = ProgressBar::new(total);
            if let Ok(style) =
                ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")
            {
                bar.set_style(style.progress_chars("##-"));
            }
            bar.set_message("capturing frames");
            bar
        });
        bar.set_position(info.current);
        if info.current >= total {
            bar.finish_with_message("done");
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "scenebook", &mut std::io::stdout());
        return Ok(());
    }

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .default_filter_or(if cli.verbose { "debug" } else { "warn" }),
    )
    .init();

    if let Some(level) = &cli.ffmpeg_log_level {
        let parsed = parse_ffmpeg_log_level(level)
            .ok_or(format!("unsupported --ffmpeg-log-level: {level}"))?;
        set_ffmpeg_log_level(parsed);
    }

    // required_unless_present guarantees input is set past this point.
    let input = cli.input.ok_or("missing --input")?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&input));

    if output.exists() && !cli.overwrite {
        return Err(format!(
            "output already exists: {} (use --overwrite to replace)",
            output.display()
        )
        .into());
    }

    let progress: Option<Arc<dyn ProgressCallback>> = cli
        .progress
        .then(|| Arc::new(TerminalProgress::new()) as Arc<dyn ProgressCallback>);

    let outcome = match cli.detector {
        Detector::Content => {
            let mut extractor = ContentSceneExtractor::new().threshold(cli.threshold);
            if let Some(callback) = progress {
                extractor = extractor.with_progress(callback);
            }
            summarize(extractor, &input, &output)?
        }
        Detector::Keyframes => {
            let mut extractor = KeyframeSceneExtractor::new();
            if let Some(callback) = progress {
                extractor = extractor.with_progress(callback);
            }
            summarize(extractor, &input, &output)?
        }
    };

    match outcome {
        SummaryOutcome::NoScenes => {
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "input": input,
                        "output": serde_json::Value::Null,
                        "pages": 0,
                    }))?
                );
            } else {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    "no scene transitions detected; no PDF written".yellow()
                );
            }
        }
        SummaryOutcome::Written { output, pages } => {
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "input": input,
                        "output": output,
                        "pages": pages,
                    }))?
                );
            } else {
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!("{pages} page(s) -> {}", output.display()).green()
                );
            }
        }
    }

    Ok(())
}

fn summarize<E: SceneExtractor>(
    extractor: E,
    input: &std::path::Path,
    output: &std::path::Path,
) -> Result<SummaryOutcome, scenebook::ScenebookError> {
    Summarizer::new(extractor, ImagePdfGenerator::new()).run(input, output)
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, parse_ffmpeg_log_level};
    use clap::Parser;

    #[test]
    fn threshold_defaults_to_27() {
        let cli = Cli::parse_from(["scenebook", "-i", "a.mp4"]);
        assert_eq!(cli.threshold, 27.0);
    }

    #[test]
    fn input_is_required_without_completions() {
        assert!(Cli::try_parse_from(["scenebook"]).is_err());
        assert!(Cli::try_parse_from(["scenebook", "--completions", "zsh"]).is_ok());
    }

    #[test]
    fn ffmpeg_log_level_aliases() {
        assert!(parse_ffmpeg_log_level("quiet").is_some());
        assert!(parse_ffmpeg_log_level("WARN").is_some());
        assert!(parse_ffmpeg_log_level("trace").is_none());
    }
}
