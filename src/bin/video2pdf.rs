use std::{
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
    time::Duration,
};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Value, json};
use video2pdf::{
    Artifact, NormalizationReport, Pipeline, PipelineConfig, PipelineFailure, PlanPreview,
    ProgressCallback, ProgressInfo, RawParameters, ToolPaths,
};

const CLI_AFTER_HELP: &str = "Examples:\n  video2pdf convert 'https://www.youtube.com/watch?v=abc' --mode scene --scene 0.15\n  video2pdf convert 'https://www.youtube.com/watch?v=abc' --mode fps --fps 1 --start 60 --end 180 --progress\n  video2pdf plan 'https://www.youtube.com/watch?v=abc' --mode fps --fps 2 --json\n  video2pdf completions zsh > _video2pdf";

#[derive(Debug, Parser)]
#[command(
    name = "video2pdf",
    version,
    about = "Turn a video URL into a PDF of sampled frames",
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
    #[arg(long)]
    verbose: bool,

    /// Show a spinner while the run is in progress.
    #[arg(long)]
    progress: bool,

    /// Directory holding run directories and the run lock.
    #[arg(long, env = "VIDEO2PDF_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Directory with bundled yt-dlp/ffmpeg binaries, preferred over PATH.
    #[arg(long, env = "VIDEO2PDF_TOOLS_DIR")]
    tools_dir: Option<PathBuf>,

    /// Explicit path to yt-dlp.
    #[arg(long, env = "VIDEO2PDF_YT_DLP")]
    yt_dlp: Option<PathBuf>,

    /// Explicit path to ffmpeg.
    #[arg(long, env = "VIDEO2PDF_FFMPEG")]
    ffmpeg: Option<PathBuf>,

    /// Base URL under which run directories are served.
    #[arg(long, env = "VIDEO2PDF_PUBLIC_URL")]
    public_url: Option<String>,
}

/// Sampling parameters. Numbers are taken as text and clamped by the library.
#[derive(Debug, Args, Clone)]
struct SamplingOptions {
    /// Video URL.
    url: String,

    /// Sampling mode: scene | fps.
    #[arg(long)]
    mode: Option<String>,

    /// Frames per second in fps mode (0 falls back to scene detection).
    #[arg(long)]
    fps: Option<String>,

    /// Scene-change threshold in scene mode (0.01 to 1.0).
    #[arg(long)]
    scene: Option<String>,

    /// Frame width in pixels (at least 200).
    #[arg(long)]
    width: Option<String>,

    /// Maximum number of pages (at least 1).
    #[arg(long)]
    max_pages: Option<String>,

    /// Start of the time window in seconds.
    #[arg(long)]
    start: Option<String>,

    /// End of the time window in seconds (0 means the end of the video).
    #[arg(long)]
    end: Option<String>,
}

impl SamplingOptions {
    fn raw_parameters(&self) -> RawParameters {
        RawParameters {
            source_url: Some(self.url.clone()),
            mode: self.mode.clone(),
            fps: self.fps.clone(),
            scene_threshold: self.scene.clone(),
            width: self.width.clone(),
            max_pages: self.max_pages.clone(),
            start_time: self.start.clone(),
            end_time: self.end.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download a video and convert sampled frames to a PDF.
    #[command(
        about = "Convert a video to a PDF",
        after_help = "Examples:\n  video2pdf convert URL\n  video2pdf convert URL --mode fps --fps 1 --max-pages 50 --json"
    )]
    Convert {
        #[command(flatten)]
        sampling: SamplingOptions,

        /// Output the artifact or failure as machine-readable JSON.
        #[arg(long)]
        json: bool,

        /// Document title.
        #[arg(long)]
        title: Option<String>,

        /// Delete the video and frames after a successful run.
        #[arg(long)]
        cleanup: bool,

        /// Download time limit in seconds (0 disables it).
        #[arg(long)]
        fetch_timeout: Option<u64>,

        /// Decoding time limit in seconds (0 disables it).
        #[arg(long)]
        decode_timeout: Option<u64>,
    },

    /// Show the normalized parameters and decoder command without running.
    #[command(about = "Preview the sampling plan")]
    Plan {
        #[command(flatten)]
        sampling: SamplingOptions,

        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn base_config(global: &GlobalOptions) -> PipelineConfig {
    let mut tools = ToolPaths::resolve(global.tools_dir.as_deref());
    if let Some(path) = &global.yt_dlp {
        tools = tools.with_fetcher(path);
    }
    if let Some(path) = &global.ffmpeg {
        tools = tools.with_decoder(path);
    }

    let mut config = PipelineConfig::new().with_tools(tools);
    if let Some(root) = &global.workspace {
        config = config.with_workspace_root(root);
    }
    if let Some(url) = &global.public_url {
        config = config.with_public_base_url(url);
    }
    config
}

/// `0` disables the limit.
fn timeout_from_seconds(seconds: u64) -> Option<Duration> {
    (seconds > 0).then(|| Duration::from_secs(seconds))
}

struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed}] {msg}")?);
        bar.enable_steady_tick(Duration::from_millis(120));
        Ok(Self { bar })
    }
}

impl ProgressCallback for SpinnerProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let message = match &info.detail {
            Some(detail) => format!("{}: {detail}", info.state),
            None => info.state.to_string(),
        };
        if info.state.is_terminal() {
            self.bar.finish_and_clear();
        } else {
            self.bar.set_message(message);
        }
    }
}

fn print_report(report: &NormalizationReport) {
    for warning in &report.warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning.yellow());
    }
}

fn artifact_json(artifact: &Artifact) -> Value {
    json!({
        "status": "ok",
        "run_id": artifact.run_id,
        "run_directory": artifact.run_directory.display().to_string(),
        "document_path": artifact.document_path.display().to_string(),
        "url": artifact.url,
        "page_count": artifact.page_count,
        "frames_extracted": artifact.frames_extracted,
        "truncated": artifact.truncated,
        "warnings": artifact.normalization.warnings,
    })
}

fn failure_json(failure: &PipelineFailure) -> Value {
    json!({
        "status": "failed",
        "stage": failure.stage().as_str(),
        "message": failure.message(),
        "command": failure.command(),
        "output": failure.raw_output(),
        "hint": failure.hint(),
    })
}

fn plan_json(preview: &PlanPreview) -> Value {
    json!({
        "source_url": preview.request.source_url(),
        "mode": preview.request.mode().as_str(),
        "effective_mode": preview.directive.effective_mode.as_str(),
        "filter_expression": preview.directive.filter_expression,
        "seek_seconds": preview.directive.seek_seconds,
        "duration_seconds": preview.directive.duration_seconds,
        "max_pages": preview.request.max_pages(),
        "command": preview.decoder_command.render(),
        "info": preview.normalization.info,
        "warnings": preview.normalization.warnings,
    })
}

fn print_failure(failure: &PipelineFailure) {
    eprintln!(
        "{} {} stage failed",
        "error:".red().bold(),
        failure.stage().as_str().bold()
    );
    eprintln!("  {}", failure.message());
    if let Some(command) = failure.command() {
        eprintln!("{}\n  {command}", "command:".bold());
    }
    if let Some(output) = failure.raw_output().filter(|output| !output.trim().is_empty()) {
        eprintln!("{}", "output:".bold());
        for line in output.lines() {
            eprintln!("  {line}");
        }
    }
    if let Some(hint) = failure.hint() {
        eprintln!("{} {hint}", "hint:".cyan().bold());
    }
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match cli.command {
        Commands::Convert {
            sampling,
            json,
            title,
            cleanup,
            fetch_timeout,
            decode_timeout,
        } => {
            let mut config = base_config(&cli.global).with_cleanup_intermediates(cleanup);
            if let Some(title) = title {
                config = config.with_document_title(title);
            }
            if let Some(seconds) = fetch_timeout {
                config = config.with_fetch_timeout(timeout_from_seconds(seconds));
            }
            if let Some(seconds) = decode_timeout {
                config = config.with_decode_timeout(timeout_from_seconds(seconds));
            }
            if cli.global.progress {
                config = config.with_progress(Arc::new(SpinnerProgress::new()?));
            }

            let pipeline = Pipeline::with_default_tools(config);
            match pipeline.run(&sampling.raw_parameters()) {
                Ok(artifact) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&artifact_json(&artifact))?);
                    } else {
                        print_report(&artifact.normalization);
                        if artifact.truncated {
                            eprintln!(
                                "{} kept the first {} of {} frames",
                                "warning:".yellow().bold(),
                                artifact.page_count,
                                artifact.frames_extracted
                            );
                        }
                        println!(
                            "{} {} ({} pages)",
                            "saved".green().bold(),
                            artifact.document_path.display(),
                            artifact.page_count
                        );
                        if let Some(url) = &artifact.url {
                            println!("{} {url}", "url".green().bold());
                        }
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(failure) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&failure_json(&failure))?);
                    } else {
                        print_failure(&failure);
                    }
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Plan { sampling, json } => {
            let pipeline = Pipeline::with_default_tools(base_config(&cli.global));
            let preview = pipeline.plan_only(&sampling.raw_parameters())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan_json(&preview))?);
            } else {
                print!("{}", preview.normalization);
                println!(
                    "Mode: {} (effective: {})",
                    preview.request.mode(),
                    preview.directive.effective_mode
                );
                println!("Filter: {}", preview.directive.filter_expression);
                println!(
                    "Window: seek {}s, duration {}",
                    preview.directive.seek_seconds,
                    if preview.directive.is_bounded() {
                        format!("{}s", preview.directive.duration_seconds)
                    } else {
                        "to end".to_string()
                    }
                );
                println!("Max pages: {}", preview.request.max_pages());
                println!("Command: {}", preview.decoder_command.render());
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "video2pdf", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
