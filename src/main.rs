use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use clipsmith::io::format_timestamp;
use clipsmith::{
    execute_render, load_side_channels, parse_proposals_file, parse_transcript_file,
    AnthropicClient, AnthropicConfig, ClipEngine, EngineConfig, EngineOutput, SideChannels,
};

#[derive(Parser)]
#[command(name = "clipsmith")]
#[command(author, version, about = "Pick non-overlapping highlight clips from a time-coded transcript", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the model for moments in every window and select clips
    Run {
        #[command(flatten)]
        inputs: InputArgs,

        #[command(flatten)]
        overrides: ConfigOverrides,

        #[command(flatten)]
        outputs: OutputArgs,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Select clips from a proposals file without calling the model
    Select {
        #[command(flatten)]
        inputs: InputArgs,

        /// Proposals JSON (array of {start, end, rating, reason, quote})
        #[arg(short, long)]
        proposals: PathBuf,

        #[command(flatten)]
        overrides: ConfigOverrides,

        #[command(flatten)]
        outputs: OutputArgs,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print transcript statistics and the window plan
    Analyze {
        /// Transcript file (`[start -> end] text` lines or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Transcript file (`[start -> end] text` lines or JSON)
    #[arg(short, long)]
    input: PathBuf,

    /// Silence intervals (JSON)
    #[arg(long)]
    silences: Option<PathBuf>,

    /// Dialog spans (JSON)
    #[arg(long)]
    dialog: Option<PathBuf>,

    /// Word timestamps (JSON)
    #[arg(long)]
    words: Option<PathBuf>,
}

#[derive(Args)]
struct OutputArgs {
    /// Output file for the selected clips (JSON)
    #[arg(short, long)]
    output: PathBuf,

    /// Output file for a human-readable report (text)
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args)]
struct ConfigOverrides {
    /// Engine configuration file (JSON); flags below take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Shortest clip in seconds
    #[arg(long)]
    min_duration: Option<f64>,

    /// Longest clip in seconds
    #[arg(long)]
    max_duration: Option<f64>,

    /// Minimum proposal rating (0-10)
    #[arg(long)]
    min_rating: Option<f64>,

    /// Minimum gap between selected clips in seconds
    #[arg(long)]
    min_gap: Option<f64>,

    /// Return every refined candidate without non-overlap selection
    #[arg(long)]
    no_enforce_non_overlap: bool,

    /// Target tone or theme for verification
    #[arg(long)]
    tone: Option<String>,

    /// Concurrent model calls
    #[arg(long)]
    concurrency: Option<usize>,
}

impl ConfigOverrides {
    fn load(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_file(path)?,
            None => EngineConfig::default(),
        };

        let constraints = &mut config.constraints;
        if let Some(v) = self.min_duration {
            constraints.min_duration_seconds = v;
        }
        if let Some(v) = self.max_duration {
            constraints.max_duration_seconds = v;
        }
        if let Some(v) = self.min_rating {
            constraints.default_min_rating = v;
        }
        if let Some(v) = self.min_gap {
            constraints.min_gap = v;
        }
        if self.no_enforce_non_overlap {
            constraints.enforce_non_overlap = false;
        }
        if let Some(tone) = &self.tone {
            config.tone.tone = Some(tone.clone());
        }
        if let Some(n) = self.concurrency {
            config.proposals.concurrency = n;
            config.tone.concurrency = n;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            inputs,
            overrides,
            outputs,
            verbose,
        } => {
            setup_logging(verbose);
            run_pipeline(inputs, overrides, outputs).await
        }
        Commands::Select {
            inputs,
            proposals,
            overrides,
            outputs,
            verbose,
        } => {
            setup_logging(verbose);
            select_offline(inputs, proposals, overrides, outputs).await
        }
        Commands::Analyze {
            input,
            config,
            verbose,
        } => {
            setup_logging(verbose);
            analyze_transcript(input, config)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn build_engine(inputs: &InputArgs, overrides: &ConfigOverrides) -> Result<ClipEngine> {
    let config = overrides.load()?;

    info!("Loading transcript from {:?}", inputs.input);
    let transcript =
        parse_transcript_file(&inputs.input).context("Failed to parse input transcript")?;
    if transcript.is_empty() {
        anyhow::bail!("Transcript {:?} has no usable segments", inputs.input);
    }

    let sides = load_side_channels(
        inputs.silences.as_deref(),
        inputs.dialog.as_deref(),
        inputs.words.as_deref(),
    )
    .context("Failed to load side-channels")?;

    info!(
        "Loaded {} segments over {:.1}s ({} silences, {} dialog spans, {} words)",
        transcript.len(),
        transcript.duration(),
        sides.silences.len(),
        sides.dialog.len(),
        sides.words.len()
    );

    Ok(ClipEngine::new(config, transcript, sides)?)
}

async fn run_pipeline(inputs: InputArgs, overrides: ConfigOverrides, outputs: OutputArgs) -> Result<()> {
    let engine = build_engine(&inputs, &overrides)?;

    let api_config = AnthropicConfig::from_env()?;
    let client = AnthropicClient::new(api_config);

    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing with the proposals collected so far");
            watcher.cancel();
        }
    });

    let output = engine.run(&client, Some(&client), &cancel).await;
    write_outputs(&output, &outputs)
}

async fn select_offline(
    inputs: InputArgs,
    proposals: PathBuf,
    overrides: ConfigOverrides,
    outputs: OutputArgs,
) -> Result<()> {
    let engine = build_engine(&inputs, &overrides)?;

    info!("Loading proposals from {:?}", proposals);
    let raw = parse_proposals_file(
        &proposals,
        engine.transcript(),
        engine.config().constraints.default_min_rating,
    )
    .context("Failed to parse proposals")?;

    // Tone verification still needs the model
    let client = if engine.config().tone.tone.is_some() {
        Some(AnthropicClient::new(AnthropicConfig::from_env()?))
    } else {
        None
    };

    let output = engine.run_offline(raw, client.as_ref()).await;
    write_outputs(&output, &outputs)
}

fn write_outputs(output: &EngineOutput, outputs: &OutputArgs) -> Result<()> {
    let rendered = execute_render(
        &output.candidates,
        &output.metadata,
        Some(&outputs.output),
        outputs.report.as_deref(),
    )?;

    info!("Output written to {:?}", rendered.clips_path);
    if let Some(report_path) = rendered.report_path {
        info!("Report written to {:?}", report_path);
    }

    let total: f64 = output.candidates.iter().map(|c| c.duration()).sum();
    info!(
        "Complete: {} clips, {:.1}s total (run {})",
        output.candidates.len(),
        total,
        output.metadata.run_id
    );

    Ok(())
}

fn analyze_transcript(input: PathBuf, config: Option<PathBuf>) -> Result<()> {
    info!("Analyzing transcript from {:?}", input);
    let config = match config.as_deref() {
        Some(path) => load_config_file(path)?,
        None => EngineConfig::default(),
    };
    let transcript = parse_transcript_file(&input).context("Failed to parse input transcript")?;
    let engine = ClipEngine::new(config, transcript, SideChannels::default())?;
    let transcript = engine.transcript();

    println!("Transcript Analysis");
    println!("===================");
    println!("Segments: {}", transcript.len());
    println!("Words: {}", transcript.word_count());
    match transcript.time_range() {
        Some((start, end)) => println!(
            "Span: {} - {} ({:.1}s)",
            format_timestamp(start),
            format_timestamp(end),
            end - start
        ),
        None => println!("Span: empty"),
    }
    if !transcript.is_empty() {
        let mean = transcript.segments.iter().map(|s| s.duration()).sum::<f64>()
            / transcript.len() as f64;
        let continued = transcript
            .segments
            .iter()
            .filter(|s| s.starts_lowercase())
            .count();
        println!("Mean segment: {:.2}s", mean);
        println!("Segments continuing a sentence: {}", continued);
    }
    println!();

    let constraints = &engine.config().constraints;
    println!("Constraints");
    println!("-----------");
    println!(
        "Duration: {:.0}-{:.0}s (sweet spot {:.0}-{:.0}s)",
        constraints.min_duration_seconds,
        constraints.max_duration_seconds,
        constraints.sweet_spot_min_seconds,
        constraints.sweet_spot_max_seconds
    );
    println!(
        "Min rating: {:.1}, min gap: {:.1}s, merge gap: {:.1}s",
        constraints.default_min_rating, constraints.min_gap, constraints.merge_gap_seconds
    );
    println!();

    let windows = engine.windows();
    println!("Windows");
    println!("-------");
    println!("Total windows: {}", windows.total_windows());
    for window in windows.iter() {
        println!(
            "{}: {} - {} | {} segments, {} + {} context",
            window.window_id,
            format_timestamp(window.start),
            format_timestamp(window.end),
            window.segment_count(),
            window.context_prefix_indices.len(),
            window.context_suffix_indices.len()
        );
    }

    Ok(())
}

fn load_config_file(path: &Path) -> Result<EngineConfig> {
    EngineConfig::from_file(path).with_context(|| format!("Failed to load config from {:?}", path))
}
