//! CLI command definitions, routing, and tracing setup.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use asrskit_classify::{
    ClassificationJob, JobOptions, JobProgress, OpenAiClient, TokenCounter, cost_of, estimate_cost,
    find_narrative_field, load_records, narrative_text, resolve_range,
};
use asrskit_extract::{default_output_path, extract_file, write_records};
use asrskit_shared::{AppConfig, init_config, load_config, load_config_from, resolve_api_key};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// asrskit — structured records and HFACS classifications from ASRS exports.
#[derive(Parser)]
#[command(
    name = "asrskit",
    version,
    about = "Extract ASRS incident reports to JSON and classify their narratives with HFACS.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file to use instead of ~/.asrskit/asrskit.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Extract records from a printable HTML export into a JSON file.
    Extract {
        /// HTML export to read.
        input: PathBuf,

        /// JSON file to write (defaults to the input path with a .json extension).
        output: Option<PathBuf>,
    },

    /// Classify record narratives with HFACS, merging results into OUTPUT.
    Classify {
        /// JSON records produced by `extract`.
        input: PathBuf,

        /// JSON file to create or update with classifications.
        output: PathBuf,

        /// Section holding the narrative (auto-detected when omitted).
        #[arg(long)]
        field: Option<String>,

        /// First record index to process (0-based).
        #[arg(long, default_value_t = 0)]
        start: usize,

        /// Record index to stop at (exclusive). Processes all when omitted.
        #[arg(long)]
        end: Option<usize>,

        /// Print the cost estimate and exit without calling the service.
        #[arg(long)]
        estimate_only: bool,

        /// Skip the confirmation prompt before paid calls.
        #[arg(short, long)]
        yes: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "asrskit=info",
        1 => "asrskit=debug",
        _ => "asrskit=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Extract { input, output } => cmd_extract(config_path, &input, output.as_deref()),
        Command::Classify {
            input,
            output,
            field,
            start,
            end,
            estimate_only,
            yes,
        } => {
            let args = ClassifyArgs {
                input,
                output,
                field,
                start,
                end,
                estimate_only,
                yes,
            };
            cmd_classify(config_path, args).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Load the config from `--config` when given, else from the default location.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// extract
// ---------------------------------------------------------------------------

fn cmd_extract(config_path: Option<&Path>, input: &Path, output: Option<&Path>) -> Result<()> {
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input));

    if output == input {
        return Err(eyre!(
            "output path '{}' would overwrite the input; pass an explicit output path",
            output.display()
        ));
    }

    let config = resolve_config(config_path)?;
    info!(input = %input.display(), output = %output.display(), "extracting records");

    let records = extract_file(input, &config.markers)?;
    write_records(&output, &records)?;

    println!("Wrote {} record(s) to {}", records.len(), output.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

struct ClassifyArgs {
    input: PathBuf,
    output: PathBuf,
    field: Option<String>,
    start: usize,
    end: Option<usize>,
    estimate_only: bool,
    yes: bool,
}

async fn cmd_classify(config_path: Option<&Path>, args: ClassifyArgs) -> Result<()> {
    let config = resolve_config(config_path)?;
    let input = load_records(&args.input)?;

    let field = match args.field {
        Some(field) => field,
        None => find_narrative_field(&input[0]).ok_or_else(|| {
            eyre!("could not determine the narrative field automatically; pass it with --field")
        })?,
    };
    info!(field = %field, "using narrative field");

    let range = resolve_range(input.len(), args.start, args.end)?;
    println!(
        "Will process {} incident(s) (index {} to {}).",
        range.len(),
        range.start,
        range.end - 1
    );

    let narratives: Vec<String> = input[range.clone()]
        .iter()
        .map(|record| narrative_text(record, &field))
        .collect();
    let counter = TokenCounter::for_model(&config.classifier.model)?;
    let estimate = estimate_cost(
        narratives.iter().map(String::as_str),
        &counter,
        &config.pricing,
    );

    println!();
    println!("  Cost estimate ({} service call(s))", estimate.calls);
    println!("  Input tokens:  ~{}", estimate.input_tokens);
    println!(
        "  Output tokens: ~{} (avg {} per call, incl. reasoning)",
        estimate.output_tokens, config.pricing.avg_output_tokens
    );
    println!("  Total cost:    ~${:.4}", estimate.total_cost);
    println!();

    if args.estimate_only {
        println!("Exiting after cost estimation (--estimate-only).");
        return Ok(());
    }

    let api_key = resolve_api_key(&config)?;

    if !args.yes && !confirm("Do you want to proceed with processing? (yes/no): ")? {
        println!("Processing aborted.");
        return Ok(());
    }

    let client = OpenAiClient::new(&config.classifier, api_key)?;
    let options = JobOptions {
        narrative_field: field,
        start: range.start,
        end: Some(range.end),
        checkpoint_every: config.classifier.checkpoint_every,
        request_delay: Duration::from_millis(config.classifier.request_delay_ms),
    };

    info!(model = client.model(), output = %args.output.display(), "starting classification");

    let started = Instant::now();
    let progress = CliProgress::new();
    let job = ClassificationJob::new(&client, options, &args.output);
    let result = job.run(&input, &progress).await;
    progress.finish();
    let report = result?;

    let actual_cost = cost_of(report.input_tokens, report.output_tokens, &config.pricing);

    println!();
    println!("  Classification complete!");
    println!("  Processed:  {}", report.processed);
    println!("  Classified: {}", report.classified);
    println!("  Empty:      {}", report.empty);
    println!("  Errors:     {}", report.errors);
    println!("  Skipped:    {}", report.skipped);
    println!(
        "  Tokens:     {} in / {} out",
        report.input_tokens, report.output_tokens
    );
    println!("  Cost:       ${actual_cost:.4}");
    println!("  Output:     {}", args.output.display());
    println!("  Time:       {:.1}s", started.elapsed().as_secs_f64());
    println!();

    Ok(())
}

/// Ask a yes/no question on stdin; only a literal `yes` proceeds.
fn confirm(question: &str) -> Result<bool> {
    print!("{question}");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl JobProgress for CliProgress {
    fn started(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn record_done(&self, id: &str, current: usize, _total: usize) {
        self.bar.set_position(current as u64);
        self.bar.set_message(format!("ACN {id}"));
    }

    fn checkpoint(&self, records: usize) {
        self.bar.println(format!("  checkpoint saved ({records} records)"));
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
