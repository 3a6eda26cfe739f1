use asset_press::imaging::RustBackend;
use asset_press::tasks::{Pipeline, Task, TaskEvent, TaskReport};
use asset_press::{config, output, tasks};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "asset-press")]
#[command(about = "Minify and recompress the assets of a built static site in place")]
#[command(long_about = "\
Minify and recompress the assets of a built static site in place

Every task rewrites files inside the public directory:

  js        minify **/*.js (skips *.min.js, *-min.js)
  css       minify **/*.css (skips *.min.css, *-min.css)
  html      minify **/*.html
  images    shrink JPEG/PNG to fit 1920x1080, then recompress (alias: jpg|png)
  vectors   re-encode GIF, rewrite SVG (alias: gif|svg)
  default   run the configured default tasks (images, vectors) concurrently

Files this tool already processed are recorded in public/.asset-press-cache.json
and skipped on the next run. Use --no-cache to process everything again.

Run 'asset-press gen-config' to generate a documented asset-press.toml.")]
#[command(version)]
struct Cli {
    /// Public directory to process (overrides `public_dir` from the config)
    #[arg(long, global = true)]
    public: Option<PathBuf>,

    /// Config file [default: ./asset-press.toml if present]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ignore the ledger of processed files and process everything again
    #[arg(long, global = true)]
    no_cache: bool,

    /// More diagnostics on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Minify JavaScript files
    Js,
    /// Minify stylesheets
    Css,
    /// Minify HTML documents
    Html,
    /// Rescale and recompress JPEG and PNG images
    #[command(alias = "jpg|png")]
    Images,
    /// Optimize GIF and SVG images
    #[command(alias = "gif|svg")]
    Vectors,
    /// Run the configured default tasks concurrently
    Default,
    /// List the files each task would process, without writing anything
    Check,
    /// Print a stock asset-press.toml with all options documented
    GenConfig,
}

impl Command {
    fn task(&self) -> Option<Task> {
        match self {
            Command::Js => Some(Task::Js),
            Command::Css => Some(Task::Css),
            Command::Html => Some(Task::Html),
            Command::Images => Some(Task::Images),
            Command::Vectors => Some(Task::Vectors),
            Command::Default | Command::Check | Command::GenConfig => None,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(cli.config.as_deref())?;
    let public_dir = cli
        .public
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.public_dir));

    if let Command::Check = cli.command {
        let mut selection = Vec::new();
        for task in Task::ALL {
            selection.push((task, tasks::select(&config, &public_dir, task)?));
        }
        output::print_check_output(&selection);
        return Ok(());
    }

    let task_list = match cli.command.task() {
        Some(task) => vec![task],
        None => config.default_tasks.clone(),
    };

    init_thread_pool(&config.processing);
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_task_event(&event) {
                println!("{}", line);
            }
        }
    });

    let results = run_tasks(&config, &public_dir, !cli.no_cache, &task_list, tx);
    printer.join().ok();

    let mut first_error = None;
    for result in results {
        match result {
            Ok(report) => output::print_task_report(&report),
            // The first error becomes the exit status, later ones are only logged
            Err(e) if first_error.is_some() => tracing::error!("{e}"),
            Err(e) => first_error = Some(e),
        }
    }
    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Run the tasks; the pipeline (and with it the event sender) is dropped on return.
fn run_tasks(
    config: &config::AssetConfig,
    public_dir: &std::path::Path,
    use_cache: bool,
    task_list: &[Task],
    events: Sender<TaskEvent>,
) -> Vec<Result<TaskReport, tasks::TaskError>> {
    let backend = RustBackend::new();
    let pipeline = Pipeline::new(&backend, config, public_dir, use_cache).with_events(events);
    match task_list {
        [task] => vec![pipeline.run(*task)],
        _ => pipeline.run_all(task_list),
    }
}

/// Diagnostics go to stderr. `RUST_LOG` wins; otherwise warnings only,
/// raised by each `-v`.
fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "asset_press=warn",
        1 => "asset_press=info",
        _ => "asset_press=debug",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. Users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
