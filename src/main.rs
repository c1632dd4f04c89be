//! user-directory binary entry point.
//!
//! Parses the command line, sets up logging, initializes the terminal in raw
//! mode, runs the TUI event loop, and restores the terminal state on exit.
//!
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::EnvFilter;

use user_directory::app::{self, AppOptions, AppState};
use user_directory::model::Role;
use user_directory::query::{FilterCriteria, LoadPolicy, QueryOptions, UserQuery};
use user_directory::source::{BundledSource, FileSource, UserSource};

#[derive(Debug, Parser)]
#[command(name = "user-directory", version, about)]
struct Cli {
    /// JSON file with user records; the bundled directory is used when absent.
    #[arg(long, env = "USER_DIRECTORY_DATA")]
    data: Option<PathBuf>,

    /// Simulated latency of the bundled directory, in milliseconds.
    #[arg(long, default_value_t = 800, env = "USER_DIRECTORY_DELAY_MS")]
    delay_ms: u64,

    /// Start with the bundled directory failing every fetch.
    #[arg(long)]
    simulate_error: bool,

    /// Fetch immediately instead of waiting for the first search.
    #[arg(long)]
    fetch_on_start: bool,

    /// Ignore answers from loads that were superseded by a newer one.
    #[arg(long)]
    latest_wins: bool,

    /// Write logs here (filtered by RUST_LOG, default `info`).
    #[arg(long, env = "USER_DIRECTORY_LOG")]
    log_file: Option<PathBuf>,

    /// Print matching users and exit instead of starting the TUI.
    #[arg(long)]
    list: bool,

    /// Name filter for --list.
    #[arg(long, default_value = "")]
    search: String,

    /// Role filter for --list; repeat for several roles.
    #[arg(long = "role", value_parser = parse_role)]
    roles: Vec<Role>,
}

fn parse_role(s: &str) -> std::result::Result<Role, String> {
    s.parse()
}

fn init_logging(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if let Some(path) = &cli.log_file {
        let file = std::fs::File::create(path)
            .with_context(|| format!("open log file {}", path.display()))?;
        builder
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .try_init()
            .map_err(|e| anyhow!("init logging: {e}"))?;
    } else if cli.list {
        builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow!("init logging: {e}"))?;
    }
    Ok(())
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Load once, filter, print one user per line.
fn run_list(source: Arc<dyn UserSource>, cli: &Cli) -> Result<()> {
    let mut query = UserQuery::with_options(source, QueryOptions::default());
    if !query.wait_settled(Duration::from_secs(30)) {
        return Err(anyhow!("timed out waiting for the user directory"));
    }
    if let Some(err) = query.error() {
        return Err(anyhow!("{err}"));
    }
    let criteria = FilterCriteria::new(cli.search.clone(), cli.roles.iter().copied());
    for u in query.derive_filtered_view(&criteria) {
        println!("{}\t{}\t{}\t{}\t{}", u.id, u.role.label(), u.name, u.team, u.email);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let (source, error_switch): (Arc<dyn UserSource>, Option<Arc<BundledSource>>) = match &cli.data {
        Some(path) => {
            let file: Arc<dyn UserSource> = Arc::new(FileSource::new(path));
            (file, None)
        }
        None => {
            let bundled = Arc::new(BundledSource::with_delay(Duration::from_millis(cli.delay_ms)));
            bundled.set_simulate_error(cli.simulate_error);
            let shared: Arc<dyn UserSource> = bundled.clone();
            (shared, Some(bundled))
        }
    };

    if cli.list {
        return run_list(source, &cli);
    }

    let options = AppOptions {
        fetch_on_start: cli.fetch_on_start,
        policy: if cli.latest_wins { LoadPolicy::LatestWins } else { LoadPolicy::AcceptAll },
        filter_conf_path: Some(app::config_file_write_path("filter.conf")),
    };
    let mut state = AppState::new(source, options);
    state.error_switch = error_switch;

    let mut terminal = init_terminal().context("init terminal")?;
    let res = app::run(&mut terminal, state);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    if let Err(err) = &res {
        tracing::error!(error = %err, "application error");
        eprintln!("application error: {err}");
    }
    res
}
