mod app;
mod events;
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use sentinel::api::{ApiClient, MarketDataRepository, WatchlistSelector};
use sentinel::config::{Config, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use sentinel::dashboard::normalize_symbol;
use sentinel::logging::init_logging;
use sentinel::store::{AppPreferences, JsonFileStore, PreferencesStore};
use sentinel::{AddOutcome, DashboardCoordinator};

use app::App;

#[derive(Parser, Debug)]
#[command(name = "sentinel")]
#[command(about = "Watch futures, market watchlists and your own tickers from the terminal", long_about = None)]
struct Args {
    /// Market data API URL
    #[arg(long, default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    /// Refresh interval in seconds (defaults to the stored preference)
    #[arg(long, global = true)]
    refresh: Option<u64>,

    /// Market watchlist to show first (defaults to the stored preference)
    #[arg(long, value_enum, global = true)]
    watchlist: Option<WatchlistSelector>,

    /// Directory holding preferences and the user watchlist
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    timeout: u64,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the live dashboard
    #[command(name = "dashboard", alias = "watch")]
    Dashboard,

    /// Add a ticker to your watchlist
    #[command(name = "add")]
    Add {
        /// Ticker symbol
        ticker: String,
    },

    /// Remove a ticker from your watchlist
    #[command(name = "remove", alias = "rm")]
    Remove {
        /// Ticker symbol
        ticker: String,
    },

    /// Show your watchlist
    #[command(name = "list", alias = "ls")]
    List,

    /// Fetch a full quote for one ticker
    #[command(name = "quote")]
    Quote {
        /// Ticker symbol
        ticker: String,
        /// Include fundamentals and dividend fields
        #[arg(short, long)]
        extended: bool,
    },
}

impl Args {
    fn config(&self) -> Config {
        Config {
            api_url: self.api_url.clone(),
            data_dir: self.data_dir.clone().unwrap_or_else(Config::default_data_dir),
            refresh_secs: self.refresh,
            watchlist: self.watchlist,
            timeout_secs: self.timeout,
            json_logs: self.json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.config();
    let tui = matches!(args.command, Some(Commands::Dashboard) | None);
    let log_file = tui.then(|| config.log_file());
    init_logging(config.json_logs, log_file.as_deref());

    let store = Arc::new(JsonFileStore::new(config.data_dir.clone()));
    let client = ApiClient::new(config.api_url.clone(), config.timeout_secs)?;

    let preferences = match store.get_preferences().await {
        Ok(prefs) => prefs,
        Err(e) => {
            warn!(event = "main.preferences_fallback", error = %e, code = e.error_code());
            AppPreferences::default()
        }
    };

    let dashboard = Arc::new(DashboardCoordinator::new(
        Arc::new(client.clone()),
        store,
        config.dashboard_config(&preferences),
    ));

    match args.command {
        Some(Commands::Add { ticker }) => {
            let symbol = normalize_symbol(&ticker)?;
            let outcome = dashboard
                .add_ticker(&symbol, || println!("{} is already on your watchlist", symbol))
                .await?;
            if outcome == AddOutcome::Added {
                print_user_watchlist(&dashboard).await?;
            }
        }

        Some(Commands::Remove { ticker }) => {
            let symbol = normalize_symbol(&ticker)?;
            if dashboard.remove_ticker(&symbol).await? {
                print_user_watchlist(&dashboard).await?;
            } else {
                println!("{} is not on your watchlist", symbol);
            }
        }

        Some(Commands::List) => {
            print_user_watchlist(&dashboard).await?;
        }

        Some(Commands::Quote { ticker, extended }) => {
            let symbol = normalize_symbol(&ticker)?;
            let quote = client
                .get_stock_quote(&symbol)
                .await
                .with_context(|| format!("Failed to fetch quote for {}", symbol))?;
            let extended = extended || preferences.show_extended_quote;
            println!("{}", ui::render_quote(&quote, extended));
        }

        Some(Commands::Dashboard) | None => {
            run_tui(dashboard).await?;
        }
    }

    Ok(())
}

async fn run_tui(dashboard: Arc<DashboardCoordinator>) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(dashboard);
    let res = app.run(&mut terminal).await;

    // Restore the terminal even when the app failed.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

async fn print_user_watchlist(dashboard: &DashboardCoordinator) -> Result<()> {
    let symbols = dashboard.load_user_watchlist().await?;
    println!("{}", ui::user_watchlist_line(&symbols));
    Ok(())
}
