use anyhow::{Context, Result};
use book_finder::config::{
    find_config_file, get_config, load_config, ConfigFile, LoggingConfig,
    SearchConfig,
};
use book_finder::controller::{SearchController, SearchState, SearchStatus};
use book_finder::models::{FilterSet, ParamsUpdate, SortMode};
use book_finder::sources::OpenLibrarySource;
use book_finder::ui::{self, Spinner, Status};
use book_finder::utils::{
    build_search_url, is_terminal, pagination_footer, results_table, terminal_width, CoverResolver,
    CoverSize,
};
use book_finder::RequestParams;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Book Finder - Search the Open Library catalog from the terminal
#[derive(Parser, Debug)]
#[command(name = "book-finder")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search the Open Library catalog from the terminal", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the configuration file)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Show supported environment variables and exit
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

/// Sort order for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
enum SortField {
    /// The catalog's own ranking
    #[default]
    Relevance,
    /// Newest first
    New,
    /// Oldest first
    Old,
    /// Alphabetical by title
    Title,
    /// Highest rated first
    Rating,
    /// Most editions first
    Editions,
    /// Random order
    Random,
}

impl From<SortField> for SortMode {
    fn from(field: SortField) -> Self {
        match field {
            SortField::Relevance => SortMode::Relevance,
            SortField::New => SortMode::New,
            SortField::Old => SortMode::Old,
            SortField::Title => SortMode::Title,
            SortField::Rating => SortMode::Rating,
            SortField::Editions => SortMode::Editions,
            SortField::Random => SortMode::Random,
        }
    }
}

/// Cover image size
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SizeArg {
    /// Small
    S,
    /// Medium
    M,
    /// Large
    L,
}

impl From<SizeArg> for CoverSize {
    fn from(size: SizeArg) -> Self {
        match size {
            SizeArg::S => CoverSize::Small,
            SizeArg::M => CoverSize::Medium,
            SizeArg::L => CoverSize::Large,
        }
    }
}

/// Search criteria shared by `search` and `url`
#[derive(clap::Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Free-text keywords
    query: Vec<String>,

    /// Title to match
    #[arg(long, short)]
    title: Option<String>,

    /// Author to match
    #[arg(long, short)]
    author: Option<String>,

    /// Subject to match
    #[arg(long, short)]
    subject: Option<String>,

    /// Language code (e.g. eng, fre)
    #[arg(long, short)]
    language: Option<String>,

    /// Earliest first-publication year
    #[arg(long)]
    year_from: Option<String>,

    /// Latest first-publication year
    #[arg(long)]
    year_to: Option<String>,

    /// Sort order
    #[arg(long, value_enum, default_value_t = SortField::Relevance)]
    sort: SortField,

    /// Page to fetch
    #[arg(long, short, default_value_t = 1)]
    page: u32,

    /// Results per page (defaults to the configured page size)
    #[arg(long)]
    limit: Option<u32>,
}

impl FilterArgs {
    fn filters(&self) -> FilterSet {
        FilterSet {
            query: self.query.join(" "),
            title: self.title.clone().unwrap_or_default(),
            author: self.author.clone().unwrap_or_default(),
            subject: self.subject.clone().unwrap_or_default(),
            language: self.language.clone().unwrap_or_default(),
            year_from: self.year_from.clone().unwrap_or_default(),
            year_to: self.year_to.clone().unwrap_or_default(),
            sort: self.sort.into(),
        }
    }

    fn update(&self, default_limit: u32) -> ParamsUpdate {
        ParamsUpdate::from_filters(&self.filters())
            .page(self.page)
            .limit(self.limit.unwrap_or(default_limit))
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search the catalog and print one page of results
    #[command(alias = "s")]
    Search {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Interactive search session
    #[command(alias = "b")]
    Browse,

    /// Print the request URL for a search without fetching it
    Url {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Print the image URL for a cover identifier
    Cover {
        /// Cover identifier (`cover_i`)
        id: Option<i64>,

        /// Image size
        #[arg(long, short, value_enum, default_value_t = SizeArg::M)]
        size: SizeArg,
    },

    /// Show or create the configuration file
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Print the effective configuration
        #[arg(long)]
        show: bool,

        /// Destination for --init (defaults to ./book-finder.toml)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn print_env_vars() {
    println!("Book Finder - Environment Variables");
    println!();
    println!("Configuration overrides (nested keys use a double underscore):");
    println!("  BOOK_FINDER_SEARCH__ENDPOINT          Search endpoint URL");
    println!("  BOOK_FINDER_SEARCH__PAGE_SIZE         Results per page (default: 24)");
    println!("  BOOK_FINDER_SEARCH__DEBOUNCE_MS       Debounce window in ms (default: 300)");
    println!("  BOOK_FINDER_SEARCH__MAX_RESULT_INDEX  Last reachable result index (default: 1000)");
    println!("  BOOK_FINDER_COVERS__BASE_URL          Cover image host");
    println!("  BOOK_FINDER_COVERS__SIZE              Cover size: S, M or L (default: M)");
    println!("  BOOK_FINDER_HTTP__TIMEOUT_SECS        Request timeout (default: 30)");
    println!("  BOOK_FINDER_HTTP__USER_AGENT          User-Agent header");
    println!();
    println!("Global Proxy Settings:");
    println!("  HTTP_PROXY                  HTTP proxy URL (e.g., http://proxy:8080)");
    println!("  HTTPS_PROXY                 HTTPS proxy URL (e.g., https://proxy:8080)");
    println!("  NO_PROXY                    Comma-separated list of hosts to bypass proxy");
    println!();
    println!("Other Settings:");
    println!("  RUST_LOG                    Rust logging level (e.g., debug, info, warn, error)");
    println!();
    println!("Example:");
    println!("  BOOK_FINDER_SEARCH__PAGE_SIZE=12 book-finder search --title \"the hobbit\"");
}

fn init_tracing(verbose: u8, quiet: bool, logging: &LoggingConfig) {
    let log_level = match verbose {
        0 => logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let level = if quiet { "error" } else { log_level };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("book_finder={}", level)),
    );

    let registry = tracing_subscriber::registry().with(filter);
    if logging.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn config_path(cli: &Cli) -> Option<PathBuf> {
    cli.config.clone().or_else(find_config_file)
}

/// Logging settings are read straight from the file since they must be
/// known before the subscriber is installed.
fn file_logging(path: Option<&Path>) -> LoggingConfig {
    path.and_then(|p| ConfigFile::load(p).ok())
        .map(|file| file.logging)
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.env {
        print_env_vars();
        return Ok(());
    }

    let path = config_path(&cli);
    init_tracing(cli.verbose, cli.quiet, &file_logging(path.as_deref()));

    let mut config = match &path {
        Some(path) => {
            tracing::info!("Using config file: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?
        }
        None => get_config(),
    };
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    let output = cli.output.resolve();

    match cli.command {
        Some(Commands::Search { filters }) => {
            let controller = build_controller(config)?;
            let update = filters.update(controller.config().page_size);
            run_search(&controller, update, output, cli.quiet).await
        }
        Some(Commands::Browse) => {
            let controller = build_controller(config)?;
            run_browse(controller).await
        }
        Some(Commands::Url { filters }) => {
            let mut params = RequestParams::default().limit(config.page_size);
            params.apply(filters.update(config.page_size));
            println!("{}", build_search_url(&config.endpoint, &params));
            Ok(())
        }
        Some(Commands::Cover { id, size }) => {
            let resolver: CoverResolver = config.cover_resolver();
            println!("{}", resolver.resolve(id, size.into()));
            Ok(())
        }
        Some(Commands::Config {
            init,
            show,
            path: target,
            force,
        }) => run_config(&config, init, show, target, force),
        None => {
            let controller = build_controller(config)?;
            run_browse(controller).await
        }
    }
}

fn build_controller(config: SearchConfig) -> Result<SearchController> {
    let source = OpenLibrarySource::from_config(&config).context("failed to build HTTP client")?;
    Ok(SearchController::new(Arc::new(source), config))
}

async fn run_search(
    controller: &SearchController,
    update: ParamsUpdate,
    output: OutputFormat,
    quiet: bool,
) -> Result<()> {
    controller
        .update(update)
        .context("refusing to request that page")?;
    if controller.status() == SearchStatus::Idle {
        if !quiet {
            ui::print_status(
                Status::Warning,
                "Nothing to search: give keywords, --title, --author or --subject",
            );
        }
        return Ok(());
    }

    let spinner = (!quiet && output == OutputFormat::Table).then(|| Spinner::new("Searching..."));
    let state = controller.settled().await;
    if let Some(spinner) = spinner {
        match state.status {
            SearchStatus::Error => spinner.finish_with_error("Search failed"),
            _ => spinner.clear(),
        }
    }

    render(controller, &state, output, quiet)?;
    if state.status == SearchStatus::Error {
        anyhow::bail!(state.error.unwrap_or_else(|| "search failed".to_string()));
    }
    Ok(())
}

fn render(
    controller: &SearchController,
    state: &SearchState,
    output: OutputFormat,
    quiet: bool,
) -> Result<()> {
    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(state)?);
        }
        OutputFormat::Plain => {
            let config = controller.config();
            for book in state.books() {
                println!(
                    "{}\t{}\t{}\t{}",
                    book.title,
                    book.author_line(),
                    book.first_publish_year
                        .map(|y| y.to_string())
                        .unwrap_or_default(),
                    book.link_with(&config.site_base, &config.archive_base)
                );
            }
        }
        OutputFormat::Table | OutputFormat::Auto => {
            if !quiet {
                ui::print_state(state);
            }
            if !state.books().is_empty() {
                let width = terminal_width();
                println!("{}", results_table(state.books(), controller.config(), width));
                println!("{}", pagination_footer(state, controller.last_page()));
            }
        }
    }
    Ok(())
}

/// A parsed line of interactive input
#[derive(Debug, Clone, PartialEq, Eq)]
enum BrowseCommand {
    Query(String),
    Title(String),
    Author(String),
    Subject(String),
    Language(String),
    Years(String, String),
    Sort(SortMode),
    Next,
    Prev,
    Page(u32),
    Clear,
    Help,
    Quit,
    Invalid(String),
}

fn parse_command(line: &str) -> BrowseCommand {
    let line = line.trim();
    let Some(rest) = line.strip_prefix(':') else {
        return BrowseCommand::Query(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "title" | "t" => BrowseCommand::Title(arg.to_string()),
        "author" | "a" => BrowseCommand::Author(arg.to_string()),
        "subject" | "s" => BrowseCommand::Subject(arg.to_string()),
        "lang" | "language" => BrowseCommand::Language(arg.to_string()),
        "years" | "y" => {
            let mut parts = arg.split_whitespace();
            let from = parts.next().unwrap_or("").to_string();
            let to = parts.next().unwrap_or("").to_string();
            BrowseCommand::Years(from, to)
        }
        "sort" => match arg.parse::<SortMode>() {
            Ok(sort) => BrowseCommand::Sort(sort),
            Err(e) => BrowseCommand::Invalid(e),
        },
        "next" | "n" => BrowseCommand::Next,
        "prev" | "p" => BrowseCommand::Prev,
        "page" => match arg.parse::<u32>() {
            Ok(page) => BrowseCommand::Page(page),
            Err(_) => BrowseCommand::Invalid(format!("Not a page number: {}", arg)),
        },
        "clear" | "c" => BrowseCommand::Clear,
        "help" | "h" | "?" => BrowseCommand::Help,
        "quit" | "q" | "exit" => BrowseCommand::Quit,
        other => BrowseCommand::Invalid(format!("Unknown command: :{}", other)),
    }
}

/// Apply a command to the filter set. Returns false when the session ends.
fn apply_command(
    controller: &SearchController,
    filters: &mut FilterSet,
    command: BrowseCommand,
) -> bool {
    let paged = match command {
        BrowseCommand::Query(text) => {
            filters.query = text;
            None
        }
        BrowseCommand::Title(text) => {
            filters.title = text;
            None
        }
        BrowseCommand::Author(text) => {
            filters.author = text;
            None
        }
        BrowseCommand::Subject(text) => {
            filters.subject = text;
            None
        }
        BrowseCommand::Language(text) => {
            filters.language = text;
            None
        }
        BrowseCommand::Years(from, to) => {
            filters.year_from = from;
            filters.year_to = to;
            None
        }
        BrowseCommand::Sort(sort) => {
            filters.sort = sort;
            None
        }
        BrowseCommand::Next => Some(controller.next_page()),
        BrowseCommand::Prev => Some(controller.prev_page()),
        BrowseCommand::Page(page) => Some(controller.set_page(page)),
        BrowseCommand::Clear => {
            *filters = FilterSet::default();
            None
        }
        BrowseCommand::Help => {
            ui::print_banner();
            return true;
        }
        BrowseCommand::Quit => return false,
        BrowseCommand::Invalid(msg) => {
            ui::print_status(Status::Warning, &msg);
            return true;
        }
    };

    match paged {
        Some(Err(e)) => ui::print_status(Status::Warning, &e.to_string()),
        Some(Ok(())) => {}
        None => controller.search(filters),
    }
    true
}

async fn run_browse(controller: SearchController) -> Result<()> {
    ui::print_banner();

    let mut updates = controller.subscribe();
    let renderer = {
        let controller = controller.clone();
        tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let state = updates.borrow_and_update().clone();
                if state.status == SearchStatus::Loading {
                    ui::print_state(&state);
                    continue;
                }
                if let Err(e) = render(&controller, &state, OutputFormat::Table, false) {
                    tracing::warn!(error = %e, "failed to render results");
                }
            }
        })
    };

    let mut filters = FilterSet::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                if !apply_command(&controller, &mut filters, parse_command(&line)) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    controller.clear();
    renderer.abort();
    Ok(())
}

fn run_config(
    config: &SearchConfig,
    init: bool,
    show: bool,
    target: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    if init {
        let target = target.unwrap_or_else(|| PathBuf::from(book_finder::config::CONFIG_FILE_NAME));
        if target.exists() && !force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                target.display()
            );
        }
        ConfigFile::default().save(&target)?;
        ui::print_status(
            Status::Success,
            &format!("Wrote default configuration to {}", target.display()),
        );
    }

    if show || !init {
        if show {
            ui::print_section("Effective configuration");
        }
        let file = ConfigFile::from(config);
        print!("{}", toml::to_string_pretty(&file)?);
    }
    Ok(())
}
