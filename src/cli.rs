//! CLI module - command-line definitions and the handlers behind them.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use crossterm::tty::IsTty;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::api::ApiClient;
use crate::config::{default_config_path, Config};
use crate::detector::detect_types;
use crate::models::{
    join_types, request_types, CountRequest, Pagination, Payload, SearchRequest, SearchType,
};
use crate::spinner::{Spinner, SpinnerStyle};
use crate::ui::{self, AutoPrompter, DialoguerPrompter, Prompter};

/// cliscore - command-line client for the keyscore search API.
#[derive(Parser, Debug)]
#[command(name = "cliscore", version, about)]
pub struct Cli {
    /// Path of the configuration file.
    #[arg(
        long,
        global = true,
        env = "CLISCORE_CONFIG",
        value_name = "PATH",
        long_help = "Path of the JSON configuration file.\n\n\
Defaults to ~/.keyscore-cli/config.json."
    )]
    pub config: Option<PathBuf>,

    /// Verbose mode (debug logging on stderr).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search for terms across different data types (with pagination support).
    #[command(long_about = "Search for terms across different data types.\n\n\
Without --types, the types are detected from the terms (uuid, email, url,\n\
domain) and confirmed interactively.\n\n\
Examples:\n\
  cliscore search admin@example.com\n\
  cliscore search --types login,password example.com --pages 1-3\n")]
    Search {
        #[command(flatten)]
        query: QueryArgs,

        /// Specific page number to retrieve (1-10).
        #[arg(long, value_name = "N")]
        page: Option<u32>,

        /// Pages to retrieve (e.g. '1,2,3' or '1-5').
        #[arg(long, value_name = "PAGES")]
        pages: Option<String>,

        /// Number of results per page (max: 10000).
        #[arg(long, value_name = "N")]
        page_size: Option<u32>,

        #[command(flatten)]
        auth: AuthArgs,

        #[command(flatten)]
        save: SaveArgs,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Count occurrences of terms.
    Count {
        #[command(flatten)]
        query: QueryArgs,

        #[command(flatten)]
        auth: AuthArgs,

        #[command(flatten)]
        save: SaveArgs,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Get machine information from log files.
    #[command(name = "machineinfo")]
    MachineInfo {
        /// UUID of the log file.
        #[arg(value_name = "UUID")]
        uuid: String,

        #[command(flatten)]
        auth: AuthArgs,

        #[command(flatten)]
        save: SaveArgs,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Download log files.
    Download {
        /// UUID of the log file.
        #[arg(value_name = "UUID")]
        uuid: String,

        /// Specific file to extract from the archive.
        #[arg(long, value_name = "FILE")]
        file: Option<String>,

        /// Output file path.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        #[command(flatten)]
        auth: AuthArgs,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Check your remaining credits.
    Credits {
        #[command(flatten)]
        auth: AuthArgs,

        /// Quiet mode (only the number).
        #[arg(short, long)]
        quiet: bool,
    },

    /// Setup API key and endpoint.
    Setup,

    /// Show current configuration.
    Config,

    /// Show available spinner styles.
    Spinner,
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Terms to look for.
    #[arg(required = true, value_name = "TERMS")]
    pub terms: Vec<String>,

    /// Data types to search (comma-separated). Detected when omitted.
    #[arg(long, value_enum, value_delimiter = ',', value_name = "TYPES")]
    pub types: Vec<SearchType>,

    /// Source to query.
    #[arg(long, default_value = "xkeyscore")]
    pub source: String,

    /// Enable wildcard search.
    #[arg(long)]
    pub wildcard: bool,

    /// Search operator (AND, LOGS).
    #[arg(long, value_name = "OP")]
    pub operator: Option<String>,

    /// Accept detected types without asking.
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AuthArgs {
    /// API key for authentication (overrides config and env var).
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SaveArgs {
    /// Save results to file.
    #[arg(long)]
    pub save: bool,

    /// Don't save results to file.
    #[arg(long, conflicts_with = "save")]
    pub no_save: bool,

    /// Results directory (overrides config).
    #[arg(long, value_name = "DIR")]
    pub results_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DisplayArgs {
    /// Quiet mode (minimal output, no spinner).
    #[arg(short, long)]
    pub quiet: bool,

    /// Don't show the loading spinner.
    #[arg(long)]
    pub no_spinner: bool,
}

impl DisplayArgs {
    fn spinner(&self) -> bool {
        !self.quiet && !self.no_spinner
    }
}

/// Applies per-command flags on top of the resolved configuration.
fn with_overrides(base: &Config, auth: &AuthArgs, save: Option<&SaveArgs>) -> Config {
    let mut config = base.clone();
    if let Some(key) = auth.api_key.as_ref().filter(|k| !k.is_empty()) {
        config.api_key = key.clone();
    }
    if let Some(save) = save {
        if save.save {
            config.save_results = true;
        }
        if save.no_save {
            config.save_results = false;
        }
        if let Some(dir) = &save.results_dir {
            config.results_dir = dir.clone();
        }
    }
    config
}

pub fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = Config::resolve(&config_path, |key| std::env::var(key).ok());
    log::debug!("using config file {}", config_path.display());

    match cli.command {
        Commands::Search {
            query,
            page,
            pages,
            page_size,
            auth,
            save,
            display,
        } => {
            let config = with_overrides(&config, &auth, Some(&save));
            let pagination = Pagination::from_flags(page, pages.as_deref(), page_size);
            run_search(&config, &query, pagination, &display)
        }
        Commands::Count {
            query,
            auth,
            save,
            display,
        } => run_count(&with_overrides(&config, &auth, Some(&save)), &query, &display),
        Commands::MachineInfo {
            uuid,
            auth,
            save,
            display,
        } => run_machine_info(&with_overrides(&config, &auth, Some(&save)), &uuid, &display),
        Commands::Download {
            uuid,
            file,
            output,
            auth,
            display,
        } => {
            let config = with_overrides(&config, &auth, None);
            let spinner_message = match &file {
                Some(f) => format!("Downloading {} from UUID: {}", f, uuid),
                None => format!("Downloading file for UUID: {}", uuid),
            };
            let spinner = start_spinner(&config, spinner_message, &display);
            let result = ApiClient::from_config(&config)?.download(
                &uuid,
                file.as_deref(),
                output.as_deref(),
                &config.api_key,
            );
            spinner.stop();
            let path = result.context("download failed")?;
            println!("File downloaded successfully: {}", path.display());
            Ok(())
        }
        Commands::Credits { auth, quiet } => {
            let config = with_overrides(&config, &auth, None);
            let api_key = config.require_api_key()?;
            let credits = ApiClient::from_config(&config)?
                .credits(api_key)
                .context("failed to fetch credits")?;
            if quiet {
                println!("{}", credits.credits);
            } else {
                if let Some(message) = credits.message.filter(|m| !m.is_empty()) {
                    println!("{}", message);
                }
                println!("Credits remaining: {}", credits.credits);
            }
            Ok(())
        }
        Commands::Setup => run_setup(&config, &config_path),
        Commands::Config => {
            let file = config_path.exists().then_some(config_path.as_path());
            ui::print_config(&mut io::stdout().lock(), &config, file)?;
            Ok(())
        }
        Commands::Spinner => {
            ui::print_spinner_styles(&mut io::stdout().lock())?;
            Ok(())
        }
    }
}

/// Spinner for one request; off when quiet or `--no-spinner` is set.
fn start_spinner(config: &Config, message: String, display: &DisplayArgs) -> Spinner {
    Spinner::start(
        SpinnerStyle::resolve(&config.spinner_style),
        message,
        display.spinner(),
    )
}

/// Explicit `--types`, otherwise detection confirmed by the user.
fn choose_types(query: &QueryArgs) -> Result<Vec<SearchType>> {
    if !query.types.is_empty() {
        return Ok(query.types.clone());
    }
    let detected = detect_types(&query.terms);
    let prompter: &dyn Prompter = if query.yes || !io::stdin().is_tty() {
        &AutoPrompter
    } else {
        &DialoguerPrompter
    };
    let types = ui::resolve_types(&detected, prompter).context("type selection failed")?;
    log::debug!("searching types: {}", join_types(&types));
    Ok(types)
}

/// Reports where results were saved. A failed save is only a warning.
fn report_saved(result: crate::Result<Option<PathBuf>>, quiet: bool) {
    match result {
        Ok(Some(path)) if !quiet => println!("Full response saved to: {}", path.display()),
        Ok(_) => {}
        Err(e) => {
            log::warn!("saving results failed: {}", e);
            if !quiet {
                eprintln!("Warning: Failed to save results: {}", e);
            }
        }
    }
}

/// `search`: resolve types, query `/search`, print and optionally save.
fn run_search(
    config: &Config,
    query: &QueryArgs,
    pagination: Option<Pagination>,
    display: &DisplayArgs,
) -> Result<()> {
    let types = choose_types(query)?;
    let client = ApiClient::from_config(config)?;
    let req = SearchRequest {
        terms: query.terms.clone(),
        types: request_types(&types),
        wildcard: query.wildcard,
        source: query.source.clone(),
        operator: query.operator.clone(),
        pagination,
    };

    // Stop the spinner before anything is printed.
    let spinner = start_spinner(
        config,
        format!("Searching for {} in {}...", query.terms.join(", "), join_types(&types)),
        display,
    );
    let result = client.search(&req, &config.api_key);
    spinner.stop();
    let resp = result.context("search failed")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    ui::print_search_results(&mut out, &resp, display.quiet)?;
    out.flush()?;

    // Paginated responses are saved whole, plain ones as the results map.
    let saved = if resp.is_paginated() {
        config.save_results("search", &query.terms, &types, &resp)
    } else {
        config.save_results("search", &query.terms, &types, &resp.results)
    };
    report_saved(saved, display.quiet);
    Ok(())
}

/// `count`: same flow as search against `/count/detailed`.
fn run_count(config: &Config, query: &QueryArgs, display: &DisplayArgs) -> Result<()> {
    let types = choose_types(query)?;
    let client = ApiClient::from_config(config)?;
    let req = CountRequest {
        terms: query.terms.clone(),
        types: request_types(&types),
        wildcard: query.wildcard,
        source: query.source.clone(),
        operator: query.operator.clone(),
    };

    let spinner = start_spinner(
        config,
        format!("Counting {} in {}...", query.terms.join(", "), join_types(&types)),
        display,
    );
    let result = client.count(&req, &config.api_key);
    spinner.stop();
    let resp = result.context("count failed")?;

    ui::print_count(&mut io::stdout().lock(), &resp, display.quiet)?;
    report_saved(
        config.save_results("count", &query.terms, &types, &resp),
        display.quiet,
    );
    Ok(())
}

/// `machineinfo`: fetch one log's machine record and show its file tree.
fn run_machine_info(config: &Config, uuid: &str, display: &DisplayArgs) -> Result<()> {
    let client = ApiClient::from_config(config)?;
    let spinner = start_spinner(
        config,
        format!("Retrieving machine info for UUID: {}", uuid),
        display,
    );
    let result = client.machine_info(uuid, &config.api_key);
    spinner.stop();
    let info = result.context("failed to retrieve machine info")?;

    if !display.quiet {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "Machine Information:")?;
        ui::print_payload(&mut out, &Payload::MachineInfo(info.clone()))?;
    }
    report_saved(
        config.save_results("machineinfo", &[uuid.to_string()], &["log"], &info),
        display.quiet,
    );
    Ok(())
}

/// `setup`: run the wizard, then write the config file.
fn run_setup(current: &Config, path: &std::path::Path) -> Result<()> {
    let config = ui::setup_wizard(current, |base_url, api_key| {
        ApiClient::new(base_url)?.validate_api_key(api_key)
    })?;
    config
        .save(path)
        .with_context(|| format!("error saving config to {}", path.display()))?;

    println!("✅ Configuration saved successfully!");
    println!("📍 Base URL: {}", config.base_url);
    println!("🔑 API key: ********");
    println!("💾 Save results: {}", config.save_results);
    if config.save_results {
        println!("📁 Results directory: {}", config.results_dir.display());
    }
    println!("🎨 Spinner style: {}", config.spinner_style);
    Ok(())
}
