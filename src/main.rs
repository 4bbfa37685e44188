use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use litfetch::config::{self, Settings};
use litfetch::models::{DatabaseScope, FilterField, OrderField, Record, SearchQuery};
use litfetch::store::RecordStore;
use litfetch::transfer::{ProgressSink, TransferEngine};
use litfetch::ui;
use litfetch::{HttpStore, Navigator};

/// Search a remote literature index and download document artifacts
#[derive(Parser, Debug)]
#[command(name = "litfetch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search a remote literature index and download document artifacts", long_about = None)]
struct Cli {
    /// Enable verbose logging (-v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base URL of the index API
    #[arg(long)]
    api_base: Option<String>,

    /// Bearer token for index requests
    #[arg(long)]
    token: Option<String>,

    /// Directory downloaded artifacts are written to
    #[arg(long, short)]
    output_dir: Option<PathBuf>,

    /// Parallel workers per transfer
    #[arg(long, short)]
    workers: Option<usize>,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut settings =
        config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(api_base) = cli.api_base {
        settings.api_base = api_base;
    }
    if let Some(token) = cli.token {
        settings.token = Some(token);
    }
    if let Some(output_dir) = cli.output_dir {
        settings.output_dir = output_dir;
    }
    if let Some(workers) = cli.workers {
        settings.transfer_workers = workers.max(1);
    }

    let token = settings.token.clone().context(
        "no bearer token configured; pass --token, set LITFETCH_TOKEN, or add `token` to the config file",
    )?;

    let store = HttpStore::new(&settings.api_base, &token)?;
    let mut navigator = Navigator::new(store);

    run_prompt(&mut navigator, &settings, &token).await
}

/// Read one line from stdin, trimmed. `None` at end of input.
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = std::io::stdout().flush();

    let mut line = String::new();
    match std::io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

/// Numbered single-choice prompt; empty input picks the default.
fn select_option<T: Copy>(title: &str, options: &[(&str, T)], default: usize) -> T {
    loop {
        println!("{}:", title.green());
        for (i, (label, _)) in options.iter().enumerate() {
            if i == default {
                println!("\t {}: {} {}", i + 1, label, "(default)".green());
            } else {
                println!("\t {}: {}", i + 1, label);
            }
        }

        let Some(input) = read_line("$ choice: ") else {
            return options[default].1;
        };
        if input.is_empty() {
            return options[default].1;
        }

        match input.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => return options[n - 1].1,
            _ => println!("{}", "invalid choice".red()),
        }
    }
}

/// Build a query interactively from a keyword.
fn build_query(keyword: &str) -> SearchQuery {
    let filter = select_option(
        "match the keyword against",
        &[
            (FilterField::Subject.label(), FilterField::Subject),
            (FilterField::Abstract.label(), FilterField::Abstract),
            (FilterField::Author.label(), FilterField::Author),
            (FilterField::Keyword.label(), FilterField::Keyword),
        ],
        0,
    );
    let scope = select_option(
        "collection to search",
        &[
            (DatabaseScope::All.label(), DatabaseScope::All),
            (DatabaseScope::Journals.label(), DatabaseScope::Journals),
            (
                DatabaseScope::DoctoralTheses.label(),
                DatabaseScope::DoctoralTheses,
            ),
            (
                DatabaseScope::MastersTheses.label(),
                DatabaseScope::MastersTheses,
            ),
            (DatabaseScope::Conferences.label(), DatabaseScope::Conferences),
        ],
        0,
    );
    let order = select_option(
        "order results by",
        &[
            (OrderField::Relevance.label(), OrderField::Relevance),
            (OrderField::CitationCount.label(), OrderField::CitationCount),
            (OrderField::PublishDate.label(), OrderField::PublishDate),
            (OrderField::DownloadCount.label(), OrderField::DownloadCount),
        ],
        0,
    );

    SearchQuery::new(keyword)
        .filter(filter)
        .scope(scope)
        .order(order)
}

fn print_help() {
    println!("commands (case-insensitive):");
    println!("\t {}: show info about the current page", "INFO".yellow());
    println!("\t {}: go to the next page", "NEXT".yellow());
    println!("\t {}: go back to the previous page", "PREV".yellow());
    println!(
        "\t  {}: (GET ID1 ID2 ...) download the documents with these ids",
        "GET".yellow()
    );
    println!("\t {}: (SHOW ID) print details of one document", "SHOW".yellow());
    println!("\t{}: end this search and start a new one", "BREAK".yellow());
    println!("\t {}: leave the program", "QUIT".yellow());
}

async fn run_prompt(
    navigator: &mut Navigator<HttpStore>,
    settings: &Settings,
    token: &str,
) -> Result<()> {
    loop {
        let Some(keyword) = read_line(&format!("$ {}", "search for: ".cyan())) else {
            return Ok(());
        };
        if keyword.is_empty() {
            continue;
        }

        let query = build_query(&keyword);
        let first = match navigator.start_search(query).await {
            Ok(page) => page,
            Err(err) => {
                println!("search '{}' {}: {}", keyword, "failed".red(), err);
                continue;
            }
        };

        ui::print_page(first);
        println!(
            "matched {} records (type '{}' for commands)",
            first.total_records.to_string().green(),
            "help".red()
        );

        loop {
            let (page_index, total_pages, records) = {
                let Ok(page) = navigator.current() else {
                    break;
                };
                (page.page_index, page.total_pages, page.records.clone())
            };

            let Some(line) = read_line(&format!(
                "$ [{}/{}] {}",
                page_index,
                total_pages,
                "command: ".cyan()
            )) else {
                return Ok(());
            };

            let parts: Vec<&str> = line.split_whitespace().collect();
            let Some(command) = parts.first() else {
                continue;
            };

            match command.to_lowercase().as_str() {
                "help" => print_help(),
                "info" => {
                    println!(
                        " page size: {}\n      page: {}\n     pages: {}",
                        records.len(),
                        page_index,
                        total_pages
                    );
                }
                "next" => match navigator.advance(page_index + 1).await {
                    Ok(page) => ui::print_page(page),
                    Err(err) => println!("no next page ({})", err.to_string().red()),
                },
                "prev" => match navigator.retreat() {
                    Ok(page) => ui::print_page(page),
                    Err(err) => println!("no previous page ({})", err.to_string().red()),
                },
                "show" => match parse_record_id(&parts, &records) {
                    Some(id) => ui::print_record(page_index, id, &records[id - 1]),
                    None => println!("{}", "invalid id".red()),
                },
                "get" => {
                    if parts.len() < 2 {
                        println!("{}", "invalid input".red());
                        continue;
                    }
                    for part in &parts[1..] {
                        let Some(id) = parse_one_id(part, records.len()) else {
                            println!("{}: {}", "invalid id".red(), part);
                            break;
                        };
                        let record = &records[id - 1];
                        println!("downloading... {}", record.fields.title);
                        match download_record(navigator.store(), settings, token, record).await {
                            Ok(path) => {
                                println!("download complete ({})", path.display().green())
                            }
                            Err(err) => {
                                println!("download {}: {}", "failed".red(), err);
                                break;
                            }
                        }
                    }
                }
                "break" => {
                    navigator.stop();
                    println!("{}", "search ended.".yellow());
                    break;
                }
                "quit" | "exit" => return Ok(()),
                _ => println!("unknown command (type '{}' for commands)", "help".red()),
            }
        }
    }
}

fn parse_one_id(input: &str, count: usize) -> Option<usize> {
    input.parse::<usize>().ok().filter(|id| (1..=count).contains(id))
}

fn parse_record_id(parts: &[&str], records: &[Record]) -> Option<usize> {
    parts.get(1).and_then(|part| parse_one_id(part, records.len()))
}

/// Resolve a record's artifact location and download it.
async fn download_record(
    store: &HttpStore,
    settings: &Settings,
    token: &str,
    record: &Record,
) -> Result<PathBuf> {
    let location = store.resolve_artifact(&record.instance).await?;
    let url = location
        .urls
        .first()
        .context("artifact descriptor carried no mirror URLs")?;

    let extension = Path::new(&location.suggested_filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("caj");
    let filename = format!("{}.{}", ui::make_safe_filename(&record.fields.title), extension);
    let dest = settings.output_dir.join(filename);

    tracing::info!(size = location.declared_size, url = %url, "starting download");

    let bar = ProgressBar::new(location.declared_size);
    if let Ok(style) =
        ProgressStyle::with_template("{bar:40.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec})")
    {
        bar.set_style(style);
    }
    let sink: ProgressSink = {
        let bar = bar.clone();
        Arc::new(move |total| bar.set_position(total))
    };

    let engine = TransferEngine::new(store.client().clone())
        .with_token(token)
        .with_workers(settings.transfer_workers)
        .with_progress(sink);

    let path = engine.transfer(url, &dest, location.declared_size).await?;
    bar.finish_and_clear();

    // The index serves some artifacts as PDF under a generic extension.
    if extension != "pdf" && ui::is_pdf_document(&path) {
        let renamed = path.with_extension("pdf");
        if std::fs::rename(&path, &renamed).is_ok() {
            return Ok(renamed);
        }
    }

    Ok(path)
}
