// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use pubmed_digest::utils::logging::{Status, mask_secret, status_line};
use pubmed_digest::config::normalize_queries;
use pubmed_digest::{
    ChatNotifier, Config, ConsoleNotifier, DigestOrchestrator, LiteratureSource, OpenAiSummarizer,
    PubMedClient, PublicationTypeFilter, QueryOutcome, RunReport, SearchWindow, TeamsNotifier,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pubmed-digest")]
#[command(version)]
#[command(about = "Posts LLM summaries of yesterday's PubMed articles to a Teams channel", long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Hide the per-query progress bar
    #[arg(long, action = ArgAction::SetTrue)]
    no_progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search, summarize and post the digest for every configured query
    Run {
        /// Search date (YYYY-MM-DD); defaults to the configured lookback from today
        #[arg(long, value_name = "DATE")]
        date: Option<NaiveDate>,

        /// Replace the configured queries for this run
        #[arg(short, long = "query", value_name = "QUERY")]
        queries: Vec<String>,

        /// Print messages to stdout instead of posting them
        #[arg(long)]
        dry_run: bool,
    },

    /// List matching articles and their filter verdicts without summarizing
    Search {
        #[arg(short, long)]
        query: String,

        #[arg(long, value_name = "DATE")]
        date: Option<NaiveDate>,
    },

    /// Validate configuration and print a summary
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    pubmed_digest::utils::logging::init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    let mut config = load_config(&cli)?;
    let show_progress = !cli.no_progress && std::io::stderr().is_terminal();

    match cli.command {
        Commands::Run {
            date,
            queries,
            dry_run,
        } => {
            if !queries.is_empty() {
                config.pipeline.queries = normalize_queries(&queries);
            }
            config.require_queries()?;
            let window = search_window(&config, date);
            cmd_run(config, window, dry_run, show_progress, cli.color).await?;
        }
        Commands::Search { query, date } => {
            let window = search_window(&config, date);
            cmd_search(&config, &query, &window).await?;
        }
        Commands::Check => {
            cmd_check(&config);
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Config::load(Some(path.as_path())).context("Failed to load configuration")
        }
        None => Config::load(None).context("Failed to load configuration"),
    }
}

fn search_window(config: &Config, date: Option<NaiveDate>) -> SearchWindow {
    match date {
        Some(date) => SearchWindow::for_date(date),
        None => SearchWindow::from_now(&chrono::Local::now(), config.pubmed.lookback_days),
    }
}

async fn cmd_run(
    config: Config,
    window: SearchWindow,
    dry_run: bool,
    show_progress: bool,
    colored: bool,
) -> Result<()> {
    let started = Instant::now();
    info!(
        "Starting digest for {} ({} queries)",
        window.formatted(),
        config.pipeline.queries.len()
    );

    let source = PubMedClient::new(config.pubmed.clone()).context("Failed to build PubMed client")?;
    let summarizer =
        OpenAiSummarizer::new(&config.llm).context("Failed to configure summarizer")?;

    let report = if dry_run {
        info!("Dry run: messages are printed, not posted");
        run_with(config, source, summarizer, ConsoleNotifier, &window, show_progress, colored).await
    } else {
        let notifier = TeamsNotifier::new(&config.webhook).context("Failed to configure webhook")?;
        run_with(config, source, summarizer, notifier, &window, show_progress, colored).await
    };

    print_report(&report);
    info!("Run finished in {:.1}s", started.elapsed().as_secs_f64());

    Ok(())
}

async fn run_with<N: ChatNotifier>(
    config: Config,
    source: PubMedClient,
    summarizer: OpenAiSummarizer,
    notifier: N,
    window: &SearchWindow,
    show_progress: bool,
    colored: bool,
) -> RunReport {
    DigestOrchestrator::new(config, source, summarizer, notifier)
        .with_progress(show_progress, colored)
        .run(window)
        .await
}

fn print_report(report: &RunReport) {
    println!();
    for (query, outcome) in &report.outcomes {
        match outcome {
            QueryOutcome::Completed { attempts, stats } if stats.messages_failed == 0 => {
                println!(
                    "{}",
                    status_line(
                        Status::Posted,
                        Some(query),
                        &format!(
                            "{} of {} articles summarized, {} message(s) posted ({} attempt(s))",
                            stats.articles_qualifying,
                            stats.articles_found,
                            stats.messages_posted,
                            attempts
                        )
                    )
                );
            }
            QueryOutcome::Completed { stats, .. } => {
                println!(
                    "{}",
                    status_line(
                        Status::Partial,
                        Some(query),
                        &format!(
                            "{} message(s) posted, {} dropped after webhook retries",
                            stats.messages_posted, stats.messages_failed
                        )
                    )
                );
            }
            QueryOutcome::Abandoned {
                attempts,
                last_error,
            } => {
                println!(
                    "{}",
                    status_line(
                        Status::Abandoned,
                        Some(query),
                        &format!("abandoned after {} attempt(s): {}", attempts, last_error)
                    )
                );
            }
        }
    }
    println!(
        "{}",
        status_line(
            Status::Note,
            None,
            &format!(
                "Summary ({}): {} completed, {} abandoned, {} posted, {} dropped",
                report.search_date,
                report.completed(),
                report.abandoned(),
                report.messages_posted(),
                report.messages_failed()
            )
        )
    );
}

async fn cmd_search(config: &Config, query: &str, window: &SearchWindow) -> Result<()> {
    info!("Searching '{}' on {}", query, window.formatted());

    let client = PubMedClient::new(config.pubmed.clone()).context("Failed to build PubMed client")?;
    let filter = PublicationTypeFilter::new(config.pipeline.publication_types.clone());

    let ids = client
        .search_ids(query, window)
        .await
        .context("PubMed search failed")?;

    if ids.is_empty() {
        println!("\nNo articles found for \"{}\" on {}\n", query, window.formatted());
        return Ok(());
    }

    println!("\nResults for \"{}\" on {}\n", query, window.formatted());
    println!("{}", "=".repeat(80));

    let mut qualifying = 0;
    for (idx, id) in ids.iter().enumerate() {
        match client.fetch_summary(id).await {
            Ok(summary) => {
                let accepted = filter.accepts(&summary.publication_types);
                if accepted {
                    qualifying += 1;
                }
                let verdict = if accepted { "included" } else { "filtered" };
                println!("\n{}. [{}] {}", idx + 1, verdict, summary.title);
                println!("   {}", id.url());
                println!("   Types: {}", summary.publication_types.join(", "));
            }
            Err(e) => {
                warn!("Could not fetch summary for {}: {}", id, e);
                println!("\n{}. [error] {}", idx + 1, id.url());
            }
        }
    }

    println!("\n{}", "=".repeat(80));
    println!(
        "{} articles, {} would be summarized\n",
        ids.len(),
        qualifying
    );

    Ok(())
}

fn cmd_check(config: &Config) {
    println!("{}", status_line(Status::Posted, None, "Configuration is valid"));
    println!("  PubMed endpoint:  {}", config.pubmed.base_url);
    println!("  Lookback days:    {}", config.pubmed.lookback_days);
    println!("  Completion model: {} ({})", config.llm.model, config.llm.base_url);
    println!(
        "  Completion key:   {}",
        config
            .llm
            .api_key
            .as_deref()
            .map(mask_secret)
            .unwrap_or_else(|| "not set".to_string())
    );
    println!(
        "  Webhook:          {}",
        if config.webhook.url.is_some() { "set" } else { "not set" }
    );
    println!("  Per message:      {}", config.pipeline.max_articles_per_message);
    println!(
        "  Retries:          {} attempts, {}s rate-limit / {}s error backoff",
        config.pipeline.max_attempts,
        config.pipeline.rate_limit_delay_secs,
        config.pipeline.error_delay_secs
    );
    println!(
        "  Article failures: {:?}",
        config.pipeline.article_failure_policy
    );
    println!("  Queries:");
    for query in &config.pipeline.queries {
        println!("    - {}", query);
    }

    if config.llm.api_key.is_none() {
        println!(
            "{}",
            status_line(Status::Partial, None, "OPENAI_API_KEY is required for `run`")
        );
    }
    if config.webhook.url.is_none() {
        println!(
            "{}",
            status_line(
                Status::Partial,
                None,
                "TEAMS_WEBHOOK_URL is required for `run` without --dry-run"
            )
        );
    }
}
