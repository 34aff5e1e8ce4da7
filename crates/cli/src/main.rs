//! PerkFinder command line.
//!
//! Usage:
//!     perkfinder search "nike" --user user-123
//!     perkfinder insights --profile profile.json
//!     perkfinder parse --file advice.txt --sequential
//!     perkfinder programs --user user-123
//!     perkfinder health
//!     perkfinder serve --addr 0.0.0.0:3000
//!
//! `--catalog-file catalog.json` switches every command to an offline catalog.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use perkfinder_advisory::{parse_with, ParseMode};
use perkfinder_api::AppState;
use perkfinder_backend::{
    AnalyticsSink, CatalogSource, FileCatalog, LogAnalytics, OpenAiConfig, OpenAiGenerator,
    PostgrestBackend, PostgrestConfig,
};
use perkfinder_explain::{describe_hit, summarize_result};
use perkfinder_model::{available_programs, BenefitProgram, InsightRecord, UserProfile};
use perkfinder_service::{InsightService, SearchService};

#[derive(Parser)]
#[command(name = "perkfinder")]
#[command(about = "Search card and loyalty offers and get benefit advice")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// PostgREST project URL
    #[arg(long, global = true, env = "PERKFINDER_REST_URL", default_value = "http://127.0.0.1:54321")]
    rest_url: String,

    /// PostgREST API key
    #[arg(long, global = true, env = "PERKFINDER_REST_KEY", default_value = "", hide_env_values = true)]
    rest_key: String,

    /// OpenAI API key
    #[arg(long, global = true, env = "OPENAI_API_KEY", default_value = "", hide_env_values = true)]
    openai_key: String,

    /// Read the catalog from a JSON file instead of PostgREST
    #[arg(long, global = true)]
    catalog_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search offers
    Search {
        /// Text to look for in offer titles, merchants, programs and categories
        query: String,

        /// User the search is logged for
        #[arg(short, long, env = "PERKFINDER_USER_ID")]
        user: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Generate advice for a user profile
    Insights {
        /// Path to a profile JSON file
        #[arg(short, long)]
        profile: PathBuf,

        /// Only accept section markers at line start
        #[arg(long)]
        sequential: bool,
    },

    /// Segment advisory text read from a file or stdin
    Parse {
        /// Text file to parse (stdin if omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Only accept section markers at line start
        #[arg(long)]
        sequential: bool,
    },

    /// List benefit programs
    Programs {
        /// Only the programs this user enrolled in
        #[arg(short, long, env = "PERKFINDER_USER_ID")]
        user: Option<String>,

        /// With --user: active programs the user has not enrolled in yet
        #[arg(long, requires = "user")]
        available: bool,
    },

    /// Check catalog health
    Health,

    /// Run the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("perkfinder=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Search {
            query,
            user,
            format,
        } => {
            let (catalog, analytics) = collaborators(&cli)?;
            run_search(SearchService::new(catalog, analytics), query, user.clone(), format).await?;
        }
        Commands::Insights {
            profile,
            sequential,
        } => {
            run_insights(&cli, profile, parse_mode(*sequential)).await?;
        }
        Commands::Parse { file, sequential } => {
            run_parse(file.as_deref(), parse_mode(*sequential))?;
        }
        Commands::Programs { user, available } => {
            let (catalog, _) = collaborators(&cli)?;
            run_programs(catalog.as_ref(), user.as_deref(), *available).await?;
        }
        Commands::Health => {
            run_health(&cli).await?;
        }
        Commands::Serve { addr } => {
            let (catalog, analytics) = collaborators(&cli)?;
            let search = SearchService::new(catalog, analytics);
            let insights = InsightService::new(Arc::new(generator(&cli)?));
            run_serve(AppState::new(search, insights), addr).await?;
        }
    }

    Ok(())
}

fn parse_mode(sequential: bool) -> ParseMode {
    if sequential {
        ParseMode::Sequential
    } else {
        ParseMode::Lenient
    }
}

fn postgrest(cli: &Cli) -> Result<PostgrestBackend> {
    let config = PostgrestConfig {
        base_url: cli.rest_url.clone(),
        api_key: cli.rest_key.clone(),
        ..Default::default()
    };
    Ok(PostgrestBackend::new(config)?)
}

/// Catalog and analytics for the selected mode.
fn collaborators(cli: &Cli) -> Result<(Arc<dyn CatalogSource>, Arc<dyn AnalyticsSink>)> {
    match &cli.catalog_file {
        Some(path) => {
            let catalog = FileCatalog::load(path)
                .with_context(|| format!("loading catalog file {}", path.display()))?;
            let catalog: Arc<dyn CatalogSource> = Arc::new(catalog);
            let analytics: Arc<dyn AnalyticsSink> = Arc::new(LogAnalytics);
            Ok((catalog, analytics))
        }
        None => {
            let backend = Arc::new(postgrest(cli)?);
            let catalog: Arc<dyn CatalogSource> = backend.clone();
            let analytics: Arc<dyn AnalyticsSink> = backend;
            Ok((catalog, analytics))
        }
    }
}

fn generator(cli: &Cli) -> Result<OpenAiGenerator> {
    let config = OpenAiConfig {
        api_key: cli.openai_key.clone(),
        ..Default::default()
    };
    Ok(OpenAiGenerator::new(config)?)
}

async fn run_search(
    service: SearchService,
    query: &str,
    user: Option<String>,
    format: &str,
) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let (result, report) = service.search_tracked(user, query, today).await;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", summarize_result(&result, query.trim()));
        println!("---");
        for (i, hit) in result.hits.iter().enumerate() {
            let card = describe_hit(hit);
            println!("\n{}. {}", i + 1, card.headline);
            println!("   {}", card.source);
            println!("   {}", card.benefit);
            if let Some(expiry) = &card.expiry {
                println!("   {} ({:?})", expiry.text, expiry.emphasis);
            }
            if let Some(badge) = card.badge {
                println!("   * {}", badge);
            }
        }
    }

    if let Some(report) = report {
        report.await?;
    }
    Ok(())
}

fn print_insights(record: &InsightRecord) {
    if record.is_unstructured() {
        println!("{}", record.raw);
        return;
    }
    for (heading, text) in record.sections() {
        if !text.is_empty() {
            println!("{}:\n  {}\n", heading, text);
        }
    }
}

async fn run_insights(cli: &Cli, profile_path: &Path, mode: ParseMode) -> Result<()> {
    let json = std::fs::read_to_string(profile_path)
        .with_context(|| format!("reading profile {}", profile_path.display()))?;
    let profile: UserProfile = serde_json::from_str(&json).context("parsing profile JSON")?;

    let service = InsightService::new(Arc::new(generator(cli)?)).with_mode(mode);
    let record = service.generate(&profile).await?;
    print_insights(&record);
    Ok(())
}

fn run_parse(file: Option<&Path>, mode: ParseMode) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let record = parse_with(&text, mode);
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn print_programs(programs: &[BenefitProgram]) {
    for program in programs {
        match program.institution.as_ref() {
            Some(inst) => println!("- {} · {}", program.name, inst.display_name()),
            None => println!("- {}", program.name),
        }
    }
    println!("\nTotal: {} programs", programs.len());
}

async fn run_programs(catalog: &dyn CatalogSource, user: Option<&str>, available: bool) -> Result<()> {
    match (user, available) {
        (Some(user_id), true) => {
            let all = catalog.get_all_programs().await?;
            let enrolled = catalog.get_user_programs(user_id).await?;
            print_programs(&available_programs(all, &enrolled));
        }
        (Some(user_id), false) => {
            let programs = catalog.get_user_programs(user_id).await?;
            for up in &programs {
                let name = up
                    .program
                    .as_ref()
                    .map(|p| p.name.as_str())
                    .unwrap_or(up.program_id.as_str());
                let primary = if up.is_primary { " (primary)" } else { "" };
                println!("- {}{}", up.user_nickname.as_deref().unwrap_or(name), primary);
            }
            println!("\nTotal: {} programs", programs.len());
        }
        (None, _) => print_programs(&catalog.get_all_programs().await?),
    }
    Ok(())
}

async fn run_health(cli: &Cli) -> Result<()> {
    if let Some(path) = &cli.catalog_file {
        print!("Checking catalog file {}... ", path.display());
        return match FileCatalog::load(path) {
            Ok(_) => {
                println!("OK");
                Ok(())
            }
            Err(e) => {
                println!("FAILED: {}", e);
                std::process::exit(1);
            }
        };
    }

    let backend = postgrest(cli)?;
    print!("Checking {} backend... ", backend.name());

    match backend.health_check().await {
        Ok(()) => {
            println!("OK");
            Ok(())
        }
        Err(e) => {
            println!("FAILED: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_serve(state: AppState, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!(addr = %addr, "Listening");

    axum::serve(listener, perkfinder_api::router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_connection_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "perkfinder",
            "search",
            "nike",
            "--rest-url",
            "https://abc.supabase.co",
            "--rest-key",
            "anon",
            "--openai-key",
            "sk-test",
        ])
        .unwrap();

        assert_eq!(cli.rest_url, "https://abc.supabase.co");
        assert_eq!(cli.rest_key, "anon");
        assert_eq!(cli.openai_key, "sk-test");
        assert!(matches!(cli.command, Commands::Search { .. }));
    }

    #[test]
    fn test_programs_available_flag() {
        let cli = Cli::try_parse_from(["perkfinder", "programs", "--user", "u1", "--available"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Programs { available: true, .. }
        ));
    }
}
