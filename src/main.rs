use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use snapcheck_rs::engine::{ResolutionContext, RuleEngine};
use snapcheck_rs::validator::snapshot::{
    collection_map, populate_store, InMemorySnapshotStore, SnapshotLoader,
};
use snapcheck_rs::validator::testset::TestFileLoader;
use snapcheck_rs::validator::{server, BatchReport, BatchRunner, RuleStatus, ValidatorConfig};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a test file against a snapshot definition
    Check {
        /// Snapshot definition file
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Test file with the rules to run
        #[arg(short, long)]
        tests: PathBuf,

        /// Directory the snapshot node paths are relative to
        #[arg(short, long, default_value = ".")]
        base_dir: PathBuf,

        /// Evaluate rules concurrently
        #[arg(long)]
        concurrent: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Evaluate a single rule
    Eval {
        /// The rule text
        rule: String,

        /// JSON document for field paths
        #[arg(short, long)]
        document: Option<PathBuf>,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let mut config = ValidatorConfig::load(args.config.as_deref())?;

    match args.command {
        Commands::Check {
            snapshot,
            tests,
            base_dir,
            concurrent,
            json,
        } => {
            let snapshot_file = SnapshotLoader::load_file(&snapshot)
                .with_context(|| format!("loading {}", snapshot.display()))?;
            let test_file = TestFileLoader::load(&tests)
                .with_context(|| format!("loading {}", tests.display()))?;

            let store = InMemorySnapshotStore::new();
            populate_store(&snapshot_file, &base_dir, &store, &config.default_collection).await?;

            let collections = collection_map(&snapshot_file, &config.default_collection);
            let ctx = ResolutionContext::new(collections, Arc::new(store))
                .with_fetch_timeout(config.fetch_timeout());
            let runner = BatchRunner::new(RuleEngine::new(), Arc::new(ctx))
                .with_concurrency(config.concurrency);

            let cases = test_file.rule_cases();
            log::info!("Running {} rules", cases.len());
            let report = if concurrent {
                runner.run_concurrent(&cases).await
            } else {
                runner.run(&cases).await
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            if !report.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Eval { rule, document } => {
            let mut ctx =
                ResolutionContext::new(HashMap::new(), Arc::new(InMemorySnapshotStore::new()));
            if let Some(path) = document {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                ctx = ctx.with_default_document(serde_json::from_str(&content)?);
            }

            let result = RuleEngine::new().evaluate(&rule, &ctx).await?;
            println!("{}", result.diagnostics);
            if !result.verdict {
                std::process::exit(1);
            }
        }
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            server::serve(config).await?;
        }
    }

    Ok(())
}

fn print_report(report: &BatchReport) {
    for result in &report.results {
        match &result.status {
            RuleStatus::Passed => println!("PASS     {}  {}", result.id, result.rule),
            RuleStatus::Failed => {
                println!("FAIL     {}  {}", result.id, result.rule);
                if let Some(evaluation) = &result.result {
                    println!("         {}", evaluation.diagnostics);
                }
            }
            RuleStatus::Invalid { error } => {
                println!("INVALID  {}  {}", result.id, result.rule);
                println!("         {}", error);
            }
            RuleStatus::Cancelled => println!("SKIPPED  {}  {}", result.id, result.rule),
        }
    }
    if let Some(error) = &report.aborted {
        println!("Aborted: {}", error);
    }
    println!(
        "{} passed, {} failed, {} invalid, {} cancelled (run {})",
        report.passed(),
        report.failed(),
        report.invalid(),
        report.cancelled(),
        report.run_id
    );
}
