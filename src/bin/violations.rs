//! violations - inspect and maintain the violations database.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use ridesecure::{AppConfig, SqliteViolationStore, Violation, ViolationStore};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the violations database.
    #[arg(long, env = "RIDESECURE_DB_PATH")]
    db_path: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all violations, most recent first.
    List {
        /// Show at most this many rows.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List violations whose plate contains the given text.
    Search { plate: String },
    /// Set a violation's status (e.g. PROCESSED).
    Mark { id: i64, status: String },
    /// Delete one violation.
    Delete { id: i64 },
    /// Delete every violation.
    Clear {
        /// Required confirmation.
        #[arg(long)]
        yes: bool,
    },
    /// Aggregate counts and average confidence.
    Stats,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    let cfg = AppConfig::load()?;
    let db_path = args.db_path.unwrap_or(cfg.db_path);
    let mut store = SqliteViolationStore::open(&db_path)?;

    match args.command {
        Command::List { limit } => {
            let rows = store.list_all()?;
            let shown = limit.unwrap_or(rows.len());
            print_rows(rows.iter().take(shown));
            if shown < rows.len() {
                println!("... {} more", rows.len() - shown);
            }
        }
        Command::Search { plate } => {
            let rows = store.list_by_license_plate(&plate)?;
            if rows.is_empty() {
                println!("no violations matching '{}'", plate);
            } else {
                print_rows(rows.iter());
            }
        }
        Command::Mark { id, status } => {
            if store.update_status(id, &status)? {
                println!("violation {} marked {}", id, status);
            } else {
                return Err(anyhow!("no violation with id {}", id));
            }
        }
        Command::Delete { id } => {
            if store.delete(id)? {
                println!("violation {} deleted", id);
            } else {
                return Err(anyhow!("no violation with id {}", id));
            }
        }
        Command::Clear { yes } => {
            if !yes {
                return Err(anyhow!("refusing to clear without --yes"));
            }
            let removed = store.delete_all()?;
            println!("cleared {} violations", removed);
        }
        Command::Stats => {
            let stats = store.stats()?;
            println!("total:      {}", stats.total);
            println!("pending:    {}", stats.pending);
            println!("processed:  {}", stats.processed);
            println!(
                "confidence: {:.1}% average",
                stats.average_confidence * 100.0
            );
        }
    }
    Ok(())
}

fn print_rows<'a>(rows: impl Iterator<Item = &'a Violation>) {
    println!(
        "{:>5}  {:<20}  {:<11}  {:>6}  {:>6}  {:<10}  {}",
        "id", "timestamp", "plate", "frame", "conf", "status", "source"
    );
    for v in rows {
        println!(
            "{:>5}  {:<20}  {:<11}  {:>6}  {:>5.1}%  {:<10}  {}",
            v.id.unwrap_or(-1),
            v.timestamp.format("%Y-%m-%d %H:%M:%S"),
            v.license_plate.as_deref().unwrap_or("-"),
            v.frame_number,
            v.detection_confidence * 100.0,
            v.status,
            v.video_source
        );
    }
}
