//! snapvcs command-line interface.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use snapvcs::{CheckoutMode, CheckoutOptions, OpenOptions, Repository};

/// snapvcs - snapshot tracked files into a content-addressed store
#[derive(Parser)]
#[command(name = "snapvcs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Working directory the tracked paths are relative to
    #[arg(short = 'C', long, env = "SNAPVCS_WORK_DIR", default_value = ".", global = true)]
    work_dir: PathBuf,

    /// Name of the repository directory inside the working directory
    #[arg(long, env = "SNAPVCS_REPO_DIR", default_value = snapvcs::DEFAULT_REPO_DIR, global = true)]
    repo_dir: String,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the repository directory
    Init,
    /// Start tracking files
    Add {
        /// Files to track
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Show tracked files
    Status,
    /// Snapshot tracked files
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },
    /// Show commit history
    Log {
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Restore files from a commit
    Checkout {
        /// Commit digest or unique prefix
        commit: String,
        /// Keep going when a file cannot be restored
        #[arg(long)]
        best_effort: bool,
    },
    /// Show the files recorded in a commit
    Show {
        /// Commit digest or unique prefix
        commit: String,
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Verify every stored object
    Fsck,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let options = OpenOptions {
        create: false,
        dir: Some(cli.repo_dir),
    };

    match cli.command {
        Commands::Init => {
            let repo = Repository::init(&cli.work_dir, options)?;
            println!("Initialized repository in {}", repo.root().display());
        }
        Commands::Add { paths } => {
            let repo = Repository::open(&cli.work_dir, options)?;
            for path in repo.add(paths.as_slice())? {
                println!("{}", path);
            }
        }
        Commands::Status => {
            let repo = Repository::open(&cli.work_dir, options)?;
            let tracked = repo.tracked()?;
            if tracked.is_empty() {
                println!("No files tracked");
            } else {
                println!("Files tracked are");
                for path in tracked {
                    println!("{}", path);
                }
            }
        }
        Commands::Commit { message } => {
            let repo = Repository::open(&cli.work_dir, options)?;
            let digest = repo.commit(&message)?;
            println!("Commit is {}", digest);
        }
        Commands::Log { json } => {
            let repo = Repository::open(&cli.work_dir, options)?;
            let entries = repo.log()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in entries {
                    println!("{}{}", snapvcs::history::HASH_PREFIX, entry.commit);
                    println!("{}{}", snapvcs::history::MESSAGE_PREFIX, entry.message);
                }
            }
        }
        Commands::Checkout {
            commit,
            best_effort,
        } => {
            let repo = Repository::open(&cli.work_dir, options)?;
            let mode = if best_effort {
                CheckoutMode::BestEffort
            } else {
                CheckoutMode::Strict
            };
            let report = repo.checkout(&commit, CheckoutOptions { mode })?;
            for path in &report.restored {
                println!("restored {}", path);
            }
            // Each failure was already logged at warn level.
            report.finalize()?;
        }
        Commands::Show { commit, json } => {
            let repo = Repository::open(&cli.work_dir, options)?;
            let record = repo.show(&commit)?;
            if json {
                let entries: Vec<_> = record.entries().collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print!("{}", record.encode());
            }
        }
        Commands::Fsck => {
            let repo = Repository::open(&cli.work_dir, options)?;
            let report = repo.fsck()?;
            for problem in &report.problems {
                println!("{}: {}", problem.object, problem.message);
            }
            println!(
                "checked {} blobs, {} commits, {} log entries",
                report.blobs_checked, report.commits_checked, report.log_entries_checked
            );
            if !report.is_clean() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
