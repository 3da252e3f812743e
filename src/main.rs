//! Quire - Command-line entry point
//!
//! Inspects a blog repository and exercises the markdown pipeline without
//! an editor surface.

use clap::{Parser, Subcommand};
use log::{error, info};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use quire::api::ContentApi;
use quire::config::{get_config_file_path, load_config, save_config, Settings};
use quire::content::{dates, Repository};
use quire::markdown::{sanitize, to_html, to_markdown};
use quire::{Error, Result};

/// Application name constant.
const APP_NAME: &str = "Quire";

#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(about = "Editor core for a Jekyll-style blog")]
#[command(version)]
struct Cli {
    /// Blog root containing `_posts/` (overrides settings and BLOG_REPO_ROOT)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List posts and drafts, newest first
    List,
    /// Print a post as JSON
    Show { id: String },
    /// Print the sanitized HTML of a post body
    Render { id: String },
    /// Convert a markdown file to HTML and back
    Roundtrip { file: PathBuf },
    /// Show the color theme, or toggle it
    Theme {
        #[arg(value_parser = ["toggle"])]
        action: Option<String>,
    },
    /// Inspect or commit post changes
    Git {
        #[command(subcommand)]
        action: GitCommand,
    },
}

#[derive(Subcommand, Debug)]
enum GitCommand {
    /// Show the branch and changed files under `_posts/` and `_drafts/`
    Status,
    /// Commit `_posts/` and `_drafts/`
    Commit {
        #[arg(short, long)]
        message: String,
    },
}

fn load_settings(root: Option<PathBuf>) -> Settings {
    let mut settings = load_config();
    settings.apply_env(|key| std::env::var(key).ok());
    if let Some(root) = root {
        settings.repository.root = Some(root);
    }
    settings
}

fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(cli.root);

    match cli.command {
        Command::List => {
            let mut repo = Repository::from_settings(&settings)?;
            let posts = repo.list_posts()?;
            for post in &posts {
                println!(
                    "{:<9}  {:<16}  {}  ({})",
                    post.status.label(),
                    dates::display_date(post.date.as_deref()),
                    post.title,
                    post.id
                );
            }
            println!("{} post{}.", posts.len(), if posts.len() == 1 { "" } else { "s" });
        }
        Command::Show { id } => {
            let mut repo = Repository::from_settings(&settings)?;
            let post = repo.get_post(&id)?;
            println!("{}", serde_json::to_string_pretty(&post)?);
        }
        Command::Render { id } => {
            let mut repo = Repository::from_settings(&settings)?;
            let post = repo.get_post(&id)?;
            println!("{}", sanitize(&to_html(&post.body)));
        }
        Command::Roundtrip { file } => {
            let markdown = fs::read_to_string(&file).map_err(|source| Error::FileRead {
                path: file.clone(),
                source,
            })?;
            print!("{}", to_markdown(&sanitize(&to_html(&markdown))));
        }
        Command::Theme { action } => {
            let mut theme = settings.theme;
            if action.is_some() {
                // Save over the stored file so env and --root overrides stay out of it
                let mut stored = load_config();
                stored.theme = stored.theme.toggle();
                save_config(&stored)?;
                theme = stored.theme;
                if let Ok(path) = get_config_file_path() {
                    info!("Saved theme to {}", path.display());
                }
            }
            println!("{}", theme.as_str());
        }
        Command::Git { action } => {
            let repo = Repository::from_settings(&settings)?;
            match action {
                GitCommand::Status => {
                    let status = repo.git().status()?;
                    println!(
                        "On {} (ahead {}, behind {})",
                        status.branch.as_deref().unwrap_or("detached HEAD"),
                        status.ahead,
                        status.behind
                    );
                    for file in &status.files {
                        println!("  {:<2}  {}", file.status, file.path);
                    }
                    if status.files.is_empty() {
                        println!("Nothing to commit.");
                    }
                }
                GitCommand::Commit { message } => {
                    repo.git().commit(&message)?;
                    println!("Committed.");
                }
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    info!("Starting {}", APP_NAME);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
