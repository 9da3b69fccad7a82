//! Command-line front end for the snippet library.
//!
//! # Responsibility
//! - Build a `Session` from config/flags and run one use case per invocation.
//! - Render cached snapshots and user feedback as plain text.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use snipshelf_core::{
    init_logging, AppConfig, Feedback, ServiceError, Session, SnippetCategory, SnippetDraft,
};
use std::path::PathBuf;

const DEFAULT_DB_FILE: &str = "snipshelf.sqlite3";

#[derive(Debug, Parser)]
#[command(name = "snipshelf", version, about = "Organize reusable text snippets")]
struct Cli {
    /// TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file; overrides the config file.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level; overrides the config file.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List groups.
    Groups,
    /// Add a group.
    AddGroup { name: String },
    /// Delete a group.
    DeleteGroup { name: String },
    /// List categories with their snippets bucketed by group.
    List,
    /// Add an empty category.
    AddCategory { name: String },
    /// Delete a category and all its snippets.
    DeleteCategory { name: String },
    /// Persist whether a category is shown expanded.
    Expand {
        name: String,
        #[arg(long)]
        collapse: bool,
    },
    /// Create a snippet, or edit one when --id is given.
    SaveSnippet {
        #[arg(long)]
        category: String,
        #[arg(long)]
        group: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        id: Option<String>,
        /// One or more content lines.
        #[arg(required = true)]
        content: Vec<String>,
    },
    /// Delete a snippet from a category.
    DeleteSnippet {
        #[arg(long)]
        category: String,
        #[arg(long)]
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(&config.logging).context("failed to initialize logging")?;

    let mut session = Session::new(config.storage);
    if let Err(err) = session.connect().await {
        bail!("{}\n({err})", err.notice());
    }

    match run(&session, cli.command).await {
        Ok(()) => Ok(()),
        Err(err) => {
            log::warn!("event=cli_command module=cli status=error error={err}");
            match err.feedback() {
                Feedback::Field { field, message } => bail!("{field}: {message}"),
                Feedback::Notice(notice) => bail!("{notice}"),
            }
        }
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => {
            let mut config = AppConfig::default();
            config.storage.path = Some(PathBuf::from(DEFAULT_DB_FILE));
            config
        }
    };
    if let Some(db) = &cli.db {
        config.storage.path = Some(db.clone());
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    Ok(config)
}

async fn run(session: &Session, command: Command) -> Result<(), ServiceError> {
    let groups = session.groups();
    let snippets = session.snippets();

    match command {
        Command::Groups => {
            for group in groups.groups().iter() {
                println!("{}", group.name);
            }
        }
        Command::AddGroup { name } => {
            let group = groups.add_group(&name).await?;
            println!("New group has been added: {}", group.name);
        }
        Command::DeleteGroup { name } => {
            let name = groups.delete_group(&name).await?;
            println!("Group has been deleted: {name}");
        }
        Command::List => {
            for category in snippets.categories().iter() {
                print_category(category);
            }
        }
        Command::AddCategory { name } => {
            let category = snippets.add_category(&name).await?;
            println!("New category has been added: {}", category.name);
        }
        Command::DeleteCategory { name } => {
            let name = snippets.delete_category(&name).await?;
            println!("Category has been deleted: {name}");
        }
        Command::Expand { name, collapse } => {
            let category = snippets.set_category_expanded(&name, !collapse).await?;
            print_category(&category);
        }
        Command::SaveSnippet {
            category,
            group,
            name,
            id,
            content,
        } => {
            let requested = id.clone();
            let mut draft = SnippetDraft::new(group, name, content);
            draft.id = id;
            let snippet = snippets.save_snippet(&category, draft).await?;
            // An unknown id is saved as a new snippet under a fresh id.
            if requested.as_deref() == Some(snippet.id.as_str()) {
                println!("Snippet has been updated: {}", snippet.id);
            } else {
                println!("New snippet has been added: {}", snippet.id);
            }
        }
        Command::DeleteSnippet { category, id } => {
            snippets.delete_snippet(&category, &id).await?;
            println!("Snippet has been deleted: {id}");
        }
    }
    Ok(())
}

fn print_category(category: &SnippetCategory) {
    let marker = if category.expand.unwrap_or(false) { "-" } else { "+" };
    println!("{marker} {} ({})", category.name, category.snippets.len());
    for bucket in category.grouped_snippets() {
        println!("    {} : {}", bucket.group, bucket.snippets.len());
        for snippet in &bucket.snippets {
            println!("        [{}] {}", snippet.id, snippet.name);
            for block in &snippet.content {
                println!("            {}", block.value);
            }
        }
    }
}
