//! Command-line front end
//!
//! Parses arguments into a [`Command`], runs it against the [`SongService`]
//! and renders the outcome as plain text or JSON.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::database::{DbCategory, DbSong, Direction, SongFilter, SongForm};
use crate::error::Result;
use crate::service::SongService;

#[derive(Debug, Parser)]
#[command(name = "songbook", version, about = "Manage an ordered list of songs and chord sheets")]
pub struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true, env = "SONGBOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database file, overrides the settings file
    #[arg(long, global = true, env = "SONGBOOK_DATABASE")]
    pub database: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List songs in display order
    List {
        /// Only songs in this category
        #[arg(long)]
        category: Option<i64>,
        /// Case-sensitive text to find in title or artist
        #[arg(long)]
        search: Option<String>,
    },
    /// Add a song at the end of the list
    Add(SongArgs),
    /// Edit a song, keeping its position
    Update {
        id: i64,
        #[command(flatten)]
        song: SongArgs,
    },
    /// Delete a song
    Delete { id: i64 },
    /// Move a song one step up or down
    Move { id: i64, direction: Direction },
    /// List categories
    Categories,
    /// Create a category
    AddCategory { name: String },
}

#[derive(Debug, Clone, Args)]
pub struct SongArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub artist: String,
    /// Category id
    #[arg(long)]
    pub category: Option<i64>,
    /// Link to a chord sheet (http or https)
    #[arg(long)]
    pub chord_url: Option<String>,
}

impl From<SongArgs> for SongForm {
    fn from(args: SongArgs) -> Self {
        Self {
            title: args.title,
            artist: args.artist,
            category_id: args.category,
            chord_url: args.chord_url,
        }
    }
}

/// Run a command and render its result
pub async fn run(service: &SongService, command: Command, json: bool) -> Result<String> {
    match command {
        Command::List { category, search } => {
            let filter = SongFilter {
                category_id: category,
                search,
            };
            let songs = service.list(filter).await?;
            Ok(if json {
                to_json(&songs)
            } else {
                render_songs(&songs)
            })
        }
        Command::Add(args) => {
            let song = service.add(args.into()).await?;
            Ok(if json {
                to_json(&song)
            } else {
                format!("Added song '{}' at position {}", song.title, song.order)
            })
        }
        Command::Update { id, song } => {
            let song = service.update(id, song.into()).await?;
            Ok(if json {
                to_json(&song)
            } else {
                format!("Updated song '{}'", song.title)
            })
        }
        Command::Delete { id } => {
            let song = service.delete(id).await?;
            Ok(if json {
                to_json(&song)
            } else {
                format!("Deleted song '{}'", song.title)
            })
        }
        Command::Move { id, direction } => {
            let moved = service.move_song(id, direction).await?;
            Ok(if json {
                to_json(&serde_json::json!({ "id": id, "direction": direction, "moved": moved }))
            } else if moved {
                "Song order updated".to_string()
            } else {
                match direction {
                    Direction::Up => "Song is already first".to_string(),
                    Direction::Down => "Song is already last".to_string(),
                }
            })
        }
        Command::Categories => {
            let categories = service.categories().await?;
            Ok(if json {
                to_json(&categories)
            } else {
                render_categories(&categories)
            })
        }
        Command::AddCategory { name } => {
            let category = service.add_category(&name).await?;
            Ok(if json {
                to_json(&category)
            } else {
                format!("Added category '{}' (id {})", category.name, category.id)
            })
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

fn render_songs(songs: &[DbSong]) -> String {
    if songs.is_empty() {
        return "No songs".to_string();
    }

    songs
        .iter()
        .map(|song| {
            let mut line = format!(
                "{:>3}. [{}] {} - {}",
                song.order, song.id, song.title, song.artist
            );
            if let Some(category) = &song.category {
                line.push_str(&format!(" ({})", category.name));
            }
            if let Some(url) = &song.chord_url {
                line.push_str(&format!(" <{url}>"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_categories(categories: &[DbCategory]) -> String {
    if categories.is_empty() {
        return "No categories".to_string();
    }

    categories
        .iter()
        .map(|c| format!("{:>3}. {}", c.id, c.name))
        .collect::<Vec<_>>()
        .join("\n")
}
