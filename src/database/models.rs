//! Database models for persistent storage
//! These models map directly to SQLite tables

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;

use crate::error::{Error, Result};

/// Song category
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct DbCategory {
    /// Unique identifier (auto-increment)
    pub id: i64,
    /// Display name, unique across categories
    pub name: String,
}

/// Song with its category resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbSong {
    /// Unique identifier (auto-increment)
    pub id: i64,
    /// Song title
    pub title: String,
    /// Artist name
    pub artist: String,
    /// Category reference, if any
    pub category_id: Option<i64>,
    /// Category joined from `categories`
    pub category: Option<DbCategory>,
    /// Display position, dense and zero-based across the catalog
    pub order: i64,
    /// Link to an external chord sheet
    pub chord_url: Option<String>,
    /// Created timestamp
    pub created_at: i64,
    /// Last modified timestamp (reordering does not touch it)
    pub updated_at: i64,
}

/// Raw row of `songs LEFT JOIN categories`
#[derive(Debug, FromRow)]
pub(crate) struct SongRow {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub sort_order: i64,
    pub chord_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<SongRow> for DbSong {
    fn from(row: SongRow) -> Self {
        let category = row
            .category_id
            .zip(row.category_name)
            .map(|(id, name)| DbCategory { id, name });

        Self {
            id: row.id,
            title: row.title,
            artist: row.artist,
            category_id: row.category_id,
            category,
            order: row.sort_order,
            chord_url: row.chord_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ============ Input structs ============

/// Editable song fields, shared by add and update.
///
/// `order` is deliberately absent: it is assigned on insert and only changed
/// by move/delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongForm {
    pub title: String,
    pub artist: String,
    pub category_id: Option<i64>,
    pub chord_url: Option<String>,
}

impl SongForm {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_chord_url(mut self, chord_url: impl Into<String>) -> Self {
        self.chord_url = Some(chord_url.into());
        self
    }

    /// Check required fields and normalize the form.
    ///
    /// Title and artist are trimmed and must be non-empty. A blank chord URL
    /// becomes `None`; anything else must be an absolute http(s) URL.
    pub fn validate(self) -> Result<Self> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::validation("title", "must not be empty"));
        }

        let artist = self.artist.trim();
        if artist.is_empty() {
            return Err(Error::validation("artist", "must not be empty"));
        }

        let chord_url = match self.chord_url.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let parsed = Url::parse(raw)
                    .map_err(|e| Error::validation("chord_url", e.to_string()))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(Error::validation(
                        "chord_url",
                        format!("unsupported scheme '{}'", parsed.scheme()),
                    ));
                }
                Some(raw.to_string())
            }
        };

        Ok(Self {
            title: title.to_string(),
            artist: artist.to_string(),
            category_id: self.category_id,
            chord_url,
        })
    }
}

/// Listing filter; both parts combine with AND
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SongFilter {
    /// Exact category match
    pub category_id: Option<i64>,
    /// Case-sensitive substring of title or artist
    pub search: Option<String>,
}

impl SongFilter {
    pub fn category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    /// Drop an empty search string so it is treated as "no search"
    pub fn normalized(mut self) -> Self {
        if self.search.as_deref().is_some_and(str::is_empty) {
            self.search = None;
        }
        self
    }
}

/// Direction for a one-step reorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(Error::validation(
                "direction",
                format!("expected 'up' or 'down', got '{other}'"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trims_fields() {
        let form = SongForm::new("  Yesterday ", "\tThe Beatles")
            .with_chord_url("  https://chords.example/yesterday  ")
            .validate()
            .unwrap();
        assert_eq!(form.title, "Yesterday");
        assert_eq!(form.artist, "The Beatles");
        assert_eq!(
            form.chord_url.as_deref(),
            Some("https://chords.example/yesterday")
        );
    }

    #[test]
    fn test_validate_rejects_blank_title_and_artist() {
        let err = SongForm::new("   ", "Artist").validate().unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "title"));

        let err = SongForm::new("Title", "").validate().unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "artist"));
    }

    #[test]
    fn test_validate_chord_url() {
        let form = SongForm::new("T", "A").with_chord_url("").validate().unwrap();
        assert_eq!(form.chord_url, None);

        let err = SongForm::new("T", "A")
            .with_chord_url("not a url")
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "chord_url"));

        let err = SongForm::new("T", "A")
            .with_chord_url("ftp://chords.example/a.txt")
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "chord_url"));
    }

    #[test]
    fn test_filter_normalized() {
        assert_eq!(SongFilter::default().search("").normalized().search, None);
        assert_eq!(
            SongFilter::default().search("abc").normalized().search.as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("up".parse::<Direction>().unwrap(), Direction::Up);
        assert_eq!("DOWN".parse::<Direction>().unwrap(), Direction::Down);
        assert!("sideways".parse::<Direction>().is_err());
        assert_eq!(Direction::Down.to_string(), "down");
    }

    #[test]
    fn test_song_row_resolves_category() {
        let row = SongRow {
            id: 1,
            title: "T".into(),
            artist: "A".into(),
            category_id: Some(4),
            category_name: Some("Worship".into()),
            sort_order: 0,
            chord_url: None,
            created_at: 10,
            updated_at: 10,
        };
        let song = DbSong::from(row);
        assert_eq!(
            song.category,
            Some(DbCategory {
                id: 4,
                name: "Worship".into()
            })
        );
        assert_eq!(song.order, 0);
    }
}
