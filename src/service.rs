//! Song service
//!
//! Front door for callers: validates forms, keeps the catalog ordering dense
//! through the transactional [`Database`] operations, and memoizes listings
//! until the next mutation.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::database::{Database, DbCategory, DbSong, Direction, SongFilter, SongForm};
use crate::error::{Error, Result};

/// Distinct filters remembered between mutations
const MAX_CACHED_LISTINGS: usize = 32;

struct ListingCache {
    /// Bumped on every mutation so a listing read before it is never stored
    generation: u64,
    entries: LruCache<SongFilter, Vec<DbSong>>,
}

impl ListingCache {
    fn new(capacity: usize) -> Self {
        Self {
            generation: 0,
            entries: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }
}

pub struct SongService {
    db: Arc<Database>,
    listing_cache: Mutex<ListingCache>,
}

impl SongService {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            listing_cache: Mutex::new(ListingCache::new(MAX_CACHED_LISTINGS)),
        }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Songs matching the filter, ascending by order, categories attached
    pub async fn list(&self, filter: SongFilter) -> Result<Vec<DbSong>> {
        let filter = filter.normalized();

        let generation = {
            let mut cache = self.listing_cache.lock();
            if let Some(songs) = cache.entries.get(&filter) {
                tracing::debug!("Listing cache hit for {:?}", filter);
                return Ok(songs.clone());
            }
            cache.generation
        };

        let songs = self.db.find_songs(&filter).await?;

        let mut cache = self.listing_cache.lock();
        if cache.generation == generation {
            cache.entries.put(filter, songs.clone());
        }
        Ok(songs)
    }

    pub async fn get(&self, id: i64) -> Result<DbSong> {
        self.db
            .find_song(id)
            .await?
            .ok_or_else(|| Error::song_not_found(id))
    }

    /// Create a song at the end of the catalog
    pub async fn add(&self, form: SongForm) -> Result<DbSong> {
        let form = form.validate()?;
        let song = self.db.insert_song(&form).await?;
        self.invalidate_listings();

        tracing::info!(
            "Added song {} '{}' at position {}",
            song.id,
            song.title,
            song.order
        );
        Ok(song)
    }

    /// Replace a song's editable fields; its order is preserved
    pub async fn update(&self, id: i64, form: SongForm) -> Result<DbSong> {
        let form = form.validate()?;
        let song = self.db.update_song(id, &form).await?;
        self.invalidate_listings();

        tracing::info!("Updated song {} '{}'", song.id, song.title);
        Ok(song)
    }

    /// Remove a song and re-seal the ordering; returns the pre-delete snapshot
    pub async fn delete(&self, id: i64) -> Result<DbSong> {
        let song = self.db.delete_song(id).await?;
        self.invalidate_listings();

        tracing::info!("Deleted song {} '{}'", song.id, song.title);
        Ok(song)
    }

    /// Swap a song with its neighbor. Returns false for a boundary no-op.
    pub async fn move_song(&self, id: i64, direction: Direction) -> Result<bool> {
        let moved = self.db.move_song(id, direction).await?;
        if moved {
            self.invalidate_listings();
            tracing::info!("Moved song {} {}", id, direction);
        }
        Ok(moved)
    }

    pub async fn categories(&self) -> Result<Vec<DbCategory>> {
        self.db.find_categories().await
    }

    pub async fn add_category(&self, name: &str) -> Result<DbCategory> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("name", "must not be empty"));
        }

        let category = self.db.insert_category(name).await?;
        tracing::info!("Added category {} '{}'", category.id, category.name);
        Ok(category)
    }

    fn invalidate_listings(&self) {
        let mut cache = self.listing_cache.lock();
        cache.generation = cache.generation.wrapping_add(1);
        if !cache.entries.is_empty() {
            tracing::debug!("Invalidating {} cached listings", cache.entries.len());
            cache.entries.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> SongService {
        let db = Database::in_memory().await.unwrap();
        SongService::new(Arc::new(db))
    }

    fn orders(songs: &[DbSong]) -> Vec<(i64, i64)> {
        songs.iter().map(|s| (s.id, s.order)).collect()
    }

    #[tokio::test]
    async fn test_add_places_song_last() {
        let service = service().await;
        service.add(SongForm::new("First", "A")).await.unwrap();
        service.add(SongForm::new("Second", "B")).await.unwrap();
        let added = service.add(SongForm::new("Third", "C")).await.unwrap();

        let songs = service.list(SongFilter::default()).await.unwrap();
        assert_eq!(songs.last().map(|s| s.id), Some(added.id));
        assert_eq!(added.order, 2);
    }

    #[tokio::test]
    async fn test_add_rejects_missing_fields() {
        let service = service().await;
        let err = service.add(SongForm::new("", "A")).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(service.list(SongFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_order() {
        let service = service().await;
        let worship = service.add_category("Worship").await.unwrap();
        service.add(SongForm::new("Other", "X")).await.unwrap();
        let song = service.add(SongForm::new("Draft", "Someone")).await.unwrap();

        let updated = service
            .update(
                song.id,
                SongForm::new("Final", "Someone Else")
                    .with_category(worship.id)
                    .with_chord_url("https://chords.example/final"),
            )
            .await
            .unwrap();
        assert_eq!(updated.order, song.order);

        let listed = service.list(SongFilter::default()).await.unwrap();
        let listed = listed.iter().find(|s| s.id == song.id).unwrap();
        assert_eq!(listed.title, "Final");
        assert_eq!(listed.artist, "Someone Else");
        assert_eq!(listed.category, Some(worship));
        assert_eq!(listed.chord_url.as_deref(), Some("https://chords.example/final"));
        assert_eq!(listed.order, 1);
    }

    #[tokio::test]
    async fn test_update_unknown_song() {
        let service = service().await;
        let err = service
            .update(99, SongForm::new("T", "A"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "Song", id: 99 }));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let service = service().await;
        let hymns = service.add_category("Hymns").await.unwrap();
        let pop = service.add_category("Pop").await.unwrap();

        let amazing = service
            .add(SongForm::new("Amazing Grace", "John Newton").with_category(hymns.id))
            .await
            .unwrap();
        let grace = service
            .add(SongForm::new("Grace", "U2").with_category(pop.id))
            .await
            .unwrap();
        service
            .add(SongForm::new("Holy", "Justin Bieber"))
            .await
            .unwrap();

        let by_category = service
            .list(SongFilter::default().category(hymns.id))
            .await
            .unwrap();
        assert_eq!(orders(&by_category), vec![(amazing.id, 0)]);

        let by_search = service
            .list(SongFilter::default().search("Grace"))
            .await
            .unwrap();
        assert_eq!(
            by_search.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![amazing.id, grace.id]
        );

        // Case-sensitive
        let lower = service
            .list(SongFilter::default().search("grace"))
            .await
            .unwrap();
        assert!(lower.is_empty());

        // Artist match, combined with category
        let combined = service
            .list(SongFilter::default().category(pop.id).search("U2"))
            .await
            .unwrap();
        assert_eq!(orders(&combined), vec![(grace.id, 1)]);

        let none = service
            .list(SongFilter::default().category(hymns.id).search("U2"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_mutations_invalidate_listing_cache() {
        let service = service().await;
        let first = service.add(SongForm::new("One", "A")).await.unwrap();
        service.add(SongForm::new("Two", "B")).await.unwrap();

        let before = service.list(SongFilter::default()).await.unwrap();
        assert_eq!(before.len(), 2);

        service.move_song(first.id, Direction::Down).await.unwrap();
        let after_move = service.list(SongFilter::default()).await.unwrap();
        assert_eq!(after_move[1].id, first.id);

        service.delete(first.id).await.unwrap();
        let after_delete = service.list(SongFilter::default()).await.unwrap();
        assert_eq!(after_delete.len(), 1);
        assert_eq!(after_delete[0].order, 0);
    }

    #[tokio::test]
    async fn test_listing_cache_is_bounded() {
        let service = service().await;
        service.add(SongForm::new("Song 0", "A")).await.unwrap();

        for i in 0..MAX_CACHED_LISTINGS * 2 {
            let filter = SongFilter::default().search(format!("Song {i}"));
            service.list(filter).await.unwrap();
        }
        assert_eq!(service.listing_cache.lock().entries.len(), MAX_CACHED_LISTINGS);

        // The most recent filter is still served from the cache
        let last = SongFilter::default().search(format!("Song {}", MAX_CACHED_LISTINGS * 2 - 1));
        assert!(service.listing_cache.lock().entries.contains(&last));
        // The oldest one was evicted
        let first = SongFilter::default().search("Song 0");
        assert!(!service.listing_cache.lock().entries.contains(&first));
        assert_eq!(service.list(first).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_boundary_moves_return_false() {
        let service = service().await;
        let only = service.add(SongForm::new("Solo", "A")).await.unwrap();
        assert!(!service.move_song(only.id, Direction::Up).await.unwrap());
        assert!(!service.move_song(only.id, Direction::Down).await.unwrap());
        assert_eq!(service.get(only.id).await.unwrap().order, 0);
    }

    #[tokio::test]
    async fn test_categories() {
        let service = service().await;
        assert!(matches!(
            service.add_category("  ").await,
            Err(Error::Validation { .. })
        ));
        service.add_category("Pop").await.unwrap();
        service.add_category(" Hymns ").await.unwrap();

        let names: Vec<_> = service
            .categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Hymns", "Pop"]);
    }
}
