use std::{future::Future, sync::Arc};

use futures::Stream;
use sea_orm::{
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, Set, sea_query::OnConflict,
};
use tokio::sync::watch;
use tracing::debug;

use crate::{
    entities::watchlist,
    error::AppResult,
    models::{Film, FilmDetail, WatchlistEntry},
    now_ms,
};

/// Locally persisted watchlist, one row per film id.
///
/// Every mutation bumps a revision on a watch channel; the `observe_*`
/// streams re-run their query whenever the revision moves.
#[derive(Clone)]
pub struct WatchlistStore {
    db: DatabaseConnection,
    changes: Arc<watch::Sender<u64>>,
}

impl WatchlistStore {
    pub fn new(db: DatabaseConnection) -> Self {
        let (changes, _) = watch::channel(0);
        Self { db, changes: Arc::new(changes) }
    }

    /// Inserts the entry, replacing any existing row for the same film.
    pub async fn add(&self, entry: &WatchlistEntry) -> AppResult<()> {
        let model = watchlist::ActiveModel {
            id: Set(entry.id),
            title: Set(entry.title.clone()),
            overview: Set(entry.overview.clone()),
            poster_path: Set(entry.poster_path.clone()),
            vote_average: Set(entry.vote_average),
            release_date: Set(entry.release_date.clone()),
            added_date: Set(entry.added_date),
        };

        watchlist::Entity::insert(model)
            .on_conflict(
                OnConflict::column(watchlist::Column::Id)
                    .update_columns([
                        watchlist::Column::Title,
                        watchlist::Column::Overview,
                        watchlist::Column::PosterPath,
                        watchlist::Column::VoteAverage,
                        watchlist::Column::ReleaseDate,
                        watchlist::Column::AddedDate,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        debug!(film_id = entry.id, "added to watchlist");
        self.notify();
        Ok(())
    }

    pub async fn add_film(&self, film: &Film) -> AppResult<WatchlistEntry> {
        let entry = WatchlistEntry::from_film(film, now_ms());
        self.add(&entry).await?;
        Ok(entry)
    }

    pub async fn add_detail(&self, detail: &FilmDetail) -> AppResult<WatchlistEntry> {
        let entry = WatchlistEntry::from_detail(detail, now_ms());
        self.add(&entry).await?;
        Ok(entry)
    }

    /// Returns whether a row was deleted.
    pub async fn remove(&self, film_id: i32) -> AppResult<bool> {
        let res = watchlist::Entity::delete_by_id(film_id).exec(&self.db).await?;
        let removed = res.rows_affected > 0;
        if removed {
            debug!(film_id = film_id, "removed from watchlist");
            self.notify();
        }
        Ok(removed)
    }

    /// Flips membership and returns the new state. Not atomic across callers.
    pub async fn toggle(&self, film: &Film) -> AppResult<bool> {
        if self.contains(film.id).await? {
            self.remove(film.id).await?;
            Ok(false)
        } else {
            self.add_film(film).await?;
            Ok(true)
        }
    }

    pub async fn clear(&self) -> AppResult<u64> {
        let res = watchlist::Entity::delete_many().exec(&self.db).await?;
        debug!(rows = res.rows_affected, "cleared watchlist");
        self.notify();
        Ok(res.rows_affected)
    }

    /// Newest first.
    pub async fn entries(&self) -> AppResult<Vec<WatchlistEntry>> {
        let rows = watchlist::Entity::find()
            .order_by_desc(watchlist::Column::AddedDate)
            .order_by_desc(watchlist::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(into_entry).collect())
    }

    pub async fn get(&self, film_id: i32) -> AppResult<Option<WatchlistEntry>> {
        let row = watchlist::Entity::find_by_id(film_id).one(&self.db).await?;
        Ok(row.map(into_entry))
    }

    pub async fn contains(&self, film_id: i32) -> AppResult<bool> {
        Ok(self.get(film_id).await?.is_some())
    }

    pub async fn count(&self) -> AppResult<u64> {
        Ok(watchlist::Entity::find().count(&self.db).await?)
    }

    pub fn observe_entries(
        &self,
    ) -> impl Stream<Item = AppResult<Vec<WatchlistEntry>>> + Send + 'static + use<> {
        self.observe(|store| async move { store.entries().await })
    }

    pub fn observe_contains(
        &self,
        film_id: i32,
    ) -> impl Stream<Item = AppResult<bool>> + Send + 'static + use<> {
        self.observe(move |store| async move { store.contains(film_id).await })
    }

    pub fn observe_count(&self) -> impl Stream<Item = AppResult<u64>> + Send + 'static + use<> {
        self.observe(|store| async move { store.count().await })
    }

    fn observe<T, F, Fut>(&self, query: F) -> impl Stream<Item = AppResult<T>> + Send + 'static + use<T, F, Fut>
    where
        T: Send + 'static,
        F: Fn(WatchlistStore) -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<T>> + Send + 'static,
    {
        let store = self.clone();
        let mut changes = self.changes.subscribe();
        async_stream::stream! {
            loop {
                changes.borrow_and_update();
                yield query(store.clone()).await;
                if changes.changed().await.is_err() {
                    break;
                }
            }
        }
    }

    fn notify(&self) {
        self.changes.send_modify(|rev| *rev = rev.wrapping_add(1));
    }
}

fn into_entry(row: watchlist::Model) -> WatchlistEntry {
    WatchlistEntry {
        id: row.id,
        title: row.title,
        overview: row.overview,
        poster_path: row.poster_path,
        vote_average: row.vote_average,
        release_date: row.release_date,
        added_date: row.added_date,
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::db;

    async fn store() -> WatchlistStore {
        let db = db::connect_and_migrate("sqlite::memory:").await.unwrap();
        WatchlistStore::new(db)
    }

    fn film(id: i32) -> Film {
        Film {
            id,
            title: Some(format!("Film {id}")),
            overview: Some("overview".into()),
            poster_path: Some(format!("/{id}.jpg")),
            vote_average: Some(6.5),
            release_date: Some("2020-01-01".into()),
        }
    }

    fn entry(id: i32, added_date: i64) -> WatchlistEntry {
        WatchlistEntry::from_film(&film(id), added_date)
    }

    #[tokio::test]
    async fn add_then_remove_flips_membership() {
        let store = store().await;

        store.add_film(&film(1)).await.unwrap();
        assert!(store.contains(1).await.unwrap());

        assert!(store.remove(1).await.unwrap());
        assert!(!store.contains(1).await.unwrap());
    }

    #[tokio::test]
    async fn adding_twice_keeps_one_row() {
        let store = store().await;

        store.add(&entry(5, 1_000)).await.unwrap();
        store.add(&entry(5, 2_000)).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.get(5).await.unwrap().unwrap().added_date, 2_000);
    }

    #[tokio::test]
    async fn removing_absent_film_is_a_noop() {
        let store = store().await;
        store.add(&entry(1, 1)).await.unwrap();

        assert!(!store.remove(99).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn toggle_alternates_membership() {
        let store = store().await;
        let film = film(3);

        assert!(store.toggle(&film).await.unwrap());
        assert!(store.contains(3).await.unwrap());
        assert!(!store.toggle(&film).await.unwrap());
        assert!(!store.contains(3).await.unwrap());
    }

    #[tokio::test]
    async fn clear_empties_everything() {
        let store = store().await;
        for id in 1..=4 {
            store.add(&entry(id, id as i64)).await.unwrap();
        }

        assert_eq!(store.clear().await.unwrap(), 4);
        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(store.clear().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn entries_are_newest_first() {
        let store = store().await;
        store.add(&entry(1, 100)).await.unwrap();
        store.add(&entry(2, 300)).await.unwrap();
        store.add(&entry(3, 200)).await.unwrap();

        let ids: Vec<i32> = store.entries().await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, [2, 3, 1]);
    }

    #[tokio::test]
    async fn detail_conversion_keeps_release_date() {
        let store = store().await;
        let detail = FilmDetail {
            id: 11,
            title: None,
            overview: None,
            poster_path: None,
            backdrop_path: None,
            vote_average: None,
            release_date: Some("1977-05-25".into()),
            runtime: Some(121),
            genres: Vec::new(),
        };
        store.add_detail(&detail).await.unwrap();

        let stored = store.get(11).await.unwrap().unwrap();
        assert_eq!(stored.title, "Unknown Title");
        assert_eq!(stored.release_date.as_deref(), Some("1977-05-25"));
        assert_eq!(stored.vote_average, 0.0);
    }

    #[tokio::test]
    async fn observers_see_every_mutation() {
        let store = store().await;
        let mut entries = Box::pin(store.observe_entries());
        let mut member = Box::pin(store.observe_contains(8));

        assert!(entries.next().await.unwrap().unwrap().is_empty());
        assert!(!member.next().await.unwrap().unwrap());

        store.add_film(&film(8)).await.unwrap();
        assert_eq!(entries.next().await.unwrap().unwrap().len(), 1);
        assert!(member.next().await.unwrap().unwrap());

        store.clear().await.unwrap();
        assert!(entries.next().await.unwrap().unwrap().is_empty());
        assert!(!member.next().await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn count_observer_tracks_size() {
        let store = store().await;
        let mut count = Box::pin(store.observe_count());
        assert_eq!(count.next().await.unwrap().unwrap(), 0);

        store.add(&entry(1, 1)).await.unwrap();
        assert_eq!(count.next().await.unwrap().unwrap(), 1);
    }
}
