//! Metadata store over the `tracks` table

use crate::error::{LibraryError, Result};
use crate::models::Track;
use sqlx::{Executor, Sqlite};

/// Track records keyed by id, listed in id order.
pub struct MetadataStore;

impl MetadataStore {
    /// Insert a new record. Fails if the id is taken or the record is invalid.
    pub async fn insert<'c, E>(executor: E, track: &Track) -> Result<()>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        track.validate().map_err(LibraryError::InvalidTrack)?;

        sqlx::query(
            r#"
            INSERT INTO tracks (
                id, name, original_name, size, mime_type,
                date_added, duration, artist, album, title
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&track.id)
        .bind(&track.name)
        .bind(&track.original_name)
        .bind(track.size)
        .bind(&track.mime_type)
        .bind(&track.date_added)
        .bind(track.duration)
        .bind(&track.artist)
        .bind(&track.album)
        .bind(&track.title)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn get<'c, E>(executor: E, id: &str) -> Result<Option<Track>>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let track = sqlx::query_as::<_, Track>("SELECT * FROM tracks WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(track)
    }

    pub async fn list<'c, E>(executor: E) -> Result<Vec<Track>>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let tracks = sqlx::query_as::<_, Track>("SELECT * FROM tracks ORDER BY id")
            .fetch_all(executor)
            .await?;
        Ok(tracks)
    }

    /// Returns whether anything was deleted.
    pub async fn delete<'c, E>(executor: E, id: &str) -> Result<bool>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM tracks WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns the number of records deleted.
    pub async fn clear<'c, E>(executor: E) -> Result<u64>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM tracks").execute(executor).await?;
        Ok(result.rows_affected())
    }

    /// Record count and summed `size`.
    pub async fn totals<'c, E>(executor: E) -> Result<(u64, u64)>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let (count, total): (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(size), 0) FROM tracks")
                .fetch_one(executor)
                .await?;
        Ok((count.max(0) as u64, total.max(0) as u64))
    }
}
