//! Blob store over the `audio_files` table

use crate::error::Result;
use bytes::Bytes;
use sqlx::{Executor, Sqlite};

/// Raw audio bytes keyed by track id.
///
/// Every operation takes an executor so callers can run it on the pool or
/// inside a transaction shared with [`MetadataStore`](super::MetadataStore).
pub struct BlobStore;

impl BlobStore {
    /// Insert audio for `id`. Fails if audio already exists for the id.
    pub async fn put<'c, E>(executor: E, id: &str, data: &[u8]) -> Result<()>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        sqlx::query("INSERT INTO audio_files (id, data) VALUES (?, ?)")
            .bind(id)
            .bind(data)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn get<'c, E>(executor: E, id: &str) -> Result<Option<Bytes>>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let data: Option<Vec<u8>> =
            sqlx::query_scalar("SELECT data FROM audio_files WHERE id = ?")
                .bind(id)
                .fetch_optional(executor)
                .await?;
        Ok(data.map(Bytes::from))
    }

    /// Returns whether anything was deleted.
    pub async fn delete<'c, E>(executor: E, id: &str) -> Result<bool>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM audio_files WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns the number of blobs deleted.
    pub async fn clear<'c, E>(executor: E) -> Result<u64>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM audio_files")
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::error::LibraryError;

    #[tokio::test]
    async fn test_put_and_get() {
        let pool = create_test_pool().await.unwrap();
        BlobStore::put(&pool, "t1", b"ID3\x04").await.unwrap();

        let data = BlobStore::get(&pool, "t1").await.unwrap().unwrap();
        assert_eq!(&data[..], b"ID3\x04");
        assert!(BlobStore::get(&pool, "t2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let pool = create_test_pool().await.unwrap();
        BlobStore::put(&pool, "t1", b"a").await.unwrap();

        let result = BlobStore::put(&pool, "t1", b"b").await;
        assert!(matches!(result, Err(LibraryError::Database(_))));
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let pool = create_test_pool().await.unwrap();
        BlobStore::put(&pool, "t1", b"a").await.unwrap();
        BlobStore::put(&pool, "t2", b"b").await.unwrap();

        assert!(BlobStore::delete(&pool, "t1").await.unwrap());
        assert!(!BlobStore::delete(&pool, "t1").await.unwrap());
        assert_eq!(BlobStore::clear(&pool).await.unwrap(), 1);
        assert_eq!(BlobStore::clear(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rolled_back_put_leaves_nothing() {
        let pool = create_test_pool().await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        BlobStore::put(&mut *tx, "t1", b"a").await.unwrap();
        tx.rollback().await.unwrap();

        assert!(BlobStore::get(&pool, "t1").await.unwrap().is_none());
    }
}
