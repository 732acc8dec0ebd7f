//! Session Repository

use super::RepoResult;
use shared::models::Session;
use shared::util::now_millis;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, token: &str, expires_at: i64) -> RepoResult<Session> {
        let now = now_millis();
        sqlx::query("INSERT INTO sessions (token, created_at, expires_at) VALUES (?, ?, ?)")
            .bind(token)
            .bind(now)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(Session {
            token: token.to_string(),
            created_at: now,
            expires_at,
        })
    }

    pub async fn find(&self, token: &str) -> RepoResult<Option<Session>> {
        let row: Option<(String, i64, i64)> = sqlx::query_as(
            "SELECT token, created_at, expires_at FROM sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(token, created_at, expires_at)| Session {
            token,
            created_at,
            expires_at,
        }))
    }

    pub async fn delete(&self, token: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove expired sessions, returning how many were dropped
    pub async fn purge_expired(&self) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now_millis())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let pool = memory_pool().await.unwrap();
        let repo = SessionRepository::new(pool);

        let session = repo.insert("tok", now_millis() + 1000).await.unwrap();
        assert!(!session.is_expired(now_millis()));
        assert!(repo.find("tok").await.unwrap().is_some());

        assert!(repo.delete("tok").await.unwrap());
        assert!(repo.find("tok").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let pool = memory_pool().await.unwrap();
        let repo = SessionRepository::new(pool);

        repo.insert("old", now_millis() - 10).await.unwrap();
        repo.insert("new", now_millis() + 60_000).await.unwrap();

        assert_eq!(repo.purge_expired().await.unwrap(), 1);
        assert!(repo.find("old").await.unwrap().is_none());
        assert!(repo.find("new").await.unwrap().is_some());
    }
}
