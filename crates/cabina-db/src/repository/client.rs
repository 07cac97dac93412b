//! # Client Repository
//!
//! Database operations for registered clients.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::repository::new_id;
use cabina_core::Client;

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Inserts a new client.
    pub async fn insert(&self, name: &str, nickname: Option<&str>) -> StoreResult<Client> {
        let client = Client {
            id: new_id(),
            name: name.to_string(),
            nickname: nickname.map(str::to_string),
            created_at: Utc::now(),
        };

        debug!(id = %client.id, name = %client.name, "Inserting client");

        sqlx::query(
            r#"
            INSERT INTO clients (id, name, nickname, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&client.id)
        .bind(&client.name)
        .bind(&client.nickname)
        .bind(client.created_at)
        .execute(&self.pool)
        .await?;

        Ok(client)
    }

    /// Gets a client by ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, name, nickname, created_at
            FROM clients
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    /// Searches clients by name or nickname prefix, for the picker.
    pub async fn search(&self, query: &str, limit: u32) -> StoreResult<Vec<Client>> {
        let pattern = format!("{}%", query.trim());

        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, name, nickname, created_at
            FROM clients
            WHERE name LIKE ?1 OR nickname LIKE ?1
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    /// Updates a client's name and nickname.
    pub async fn update_name(
        &self,
        id: &str,
        name: &str,
        nickname: Option<&str>,
    ) -> StoreResult<()> {
        let result = sqlx::query("UPDATE clients SET name = ?2, nickname = ?3 WHERE id = ?1")
            .bind(id)
            .bind(name)
            .bind(nickname)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Client", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Database;

    #[tokio::test]
    async fn test_insert_and_search() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.clients();

        repo.insert("María Quispe", Some("Mari")).await.unwrap();
        repo.insert("Marco Flores", None).await.unwrap();
        repo.insert("Luis Paredes", None).await.unwrap();

        let hits = repo.search("Mar", 10).await.unwrap();
        assert_eq!(hits.len(), 2);

        let by_nickname = repo.search("Mari", 10).await.unwrap();
        assert!(by_nickname.iter().any(|c| c.name == "María Quispe"));
    }

    #[tokio::test]
    async fn test_update_name() {
        let db = Database::in_memory().await.unwrap();
        let repo = db.clients();

        let client = repo.insert("Jose", None).await.unwrap();
        repo.update_name(&client.id, "José Ramos", Some("Pepe"))
            .await
            .unwrap();

        let updated = repo.get_by_id(&client.id).await.unwrap().unwrap();
        assert_eq!(updated.name, "José Ramos");
        assert_eq!(updated.nickname.as_deref(), Some("Pepe"));
    }
}
