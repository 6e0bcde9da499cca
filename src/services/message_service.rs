//! services/message_service.rs
//! Historial de mensajes sobre SQLite. Es el único almacén autoritativo:
//! cada intento de envío (exitoso o no) queda registrado acá.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

use crate::models::message_model::{MessageRecord, MessageStats, NewMessage};

#[derive(Clone, Debug)]
pub struct MessageService {
    db_pool: Pool<Sqlite>,
}

impl MessageService {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        MessageService { db_pool }
    }

    /// Corre migraciones con sqlx
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.db_pool).await?;
        Ok(())
    }

    /// Inserta un registro del historial con id y timestamp propios.
    pub async fn add_message(&self, new: &NewMessage) -> Result<MessageRecord> {
        let id = format!("msg_{}", Uuid::new_v4());
        let created_at = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO messages (
                id, phone_number, message, status, message_id,
                error_message, name, from_name, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&id)
        .bind(&new.phone_number)
        .bind(&new.message)
        .bind(&new.status)
        .bind(&new.message_id)
        .bind(&new.error_message)
        .bind(&new.name)
        .bind(&new.from_name)
        .bind(&created_at)
        .execute(&self.db_pool)
        .await
        .context("Fallo al insertar mensaje en historial")?;

        Ok(MessageRecord {
            id,
            phone_number: new.phone_number.clone(),
            message: new.message.clone(),
            status: new.status.clone(),
            message_id: new.message_id.clone(),
            error_message: new.error_message.clone(),
            name: new.name.clone(),
            from_name: new.from_name.clone(),
            created_at,
        })
    }

    /// Últimos N mensajes, del más reciente al más viejo.
    pub async fn recent_messages(&self, limit: i64) -> Result<Vec<MessageRecord>> {
        let rows = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, phone_number, message, status, message_id,
                   error_message, name, from_name, created_at
            FROM messages
            ORDER BY created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db_pool)
        .await
        .context("Fallo al listar mensajes recientes")?;
        Ok(rows)
    }

    pub async fn messages_by_phone(&self, phone_number: &str) -> Result<Vec<MessageRecord>> {
        let rows = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, phone_number, message, status, message_id,
                   error_message, name, from_name, created_at
            FROM messages
            WHERE phone_number = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(phone_number)
        .fetch_all(&self.db_pool)
        .await
        .context("Fallo al buscar mensajes por teléfono")?;
        Ok(rows)
    }

    /// Borra exactamente un registro; devuelve false si el id no existía.
    pub async fn delete_message(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?1")
            .bind(id)
            .execute(&self.db_pool)
            .await
            .context("Fallo al borrar mensaje")?;
        Ok(result.rows_affected() == 1)
    }

    /// Vacía el historial completo; devuelve la cantidad borrada.
    pub async fn delete_all_messages(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM messages")
            .execute(&self.db_pool)
            .await
            .context("Fallo al borrar todo el historial")?;
        Ok(result.rows_affected())
    }

    /// Purga de retención: borra registros más viejos que la ventana.
    pub async fn purge_older_than(&self, hours: i64) -> Result<u64> {
        let cutoff = (Utc::now() - Duration::hours(hours)).to_rfc3339();
        let result = sqlx::query("DELETE FROM messages WHERE created_at < ?1")
            .bind(&cutoff)
            .execute(&self.db_pool)
            .await
            .context("Fallo al purgar mensajes viejos")?;
        log::info!(
            "(purge_older_than) Purgados {} mensajes anteriores a {}",
            result.rows_affected(),
            cutoff
        );
        Ok(result.rows_affected())
    }

    pub async fn message_stats(&self) -> Result<MessageStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) as total,
                COUNT(CASE WHEN status = 'sent' THEN 1 END) as sent,
                COUNT(CASE WHEN status = 'failed' THEN 1 END) as failed
            FROM messages
            "#,
        )
        .fetch_one(&self.db_pool)
        .await
        .context("Fallo al calcular estadísticas")?;

        Ok(MessageStats {
            total: row.get::<i64, _>("total"),
            sent: row.get::<i64, _>("sent"),
            failed: row.get::<i64, _>("failed"),
        })
    }
}
