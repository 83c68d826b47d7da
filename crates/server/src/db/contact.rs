//! Contact message repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use real_taste_core::{ContactMessageId, ContactStatus, Email};

use super::RepositoryError;
use crate::models::contact::{ContactMessage, NewContactMessage};

const CONTACT_COLUMNS: &str = "id, name, email, subject, message, status, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ContactMessageRow {
    id: i32,
    name: String,
    email: String,
    subject: String,
    message: String,
    status: ContactStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ContactMessageRow> for ContactMessage {
    type Error = RepositoryError;

    fn try_from(row: ContactMessageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ContactMessageId::new(row.id),
            name: row.name,
            email: Email::parse(&row.email).map_err(|e| RepositoryError::corrupt("email", e))?,
            subject: row.subject,
            message: row.message,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for contact form messages.
pub struct ContactRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactRepository<'a> {
    /// Create a new contact repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new message as unread.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, message: &NewContactMessage) -> Result<ContactMessage, RepositoryError> {
        let row = sqlx::query_as::<_, ContactMessageRow>(&format!(
            r"
            INSERT INTO cafe.contact_message (name, email, subject, message)
            VALUES ($1, $2, $3, $4)
            RETURNING {CONTACT_COLUMNS}
            "
        ))
        .bind(&message.name)
        .bind(message.email.as_str())
        .bind(&message.subject)
        .bind(&message.message)
        .fetch_one(self.pool)
        .await?;
        row.try_into()
    }

    /// All messages, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<ContactMessage>, RepositoryError> {
        let rows = sqlx::query_as::<_, ContactMessageRow>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM cafe.contact_message ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(ContactMessage::try_from).collect()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the message doesn't exist.
    pub async fn set_status(
        &self,
        id: ContactMessageId,
        status: ContactStatus,
    ) -> Result<ContactMessage, RepositoryError> {
        let row = sqlx::query_as::<_, ContactMessageRow>(&format!(
            "UPDATE cafe.contact_message SET status = $2 WHERE id = $1 RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;
        row.try_into()
    }
}
