//! Contact CRUD operations.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{Contact, NewContact};
use crate::validation;

/// Initial follow-up status for a new contact.
pub const STATUS_NEW: &str = "novo";

/// Create a new contact.
pub async fn create_contact(pool: &SqlitePool, new: &NewContact) -> Result<Contact> {
    validation::validate_name(&new.name)?;
    validation::validate_phone(&new.phone)?;

    let id = Uuid::new_v4().to_string();
    let phone = validation::clean_phone(&new.phone);

    sqlx::query(
        r#"
        INSERT INTO contacts (id, name, phone, owner, birthday, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&new.name)
    .bind(&phone)
    .bind(&new.owner)
    .bind(&new.birthday)
    .bind(STATUS_NEW)
    .execute(pool)
    .await?;

    get_contact(pool, &id).await
}

/// Get a contact by ID.
pub async fn get_contact(pool: &SqlitePool, id: &str) -> Result<Contact> {
    sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, name, phone, owner, birthday, status, received_message, created_at
        FROM contacts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Contact",
        id: id.to_string(),
    })
}

/// List all contacts, newest first.
pub async fn list_contacts(pool: &SqlitePool) -> Result<Vec<Contact>> {
    let contacts = sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, name, phone, owner, birthday, status, received_message, created_at
        FROM contacts
        ORDER BY created_at DESC, name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(contacts)
}

/// Update a contact's follow-up status.
pub async fn update_contact_status(pool: &SqlitePool, id: &str, status: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE contacts
        SET status = ?
        WHERE id = ?
        "#,
    )
    .bind(status)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Contact",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Mark a contact as having received a welcome message.
pub async fn mark_received(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE contacts
        SET received_message = 1
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Contact",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Delete a contact by ID.
pub async fn delete_contact(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM contacts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Contact",
            id: id.to_string(),
        });
    }

    Ok(())
}
