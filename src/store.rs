//! Key-value store over the `kv_entries` table.
//!
//! Offers the small set of primitives the bot needs: plain get/set/delete of JSON
//! records, ordered lists and string sets. Every list or set mutation is a
//! read-modify-write of a single row inside one database transaction, so a list is
//! always rewritten as a whole and never left half-updated.

use crate::{
    entities::{KvEntry, kv_entry},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{Set, TransactionTrait, prelude::*, sea_query::OnConflict};
use serde::{Serialize, de::DeserializeOwned};

/// Handle to the key-value store. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct KvStore {
    db: DatabaseConnection,
}

impl KvStore {
    /// Wraps an established database connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Reads and decodes the record stored under `key`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        read_json(&self.db, key).await
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        write_json(&self.db, key, value).await
    }

    /// Removes `key`. Returns whether anything was deleted.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let result = KvEntry::delete_by_id(key.to_string()).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    /// Whether a row exists for exactly `key`.
    #[cfg(test)]
    pub async fn contains_key(&self, key: &str) -> Result<bool> {
        let count = KvEntry::find()
            .filter(kv_entry::Column::Key.eq(key))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Appends `item` to the list under `key`. Returns the new length.
    pub async fn list_push<T: Serialize>(&self, key: &str, item: &T) -> Result<usize> {
        let txn = self.db.begin().await?;
        let mut items: Vec<serde_json::Value> = read_json(&txn, key).await?.unwrap_or_default();
        items.push(serde_json::to_value(item)?);
        write_json(&txn, key, &items).await?;
        txn.commit().await?;
        Ok(items.len())
    }

    /// Returns the whole list under `key`, oldest first. Missing key means empty list.
    pub async fn list_range<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        Ok(self.get::<Vec<T>>(key).await?.unwrap_or_default())
    }

    /// Removes the element at `index` if `expected` accepts it, keeping the
    /// relative order of the rest.
    ///
    /// Returns the removed element, or `None` if the index is out of range or the
    /// element there was rejected.
    pub async fn list_remove_at_if<T, F>(
        &self,
        key: &str,
        index: usize,
        expected: F,
    ) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&T) -> bool,
    {
        let txn = self.db.begin().await?;
        let mut items: Vec<T> = read_json(&txn, key).await?.unwrap_or_default();
        if !items.get(index).is_some_and(expected) {
            return Ok(None);
        }
        let removed = items.remove(index);
        if items.is_empty() {
            KvEntry::delete_by_id(key.to_string()).exec(&txn).await?;
        } else {
            write_json(&txn, key, &items).await?;
        }
        txn.commit().await?;
        Ok(Some(removed))
    }

    /// Replaces the element at `index` in place if `expected` accepts the current one.
    ///
    /// Returns the previous element, or `None` if the index is out of range or the
    /// element there was rejected.
    pub async fn list_set_at_if<T, F>(
        &self,
        key: &str,
        index: usize,
        item: T,
        expected: F,
    ) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&T) -> bool,
    {
        let txn = self.db.begin().await?;
        let mut items: Vec<T> = read_json(&txn, key).await?.unwrap_or_default();
        let Some(slot) = items.get_mut(index).filter(|slot| expected(&**slot)) else {
            return Ok(None);
        };
        let previous = std::mem::replace(slot, item);
        write_json(&txn, key, &items).await?;
        txn.commit().await?;
        Ok(Some(previous))
    }

    /// Adds `member` to the set under `key`. Returns `false` if it was already present.
    pub async fn set_add(&self, key: &str, member: &str) -> Result<bool> {
        let txn = self.db.begin().await?;
        let mut members: Vec<String> = read_json(&txn, key).await?.unwrap_or_default();
        if members.iter().any(|m| m == member) {
            return Ok(false);
        }
        members.push(member.to_string());
        write_json(&txn, key, &members).await?;
        txn.commit().await?;
        Ok(true)
    }

    /// Removes `member` from the set under `key`. Returns whether it was present.
    pub async fn set_remove(&self, key: &str, member: &str) -> Result<bool> {
        let txn = self.db.begin().await?;
        let mut members: Vec<String> = read_json(&txn, key).await?.unwrap_or_default();
        let before = members.len();
        members.retain(|m| m != member);
        if members.len() == before {
            return Ok(false);
        }
        write_json(&txn, key, &members).await?;
        txn.commit().await?;
        Ok(true)
    }

    /// All members of the set under `key`.
    pub async fn set_members(&self, key: &str) -> Result<Vec<String>> {
        Ok(self.get::<Vec<String>>(key).await?.unwrap_or_default())
    }

    /// Whether `member` belongs to the set under `key`.
    pub async fn set_contains(&self, key: &str, member: &str) -> Result<bool> {
        Ok(self.set_members(key).await?.iter().any(|m| m == member))
    }
}

async fn read_json<C, T>(db: &C, key: &str) -> Result<Option<T>>
where
    C: ConnectionTrait,
    T: DeserializeOwned,
{
    let entry = KvEntry::find_by_id(key.to_string()).one(db).await?;
    match entry {
        Some(entry) => Ok(Some(serde_json::from_str(&entry.value)?)),
        None => Ok(None),
    }
}

async fn write_json<C, T>(db: &C, key: &str, value: &T) -> Result<()>
where
    C: ConnectionTrait,
    T: Serialize + ?Sized,
{
    let entry = kv_entry::ActiveModel {
        key: Set(key.to_string()),
        value: Set(serde_json::to_string(value)?),
        updated_at: Set(Utc::now().naive_utc()),
    };

    KvEntry::insert(entry)
        .on_conflict(
            OnConflict::column(kv_entry::Column::Key)
                .update_columns([kv_entry::Column::Value, kv_entry::Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}
