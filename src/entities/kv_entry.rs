//! Key-value entry entity - The single table backing the bot's key-value store.
//!
//! Every logical record (credit, history list, authorization sets, categories,
//! expenses, sessions) lives under one string key. The value is a JSON document:
//! a scalar record for plain keys, an array for lists and sets.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Key-value entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "kv_entries")]
pub struct Model {
    /// Store key (e.g., `"credit:global"`, `"fin:expenses:42:2025-10"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// JSON-encoded value
    #[sea_orm(column_type = "Text")]
    pub value: String,
    /// When this entry was last written
    pub updated_at: DateTime,
}

/// `KvEntry` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
