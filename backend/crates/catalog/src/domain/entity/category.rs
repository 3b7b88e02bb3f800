//! Category Entity

use chrono::{DateTime, Utc};
use kernel::id::CategoryId;

use crate::domain::slug::slugify;

#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: impl Into<String>, description: Option<String>, now: DateTime<Utc>) -> Self {
        let name = name.into().trim().to_string();
        Self {
            id: CategoryId::new(),
            slug: slugify(&name),
            name,
            description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Renaming also moves the slug.
    pub fn rename(&mut self, name: &str, now: DateTime<Utc>) {
        self.name = name.trim().to_string();
        self.slug = slugify(&self.name);
        self.updated_at = now;
    }
}
