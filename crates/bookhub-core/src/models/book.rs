use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A library book record.
///
/// Only `id`, `title` and `author` are guaranteed; the remaining fields are
/// filled in when the backend serializer exposes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub published_date: Option<NaiveDate>,
    #[serde(default)]
    pub copies_available: Option<u32>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Book {
    /// "Title by Author", as shown in list rows
    pub fn display_line(&self) -> String {
        format!("{} by {}", self.title, self.author)
    }

    pub fn availability_display(&self) -> String {
        match self.copies_available {
            Some(0) => "Unavailable".to_string(),
            Some(1) => "1 copy available".to_string(),
            Some(n) => format!("{} copies available", n),
            None => "Unknown".to_string(),
        }
    }
}

/// Fields sent when creating a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub published_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>, published_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            published_date,
            genre: None,
            summary: None,
        }
    }

    /// Required-field check; returns the message to show the user.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() || self.author.trim().is_empty() {
            return Err("Title and author are required".to_string());
        }
        Ok(())
    }
}
