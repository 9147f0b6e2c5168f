use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub enum Genre {
    Fiction,
    Science,
}

/// An author of books
#[derive(Debug, Serialize, Deserialize)]
pub struct Author {
    #[serde(skip_deserializing)]
    pub id: u64,
    /// Full name
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Book {
    #[serde(skip_deserializing)]
    pub id: u64,
    pub title: String,
    pub genre: Genre,
    pub author: Author,
    #[serde(default)]
    pub tags: Vec<String>,
    pub published: Option<NaiveDate>,
}
