use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

// --- Core Application Schemas ---

/// Internal identifier of a stored article. Stable across slug changes.
pub type ArticleId = i64;

/// Category
///
/// The closed set of feeds articles are partitioned into. Each category has its own
/// paginated index (`/` for Programming, `/other` for Other).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Programming,
    Other,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Programming, Category::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Programming => "Programming",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ();

    /// Exact, case-sensitive match against the enumerated names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or(())
    }
}

/// Article
///
/// A published blog post. `published` is fixed at creation; `edited` starts equal to it
/// and is refreshed by every edit. The slug is always stored lowercased.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub preview: String,
    /// Trusted HTML, rendered without sanitization.
    pub body: String,
    pub slug: String,
    pub published: DateTime<Utc>,
    pub edited: DateTime<Utc>,
    pub category: Category,
}

impl Article {
    /// Builds a freshly created article: both timestamps set to `now`.
    pub fn create(fields: ArticleFields, now: DateTime<Utc>) -> Self {
        Self {
            title: fields.title,
            preview: fields.preview,
            body: fields.body,
            slug: fields.slug,
            published: now,
            edited: now,
            category: fields.category,
        }
    }

    /// Applies an edit on top of `self`, preserving `published` and refreshing `edited`.
    pub fn edit(&self, fields: ArticleFields, now: DateTime<Utc>) -> Self {
        Self {
            title: fields.title,
            preview: fields.preview,
            body: fields.body,
            slug: fields.slug,
            published: self.published,
            edited: now,
            category: fields.category,
        }
    }

    pub fn is_edited(&self) -> bool {
        self.published < self.edited
    }
}

/// ArticleFields
///
/// The user-editable part of an article after it passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleFields {
    pub title: String,
    pub preview: String,
    pub body: String,
    pub slug: String,
    pub category: Category,
}

/// User
///
/// The admin account. Created at seed time only; there is no self-registration.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    // Never rendered or logged.
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// PageInfo
///
/// Derived pagination metadata handed to the index template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub current_page: i64,
    pub max_page: i64,
    pub next: i64,
    pub prev: i64,
}

impl PageInfo {
    pub fn new(current_page: i64, max_page: i64) -> Self {
        Self {
            current_page,
            max_page,
            next: current_page + 1,
            prev: current_page - 1,
        }
    }
}

/// SessionData
///
/// The typed payload carried by the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SessionData {
    pub name: String,
    pub authenticated: bool,
}

// --- Request Payloads (Form Schemas) ---

/// ArticleForm
///
/// Raw form submission for `/new` and `/{slug}/edit`. Missing fields default to empty
/// strings so they surface as validation errors rather than extractor rejections.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ArticleForm {
    pub title: String,
    pub preview: String,
    pub body: String,
    pub slug: String,
    pub category: String,
}

impl From<&Article> for ArticleForm {
    fn from(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            preview: article.preview.clone(),
            body: article.body.clone(),
            slug: article.slug.clone(),
            category: article.category.to_string(),
        }
    }
}

/// LoginForm
///
/// Submission of `/admin/login`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}
