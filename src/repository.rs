use crate::models::{Article, ArticleId, Category, User};
use crate::pagination::{Page, paginate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    FromRow, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// RepositoryError
///
/// Failures surfaced by write operations. Reads log and degrade to "no rows" instead.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// The (case-insensitive) slug is already taken by another article.
    #[error("slug already in use")]
    SlugTaken,
    #[error("record not found")]
    NotFound,
}

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, letting handlers work
/// against SQLite in production and an in-memory store in tests.
///
/// Every article listing comes back **newest first** (descending `published`, ties
/// broken by descending id).
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Article Retrieval ---
    async fn get_all(&self) -> Vec<Article>;
    async fn articles_in_category(&self, category: Category) -> Vec<Article>;
    async fn get_article(&self, slug: &str) -> Option<(ArticleId, Article)>;
    async fn does_slug_exist(&self, slug: &str) -> bool;

    /// One page of a category feed. Shared by every backend so paging behaves identically.
    async fn get_page(&self, page: i64, category: Category) -> Page<Article> {
        paginate(self.articles_in_category(category).await, page)
    }

    // --- Article Mutation ---
    /// Inserts an article. A slug collision is reported as `SlugTaken`, never as a
    /// duplicate row, even when two creations race.
    async fn new_article(&self, article: Article) -> Result<ArticleId, RepositoryError>;
    async fn edit_article(&self, id: ArticleId, article: Article) -> Result<(), RepositoryError>;
    /// Returns true if a row was removed.
    async fn delete_article(&self, id: ArticleId) -> bool;

    // --- User/Auth ---
    async fn get_user(&self, username: &str) -> Option<User>;
    async fn create_user(&self, user: User) -> Result<User, RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const CREATE_ARTICLES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS articles (
        id        INTEGER PRIMARY KEY AUTOINCREMENT,
        title     TEXT NOT NULL,
        preview   TEXT NOT NULL,
        body      TEXT NOT NULL,
        slug      TEXT NOT NULL UNIQUE COLLATE NOCASE,
        published TEXT NOT NULL,
        edited    TEXT NOT NULL,
        category  TEXT NOT NULL
    )
"#;

const CREATE_ARTICLES_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_articles_category_published
        ON articles (category, published)
"#;

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        username      TEXT NOT NULL UNIQUE,
        email         TEXT NOT NULL,
        password_hash TEXT NOT NULL
    )
"#;

const ARTICLE_COLUMNS: &str = "id, title, preview, body, slug, published, edited, category";

#[derive(FromRow)]
struct ArticleRecord {
    id: i64,
    title: String,
    preview: String,
    body: String,
    slug: String,
    published: DateTime<Utc>,
    edited: DateTime<Utc>,
    category: String,
}

impl ArticleRecord {
    /// Rows with an unknown category are logged and treated as absent.
    fn into_article(self) -> Option<(ArticleId, Article)> {
        let Ok(category) = Category::from_str(&self.category) else {
            tracing::error!(id = self.id, category = %self.category, "article row has unknown category");
            return None;
        };
        Some((
            self.id,
            Article {
                title: self.title,
                preview: self.preview,
                body: self.body,
                slug: self.slug,
                published: self.published,
                edited: self.edited,
                category,
            },
        ))
    }
}

/// SqliteRepository
///
/// The durable implementation of `Repository`, backed by a single SQLite file.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Wraps an existing pool. Call [`SqliteRepository::init_schema`] before use.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if missing) the database file at `path` and makes sure the
    /// schema exists.
    pub async fn connect(path: &str) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let repo = Self::new(pool);
        repo.init_schema().await?;
        Ok(repo)
    }

    /// Creates the tables on an empty database; a no-op when they already exist.
    pub async fn init_schema(&self) -> Result<(), RepositoryError> {
        for statement in [CREATE_ARTICLES_TABLE, CREATE_ARTICLES_INDEX, CREATE_USERS_TABLE] {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Read failures degrade to an empty listing.
fn collect_articles(result: Result<Vec<ArticleRecord>, sqlx::Error>, operation: &str) -> Vec<Article> {
    match result {
        Ok(rows) => rows
            .into_iter()
            .filter_map(ArticleRecord::into_article)
            .map(|(_, article)| article)
            .collect(),
        Err(e) => {
            tracing::error!("{} error: {:?}", operation, e);
            vec![]
        }
    }
}

fn map_write_error(e: sqlx::Error) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => RepositoryError::SlugTaken,
        _ => RepositoryError::Database(e),
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn get_all(&self) -> Vec<Article> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY published DESC, id DESC");
        let result = sqlx::query_as::<_, ArticleRecord>(&sql)
            .fetch_all(&self.pool)
            .await;
        collect_articles(result, "get_all")
    }

    async fn articles_in_category(&self, category: Category) -> Vec<Article> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE category = ? ORDER BY published DESC, id DESC"
        );
        let result = sqlx::query_as::<_, ArticleRecord>(&sql)
            .bind(category.as_str())
            .fetch_all(&self.pool)
            .await;
        collect_articles(result, "articles_in_category")
    }

    async fn get_article(&self, slug: &str) -> Option<(ArticleId, Article)> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE slug = ? LIMIT 1");
        sqlx::query_as::<_, ArticleRecord>(&sql)
            .bind(slug.to_lowercase())
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_article error: {:?}", e);
                None
            })
            .and_then(ArticleRecord::into_article)
    }

    async fn does_slug_exist(&self, slug: &str) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM articles WHERE slug = ?")
            .bind(slug.to_lowercase())
            .fetch_one(&self.pool)
            .await
            .map(|count| count > 0)
            .unwrap_or_else(|e| {
                tracing::error!("does_slug_exist error: {:?}", e);
                false
            })
    }

    async fn new_article(&self, article: Article) -> Result<ArticleId, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO articles (title, preview, body, slug, published, edited, category) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&article.title)
        .bind(&article.preview)
        .bind(&article.body)
        .bind(article.slug.to_lowercase())
        .bind(article.published)
        .bind(article.edited)
        .bind(article.category.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(result.last_insert_rowid())
    }

    async fn edit_article(&self, id: ArticleId, article: Article) -> Result<(), RepositoryError> {
        // `published` never changes after creation.
        let result = sqlx::query(
            "UPDATE articles SET title = ?, preview = ?, body = ?, slug = ?, edited = ?, category = ? WHERE id = ?",
        )
        .bind(&article.title)
        .bind(&article.preview)
        .bind(&article.body)
        .bind(article.slug.to_lowercase())
        .bind(article.edited)
        .bind(article.category.as_str())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_article(&self, id: ArticleId) -> bool {
        match sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_article error: {:?}", e);
                false
            }
        }
    }

    async fn get_user(&self, username: &str) -> Option<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash FROM users WHERE username = ? LIMIT 1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_user error: {:?}", e);
            None
        })
    }

    async fn create_user(&self, user: User) -> Result<User, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            ..user
        })
    }
}

// --- In-Memory Implementation ---

#[derive(Default)]
struct MemoryTables {
    next_id: ArticleId,
    articles: Vec<(ArticleId, Article)>,
    users: Vec<User>,
}

/// MemoryRepository
///
/// A process-local `Repository` used by tests and throwaway demos. All writes go through
/// one lock, so the slug check and the insert are atomic.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<MemoryTables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-filled with `articles`, inserted in order.
    pub async fn with_articles(articles: Vec<Article>) -> Self {
        let repo = Self::new();
        for article in articles {
            if let Err(e) = repo.new_article(article).await {
                tracing::warn!("skipping seed article: {}", e);
            }
        }
        repo
    }

    fn sorted(mut rows: Vec<(ArticleId, Article)>) -> Vec<Article> {
        rows.sort_by(|(a_id, a), (b_id, b)| {
            b.published.cmp(&a.published).then_with(|| b_id.cmp(a_id))
        });
        rows.into_iter().map(|(_, article)| article).collect()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_all(&self) -> Vec<Article> {
        let tables = self.tables.read().await;
        Self::sorted(tables.articles.clone())
    }

    async fn articles_in_category(&self, category: Category) -> Vec<Article> {
        let tables = self.tables.read().await;
        Self::sorted(
            tables
                .articles
                .iter()
                .filter(|(_, a)| a.category == category)
                .cloned()
                .collect(),
        )
    }

    async fn get_article(&self, slug: &str) -> Option<(ArticleId, Article)> {
        let slug = slug.to_lowercase();
        let tables = self.tables.read().await;
        tables.articles.iter().find(|(_, a)| a.slug == slug).cloned()
    }

    async fn does_slug_exist(&self, slug: &str) -> bool {
        self.get_article(slug).await.is_some()
    }

    async fn new_article(&self, mut article: Article) -> Result<ArticleId, RepositoryError> {
        article.slug = article.slug.to_lowercase();
        let mut tables = self.tables.write().await;
        if tables.articles.iter().any(|(_, a)| a.slug == article.slug) {
            return Err(RepositoryError::SlugTaken);
        }
        tables.next_id += 1;
        let id = tables.next_id;
        tables.articles.push((id, article));
        Ok(id)
    }

    async fn edit_article(&self, id: ArticleId, mut article: Article) -> Result<(), RepositoryError> {
        article.slug = article.slug.to_lowercase();
        let mut tables = self.tables.write().await;
        if tables
            .articles
            .iter()
            .any(|(other, a)| *other != id && a.slug == article.slug)
        {
            return Err(RepositoryError::SlugTaken);
        }
        let (_, stored) = tables
            .articles
            .iter_mut()
            .find(|(row_id, _)| *row_id == id)
            .ok_or(RepositoryError::NotFound)?;
        article.published = stored.published;
        *stored = article;
        Ok(())
    }

    async fn delete_article(&self, id: ArticleId) -> bool {
        let mut tables = self.tables.write().await;
        let before = tables.articles.len();
        tables.articles.retain(|(row_id, _)| *row_id != id);
        tables.articles.len() < before
    }

    async fn get_user(&self, username: &str) -> Option<User> {
        let tables = self.tables.read().await;
        tables.users.iter().find(|u| u.username == username).cloned()
    }

    async fn create_user(&self, user: User) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        let user = User {
            id: tables.users.len() as i64 + 1,
            ..user
        };
        tables.users.push(user.clone());
        Ok(user)
    }
}
