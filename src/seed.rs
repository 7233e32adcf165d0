use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::{
    auth::{PasswordError, hash_password},
    config::AppConfig,
    models::{Article, Category, User},
    repository::{Repository, RepositoryError},
};

const DEMO_PREVIEW: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Donec in \
tincidunt magna. Maecenas venenatis dictum porttitor.";

const DEMO_PARAGRAPH: &str = "<p>Lorem ipsum dolor sit amet, consectetur adipiscing elit. Donec \
in tincidunt magna. Maecenas venenatis dictum porttitor. Nulla condimentum est odio, ac blandit \
lorem posuere quis.</p>";

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// demo_article
///
/// The `index`-th demo article of `category`. Timestamps start an hour before `now` and
/// advance one second per index, so higher indices are newer.
pub fn demo_article(index: usize, now: DateTime<Utc>, category: Category) -> Article {
    let at = now - Duration::hours(1) + Duration::seconds(index as i64);
    Article {
        title: format!("{category} Article {index}"),
        preview: DEMO_PREVIEW.to_string(),
        body: DEMO_PARAGRAPH.repeat(3),
        slug: format!("{}-article-{index}", category.as_str().to_lowercase()),
        published: at,
        edited: at,
        category,
    }
}

/// `count` demo articles for every category, interleaved.
pub fn demo_articles(count: usize, now: DateTime<Utc>) -> Vec<Article> {
    (1..=count)
        .flat_map(|i| Category::ALL.map(|category| demo_article(i, now, category)))
        .collect()
}

/// seed_admin
///
/// Creates the configured admin account unless a user with that name already exists.
/// Returns whether a user was created.
pub async fn seed_admin(repo: &dyn Repository, config: &AppConfig) -> Result<bool, SeedError> {
    if repo.get_user(&config.admin_username).await.is_some() {
        return Ok(false);
    }

    let user = User {
        id: 0,
        username: config.admin_username.clone(),
        email: config.admin_email.clone(),
        password_hash: hash_password(&config.admin_password)?,
    };
    let user = repo.create_user(user).await?;
    tracing::info!(username = %user.username, "seeded admin user");
    Ok(true)
}

/// seed_demo_articles
///
/// Fills an empty store with demo content. A store that already holds articles is left
/// alone. Returns the number of inserted articles.
pub async fn seed_demo_articles(repo: &dyn Repository, count: usize) -> Result<usize, SeedError> {
    if count == 0 || !repo.get_all().await.is_empty() {
        return Ok(0);
    }

    let articles = demo_articles(count, Utc::now());
    let inserted = articles.len();
    for article in articles {
        repo.new_article(article).await?;
    }

    tracing::info!(inserted, "seeded demo articles");
    Ok(inserted)
}
