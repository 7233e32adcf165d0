use crate::models::{ArticleFields, ArticleForm, Category};
use std::str::FromStr;
use thiserror::Error;

/// Maximum title length, counted in Unicode code points.
pub const MAX_TITLE_LENGTH: usize = 50;

/// Characters that are reserved or unsafe inside a URL path segment.
pub const ILLEGAL_SLUG_CHARS: &str = "&$+,/:;=?@# <>[]{}|\\^%";

/// ValidationError
///
/// One failed field rule of an article submission. The `Display` text is the
/// human-readable message shown above the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title is too long")]
    TitleTooLong,
    #[error("Title cannot be empty")]
    TitleEmpty,
    #[error("Preview cannot be empty")]
    PreviewEmpty,
    #[error("Body cannot be empty")]
    BodyEmpty,
    #[error("Slug cannot be empty")]
    SlugEmpty,
    #[error("Slug is already being used by another article")]
    SlugAlreadyExists,
    #[error("Slug contains illegal characters")]
    SlugIllegalCharacters,
    #[error("Category is invalid")]
    CategoryInvalid,
}

/// LoginError
///
/// Login failures. Missing fields are reported individually; a credential mismatch is
/// a single generic message that never says which half was wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("Please enter a username.")]
    MissingUsername,
    #[error("Please enter a password.")]
    MissingPassword,
    #[error("Incorrect username and/or password. Try again.")]
    InvalidCredentials,
}

/// check_article
///
/// Runs every field rule and returns all failures, in form order. `slug_in_use` is the
/// outcome of the uniqueness lookup and is only ever true for creations.
pub fn check_article(form: &ArticleForm, slug_in_use: bool) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if form.title.chars().count() > MAX_TITLE_LENGTH {
        errors.push(ValidationError::TitleTooLong);
    }
    if form.title.is_empty() {
        errors.push(ValidationError::TitleEmpty);
    }
    if form.preview.is_empty() {
        errors.push(ValidationError::PreviewEmpty);
    }
    if form.body.is_empty() {
        errors.push(ValidationError::BodyEmpty);
    }
    if form.slug.is_empty() {
        errors.push(ValidationError::SlugEmpty);
    }
    if slug_in_use {
        errors.push(ValidationError::SlugAlreadyExists);
    }
    if has_illegal_slug_char(&form.slug) {
        errors.push(ValidationError::SlugIllegalCharacters);
    }
    if Category::from_str(&form.category).is_err() {
        errors.push(ValidationError::CategoryInvalid);
    }

    errors
}

/// validate_article
///
/// Like [`check_article`], but on success hands back the cleaned fields with the slug
/// lowercased for storage.
pub fn validate_article(
    form: &ArticleForm,
    slug_in_use: bool,
) -> Result<ArticleFields, Vec<ValidationError>> {
    let errors = check_article(form, slug_in_use);
    if !errors.is_empty() {
        return Err(errors);
    }

    let category = Category::from_str(&form.category)
        .map_err(|_| vec![ValidationError::CategoryInvalid])?;

    Ok(ArticleFields {
        title: form.title.clone(),
        preview: form.preview.clone(),
        body: form.body.clone(),
        slug: form.slug.to_lowercase(),
        category,
    })
}

/// Stops at the first reserved character found.
fn has_illegal_slug_char(slug: &str) -> bool {
    slug.chars().any(|c| ILLEGAL_SLUG_CHARS.contains(c))
}

/// validate_login
///
/// Presence check of the login form. Credential verification happens afterwards.
pub fn validate_login(username: &str, password: &str) -> Vec<LoginError> {
    let mut errors = Vec::new();
    if username.is_empty() {
        errors.push(LoginError::MissingUsername);
    }
    if password.is_empty() {
        errors.push(LoginError::MissingPassword);
    }
    errors
}
