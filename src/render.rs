use serde::Serialize;
use std::sync::Arc;
use tera::{Context, Tera};
use thiserror::Error;

use crate::models::{Article, ArticleForm, Category, PageInfo};

pub const INDEX_TEMPLATE: &str = "index.html";
pub const ALL_TEMPLATE: &str = "all.html";
pub const ARTICLE_TEMPLATE: &str = "article.html";
pub const FORM_TEMPLATE: &str = "article_form.html";
pub const LOGIN_TEMPLATE: &str = "login.html";
pub const ADMIN_TEMPLATE: &str = "admin_panel.html";

/// Default meta description for listing pages.
pub const SITE_DESCRIPTION: &str = "Articles about programming and everything else.";

const EMBEDDED_TEMPLATES: [(&str, &str); 8] = [
    ("base.html", include_str!("../templates/base.html")),
    ("nav.html", include_str!("../templates/nav.html")),
    (INDEX_TEMPLATE, include_str!("../templates/index.html")),
    (ALL_TEMPLATE, include_str!("../templates/all.html")),
    (ARTICLE_TEMPLATE, include_str!("../templates/article.html")),
    (FORM_TEMPLATE, include_str!("../templates/article_form.html")),
    (LOGIN_TEMPLATE, include_str!("../templates/login.html")),
    (ADMIN_TEMPLATE, include_str!("../templates/admin_panel.html")),
];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

/// Renderer
///
/// Turns a serializable view into HTML. With live reload off the embedded templates are
/// compiled once; with it on, the template directory is re-read for every render.
#[derive(Clone)]
pub enum Renderer {
    Cached(Arc<Tera>),
    Live { template_dir: String },
}

impl Renderer {
    pub fn new(template_dir: &str, live_reload: bool) -> Result<Self, RenderError> {
        if live_reload {
            tracing::info!("template live reload enabled from {}", template_dir);
            return Ok(Renderer::Live {
                template_dir: template_dir.to_string(),
            });
        }
        Ok(Renderer::Cached(Arc::new(Self::compile_embedded()?)))
    }

    fn compile_embedded() -> Result<Tera, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(EMBEDDED_TEMPLATES.to_vec())?;
        tera.set_escape_fn(escape_html);
        Ok(tera)
    }

    pub fn render<V: Serialize>(&self, template: &str, view: &V) -> Result<String, RenderError> {
        let context = Context::from_serialize(view)?;
        match self {
            Renderer::Cached(tera) => Ok(tera.render(template, &context)?),
            Renderer::Live { template_dir } => {
                let mut tera = Tera::new(&format!("{template_dir}/**/*.html"))?;
                tera.set_escape_fn(escape_html);
                Ok(tera.render(template, &context)?)
            }
        }
    }
}

/// escape_html
///
/// Autoescape used for every template. Covers the characters that can open a tag or
/// close an attribute; `/` is left alone so paths and messages render as written.
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

// --- Views ---

fn date_only(article_time: &chrono::DateTime<chrono::Utc>) -> String {
    article_time.format("%Y-%m-%d").to_string()
}

/// An article as listings and the article page see it: dates cut to `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleCard {
    pub title: String,
    pub preview: String,
    pub body: String,
    pub slug: String,
    pub category: Category,
    pub published: String,
    pub edited: String,
    pub is_edited: bool,
}

impl From<&Article> for ArticleCard {
    fn from(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            preview: article.preview.clone(),
            body: article.body.clone(),
            slug: article.slug.clone(),
            category: article.category,
            published: date_only(&article.published),
            edited: date_only(&article.edited),
            is_edited: article.is_edited(),
        }
    }
}

fn cards(articles: &[Article]) -> Vec<ArticleCard> {
    articles.iter().map(ArticleCard::from).collect()
}

#[derive(Debug, Serialize)]
pub struct IndexView {
    pub articles: Vec<ArticleCard>,
    pub category: Category,
    /// Path prefix of the category feed, `""` for Programming and `"/other"` for Other.
    pub base_path: &'static str,
    pub page: PageInfo,
    pub description: &'static str,
    pub logged_in: bool,
}

impl IndexView {
    pub fn new(articles: &[Article], category: Category, page: PageInfo, logged_in: bool) -> Self {
        let base_path = match category {
            Category::Programming => "",
            Category::Other => "/other",
        };
        Self {
            articles: cards(articles),
            category,
            base_path,
            page,
            description: SITE_DESCRIPTION,
            logged_in,
        }
    }
}

/// `/all`: every article, alternately dealt into two columns.
#[derive(Debug, Serialize)]
pub struct AllView {
    pub left: Vec<ArticleCard>,
    pub right: Vec<ArticleCard>,
    pub description: &'static str,
    pub logged_in: bool,
}

impl AllView {
    pub fn new(articles: &[Article], logged_in: bool) -> Self {
        let (left, right): (Vec<_>, Vec<_>) = articles
            .iter()
            .enumerate()
            .partition(|(i, _)| i % 2 == 0);
        Self {
            left: left.into_iter().map(|(_, a)| ArticleCard::from(a)).collect(),
            right: right.into_iter().map(|(_, a)| ArticleCard::from(a)).collect(),
            description: SITE_DESCRIPTION,
            logged_in,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ArticleView {
    pub article: ArticleCard,
    pub logged_in: bool,
}

#[derive(Debug, Serialize)]
pub struct FormView {
    pub form: ArticleForm,
    pub action: String,
    pub errors: Vec<String>,
    pub categories: Vec<&'static str>,
    pub logged_in: bool,
}

impl FormView {
    pub fn new(form: ArticleForm, action: String, errors: Vec<String>) -> Self {
        Self {
            form,
            action,
            errors,
            categories: Category::ALL.iter().map(Category::as_str).collect(),
            logged_in: true,
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct LoginView {
    pub username: String,
    pub errors: Vec<String>,
    pub logged_in: bool,
}

#[derive(Debug, Serialize)]
pub struct AdminView {
    pub articles: Vec<ArticleCard>,
    pub name: String,
    pub logged_in: bool,
}

impl AdminView {
    pub fn new(articles: &[Article], name: String) -> Self {
        Self {
            articles: cards(articles),
            name,
            logged_in: true,
        }
    }
}
