use crate::{
    AppState,
    auth::{AuthUser, ClientIp, SESSION_COOKIE, Session, SessionOption, verify_credentials},
    error::AppError,
    models::{Article, ArticleForm, Category, LoginForm, PageInfo, SessionData},
    notify::LoginAttempt,
    pagination::parse_page_token,
    render::{
        ADMIN_TEMPLATE, ALL_TEMPLATE, ARTICLE_TEMPLATE, AdminView, AllView, ArticleCard,
        ArticleView, FORM_TEMPLATE, FormView, INDEX_TEMPLATE, IndexView, LOGIN_TEMPLATE,
        LoginView,
    },
    repository::RepositoryError,
    validation::{LoginError, ValidationError, validate_article, validate_login},
};
use axum::{
    Form,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;

type HandlerResult = Result<Response, AppError>;

fn messages<E: ToString>(errors: &[E]) -> Vec<String> {
    errors.iter().map(ToString::to_string).collect()
}

// --- Listing Handlers ---

async fn render_index(
    state: &AppState,
    category: Category,
    requested_page: i64,
    logged_in: bool,
) -> HandlerResult {
    let page = state.repo.get_page(requested_page, category).await;
    let view = IndexView::new(
        &page.items,
        category,
        PageInfo::new(page.page, page.max_page),
        logged_in,
    );
    let html = state.renderer.render(INDEX_TEMPLATE, &view)?;
    Ok(Html(html).into_response())
}

/// index
///
/// [Public Route] First page of the Programming feed.
pub async fn index(State(state): State<AppState>, viewer: Option<AuthUser>) -> HandlerResult {
    render_index(&state, Category::Programming, 1, viewer.is_some()).await
}

/// index_page
///
/// [Public Route] A numbered page of the Programming feed. Unparseable page tokens fall
/// back to page 1; out-of-range pages are clamped.
pub async fn index_page(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(page): Path<String>,
) -> HandlerResult {
    render_index(
        &state,
        Category::Programming,
        parse_page_token(Some(&page)),
        viewer.is_some(),
    )
    .await
}

/// other
///
/// [Public Route] First page of the Other feed.
pub async fn other(State(state): State<AppState>, viewer: Option<AuthUser>) -> HandlerResult {
    render_index(&state, Category::Other, 1, viewer.is_some()).await
}

/// other_page
///
/// [Public Route] A numbered page of the Other feed, with the same page token rules as
/// `index_page`.
pub async fn other_page(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(page): Path<String>,
) -> HandlerResult {
    render_index(
        &state,
        Category::Other,
        parse_page_token(Some(&page)),
        viewer.is_some(),
    )
    .await
}

/// all_articles
///
/// [Public Route] Every article, both categories, newest first.
pub async fn all_articles(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
) -> HandlerResult {
    let articles = state.repo.get_all().await;
    let html = state
        .renderer
        .render(ALL_TEMPLATE, &AllView::new(&articles, viewer.is_some()))?;
    Ok(Html(html).into_response())
}

/// view_article
///
/// [Public Route] A single article by (case-insensitive) slug, or 404.
pub async fn view_article(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(slug): Path<String>,
) -> HandlerResult {
    let (_, article) = state.repo.get_article(&slug).await.ok_or(AppError::NotFound)?;
    let view = ArticleView {
        article: ArticleCard::from(&article),
        logged_in: viewer.is_some(),
    };
    let html = state.renderer.render(ARTICLE_TEMPLATE, &view)?;
    Ok(Html(html).into_response())
}

// --- Article Management Handlers ---

fn render_form(
    state: &AppState,
    status: StatusCode,
    form: ArticleForm,
    action: String,
    errors: Vec<String>,
) -> HandlerResult {
    let html = state
        .renderer
        .render(FORM_TEMPLATE, &FormView::new(form, action, errors))?;
    Ok((status, Html(html)).into_response())
}

/// new_article_form
///
/// [Authenticated Route] Empty editor for a new article.
pub async fn new_article_form(_user: AuthUser, State(state): State<AppState>) -> HandlerResult {
    render_form(
        &state,
        StatusCode::OK,
        ArticleForm::default(),
        "/new".to_string(),
        vec![],
    )
}

/// create_article
///
/// [Authenticated Route] Validates and stores a new article, then redirects to it.
///
/// On validation failure the form comes back with status 400, every error message, and
/// the submitted values. A slug taken by a concurrent creation between the uniqueness
/// check and the insert is reported the same way.
pub async fn create_article(
    AuthUser { name }: AuthUser,
    State(state): State<AppState>,
    Form(form): Form<ArticleForm>,
) -> HandlerResult {
    let slug_in_use = !form.slug.is_empty() && state.repo.does_slug_exist(&form.slug).await;

    let fields = match validate_article(&form, slug_in_use) {
        Ok(fields) => fields,
        Err(errors) => {
            return render_form(
                &state,
                StatusCode::BAD_REQUEST,
                form,
                "/new".to_string(),
                messages(&errors),
            );
        }
    };

    let article = Article::create(fields, Utc::now());
    let slug = article.slug.clone();

    match state.repo.new_article(article).await {
        Ok(id) => {
            tracing::info!(id, slug = %slug, author = %name, "article created");
            Ok(Redirect::to(&format!("/{slug}")).into_response())
        }
        Err(RepositoryError::SlugTaken) => render_form(
            &state,
            StatusCode::BAD_REQUEST,
            form,
            "/new".to_string(),
            messages(&[ValidationError::SlugAlreadyExists]),
        ),
        Err(e) => Err(e.into()),
    }
}

/// edit_article_form
///
/// [Authenticated Route] Editor pre-filled with the stored article.
pub async fn edit_article_form(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> HandlerResult {
    let (_, article) = state.repo.get_article(&slug).await.ok_or(AppError::NotFound)?;
    let action = format!("/{}/edit", article.slug);
    render_form(&state, StatusCode::OK, ArticleForm::from(&article), action, vec![])
}

/// update_article
///
/// [Authenticated Route] Applies an edit, keeping the original publication time, then
/// redirects to the article under its (possibly new) slug.
pub async fn update_article(
    AuthUser { name }: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Form(form): Form<ArticleForm>,
) -> HandlerResult {
    let (id, stored) = state.repo.get_article(&slug).await.ok_or(AppError::NotFound)?;
    let action = format!("/{}/edit", stored.slug);

    let fields = match validate_article(&form, false) {
        Ok(fields) => fields,
        Err(errors) => {
            return render_form(&state, StatusCode::BAD_REQUEST, form, action, messages(&errors));
        }
    };

    let edited = stored.edit(fields, Utc::now());
    let new_slug = edited.slug.clone();

    match state.repo.edit_article(id, edited).await {
        Ok(()) => {
            tracing::info!(id, slug = %new_slug, author = %name, "article edited");
            Ok(Redirect::to(&format!("/{new_slug}")).into_response())
        }
        Err(RepositoryError::SlugTaken) => render_form(
            &state,
            StatusCode::BAD_REQUEST,
            form,
            action,
            messages(&[ValidationError::SlugAlreadyExists]),
        ),
        Err(RepositoryError::NotFound) => Err(AppError::NotFound),
        Err(e) => Err(e.into()),
    }
}

/// delete_article
///
/// [Authenticated Route] Removes the article and returns to the admin panel.
pub async fn delete_article(
    AuthUser { name }: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> HandlerResult {
    let (id, _) = state.repo.get_article(&slug).await.ok_or(AppError::NotFound)?;

    if !state.repo.delete_article(id).await {
        return Err(AppError::NotFound);
    }

    tracing::info!(id, slug = %slug, author = %name, "article deleted");
    Ok(Redirect::to("/admin").into_response())
}

/// admin_panel
///
/// [Authenticated Route] Overview of every article with edit and delete links.
pub async fn admin_panel(
    AuthUser { name }: AuthUser,
    State(state): State<AppState>,
) -> HandlerResult {
    let articles = state.repo.get_all().await;
    let html = state
        .renderer
        .render(ADMIN_TEMPLATE, &AdminView::new(&articles, name))?;
    Ok(Html(html).into_response())
}

// --- Session Handlers ---

fn render_login(
    state: &AppState,
    status: StatusCode,
    username: String,
    errors: &[LoginError],
) -> HandlerResult {
    let view = LoginView {
        username,
        errors: messages(errors),
        logged_in: false,
    };
    let html = state.renderer.render(LOGIN_TEMPLATE, &view)?;
    Ok((status, Html(html)).into_response())
}

/// login_page
///
/// [Public Route] Login form; an already authenticated visitor goes straight to the panel.
pub async fn login_page(State(state): State<AppState>, viewer: Option<AuthUser>) -> HandlerResult {
    if viewer.is_some() {
        return Ok(Redirect::to("/admin").into_response());
    }
    render_login(&state, StatusCode::OK, String::new(), &[])
}

/// login
///
/// [Public Route] Verifies the submitted credentials and issues a session cookie.
///
/// * Missing username and/or password: 422 with one message per missing field.
/// * Unknown user or wrong password: 401 with one generic message; nothing tells the
///   two cases apart, and both pay for a full hash verification.
/// * Success: 303 to `/admin` carrying the new session cookie.
///
/// Every attempt that reaches the credential check is queued for notification.
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Form(form): Form<LoginForm>,
) -> HandlerResult {
    let missing = validate_login(&form.username, &form.password);
    if !missing.is_empty() {
        return render_login(&state, StatusCode::UNPROCESSABLE_ENTITY, form.username, &missing);
    }

    let user = state.repo.get_user(&form.username).await;
    let verified = verify_credentials(
        user.as_ref().map(|u| u.password_hash.as_str()),
        &form.password,
    );

    state
        .notifier
        .dispatch(LoginAttempt::new(&form.username, &ip, verified));

    if !verified {
        tracing::warn!(username = %form.username, ip = %ip, "failed login attempt");
        return render_login(
            &state,
            StatusCode::UNAUTHORIZED,
            form.username,
            &[LoginError::InvalidCredentials],
        );
    }

    let mut session = Session::default();
    state.sessions.set(
        &mut session,
        SessionData {
            name: form.username.clone(),
            authenticated: true,
        },
    );
    let cookie = state.sessions.save(&session, SESSION_COOKIE)?;

    tracing::info!(username = %form.username, ip = %ip, session = %session.id(), "login succeeded");
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/admin")).into_response())
}

/// logout
///
/// [Public Route] Expires the session cookie and revokes the session, then goes home.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> HandlerResult {
    let mut session = state
        .sessions
        .get(&headers, SESSION_COOKIE)
        .unwrap_or_default();

    let previous = state.sessions.read_state(&session);
    state.sessions.set(&mut session, SessionData::default());
    state.sessions.set_option(&mut session, SessionOption::MaxAge(-1));
    let cookie = state.sessions.save(&session, SESSION_COOKIE)?;

    if previous.authenticated {
        tracing::info!(username = %previous.name, session = %session.id(), "logged out");
    }
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
}
