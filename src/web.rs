//! HTTP surface: server-rendered pages for venues, artists, and shows.
//!
//! Every mutating handler follows the same contract: extract validated form
//! fields, open a transaction, perform one write, commit and flash a success
//! notice, or roll back and flash the failure. Flash messages travel as
//! `notice`/`error` query parameters on the redirect target.
use crate::errors::ShowbillError;
use crate::settings::Settings;
use crate::storage::{self, NewShow};
use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, NaiveDateTime, Utc};
use miette::IntoDiagnostic;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub db: DatabaseConnection,
}

pub async fn serve(settings: Settings, db: DatabaseConnection) -> miette::Result<()> {
    let state = AppState {
        settings: Arc::new(settings),
        db,
    };

    let router = router(state.clone());

    let addr: SocketAddr = format!(
        "{}:{}",
        state.settings.server.host, state.settings.server.port
    )
    .parse()
    .map_err(|e| miette::miette!("bad listen addr: {e}"))?;

    tracing::info!(%addr, base_url = %state.settings.base_url(), "Showbill listening");
    let listener = tokio::net::TcpListener::bind(addr).await.into_diagnostic()?;
    axum::serve(listener, router).await.into_diagnostic()?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/venues", get(venues_page))
        .route("/venues/search", axum::routing::post(search_venues_page))
        .route(
            "/venues/create",
            get(new_venue_form).post(create_venue_submit),
        )
        .route("/venues/{id}", get(venue_page).delete(delete_venue_submit))
        .route(
            "/venues/{id}/edit",
            get(edit_venue_form).post(edit_venue_submit),
        )
        .route("/artists", get(artists_page))
        .route("/artists/search", axum::routing::post(search_artists_page))
        .route(
            "/artists/create",
            get(new_artist_form).post(create_artist_submit),
        )
        .route("/artists/{id}", get(artist_page))
        .route(
            "/artists/{id}/edit",
            get(edit_artist_form).post(edit_artist_submit),
        )
        .route("/shows", get(shows_page))
        .route("/shows/create", get(new_show_form).post(create_show_submit))
        .nest_service("/static", ServeDir::new("static"))
        .fallback(not_found)
        .with_state(state)
}

// ============================================================================
// Error mapping
// ============================================================================

/// Read-page failures: unknown ids render the 404 page, anything else the
/// generic 500 page. Mutating handlers never use this; they flash instead.
struct PageError(ShowbillError);

impl From<ShowbillError> for PageError {
    fn from(err: ShowbillError) -> Self {
        PageError(err)
    }
}

impl From<sea_orm::DbErr> for PageError {
    fn from(err: sea_orm::DbErr) -> Self {
        PageError(ShowbillError::Db(err))
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self.0 {
            ShowbillError::NotFound(what) => {
                tracing::debug!(%what, "page not found");
                (StatusCode::NOT_FOUND, Html(not_found_page())).into_response()
            }
            err => {
                tracing::error!(%err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Html(server_error_page())).into_response()
            }
        }
    }
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html(not_found_page()))
}

fn not_found_page() -> String {
    layout(
        "Not Found",
        "",
        "<h1>404</h1><p>That page does not exist. Try the <a href=\"/\">home page</a>.</p>",
    )
}

fn server_error_page() -> String {
    layout(
        "Server Error",
        "",
        "<h1>500</h1><p>Something went wrong on our end. Try the <a href=\"/\">home page</a>.</p>",
    )
}

// ============================================================================
// Flash messaging
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct FlashQuery {
    notice: Option<String>,
    error: Option<String>,
}

fn flash_banner(q: &FlashQuery) -> String {
    if let Some(notice) = &q.notice {
        format!(r#"<p class="flash">{}</p>"#, html_escape(notice))
    } else if let Some(error) = &q.error {
        format!(r#"<p class="flash error">{}</p>"#, html_escape(error))
    } else {
        String::new()
    }
}

fn redirect_with_notice(path: &str, message: &str) -> Redirect {
    let sep = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!("{path}{sep}notice={}", urlencoded(message)))
}

fn redirect_with_error(path: &str, message: &str) -> Redirect {
    let sep = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!("{path}{sep}error={}", urlencoded(message)))
}

/// Validation problems carry their own wording; everything else gets the
/// handler's generic failure line.
fn failure_flash(err: &ShowbillError, fallback: &str) -> String {
    match err {
        ShowbillError::Validation(msg) | ShowbillError::NotFound(msg) => msg.clone(),
        _ => fallback.to_string(),
    }
}

// ============================================================================
// Home
// ============================================================================

async fn home(
    State(state): State<AppState>,
    Query(flash): Query<FlashQuery>,
) -> Result<Html<String>, PageError> {
    let venues = storage::count_venues(&state.db).await?;
    let artists = storage::count_artists(&state.db).await?;
    let shows = storage::count_shows(&state.db).await?;

    let recent_venues = storage::recent_venues(&state.db, 3).await?;
    let recent_artists = storage::recent_artists(&state.db, 3).await?;

    let mut body = format!(
        r#"<h1>Showbill</h1>
<p class="muted">{venues} venues, {artists} artists, {shows} shows listed.</p>
<p>
    <a href="/venues/create">List a venue</a> |
    <a href="/artists/create">List an artist</a> |
    <a href="/shows/create">List a show</a>
</p>"#
    );

    if !recent_venues.is_empty() {
        body.push_str("<h2>Recently Listed Venues</h2><ul class=\"listing\">");
        for v in &recent_venues {
            body.push_str(&format!(
                r#"<li><a href="/venues/{}">{}</a></li>"#,
                v.id,
                html_escape(&v.name)
            ));
        }
        body.push_str("</ul>");
    }
    if !recent_artists.is_empty() {
        body.push_str("<h2>Recently Listed Artists</h2><ul class=\"listing\">");
        for a in &recent_artists {
            body.push_str(&format!(
                r#"<li><a href="/artists/{}">{}</a></li>"#,
                a.id,
                html_escape(&a.name)
            ));
        }
        body.push_str("</ul>");
    }

    Ok(Html(layout("Home", &flash_banner(&flash), &body)))
}

// ============================================================================
// Venues
// ============================================================================

async fn venues_page(
    State(state): State<AppState>,
    Query(flash): Query<FlashQuery>,
) -> Result<Html<String>, PageError> {
    let mut areas = storage::venues_by_area(&state.db).await?;
    // grouping carries no order; sort here for a stable page
    areas.sort_by(|a, b| (&a.state, &a.city).cmp(&(&b.state, &b.city)));

    let as_of = Utc::now().timestamp();
    let mut body = String::from("<h1>Venues</h1>");
    body.push_str(&search_form_html("/venues/search", "Find a venue"));

    if areas.is_empty() {
        body.push_str("<p class=\"muted\">No venues listed yet.</p>");
    }
    for area in &areas {
        body.push_str(&format!(
            "<h2>{}, {}</h2><ul class=\"listing\">",
            html_escape(area.city.as_deref().unwrap_or("Unknown city")),
            html_escape(area.state.as_deref().unwrap_or("??")),
        ));
        for v in &area.venues {
            let upcoming = storage::upcoming_shows_count_for_venue(&state.db, v.id, as_of).await?;
            body.push_str(&format!(
                r#"<li><a href="/venues/{}">{}</a> <span class="muted">{} upcoming shows</span></li>"#,
                v.id,
                html_escape(&v.name),
                upcoming
            ));
        }
        body.push_str("</ul>");
    }
    body.push_str(r#"<p><a href="/venues/create">List a new venue</a></p>"#);

    Ok(Html(layout("Venues", &flash_banner(&flash), &body)))
}

#[derive(Debug, Deserialize)]
struct SearchForm {
    search_term: String,
}

async fn search_venues_page(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> Result<Html<String>, PageError> {
    let results = storage::search_venues(&state.db, &form.search_term).await?;
    let as_of = Utc::now().timestamp();

    let mut body = format!(
        "<h1>Venues matching &quot;{}&quot;</h1><p class=\"muted\">{} results</p><ul class=\"listing\">",
        html_escape(&form.search_term),
        results.count
    );
    for v in &results.data {
        let upcoming = storage::upcoming_shows_count_for_venue(&state.db, v.id, as_of).await?;
        body.push_str(&format!(
            r#"<li><a href="/venues/{}">{}</a> <span class="muted">{} upcoming shows</span></li>"#,
            v.id,
            html_escape(&v.name),
            upcoming
        ));
    }
    body.push_str("</ul><p><a href=\"/venues\">Back to venues</a></p>");

    Ok(Html(layout("Venue Search", "", &body)))
}

async fn venue_page(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(flash): Query<FlashQuery>,
) -> Result<Html<String>, PageError> {
    let venue = storage::get_venue(&state.db, id)
        .await?
        .ok_or_else(|| ShowbillError::NotFound(format!("venue {id}")))?;

    let as_of = Utc::now().timestamp();
    let past = storage::past_shows_for_venue(&state.db, id, as_of).await?;
    let upcoming = storage::upcoming_shows_for_venue(&state.db, id, as_of).await?;

    let mut body = format!("<h1>{}</h1>", html_escape(&venue.name));
    body.push_str(&format!(
        "<p class=\"muted\">{}, {}</p>",
        html_escape(venue.city.as_deref().unwrap_or("Unknown city")),
        html_escape(venue.state.as_deref().unwrap_or("??")),
    ));
    if let Some(address) = &venue.address {
        body.push_str(&format!("<p>{}</p>", html_escape(address)));
    }
    if let Some(phone) = &venue.phone {
        body.push_str(&format!("<p>{}</p>", html_escape(phone)));
    }
    if !venue.genres.is_empty() {
        body.push_str(&format!(
            "<p>Genres: {}</p>",
            html_escape(&venue.genres.join(", "))
        ));
    }
    if let Some(website) = &venue.website {
        let website = html_escape(website);
        body.push_str(&format!(r#"<p><a href="{website}">{website}</a></p>"#));
    }
    if let Some(facebook_link) = &venue.facebook_link {
        let facebook_link = html_escape(facebook_link);
        body.push_str(&format!(
            r#"<p><a href="{facebook_link}">{facebook_link}</a></p>"#
        ));
    }
    if venue.seeking_talent {
        body.push_str("<p><strong>Seeking talent</strong></p>");
        if let Some(desc) = &venue.seeking_description {
            body.push_str(&format!("<p>{}</p>", html_escape(desc)));
        }
    }
    if let Some(image_link) = &venue.image_link {
        body.push_str(&format!(
            r#"<p><img src="{}" alt="{}" width="300"></p>"#,
            html_escape(image_link),
            html_escape(&venue.name)
        ));
    }

    body.push_str(&format!("<h2>Upcoming Shows ({})</h2>", upcoming.len()));
    body.push_str("<ul class=\"listing\">");
    for s in &upcoming {
        let ctx = storage::show_context(&state.db, s).await?;
        body.push_str(&format!(
            r#"<li><a href="/artists/{}">{}</a> <span class="muted">{}</span></li>"#,
            s.artist_id,
            html_escape(&ctx.artist_name),
            format_start_time(s.start_time)
        ));
    }
    body.push_str("</ul>");

    body.push_str(&format!("<h2>Past Shows ({})</h2>", past.len()));
    body.push_str("<ul class=\"listing\">");
    for s in &past {
        let ctx = storage::show_context(&state.db, s).await?;
        body.push_str(&format!(
            r#"<li><a href="/artists/{}">{}</a> <span class="muted">{}</span></li>"#,
            s.artist_id,
            html_escape(&ctx.artist_name),
            format_start_time(s.start_time)
        ));
    }
    body.push_str("</ul>");

    body.push_str(&format!(
        r#"<p>
    <a href="/venues/{id}/edit">Edit venue</a>
    <button class="danger" onclick="deleteVenue({id})">Delete venue</button>
</p>
<script>
async function deleteVenue(id) {{
    const resp = await fetch(`/venues/${{id}}`, {{ method: 'DELETE' }});
    window.location.href = resp.url || '/venues';
}}
</script>"#
    ));

    Ok(Html(layout(&venue.name, &flash_banner(&flash), &body)))
}

#[derive(Debug, Clone, Deserialize)]
struct VenueForm {
    name: String,
    city: Option<String>,
    state: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    genres: Option<String>,
    image_link: Option<String>,
    facebook_link: Option<String>,
    website: Option<String>,
    seeking_talent: Option<String>,
    seeking_description: Option<String>,
}

impl VenueForm {
    fn into_input(self) -> storage::NewVenue {
        storage::NewVenue {
            name: self.name,
            city: blank_to_none(self.city),
            state: blank_to_none(self.state),
            address: blank_to_none(self.address),
            phone: blank_to_none(self.phone),
            image_link: blank_to_none(self.image_link),
            facebook_link: blank_to_none(self.facebook_link),
            website: blank_to_none(self.website),
            genres: parse_genres(self.genres.as_deref()),
            seeking_talent: self.seeking_talent.is_some(),
            seeking_description: blank_to_none(self.seeking_description),
        }
    }
}

async fn new_venue_form(Query(flash): Query<FlashQuery>) -> Html<String> {
    let body = venue_form_html("/venues/create", "List Venue", None);
    Html(layout("New Venue", &flash_banner(&flash), &body))
}

async fn create_venue_submit(
    State(state): State<AppState>,
    Form(form): Form<VenueForm>,
) -> Response {
    let name = form.name.trim().to_string();
    let fallback = format!("An error occurred. Venue {name} could not be listed.");

    let txn = match state.db.begin().await {
        Ok(txn) => txn,
        Err(err) => {
            tracing::error!(%err, "failed to open transaction");
            return redirect_with_error("/venues/create", &fallback).into_response();
        }
    };

    match storage::create_venue(&txn, form.into_input()).await {
        Ok(venue) => match txn.commit().await {
            Ok(()) => redirect_with_notice(
                "/",
                &format!("Venue {} was successfully listed!", venue.name),
            )
            .into_response(),
            Err(err) => {
                tracing::error!(%err, "commit failed");
                redirect_with_error("/venues/create", &fallback).into_response()
            }
        },
        Err(err) => {
            let _ = txn.rollback().await;
            tracing::warn!(%err, "failed to create venue");
            redirect_with_error("/venues/create", &failure_flash(&err, &fallback)).into_response()
        }
    }
}

async fn edit_venue_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(flash): Query<FlashQuery>,
) -> Result<Response, PageError> {
    let venue = match storage::get_venue(&state.db, id).await? {
        Some(v) => v,
        None => {
            return Ok(
                redirect_with_error("/venues", &format!("Venue {id} does not exist."))
                    .into_response(),
            );
        }
    };

    let body = venue_form_html(&format!("/venues/{id}/edit"), "Save Venue", Some(&venue));
    Ok(Html(layout("Edit Venue", &flash_banner(&flash), &body)).into_response())
}

async fn edit_venue_submit(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<VenueForm>,
) -> Response {
    let name = form.name.trim().to_string();
    let fallback = format!("An error occurred. Venue {name} could not be updated.");
    let retry_route = format!("/venues/{id}/edit");

    let txn = match state.db.begin().await {
        Ok(txn) => txn,
        Err(err) => {
            tracing::error!(%err, "failed to open transaction");
            return redirect_with_error(&retry_route, &fallback).into_response();
        }
    };

    match storage::update_venue(&txn, id, form.into_input()).await {
        Ok(venue) => match txn.commit().await {
            Ok(()) => redirect_with_notice(
                &format!("/venues/{id}"),
                &format!("Venue {} was successfully updated!", venue.name),
            )
            .into_response(),
            Err(err) => {
                tracing::error!(%err, "commit failed");
                redirect_with_error(&retry_route, &fallback).into_response()
            }
        },
        Err(err) => {
            let _ = txn.rollback().await;
            tracing::warn!(%err, venue_id = id, "failed to update venue");
            match err {
                // gone entirely: nothing to retry against
                ShowbillError::NotFound(_) => {
                    redirect_with_error("/venues", &format!("Venue {id} does not exist."))
                        .into_response()
                }
                err => redirect_with_error(&retry_route, &failure_flash(&err, &fallback))
                    .into_response(),
            }
        }
    }
}

/// Errors are swallowed into a notification; the response is a redirect to
/// the venue listing regardless of outcome.
async fn delete_venue_submit(State(state): State<AppState>, Path(id): Path<i32>) -> Response {
    let fallback = "An error occurred. Venue could not be deleted.";

    let txn = match state.db.begin().await {
        Ok(txn) => txn,
        Err(err) => {
            tracing::error!(%err, "failed to open transaction");
            return redirect_with_error("/venues", fallback).into_response();
        }
    };

    match storage::delete_venue(&txn, id).await {
        Ok(()) => match txn.commit().await {
            Ok(()) => {
                redirect_with_notice("/venues", "Venue was successfully deleted.").into_response()
            }
            Err(err) => {
                tracing::error!(%err, "commit failed");
                redirect_with_error("/venues", fallback).into_response()
            }
        },
        Err(err) => {
            let _ = txn.rollback().await;
            tracing::warn!(%err, venue_id = id, "failed to delete venue");
            redirect_with_error("/venues", &failure_flash(&err, fallback)).into_response()
        }
    }
}

// ============================================================================
// Artists
// ============================================================================

async fn artists_page(
    State(state): State<AppState>,
    Query(flash): Query<FlashQuery>,
) -> Result<Html<String>, PageError> {
    let artists = storage::list_artists(&state.db).await?;

    let mut body = String::from("<h1>Artists</h1>");
    body.push_str(&search_form_html("/artists/search", "Find an artist"));

    if artists.is_empty() {
        body.push_str("<p class=\"muted\">No artists listed yet.</p>");
    } else {
        body.push_str("<ul class=\"listing\">");
        for a in &artists {
            body.push_str(&format!(
                r#"<li><a href="/artists/{}">{}</a></li>"#,
                a.id,
                html_escape(&a.name)
            ));
        }
        body.push_str("</ul>");
    }
    body.push_str(r#"<p><a href="/artists/create">List a new artist</a></p>"#);

    Ok(Html(layout("Artists", &flash_banner(&flash), &body)))
}

async fn search_artists_page(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> Result<Html<String>, PageError> {
    let results = storage::search_artists(&state.db, &form.search_term).await?;
    let as_of = Utc::now().timestamp();

    let mut body = format!(
        "<h1>Artists matching &quot;{}&quot;</h1><p class=\"muted\">{} results</p><ul class=\"listing\">",
        html_escape(&form.search_term),
        results.count
    );
    for a in &results.data {
        let upcoming = storage::upcoming_shows_count_for_artist(&state.db, a.id, as_of).await?;
        body.push_str(&format!(
            r#"<li><a href="/artists/{}">{}</a> <span class="muted">{} upcoming shows</span></li>"#,
            a.id,
            html_escape(&a.name),
            upcoming
        ));
    }
    body.push_str("</ul><p><a href=\"/artists\">Back to artists</a></p>");

    Ok(Html(layout("Artist Search", "", &body)))
}

async fn artist_page(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(flash): Query<FlashQuery>,
) -> Result<Html<String>, PageError> {
    let artist = storage::get_artist(&state.db, id)
        .await?
        .ok_or_else(|| ShowbillError::NotFound(format!("artist {id}")))?;

    let as_of = Utc::now().timestamp();
    let past = storage::past_shows_for_artist(&state.db, id, as_of).await?;
    let upcoming = storage::upcoming_shows_for_artist(&state.db, id, as_of).await?;

    let mut body = format!("<h1>{}</h1>", html_escape(&artist.name));
    body.push_str(&format!(
        "<p class=\"muted\">{}, {}</p>",
        html_escape(artist.city.as_deref().unwrap_or("Unknown city")),
        html_escape(artist.state.as_deref().unwrap_or("??")),
    ));
    if let Some(phone) = &artist.phone {
        body.push_str(&format!("<p>{}</p>", html_escape(phone)));
    }
    if !artist.genres.is_empty() {
        body.push_str(&format!(
            "<p>Genres: {}</p>",
            html_escape(&artist.genres.join(", "))
        ));
    }
    if let Some(website) = &artist.website {
        let website = html_escape(website);
        body.push_str(&format!(r#"<p><a href="{website}">{website}</a></p>"#));
    }
    if let Some(facebook_link) = &artist.facebook_link {
        let facebook_link = html_escape(facebook_link);
        body.push_str(&format!(
            r#"<p><a href="{facebook_link}">{facebook_link}</a></p>"#
        ));
    }
    if artist.seeking_venue {
        body.push_str("<p><strong>Seeking a venue</strong></p>");
        if let Some(desc) = &artist.seeking_description {
            body.push_str(&format!("<p>{}</p>", html_escape(desc)));
        }
    }
    if let Some(image_link) = &artist.image_link {
        body.push_str(&format!(
            r#"<p><img src="{}" alt="{}" width="300"></p>"#,
            html_escape(image_link),
            html_escape(&artist.name)
        ));
    }

    body.push_str(&format!("<h2>Upcoming Shows ({})</h2>", upcoming.len()));
    body.push_str("<ul class=\"listing\">");
    for s in &upcoming {
        let ctx = storage::show_context(&state.db, s).await?;
        body.push_str(&format!(
            r#"<li><a href="/venues/{}">{}</a> <span class="muted">{}</span></li>"#,
            s.venue_id,
            html_escape(&ctx.venue_name),
            format_start_time(s.start_time)
        ));
    }
    body.push_str("</ul>");

    body.push_str(&format!("<h2>Past Shows ({})</h2>", past.len()));
    body.push_str("<ul class=\"listing\">");
    for s in &past {
        let ctx = storage::show_context(&state.db, s).await?;
        body.push_str(&format!(
            r#"<li><a href="/venues/{}">{}</a> <span class="muted">{}</span></li>"#,
            s.venue_id,
            html_escape(&ctx.venue_name),
            format_start_time(s.start_time)
        ));
    }
    body.push_str("</ul>");

    body.push_str(&format!(
        r#"<p><a href="/artists/{id}/edit">Edit artist</a></p>"#
    ));

    Ok(Html(layout(&artist.name, &flash_banner(&flash), &body)))
}

#[derive(Debug, Clone, Deserialize)]
struct ArtistForm {
    name: String,
    city: Option<String>,
    state: Option<String>,
    phone: Option<String>,
    genres: Option<String>,
    image_link: Option<String>,
    facebook_link: Option<String>,
    website: Option<String>,
    seeking_venue: Option<String>,
    seeking_description: Option<String>,
}

impl ArtistForm {
    fn into_input(self) -> storage::NewArtist {
        storage::NewArtist {
            name: self.name,
            city: blank_to_none(self.city),
            state: blank_to_none(self.state),
            phone: blank_to_none(self.phone),
            image_link: blank_to_none(self.image_link),
            facebook_link: blank_to_none(self.facebook_link),
            website: blank_to_none(self.website),
            genres: parse_genres(self.genres.as_deref()),
            seeking_venue: self.seeking_venue.is_some(),
            seeking_description: blank_to_none(self.seeking_description),
        }
    }
}

async fn new_artist_form(Query(flash): Query<FlashQuery>) -> Html<String> {
    let body = artist_form_html("/artists/create", "List Artist", None);
    Html(layout("New Artist", &flash_banner(&flash), &body))
}

async fn create_artist_submit(
    State(state): State<AppState>,
    Form(form): Form<ArtistForm>,
) -> Response {
    let name = form.name.trim().to_string();
    let fallback = format!("An error occurred. Artist {name} could not be listed.");

    let txn = match state.db.begin().await {
        Ok(txn) => txn,
        Err(err) => {
            tracing::error!(%err, "failed to open transaction");
            return redirect_with_error("/artists/create", &fallback).into_response();
        }
    };

    match storage::create_artist(&txn, form.into_input()).await {
        Ok(artist) => match txn.commit().await {
            Ok(()) => redirect_with_notice(
                "/",
                &format!("Artist {} was successfully listed!", artist.name),
            )
            .into_response(),
            Err(err) => {
                tracing::error!(%err, "commit failed");
                redirect_with_error("/artists/create", &fallback).into_response()
            }
        },
        Err(err) => {
            let _ = txn.rollback().await;
            tracing::warn!(%err, "failed to create artist");
            redirect_with_error("/artists/create", &failure_flash(&err, &fallback)).into_response()
        }
    }
}

async fn edit_artist_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(flash): Query<FlashQuery>,
) -> Result<Response, PageError> {
    let artist = match storage::get_artist(&state.db, id).await? {
        Some(a) => a,
        None => {
            return Ok(
                redirect_with_error("/artists", &format!("Artist {id} does not exist."))
                    .into_response(),
            );
        }
    };

    let body = artist_form_html(&format!("/artists/{id}/edit"), "Save Artist", Some(&artist));
    Ok(Html(layout("Edit Artist", &flash_banner(&flash), &body)).into_response())
}

async fn edit_artist_submit(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<ArtistForm>,
) -> Response {
    let name = form.name.trim().to_string();
    let fallback = format!("An error occurred. Artist {name} could not be updated.");
    let retry_route = format!("/artists/{id}/edit");

    let txn = match state.db.begin().await {
        Ok(txn) => txn,
        Err(err) => {
            tracing::error!(%err, "failed to open transaction");
            return redirect_with_error(&retry_route, &fallback).into_response();
        }
    };

    match storage::update_artist(&txn, id, form.into_input()).await {
        Ok(artist) => match txn.commit().await {
            Ok(()) => redirect_with_notice(
                &format!("/artists/{id}"),
                &format!("Artist {} was successfully updated!", artist.name),
            )
            .into_response(),
            Err(err) => {
                tracing::error!(%err, "commit failed");
                redirect_with_error(&retry_route, &fallback).into_response()
            }
        },
        Err(err) => {
            let _ = txn.rollback().await;
            tracing::warn!(%err, artist_id = id, "failed to update artist");
            match err {
                ShowbillError::NotFound(_) => {
                    redirect_with_error("/artists", &format!("Artist {id} does not exist."))
                        .into_response()
                }
                err => redirect_with_error(&retry_route, &failure_flash(&err, &fallback))
                    .into_response(),
            }
        }
    }
}

// ============================================================================
// Shows
// ============================================================================

async fn shows_page(
    State(state): State<AppState>,
    Query(flash): Query<FlashQuery>,
) -> Result<Html<String>, PageError> {
    let shows = storage::list_shows(&state.db).await?;

    let mut body = String::from("<h1>Shows</h1>");
    if shows.is_empty() {
        body.push_str("<p class=\"muted\">No shows listed yet.</p>");
    } else {
        body.push_str("<ul class=\"listing\">");
        for s in &shows {
            let ctx = storage::show_context(&state.db, s).await?;
            body.push_str(&format!(
                r#"<li><a href="/artists/{}">{}</a> at <a href="/venues/{}">{}</a> <span class="muted">{}</span></li>"#,
                s.artist_id,
                html_escape(&ctx.artist_name),
                s.venue_id,
                html_escape(&ctx.venue_name),
                format_start_time(s.start_time)
            ));
        }
        body.push_str("</ul>");
    }
    body.push_str(r#"<p><a href="/shows/create">List a new show</a></p>"#);

    Ok(Html(layout("Shows", &flash_banner(&flash), &body)))
}

#[derive(Debug, Deserialize)]
struct ShowForm {
    artist_id: String,
    venue_id: String,
    start_time: Option<String>,
}

impl ShowForm {
    fn into_input(self) -> Result<NewShow, ShowbillError> {
        let artist_id = self
            .artist_id
            .trim()
            .parse::<i32>()
            .map_err(|_| ShowbillError::Validation("artist id must be a number".into()))?;
        let venue_id = self
            .venue_id
            .trim()
            .parse::<i32>()
            .map_err(|_| ShowbillError::Validation("venue id must be a number".into()))?;
        let start_time = match self.start_time.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_start_time(raw)?),
        };
        Ok(NewShow {
            artist_id,
            venue_id,
            start_time,
        })
    }
}

async fn new_show_form(Query(flash): Query<FlashQuery>) -> Html<String> {
    let body = r#"<h1>List a Show</h1>
<form method="POST" action="/shows/create">
    <label>
        Artist ID:
        <input type="text" name="artist_id" required>
    </label>
    <label>
        Venue ID:
        <input type="text" name="venue_id" required>
    </label>
    <label>
        Start time (YYYY-MM-DD HH:MM, blank for now):
        <input type="text" name="start_time" placeholder="2026-08-07 20:00">
    </label>
    <button type="submit">List Show</button>
</form>"#;
    Html(layout("New Show", &flash_banner(&flash), body))
}

async fn create_show_submit(State(state): State<AppState>, Form(form): Form<ShowForm>) -> Response {
    let fallback = "An error occurred. Show could not be listed.";

    let input = match form.into_input() {
        Ok(input) => input,
        Err(err) => {
            return redirect_with_error("/shows/create", &failure_flash(&err, fallback))
                .into_response();
        }
    };

    let txn = match state.db.begin().await {
        Ok(txn) => txn,
        Err(err) => {
            tracing::error!(%err, "failed to open transaction");
            return redirect_with_error("/shows/create", fallback).into_response();
        }
    };

    match storage::create_show(&txn, input).await {
        Ok(_) => match txn.commit().await {
            Ok(()) => {
                redirect_with_notice("/", "Show was successfully listed!").into_response()
            }
            Err(err) => {
                tracing::error!(%err, "commit failed");
                redirect_with_error("/shows/create", fallback).into_response()
            }
        },
        Err(err) => {
            let _ = txn.rollback().await;
            tracing::warn!(%err, "failed to create show");
            redirect_with_error("/shows/create", &failure_flash(&err, fallback)).into_response()
        }
    }
}

// ============================================================================
// Rendering helpers
// ============================================================================

fn layout(title: &str, flash_html: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{title} - Showbill</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <link rel="stylesheet" href="/static/showbill.css">
    <style>
        body {{ font-family: system-ui, sans-serif; max-width: 800px; margin: 40px auto; padding: 20px; }}
        nav a {{ margin-right: 15px; }}
        .flash {{ padding: 10px; border-left: 4px solid #007bff; background: #e7f3ff; }}
        .flash.error {{ border-left-color: #dc3545; background: #fdecea; }}
        label {{ display: block; margin-top: 10px; }}
        input[type="text"], textarea {{ width: 100%; padding: 8px; margin-top: 5px; box-sizing: border-box; }}
        button {{ margin-top: 10px; padding: 8px 16px; background-color: #007bff; color: white; border: none; cursor: pointer; }}
        button:hover {{ background-color: #0056b3; }}
        button.danger {{ background-color: #dc3545; }}
        button.danger:hover {{ background-color: #a71d2a; }}
        ul.listing li {{ margin: 6px 0; }}
        .muted {{ color: #666; }}
    </style>
</head>
<body>
    <nav>
        <a href="/">Home</a>
        <a href="/venues">Venues</a>
        <a href="/artists">Artists</a>
        <a href="/shows">Shows</a>
    </nav>
    {flash_html}
    {body}
</body>
</html>"#,
        title = html_escape(title),
        flash_html = flash_html,
        body = body
    )
}

fn search_form_html(action: &str, placeholder: &str) -> String {
    format!(
        r#"<form method="POST" action="{action}">
    <input type="text" name="search_term" placeholder="{placeholder}">
    <button type="submit">Search</button>
</form>"#
    )
}

fn text_field(label: &str, name: &str, value: &str) -> String {
    format!(
        r#"<label>
        {label}:
        <input type="text" name="{name}" value="{}">
    </label>"#,
        html_escape(value)
    )
}

fn venue_form_html(action: &str, submit_label: &str, venue: Option<&storage::Venue>) -> String {
    let name = venue.map(|v| v.name.as_str()).unwrap_or("");
    let city = venue.and_then(|v| v.city.as_deref()).unwrap_or("");
    let state = venue.and_then(|v| v.state.as_deref()).unwrap_or("");
    let address = venue.and_then(|v| v.address.as_deref()).unwrap_or("");
    let phone = venue.and_then(|v| v.phone.as_deref()).unwrap_or("");
    let genres = venue.map(|v| v.genres.join(", ")).unwrap_or_default();
    let image_link = venue.and_then(|v| v.image_link.as_deref()).unwrap_or("");
    let facebook_link = venue.and_then(|v| v.facebook_link.as_deref()).unwrap_or("");
    let website = venue.and_then(|v| v.website.as_deref()).unwrap_or("");
    let seeking_talent = venue.map(|v| v.seeking_talent).unwrap_or(false);
    let seeking_description = venue
        .and_then(|v| v.seeking_description.as_deref())
        .unwrap_or("");

    format!(
        r#"<h1>{heading}</h1>
<form method="POST" action="{action}">
    {name_field}
    {city_field}
    {state_field}
    {address_field}
    {phone_field}
    {genres_field}
    {image_field}
    {facebook_field}
    {website_field}
    <label>
        <input type="checkbox" name="seeking_talent"{checked}>
        Seeking talent
    </label>
    <label>
        Seeking description:
        <textarea name="seeking_description">{seeking_description}</textarea>
    </label>
    <button type="submit">{submit_label}</button>
</form>"#,
        heading = submit_label,
        action = action,
        name_field = text_field("Name", "name", name),
        city_field = text_field("City", "city", city),
        state_field = text_field("State", "state", state),
        address_field = text_field("Address", "address", address),
        phone_field = text_field("Phone", "phone", phone),
        genres_field = text_field("Genres (comma separated)", "genres", &genres),
        image_field = text_field("Image link", "image_link", image_link),
        facebook_field = text_field("Facebook link", "facebook_link", facebook_link),
        website_field = text_field("Website", "website", website),
        checked = if seeking_talent { " checked" } else { "" },
        seeking_description = html_escape(seeking_description),
        submit_label = submit_label
    )
}

fn artist_form_html(action: &str, submit_label: &str, artist: Option<&storage::Artist>) -> String {
    let name = artist.map(|a| a.name.as_str()).unwrap_or("");
    let city = artist.and_then(|a| a.city.as_deref()).unwrap_or("");
    let state = artist.and_then(|a| a.state.as_deref()).unwrap_or("");
    let phone = artist.and_then(|a| a.phone.as_deref()).unwrap_or("");
    let genres = artist.map(|a| a.genres.join(", ")).unwrap_or_default();
    let image_link = artist.and_then(|a| a.image_link.as_deref()).unwrap_or("");
    let facebook_link = artist.and_then(|a| a.facebook_link.as_deref()).unwrap_or("");
    let website = artist.and_then(|a| a.website.as_deref()).unwrap_or("");
    let seeking_venue = artist.map(|a| a.seeking_venue).unwrap_or(false);
    let seeking_description = artist
        .and_then(|a| a.seeking_description.as_deref())
        .unwrap_or("");

    format!(
        r#"<h1>{heading}</h1>
<form method="POST" action="{action}">
    {name_field}
    {city_field}
    {state_field}
    {phone_field}
    {genres_field}
    {image_field}
    {facebook_field}
    {website_field}
    <label>
        <input type="checkbox" name="seeking_venue"{checked}>
        Seeking a venue
    </label>
    <label>
        Seeking description:
        <textarea name="seeking_description">{seeking_description}</textarea>
    </label>
    <button type="submit">{submit_label}</button>
</form>"#,
        heading = submit_label,
        action = action,
        name_field = text_field("Name", "name", name),
        city_field = text_field("City", "city", city),
        state_field = text_field("State", "state", state),
        phone_field = text_field("Phone", "phone", phone),
        genres_field = text_field("Genres (comma separated)", "genres", &genres),
        image_field = text_field("Image link", "image_link", image_link),
        facebook_field = text_field("Facebook link", "facebook_link", facebook_link),
        website_field = text_field("Website", "website", website),
        checked = if seeking_venue { " checked" } else { "" },
        seeking_description = html_escape(seeking_description),
        submit_label = submit_label
    )
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn parse_genres(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

fn parse_start_time(raw: &str) -> Result<i64, ShowbillError> {
    for fmt in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt.and_utc().timestamp());
        }
    }
    Err(ShowbillError::Validation(format!(
        "unrecognized start time: {raw}"
    )))
}

fn format_start_time(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.format("%a %b %d, %Y %I:%M %p").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn urlencoded(s: &str) -> String {
    serde_urlencoded::to_string([("", s)])
        .unwrap_or_default()
        .trim_start_matches('=')
        .to_string()
}
