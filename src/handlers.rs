// HTTP surface: the playlist page, the JSON API behind its buttons and the
// audio files handed to the browser's <audio> element.

use rocket::form::Form;
use rocket::fs::{NamedFile, TempFile};
use rocket::http::{ContentType, Status};
use rocket::serde::json::Json;
use rocket::State;
use rocket::{catch, get, post, FromForm, Request};
use rocket_dyn_templates::{context, Template};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use log::{info, warn};

use crate::error::{AppError, Result};
use crate::models::song::{extension_of, Song};
use crate::services::metadata::resolve_upload;
use crate::services::session::{Outcome, PlaylistSnapshot, WARN_NO_FILE};
use crate::utils::storage;
use crate::{Collaborators, SharedSession};

#[derive(Debug, Serialize)]
pub struct ActionReply {
    pub ok: bool,
    pub message: String,
    pub playlist: PlaylistSnapshot,
}

pub type ActionResponse = (Status, Json<ActionReply>);

fn reply(outcome: Outcome, playlist: PlaylistSnapshot) -> ActionResponse {
    let status = if outcome.is_done() {
        Status::Ok
    } else {
        warn!("{}", outcome.message());
        Status::BadRequest
    };

    (status, Json(ActionReply {
        ok: outcome.is_done(),
        message: outcome.message().to_string(),
        playlist,
    }))
}

#[derive(FromForm)]
pub struct Upload<'r> {
    file: Option<TempFile<'r>>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveRequest {
    #[serde(default)]
    pub indices: Vec<usize>,
}

#[get("/")]
pub fn index(session: &State<SharedSession>) -> Template {
    let playlist = session.lock().snapshot();
    Template::render("index", context! {
        title: "Music Playlist",
        playlist: playlist,
    })
}

#[get("/api/playlist")]
pub fn get_playlist(session: &State<SharedSession>) -> Json<PlaylistSnapshot> {
    Json(session.lock().snapshot())
}

#[post("/api/songs", data = "<upload>")]
pub async fn add_song(
    upload: Form<Upload<'_>>,
    session: &State<SharedSession>,
    collaborators: &State<Collaborators>,
) -> Result<ActionResponse> {
    let file = match upload.file.as_ref() {
        Some(file) if file.len() > 0 => file,
        _ => {
            let snapshot = session.lock().snapshot();
            return Ok(reply(Outcome::Warning(WARN_NO_FILE.to_string()), snapshot));
        }
    };

    let raw_name = file
        .raw_name()
        .map(|name| name.dangerous_unsafe_unsanitized_raw().as_str().to_string())
        .unwrap_or_default();

    let mut bytes = Vec::with_capacity(file.len() as usize);
    Box::pin(file.open().await?).read_to_end(&mut bytes).await?;

    // Only the name is checked under the lock, the bytes are written outside it
    let location = session.lock().upload_location(&raw_name)?;
    storage::write_file(&location, &bytes).await?;

    // Tag reading and the remote lookup run without holding the session
    let resolver = &*collaborators.resolver;
    let meta = resolve_upload(&location, resolver, &*collaborators.lookup).await;
    let song = Song::new(
        location,
        Some(meta.title),
        Some(meta.artist),
        Some(meta.duration),
        resolver,
    );

    let mut session = session.lock();
    let outcome = session.add_song(song)?;
    Ok(reply(outcome, session.snapshot()))
}

#[post("/api/songs/remove", format = "json", data = "<request>")]
pub fn remove_songs(
    request: Json<RemoveRequest>,
    session: &State<SharedSession>,
) -> Result<ActionResponse> {
    let mut session = session.lock();
    let outcome = session.remove_selected(&request.indices)?;
    Ok(reply(outcome, session.snapshot()))
}

#[post("/api/next")]
pub fn next_song(session: &State<SharedSession>) -> ActionResponse {
    let mut session = session.lock();
    session.next();
    let status = session.status().to_string();
    reply(Outcome::Done(status), session.snapshot())
}

#[post("/api/previous")]
pub fn previous_song(session: &State<SharedSession>) -> ActionResponse {
    let mut session = session.lock();
    session.previous();
    let status = session.status().to_string();
    reply(Outcome::Done(status), session.snapshot())
}

#[post("/api/shuffle")]
pub fn shuffle(session: &State<SharedSession>) -> ActionResponse {
    let mut session = session.lock();
    let outcome = session.shuffle();
    reply(outcome, session.snapshot())
}

#[post("/api/clear")]
pub fn clear(session: &State<SharedSession>) -> Result<ActionResponse> {
    let mut session = session.lock();
    let removed = session.clear()?;
    info!("Cleared {} songs on request", removed);
    let status = session.status().to_string();
    Ok(reply(Outcome::Done(status), session.snapshot()))
}

// Audio for the browser player
#[get("/songs/<file..>")]
pub async fn song_file(
    file: PathBuf,
    session: &State<SharedSession>,
) -> Result<(ContentType, NamedFile)> {
    let content_type = match extension_of(&file).as_deref() {
        Some("mp3") => ContentType::new("audio", "mpeg"),
        Some("wav") => ContentType::new("audio", "wav"),
        _ => return Err(AppError::NotFound),
    };

    let path = session.lock().songs_dir().join(file);
    let named = NamedFile::open(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => AppError::NotFound,
        _ => AppError::Io(e),
    })?;
    Ok((content_type, named))
}

#[get("/api/health")]
pub fn health_check(session: &State<SharedSession>) -> Json<serde_json::Value> {
    let songs = session.lock().playlist().len();
    Json(serde_json::json!({
        "status": "ok",
        "songs": songs,
        "server_time": chrono::Local::now().to_rfc3339(),
    }))
}

// Error catchers
#[catch(404)]
pub fn not_found() -> Template {
    Template::render("error", context! {
        status: 404,
        message: "Page not found"
    })
}

#[catch(422)]
pub fn unprocessable(req: &Request<'_>) -> Template {
    warn!("Rejected malformed {} {}", req.method(), req.uri());
    Template::render("error", context! {
        status: 422,
        message: "The request could not be understood"
    })
}

#[catch(500)]
pub fn server_error() -> Template {
    Template::render("error", context! {
        status: 500,
        message: "Internal server error"
    })
}
