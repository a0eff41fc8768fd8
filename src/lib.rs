// Library exports for the neon-playlist crate
// main.rs only launches what `build_rocket` assembles, so integration tests
// can drive the same server through Rocket's local client.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

use parking_lot::Mutex;
use rocket::data::{Limits, ToByteUnit};
use rocket::{catchers, routes, Build, Rocket};
use rocket_dyn_templates::Template;

use crate::services::artist_lookup::{self, ArtistLookup};
use crate::services::metadata::{MetadataResolver, TagResolver};
use crate::services::session::PlaylistSession;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Resolved, Result, Unresolved};
pub use models::{Playlist, Song, SongRecord};
pub use services::session::{Outcome, PlaylistSnapshot};
pub use services::store::MetadataStore;

/// The one playlist session the server owns, shared by every handler.
pub type SharedSession = Mutex<PlaylistSession>;

/// Metadata sources used when a song is uploaded.
pub struct Collaborators {
    pub resolver: Box<dyn MetadataResolver>,
    pub lookup: Box<dyn ArtistLookup>,
}

/// Builds the server with the real tag reader and the configured artist lookup.
pub fn build_rocket(config: Config) -> Result<Rocket<Build>> {
    let lookup = artist_lookup::from_config(&config)?;
    build_rocket_with(config, Box::new(TagResolver), lookup)
}

pub fn build_rocket_with(
    config: Config,
    resolver: Box<dyn MetadataResolver>,
    lookup: Box<dyn ArtistLookup>,
) -> Result<Rocket<Build>> {
    let session = PlaylistSession::open(&config)?;

    // Uploads are whole audio files, far above Rocket's 1 MiB default
    let limits = Limits::default()
        .limit("file", config.max_upload_mb.mebibytes())
        .limit("data-form", (config.max_upload_mb + 1).mebibytes());

    let figment = rocket::Config::figment()
        .merge(("address", config.host.clone()))
        .merge(("port", config.port))
        .merge(("limits", limits));

    Ok(rocket::custom(figment)
        .manage(Mutex::new(session))
        .manage(Collaborators { resolver, lookup })
        .mount("/", routes![
            // Page
            handlers::index,

            // Playlist API
            handlers::get_playlist,
            handlers::add_song,
            handlers::remove_songs,

            // Controls
            handlers::next_song,
            handlers::previous_song,
            handlers::shuffle,
            handlers::clear,

            // Audio files and utilities
            handlers::song_file,
            handlers::health_check,
        ])
        .register("/", catchers![
            handlers::not_found,
            handlers::unprocessable,
            handlers::server_error,
        ])
        .attach(Template::fairing()))
}
