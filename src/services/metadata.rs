use std::path::Path;
use std::time::Duration;

use id3::{Tag, TagLike};
use lofty::prelude::*;
use lofty::probe::Probe;
use log::{debug, info};

use crate::config::{UNKNOWN_ARTIST, UNKNOWN_DURATION};
use crate::error::{Resolved, Unresolved};
use crate::models::song::{extension_of, title_from_location};
use crate::services::artist_lookup::ArtistLookup;

/// Best-effort reader for the metadata embedded in an audio file.
///
/// Implementations never fail loudly; everything they can't find comes
/// back as [`Unresolved`].
pub trait MetadataResolver: Send + Sync {
    fn title(&self, path: &Path) -> Resolved<String>;
    fn artist(&self, path: &Path) -> Resolved<String>;
    fn duration(&self, path: &Path) -> Resolved<Duration>;
}

/// Reads ID3 tags and MP3 frame durations, and falls back to lofty for
/// every other container (WAV, FLAC, ...).
#[derive(Debug, Clone, Copy, Default)]
pub struct TagResolver;

#[derive(Clone, Copy)]
enum Field {
    Title,
    Artist,
}

impl Field {
    fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Artist => "artist",
        }
    }
}

impl TagResolver {
    fn is_mp3(path: &Path) -> bool {
        extension_of(path).as_deref() == Some("mp3")
    }

    fn read_id3(path: &Path, field: Field) -> Resolved<String> {
        let tag = match Tag::read_from_path(path) {
            Ok(tag) => tag,
            Err(e) if matches!(e.kind, id3::ErrorKind::NoTag) => return Err(Unresolved::NoTag),
            Err(e) => {
                info!("Could not read ID3 tags from {}: {}", path.display(), e);
                return Err(Unresolved::Unreadable(e.to_string()));
            }
        };

        let value = match field {
            Field::Title => tag.title(),
            Field::Artist => tag.artist(),
        };

        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or(Unresolved::MissingField(field.name()))
    }

    fn read_lofty(path: &Path, field: Field) -> Resolved<String> {
        let tagged_file = Probe::open(path)
            .and_then(|probe| probe.read())
            .map_err(|e| {
                info!("Could not read tags from {}: {}", path.display(), e);
                Unresolved::Unreadable(e.to_string())
            })?;

        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag())
            .ok_or(Unresolved::NoTag)?;

        let value = match field {
            Field::Title => tag.title(),
            Field::Artist => tag.artist(),
        };

        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(Unresolved::MissingField(field.name()))
    }

    fn read_field(&self, path: &Path, field: Field) -> Resolved<String> {
        if Self::is_mp3(path) {
            Self::read_id3(path, field)
        } else {
            Self::read_lofty(path, field)
        }
    }
}

impl MetadataResolver for TagResolver {
    fn title(&self, path: &Path) -> Resolved<String> {
        self.read_field(path, Field::Title)
    }

    fn artist(&self, path: &Path) -> Resolved<String> {
        self.read_field(path, Field::Artist)
    }

    fn duration(&self, path: &Path) -> Resolved<Duration> {
        if Self::is_mp3(path) {
            return mp3_duration::from_path(path).map_err(|e| {
                info!("Could not get duration for {}: {}", path.display(), e);
                Unresolved::Unreadable(e.to_string())
            });
        }

        let tagged_file = Probe::open(path)
            .and_then(|probe| probe.read())
            .map_err(|e| {
                info!("Could not get duration for {}: {}", path.display(), e);
                Unresolved::Unreadable(e.to_string())
            })?;

        Ok(tagged_file.properties().duration())
    }
}

/// Formats a length as `m:ss`, truncating to whole seconds.
pub fn format_duration(length: Duration) -> String {
    let total_seconds = length.as_secs();
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Display metadata for a freshly uploaded file, sentinels already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadMetadata {
    pub title: String,
    pub artist: String,
    pub duration: String,
}

/// Resolves everything the playlist shows for an upload.
///
/// The title comes from the tag or the file name. A missing artist is
/// looked up remotely by that title before settling for "Unknown Artist".
pub async fn resolve_upload<R, L>(path: &Path, resolver: &R, lookup: &L) -> UploadMetadata
where
    R: MetadataResolver + ?Sized,
    L: ArtistLookup + ?Sized,
{
    let title = resolver
        .title(path)
        .unwrap_or_else(|_| title_from_location(path));

    let artist = match resolver.artist(path) {
        Ok(artist) => artist,
        Err(reason) => {
            debug!("No embedded artist in {} ({}), asking remote lookup", path.display(), reason);
            lookup
                .artist_for_title(&title)
                .await
                .unwrap_or_else(|_| UNKNOWN_ARTIST.to_string())
        }
    };

    let duration = resolver
        .duration(path)
        .map(format_duration)
        .unwrap_or_else(|_| UNKNOWN_DURATION.to_string());

    UploadMetadata {
        title,
        artist,
        duration,
    }
}
