use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{UNKNOWN_ARTIST, UNKNOWN_DURATION};
use crate::services::metadata::{format_duration, MetadataResolver};

/// One entry of the playlist: an uploaded audio file plus its display metadata.
///
/// `location` is fixed at construction and is the key used to match the
/// song against its persisted record and to delete the backing file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Song {
    location: PathBuf,
    title: String,
    artist: String,
    duration: String,
}

/// Persisted form of a [`Song`], one object per song in `songs.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRecord {
    pub title: String,
    pub artist: String,
    pub duration: String,
    // Stores written before the rename used `file_path`
    #[serde(alias = "file_path")]
    pub location: PathBuf,
}

impl Song {
    /// Builds a song, filling every missing field from the file itself.
    ///
    /// An artist equal to the "Unknown Artist" sentinel counts as missing and
    /// is retried against the embedded tag. Nothing here fails: unresolved
    /// fields fall back to the file stem, "Unknown Artist" and "unknown".
    pub fn new<R>(
        location: impl Into<PathBuf>,
        title: Option<String>,
        artist: Option<String>,
        duration: Option<String>,
        resolver: &R,
    ) -> Self
    where
        R: MetadataResolver + ?Sized,
    {
        let location = location.into();

        let title = title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| title_from_location(&location));

        let artist = match artist.filter(|a| !a.is_empty() && a != UNKNOWN_ARTIST) {
            Some(artist) => artist,
            None => resolver.artist(&location).unwrap_or_else(|reason| {
                log::debug!("No artist for {}: {}", location.display(), reason);
                UNKNOWN_ARTIST.to_string()
            }),
        };

        let duration = match duration.filter(|d| !d.is_empty()) {
            Some(duration) => duration,
            None => match resolver.duration(&location) {
                Ok(length) => format_duration(length),
                Err(reason) => {
                    log::debug!("No duration for {}: {}", location.display(), reason);
                    UNKNOWN_DURATION.to_string()
                }
            },
        };

        Self {
            location,
            title,
            artist,
            duration,
        }
    }

    /// Rebuilds a song from its persisted record without touching the file.
    pub fn from_record(record: SongRecord) -> Self {
        Self {
            location: record.location,
            title: record.title,
            artist: record.artist,
            duration: record.duration,
        }
    }

    pub fn to_record(&self) -> SongRecord {
        SongRecord {
            title: self.title.clone(),
            artist: self.artist.clone(),
            duration: self.duration.clone(),
            location: self.location.clone(),
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn duration(&self) -> &str {
        &self.duration
    }

    /// MIME type handed to the browser's audio element.
    pub fn audio_format(&self) -> &'static str {
        match extension_of(&self.location).as_deref() {
            Some("wav") => "audio/wav",
            _ => "audio/mpeg",
        }
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.title, self.artist)
    }
}

impl From<&Song> for SongRecord {
    fn from(song: &Song) -> Self {
        song.to_record()
    }
}

/// File name without its extension, falling back to the whole path.
pub fn title_from_location(location: &Path) -> String {
    location
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| location.to_string_lossy().to_string())
}

pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Resolved, Unresolved};
    use crate::services::metadata::TagResolver;
    use std::time::Duration;

    /// Resolver answering from fixed values, counting nothing.
    struct FixedResolver {
        artist: Resolved<String>,
        duration: Resolved<Duration>,
    }

    impl MetadataResolver for FixedResolver {
        fn title(&self, _path: &Path) -> Resolved<String> {
            Err(Unresolved::NoTag)
        }

        fn artist(&self, _path: &Path) -> Resolved<String> {
            self.artist.clone()
        }

        fn duration(&self, _path: &Path) -> Resolved<Duration> {
            self.duration.clone()
        }
    }

    fn unresolvable() -> FixedResolver {
        FixedResolver {
            artist: Err(Unresolved::NoTag),
            duration: Err(Unresolved::Unreadable("missing".into())),
        }
    }

    #[test]
    fn test_defaults_when_nothing_resolves() {
        let song = Song::new("track7.mp3", None, None, None, &TagResolver);
        assert_eq!(song.title(), "track7");
        assert_eq!(song.artist(), UNKNOWN_ARTIST);
        assert_eq!(song.duration(), UNKNOWN_DURATION);
        assert_eq!(song.location(), Path::new("track7.mp3"));
    }

    #[test]
    fn test_title_strips_directories_and_extension() {
        let song = Song::new("songs/Blue Monday.wav", None, None, None, &unresolvable());
        assert_eq!(song.title(), "Blue Monday");
        assert_eq!(song.audio_format(), "audio/wav");
    }

    #[test]
    fn test_supplied_fields_are_kept() {
        let resolver = FixedResolver {
            artist: Ok("Tagged".into()),
            duration: Ok(Duration::from_secs(61)),
        };
        let song = Song::new(
            "a.mp3",
            Some("Title".into()),
            Some("Given".into()),
            Some("3:05".into()),
            &resolver,
        );
        assert_eq!(song.title(), "Title");
        assert_eq!(song.artist(), "Given");
        assert_eq!(song.duration(), "3:05");
    }

    #[test]
    fn test_unknown_artist_sentinel_is_retried() {
        let resolver = FixedResolver {
            artist: Ok("Tagged".into()),
            duration: Ok(Duration::from_secs(61)),
        };
        let song = Song::new("a.mp3", None, Some(UNKNOWN_ARTIST.into()), None, &resolver);
        assert_eq!(song.artist(), "Tagged");
        assert_eq!(song.duration(), "1:01");
    }

    #[test]
    fn test_display() {
        let song = Song::new("x.mp3", Some("Song".into()), Some("Band".into()), Some("1:00".into()), &unresolvable());
        assert_eq!(song.to_string(), "Song - Band");
    }

    #[test]
    fn test_record_round_trip_keeps_fields() {
        let song = Song::new("dir/x.mp3", Some("Song".into()), Some("Band".into()), Some("2:30".into()), &unresolvable());
        let json = serde_json::to_string(&song.to_record()).unwrap();
        let record: SongRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(Song::from_record(record), song);
    }

    #[test]
    fn test_record_accepts_legacy_file_path_key() {
        let json = r#"{"title":"T","artist":"A","duration":"0:42","file_path":"songs/t.mp3"}"#;
        let record: SongRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.location, PathBuf::from("songs/t.mp3"));

        // New records are written with `location`
        let out = serde_json::to_value(&record).unwrap();
        assert!(out.get("location").is_some());
        assert!(out.get("file_path").is_none());
    }
}
