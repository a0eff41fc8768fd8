use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rand::Rng;
use serde::Serialize;

use crate::config::{Config, INITIAL_STATUS};
use crate::error::Result;
use crate::models::playlist::Playlist;
use crate::models::song::Song;
use crate::services::store::MetadataStore;
use crate::utils::storage;

pub const WARN_NO_FILE: &str = "Please upload a song file!";
pub const WARN_NO_SELECTION: &str = "No song selected to remove.";
pub const WARN_EMPTY_SHUFFLE: &str = "Add some songs first.";
const STATUS_EMPTY: &str = "Playlist is empty";
const STATUS_CLEARED: &str = "Playlist cleared!";
const MSG_REMOVED: &str = "Selected songs removed successfully!";

/// What a user action amounted to, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done(String),
    /// The action was not attempted.
    Warning(String),
}

impl Outcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Outcome::Done(message) | Outcome::Warning(message) => message,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SongView {
    pub index: usize,
    pub title: String,
    pub artist: String,
    pub duration: String,
    pub file_name: String,
    pub format: &'static str,
    pub display: String,
}

/// Read-only view of the session handed to the page and the JSON API.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlaylistSnapshot {
    pub songs: Vec<SongView>,
    pub current_index: Option<usize>,
    pub current: Option<SongView>,
    pub status: String,
}

/// One user's playlist together with its on-disk mirror.
///
/// Every mutating method keeps `songs.json` and the in-memory playlist in
/// the same order and persists before returning. Uploaded files live in
/// `songs_dir` and are deleted together with their songs.
#[derive(Debug)]
pub struct PlaylistSession {
    playlist: Playlist,
    store: MetadataStore,
    songs_dir: PathBuf,
    status: String,
    rehydrated: bool,
}

impl PlaylistSession {
    /// Starts a session: creates the songs folder and loads the store.
    pub fn open(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.songs_dir)?;

        let mut session = Self {
            playlist: Playlist::new(),
            store: MetadataStore::new(&config.metadata_file),
            songs_dir: config.songs_dir.clone(),
            status: INITIAL_STATUS.to_string(),
            rehydrated: false,
        };

        let loaded = session.rehydrate()?;
        info!(
            "Session opened on {} ({} songs loaded from {})",
            session.songs_dir.display(),
            loaded,
            session.store.path().display()
        );

        Ok(session)
    }

    /// Rebuilds the playlist from the store, once, and only into an empty playlist.
    pub fn rehydrate(&mut self) -> Result<usize> {
        if self.rehydrated {
            return Ok(0);
        }

        let records = self.store.load()?;
        self.rehydrated = true;

        if records.is_empty() || !self.playlist.is_empty() {
            return Ok(0);
        }

        let count = records.len();
        for record in records {
            self.playlist.add(Song::from_record(record));
        }
        Ok(count)
    }

    /// Where an upload named `file_name` is stored inside the songs folder.
    ///
    /// The client's file name is sanitised; an existing file with the same
    /// name gets overwritten by the caller's write.
    pub fn upload_location(&self, file_name: &str) -> Result<PathBuf> {
        let name = storage::sanitize_upload_name(file_name)?;
        Ok(self.songs_dir.join(name))
    }

    /// Adds a song, persisting its record first.
    pub fn add_song(&mut self, song: Song) -> Result<Outcome> {
        self.store.append(song.to_record())?;

        let message = format!("Added: {} (saved to {})", song, song.location().display());
        info!("{}", message);
        self.playlist.add(song);

        Ok(Outcome::Done(message))
    }

    /// Removes every selected index from the store, the playlist and the disk.
    ///
    /// Indices refer to the playlist as it was before the call; duplicates
    /// and out-of-range indices are ignored. Nothing changes unless the
    /// store write succeeds.
    pub fn remove_selected(&mut self, indices: &[usize]) -> Result<Outcome> {
        if indices.is_empty() {
            return Ok(Outcome::Warning(WARN_NO_SELECTION.to_string()));
        }

        let mut ordered = indices.to_vec();
        ordered.sort_unstable_by(|a, b| b.cmp(a));
        ordered.dedup();
        ordered.retain(|&index| index < self.playlist.len());

        if ordered.is_empty() {
            debug!("Selection {:?} matches no song", indices);
            return Ok(Outcome::Done(MSG_REMOVED.to_string()));
        }

        let locations: Vec<PathBuf> = ordered
            .iter()
            .filter_map(|&index| self.playlist.get(index))
            .map(|song| song.location().to_path_buf())
            .collect();
        let targets: Vec<&Path> = locations.iter().map(PathBuf::as_path).collect();

        let dropped = self.store.remove_locations(&targets)?;
        if dropped != targets.len() {
            warn!(
                "Removing {} songs but {} store records matched",
                targets.len(),
                dropped
            );
        }

        // Highest index first so the remaining ones stay valid
        let removed: Vec<Song> = ordered
            .into_iter()
            .filter_map(|index| self.playlist.remove(index))
            .collect();

        for song in &removed {
            storage::delete_file(song.location())?;
            info!("Removed {}", song);
        }

        Ok(Outcome::Done(MSG_REMOVED.to_string()))
    }

    /// Empties the store, then the playlist, and deletes every song file.
    pub fn clear(&mut self) -> Result<usize> {
        self.store.clear()?;
        let songs = self.playlist.clear();

        for song in &songs {
            storage::delete_file(song.location())?;
        }

        self.status = STATUS_CLEARED.to_string();
        info!("Playlist cleared ({} songs)", songs.len());
        Ok(songs.len())
    }

    pub fn next(&mut self) -> Option<&Song> {
        let status = match self.playlist.advance() {
            Some(song) => format!("Now Playing: {}", song),
            None => STATUS_EMPTY.to_string(),
        };
        self.status = status;
        self.playlist.current()
    }

    pub fn previous(&mut self) -> Option<&Song> {
        let status = match self.playlist.retreat() {
            Some(song) => format!("Now Playing: {}", song),
            None => STATUS_EMPTY.to_string(),
        };
        self.status = status;
        self.playlist.current()
    }

    /// Shuffles and starts playing the new first song.
    pub fn shuffle(&mut self) -> Outcome {
        self.shuffle_with(&mut rand::thread_rng())
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Outcome {
        if self.playlist.is_empty() {
            return Outcome::Warning(WARN_EMPTY_SHUFFLE.to_string());
        }

        self.playlist.shuffle_with(rng);
        if let Some(song) = self.playlist.advance() {
            self.status = format!("Now Playing (Shuffled): {}", song);
        }
        Outcome::Done(self.status.clone())
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn current(&self) -> Option<&Song> {
        self.playlist.current()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn songs_dir(&self) -> &Path {
        &self.songs_dir
    }

    pub fn snapshot(&self) -> PlaylistSnapshot {
        let view = |index: usize, song: &Song| SongView {
            index,
            title: song.title().to_string(),
            artist: song.artist().to_string(),
            duration: song.duration().to_string(),
            file_name: song
                .location()
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            format: song.audio_format(),
            display: song.to_string(),
        };

        let current_index = self.playlist.current_index();

        PlaylistSnapshot {
            songs: self
                .playlist
                .songs()
                .iter()
                .enumerate()
                .map(|(i, song)| view(i, song))
                .collect(),
            current_index,
            current: current_index
                .and_then(|i| self.playlist.get(i).map(|song| view(i, song))),
            status: self.status.clone(),
        }
    }
}

impl Drop for PlaylistSession {
    fn drop(&mut self) {
        info!("Closing playlist session ({} songs)", self.playlist.len());
    }
}
