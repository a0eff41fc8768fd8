// Integration tests for the playlist session
// These drive the session, the JSON store and the upload metadata pipeline
// together through the public API, against a scratch songs folder.

use std::fs;
use std::path::Path;
use std::time::Duration;

use neon_playlist::services::artist_lookup::{ArtistLookup, DisabledLookup};
use neon_playlist::services::metadata::{resolve_upload, MetadataResolver};
use neon_playlist::services::session::PlaylistSession;
use neon_playlist::utils::storage;
use neon_playlist::{Config, MetadataStore, Outcome, Resolved, Song, Unresolved};
use futures::future::BoxFuture;
use tempfile::TempDir;

/// Resolver for files that carry no tags at all.
struct Untagged;

impl MetadataResolver for Untagged {
    fn title(&self, _path: &Path) -> Resolved<String> {
        Err(Unresolved::NoTag)
    }

    fn artist(&self, _path: &Path) -> Resolved<String> {
        Err(Unresolved::NoTag)
    }

    fn duration(&self, _path: &Path) -> Resolved<Duration> {
        Err(Unresolved::Unreadable("not audio".to_string()))
    }
}

/// Lookup that knows exactly one song.
struct KnownTitle;

impl ArtistLookup for KnownTitle {
    fn artist_for_title<'a>(&'a self, title: &'a str) -> BoxFuture<'a, Resolved<String>> {
        Box::pin(async move {
            if title == "Harbour Lights" {
                Ok("The Lanterns".to_string())
            } else {
                Err(Unresolved::NoMatch)
            }
        })
    }
}

fn config(dir: &TempDir) -> Config {
    Config::with_songs_dir(dir.path().join("songs"))
}

async fn upload(session: &mut PlaylistSession, name: &str, lookup: &dyn ArtistLookup) -> Outcome {
    let location = session.upload_location(name).unwrap();
    storage::write_file(&location, b"not really audio").await.unwrap();
    let meta = resolve_upload(&location, &Untagged, lookup).await;
    let song = Song::new(
        location,
        Some(meta.title),
        Some(meta.artist),
        Some(meta.duration),
        &Untagged,
    );
    session.add_song(song).unwrap()
}

fn titles(session: &PlaylistSession) -> Vec<String> {
    session
        .playlist()
        .songs()
        .iter()
        .map(|song| song.title().to_string())
        .collect()
}

#[tokio::test]
async fn test_untagged_upload_falls_back_to_sentinels() {
    let dir = TempDir::new().unwrap();
    let mut session = PlaylistSession::open(&config(&dir)).unwrap();

    let outcome = upload(&mut session, "track7.mp3", &DisabledLookup).await;
    assert!(outcome.is_done());
    assert!(outcome.message().starts_with("Added: track7 - Unknown Artist (saved to "));

    let song = &session.playlist().songs()[0];
    assert_eq!(song.title(), "track7");
    assert_eq!(song.artist(), "Unknown Artist");
    assert_eq!(song.duration(), "unknown");
    assert!(song.location().exists());
}

#[tokio::test]
async fn test_remote_lookup_fills_missing_artist() {
    let dir = TempDir::new().unwrap();
    let mut session = PlaylistSession::open(&config(&dir)).unwrap();

    upload(&mut session, "Harbour Lights.mp3", &KnownTitle).await;
    upload(&mut session, "Nobody Knows.wav", &KnownTitle).await;

    let songs = session.playlist().songs();
    assert_eq!(songs[0].artist(), "The Lanterns");
    assert_eq!(songs[1].artist(), "Unknown Artist");
    assert_eq!(songs[1].audio_format(), "audio/wav");
}

#[tokio::test]
async fn test_restart_restores_playlist_order() {
    let dir = TempDir::new().unwrap();

    {
        let mut session = PlaylistSession::open(&config(&dir)).unwrap();
        for name in ["one.mp3", "two.mp3", "three.mp3"] {
            upload(&mut session, name, &DisabledLookup).await;
        }
        session.remove_selected(&[1]).unwrap();
        session.next();
    }

    let session = PlaylistSession::open(&config(&dir)).unwrap();
    assert_eq!(titles(&session), vec!["one", "three"]);
    // The cursor is not persisted
    assert_eq!(session.playlist().current_index(), None);
    assert_eq!(session.status(), "No song playing");
}

#[tokio::test]
async fn test_store_mirrors_every_mutation() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let store = MetadataStore::new(&config.metadata_file);
    let mut session = PlaylistSession::open(&config).unwrap();

    for name in ["a.mp3", "b.mp3", "c.mp3", "d.mp3"] {
        upload(&mut session, name, &DisabledLookup).await;
    }

    let stored = |store: &MetadataStore| -> Vec<String> {
        store.load().unwrap().into_iter().map(|r| r.title).collect()
    };
    assert_eq!(stored(&store), titles(&session));

    let removed = session.remove_selected(&[3, 0, 3, 42]).unwrap();
    assert_eq!(removed, Outcome::Done("Selected songs removed successfully!".to_string()));
    assert_eq!(titles(&session), vec!["b", "c"]);
    assert_eq!(stored(&store), titles(&session));
    assert!(!config.songs_dir.join("a.mp3").exists());
    assert!(!config.songs_dir.join("d.mp3").exists());
    assert!(config.songs_dir.join("b.mp3").exists());

    assert_eq!(session.clear().unwrap(), 2);
    assert!(stored(&store).is_empty());
    assert_eq!(session.status(), "Playlist cleared!");
    assert!(!config.songs_dir.join("b.mp3").exists());
}

#[test]
fn test_legacy_store_is_loaded() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    fs::create_dir_all(&config.songs_dir).unwrap();
    fs::write(
        &config.metadata_file,
        r#"[{"title": "Old", "artist": "Band", "duration": "3:10", "file_path": "songs/old.mp3"}]"#,
    )
    .unwrap();

    let mut session = PlaylistSession::open(&config).unwrap();
    assert_eq!(titles(&session), vec!["Old"]);

    session.next();
    assert_eq!(session.status(), "Now Playing: Old - Band");
    assert_eq!(session.current().map(|s| s.duration()), Some("3:10"));
}

#[test]
fn test_corrupt_store_refuses_to_open() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    fs::create_dir_all(&config.songs_dir).unwrap();
    fs::write(&config.metadata_file, "{ not json").unwrap();

    assert!(PlaylistSession::open(&config).is_err());
}

#[test]
fn test_rejected_upload_names() {
    let dir = TempDir::new().unwrap();
    let session = PlaylistSession::open(&config(&dir)).unwrap();

    assert!(session.upload_location("notes.txt").is_err());
    assert!(session.upload_location(".mp3").is_err());

    // Only the final path segment is kept
    let location = session.upload_location("../../escape.MP3").unwrap();
    assert_eq!(location, dir.path().join("songs").join("escape.mp3"));
}
