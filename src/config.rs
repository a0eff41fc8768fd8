use std::path::PathBuf;
use std::env;
use std::time::Duration;
use lazy_static::lazy_static;

lazy_static! {
    // Base directory
    pub static ref BASE_DIR: PathBuf = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    // Uploaded songs folder
    pub static ref SONGS_FOLDER: PathBuf = BASE_DIR.join("songs");

    // Metadata sidecar file
    pub static ref METADATA_FILE: PathBuf = SONGS_FOLDER.join("songs.json");
}

// Sentinels shown when metadata can't be resolved
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_DURATION: &str = "unknown";

// Upload configuration
pub const ALLOWED_EXTENSIONS: &[&str] = &["mp3", "wav"];
pub const MAX_UPLOAD_MB: u64 = 64;

// Remote artist lookup
pub const ARTIST_LOOKUP_URL: &str = "https://itunes.apple.com/search";
pub const ARTIST_LOOKUP_TIMEOUT_SECS: u64 = 5;

// Server configuration
pub const PORT: u16 = 8000;
pub const HOST: &str = "0.0.0.0";

// Status line shown before anything was played
pub const INITIAL_STATUS: &str = "No song playing";

/// Runtime configuration, defaults above overridden by environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub songs_dir: PathBuf,
    pub metadata_file: PathBuf,
    pub artist_lookup: bool,
    pub artist_lookup_url: String,
    pub artist_lookup_timeout: Duration,
    pub host: String,
    pub port: u16,
    pub max_upload_mb: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            songs_dir: SONGS_FOLDER.clone(),
            metadata_file: METADATA_FILE.clone(),
            artist_lookup: true,
            artist_lookup_url: ARTIST_LOOKUP_URL.to_string(),
            artist_lookup_timeout: Duration::from_secs(ARTIST_LOOKUP_TIMEOUT_SECS),
            host: HOST.to_string(),
            port: PORT,
            max_upload_mb: MAX_UPLOAD_MB,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let songs_dir = env::var("SONGS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.songs_dir);

        // The sidecar follows the songs folder unless pinned explicitly
        let metadata_file = env::var("METADATA_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| songs_dir.join("songs.json"));

        Self {
            songs_dir,
            metadata_file,
            artist_lookup: env::var("ARTIST_LOOKUP")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.artist_lookup),
            artist_lookup_url: env::var("ARTIST_LOOKUP_URL").unwrap_or(defaults.artist_lookup_url),
            artist_lookup_timeout: env::var("ARTIST_LOOKUP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.artist_lookup_timeout),
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            max_upload_mb: env::var("MAX_UPLOAD_MB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_upload_mb),
        }
    }

    /// Config rooted at an arbitrary directory, songs stored directly inside it.
    pub fn with_songs_dir(dir: impl Into<PathBuf>) -> Self {
        let songs_dir = dir.into();
        Self {
            metadata_file: songs_dir.join("songs.json"),
            songs_dir,
            ..Self::default()
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_into_songs_folder() {
        let config = Config::default();
        assert_eq!(config.metadata_file, config.songs_dir.join("songs.json"));
        assert!(config.artist_lookup);
        assert_eq!(config.port, PORT);
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
    }

    #[test]
    fn test_with_songs_dir() {
        let config = Config::with_songs_dir("/tmp/library");
        assert_eq!(config.songs_dir, PathBuf::from("/tmp/library"));
        assert_eq!(config.metadata_file, PathBuf::from("/tmp/library/songs.json"));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(" OFF "));
        assert!(!parse_flag("0"));
    }
}
