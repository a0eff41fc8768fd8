use rand::seq::SliceRandom;
use rand::Rng;

use super::song::Song;

/// Ordered list of songs with a "now playing" cursor.
///
/// The cursor is `None` when nothing is current. Navigation wraps around
/// both ends; in the index arithmetic `None` behaves like `-1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    songs: Vec<Song>,
    current_index: Option<usize>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a song; the cursor does not move.
    pub fn add(&mut self, song: Song) {
        self.songs.push(song);
    }

    /// Removes the song at `index`, ignoring indices out of range.
    ///
    /// Afterwards the cursor is only bound-checked: if it points past the
    /// end it is clamped to the last song (or `None` when empty). Removing
    /// a song before the cursor leaves the cursor index as it was.
    pub fn remove(&mut self, index: usize) -> Option<Song> {
        if index >= self.songs.len() {
            return None;
        }

        let removed = self.songs.remove(index);

        if let Some(current) = self.current_index {
            if current >= self.songs.len() {
                self.current_index = self.songs.len().checked_sub(1);
            }
        }

        Some(removed)
    }

    pub fn current(&self) -> Option<&Song> {
        self.current_index.and_then(|i| self.songs.get(i))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index.filter(|&i| i < self.songs.len())
    }

    /// Moves to the next song, wrapping from the last to the first.
    pub fn advance(&mut self) -> Option<&Song> {
        self.step(1)
    }

    /// Moves to the previous song, wrapping from the first to the last.
    pub fn retreat(&mut self) -> Option<&Song> {
        self.step(-1)
    }

    fn step(&mut self, delta: i64) -> Option<&Song> {
        if self.songs.is_empty() {
            return None;
        }

        let len = self.songs.len() as i64;
        let cursor = self.current_index.map_or(-1, |i| i as i64);
        self.current_index = Some((cursor + delta).rem_euclid(len) as usize);

        self.current()
    }

    /// Shuffles the songs uniformly and forgets the cursor.
    ///
    /// Call [`Playlist::advance`] afterwards to start at the new first song.
    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::thread_rng());
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.songs.shuffle(rng);
        self.current_index = None;
    }

    /// Empties the playlist, handing back the songs that were in it.
    pub fn clear(&mut self) -> Vec<Song> {
        self.current_index = None;
        std::mem::take(&mut self.songs)
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn get(&self, index: usize) -> Option<&Song> {
        self.songs.get(index)
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}
