pub mod artist_lookup;
pub mod metadata;
pub mod session;
pub mod store;
