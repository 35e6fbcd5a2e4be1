//! Now-playing state mirrored to the OS surface, and artwork fetching.

mod artwork;
mod info;

pub use artwork::{ArtworkError, ArtworkFetched, ArtworkFetcher, HttpArtworkFetcher};
pub use info::{Artwork, NowPlayingInfo, NowPlayingSurface};
