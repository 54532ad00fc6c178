pub mod marvel;

pub use marvel::{ComicSource, MarvelClient, UpstreamError};
