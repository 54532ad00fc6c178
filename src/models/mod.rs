pub mod comic;

pub use comic::{ComicPage, ComicRecord, GalleryComic, Thumbnail};
