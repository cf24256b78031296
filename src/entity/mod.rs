pub mod album;
pub mod album_photo;
pub mod photo;
pub mod profile;
pub mod user;

pub use photo::Published;
