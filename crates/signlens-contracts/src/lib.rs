pub mod analysis;
pub mod chat;
pub mod credentials;
pub mod events;
pub mod export;
pub mod media;
pub mod models;
pub mod prompt;
pub mod timeline;
