//! `theframe-tv`: client for the Samsung "The Frame" art-mode API.
//!
//! An [`ArtSession`] holds one authenticated WebSocket channel to the TV's
//! art app. Images travel over a separate TCP socket the TV opens on request.

pub mod endpoint;
pub mod protocol;
pub mod retry;
pub mod session;
pub mod transfer;

#[cfg(test)]
mod fake_tv;

pub use endpoint::TvEndpoint;
pub use retry::retry_on_reset;
pub use session::ArtSession;
