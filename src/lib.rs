//! Headless core of the portal's embedded video player.
//!
//! A [`player::PlayerController`] actor owns the playlist, transport state,
//! progress tracking and overlay chrome for one mounted player. Platform
//! surfaces and the progress backend plug in through the traits in
//! [`player::traits`] and [`services`].

pub mod config;
pub mod models;
pub mod player;
pub mod services;
pub mod utils;

pub use config::Config;
pub use player::{PlayerController, PlayerHandle, PlayerProps};
