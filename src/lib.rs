pub mod autoplay;
pub mod clock;
pub mod config;
pub mod db;
pub mod gate;
pub mod geometry;
pub mod hud;
pub mod motion;
pub mod pages;
pub mod plays;
pub mod readouts;
pub mod routing;
pub mod server;
