//! 边狱巴士 (Limbus Company) identity gacha for chat bots.
//!
//! Weighted rarity draws with a ten-pull pity slot, per-user luck ratings,
//! named pools, and text/image result rendering.

pub mod bot;
pub mod catalog;
pub mod config;
pub mod gacha;
pub mod render;

/// Config file read when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "gacha.toml";
