//! Plugin configuration, read from a TOML file.
//!
//! Every section has a default, so an empty file is a valid configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::Level;

use crate::catalog::identities::identities_by_rarity;
use crate::catalog::pool::{default_pools, PoolDefinition, STANDARD_POOL};
use crate::gacha::draw_engine::RarityTable;
use crate::gacha::luck_tracker::{LuckyRule, UnluckyRule, DEFAULT_MAX_HISTORY};

/// Largest `rows * cols` a ten-pull grid may have.
pub const MAX_GRID_CELLS: u32 = 100;
/// Largest gap between composite cells, in pixels.
pub const MAX_SPACING: u32 = 256;
/// Largest portrait height composites may scale to, in pixels.
pub const MAX_TARGET_HEIGHT: u32 = 4096;

/// How ten-pull portraits are combined into one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageLayout {
    Grid,
    Horizontal,
    /// Send text only.
    None,
}

/// Image lookup and composition settings.
///
/// Composites are written to the system temp directory. The console host
/// keeps only the latest one: it is removed when the next composite
/// replaces it, and at the end of the session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub images_dir: PathBuf,
    /// Used when an identity's own portrait is missing.
    pub default_image: String,
    pub layout: ImageLayout,
    pub rows: u32,
    pub cols: u32,
    /// Pixels between cells.
    pub spacing: u32,
    /// Scale every portrait to this height first (aspect kept).
    pub target_height: Option<u32>,
    pub background: [u8; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            images_dir: PathBuf::from("images"),
            default_image: "default.png".to_string(),
            layout: ImageLayout::Grid,
            rows: 2,
            cols: 5,
            spacing: 5,
            target_height: None,
            background: [255, 255, 255],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GachaConfig {
    /// Normal draw odds (percent).
    pub rarity_rates: BTreeMap<String, f64>,
    /// Odds on the pity draw. Empty disables the pity table.
    pub pity_rates: BTreeMap<String, f64>,
    pub pity_enabled: bool,
    /// Returned when a pity roll misses every pity tier.
    pub pity_guarantee_rarity: String,
    /// 1-indexed draw of a ten pull that uses the pity odds.
    pub pity_position: usize,
    pub ten_pull_count: usize,
    /// Rarity that counts as a "hit" for luck ratings.
    pub top_rarity: String,
    pub max_history: usize,
    /// 非酋 rules, strictly descending by threshold.
    pub unlucky_thresholds: Vec<UnluckyRule>,
    /// 欧皇 rules, strictly descending by threshold.
    pub lucky_thresholds: Vec<LuckyRule>,
    pub pools: BTreeMap<String, PoolDefinition>,
    pub default_pool: String,
    pub render: RenderConfig,
    pub log_level: String,
}

fn unlucky_rule(threshold: usize, rating: &str, message: &str) -> UnluckyRule {
    UnluckyRule {
        threshold,
        rating: rating.to_string(),
        message: message.to_string(),
    }
}

fn lucky_rule(threshold: usize, window: usize, rating: &str, message: &str) -> LuckyRule {
    LuckyRule {
        threshold,
        window,
        rating: rating.to_string(),
        message: message.to_string(),
    }
}

fn rates(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|&(l, w)| (l.to_string(), w)).collect()
}

impl Default for GachaConfig {
    fn default() -> Self {
        GachaConfig {
            rarity_rates: rates(&[("SSS", 3.0), ("SS", 12.0), ("S", 85.0)]),
            pity_rates: rates(&[("SSS", 2.98), ("SS", 97.02)]),
            pity_enabled: true,
            pity_guarantee_rarity: "SS".to_string(),
            pity_position: 10,
            ten_pull_count: 10,
            top_rarity: "SSS".to_string(),
            max_history: DEFAULT_MAX_HISTORY,
            unlucky_thresholds: vec![
                unlucky_rule(200, "究极非酋", "建议去洗把脸再来"),
                unlucky_rule(120, "非酋酋长", "边狱巴士的大门对你紧闭"),
                unlucky_rule(70, "资深非酋", "保底都嫌你慢"),
                unlucky_rule(40, "小非", "再坚持一下，金光就在前方"),
            ],
            lucky_thresholds: vec![
                lucky_rule(4, 20, "天选之人", "但丁都要嫉妒你了"),
                lucky_rule(3, 10, "欧皇附体", "这运气不去买彩票可惜了"),
                lucky_rule(2, 10, "欧洲人", "今天的金光格外耀眼"),
                lucky_rule(1, 10, "小欧", "运气不错嘛"),
            ],
            pools: default_pools(),
            default_pool: STANDARD_POOL.to_string(),
            render: RenderConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl GachaConfig {
    /// Read and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: GachaConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject tables the draw engine or tracker would silently misread.
    pub fn validate(&self) -> Result<()> {
        if self.rarity_rates.is_empty() {
            bail!("rarity_rates must name at least one rarity");
        }
        for (table, name) in [(&self.rarity_rates, "rarity_rates"), (&self.pity_rates, "pity_rates")] {
            for (label, weight) in table {
                if !weight.is_finite() || *weight < 0.0 {
                    bail!("{}.{} must be a non-negative number, got {}", name, label, weight);
                }
            }
        }
        if self.pity_position == 0 {
            bail!("pity_position is 1-indexed and must be at least 1");
        }
        if self.ten_pull_count == 0 {
            bail!("ten_pull_count must be at least 1");
        }
        if self.max_history == 0 {
            bail!("max_history must be at least 1");
        }

        if !strictly_descending(self.unlucky_thresholds.iter().map(|r| r.threshold)) {
            bail!("unlucky_thresholds must be sorted by threshold, strictly descending");
        }
        if !strictly_descending(self.lucky_thresholds.iter().map(|r| r.threshold)) {
            bail!("lucky_thresholds must be sorted by threshold, strictly descending");
        }
        if let Some(rule) = self.lucky_thresholds.iter().find(|r| r.window == 0) {
            bail!("lucky rule {} has an empty window", rule.rating);
        }

        match self.pools.get(&self.default_pool) {
            Some(pool) if pool.enabled => {}
            Some(_) => bail!("default_pool {} is disabled", self.default_pool),
            None => bail!("default_pool {} is not defined in pools", self.default_pool),
        }

        let render = &self.render;
        if render.rows == 0 || render.cols == 0 {
            bail!("render.rows and render.cols must be at least 1");
        }
        if render.rows as u64 * render.cols as u64 > MAX_GRID_CELLS as u64 {
            bail!(
                "render grid {}x{} has more than {} cells",
                render.rows, render.cols, MAX_GRID_CELLS
            );
        }
        if render.spacing > MAX_SPACING {
            bail!("render.spacing {} exceeds {} pixels", render.spacing, MAX_SPACING);
        }
        match render.target_height {
            Some(0) => bail!("render.target_height must be at least 1 when set"),
            Some(h) if h > MAX_TARGET_HEIGHT => {
                bail!("render.target_height {} exceeds {} pixels", h, MAX_TARGET_HEIGHT)
            }
            _ => {}
        }

        Ok(())
    }

    /// Settings that load fine but probably do not do what was meant.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.rarity_rates.contains_key(&self.pity_guarantee_rarity) {
            warnings.push(format!(
                "pity_guarantee_rarity {} is not in rarity_rates; pity misses will use the fallback pool",
                self.pity_guarantee_rarity
            ));
        }
        if !self.rarity_rates.contains_key(&self.top_rarity) {
            warnings.push(format!(
                "top_rarity {} is not in rarity_rates; luck ratings will never see a hit",
                self.top_rarity
            ));
        }
        for (label, weight) in &self.rarity_rates {
            if *weight > 0.0 && identities_by_rarity(label).is_empty() {
                warnings.push(format!(
                    "no identity has rarity {}; those rolls will use the fallback pool",
                    label
                ));
            }
        }
        if self.pity_enabled && self.pity_position > self.ten_pull_count {
            warnings.push(format!(
                "pity_position {} is past ten_pull_count {}; ten pulls will never use pity",
                self.pity_position, self.ten_pull_count
            ));
        }
        warnings
    }

    pub fn rarity_table(&self) -> RarityTable {
        self.rarity_rates.iter().map(|(l, &w)| (l.as_str(), w)).collect()
    }

    /// `None` when no pity odds are configured.
    pub fn pity_table(&self) -> Option<RarityTable> {
        if self.pity_rates.is_empty() {
            return None;
        }
        Some(self.pity_rates.iter().map(|(l, &w)| (l.as_str(), w)).collect())
    }

    /// Configured log level, INFO when unrecognised.
    pub fn log_level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }
}

fn strictly_descending(mut values: impl Iterator<Item = usize>) -> bool {
    let mut prev = match values.next() {
        Some(v) => v,
        None => return true,
    };
    for v in values {
        if v >= prev {
            return false;
        }
        prev = v;
    }
    true
}
