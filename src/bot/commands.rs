//! Chat command parsing and the replies they produce.

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::catalog::identities::{all_identities, Identity};
use crate::catalog::pool::ResolvedPool;
use crate::config::{GachaConfig, ImageLayout};
use crate::gacha::draw_engine::DrawEngine;
use crate::gacha::luck_tracker::HistoryTracker;
use crate::render::image::{compose_grid, compose_horizontal, resolve_image_path, GridLayout};
use crate::render::text;

/// Prefix shared by every command of this plugin.
pub const COMMAND_PREFIX: &str = "tq";

const IMAGES_MISSING: &str = "(图片资源未配置)";
const EMPTY_POOL: &str = "❌ 当前卡池没有可抽取的人格";
const NO_HISTORY: &str = "你还没有抽卡记录，先来一发十连吧";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SinglePull,
    TenPull,
    UnluckyIndex,
    LuckyIndex,
    PoolList,
    SwitchPool(String),
    ClearHistory,
    Help,
}

impl Command {
    /// Parse one chat line. A leading `/` is optional.
    ///
    /// `None` means the line is not addressed to this plugin; an unknown
    /// `tq` command parses as `Help`.
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        let line = line.strip_prefix('/').unwrap_or(line);
        if !line.starts_with(COMMAND_PREFIX) {
            return None;
        }

        let mut parts = line.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let args = parts.next().unwrap_or_default().trim();

        let command = match name {
            "tq单抽" | "tq抽卡" => Command::SinglePull,
            "tq十连" => Command::TenPull,
            "tq非酋" => Command::UnluckyIndex,
            "tq欧皇" => Command::LuckyIndex,
            "tq卡池" => Command::PoolList,
            "tq切池" => Command::SwitchPool(args.to_string()),
            "tq清除记录" => Command::ClearHistory,
            _ => Command::Help,
        };
        Some(command)
    }
}

/// What to send back to the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub image: Option<PathBuf>,
    /// `image` is a temporary composite owned by the caller.
    pub composite: bool,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            image: None,
            composite: false,
        }
    }
}

/// Per-process plugin state: engine, histories and the active pool.
pub struct GachaPlugin {
    config: GachaConfig,
    engine: DrawEngine,
    tracker: HistoryTracker,
    current_pool: String,
    pool: ResolvedPool,
}

impl GachaPlugin {
    pub fn new(config: GachaConfig) -> Result<Self> {
        let engine = DrawEngine::new(
            config.rarity_table(),
            config.pity_table(),
            config.pity_enabled,
            config.pity_guarantee_rarity.clone(),
        )?;
        let tracker = HistoryTracker::new(config.max_history, config.top_rarity.clone());
        let current_pool = config.default_pool.clone();
        let pool = config
            .pools
            .get(&current_pool)
            .map(|p| p.resolve(all_identities()))
            .unwrap_or_default();

        info!(
            "Gacha plugin ready: pool={} ({} identities), pity={} at #{}",
            current_pool,
            pool.items.len(),
            config.pity_enabled,
            config.pity_position
        );

        Ok(GachaPlugin {
            config,
            engine,
            tracker,
            current_pool,
            pool,
        })
    }

    pub fn config(&self) -> &GachaConfig {
        &self.config
    }

    pub fn tracker(&self) -> &HistoryTracker {
        &self.tracker
    }

    pub fn current_pool(&self) -> &str {
        &self.current_pool
    }

    /// Parse and run one chat line. `None` when the line is not a command.
    pub fn handle_line(&mut self, user_id: &str, line: &str) -> Option<Reply> {
        let command = Command::parse(line)?;
        debug!("User {} -> {:?}", user_id, command);
        Some(self.handle(user_id, command))
    }

    pub fn handle(&mut self, user_id: &str, command: Command) -> Reply {
        match command {
            Command::SinglePull => self.single_pull(user_id),
            Command::TenPull => self.ten_pull(user_id),
            Command::UnluckyIndex => self.unlucky_index(user_id),
            Command::LuckyIndex => self.lucky_index(user_id),
            Command::PoolList => {
                Reply::text(text::format_pool_list(&self.config.pools, &self.current_pool))
            }
            Command::SwitchPool(name) => Reply::text(self.switch_pool(&name)),
            Command::ClearHistory => {
                let cleared = self.tracker.clear_history(user_id);
                if cleared {
                    info!("History cleared for user {}", user_id);
                }
                Reply::text(text::format_history_cleared(cleared))
            }
            Command::Help => Reply::text(text::format_help()),
        }
    }

    fn single_pull(&mut self, user_id: &str) -> Reply {
        let Some(identity) = self
            .engine
            .draw_one(&self.pool.items, false, &self.pool.fallback)
            .copied()
        else {
            warn!("Pool {} produced nothing", self.current_pool);
            return Reply::text(EMPTY_POOL);
        };

        self.tracker.record_pull(user_id, identity.rarity);
        info!(
            "User {} single pull: {} {} ({})",
            user_id, identity.sinner, identity.name, identity.rarity
        );

        let text = text::format_single_pull(&identity);
        match self.portrait_path(&identity) {
            Some(path) => Reply {
                text,
                image: Some(path),
                composite: false,
            },
            None => Reply::text(format!("{}\n\n{}", text, IMAGES_MISSING)),
        }
    }

    fn ten_pull(&mut self, user_id: &str) -> Reply {
        let results: Vec<Identity> = self
            .engine
            .draw_many(
                &self.pool.items,
                self.config.ten_pull_count,
                self.config.pity_position,
                &self.pool.fallback,
            )
            .into_iter()
            .copied()
            .collect();
        if results.is_empty() {
            warn!("Pool {} produced nothing", self.current_pool);
            return Reply::text(EMPTY_POOL);
        }

        self.tracker.record_pulls(user_id, &results);
        let counts = DrawEngine::count_by_rarity(&results);
        info!("User {} ten pull: {:?}", user_id, counts);

        let refs: Vec<&Identity> = results.iter().collect();
        let text = text::format_ten_pull(
            &refs,
            &counts,
            &self.config.top_rarity,
            Some(&self.current_pool),
        );

        let paths: Vec<PathBuf> = results.iter().filter_map(|i| self.portrait_path(i)).collect();
        if paths.is_empty() {
            return Reply::text(format!("{}\n\n{}", text, IMAGES_MISSING));
        }

        let render = &self.config.render;
        let composed = match render.layout {
            ImageLayout::Grid => {
                let layout = GridLayout {
                    rows: render.rows,
                    cols: render.cols,
                    spacing: render.spacing,
                };
                compose_grid(&paths, layout, render.target_height, render.background)
            }
            ImageLayout::Horizontal => {
                compose_horizontal(&paths, render.spacing, render.target_height, render.background)
            }
            ImageLayout::None => Ok(None),
        };

        match composed {
            Ok(Some(path)) => Reply {
                text,
                image: Some(path),
                composite: true,
            },
            Ok(None) => Reply::text(text),
            Err(e) => {
                warn!("Failed to compose ten-pull image: {:#}", e);
                Reply::text(text)
            }
        }
    }

    fn unlucky_index(&self, user_id: &str) -> Reply {
        let total = self.tracker.total_pulls(user_id);
        if total == 0 {
            return Reply::text(NO_HISTORY);
        }
        let verdict = self
            .tracker
            .evaluate_unlucky(user_id, &self.config.unlucky_thresholds);
        Reply::text(text::format_unlucky_index(
            &verdict,
            total,
            self.tracker.top_rarity_rate(user_id),
        ))
    }

    fn lucky_index(&self, user_id: &str) -> Reply {
        let total = self.tracker.total_pulls(user_id);
        if total == 0 {
            return Reply::text(NO_HISTORY);
        }
        let verdict = self
            .tracker
            .evaluate_lucky(user_id, &self.config.lucky_thresholds);
        Reply::text(text::format_lucky_index(
            &verdict,
            total,
            self.tracker.top_rarity_rate(user_id),
        ))
    }

    fn switch_pool(&mut self, name: &str) -> String {
        if name.is_empty() {
            return text::format_pool_switch(name, false, "请指定卡池名，例如 /tq切池 常驻");
        }
        let Some(definition) = self.config.pools.get(name) else {
            return text::format_pool_switch(name, false, "");
        };
        if !definition.enabled {
            return text::format_pool_switch(name, false, &format!("卡池 {} 已停用", name));
        }

        let resolved = definition.resolve(all_identities());
        if resolved.items.is_empty() {
            return text::format_pool_switch(name, false, &format!("卡池 {} 没有可抽取的人格", name));
        }

        let description = definition.description.clone();
        info!(
            "Pool switched: {} -> {} ({} identities)",
            self.current_pool,
            name,
            resolved.items.len()
        );
        self.current_pool = name.to_string();
        self.pool = resolved;
        text::format_pool_switch(name, true, &description)
    }

    fn portrait_path(&self, identity: &Identity) -> Option<PathBuf> {
        let render = &self.config.render;
        resolve_image_path(&render.images_dir, identity.image, &render.default_image)
    }
}
