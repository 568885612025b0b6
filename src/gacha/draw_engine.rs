//! Rarity roll and identity selection.
//!
//! A roll is a uniform real in [0, 100) walked against cumulative rarity
//! weights. Tiers are visited in ascending-weight order, so the most common
//! tier is checked last and absorbs whatever the table leaves uncovered.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use rand::{Rng, RngExt};
use tracing::debug;

/// Exclusive upper bound of a rarity roll. Weights are percentages of it.
pub const ROLL_CEILING: f64 = 100.0;

/// Anything that can sit in a draw pool.
///
/// The engine only ever reads the rarity label; everything else on the
/// item is carried through untouched.
pub trait Drawable {
    fn rarity(&self) -> &str;
}

impl<T: Drawable + ?Sized> Drawable for &T {
    fn rarity(&self) -> &str {
        (**self).rarity()
    }
}

/// Rarity label → probability weight, in declared order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RarityTable {
    entries: Vec<(String, f64)>,
}

impl RarityTable {
    pub fn new() -> Self {
        RarityTable { entries: Vec::new() }
    }

    /// Set a tier's weight. Re-inserting a label keeps its original position.
    pub fn insert(&mut self, label: impl Into<String>, weight: f64) {
        let label = label.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = weight,
            None => self.entries.push((label, weight)),
        }
    }

    pub fn weight(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|&(_, w)| w)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.weight(label).is_some()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all weights. Not required to be exactly 100.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|&(_, w)| w).sum()
    }

    fn validate(&self, name: &str) -> Result<()> {
        for (label, weight) in &self.entries {
            if !weight.is_finite() || *weight < 0.0 {
                bail!("{} rarity table: weight for {} must be a non-negative number, got {}",
                    name, label, weight);
            }
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for RarityTable {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut table = RarityTable::new();
        for (label, weight) in iter {
            table.insert(label, weight);
        }
        table
    }
}

/// Probability-weighted draw engine with a positional pity rule.
#[derive(Debug, Clone)]
pub struct DrawEngine {
    normal: RarityTable,
    pity: RarityTable,
    pity_enabled: bool,
    /// Returned when a pity roll walks past the end of the pity table.
    pity_guarantee: String,
    /// Normal-table tiers by ascending weight; ties keep declared order.
    order: Vec<(String, f64)>,
}

impl DrawEngine {
    /// Build an engine. An empty pity table behaves as "no pity table".
    pub fn new(
        normal: RarityTable,
        pity: Option<RarityTable>,
        pity_enabled: bool,
        pity_guarantee: impl Into<String>,
    ) -> Result<Self> {
        if normal.is_empty() {
            bail!("normal rarity table has no tiers");
        }
        normal.validate("normal")?;

        let pity = pity.unwrap_or_default();
        pity.validate("pity")?;

        // sort_by is stable, so equal weights stay in declared order
        let mut order = normal.entries.clone();
        order.sort_by(|a, b| a.1.total_cmp(&b.1));

        Ok(DrawEngine {
            normal,
            pity,
            pity_enabled,
            pity_guarantee: pity_guarantee.into(),
            order,
        })
    }

    pub fn normal_table(&self) -> &RarityTable {
        &self.normal
    }

    pub fn pity_table(&self) -> &RarityTable {
        &self.pity
    }

    pub fn pity_enabled(&self) -> bool {
        self.pity_enabled
    }

    pub fn pity_guarantee(&self) -> &str {
        &self.pity_guarantee
    }

    /// Tier labels in the order the cumulative walk visits them.
    pub fn rarity_order(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|(l, _)| l.as_str())
    }

    /// Whether the 1-indexed draw `position` of a batch is a pity draw.
    pub fn is_pity_position(&self, position: usize, pity_position: usize) -> bool {
        self.pity_enabled && position == pity_position
    }

    /// Roll a rarity tier using the thread RNG.
    pub fn decide_rarity(&self, is_pity: bool) -> &str {
        self.decide_rarity_with(&mut rand::rng(), is_pity)
    }

    /// Roll a rarity tier.
    ///
    /// Normal rolls that fall past every cumulative boundary resolve to the
    /// last (most common) tier. Pity rolls walk the same order over the pity
    /// table only, and resolve to the configured guarantee tier instead.
    pub fn decide_rarity_with<R: Rng>(&self, rng: &mut R, is_pity: bool) -> &str {
        let roll = rng.random_range(0.0..ROLL_CEILING);

        if is_pity && self.pity_enabled && !self.pity.is_empty() {
            let mut cumulative = 0.0;
            for (label, _) in &self.order {
                if let Some(weight) = self.pity.weight(label) {
                    cumulative += weight;
                    if roll < cumulative {
                        return label;
                    }
                }
            }
            return &self.pity_guarantee;
        }

        let mut cumulative = 0.0;
        for (label, weight) in &self.order {
            cumulative += weight;
            if roll < cumulative {
                return label;
            }
        }
        self.order.last().map_or(&self.pity_guarantee, |(label, _)| label)
    }

    /// Draw a single item using the thread RNG.
    pub fn draw_one<'a, T: Drawable>(
        &self,
        pool: &'a [T],
        is_pity: bool,
        fallback: &'a [T],
    ) -> Option<&'a T> {
        self.draw_one_with(&mut rand::rng(), pool, is_pity, fallback)
    }

    /// Draw a single item.
    ///
    /// Resolution order: an item of the rolled tier from `pool`; any item of
    /// `fallback` regardless of tier; any item of `pool` regardless of tier;
    /// nothing.
    pub fn draw_one_with<'a, T: Drawable, R: Rng>(
        &self,
        rng: &mut R,
        pool: &'a [T],
        is_pity: bool,
        fallback: &'a [T],
    ) -> Option<&'a T> {
        let rarity = self.decide_rarity_with(rng, is_pity);

        let tier: Vec<&T> = pool.iter().filter(|item| item.rarity() == rarity).collect();
        if let Some(item) = pick(rng, &tier) {
            return Some(*item);
        }

        if !fallback.is_empty() {
            debug!("No {} in pool, drawing from fallback pool", rarity);
            return pick(rng, fallback);
        }

        pick(rng, pool)
    }

    /// Draw `count` items using the thread RNG.
    pub fn draw_many<'a, T: Drawable>(
        &self,
        pool: &'a [T],
        count: usize,
        pity_position: usize,
        fallback: &'a [T],
    ) -> Vec<&'a T> {
        self.draw_many_with(&mut rand::rng(), pool, count, pity_position, fallback)
    }

    /// Draw `count` independent items. Draw number `pity_position`
    /// (1-indexed) is a pity draw when pity is enabled.
    ///
    /// Positions that resolve to nothing (empty pool and fallback) are
    /// skipped, so the result is shorter than `count` only in that case.
    pub fn draw_many_with<'a, T: Drawable, R: Rng>(
        &self,
        rng: &mut R,
        pool: &'a [T],
        count: usize,
        pity_position: usize,
        fallback: &'a [T],
    ) -> Vec<&'a T> {
        let mut results = Vec::with_capacity(count);
        for position in 1..=count {
            let is_pity = self.is_pity_position(position, pity_position);
            if let Some(item) = self.draw_one_with(rng, pool, is_pity, fallback) {
                results.push(item);
            }
        }
        results
    }

    /// Tally results per rarity. Tiers that never appear are absent.
    pub fn count_by_rarity<T: Drawable>(results: &[T]) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for item in results {
            *counts.entry(item.rarity().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Results of one rarity, in their original order.
    pub fn filter_by_rarity<T: Drawable + Clone>(results: &[T], rarity: &str) -> Vec<T> {
        results
            .iter()
            .filter(|item| item.rarity() == rarity)
            .cloned()
            .collect()
    }
}

/// Uniform pick from a slice.
fn pick<'a, T, R: Rng>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    Some(&items[rng.random_range(0..items.len())])
}
