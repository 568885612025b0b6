//! Named draw pools carved out of the identity catalog.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::catalog::identities::Identity;

/// Name of the pool that holds the whole catalog.
pub const STANDARD_POOL: &str = "常驻";

/// One configured pool. Empty filters admit everything.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PoolDefinition {
    pub description: String,
    pub enabled: bool,
    /// Only identities of these sinners.
    pub sinners: Vec<String>,
    /// Only identities with these names.
    pub identities: Vec<String>,
    /// Draw from the full catalog when the rolled tier is missing here.
    pub use_fallback: bool,
}

impl Default for PoolDefinition {
    fn default() -> Self {
        PoolDefinition {
            description: String::new(),
            enabled: true,
            sinners: Vec::new(),
            identities: Vec::new(),
            use_fallback: true,
        }
    }
}

/// Items of a pool plus the fallback consulted for missing tiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedPool {
    pub items: Vec<Identity>,
    pub fallback: Vec<Identity>,
}

impl PoolDefinition {
    pub fn is_filtered(&self) -> bool {
        !self.sinners.is_empty() || !self.identities.is_empty()
    }

    pub fn admits(&self, identity: &Identity) -> bool {
        let sinner_ok = self.sinners.is_empty()
            || self.sinners.iter().any(|s| s == identity.sinner);
        let name_ok = self.identities.is_empty()
            || self.identities.iter().any(|n| n == identity.name);
        sinner_ok && name_ok
    }

    /// Filter `catalog` down to this pool.
    ///
    /// Only a filtered pool gets a fallback: the unfiltered pool already is
    /// the whole catalog.
    pub fn resolve(&self, catalog: &[Identity]) -> ResolvedPool {
        let items = catalog.iter().filter(|i| self.admits(i)).copied().collect();
        let fallback = if self.is_filtered() && self.use_fallback {
            catalog.to_vec()
        } else {
            Vec::new()
        };
        ResolvedPool { items, fallback }
    }
}

/// Pools used when the configuration names none.
pub fn default_pools() -> BTreeMap<String, PoolDefinition> {
    let mut pools = BTreeMap::new();
    pools.insert(
        STANDARD_POOL.to_string(),
        PoolDefinition {
            description: "全人格常驻池".to_string(),
            ..PoolDefinition::default()
        },
    );
    pools
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::identities::{all_identities, RARITY_SS, RARITY_SSS};

    #[test]
    fn test_standard_pool_is_whole_catalog() {
        let pools = default_pools();
        let standard = &pools[STANDARD_POOL];
        let resolved = standard.resolve(all_identities());
        assert_eq!(resolved.items.len(), all_identities().len());
        assert!(resolved.fallback.is_empty());
    }

    #[test]
    fn test_sinner_filter() {
        let pool = PoolDefinition {
            sinners: vec!["浮士德".to_string()],
            ..PoolDefinition::default()
        };
        let resolved = pool.resolve(all_identities());
        assert_eq!(resolved.items.len(), 5);
        assert!(resolved.items.iter().all(|i| i.sinner == "浮士德"));
        assert_eq!(resolved.fallback.len(), all_identities().len());
    }

    #[test]
    fn test_combined_filters() {
        let pool = PoolDefinition {
            sinners: vec!["良秀".to_string(), "桂".to_string()],
            identities: vec!["流血狂欢骑士团".to_string()],
            use_fallback: false,
            ..PoolDefinition::default()
        };
        let resolved = pool.resolve(all_identities());
        assert_eq!(resolved.items.len(), 2);
        assert!(resolved.items.iter().all(|i| i.rarity == RARITY_SSS));
        assert!(resolved.fallback.is_empty());
    }

    #[test]
    fn test_boutique_pool_misses_tiers() {
        let pool = PoolDefinition {
            identities: vec!["LCB囚人".to_string()],
            ..PoolDefinition::default()
        };
        let resolved = pool.resolve(all_identities());
        assert_eq!(resolved.items.len(), 12);
        assert!(!resolved.items.iter().any(|i| i.rarity == RARITY_SS));
        assert!(!resolved.fallback.is_empty());
    }

    #[test]
    fn test_pool_definition_defaults() {
        let pool: PoolDefinition = toml::from_str("description = \"test\"").unwrap();
        assert!(pool.enabled);
        assert!(pool.use_fallback);
        assert!(!pool.is_filtered());
    }
}
