//! Text layout of draw results and reports.

use std::collections::BTreeMap;

use crate::catalog::identities::{rarity_display, rarity_rank, Identity};
use crate::catalog::pool::PoolDefinition;
use crate::gacha::luck_tracker::{LuckyVerdict, UnluckyVerdict};

const RULE_WIDTH: usize = 18;

fn rule() -> String {
    "─".repeat(RULE_WIDTH)
}

/// `【sinner】name (★★★ (000))`
pub fn format_single_result(identity: &Identity, show_rarity: bool) -> String {
    if show_rarity {
        format!("【{}】{} ({})", identity.sinner, identity.name, rarity_display(identity.rarity))
    } else {
        format!("【{}】{}", identity.sinner, identity.name)
    }
}

/// Full reply for a single pull.
pub fn format_single_pull(identity: &Identity) -> String {
    format!(
        "🎰 边狱巴士人格抽取 🎰\n\n【{}】{}\n稀有度: {}",
        identity.sinner,
        identity.name,
        rarity_display(identity.rarity)
    )
}

/// Tally line, rarest first, e.g. `★★★ (000)×1 | ★★ (00)×3 | ★ (0)×6`.
pub fn format_statistics(counts: &BTreeMap<String, usize>) -> String {
    let mut entries: Vec<(&String, &usize)> = counts.iter().filter(|(_, &n)| n > 0).collect();
    entries.sort_by_key(|(label, _)| std::cmp::Reverse(rarity_rank(label)));

    if entries.is_empty() {
        return "无统计".to_string();
    }
    entries
        .iter()
        .map(|(label, n)| format!("{}×{}", rarity_display(label), n))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Compact ten-pull reply: top-rarity results are listed by name, the rest
/// are only counted.
pub fn format_ten_pull(
    results: &[&Identity],
    counts: &BTreeMap<String, usize>,
    top_rarity: &str,
    pool_name: Option<&str>,
) -> String {
    let mut lines = Vec::new();

    match pool_name {
        Some(name) => lines.push(format!("🎰 边狱巴士十连抽取 🎰\n【{}】", name)),
        None => lines.push("🎰 边狱巴士十连抽取 🎰".to_string()),
    }
    lines.push(format!("统计：{}", format_statistics(counts)));
    lines.push(rule());

    let top: Vec<&&Identity> = results.iter().filter(|i| i.rarity == top_rarity).collect();
    if !top.is_empty() {
        lines.push(format!("🌟 {} 人格：", rarity_display(top_rarity)));
        for identity in top {
            lines.push(format!("  • {}", format_single_result(identity, false)));
        }
    }

    let others: usize = counts
        .iter()
        .filter(|(label, _)| label.as_str() != top_rarity)
        .map(|(_, &n)| n)
        .sum();
    if others > 0 {
        lines.push(format!("\n其余{}个为★★/★人格", others));
    }

    lines.join("\n")
}

/// 非酋 (unlucky) index report.
pub fn format_unlucky_index(verdict: &UnluckyVerdict, total_pulls: usize, top_rate: f64) -> String {
    [
        "📊 非酋指数评测 📊".to_string(),
        rule(),
        format!("评级：{}", verdict.rating),
        format!("距离上次★★★：{}抽", verdict.pulls_since_top),
        format!("总计抽卡：{}次", total_pulls),
        format!("★★★出率：{:.2}%", top_rate),
        rule(),
        format!("💬 {}", verdict.message),
    ]
    .join("\n")
}

/// 欧皇 (lucky) index report.
pub fn format_lucky_index(verdict: &LuckyVerdict, total_pulls: usize, top_rate: f64) -> String {
    [
        "📊 欧皇指数评测 📊".to_string(),
        rule(),
        format!("评级：{}", verdict.rating),
        format!("最近{}抽★★★数：{}个", verdict.window, verdict.top_count),
        format!("总计抽卡：{}次", total_pulls),
        format!("★★★出率：{:.2}%", top_rate),
        rule(),
        format!("💬 {}", verdict.message),
    ]
    .join("\n")
}

/// Pool list with the current pool marked. Disabled pools are hidden.
pub fn format_pool_list(pools: &BTreeMap<String, PoolDefinition>, current: &str) -> String {
    let mut lines = vec!["🎱 可用卡池列表 🎱".to_string(), rule()];

    for (name, pool) in pools.iter().filter(|(_, p)| p.enabled) {
        let marker = if name == current { "✓" } else { "○" };
        lines.push(format!("{} {}", marker, name));
        if !pool.description.is_empty() {
            lines.push(format!("    {}", pool.description));
        }
    }

    lines.push(rule());
    lines.push(format!("当前卡池：{}", current));
    lines.push("使用 /tq切池 池名 切换卡池".to_string());
    lines.join("\n")
}

pub fn format_pool_switch(pool_name: &str, success: bool, message: &str) -> String {
    match (success, message.is_empty()) {
        (true, true) => format!("✅ 已切换到卡池：{}", pool_name),
        (true, false) => format!("✅ 已切换到卡池：{}\n{}", pool_name, message),
        (false, true) => format!("❌ 切换失败：卡池 {} 不存在", pool_name),
        (false, false) => format!("❌ 切换失败：{}", message),
    }
}

pub fn format_history_cleared(had_history: bool) -> String {
    if had_history {
        "🧹 已清除你的抽卡记录".to_string()
    } else {
        "你还没有抽卡记录".to_string()
    }
}

pub fn format_help() -> String {
    [
        "🎰 边狱巴士人格抽取 🎰",
        "/tq单抽 或 /tq抽卡 - 单次抽取",
        "/tq十连 - 十连抽取（第十抽保底）",
        "/tq非酋 - 非酋指数",
        "/tq欧皇 - 欧皇指数",
        "/tq卡池 - 查看卡池",
        "/tq切池 池名 - 切换卡池",
        "/tq清除记录 - 清除抽卡记录",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::identities::IDENTITIES;

    fn find(rarity: &str) -> &'static Identity {
        IDENTITIES.iter().find(|i| i.rarity == rarity).unwrap()
    }

    fn counts(entries: &[(&str, usize)]) -> BTreeMap<String, usize> {
        entries.iter().map(|&(l, n)| (l.to_string(), n)).collect()
    }

    #[test]
    fn test_single_result() {
        let identity = find("SSS");
        assert_eq!(format_single_result(identity, false), "【以实玛利】LCB囚人");
        assert_eq!(format_single_result(identity, true), "【以实玛利】LCB囚人 (★★★ (000))");
        assert!(format_single_pull(identity).ends_with("稀有度: ★★★ (000)"));
    }

    #[test]
    fn test_statistics_rarest_first() {
        let line = format_statistics(&counts(&[("S", 6), ("SSS", 1), ("SS", 3)]));
        assert_eq!(line, "★★★ (000)×1 | ★★ (00)×3 | ★ (0)×6");
        assert_eq!(format_statistics(&BTreeMap::new()), "无统计");
        assert_eq!(format_statistics(&counts(&[("SS", 0)])), "无统计");
    }

    #[test]
    fn test_ten_pull_lists_only_top_rarity() {
        let sss = find("SSS");
        let s = find("S");
        let mut results = vec![s; 9];
        results.push(sss);
        let tally = counts(&[("S", 9), ("SSS", 1)]);

        let text = format_ten_pull(&results, &tally, "SSS", Some("常驻"));
        assert!(text.starts_with("🎰 边狱巴士十连抽取 🎰\n【常驻】"));
        assert!(text.contains("  • 【以实玛利】LCB囚人"));
        assert!(text.contains("其余9个为★★/★人格"));
        assert!(!text.contains(s.name));
    }

    #[test]
    fn test_ten_pull_without_top_rarity() {
        let s = find("S");
        let results = vec![s; 10];
        let text = format_ten_pull(&results, &counts(&[("S", 10)]), "SSS", None);
        assert!(!text.contains("🌟"));
        assert!(text.contains("其余10个"));
    }

    #[test]
    fn test_luck_reports() {
        let unlucky = UnluckyVerdict {
            rating: "非酋".into(),
            message: "加油".into(),
            pulls_since_top: 75,
        };
        let text = format_unlucky_index(&unlucky, 80, 1.25);
        assert!(text.contains("距离上次★★★：75抽"));
        assert!(text.contains("★★★出率：1.25%"));
        assert!(text.ends_with("💬 加油"));

        let lucky = LuckyVerdict {
            rating: "欧皇".into(),
            message: "好运".into(),
            top_count: 3,
            window: 10,
        };
        assert!(format_lucky_index(&lucky, 10, 30.0).contains("最近10抽★★★数：3个"));
    }

    #[test]
    fn test_pool_list_hides_disabled() {
        let mut pools = crate::catalog::pool::default_pools();
        pools.insert("隐藏".into(), PoolDefinition { enabled: false, ..PoolDefinition::default() });
        let text = format_pool_list(&pools, "常驻");
        assert!(text.contains("✓ 常驻"));
        assert!(text.contains("    全人格常驻池"));
        assert!(!text.contains("隐藏"));
    }

    #[test]
    fn test_pool_switch_messages() {
        assert_eq!(format_pool_switch("常驻", true, ""), "✅ 已切换到卡池：常驻");
        assert_eq!(format_pool_switch("x", false, ""), "❌ 切换失败：卡池 x 不存在");
        assert_eq!(format_pool_switch("x", false, "已停用"), "❌ 切换失败：已停用");
    }
}
