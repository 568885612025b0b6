//! Limbus Company identity catalog.
//!
//! Portraits live in the configured images directory, named
//! `{sinner}_{identity}.png` in English, e.g. `yi_sang_lcb.png`. A missing
//! portrait is replaced by the default image.

use crate::gacha::draw_engine::Drawable;

/// 000 identities (three stars).
pub const RARITY_SSS: &str = "SSS";
/// 00 identities (two stars).
pub const RARITY_SS: &str = "SS";
/// 0 identities (one star).
pub const RARITY_S: &str = "S";

/// All rarity labels, rarest first.
pub const RARITIES: [&str; 3] = [RARITY_SSS, RARITY_SS, RARITY_S];

/// The twelve sinners.
pub const SINNERS: [&str; 12] = [
    "以实玛利", "浮士德", "堂吉诃德", "良秀", "默尔索", "鸿璐",
    "希斯克利夫", "以扫", "罗佳", "辛克莱", "奥提斯", "桂",
];

/// One drawable identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub name: &'static str,
    pub sinner: &'static str,
    pub rarity: &'static str,
    /// Portrait file name, unique per identity.
    pub image: &'static str,
}

impl Drawable for Identity {
    fn rarity(&self) -> &str {
        self.rarity
    }
}

const fn id(
    name: &'static str,
    sinner: &'static str,
    rarity: &'static str,
    image: &'static str,
) -> Identity {
    Identity { name, sinner, rarity, image }
}

/// Every drawable identity.
pub static IDENTITIES: [Identity; 60] = [
    // === SSS (000) ===
    id("LCB囚人", "以实玛利", RARITY_SSS, "yi_sang_lcb.png"),
    id("刺客翎羽事务所", "以实玛利", RARITY_SSS, "yi_sang_feather.png"),
    id("七色协会东部支部4科", "以实玛利", RARITY_SSS, "yi_sang_7_section4.png"),
    id("LCB囚人", "浮士德", RARITY_SSS, "faust_lcb.png"),
    id("七色协会西部支部3科", "浮士德", RARITY_SSS, "faust_7_section3.png"),
    id("流血狂欢骑士团", "浮士德", RARITY_SSS, "faust_bloodfiesta.png"),
    id("LCB囚人", "堂吉诃德", RARITY_SSS, "don_quixote_lcb.png"),
    id("石灰工坊", "堂吉诃德", RARITY_SSS, "don_quixote_shi.png"),
    id("W协会3科", "堂吉诃德", RARITY_SSS, "don_quixote_w3.png"),
    id("LCB囚人", "良秀", RARITY_SSS, "ryoshu_lcb.png"),
    id("七色协会东部支部4科", "良秀", RARITY_SSS, "ryoshu_7_section4.png"),
    id("流血狂欢骑士团", "良秀", RARITY_SSS, "ryoshu_bloodfiesta.png"),
    id("LCB囚人", "默尔索", RARITY_SSS, "meursault_lcb.png"),
    id("石灰工坊", "默尔索", RARITY_SSS, "meursault_shi.png"),
    id("刺客翎羽事务所", "默尔索", RARITY_SSS, "meursault_feather.png"),
    id("LCB囚人", "鸿璐", RARITY_SSS, "hong_lu_lcb.png"),
    id("流血狂欢骑士团", "鸿璐", RARITY_SSS, "hong_lu_bloodfiesta.png"),
    id("七色协会西部支部4科", "鸿璐", RARITY_SSS, "hong_lu_7_section4.png"),
    id("LCB囚人", "希斯克利夫", RARITY_SSS, "heathcliff_lcb.png"),
    id("石灰工坊", "希斯克利夫", RARITY_SSS, "heathcliff_shi.png"),
    id("七色协会西部支部3科", "希斯克利夫", RARITY_SSS, "heathcliff_7_section3.png"),
    id("LCB囚人", "以扫", RARITY_SSS, "ishmael_lcb.png"),
    id("七色协会南部支部4科", "以扫", RARITY_SSS, "ishmael_7_section4.png"),
    id("刺客翎羽事务所", "以扫", RARITY_SSS, "ishmael_feather.png"),
    id("LCB囚人", "罗佳", RARITY_SSS, "rodya_lcb.png"),
    id("流血狂欢骑士团", "罗佳", RARITY_SSS, "rodya_bloodfiesta.png"),
    id("七色协会东部支部4科", "罗佳", RARITY_SSS, "rodya_7_section4.png"),
    id("LCB囚人", "辛克莱", RARITY_SSS, "sinclair_lcb.png"),
    id("石灰工坊", "辛克莱", RARITY_SSS, "sinclair_shi.png"),
    id("七色协会南部支部4科", "辛克莱", RARITY_SSS, "sinclair_7_section4.png"),
    id("LCB囚人", "奥提斯", RARITY_SSS, "outis_lcb.png"),
    id("七色协会西部支部3科", "奥提斯", RARITY_SSS, "outis_7_section3.png"),
    id("W协会3科", "奥提斯", RARITY_SSS, "outis_w3.png"),
    id("LCB囚人", "桂", RARITY_SSS, "gregor_lcb.png"),
    id("刺客翎羽事务所", "桂", RARITY_SSS, "gregor_feather.png"),
    id("流血狂欢骑士团", "桂", RARITY_SSS, "gregor_bloodfiesta.png"),
    // === SS (00) ===
    id("南部夜叉刘氏事务所", "以实玛利", RARITY_SS, "yi_sang_liu.png"),
    id("迪耶奇协会", "浮士德", RARITY_SS, "faust_dieci.png"),
    id("迪耶奇协会", "堂吉诃德", RARITY_SS, "don_quixote_dieci.png"),
    id("N协会大剑", "良秀", RARITY_SS, "ryoshu_n_corp.png"),
    id("迪耶奇协会", "默尔索", RARITY_SS, "meursault_dieci.png"),
    id("南部夜叉刘氏事务所", "鸿璐", RARITY_SS, "hong_lu_liu.png"),
    id("N协会大锤", "希斯克利夫", RARITY_SS, "heathcliff_n_corp.png"),
    id("南部夜叉刘氏事务所", "以扫", RARITY_SS, "ishmael_liu.png"),
    id("N协会大剑", "罗佳", RARITY_SS, "rodya_n_corp.png"),
    id("南部夜叉刘氏事务所", "辛克莱", RARITY_SS, "sinclair_liu.png"),
    id("迪耶奇协会", "奥提斯", RARITY_SS, "outis_dieci.png"),
    id("N协会大锤", "桂", RARITY_SS, "gregor_n_corp.png"),
    // === S (0) ===
    id("雅格布事务所", "以实玛利", RARITY_S, "yi_sang_yageob.png"),
    id("雅格布事务所", "浮士德", RARITY_S, "faust_yageob.png"),
    id("雅格布事务所", "堂吉诃德", RARITY_S, "don_quixote_yageob.png"),
    id("雅格布事务所", "良秀", RARITY_S, "ryoshu_yageob.png"),
    id("雅格布事务所", "默尔索", RARITY_S, "meursault_yageob.png"),
    id("雅格布事务所", "鸿璐", RARITY_S, "hong_lu_yageob.png"),
    id("雅格布事务所", "希斯克利夫", RARITY_S, "heathcliff_yageob.png"),
    id("雅格布事务所", "以扫", RARITY_S, "ishmael_yageob.png"),
    id("雅格布事务所", "罗佳", RARITY_S, "rodya_yageob.png"),
    id("雅格布事务所", "辛克莱", RARITY_S, "sinclair_yageob.png"),
    id("雅格布事务所", "奥提斯", RARITY_S, "outis_yageob.png"),
    id("雅格布事务所", "桂", RARITY_S, "gregor_yageob.png"),
];

/// The whole catalog.
pub fn all_identities() -> &'static [Identity] {
    &IDENTITIES
}

/// Catalog entries of one rarity.
pub fn identities_by_rarity(rarity: &str) -> Vec<Identity> {
    IDENTITIES.iter().filter(|i| i.rarity == rarity).copied().collect()
}

/// Star display for a rarity label. Unknown labels are returned as-is.
pub fn rarity_display(rarity: &str) -> &str {
    match rarity {
        RARITY_SSS => "★★★ (000)",
        RARITY_SS => "★★ (00)",
        RARITY_S => "★ (0)",
        other => other,
    }
}

/// Sort weight for display; higher is rarer, unknown labels sink to 0.
pub fn rarity_rank(rarity: &str) -> u8 {
    match rarity {
        RARITY_SSS => 3,
        RARITY_SS => 2,
        RARITY_S => 1,
        _ => 0,
    }
}
