//! Cache key definitions.

use crate::domain::menu::MenuId;

pub const MENU_KEY_PREFIX: &str = "menu_";

/// Key under which the organized tree of `menu` is stored.
pub fn menu_cache_key(menu: MenuId) -> String {
    format!("{MENU_KEY_PREFIX}{menu}")
}
