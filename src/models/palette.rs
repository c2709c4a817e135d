//! Division color palette.
//!
//! Colors are keyed by a stable ordinal (the division's `sort_order`), not
//! by position in the current list, so a division keeps its color across
//! reloads even when the list order changes. Divisions without a
//! `sort_order` fall back to their list position.

use serde::{Deserialize, Serialize};

/// A named display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorToken {
    Blue,
    Emerald,
    Amber,
    Rose,
    Violet,
    Cyan,
    Orange,
    Lime,
}

/// The fixed palette, in cycling order.
pub const PALETTE: [ColorToken; 8] = [
    ColorToken::Blue,
    ColorToken::Emerald,
    ColorToken::Amber,
    ColorToken::Rose,
    ColorToken::Violet,
    ColorToken::Cyan,
    ColorToken::Orange,
    ColorToken::Lime,
];

/// Deterministic color for a stable ordinal.
#[inline]
pub fn palette_color(stable_index: u32) -> ColorToken {
    PALETTE[stable_index as usize % PALETTE.len()]
}

impl ColorToken {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Emerald => "emerald",
            Self::Amber => "amber",
            Self::Rose => "rose",
            Self::Violet => "violet",
            Self::Cyan => "cyan",
            Self::Orange => "orange",
            Self::Lime => "lime",
        }
    }
}
