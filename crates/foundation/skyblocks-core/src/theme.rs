//! Block materials
//!
//! The ledger stores a theme as a bare integer. Only four values mean
//! anything to the renderer; everything else is drawn as grass while the
//! stored integer stays untouched on the [`Floor`](crate::Floor).

use ethereum_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Known theme identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ThemeId {
    Grass = 0,
    Lava = 1,
    Ice = 2,
    Luxury = 3,
}

impl ThemeId {
    /// Map a raw ledger value to a known theme, if it is one
    pub fn from_raw(raw: U256) -> Option<Self> {
        if raw > U256::from(u8::MAX) {
            return None;
        }
        match raw.low_u64() {
            0 => Some(Self::Grass),
            1 => Some(Self::Lava),
            2 => Some(Self::Ice),
            3 => Some(Self::Luxury),
            _ => None,
        }
    }

    /// Value written to the ledger for this theme
    pub fn as_raw(self) -> U256 {
        U256::from(self as u8)
    }

    /// Display descriptor for this theme
    pub fn theme(self) -> &'static Theme {
        &THEMES[self as usize]
    }
}

impl Default for ThemeId {
    fn default() -> Self {
        Self::Grass
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.theme().name)
    }
}

/// Display descriptor: a name and the four color roles of a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub id: ThemeId,
    pub name: &'static str,
    /// Front face of the block
    pub face_color: &'static str,
    /// Top and bottom slabs
    pub side_color: &'static str,
    pub border_color: &'static str,
    /// Message text drawn on the face
    pub text_color: &'static str,
}

impl Theme {
    /// All themes, in picker order
    pub fn all() -> &'static [Theme] {
        &THEMES
    }
}

// Indexed by `ThemeId as usize`.
static THEMES: [Theme; 4] = [
    Theme {
        id: ThemeId::Grass,
        name: "Grass",
        face_color: "#22c55e",
        side_color: "#16a34a",
        border_color: "#166534",
        text_color: "#f0fdf4",
    },
    Theme {
        id: ThemeId::Lava,
        name: "Lava",
        face_color: "#ea580c",
        side_color: "#c2410c",
        border_color: "#7f1d1d",
        text_color: "#ffedd5",
    },
    Theme {
        id: ThemeId::Ice,
        name: "Ice",
        face_color: "#22d3ee",
        side_color: "#06b6d4",
        border_color: "#0e7490",
        text_color: "#164e63",
    },
    Theme {
        id: ThemeId::Luxury,
        name: "Luxury",
        face_color: "#facc15",
        side_color: "#eab308",
        border_color: "#a16207",
        text_color: "#713f12",
    },
];

/// Theme descriptor for a raw ledger value. Unknown values resolve to GRASS.
pub fn resolve_theme(raw: U256) -> &'static Theme {
    ThemeId::from_raw(raw).unwrap_or_default().theme()
}
