//! Mood palettes
//!
//! Each mood selects one palette of eight paint colors. Moods are cycled by
//! gameplay milestones and unlocked over the course of play.

/// An RGB color
pub type Rgb = [u8; 3];

pub struct Palette {
    pub name: &'static str,
    pub colors: [Rgb; 8],
}

pub const PALETTES: [Palette; 3] = [
    Palette {
        name: "Pharaoh Sunset",
        colors: [
            [66, 102, 220],
            [250, 133, 56],
            [211, 116, 24],
            [241, 227, 95],
            [93, 203, 255],
            [116, 232, 146],
            [169, 92, 255],
            [255, 95, 152],
        ],
    },
    Palette {
        name: "Neon Tomb",
        colors: [
            [76, 86, 236],
            [255, 98, 74],
            [247, 208, 63],
            [112, 248, 255],
            [255, 68, 210],
            [129, 251, 131],
            [255, 160, 91],
            [175, 201, 255],
        ],
    },
    Palette {
        name: "Candy Dream",
        colors: [
            [103, 128, 255],
            [255, 126, 201],
            [255, 179, 102],
            [255, 243, 147],
            [132, 236, 255],
            [181, 255, 182],
            [211, 157, 255],
            [255, 106, 106],
        ],
    },
];

/// Number of moods / palettes
pub const PALETTE_COUNT: usize = PALETTES.len();

/// Palette for a mood index (wraps)
pub fn palette(index: usize) -> &'static Palette {
    &PALETTES[index % PALETTE_COUNT]
}

/// Color for a mood and color index (both wrap)
pub fn color(mood: usize, color: u8) -> Rgb {
    palette(mood).colors[color as usize % 8]
}

/// Messages shown as palettes unlock
const UNLOCK_MESSAGES: [&str; 4] = [
    "Every pixel is a little love note.",
    "Palette unlocked: Neon Tomb",
    "Palette unlocked: Candy Dream",
    "Your art is glowing beautifully.",
];

/// Message for the n-th unlock (sticks on the last one)
pub fn unlock_message(step: u32) -> &'static str {
    UNLOCK_MESSAGES[(step as usize).min(UNLOCK_MESSAGES.len() - 1)]
}
