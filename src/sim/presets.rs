//! Brick preset catalog
//!
//! Immutable templates shared by every level. The formation generator picks
//! preset ids; the pool copies durability from the preset when a brick is
//! placed.

use serde::Serialize;

use super::paddle::Powerup;

/// Generation group a preset is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PresetGroup {
    Standard,
    Reinforced,
    Special,
    /// Very durable but breakable filler
    Obstacle,
    /// Never breaks; decoration that doesn't block level completion
    Indestructible,
}

/// A named brick template
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BrickPreset {
    pub id: &'static str,
    pub group: PresetGroup,
    /// RGBA
    pub color: u32,
    /// Extra hits needed beyond the first
    pub supplementary_hits: u8,
    pub undestructible: bool,
    /// Points for destroying it
    pub score: u64,
    /// Relative spawn weight within its group
    pub weight: f32,
    pub drops: Option<Powerup>,
}

pub static PRESETS: &[BrickPreset] = &[
    BrickPreset {
        id: "red",
        group: PresetGroup::Standard,
        color: 0xE5_39_35_FF,
        supplementary_hits: 0,
        undestructible: false,
        score: 10,
        weight: 1.0,
        drops: None,
    },
    BrickPreset {
        id: "orange",
        group: PresetGroup::Standard,
        color: 0xFB_8C_00_FF,
        supplementary_hits: 0,
        undestructible: false,
        score: 10,
        weight: 1.0,
        drops: None,
    },
    BrickPreset {
        id: "green",
        group: PresetGroup::Standard,
        color: 0x43_A0_47_FF,
        supplementary_hits: 0,
        undestructible: false,
        score: 10,
        weight: 1.0,
        drops: None,
    },
    BrickPreset {
        id: "blue",
        group: PresetGroup::Standard,
        color: 0x1E_88_E5_FF,
        supplementary_hits: 0,
        undestructible: false,
        score: 10,
        weight: 1.0,
        drops: None,
    },
    BrickPreset {
        id: "silver",
        group: PresetGroup::Reinforced,
        color: 0xB0_BE_C5_FF,
        supplementary_hits: 1,
        undestructible: false,
        score: 10,
        weight: 3.0,
        drops: None,
    },
    BrickPreset {
        id: "gold",
        group: PresetGroup::Reinforced,
        color: 0xFF_D5_4F_FF,
        supplementary_hits: 2,
        undestructible: false,
        score: 10,
        weight: 1.0,
        drops: None,
    },
    BrickPreset {
        id: "sticky",
        group: PresetGroup::Special,
        color: 0x8E_24_AA_FF,
        supplementary_hits: 0,
        undestructible: false,
        score: 10,
        weight: 1.0,
        drops: Some(Powerup::Sticky),
    },
    BrickPreset {
        id: "enlarge",
        group: PresetGroup::Special,
        color: 0x00_AC_C1_FF,
        supplementary_hits: 0,
        undestructible: false,
        score: 10,
        weight: 2.0,
        drops: Some(Powerup::Enlarge),
    },
    BrickPreset {
        id: "shrink",
        group: PresetGroup::Special,
        color: 0xD8_1B_60_FF,
        supplementary_hits: 0,
        undestructible: false,
        score: 10,
        weight: 1.0,
        drops: Some(Powerup::Shrink),
    },
    BrickPreset {
        id: "stone",
        group: PresetGroup::Obstacle,
        color: 0x6D_4C_41_FF,
        supplementary_hits: 4,
        undestructible: false,
        score: 10,
        weight: 1.0,
        drops: None,
    },
    BrickPreset {
        id: "steel",
        group: PresetGroup::Indestructible,
        color: 0x45_5A_64_FF,
        supplementary_hits: 0,
        undestructible: true,
        score: 0,
        weight: 1.0,
        drops: None,
    },
];

/// Look up a preset by id
pub fn preset(id: &str) -> Option<&'static BrickPreset> {
    PRESETS.iter().find(|p| p.id == id)
}

/// All presets of a group, in catalog order
pub fn group(group: PresetGroup) -> impl Iterator<Item = &'static BrickPreset> {
    PRESETS.iter().filter(move |p| p.group == group)
}
