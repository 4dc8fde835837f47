// Tempo presets - fixed target frame pairs per training mode
//
// Two families are defined: the long game trains a 3:1 backswing:downswing
// ratio and the short game a 2:1 ratio. Every preset inside one family shares
// the same ratio and only differs in overall swing speed.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Training mode selecting a preset family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TempoMode {
    /// Full swing, 3:1 family
    Long,
    /// Short game, 2:1 family
    Short,
}

impl TempoMode {
    /// Get human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            TempoMode::Long => "Long game",
            TempoMode::Short => "Short game",
        }
    }

    /// Ratio every preset of this mode trains
    pub fn target_ratio(&self) -> f64 {
        match self {
            TempoMode::Long => 3.0,
            TempoMode::Short => 2.0,
        }
    }

    fn id_prefix(&self) -> &'static str {
        match self {
            TempoMode::Long => "long",
            TempoMode::Short => "short",
        }
    }
}

impl std::str::FromStr for TempoMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "long" => Ok(TempoMode::Long),
            "short" => Ok(TempoMode::Short),
            other => Err(format!("unknown tempo mode '{}' (expected long|short)", other)),
        }
    }
}

/// A named target frame pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoPreset {
    pub id: String,
    pub label: String,
    pub backswing_frames: u32,
    pub downswing_frames: u32,
    pub description: String,
}

impl TempoPreset {
    fn new(mode: TempoMode, backswing_frames: u32, downswing_frames: u32, description: &str) -> Self {
        Self {
            id: format!("{}-{}-{}", mode.id_prefix(), backswing_frames, downswing_frames),
            label: format!("{}/{}", backswing_frames, downswing_frames),
            backswing_frames,
            downswing_frames,
            description: description.to_string(),
        }
    }

    /// Target ratio `backswing_frames / downswing_frames`
    pub fn ratio(&self) -> f64 {
        self.backswing_frames as f64 / self.downswing_frames as f64
    }

    /// Mode family this preset belongs to, taken from its id
    pub fn mode(&self) -> TempoMode {
        if self.id.starts_with(TempoMode::Short.id_prefix()) {
            TempoMode::Short
        } else {
            TempoMode::Long
        }
    }
}

static LONG_PRESETS: Lazy<Vec<TempoPreset>> = Lazy::new(|| {
    vec![
        TempoPreset::new(TempoMode::Long, 18, 6, "Fast tempo of quick-swinging tour players"),
        TempoPreset::new(TempoMode::Long, 21, 7, "Brisk tour tempo"),
        TempoPreset::new(TempoMode::Long, 24, 8, "Tour average tempo"),
        TempoPreset::new(TempoMode::Long, 27, 9, "Smooth, unhurried tempo"),
        TempoPreset::new(TempoMode::Long, 30, 10, "Slow and rhythmic tempo"),
    ]
});

static SHORT_PRESETS: Lazy<Vec<TempoPreset>> = Lazy::new(|| {
    vec![
        TempoPreset::new(TempoMode::Short, 14, 7, "Crisp chipping stroke"),
        TempoPreset::new(TempoMode::Short, 16, 8, "Firm pitching stroke"),
        TempoPreset::new(TempoMode::Short, 18, 9, "Standard short-game tempo"),
        TempoPreset::new(TempoMode::Short, 20, 10, "Soft pitching stroke"),
        TempoPreset::new(TempoMode::Short, 22, 11, "Long, flowing putting stroke"),
    ]
});

/// Fixed preset list for a mode, ordered from fastest to slowest
pub fn presets_for_mode(mode: TempoMode) -> &'static [TempoPreset] {
    match mode {
        TempoMode::Long => &LONG_PRESETS,
        TempoMode::Short => &SHORT_PRESETS,
    }
}

/// Look a preset up by id across both modes
pub fn preset_by_id(id: &str) -> Option<&'static TempoPreset> {
    LONG_PRESETS
        .iter()
        .chain(SHORT_PRESETS.iter())
        .find(|preset| preset.id == id)
}
