use serde::{Deserialize, Serialize};

/// Difficulty tier of a mined position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Hard,
    Normal,
    Easy,
    Skip,
}

impl Tier {
    /// Tiers that produce dataset files.
    pub const EXPORTED: [Tier; 3] = [Tier::Hard, Tier::Normal, Tier::Easy];

    pub fn name(self) -> &'static str {
        match self {
            Tier::Hard => "hard",
            Tier::Normal => "normal",
            Tier::Easy => "easy",
            Tier::Skip => "skip",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
