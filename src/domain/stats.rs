use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Bytes of code per language, in the order the upstream API reports them.
/// Order matters: it is preserved all the way into the serialized payload.
pub type LanguageByteMap = IndexMap<String, u64>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageStat {
    pub name: String,
    /// Share of the containing byte total, rounded half-up. Per-entry rounding
    /// means a breakdown may sum to 99 or 101.
    pub percentage: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillCategory {
    #[serde(rename = "Frontend Development")]
    Frontend,
    #[serde(rename = "Backend Development")]
    Backend,
    #[serde(rename = "Database Management")]
    Database,
    #[serde(rename = "Tools & Technologies")]
    Tooling,
    #[serde(rename = "Other")]
    Other,
}

impl SkillCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            SkillCategory::Frontend => "Frontend Development",
            SkillCategory::Backend => "Backend Development",
            SkillCategory::Database => "Database Management",
            SkillCategory::Tooling => "Tools & Technologies",
            SkillCategory::Other => "Other",
        }
    }
}

pub fn category_for_language(name: &str) -> SkillCategory {
    match name {
        "TypeScript" | "JavaScript" | "HTML" | "CSS" | "SCSS" | "Vue" => SkillCategory::Frontend,
        "Python" | "Go" | "Java" | "Ruby" | "PHP" | "C#" | "C++" | "Rust" => {
            SkillCategory::Backend
        }
        "SQL" | "PLpgSQL" => SkillCategory::Database,
        "Shell" | "Dockerfile" | "Makefile" => SkillCategory::Tooling,
        _ => SkillCategory::Other,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillLevel {
    pub name: String,
    /// Share of all bytes across every aggregated repository, 0..=100.
    pub level: u8,
    pub category: SkillCategory,
}

fn share(bytes: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    (bytes as f64 / total as f64 * 100.0).round() as u8
}

/// Per-repository breakdown: one entry per language, largest share first.
/// Ties keep the byte-map order.
pub fn language_stats(bytes: &LanguageByteMap) -> Vec<LanguageStat> {
    let total: u64 = bytes.values().sum();
    let mut stats: Vec<LanguageStat> = bytes
        .iter()
        .map(|(name, &n)| LanguageStat {
            name: name.clone(),
            percentage: share(n, total),
        })
        .collect();
    stats.sort_by(|a, b| b.percentage.cmp(&a.percentage));
    stats
}

/// Account-wide skill list from accumulated byte totals, strongest first.
pub fn skill_levels(totals: &LanguageByteMap) -> Vec<SkillLevel> {
    let total: u64 = totals.values().sum();
    let mut skills: Vec<SkillLevel> = totals
        .iter()
        .map(|(name, &n)| SkillLevel {
            name: name.clone(),
            level: share(n, total),
            category: category_for_language(name),
        })
        .collect();
    skills.sort_by(|a, b| b.level.cmp(&a.level));
    skills
}
