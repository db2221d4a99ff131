//! Medal scoring and the best-medal book
//!
//! A solved level earns a medal from the number of concrete instructions
//! executed. The book keeps the best medal per level across attempts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Medal tiers, ordered worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Medal {
    #[default]
    None,
    Bronze,
    Silver,
    Gold,
}

impl Medal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Medal::None => "none",
            Medal::Bronze => "bronze",
            Medal::Silver => "silver",
            Medal::Gold => "gold",
        }
    }
}

/// Per-level instruction-count limits (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MedalThresholds {
    pub gold: u32,
    pub silver: u32,
    pub bronze: u32,
}

impl MedalThresholds {
    pub fn new(gold: u32, silver: u32, bronze: u32) -> Self {
        Self {
            gold,
            silver,
            bronze,
        }
    }

    /// Medal for a solved run. A count equal to a limit earns that limit's medal.
    pub fn award(&self, executed: u32) -> Medal {
        if executed <= self.gold {
            Medal::Gold
        } else if executed <= self.silver {
            Medal::Silver
        } else if executed <= self.bronze {
            Medal::Bronze
        } else {
            Medal::None
        }
    }
}

/// Best result recorded for one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalEntry {
    pub medal: Medal,
    /// Executed instruction count of the run that set the record
    pub executed: u32,
}

/// Keep-best medal record, keyed by level id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalBook {
    pub entries: BTreeMap<String, MedalEntry>,
}

impl MedalBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a result would replace the current record
    pub fn improves(&self, level: &str, medal: Medal, executed: u32) -> bool {
        match self.entries.get(level) {
            None => true,
            Some(best) => medal > best.medal || (medal == best.medal && executed < best.executed),
        }
    }

    /// Record a solved run. Returns the new best if it improved the record.
    pub fn record(&mut self, level: &str, medal: Medal, executed: u32) -> Option<MedalEntry> {
        if !self.improves(level, medal, executed) {
            return None;
        }
        let entry = MedalEntry { medal, executed };
        self.entries.insert(level.to_string(), entry);
        log::info!("New best for level {}: {} ({} instructions)", level, medal.as_str(), executed);
        Some(entry)
    }

    /// Best medal ever earned on a level
    pub fn best(&self, level: &str) -> Medal {
        self.entries.get(level).map(|e| e.medal).unwrap_or_default()
    }

    /// Number of levels with a gold medal
    pub fn gold_count(&self) -> usize {
        self.entries.values().filter(|e| e.medal == Medal::Gold).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_award_tiers() {
        let t = MedalThresholds::new(5, 7, 10);
        assert_eq!(t.award(3), Medal::Gold);
        assert_eq!(t.award(6), Medal::Silver);
        assert_eq!(t.award(9), Medal::Bronze);
        assert_eq!(t.award(11), Medal::None);
    }

    #[test]
    fn test_award_boundary_goes_to_higher_medal() {
        let t = MedalThresholds::new(5, 7, 10);
        assert_eq!(t.award(5), Medal::Gold);
        assert_eq!(t.award(7), Medal::Silver);
        assert_eq!(t.award(10), Medal::Bronze);
    }

    #[test]
    fn test_book_keeps_best() {
        let mut book = MedalBook::new();
        assert!(book.record("3", Medal::Silver, 8).is_some());
        assert!(book.record("3", Medal::Bronze, 9).is_none());
        assert_eq!(book.best("3"), Medal::Silver);

        assert!(book.record("3", Medal::Gold, 5).is_some());
        assert_eq!(book.best("3"), Medal::Gold);
        assert_eq!(book.best("4"), Medal::None);
    }

    #[test]
    fn test_book_same_medal_fewer_instructions_improves() {
        let mut book = MedalBook::new();
        book.record("0", Medal::Gold, 6);
        assert!(book.improves("0", Medal::Gold, 5));
        assert!(!book.improves("0", Medal::Gold, 6));
    }

    #[test]
    fn test_book_json_round_trip() {
        let mut book = MedalBook::new();
        book.record("1", Medal::Gold, 4);
        book.record("2", Medal::Bronze, 12);
        let json = book.to_json().unwrap();
        assert!(json.contains("\"gold\""));
        assert_eq!(MedalBook::from_json(&json).unwrap(), book);
        assert_eq!(book.gold_count(), 1);
    }
}
