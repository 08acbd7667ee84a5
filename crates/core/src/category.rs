use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of cards in a finished deck.
pub const REQUIRED_TOTAL: u32 = 52;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Romantic,
    Deep,
    Naughty,
    Friendship,
    Playful,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Romantic,
        Category::Deep,
        Category::Naughty,
        Category::Friendship,
        Category::Playful,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Category::Romantic => "romantic",
            Category::Deep => "deep",
            Category::Naughty => "naughty",
            Category::Friendship => "friendship",
            Category::Playful => "playful",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Romantic => "Romantic",
            Category::Deep => "Deep",
            Category::Naughty => "Naughty",
            Category::Friendship => "Friendship",
            Category::Playful => "Playful",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Category::Romantic => "Questions that spark love and connection",
            Category::Deep => "Thought-provoking questions for meaningful conversations",
            Category::Naughty => "Playful and flirty questions to heat things up",
            Category::Friendship => "Questions to strengthen your bond",
            Category::Playful => "Fun and lighthearted questions",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.key().eq_ignore_ascii_case(key))
    }

    fn slot(self) -> usize {
        match self {
            Category::Romantic => 0,
            Category::Deep => 1,
            Category::Naughty => 2,
            Category::Friendship => 3,
            Category::Playful => 4,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_key(value).ok_or_else(|| UnknownCategory(value.to_string()))
    }
}

/// Per-category card counts. Serialized as an object keyed by category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryCounts {
    pub romantic: u32,
    pub deep: u32,
    pub naughty: u32,
    pub friendship: u32,
    pub playful: u32,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> u32 {
        self.as_array()[category.slot()]
    }

    pub fn set(&mut self, category: Category, value: u32) {
        let slot = match category {
            Category::Romantic => &mut self.romantic,
            Category::Deep => &mut self.deep,
            Category::Naughty => &mut self.naughty,
            Category::Friendship => &mut self.friendship,
            Category::Playful => &mut self.playful,
        };
        *slot = value;
    }

    pub fn total(&self) -> u32 {
        self.as_array().iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, u32)> + '_ {
        Category::ALL
            .iter()
            .map(move |category| (*category, self.get(*category)))
    }

    pub fn non_zero(&self) -> impl Iterator<Item = (Category, u32)> + '_ {
        self.iter().filter(|(_, count)| *count > 0)
    }

    fn as_array(&self) -> [u32; 5] {
        [
            self.romantic,
            self.deep,
            self.naughty,
            self.friendship,
            self.playful,
        ]
    }
}
