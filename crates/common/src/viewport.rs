//! Viewport size categories and active-category resolution.

use std::str::FromStr;

use derive_more::Display;
use serde::Serialize;

/// A named viewport-width bucket.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[display("huge")]
    Huge,
    #[display("large")]
    Large,
    #[display("medium")]
    Medium,
    #[display("small")]
    Small,
    #[display("tiny")]
    Tiny,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Huge,
        Category::Large,
        Category::Medium,
        Category::Small,
        Category::Tiny,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Huge => "huge",
            Category::Large => "large",
            Category::Medium => "medium",
            Category::Small => "small",
            Category::Tiny => "tiny",
        }
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or(())
    }
}

/// Category thresholds in the order they were declared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewportCategories {
    entries: Vec<(Category, u32)>,
}

impl ViewportCategories {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a category, or updates its threshold in place when present.
    pub fn insert(&mut self, category: Category, threshold: u32) {
        match self.entries.iter_mut().find(|(c, _)| *c == category) {
            Some(entry) => entry.1 = threshold,
            None => self.entries.push((category, threshold)),
        }
    }

    #[must_use]
    pub fn threshold(&self, category: Category) -> Option<u32> {
        self.entries
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, t)| *t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, u32)> + '_ {
        self.entries.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// See [`resolve_category`].
    #[must_use]
    pub fn resolve(&self, width: f64) -> Option<Category> {
        resolve_category(self, width)
    }
}

impl FromIterator<(Category, u32)> for ViewportCategories {
    fn from_iter<I: IntoIterator<Item = (Category, u32)>>(iter: I) -> Self {
        let mut categories = ViewportCategories::new();
        for (category, threshold) in iter {
            categories.insert(category, threshold);
        }
        categories
    }
}

/// Returns the first category, in declaration order, whose threshold is at
/// most `width`.
///
/// There is no sorting: categories must be declared from the widest
/// threshold down for the result to be the largest qualifying category.
/// With `small: 400` declared before `large: 800`, a width of 900 resolves
/// to `small`.
#[must_use]
pub fn resolve_category(categories: &ViewportCategories, width: f64) -> Option<Category> {
    categories
        .iter()
        .find(|(_, threshold)| f64::from(*threshold) <= width)
        .map(|(category, _)| category)
}
