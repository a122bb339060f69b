//! The fixed haircut style catalog.
//!
//! The catalog is defined at compile time and never mutated. Lookups by an
//! unknown identifier fall back to the first entry so a stale or mistyped id
//! still yields a renderable style.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Style {
    pub id: &'static str,
    pub name: &'static str,
    pub tags: &'static [&'static str],
}

const STANDARD_STYLES: &[Style] = &[
    Style {
        id: "low-taper",
        name: "Low Taper Fade",
        tags: &["clean", "everyday"],
    },
    Style {
        id: "mid-fade",
        name: "Mid Fade",
        tags: &["sharp", "modern"],
    },
    Style {
        id: "high-fade",
        name: "High Fade",
        tags: &["bold", "crisp"],
    },
    Style {
        id: "drop-fade",
        name: "Drop Fade",
        tags: &["trendy", "clean"],
    },
    Style {
        id: "burst-fade",
        name: "Burst Fade",
        tags: &["modern", "fresh"],
    },
    Style {
        id: "temple-fade",
        name: "Temple Fade (Brook)",
        tags: &["classic", "clean"],
    },
    Style {
        id: "bald-fade",
        name: "Skin / Bald Fade",
        tags: &["ultra clean", "sharp"],
    },
    Style {
        id: "waves-lineup",
        name: "360 Waves + Lineup",
        tags: &["waves", "lineup"],
    },
    Style {
        id: "curly-top-taper",
        name: "Curly Top + Taper",
        tags: &["texture", "taper"],
    },
    Style {
        id: "afro-taper",
        name: "Afro Taper",
        tags: &["natural", "clean"],
    },
    Style {
        id: "sponge-twists",
        name: "Sponge Twists + Taper",
        tags: &["twists", "taper"],
    },
    Style {
        id: "two-strand-twists",
        name: "Two-Strand Twists",
        tags: &["protective", "style"],
    },
];

/// Ordered, read-only list of styles. Never empty.
#[derive(Debug, Clone, Copy)]
pub struct StyleCatalog {
    styles: &'static [Style],
}

impl StyleCatalog {
    /// The shop's catalog.
    pub const fn standard() -> Self {
        Self {
            styles: STANDARD_STYLES,
        }
    }

    pub fn first(&self) -> &'static Style {
        let styles = self.styles;
        &styles[0]
    }

    /// Exact lookup.
    pub fn get(&self, id: &str) -> Option<&'static Style> {
        self.iter().find(|style| style.id == id)
    }

    /// Lookup with the catalog fallback: unknown ids resolve to the first entry.
    pub fn find(&self, id: &str) -> &'static Style {
        self.get(id).unwrap_or_else(|| self.first())
    }

    pub fn iter(&self) -> std::slice::Iter<'static, Style> {
        let styles = self.styles;
        styles.iter()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

impl Default for StyleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
