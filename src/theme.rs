//! Theme lookup tables.
//!
//! The engine treats the theme as opaque key/value tables: color scales,
//! font sizes, and responsive breakpoints. Defaults ship built in;
//! configuration overrides merge on top of them. Plugins receive a shared
//! read-only reference at load time so they can derive utilities from the
//! same design tokens.

use serde::Deserialize;
use std::collections::BTreeMap;

pub type ColorScale = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Named color scales, e.g. `colors["stone"]["300"]`. Single-value
    /// colors (white, black) live under the `"DEFAULT"` shade.
    pub colors: BTreeMap<String, ColorScale>,
    /// Font size keys to CSS values, e.g. `sm -> var(--text-sm)`.
    pub font_sizes: BTreeMap<String, String>,
    /// Responsive breakpoints in ascending width order.
    pub breakpoints: Vec<(String, String)>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            colors: default_colors(),
            font_sizes: default_font_sizes(),
            breakpoints: default_breakpoints(),
        }
    }
}

impl Theme {
    /// Resolve a color token like `stone-300` or `white` against the
    /// configured scales. Returns `None` for anything not in the tables.
    pub fn color_value(&self, token: &str) -> Option<&str> {
        if let Some((name, shade)) = token.rsplit_once('-') {
            if let Some(value) = self.colors.get(name).and_then(|scale| scale.get(shade)) {
                return Some(value);
            }
        }
        self.colors
            .get(token)
            .and_then(|scale| scale.get("DEFAULT"))
            .map(String::as_str)
    }

    pub fn font_size_value(&self, key: &str) -> Option<&str> {
        self.font_sizes.get(key).map(String::as_str)
    }

    /// Merge configuration overrides over the defaults. Overridden keys
    /// replace individual entries; untouched entries stay as shipped.
    pub fn apply_overrides(&mut self, overrides: &ThemeOverrides) {
        for (name, scale) in &overrides.colors {
            let target = self.colors.entry(name.clone()).or_default();
            for (shade, value) in scale {
                target.insert(shade.clone(), value.clone());
            }
        }
        for (key, value) in &overrides.font_sizes {
            self.font_sizes.insert(key.clone(), value.clone());
        }
        for (name, width) in &overrides.breakpoints {
            match self.breakpoints.iter_mut().find(|(n, _)| n == name) {
                Some(entry) => entry.1 = width.clone(),
                None => self.breakpoints.push((name.clone(), width.clone())),
            }
        }
    }
}

/// The theme section of the configuration file. Tables are partial; they
/// overlay [`Theme::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct ThemeOverrides {
    #[serde(default)]
    pub colors: BTreeMap<String, ColorScale>,
    #[serde(default)]
    pub font_sizes: BTreeMap<String, String>,
    #[serde(default)]
    pub breakpoints: BTreeMap<String, String>,
}

fn scale(entries: &[(&str, &str)]) -> ColorScale {
    entries
        .iter()
        .map(|(shade, value)| (shade.to_string(), value.to_string()))
        .collect()
}

fn default_colors() -> BTreeMap<String, ColorScale> {
    let mut colors = BTreeMap::new();
    colors.insert("white".to_string(), scale(&[("DEFAULT", "#ffffff")]));
    colors.insert("black".to_string(), scale(&[("DEFAULT", "#000000")]));
    colors.insert(
        "transparent".to_string(),
        scale(&[("DEFAULT", "transparent")]),
    );
    colors.insert("current".to_string(), scale(&[("DEFAULT", "currentColor")]));
    colors.insert(
        "gray".to_string(),
        scale(&[
            ("50", "#f9fafb"),
            ("100", "#f3f4f6"),
            ("200", "#e5e7eb"),
            ("300", "#d1d5db"),
            ("400", "#9ca3af"),
            ("500", "#6b7280"),
            ("600", "#4b5563"),
            ("700", "#374151"),
            ("800", "#1f2937"),
            ("900", "#111827"),
        ]),
    );
    colors.insert(
        "stone".to_string(),
        scale(&[
            ("50", "#fafaf9"),
            ("100", "#f5f5f4"),
            ("200", "#e7e5e4"),
            ("300", "#d6d3d1"),
            ("400", "#a8a29e"),
            ("500", "#78716c"),
            ("600", "#57534e"),
            ("700", "#44403c"),
            ("800", "#292524"),
            ("900", "#1c1917"),
        ]),
    );
    colors.insert(
        "red".to_string(),
        scale(&[
            ("50", "#fef2f2"),
            ("100", "#fee2e2"),
            ("200", "#fecaca"),
            ("300", "#fca5a5"),
            ("400", "#f87171"),
            ("500", "#ef4444"),
            ("600", "#dc2626"),
            ("700", "#b91c1c"),
            ("800", "#991b1b"),
            ("900", "#7f1d1d"),
        ]),
    );
    colors.insert(
        "green".to_string(),
        scale(&[
            ("50", "#f0fdf4"),
            ("100", "#dcfce7"),
            ("200", "#bbf7d0"),
            ("300", "#86efac"),
            ("400", "#4ade80"),
            ("500", "#22c55e"),
            ("600", "#16a34a"),
            ("700", "#15803d"),
            ("800", "#166534"),
            ("900", "#14532d"),
        ]),
    );
    colors.insert(
        "blue".to_string(),
        scale(&[
            ("50", "#eff6ff"),
            ("100", "#dbeafe"),
            ("200", "#bfdbfe"),
            ("300", "#93c5fd"),
            ("400", "#60a5fa"),
            ("500", "#3b82f6"),
            ("600", "#2563eb"),
            ("700", "#1d4ed8"),
            ("800", "#1e40af"),
            ("900", "#1e3a8a"),
        ]),
    );
    colors
}

fn default_font_sizes() -> BTreeMap<String, String> {
    [
        ("xs", "var(--text-xs)"),
        ("sm", "var(--text-sm)"),
        ("base", "var(--text-base)"),
        ("lg", "var(--text-lg)"),
        ("xl", "var(--text-xl)"),
        ("2xl", "var(--text-2xl)"),
        ("3xl", "var(--text-3xl)"),
        ("4xl", "var(--text-4xl)"),
        ("5xl", "var(--text-5xl)"),
        ("6xl", "var(--text-6xl)"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

fn default_breakpoints() -> Vec<(String, String)> {
    vec![
        ("sm".to_string(), "40rem".to_string()),
        ("md".to_string(), "48rem".to_string()),
        ("lg".to_string(), "64rem".to_string()),
        ("xl".to_string(), "80rem".to_string()),
        ("2xl".to_string(), "96rem".to_string()),
    ]
}
