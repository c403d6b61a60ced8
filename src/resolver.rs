//! Token resolution.
//!
//! Turns one candidate token into at most one [`ResolvedRule`]. Resolution
//! is a pure function of the token and the frozen registry + theme, so it
//! is safe to fan out across threads. A token that fails any step resolves
//! to a miss, never an error: scanned text is full of strings that only
//! accidentally look like utilities.

use crate::registry::{Matcher, RuleRegistry, ThemeTable, UtilityRule, ValueKind, VariantWrap};
use crate::theme::Theme;

/// Where a resolved rule came from. Later variants take precedence when
/// the same selector is produced twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Origin {
    Scanned,
    Safelisted,
    PluginForced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRule {
    /// The original token text; canonical identity for deduplication.
    pub class: String,
    /// Escaped class selector, e.g. `.hover\:bg-stone-300`.
    pub selector: String,
    /// Semicolon-separated declarations, template already substituted.
    pub declarations: String,
    /// Wrapping layers in written variant order, outermost first.
    pub layers: Vec<VariantWrap>,
    pub rank: u32,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Rule(ResolvedRule),
    Miss(MissReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissReason {
    UnknownVariant { variant: String },
    InvalidParameter { base: String },
    Unmatched,
}

impl MissReason {
    pub fn notice(&self, token: &str) -> String {
        match self {
            Self::UnknownVariant { variant } => {
                format!("unmatched variant '{}' in token: {}", variant, token)
            }
            Self::InvalidParameter { base } => {
                format!("invalid parameter in '{}' for token: {}", base, token)
            }
            Self::Unmatched => format!("unmatched token: {}", token),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    registry: &'a RuleRegistry,
    theme: &'a Theme,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a RuleRegistry, theme: &'a Theme) -> Self {
        Self { registry, theme }
    }

    pub fn resolve(&self, token: &str, origin: Origin) -> Resolution {
        let (variants, base) = parse_variants(token);

        let mut layers = Vec::with_capacity(variants.len() + 1);
        for variant in &variants {
            match self.registry.variant(variant) {
                Some(wrap) => layers.push(wrap.clone()),
                None => {
                    return Resolution::Miss(MissReason::UnknownVariant {
                        variant: variant.to_string(),
                    })
                }
            }
        }

        let candidates = self.registry.candidates(base);
        if candidates.is_empty() {
            return Resolution::Miss(MissReason::Unmatched);
        }

        for rule in &candidates {
            if let Some(declarations) = self.generate(rule, base) {
                if let Some(suffix) = &rule.selector_suffix {
                    layers.push(VariantWrap::Selector(suffix.clone()));
                }
                return Resolution::Rule(ResolvedRule {
                    class: token.to_string(),
                    selector: format!(".{}", escape_selector(token)),
                    declarations,
                    layers,
                    rank: rule.rank,
                    origin,
                });
            }
        }

        Resolution::Miss(MissReason::InvalidParameter {
            base: base.to_string(),
        })
    }

    /// Substitute the rule's template, or `None` when the parameter fails
    /// validation for the matcher's value kind.
    fn generate(&self, rule: &UtilityRule, base: &str) -> Option<String> {
        let value = match &rule.matcher {
            Matcher::Exact(_) => return Some(rule.template.clone()),
            Matcher::PrefixValue { kind, .. } => {
                let param = rule.matcher.param_of(base)?;
                resolve_value(param, *kind)?
            }
            Matcher::PrefixEnum { table, .. } => {
                let param = rule.matcher.param_of(base)?;
                self.resolve_theme_value(param, *table)?
            }
        };
        Some(rule.template.replace("{value}", &value))
    }

    fn resolve_theme_value(&self, param: &str, table: ThemeTable) -> Option<String> {
        if let Some(raw) = arbitrary_value(param) {
            return Some(raw);
        }
        let value = match table {
            ThemeTable::Colors => self.theme.color_value(param)?,
            ThemeTable::FontSizes => self.theme.font_size_value(param)?,
        };
        Some(value.to_string())
    }
}

fn resolve_value(param: &str, kind: ValueKind) -> Option<String> {
    if let Some(raw) = arbitrary_value(param) {
        return Some(raw);
    }
    match kind {
        ValueKind::Spacing => {
            if param == "px" {
                return Some("1px".to_string());
            }
            let multiplier: f64 = param.parse().ok()?;
            if !multiplier.is_finite() || multiplier < 0.0 {
                return None;
            }
            Some(format!("calc(var(--spacing) * {})", param))
        }
        ValueKind::Number => {
            let number: f64 = param.parse().ok()?;
            if !number.is_finite() {
                return None;
            }
            Some(param.to_string())
        }
        ValueKind::Arbitrary => None,
    }
}

/// A bracketed literal like `[3.5rem]`, with underscores restored to
/// spaces. Anything else is not an arbitrary value.
fn arbitrary_value(param: &str) -> Option<String> {
    let inner = param.strip_prefix('[')?.strip_suffix(']')?;
    if inner.is_empty() {
        return None;
    }
    Some(inner.replace('_', " "))
}

/// Split a token into its variant chain and base utility. Colons inside
/// brackets or parentheses do not split, so arbitrary values like
/// `bg-[url(http://x)]` survive.
pub fn parse_variants(token: &str) -> (Vec<&str>, &str) {
    let mut paren_depth = 0usize;
    let mut bracket_depth = 0usize;
    let mut split_indices = Vec::new();

    for (idx, ch) in token.char_indices() {
        match ch {
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.saturating_sub(1),
            '[' => bracket_depth += 1,
            ']' => bracket_depth = bracket_depth.saturating_sub(1),
            ':' if paren_depth == 0 && bracket_depth == 0 => split_indices.push(idx),
            _ => {}
        }
    }

    if split_indices.is_empty() {
        return (Vec::new(), token);
    }
    let mut variants = Vec::new();
    let mut start = 0usize;
    for idx in split_indices {
        variants.push(&token[start..idx]);
        start = idx + 1;
    }
    (variants, &token[start..])
}

/// Escape a class name for use in a CSS selector.
pub fn escape_selector(class: &str) -> String {
    let mut escaped = String::with_capacity(class.len() * 2);
    for ch in class.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ':' => escaped.push_str("\\:"),
            '/' => escaped.push_str("\\/"),
            '.' => escaped.push_str("\\."),
            '[' => escaped.push_str("\\["),
            ']' => escaped.push_str("\\]"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            '%' => escaped.push_str("\\%"),
            '#' => escaped.push_str("\\#"),
            '&' => escaped.push_str("\\&"),
            '*' => escaped.push_str("\\*"),
            '!' => escaped.push_str("\\!"),
            ',' => escaped.push_str("\\,"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{parse_variants, MissReason, Origin, Resolution, Resolver};
    use crate::registry::{RegistryBuilder, VariantWrap};
    use crate::theme::Theme;

    fn resolve(token: &str) -> Resolution {
        let theme = Theme::default();
        let registry = RegistryBuilder::with_core_rules(&theme).freeze();
        Resolver::new(&registry, &theme).resolve(token, Origin::Scanned)
    }

    #[test]
    fn resolves_spacing_utility() {
        let Resolution::Rule(rule) = resolve("p-4") else {
            panic!("p-4 should resolve");
        };
        assert_eq!(rule.selector, ".p-4");
        assert_eq!(rule.declarations, "padding:calc(var(--spacing) * 4)");
        assert!(rule.layers.is_empty());
    }

    #[test]
    fn resolves_fractional_spacing() {
        let Resolution::Rule(rule) = resolve("p-2.5") else {
            panic!("p-2.5 should resolve");
        };
        assert_eq!(rule.selector, ".p-2\\.5");
        assert_eq!(rule.declarations, "padding:calc(var(--spacing) * 2.5)");
    }

    #[test]
    fn resolves_color_utility_through_theme() {
        let Resolution::Rule(rule) = resolve("bg-stone-300") else {
            panic!("bg-stone-300 should resolve");
        };
        assert_eq!(rule.declarations, "background-color:#d6d3d1");
    }

    #[test]
    fn text_prefix_disambiguates_by_parameter() {
        let Resolution::Rule(size) = resolve("text-sm") else {
            panic!("text-sm should resolve");
        };
        assert_eq!(size.declarations, "font-size:var(--text-sm)");

        let Resolution::Rule(color) = resolve("text-stone-600") else {
            panic!("text-stone-600 should resolve");
        };
        assert_eq!(color.declarations, "color:#57534e");
    }

    #[test]
    fn resolves_arbitrary_values() {
        let Resolution::Rule(rule) = resolve("p-[3.5rem]") else {
            panic!("p-[3.5rem] should resolve");
        };
        assert_eq!(rule.declarations, "padding:3.5rem");

        let Resolution::Rule(color) = resolve("bg-[#ff0000]") else {
            panic!("bg-[#ff0000] should resolve");
        };
        assert_eq!(color.declarations, "background-color:#ff0000");
    }

    #[test]
    fn arbitrary_underscores_become_spaces() {
        let Resolution::Rule(rule) = resolve("m-[0_auto]") else {
            panic!("m-[0_auto] should resolve");
        };
        assert_eq!(rule.declarations, "margin:0 auto");
    }

    #[test]
    fn hover_variant_wraps_selector() {
        let Resolution::Rule(rule) = resolve("hover:bg-stone-300") else {
            panic!("hover:bg-stone-300 should resolve");
        };
        assert_eq!(rule.selector, ".hover\\:bg-stone-300");
        assert_eq!(
            rule.layers,
            vec![VariantWrap::Selector(":hover".to_string())]
        );
    }

    #[test]
    fn variant_order_is_preserved_not_sorted() {
        let Resolution::Rule(hover_dark) = resolve("hover:dark:p-4") else {
            panic!("hover:dark:p-4 should resolve");
        };
        let Resolution::Rule(dark_hover) = resolve("dark:hover:p-4") else {
            panic!("dark:hover:p-4 should resolve");
        };
        assert_eq!(
            hover_dark.layers,
            vec![
                VariantWrap::Selector(":hover".to_string()),
                VariantWrap::Media("@media (prefers-color-scheme: dark)".to_string()),
            ]
        );
        assert_eq!(
            dark_hover.layers,
            vec![
                VariantWrap::Media("@media (prefers-color-scheme: dark)".to_string()),
                VariantWrap::Selector(":hover".to_string()),
            ]
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        assert_eq!(resolve("md:hover:p-4"), resolve("md:hover:p-4"));
    }

    #[test]
    fn unknown_variant_is_a_miss() {
        let Resolution::Miss(reason) = resolve("mystery:p-4") else {
            panic!("mystery:p-4 must not resolve");
        };
        assert_eq!(
            reason,
            MissReason::UnknownVariant {
                variant: "mystery".to_string()
            }
        );
    }

    #[test]
    fn unmatched_token_is_a_miss_not_an_error() {
        let Resolution::Miss(reason) = resolve("not-a-class") else {
            panic!("not-a-class must not resolve");
        };
        assert_eq!(reason, MissReason::Unmatched);
    }

    #[test]
    fn invalid_parameter_is_a_miss() {
        let Resolution::Miss(reason) = resolve("p-banana") else {
            panic!("p-banana must not resolve");
        };
        assert_eq!(
            reason,
            MissReason::InvalidParameter {
                base: "p-banana".to_string()
            }
        );

        assert!(matches!(resolve("bg-nonexistent-500"), Resolution::Miss(_)));
    }

    #[test]
    fn negative_spacing_is_rejected() {
        assert!(matches!(resolve("p--4"), Resolution::Miss(_)));
    }

    #[test]
    fn divide_utility_carries_child_selector_suffix() {
        let Resolution::Rule(rule) = resolve("divide-gray-200") else {
            panic!("divide-gray-200 should resolve");
        };
        assert_eq!(
            rule.layers,
            vec![VariantWrap::Selector(" > :not(:last-child)".to_string())]
        );
        assert_eq!(rule.declarations, "border-color:#e5e7eb");
    }

    #[test]
    fn splits_variants_depth_aware() {
        let (variants, base) = parse_variants("md:hover:bg-[url(http://x)]");
        assert_eq!(variants, vec!["md", "hover"]);
        assert_eq!(base, "bg-[url(http://x)]");
    }
}
