//! Output assembly.
//!
//! Takes the fully-materialized set of resolved rules, deduplicates by
//! canonical selector, orders deterministically, and serializes one
//! stylesheet. Pure with respect to its input: the same set in the same
//! first-seen order produces byte-identical output, which is what makes
//! build caching sound. Called at most once per run.

use std::collections::HashMap;

use crate::registry::VariantWrap;
use crate::resolver::ResolvedRule;

/// Deduplicate, order, and serialize. `base_css` is passed through
/// unmodified ahead of the generated rules.
pub fn assemble(resolved: Vec<ResolvedRule>, base_css: Option<&str>) -> String {
    let mut kept: Vec<(usize, ResolvedRule)> = Vec::with_capacity(resolved.len());
    let mut by_class: HashMap<String, usize> = HashMap::new();

    for (seen, rule) in resolved.into_iter().enumerate() {
        match by_class.get(&rule.class) {
            Some(&slot) => {
                // Duplicate selector: keep the highest-precedence origin,
                // but the earliest first-seen position for sort stability.
                if rule.origin > kept[slot].1.origin {
                    kept[slot].1 = rule;
                }
            }
            None => {
                by_class.insert(rule.class.clone(), kept.len());
                kept.push((seen, rule));
            }
        }
    }

    kept.sort_by(|(seen_a, a), (seen_b, b)| {
        a.rank
            .cmp(&b.rank)
            .then_with(|| seen_a.cmp(seen_b))
            .then_with(|| a.class.cmp(&b.class))
    });

    let mut out = String::new();
    if let Some(base) = base_css {
        out.push_str(base);
        if !base.ends_with('\n') {
            out.push('\n');
        }
    }
    for (_, rule) in &kept {
        out.push_str(&render_rule(rule));
        out.push('\n');
    }
    out
}

/// Serialize one rule. Variant layers nest in written order, the first
/// variant outermost, using CSS nesting inside the class selector.
fn render_rule(rule: &ResolvedRule) -> String {
    let declarations = format_declarations(&rule.declarations);
    if rule.layers.is_empty() {
        return format!("{} {{\n{}\n}}", rule.selector, indent(&declarations, 2));
    }

    let mut body = declarations;
    for layer in rule.layers.iter().rev() {
        let header = match layer {
            VariantWrap::Selector(suffix) => format!("&{}", suffix),
            VariantWrap::Media(query) => query.clone(),
        };
        body = format!("{} {{\n{}\n}}", header, indent(&body, 2));
    }
    format!("{} {{\n{}\n}}", rule.selector, indent(&body, 2))
}

/// One declaration per line, `property: value;`.
fn format_declarations(declarations: &str) -> String {
    declarations
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty())
        .map(|decl| match decl.split_once(':') {
            Some((property, value)) => format!("{}: {};", property.trim_end(), value.trim_start()),
            None => format!("{};", decl),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn indent(block: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    block
        .lines()
        .map(|line| {
            if line.is_empty() {
                line.to_string()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::{assemble, render_rule};
    use crate::registry::VariantWrap;
    use crate::resolver::{Origin, ResolvedRule};

    fn rule(class: &str, declarations: &str, rank: u32, origin: Origin) -> ResolvedRule {
        ResolvedRule {
            class: class.to_string(),
            selector: format!(".{}", class.replace(':', "\\:")),
            declarations: declarations.to_string(),
            layers: Vec::new(),
            rank,
            origin,
        }
    }

    #[test]
    fn renders_flat_rule() {
        let css = render_rule(&rule(
            "p-4",
            "padding:calc(var(--spacing) * 4)",
            0,
            Origin::Scanned,
        ));
        assert_eq!(css, ".p-4 {\n  padding: calc(var(--spacing) * 4);\n}");
    }

    #[test]
    fn renders_nested_variant_layers_in_written_order() {
        let mut hover_dark = rule("hover:dark:p-4", "padding:0", 0, Origin::Scanned);
        hover_dark.layers = vec![
            VariantWrap::Selector(":hover".to_string()),
            VariantWrap::Media("@media (prefers-color-scheme: dark)".to_string()),
        ];
        let css = render_rule(&hover_dark);
        assert_eq!(
            css,
            ".hover\\:dark\\:p-4 {\n  &:hover {\n    @media (prefers-color-scheme: dark) {\n      padding: 0;\n    }\n  }\n}"
        );

        let mut dark_hover = rule("dark:hover:p-4", "padding:0", 0, Origin::Scanned);
        dark_hover.layers = vec![
            VariantWrap::Media("@media (prefers-color-scheme: dark)".to_string()),
            VariantWrap::Selector(":hover".to_string()),
        ];
        let nested = render_rule(&dark_hover);
        assert_ne!(css.replace("hover\\:dark", "dark\\:hover"), nested);
        assert!(nested.contains("@media (prefers-color-scheme: dark) {\n    &:hover {"));
    }

    #[test]
    fn sorts_by_rank_then_first_seen_then_class() {
        let css = assemble(
            vec![
                rule("m-2", "margin:1", 5, Origin::Scanned),
                rule("p-4", "padding:1", 1, Origin::Scanned),
                rule("b-b", "b:1", 3, Origin::Scanned),
                rule("a-a", "a:1", 3, Origin::Scanned),
            ],
            None,
        );
        let p4 = css.find(".p-4").expect("p-4 present");
        let bb = css.find(".b-b").expect("b-b present");
        let aa = css.find(".a-a").expect("a-a present");
        let m2 = css.find(".m-2").expect("m-2 present");
        // Equal ranks keep first-seen order, not lexicographic.
        assert!(p4 < bb && bb < aa && aa < m2);
    }

    #[test]
    fn duplicate_selector_keeps_highest_origin() {
        let css = assemble(
            vec![
                rule("h-8", "height:calc(var(--spacing) * 8)", 2, Origin::Scanned),
                rule("h-8", "height:calc(var(--spacing) * 8)", 2, Origin::Safelisted),
            ],
            None,
        );
        assert_eq!(css.matches(".h-8").count(), 1);
    }

    #[test]
    fn output_is_byte_identical_for_identical_input() {
        let input = || {
            vec![
                rule("p-4", "padding:1", 1, Origin::Scanned),
                rule("m-2", "margin:1", 2, Origin::Scanned),
            ]
        };
        assert_eq!(assemble(input(), None), assemble(input(), None));
    }

    #[test]
    fn base_css_passes_through_unmodified_and_first() {
        let css = assemble(
            vec![rule("p-4", "padding:1", 1, Origin::Scanned)],
            Some(":root {\n  --spacing: 0.25rem;\n}"),
        );
        assert!(css.starts_with(":root {\n  --spacing: 0.25rem;\n}\n"));
        assert!(css.contains(".p-4"));
    }
}
