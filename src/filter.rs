//! Safelist / blocklist policy.
//!
//! Applied after scan-driven resolution. Safelist entries are resolved
//! exactly as if they had been scanned, with the `Safelisted` origin, so
//! they reach the output even when no content file mentions them.
//! Blocklist entries remove matching rules regardless of origin; the
//! blocklist always wins.
//!
//! Entries share the registry's matcher semantics: an exact literal, or a
//! prefix with a trailing `*`. An entry that parses as neither is a fatal
//! configuration error and aborts the run before scanning.

use crate::diagnostics::Diagnostic;
use crate::error::EngineError;
use crate::resolver::{Origin, Resolution, ResolvedRule, Resolver};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyPattern {
    Exact(String),
    /// `bg-stone-*`: matches any class with the given prefix.
    Prefix(String),
}

impl PolicyPattern {
    pub fn parse(entry: &str) -> Result<Self, EngineError> {
        if entry.is_empty() {
            return Err(EngineError::PolicyEntry {
                entry: entry.to_string(),
                reason: "entry is empty".to_string(),
            });
        }
        if let Some(prefix) = entry.strip_suffix('*') {
            if prefix.is_empty() || prefix.contains('*') {
                return Err(EngineError::PolicyEntry {
                    entry: entry.to_string(),
                    reason: "wildcard is only supported as a trailing `*`".to_string(),
                });
            }
            return Ok(Self::Prefix(prefix.to_string()));
        }
        if entry.contains('*') {
            return Err(EngineError::PolicyEntry {
                entry: entry.to_string(),
                reason: "wildcard is only supported as a trailing `*`".to_string(),
            });
        }
        Ok(Self::Exact(entry.to_string()))
    }

    pub fn matches(&self, class: &str) -> bool {
        match self {
            Self::Exact(literal) => literal == class,
            Self::Prefix(prefix) => class.starts_with(prefix.as_str()),
        }
    }
}

/// Parse every entry up front so malformed policy aborts the run before
/// scanning starts.
pub fn parse_entries(entries: &[String]) -> Result<Vec<PolicyPattern>, EngineError> {
    entries.iter().map(|entry| PolicyPattern::parse(entry)).collect()
}

/// Force-include safelisted classes. Exact entries resolve like scanned
/// tokens; prefix entries upgrade the origin of already-resolved matches
/// (a prefix cannot conjure tokens that were never seen). Entries that
/// fail to resolve produce a warning diagnostic, not an error.
pub fn apply_safelist(
    patterns: &[PolicyPattern],
    entries: &[String],
    resolver: &Resolver<'_>,
    resolved: &mut Vec<ResolvedRule>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (pattern, entry) in patterns.iter().zip(entries) {
        match pattern {
            PolicyPattern::Exact(class) => match resolver.resolve(class, Origin::Safelisted) {
                Resolution::Rule(rule) => resolved.push(rule),
                Resolution::Miss(reason) => {
                    diagnostics.push(Diagnostic::warning(format!(
                        "safelist entry '{}' does not resolve: {}",
                        entry,
                        reason.notice(class)
                    )));
                }
            },
            PolicyPattern::Prefix(_) => {
                for rule in resolved.iter_mut() {
                    if pattern.matches(&rule.class) && rule.origin < Origin::Safelisted {
                        rule.origin = Origin::Safelisted;
                    }
                }
            }
        }
    }
}

/// Drop every rule matching a blocklist entry, whatever its origin.
pub fn apply_blocklist(patterns: &[PolicyPattern], resolved: &mut Vec<ResolvedRule>) {
    if patterns.is_empty() {
        return;
    }
    resolved.retain(|rule| !patterns.iter().any(|pattern| pattern.matches(&rule.class)));
}

#[cfg(test)]
mod tests {
    use super::{apply_blocklist, apply_safelist, parse_entries, PolicyPattern};
    use crate::error::EngineError;
    use crate::registry::RegistryBuilder;
    use crate::resolver::{Origin, Resolution, Resolver};
    use crate::theme::Theme;

    #[test]
    fn parses_literal_and_prefix_entries() {
        assert_eq!(
            PolicyPattern::parse("h-8").expect("literal"),
            PolicyPattern::Exact("h-8".to_string())
        );
        assert_eq!(
            PolicyPattern::parse("bg-stone-*").expect("prefix"),
            PolicyPattern::Prefix("bg-stone-".to_string())
        );
    }

    #[test]
    fn malformed_entries_are_fatal() {
        assert!(matches!(
            PolicyPattern::parse(""),
            Err(EngineError::PolicyEntry { .. })
        ));
        assert!(matches!(
            PolicyPattern::parse("*"),
            Err(EngineError::PolicyEntry { .. })
        ));
        assert!(matches!(
            PolicyPattern::parse("bg-*-500"),
            Err(EngineError::PolicyEntry { .. })
        ));
    }

    #[test]
    fn safelist_forces_unscanned_classes() {
        let theme = Theme::default();
        let registry = RegistryBuilder::with_core_rules(&theme).freeze();
        let resolver = Resolver::new(&registry, &theme);

        let entries = vec!["h-8".to_string()];
        let patterns = parse_entries(&entries).expect("entries parse");
        let mut resolved = Vec::new();
        let mut diagnostics = Vec::new();
        apply_safelist(
            &patterns,
            &entries,
            &resolver,
            &mut resolved,
            &mut diagnostics,
        );

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].class, "h-8");
        assert_eq!(resolved[0].origin, Origin::Safelisted);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn unresolvable_safelist_entry_warns() {
        let theme = Theme::default();
        let registry = RegistryBuilder::with_core_rules(&theme).freeze();
        let resolver = Resolver::new(&registry, &theme);

        let entries = vec!["definitely-not-a-utility".to_string()];
        let patterns = parse_entries(&entries).expect("entries parse");
        let mut resolved = Vec::new();
        let mut diagnostics = Vec::new();
        apply_safelist(
            &patterns,
            &entries,
            &resolver,
            &mut resolved,
            &mut diagnostics,
        );

        assert!(resolved.is_empty());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn prefix_safelist_upgrades_scanned_origin() {
        let theme = Theme::default();
        let registry = RegistryBuilder::with_core_rules(&theme).freeze();
        let resolver = Resolver::new(&registry, &theme);

        let Resolution::Rule(scanned) = resolver.resolve("bg-stone-300", Origin::Scanned) else {
            panic!("bg-stone-300 should resolve");
        };
        let mut resolved = vec![scanned];
        let entries = vec!["bg-stone-*".to_string()];
        let patterns = parse_entries(&entries).expect("entries parse");
        let mut diagnostics = Vec::new();
        apply_safelist(
            &patterns,
            &entries,
            &resolver,
            &mut resolved,
            &mut diagnostics,
        );

        assert_eq!(resolved[0].origin, Origin::Safelisted);
    }

    #[test]
    fn blocklist_wins_over_safelist() {
        let theme = Theme::default();
        let registry = RegistryBuilder::with_core_rules(&theme).freeze();
        let resolver = Resolver::new(&registry, &theme);

        let entries = vec!["h-8".to_string()];
        let patterns = parse_entries(&entries).expect("entries parse");
        let mut resolved = Vec::new();
        let mut diagnostics = Vec::new();
        apply_safelist(
            &patterns,
            &entries,
            &resolver,
            &mut resolved,
            &mut diagnostics,
        );

        let block = parse_entries(&["h-8".to_string()]).expect("entries parse");
        apply_blocklist(&block, &mut resolved);
        assert!(resolved.is_empty());
    }

    #[test]
    fn blocklist_prefix_removes_all_matches() {
        let theme = Theme::default();
        let registry = RegistryBuilder::with_core_rules(&theme).freeze();
        let resolver = Resolver::new(&registry, &theme);

        let mut resolved = Vec::new();
        for class in ["bg-stone-300", "bg-stone-400", "bg-gray-100"] {
            let Resolution::Rule(rule) = resolver.resolve(class, Origin::Scanned) else {
                panic!("{} should resolve", class);
            };
            resolved.push(rule);
        }

        let block = parse_entries(&["bg-stone-*".to_string()]).expect("entries parse");
        apply_blocklist(&block, &mut resolved);

        let classes: Vec<&str> = resolved.iter().map(|r| r.class.as_str()).collect();
        assert_eq!(classes, vec!["bg-gray-100"]);
    }
}
