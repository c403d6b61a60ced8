//! The utility rule registry.
//!
//! The registry is built in two phases: a mutable [`RegistryBuilder`]
//! accepts append-only registrations while plugins load, then
//! [`RegistryBuilder::freeze`] produces an immutable [`RuleRegistry`]
//! shared by every resolver call for the rest of the run. No rule is ever
//! removed or reordered after the freeze.
//!
//! Each rule carries a tagged matcher rather than free-form string logic:
//! an exact literal, a prefix with a free value slot, or a prefix with a
//! theme-table key. Ranks ascend in registration order, so rules
//! registered later (plugins) take priority over earlier ones (core) when
//! the same literal is claimed twice.

use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::theme::Theme;

/// How a rule claims tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// The whole base token equals the literal.
    Exact(String),
    /// `prefix-` followed by a free-form value slot.
    PrefixValue { prefix: String, kind: ValueKind },
    /// `prefix-` followed by a key of a theme table.
    PrefixEnum { prefix: String, table: ThemeTable },
}

impl Matcher {
    /// The parameter text when this matcher structurally matches `base`.
    /// Exact matchers carry no parameter.
    pub fn param_of<'t>(&self, base: &'t str) -> Option<&'t str> {
        let prefix = match self {
            Self::Exact(_) => return None,
            Self::PrefixValue { prefix, .. } | Self::PrefixEnum { prefix, .. } => prefix,
        };
        base.strip_prefix(prefix.as_str())
            .and_then(|rest| rest.strip_prefix('-'))
            .filter(|rest| !rest.is_empty())
    }

    pub fn matches(&self, base: &str) -> bool {
        match self {
            Self::Exact(literal) => literal == base,
            _ => self.param_of(base).is_some(),
        }
    }
}

/// Validation applied to a free value slot before substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Non-negative number multiplied onto the spacing scale, or `px`.
    Spacing,
    /// Any finite number, substituted verbatim.
    Number,
    /// Only bracketed arbitrary values are accepted.
    Arbitrary,
}

/// Which theme table a `PrefixEnum` parameter indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeTable {
    Colors,
    FontSizes,
}

/// A registered utility rule. The declaration template may contain one
/// `{value}` placeholder filled from the matched parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtilityRule {
    pub matcher: Matcher,
    pub template: String,
    /// Appended to the class selector inside the rule body, e.g.
    /// `" > :not(:last-child)"` for child-targeting utilities.
    pub selector_suffix: Option<String>,
    pub rank: u32,
}

/// How a variant prefix transforms a resolved rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantWrap {
    /// Appended to the class selector, e.g. `":hover"`.
    Selector(String),
    /// Wraps the declaration block in a conditional context, e.g.
    /// `"@media (width >= 48rem)"`.
    Media(String),
}

/// A rule as supplied by core or a plugin, before a rank is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    pub matcher: Matcher,
    pub template: String,
    pub selector_suffix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSpec {
    pub name: String,
    pub wrap: VariantWrap,
}

/// A named bundle of rules and variants contributed atomically by core or
/// one plugin. Consumed by [`RegistryBuilder::register`]; the contributor
/// has no identity afterward.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Registration {
    pub name: String,
    pub rules: Vec<RuleSpec>,
    pub variants: Vec<VariantSpec>,
    /// Class names the contributor forces into every run's output.
    pub force_classes: Vec<String>,
}

impl Registration {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

pub fn exact(token: &str, declarations: &str) -> RuleSpec {
    RuleSpec {
        matcher: Matcher::Exact(token.to_string()),
        template: declarations.to_string(),
        selector_suffix: None,
    }
}

pub fn value(prefix: &str, kind: ValueKind, template: &str) -> RuleSpec {
    RuleSpec {
        matcher: Matcher::PrefixValue {
            prefix: prefix.to_string(),
            kind,
        },
        template: template.to_string(),
        selector_suffix: None,
    }
}

pub fn themed(prefix: &str, table: ThemeTable, template: &str) -> RuleSpec {
    RuleSpec {
        matcher: Matcher::PrefixEnum {
            prefix: prefix.to_string(),
            table,
        },
        template: template.to_string(),
        selector_suffix: None,
    }
}

/// Mutable registry under construction. Registration is append-only and
/// only possible before the freeze.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    rules: Vec<UtilityRule>,
    variants: BTreeMap<String, VariantWrap>,
    forced: Vec<String>,
    next_rank: u32,
}

impl RegistryBuilder {
    /// A builder pre-populated with the core rule and variant set, at the
    /// lowest ranks. Plugins register on top of this.
    pub fn with_core_rules(theme: &Theme) -> Self {
        let mut builder = Self::default();
        builder.register(core_registration());
        builder.register_core_variants(theme);
        builder
    }

    pub fn register(&mut self, registration: Registration) {
        let count = registration.rules.len();
        for spec in registration.rules {
            let rank = self.next_rank;
            self.next_rank += 1;
            self.rules.push(UtilityRule {
                matcher: spec.matcher,
                template: spec.template,
                selector_suffix: spec.selector_suffix,
                rank,
            });
        }
        for variant in registration.variants {
            self.variants.insert(variant.name, variant.wrap);
        }
        self.forced.extend(registration.force_classes);
        debug!(
            "registered {} rules from '{}' (next rank {})",
            count, registration.name, self.next_rank
        );
    }

    fn register_core_variants(&mut self, theme: &Theme) {
        for (name, wrap) in core_variants(theme) {
            self.variants.insert(name, wrap);
        }
    }

    /// Freeze into the immutable view handed to all resolver calls.
    pub fn freeze(self) -> RuleRegistry {
        let mut exact_index = HashMap::new();
        let mut prefixed = Vec::new();
        for (idx, rule) in self.rules.iter().enumerate() {
            match &rule.matcher {
                // Later registrations overwrite: highest rank wins a
                // literal tie.
                Matcher::Exact(literal) => {
                    exact_index.insert(literal.clone(), idx);
                }
                _ => prefixed.push(idx),
            }
        }
        debug!(
            "registry frozen: {} rules, {} variants",
            self.rules.len(),
            self.variants.len()
        );
        RuleRegistry {
            rules: self.rules,
            exact: exact_index,
            prefixed,
            variants: self.variants,
            forced: self.forced,
        }
    }
}

/// Immutable, lookup-optimized registry. Safe to share across resolver
/// threads once constructed.
#[derive(Debug)]
pub struct RuleRegistry {
    rules: Vec<UtilityRule>,
    exact: HashMap<String, usize>,
    /// Indices of prefix rules in ascending rank order.
    prefixed: Vec<usize>,
    variants: BTreeMap<String, VariantWrap>,
    forced: Vec<String>,
}

impl RuleRegistry {
    /// Candidate rules for a base token, in precedence order: the exact
    /// literal (if any) first, then structurally matching prefix rules by
    /// descending rank. The resolver takes the first candidate whose
    /// parameter validates.
    pub fn candidates(&self, base: &str) -> Vec<&UtilityRule> {
        let mut out = Vec::new();
        if let Some(&idx) = self.exact.get(base) {
            out.push(&self.rules[idx]);
        }
        for &idx in self.prefixed.iter().rev() {
            let rule = &self.rules[idx];
            if rule.matcher.matches(base) {
                out.push(rule);
            }
        }
        out
    }

    pub fn variant(&self, name: &str) -> Option<&VariantWrap> {
        self.variants.get(name)
    }

    /// Class names plugins force into the output regardless of scanning.
    pub fn forced_classes(&self) -> &[String] {
        &self.forced
    }
}

fn core_variants(theme: &Theme) -> Vec<(String, VariantWrap)> {
    let mut variants = vec![
        ("hover", VariantWrap::Selector(":hover".to_string())),
        ("focus", VariantWrap::Selector(":focus".to_string())),
        (
            "focus-within",
            VariantWrap::Selector(":focus-within".to_string()),
        ),
        (
            "focus-visible",
            VariantWrap::Selector(":focus-visible".to_string()),
        ),
        ("active", VariantWrap::Selector(":active".to_string())),
        ("visited", VariantWrap::Selector(":visited".to_string())),
        ("disabled", VariantWrap::Selector(":disabled".to_string())),
        ("first", VariantWrap::Selector(":first-child".to_string())),
        ("last", VariantWrap::Selector(":last-child".to_string())),
        ("odd", VariantWrap::Selector(":nth-child(odd)".to_string())),
        (
            "even",
            VariantWrap::Selector(":nth-child(even)".to_string()),
        ),
        (
            "dark",
            VariantWrap::Media("@media (prefers-color-scheme: dark)".to_string()),
        ),
        ("print", VariantWrap::Media("@media print".to_string())),
    ]
    .into_iter()
    .map(|(name, wrap)| (name.to_string(), wrap))
    .collect::<Vec<_>>();

    for (name, width) in &theme.breakpoints {
        variants.push((
            name.clone(),
            VariantWrap::Media(format!("@media (width >= {})", width)),
        ));
    }
    variants
}

fn core_registration() -> Registration {
    let mut reg = Registration::named("core");
    reg.rules = core_rules();
    reg
}

#[rustfmt::skip]
fn core_rules() -> Vec<RuleSpec> {
    use ThemeTable::{Colors, FontSizes};
    use ValueKind::{Number, Spacing};

    let mut rules = vec![
        // Display
        exact("block", "display:block"),
        exact("inline-block", "display:inline-block"),
        exact("inline", "display:inline"),
        exact("flex", "display:flex"),
        exact("inline-flex", "display:inline-flex"),
        exact("grid", "display:grid"),
        exact("inline-grid", "display:inline-grid"),
        exact("contents", "display:contents"),
        exact("flow-root", "display:flow-root"),
        exact("table", "display:table"),
        exact("hidden", "display:none"),

        // Position
        exact("static", "position:static"),
        exact("fixed", "position:fixed"),
        exact("absolute", "position:absolute"),
        exact("relative", "position:relative"),
        exact("sticky", "position:sticky"),

        // Overflow
        exact("overflow-auto", "overflow:auto"),
        exact("overflow-hidden", "overflow:hidden"),
        exact("overflow-scroll", "overflow:scroll"),
        exact("overflow-visible", "overflow:visible"),

        // Flex & grid helpers
        exact("flex-row", "flex-direction:row"),
        exact("flex-row-reverse", "flex-direction:row-reverse"),
        exact("flex-col", "flex-direction:column"),
        exact("flex-col-reverse", "flex-direction:column-reverse"),
        exact("flex-wrap", "flex-wrap:wrap"),
        exact("flex-nowrap", "flex-wrap:nowrap"),
        exact("flex-1", "flex:1 1 0%"),
        exact("flex-auto", "flex:1 1 auto"),
        exact("flex-none", "flex:none"),
        exact("grow", "flex-grow:1"),
        exact("grow-0", "flex-grow:0"),
        exact("shrink", "flex-shrink:1"),
        exact("shrink-0", "flex-shrink:0"),
        exact("items-start", "align-items:flex-start"),
        exact("items-center", "align-items:center"),
        exact("items-end", "align-items:flex-end"),
        exact("items-baseline", "align-items:baseline"),
        exact("items-stretch", "align-items:stretch"),
        exact("justify-start", "justify-content:flex-start"),
        exact("justify-center", "justify-content:center"),
        exact("justify-end", "justify-content:flex-end"),
        exact("justify-between", "justify-content:space-between"),
        exact("justify-around", "justify-content:space-around"),
        exact("justify-evenly", "justify-content:space-evenly"),

        // Spacing
        value("p", Spacing, "padding:{value}"),
        value("px", Spacing, "padding-inline:{value}"),
        value("py", Spacing, "padding-block:{value}"),
        value("pt", Spacing, "padding-top:{value}"),
        value("pr", Spacing, "padding-right:{value}"),
        value("pb", Spacing, "padding-bottom:{value}"),
        value("pl", Spacing, "padding-left:{value}"),
        value("m", Spacing, "margin:{value}"),
        value("mx", Spacing, "margin-inline:{value}"),
        value("my", Spacing, "margin-block:{value}"),
        value("mt", Spacing, "margin-top:{value}"),
        value("mr", Spacing, "margin-right:{value}"),
        value("mb", Spacing, "margin-bottom:{value}"),
        value("ml", Spacing, "margin-left:{value}"),
        exact("mx-auto", "margin-inline:auto"),
        value("gap", Spacing, "gap:{value}"),
        value("gap-x", Spacing, "column-gap:{value}"),
        value("gap-y", Spacing, "row-gap:{value}"),
        value("inset", Spacing, "inset:{value}"),
        value("top", Spacing, "top:{value}"),
        value("right", Spacing, "right:{value}"),
        value("bottom", Spacing, "bottom:{value}"),
        value("left", Spacing, "left:{value}"),

        // Sizing
        value("w", Spacing, "width:{value}"),
        value("h", Spacing, "height:{value}"),
        exact("w-full", "width:100%"),
        exact("w-auto", "width:auto"),
        exact("w-screen", "width:100vw"),
        exact("h-full", "height:100%"),
        exact("h-auto", "height:auto"),
        exact("h-screen", "height:100vh"),
        exact("min-h-screen", "min-height:100vh"),
        value("max-w", Spacing, "max-width:{value}"),
        exact("max-w-full", "max-width:100%"),
        exact("max-w-none", "max-width:none"),

        // Z order
        value("z", Number, "z-index:{value}"),
        exact("z-auto", "z-index:auto"),

        // Typography
        exact("italic", "font-style:italic"),
        exact("not-italic", "font-style:normal"),
        exact("underline", "text-decoration-line:underline"),
        exact("line-through", "text-decoration-line:line-through"),
        exact("no-underline", "text-decoration-line:none"),
        exact("uppercase", "text-transform:uppercase"),
        exact("lowercase", "text-transform:lowercase"),
        exact("capitalize", "text-transform:capitalize"),
        exact("normal-case", "text-transform:none"),
        exact("truncate", "overflow:hidden;text-overflow:ellipsis;white-space:nowrap"),
        exact("text-left", "text-align:left"),
        exact("text-center", "text-align:center"),
        exact("text-right", "text-align:right"),
        exact("text-justify", "text-align:justify"),
        exact("font-thin", "font-weight:var(--font-weight-thin)"),
        exact("font-extralight", "font-weight:var(--font-weight-extralight)"),
        exact("font-light", "font-weight:var(--font-weight-light)"),
        exact("font-normal", "font-weight:var(--font-weight-normal)"),
        exact("font-medium", "font-weight:var(--font-weight-medium)"),
        exact("font-semibold", "font-weight:var(--font-weight-semibold)"),
        exact("font-bold", "font-weight:var(--font-weight-bold)"),
        exact("font-extrabold", "font-weight:var(--font-weight-extrabold)"),
        exact("font-black", "font-weight:var(--font-weight-black)"),
        exact("leading-none", "line-height:1"),
        exact("leading-tight", "line-height:var(--leading-tight)"),
        exact("leading-snug", "line-height:var(--leading-snug)"),
        exact("leading-normal", "line-height:var(--leading-normal)"),
        exact("leading-relaxed", "line-height:var(--leading-relaxed)"),
        exact("leading-loose", "line-height:var(--leading-loose)"),
        exact("tracking-tight", "letter-spacing:var(--tracking-tight)"),
        exact("tracking-normal", "letter-spacing:var(--tracking-normal)"),
        exact("tracking-wide", "letter-spacing:var(--tracking-wide)"),
        themed("text", FontSizes, "font-size:{value}"),

        // Colors
        themed("text", Colors, "color:{value}"),
        themed("bg", Colors, "background-color:{value}"),
        themed("border", Colors, "border-color:{value}"),
        themed("decoration", Colors, "text-decoration-color:{value}"),
        themed("accent", Colors, "accent-color:{value}"),
        themed("caret", Colors, "caret-color:{value}"),
        themed("fill", Colors, "fill:{value}"),
        themed("stroke", Colors, "stroke:{value}"),
        themed("ring", Colors, "--tw-ring-color:{value}"),

        // Borders
        exact("border", "border-width:1px"),
        exact("border-0", "border-width:0px"),
        exact("border-2", "border-width:2px"),
        exact("border-4", "border-width:4px"),
        exact("border-8", "border-width:8px"),
        exact("rounded-none", "border-radius:0"),
        exact("rounded-sm", "border-radius:var(--radius-sm)"),
        exact("rounded", "border-radius:var(--radius)"),
        exact("rounded-md", "border-radius:var(--radius-md)"),
        exact("rounded-lg", "border-radius:var(--radius-lg)"),
        exact("rounded-xl", "border-radius:var(--radius-xl)"),
        exact("rounded-2xl", "border-radius:var(--radius-2xl)"),
        exact("rounded-full", "border-radius:calc(infinity * 1px)"),

        // Effects
        exact("shadow-sm", "box-shadow:0 1px 2px 0 rgb(0 0 0 / 0.05)"),
        exact("shadow", "box-shadow:0 1px 3px 0 rgb(0 0 0 / 0.1),0 1px 2px -1px rgb(0 0 0 / 0.1)"),
        exact("shadow-md", "box-shadow:0 4px 6px -1px rgb(0 0 0 / 0.1),0 2px 4px -2px rgb(0 0 0 / 0.1)"),
        exact("shadow-lg", "box-shadow:0 10px 15px -3px rgb(0 0 0 / 0.1),0 4px 6px -4px rgb(0 0 0 / 0.1)"),
        exact("shadow-xl", "box-shadow:0 20px 25px -5px rgb(0 0 0 / 0.1),0 8px 10px -6px rgb(0 0 0 / 0.1)"),
        exact("shadow-2xl", "box-shadow:0 25px 50px -12px rgb(0 0 0 / 0.25)"),
        exact("shadow-none", "box-shadow:0 0 #0000"),
        exact("ring", "box-shadow:0 0 0 1px var(--tw-ring-color,currentcolor)"),
        exact("ring-0", "box-shadow:0 0 0 0px var(--tw-ring-color,currentcolor)"),
        exact("ring-1", "box-shadow:0 0 0 1px var(--tw-ring-color,currentcolor)"),
        exact("ring-2", "box-shadow:0 0 0 2px var(--tw-ring-color,currentcolor)"),
        exact("ring-4", "box-shadow:0 0 0 4px var(--tw-ring-color,currentcolor)"),

        // Interactivity
        exact("cursor-pointer", "cursor:pointer"),
        exact("cursor-default", "cursor:default"),
        exact("cursor-not-allowed", "cursor:not-allowed"),
        exact("select-none", "user-select:none"),
        exact("pointer-events-none", "pointer-events:none"),
    ];

    // Child-targeting utilities keep their declarations on a suffixed
    // selector rather than the class itself.
    let mut divide = themed("divide", Colors, "border-color:{value}");
    divide.selector_suffix = Some(" > :not(:last-child)".to_string());
    rules.push(divide);
    let mut space_x = value("space-x", Spacing, "margin-inline-start:{value}");
    space_x.selector_suffix = Some(" > :not(:first-child)".to_string());
    rules.push(space_x);
    let mut space_y = value("space-y", Spacing, "margin-block-start:{value}");
    space_y.selector_suffix = Some(" > :not(:first-child)".to_string());
    rules.push(space_y);

    rules
}
