//! stylemill: a utility-class CSS generation engine.
//!
//! Scans content files for class-name tokens, resolves each token against
//! a registry of utility rules (core rules plus plugin contributions),
//! applies safelist/blocklist policy, and emits a minimal, deduplicated,
//! deterministically ordered stylesheet.
//!
//! The pipeline is two-phase: plugins populate the mutable registry
//! builder, the registry freezes, and only then does scanning and
//! resolution begin. Resolution is pure over the frozen registry, so the
//! per-file and per-token work fans out across a worker pool without
//! locking. The same content snapshot and configuration always produce a
//! byte-identical stylesheet.

pub mod assembler;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod plugins;
pub mod registry;
pub mod resolver;
pub mod scanner;
pub mod theme;

use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

pub use config::{Config, ContentSource, SourceKind};
pub use diagnostics::{Diagnostic, Severity};
pub use error::{EngineError, PluginError};
pub use plugins::Plugin;
pub use registry::{Matcher, Registration, RegistryBuilder, RuleRegistry, ValueKind, VariantWrap};
pub use resolver::{Origin, Resolution, ResolvedRule, Resolver};
pub use scanner::{ScanOptions, Scanner, Token};
pub use theme::{Theme, ThemeOverrides};

/// Cooperative cancellation flag, checked at file granularity. Cloning
/// shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The terminal artifact of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    pub stylesheet: String,
    /// Recoverable issues, in collection order: file warnings first, then
    /// token notices, then policy warnings.
    pub diagnostics: Vec<Diagnostic>,
    pub files_scanned: usize,
}

/// Run the whole pipeline with the built-in plugin catalog only.
pub fn build(config: &Config) -> Result<BuildOutput, EngineError> {
    build_with(config, &[], &CancelToken::new())
}

/// Run the whole pipeline. `extra_plugins` load after the catalog plugins
/// named in the configuration, in slice order.
pub fn build_with(
    config: &Config,
    extra_plugins: &[Plugin],
    cancel: &CancelToken,
) -> Result<BuildOutput, EngineError> {
    // Phase 1: theme and registry. Plugins load in declared order, then
    // the registry freezes; nothing mutates it afterwards.
    let mut theme = Theme::default();
    theme.apply_overrides(&config.theme);
    let mut builder = RegistryBuilder::with_core_rules(&theme);
    plugins::load_all(&config.plugins, extra_plugins, &mut builder, &theme)?;
    let registry = builder.freeze();

    // All remaining configuration errors surface before any file is read.
    let safelist = filter::parse_entries(&config.safelist)?;
    let blocklist = filter::parse_entries(&config.blocklist)?;
    let mut options = ScanOptions::default();
    if let Some(base) = &config.base_path {
        options.base_path = base.clone();
    }
    let scanner = Scanner::new(&config.content, &config.delimiters, options)?;

    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    // Phase 2: scan.
    let scan = scanner.scan_all(cancel)?;
    let mut diagnostics = scan.diagnostics;
    debug!(
        "scanned {} files, {} candidate tokens",
        scan.files_scanned,
        scan.tokens.len()
    );

    // Phase 3: resolve. Unique token texts in first-seen order; one
    // resolution (and at most one notice, attributed to the first
    // occurrence) per unique token.
    let resolver = Resolver::new(&registry, &theme);
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for token in &scan.tokens {
        if seen.insert(token.text.as_str()) {
            unique.push(token);
        }
    }
    let resolutions: Vec<Resolution> = unique
        .par_iter()
        .map(|token| resolver.resolve(&token.text, Origin::Scanned))
        .collect();

    let mut resolved = Vec::new();
    for (token, resolution) in unique.iter().zip(resolutions) {
        match resolution {
            Resolution::Rule(rule) => resolved.push(rule),
            Resolution::Miss(reason) => {
                diagnostics.push(Diagnostic::token_notice_in(
                    &token.file,
                    &token.text,
                    reason.notice(&token.text),
                ));
            }
        }
    }

    // Policy: plugin-forced classes, then safelist, then blocklist last
    // so it wins over everything.
    for class in registry.forced_classes() {
        match resolver.resolve(class, Origin::PluginForced) {
            Resolution::Rule(rule) => resolved.push(rule),
            Resolution::Miss(reason) => diagnostics.push(Diagnostic::warning(format!(
                "plugin-forced class '{}' does not resolve: {}",
                class,
                reason.notice(class)
            ))),
        }
    }
    filter::apply_safelist(
        &safelist,
        &config.safelist,
        &resolver,
        &mut resolved,
        &mut diagnostics,
    );
    filter::apply_blocklist(&blocklist, &mut resolved);

    // Phase 4: assemble once, from the fully-materialized set.
    let stylesheet = assembler::assemble(resolved, config.base_css.as_deref());
    Ok(BuildOutput {
        stylesheet,
        diagnostics,
        files_scanned: scan.files_scanned,
    })
}
