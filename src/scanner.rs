//! Content scanning.
//!
//! Streams candidate class-name tokens out of the configured content
//! files. The scan is a tolerant lexical pass: a token is a maximal run of
//! class-name-safe characters, bounded by whitespace, quotes, or the
//! configured delimiter set. No markup or template dialect is parsed, so
//! the same scan works across HTML, logic templates, and script files.
//!
//! Failure policy: an unreadable file produces a per-file warning and is
//! skipped; scanning never aborts the run on one bad file. Cancellation is
//! checked at file granularity.

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::{ContentSource, SourceKind};
use crate::diagnostics::Diagnostic;
use crate::error::EngineError;
use crate::CancelToken;

/// One candidate occurrence. Tokens identical within a file are reported
/// once (first occurrence); occurrences in different files are kept so
/// diagnostics stay attributable per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub file: PathBuf,
    /// Byte offset of the first occurrence within the file.
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub base_path: PathBuf,
    pub respect_gitignore: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            respect_gitignore: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
    pub files_scanned: usize,
}

/// Restartable scanner over a fixed set of content sources. `files()` and
/// `scan_file()` are side-effect free beyond reads, so a scan can be
/// repeated within a run without shared state.
#[derive(Debug)]
pub struct Scanner {
    globset: GlobSet,
    kinds: Vec<SourceKind>,
    boundaries: [HashSet<char>; 3],
    options: ScanOptions,
}

impl Scanner {
    pub fn new(
        sources: &[ContentSource],
        extra_delimiters: &[char],
        options: ScanOptions,
    ) -> Result<Self, EngineError> {
        let mut builder = GlobSetBuilder::new();
        let mut kinds = Vec::with_capacity(sources.len());
        for source in sources {
            let glob = Glob::new(&source.pattern).map_err(|err| EngineError::Pattern {
                pattern: source.pattern.clone(),
                reason: err.to_string(),
            })?;
            builder.add(glob);
            kinds.push(source.kind);
        }
        let globset = builder.build().map_err(|err| EngineError::Pattern {
            pattern: "<glob set>".to_string(),
            reason: err.to_string(),
        })?;

        let boundaries = [
            boundary_set(SourceKind::Markup, extra_delimiters),
            boundary_set(SourceKind::Template, extra_delimiters),
            boundary_set(SourceKind::Script, extra_delimiters),
        ];

        Ok(Self {
            globset,
            kinds,
            boundaries,
            options,
        })
    }

    /// Matching files in deterministic (sorted) order. Recomputed on each
    /// call; the walk itself holds no scanner state.
    pub fn files(&self) -> Vec<(PathBuf, SourceKind)> {
        let mut files = Vec::new();
        let mut seen = HashSet::new();

        let mut builder = WalkBuilder::new(&self.options.base_path);
        builder
            .hidden(false)
            .git_ignore(self.options.respect_gitignore)
            .git_global(self.options.respect_gitignore)
            .git_exclude(self.options.respect_gitignore);

        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(_) => continue,
            };
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(&self.options.base_path).unwrap_or(path);
            let matches = {
                let mut indices = self.globset.matches(relative);
                if indices.is_empty() {
                    indices = self.globset.matches(path);
                }
                indices
            };
            let Some(&first) = matches.first() else {
                continue;
            };
            if should_skip_file(path) {
                continue;
            }
            if seen.insert(path.to_path_buf()) {
                files.push((path.to_path_buf(), self.kinds[first]));
            }
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        files
    }

    /// Scan one file. An unreadable file (missing, permission, bad
    /// encoding) yields a warning diagnostic instead of an error.
    pub fn scan_file(&self, path: &Path, kind: SourceKind) -> Result<Vec<Token>, Diagnostic> {
        let text = fs::read_to_string(path).map_err(|err| {
            warn!("skipping unreadable file {}: {}", path.display(), err);
            Diagnostic::file_warning(path, format!("unreadable file: {}", err))
        })?;
        Ok(self.scan_text(&text, path, kind))
    }

    /// The lexical pass over one file's contents, with eager per-file
    /// deduplication.
    pub fn scan_text(&self, text: &str, path: &Path, kind: SourceKind) -> Vec<Token> {
        let boundaries = &self.boundaries[kind_index(kind)];
        let mut tokens = Vec::new();
        let mut seen = HashSet::new();
        for (offset, raw) in split_candidates(text, boundaries) {
            let Some(candidate) = normalize_candidate(raw) else {
                continue;
            };
            if seen.insert(candidate.to_string()) {
                tokens.push(Token {
                    text: candidate.to_string(),
                    file: path.to_path_buf(),
                    offset,
                });
            }
        }
        tokens
    }

    /// Scan every matching file, fanning out across a worker pool. Tokens
    /// are returned in (file, offset) order regardless of scheduling.
    pub fn scan_all(&self, cancel: &CancelToken) -> Result<ScanOutcome, EngineError> {
        let files = self.files();

        let per_file: Vec<Option<Result<Vec<Token>, Diagnostic>>> = files
            .par_iter()
            .map(|(path, kind)| {
                if cancel.is_cancelled() {
                    return None;
                }
                Some(self.scan_file(path, *kind))
            })
            .collect();

        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let mut outcome = ScanOutcome::default();
        for result in per_file.into_iter().flatten() {
            match result {
                Ok(tokens) => {
                    outcome.files_scanned += 1;
                    outcome.tokens.extend(tokens);
                }
                Err(diagnostic) => outcome.diagnostics.push(diagnostic),
            }
        }
        Ok(outcome)
    }
}

fn kind_index(kind: SourceKind) -> usize {
    match kind {
        SourceKind::Markup => 0,
        SourceKind::Template => 1,
        SourceKind::Script => 2,
    }
}

/// Boundary characters for a source kind: whitespace and quotes always
/// split; each kind adds the delimiters of its syntax; configuration may
/// extend the set further.
fn boundary_set(kind: SourceKind, extra: &[char]) -> HashSet<char> {
    let mut set: HashSet<char> = ['"', '\'', '`', '<', '>', '='].into_iter().collect();
    match kind {
        SourceKind::Markup => {}
        SourceKind::Template => {
            set.extend(['{', '}', '%']);
        }
        SourceKind::Script => {
            set.extend(['{', '}', '(', ')', ';', ',', '+']);
        }
    }
    set.extend(extra.iter().copied());
    set
}

fn is_boundary(ch: char, boundaries: &HashSet<char>) -> bool {
    ch.is_whitespace() || boundaries.contains(&ch)
}

/// Maximal runs of non-boundary characters, with their byte offsets.
fn split_candidates<'t>(text: &'t str, boundaries: &HashSet<char>) -> Vec<(usize, &'t str)> {
    let mut out = Vec::new();
    let mut start = None;
    for (idx, ch) in text.char_indices() {
        if is_boundary(ch, boundaries) {
            if let Some(begin) = start.take() {
                out.push((begin, &text[begin..idx]));
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(begin) = start {
        out.push((begin, &text[begin..]));
    }
    out
}

/// Trim trailing sentence punctuation and validate the candidate shape.
/// Returns `None` for runs that cannot be class names at all; precise
/// matching is the resolver's job.
fn normalize_candidate(raw: &str) -> Option<&str> {
    let trimmed = raw.trim_end_matches(['.', ',', ';', ':', '?']);
    if trimmed.len() < 2 || trimmed.len() > 128 {
        return None;
    }
    let first = trimmed.chars().next()?;
    if !first.is_ascii_lowercase() {
        return None;
    }
    if !trimmed.chars().all(is_class_safe_char) {
        return None;
    }
    if trimmed.ends_with('-') {
        return None;
    }
    Some(trimmed)
}

fn is_class_safe_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(
            ch,
            '-' | '_' | ':' | '.' | '/' | '[' | ']' | '(' | ')' | '#' | '%'
        )
}

fn should_skip_file(path: &Path) -> bool {
    if path
        .components()
        .any(|component| component.as_os_str() == "node_modules")
    {
        return true;
    }

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("");
    if is_lock_file(file_name) {
        return true;
    }

    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase());
    if let Some(ext) = ext.as_deref() {
        if is_stylesheet_extension(ext) || is_binary_extension(ext) {
            return true;
        }
    }

    false
}

fn is_stylesheet_extension(ext: &str) -> bool {
    matches!(ext, "css" | "scss" | "sass" | "less")
}

fn is_binary_extension(ext: &str) -> bool {
    matches!(
        ext,
        "png" | "jpg"
            | "jpeg"
            | "gif"
            | "webp"
            | "ico"
            | "avif"
            | "mp4"
            | "webm"
            | "mp3"
            | "wav"
            | "zip"
            | "gz"
            | "pdf"
            | "woff"
            | "woff2"
            | "ttf"
            | "otf"
            | "eot"
    )
}

fn is_lock_file(file_name: &str) -> bool {
    matches!(
        file_name,
        "package-lock.json"
            | "pnpm-lock.yaml"
            | "yarn.lock"
            | "Cargo.lock"
            | "poetry.lock"
            | "Pipfile.lock"
            | "Gemfile.lock"
            | "composer.lock"
    )
}

#[cfg(test)]
mod tests {
    use super::{ScanOptions, Scanner};
    use crate::config::{ContentSource, SourceKind};
    use crate::CancelToken;
    use std::fs;
    use std::path::Path;

    fn scanner_for(dir: &Path, pattern: &str) -> Scanner {
        Scanner::new(
            &[ContentSource::new(pattern, SourceKind::Markup)],
            &[],
            ScanOptions {
                base_path: dir.to_path_buf(),
                respect_gitignore: false,
            },
        )
        .expect("globs should compile")
    }

    #[test]
    fn extracts_tokens_from_markup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scanner = scanner_for(dir.path(), "**/*.html");
        let tokens = scanner.scan_text(
            r#"<div class="p-4 hover:bg-stone-300">not-a-class</div>"#,
            Path::new("index.html"),
            SourceKind::Markup,
        );
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert!(texts.contains(&"p-4"));
        assert!(texts.contains(&"hover:bg-stone-300"));
        assert!(texts.contains(&"not-a-class"));
        assert!(!texts.iter().any(|t| t.contains('<') || t.contains('"')));
    }

    #[test]
    fn deduplicates_within_a_file_keeping_first_offset() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scanner = scanner_for(dir.path(), "**/*.html");
        let tokens = scanner.scan_text("p-4 m-2 p-4", Path::new("index.html"), SourceKind::Markup);
        let p4: Vec<_> = tokens.iter().filter(|t| t.text == "p-4").collect();
        assert_eq!(p4.len(), 1);
        assert_eq!(p4[0].offset, 0);
    }

    #[test]
    fn rejects_unshaped_candidates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scanner = scanner_for(dir.path(), "**/*.html");
        let tokens = scanner.scan_text(
            "X p- Trailing- CONSTANT 42 class.",
            Path::new("index.html"),
            SourceKind::Markup,
        );
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["class"]);
    }

    #[test]
    fn scans_matching_files_in_sorted_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("b.html"), r#"<p class="m-2">"#).expect("write");
        fs::write(dir.path().join("a.html"), r#"<p class="p-4">"#).expect("write");
        fs::write(dir.path().join("notes.txt"), "w-full").expect("write");

        let scanner = scanner_for(dir.path(), "*.html");
        let outcome = scanner.scan_all(&CancelToken::new()).expect("scan");

        assert_eq!(outcome.files_scanned, 2);
        let texts: Vec<&str> = outcome.tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["p-4", "m-2"]);
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn same_token_in_two_files_is_reported_per_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a.html"), "p-4").expect("write");
        fs::write(dir.path().join("b.html"), "p-4").expect("write");

        let scanner = scanner_for(dir.path(), "*.html");
        let outcome = scanner.scan_all(&CancelToken::new()).expect("scan");
        assert_eq!(outcome.tokens.len(), 2);
    }

    #[test]
    fn unreadable_file_warns_and_continues() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("good.html"), "p-4").expect("write");
        fs::write(dir.path().join("bad.html"), [0xff, 0xfe, 0x80]).expect("write");

        let scanner = scanner_for(dir.path(), "*.html");
        let outcome = scanner.scan_all(&CancelToken::new()).expect("scan");

        assert_eq!(outcome.files_scanned, 1);
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(outcome.diagnostics[0].message.contains("unreadable"));
        assert_eq!(outcome.tokens.len(), 1);
    }

    #[test]
    fn skips_binary_lock_and_stylesheet_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("app.html"), "p-4").expect("write");
        fs::write(dir.path().join("app.css"), ".p-8 {}").expect("write");
        fs::write(dir.path().join("logo.png"), [0x89, 0x50]).expect("write");
        fs::write(dir.path().join("yarn.lock"), "m-2").expect("write");

        let scanner = scanner_for(dir.path(), "*");
        let outcome = scanner.scan_all(&CancelToken::new()).expect("scan");
        assert_eq!(outcome.files_scanned, 1);
    }

    #[test]
    fn invalid_glob_is_fatal() {
        let err = Scanner::new(
            &[ContentSource::new("src/[", SourceKind::Markup)],
            &[],
            ScanOptions::default(),
        )
        .map(|_| ())
        .unwrap_err();
        assert!(matches!(err, crate::error::EngineError::Pattern { .. }));
    }

    #[test]
    fn cancellation_is_checked_between_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a.html"), "p-4").expect("write");

        let cancel = CancelToken::new();
        cancel.cancel();
        let scanner = scanner_for(dir.path(), "*.html");
        let err = scanner.scan_all(&cancel).unwrap_err();
        assert!(matches!(err, crate::error::EngineError::Cancelled));
    }
}
