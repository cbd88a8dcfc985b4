//! Glob patterns with a `**` super-asterisk, evaluated against a `FileSystem`.
//!
//! Supported syntax (separator is `/`):
//!
//! | Token | Matches |
//! |-------|---------|
//! | `*` | any run of characters except `/` |
//! | `**` | any run of characters, `/` included |
//! | `?` | one character except `/` |
//! | `[abc]`, `[a-z]` | one character from the class |
//! | `[!abc]`, `[^abc]` | one character outside the class (never `/`) |
//! | `{a,b}` | either alternative, nestable |
//! | `\x` | the literal character `x` |
//!
//! ```text
//! /var/log/**.log     -> every .log file below /var/log, at any depth
//! /var/log/*/*.log    -> .log files exactly one directory below /var/log
//! /var/log/apache.log -> only that file, if it exists
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::trace;

use crate::collector::traits::FileSystem;

/// Upper bound on recursion for `**` walks.
const MAX_RECURSIVE_DEPTH: usize = 128;

/// Characters that turn a path into a glob.
const META_CHARS: &[char] = &['*', '?', '[', '{', '\\'];

/// Error returned when a pattern cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternError {
    /// The offending pattern, as configured.
    pub pattern: String,
    /// Human-readable reason.
    pub reason: String,
}

impl PatternError {
    fn new(pattern: &str, reason: impl Into<String>) -> Self {
        Self {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid glob {:?}: {}", self.pattern, self.reason)
    }
}

impl std::error::Error for PatternError {}

/// A compiled pattern that can be evaluated against a filesystem.
pub trait PathMatcher {
    /// Returns the existing paths matching the pattern, in a deterministic
    /// order. Files and directories are both returned.
    fn match_paths(&self, fs: &dyn FileSystem) -> Vec<PathBuf>;
}

/// Compiles pattern strings into matchers.
///
/// The resolver only talks to this trait, so another glob dialect can be
/// plugged in without touching resolution logic.
pub trait GlobEngine {
    type Matcher: PathMatcher;

    fn compile(&self, pattern: &str) -> Result<Self::Matcher, PatternError>;
}

/// The default engine, producing [`GlobPath`] matchers.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobPathEngine;

impl GlobEngine for GlobPathEngine {
    type Matcher = GlobPath;

    fn compile(&self, pattern: &str) -> Result<GlobPath, PatternError> {
        GlobPath::compile(pattern)
    }
}

#[derive(Debug, Clone)]
enum Kind {
    /// No meta characters: the pattern names exactly one path.
    Literal(PathBuf),
    Glob {
        regex: Regex,
        /// Longest directory prefix without meta characters; the walk starts here.
        root: PathBuf,
        /// `None` when the pattern contains `**`.
        max_depth: Option<usize>,
    },
}

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct GlobPath {
    pattern: String,
    kind: Kind,
}

impl GlobPath {
    /// Compiles a pattern.
    ///
    /// Trailing separators are ignored, so `/data/*/` and `/data/*` are the
    /// same pattern.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::new(pattern, "empty pattern"));
        }

        let trimmed = match pattern.trim_end_matches('/') {
            "" => "/",
            t => t,
        };

        if !has_meta(trimmed) {
            return Ok(Self {
                pattern: pattern.to_string(),
                kind: Kind::Literal(PathBuf::from(trimmed)),
            });
        }

        let source = translate(trimmed).map_err(|reason| PatternError::new(pattern, reason))?;
        let regex = Regex::new(&source).map_err(|e| PatternError::new(pattern, e.to_string()))?;

        let first_meta = trimmed.find(META_CHARS).unwrap_or(trimmed.len());
        let (root, rest) = match trimmed[..first_meta].rfind('/') {
            Some(0) => (PathBuf::from("/"), &trimmed[1..]),
            Some(i) => (PathBuf::from(&trimmed[..i]), &trimmed[i + 1..]),
            None => (PathBuf::new(), trimmed),
        };
        let max_depth = if rest.contains("**") {
            None
        } else {
            Some(rest.matches('/').count() + 1)
        };

        Ok(Self {
            pattern: pattern.to_string(),
            kind: Kind::Glob {
                regex,
                root,
                max_depth,
            },
        })
    }

    /// The pattern as it was given to [`GlobPath::compile`].
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the pattern contains the `**` super-asterisk.
    pub fn has_super_meta(&self) -> bool {
        matches!(&self.kind, Kind::Glob { max_depth: None, .. })
    }

    /// Matches a path against the pattern without touching the filesystem.
    pub fn is_match(&self, path: &Path) -> bool {
        match &self.kind {
            Kind::Literal(literal) => literal == path,
            Kind::Glob { regex, .. } => regex.is_match(&path.to_string_lossy()),
        }
    }

    fn walk(
        &self,
        fs: &dyn FileSystem,
        dir: &Path,
        depth: usize,
        max_depth: usize,
        out: &mut Vec<PathBuf>,
    ) {
        let listing = if dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            dir
        };
        let mut entries = match fs.read_dir(listing) {
            Ok(entries) => entries,
            Err(e) => {
                trace!("glob {:?}: skipping {:?}: {}", self.pattern, listing, e);
                return;
            }
        };
        entries.sort();

        for entry in entries {
            let Some(name) = entry.file_name() else {
                continue;
            };
            let path = dir.join(name);
            if self.is_match(&path) {
                out.push(path.clone());
            }
            // Symlinked directories are matched but never entered.
            if depth < max_depth && fs.is_dir(&path) && !fs.is_symlink(&path) {
                self.walk(fs, &path, depth + 1, max_depth, out);
            }
        }
    }
}

impl PathMatcher for GlobPath {
    fn match_paths(&self, fs: &dyn FileSystem) -> Vec<PathBuf> {
        match &self.kind {
            Kind::Literal(path) => {
                if fs.exists(path) {
                    vec![path.clone()]
                } else {
                    Vec::new()
                }
            }
            Kind::Glob {
                root, max_depth, ..
            } => {
                let mut out = Vec::new();
                let max_depth = max_depth.unwrap_or(MAX_RECURSIVE_DEPTH);
                self.walk(fs, root, 1, max_depth, &mut out);
                out
            }
        }
    }
}

/// Whether `pattern` contains glob meta characters.
pub fn has_meta(pattern: &str) -> bool {
    pattern.contains(META_CHARS)
}

fn push_literal(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

/// Translates a glob into an anchored regular expression.
fn translate(pattern: &str) -> Result<String, String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("^");
    let mut open_braces = 0usize;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    out.push_str(".*");
                    while chars.get(i + 1) == Some(&'*') {
                        i += 1;
                    }
                } else {
                    out.push_str("[^/]*");
                }
            }
            '?' => out.push_str("[^/]"),
            '[' => {
                let (class, end) = translate_class(&chars, i)?;
                out.push_str(&class);
                i = end;
            }
            '{' => {
                open_braces += 1;
                out.push_str("(?:");
            }
            ',' if open_braces > 0 => out.push('|'),
            '}' if open_braces > 0 => {
                open_braces -= 1;
                out.push(')');
            }
            '\\' => match chars.get(i + 1) {
                Some(&next) => {
                    push_literal(&mut out, next);
                    i += 1;
                }
                None => return Err("trailing escape character".to_string()),
            },
            c => push_literal(&mut out, c),
        }
        i += 1;
    }

    if open_braces > 0 {
        return Err("unclosed '{'".to_string());
    }
    out.push('$');
    Ok(out)
}

/// Translates the class starting at `chars[start] == '['`.
///
/// Returns the regex class and the index of the closing `]`.
fn translate_class(chars: &[char], start: usize) -> Result<(String, usize), String> {
    let mut out = String::from("[");
    let mut i = start + 1;
    let negated = matches!(chars.get(i), Some('!') | Some('^'));
    if negated {
        out.push('^');
        i += 1;
    }
    let body_start = i;

    loop {
        match chars.get(i) {
            None => return Err("unclosed '['".to_string()),
            // A ']' opening the class is a member, not the end.
            Some(']') if i > body_start => break,
            Some('-') if i > body_start && chars.get(i + 1).is_some_and(|c| *c != ']') => {
                out.push('-');
            }
            Some('\\') => match chars.get(i + 1) {
                Some(&next) => {
                    push_literal(&mut out, next);
                    i += 1;
                }
                None => return Err("unclosed '['".to_string()),
            },
            Some(&c) => push_literal(&mut out, c),
        }
        i += 1;
    }

    if negated {
        out.push('/');
    }
    out.push(']');
    Ok((out, i))
}
