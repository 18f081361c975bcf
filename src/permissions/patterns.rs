//! Dangerous shell command patterns.
//!
//! The table is ordered; the first matching entry names the reason shown to
//! the user. Patterns are compiled once on first access.
//!
//! # Examples
//!
//! ```
//! use toolbench::permissions::patterns::find_dangerous;
//!
//! assert_eq!(find_dangerous("rm -rf /").unwrap().description, "Recursive delete");
//! assert!(find_dangerous("ls -la").is_none());
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

/// One entry of the dangerous-command table.
#[derive(Debug)]
pub struct DangerousPattern {
    regex: Regex,
    unless: Option<Regex>,
    /// Human-readable reason shown in the warning.
    pub description: &'static str,
}

impl DangerousPattern {
    fn new(pattern: &str, unless: Option<&str>, description: &'static str) -> Self {
        Self {
            regex: Regex::new(pattern).expect("invalid regex: dangerous pattern"),
            unless: unless.map(|u| Regex::new(u).expect("invalid regex: guard pattern")),
            description,
        }
    }

    /// Returns `true` if the command matches this pattern and is not excused
    /// by its guard (e.g. a `DELETE` that has a `WHERE` clause).
    #[must_use]
    pub fn matches(&self, command: &str) -> bool {
        self.regex.is_match(command) && !self.unless.as_ref().is_some_and(|u| u.is_match(command))
    }

    /// The underlying regex source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// The ordered dangerous-command table.
pub static DANGEROUS_PATTERNS: Lazy<Vec<DangerousPattern>> = Lazy::new(|| {
    vec![
        // Destructive file operations
        DangerousPattern::new(
            r"\brm\s+(-[a-zA-Z]*[rR][a-zA-Z]*|--recursive)\b",
            None,
            "Recursive delete",
        ),
        DangerousPattern::new(
            r"\brm\s+(-[a-zA-Z]*f[a-zA-Z]*|--force)\b",
            None,
            "Forced delete",
        ),
        DangerousPattern::new(r"\brm\s+[^;&|]*\*", None, "Wildcard delete"),
        DangerousPattern::new(r"\brm\s+--no-preserve-root", None, "Delete of filesystem root"),
        // Database destruction
        DangerousPattern::new(
            r"(?i)\bdrop\s+(table|database|schema|collection)\b",
            None,
            "Database DROP",
        ),
        DangerousPattern::new(r"(?i)\btruncate\s+table\b", None, "Database TRUNCATE"),
        DangerousPattern::new(
            r"(?i)\bdelete\s+from\s+\S+",
            Some(r"(?i)\bwhere\b"),
            "Database DELETE without WHERE",
        ),
        // Git history rewriting
        DangerousPattern::new(
            r"\bgit\s+push\b[^;&|]*(\s-f\b|\s--force\b|\s\+\S)",
            None,
            "Forced git push",
        ),
        DangerousPattern::new(r"\bgit\s+reset\b[^;&|]*--hard\b", None, "Hard git reset"),
        // Privilege escalation
        DangerousPattern::new(r"\bsudo\b", None, "Privilege escalation (sudo)"),
        DangerousPattern::new(r"\bsu(\s+-|\s+root\b|\s*$)", None, "Privilege escalation (su)"),
        DangerousPattern::new(r"\b(doas|pkexec)\b", None, "Privilege escalation"),
        // World-writable permissions
        DangerousPattern::new(
            r"\bchmod\s+(-\S+\s+)*0?777\b",
            None,
            "World-writable chmod",
        ),
        DangerousPattern::new(
            r"\bchmod\s+(-\S+\s+)*[ug]*[oa][ugoa]*\+[rxst]*w",
            None,
            "World-writable chmod",
        ),
    ]
});

/// Returns the first dangerous pattern matching `command` or its normalized
/// form (see [`normalize_command`]).
#[must_use]
pub fn find_dangerous(command: &str) -> Option<&'static DangerousPattern> {
    let normalized = normalize_command(command);
    DANGEROUS_PATTERNS
        .iter()
        .find(|p| p.matches(command) || p.matches(&normalized))
}

/// Removes shell escapes that hide command names from pattern matching.
///
/// `r\m -rf /` runs as `rm -rf /` in a shell; the backslash before a letter
/// is dropped so the pattern table sees the effective command. Escapes that
/// change meaning (`\n`, `\t`, ...) are kept.
#[must_use]
pub fn normalize_command(cmd: &str) -> String {
    let mut result = String::with_capacity(cmd.len());
    let mut chars = cmd.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some(next @ ('n' | 't' | 'r' | '0' | 'x')) => {
                result.push(c);
                result.push(next);
                chars.next();
            }
            Some(next) if next.is_ascii_alphabetic() => {
                result.push(next);
                chars.next();
            }
            Some(next) => {
                result.push(c);
                result.push(next);
                chars.next();
            }
            None => result.push(c),
        }
    }

    result
}
