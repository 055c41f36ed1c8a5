//! Natural Sort Module
//!
//! Orders file and directory names the way a reader expects:
//! - digit runs compare by numeric value ("Chapter 9" < "Chapter 10")
//! - case is ignored
//! - "volume" / "vol." / "vol" and "chapter" / "ch." / "ch" markers collapse
//!   to fixed tokens, volumes ahead of chapters
//! - separator punctuation and whitespace runs collapse to a single space
//!
//! The key is computed on demand and never stored.

use regex::{Captures, Regex};
use std::cmp::Ordering;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::OnceLock;

// Control characters sort ahead of every printable character, so marker
// tokens come before ordinary text at the same position.
const VOLUME_MARK: char = '\u{1}';
const CHAPTER_MARK: char = '\u{2}';

fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(volume|vol|chapter|ch)(\.|[0-9]|\b)").expect("Invalid marker pattern")
    })
}

fn separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[-_:,'\x{02BC}\x{02B9}\x{02BD}\x{02BE}\x{02BF}|\[\]()#\s]+")
            .expect("Invalid separator pattern")
    })
}

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*([0-9]+(?:\.[0-9]+)?)\s*").expect("Invalid number pattern"))
}

/// One run of a name: either case-folded text or a numeric value.
#[derive(Debug, Clone)]
enum Token {
    Text(String),
    Number(f64),
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Token::Number(a), Token::Number(b)) => a.total_cmp(b),
            (Token::Text(a), Token::Text(b)) => a.cmp(b),
            // Tokens alternate text/number from a text start, so mixed pairs
            // only show up in hand-built keys. Still keep the order total.
            (Token::Number(_), Token::Text(_)) => Ordering::Less,
            (Token::Text(_), Token::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Token {}

/// Natural sort key of a single name.
///
/// Names that normalize to nothing (empty, or separators only) get the empty
/// key, which sorts before every other key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey(Vec<Token>);

impl SortKey {
    pub fn new(name: &str) -> Self {
        let normalized = normalize(name);
        if normalized.is_empty() {
            return SortKey(Vec::new());
        }

        let mut tokens = Vec::new();
        let mut last = 0;
        for caps in number_regex().captures_iter(&normalized) {
            let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            tokens.push(Token::Text(normalized[last..whole.start()].to_string()));
            // [0-9]+ always parses; absurdly long runs saturate to infinity
            let value = digits.as_str().parse::<f64>().unwrap_or(f64::INFINITY);
            tokens.push(Token::Number(value));
            last = whole.end();
        }
        tokens.push(Token::Text(normalized[last..].to_string()));

        SortKey(tokens)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn normalize(name: &str) -> String {
    let lowered = name.to_lowercase();
    let marked = marker_regex().replace_all(&lowered, |caps: &Captures| {
        let mark = if caps[1].starts_with('v') {
            VOLUME_MARK
        } else {
            CHAPTER_MARK
        };
        // a digit glued to the marker ("vol2") is kept, the dot is dropped
        let tail = match caps.get(2).map(|m| m.as_str()) {
            Some(".") | None => "",
            Some(other) => other,
        };
        format!(" {} {}", mark, tail)
    });
    separator_regex()
        .replace_all(&marked, " ")
        .trim()
        .to_string()
}

pub fn natural_keys(name: &str) -> SortKey {
    SortKey::new(name)
}

/// Compare two names by natural order.
///
/// A strict weak ordering: distinct names may compare equal ("007" vs "7").
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    SortKey::new(a).cmp(&SortKey::new(b))
}

/// Natural order for raw file names with a byte-wise tie-break, so directory
/// listings come out the same on every run regardless of readdir order.
pub fn compare_file_names(a: &OsStr, b: &OsStr) -> Ordering {
    natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()).then_with(|| a.cmp(b))
}

/// Sort paths by the natural order of their final component.
pub fn sort_naturally(paths: &mut [PathBuf]) {
    paths.sort_by_cached_key(|p| {
        let name = p.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        (SortKey::new(&name.to_string_lossy()), name)
    });
}
