//! Title and author normalization.
//!
//! Normalization folds the many ways the same book gets named (case,
//! accents, punctuation, edition markers, copy counters) into one grouping
//! key. All functions here are pure.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use shelfsweep_core::{BookFormat, FileRecord};

/// Author placeholder used in keys when no author is known.
pub const UNKNOWN_AUTHOR: &str = "unknown";

struct Patterns {
    brackets: Regex,
    punctuation: Regex,
    whitespace: Regex,
    article: Regex,
    edition: Regex,
    noise: Regex,
    copy_counter: Regex,
    trailing_year: Regex,
    author_suffix: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |pattern: &str| Regex::new(pattern).expect("valid regex");
        Patterns {
            brackets: re(r"\[[^\]]*\]|\{[^}]*\}"),
            punctuation: re(r"[^\p{L}\p{N}\s]+"),
            whitespace: re(r"\s+"),
            article: re(r"^(?:the|a|an)\s+"),
            edition: re(
                r"\b(?:(?:special|deluxe|collectors|anniversary|revised|expanded|illustrated|annotated|definitive|complete|kindle|international|first|second|third|\d+(?:st|nd|rd|th))\s+)*edition\b",
            ),
            noise: re(r"\b(?:unabridged|abridged|retail)\b"),
            copy_counter: re(r"[\[(]\s*\d{1,2}\s*[\])]"),
            trailing_year: re(r"\s+\d{4}$"),
            author_suffix: re(r"\s+(?:jr|sr|ii|iii|iv)$"),
        }
    })
}

/// Unicode compatibility fold, accents stripped, lower-cased.
pub fn fold(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

fn squash(s: &str) -> String {
    patterns().whitespace.replace_all(s, " ").trim().to_string()
}

fn strip_book_extension(s: &str) -> &str {
    match s.rsplit_once('.') {
        Some((stem, ext)) if BookFormat::from_extension(ext).is_some() => stem,
        _ => s,
    }
}

/// Normalize a title. May return an empty string when the title is all noise.
pub fn normalize_title(title: &str) -> String {
    let p = patterns();

    let folded = fold(title).replace(['\'', '\u{2019}'], "");
    let s = strip_book_extension(&folded);
    let s = p.copy_counter.replace_all(s, " ");
    let s = p.brackets.replace_all(&s, " ");
    let s = squash(&p.punctuation.replace_all(&s, " "));
    let s = p.article.replace(&s, "").into_owned();
    let s = squash(&p.edition.replace_all(&s, " "));
    let s = squash(&p.noise.replace_all(&s, " "));
    // Volume numbers stay: "Foundation 2" and "Foundation 3" are different books.
    let s = p.trailing_year.replace(&s, "").into_owned();

    squash(&s)
}

/// Normalize an author name. Empty input stays empty.
pub fn normalize_author(author: &str) -> String {
    let p = patterns();

    let folded = fold(author).replace(['\'', '\u{2019}'], "");
    let s = squash(&p.punctuation.replace_all(&folded, " "));
    let s = p.author_suffix.replace(&s, "").into_owned();

    squash(&s)
}

/// Normalize a bare file name into a title key.
///
/// Falls back to the lower-cased stem when nothing survives normalization,
/// so that files with all-noise names never collapse onto one empty key.
pub fn normalize(file_name: &str) -> String {
    let title = normalize_title(file_name);
    if title.is_empty() {
        fold(strip_book_extension(file_name)).trim().to_string()
    } else {
        title
    }
}

/// Grouping key built from a normalized author and title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NormalizedKey {
    author: String,
    title: String,
}

impl NormalizedKey {
    /// Build a key from raw strings; `stem` is the fallback title.
    pub fn new(title: &str, author: &str, stem: &str) -> Self {
        let mut normalized_title = normalize_title(title);
        if normalized_title.is_empty() {
            normalized_title = fold(stem).trim().to_string();
        }

        let mut normalized_author = normalize_author(author);
        if normalized_author.is_empty() {
            normalized_author = UNKNOWN_AUTHOR.to_string();
        }

        Self {
            author: normalized_author,
            title: normalized_title,
        }
    }

    /// Key for a scanned record.
    pub fn for_record(record: &FileRecord) -> Self {
        Self::new(&record.title, &record.author, record.stem())
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}||{}", self.author, self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punctuation_and_edition_variants_agree() {
        assert_eq!(
            normalize("The Book: Special Edition (2020).epub"),
            normalize("the-book-special-edition-2020.epub")
        );
        assert_eq!(normalize("the-book-special-edition-2020.epub"), "book");
    }

    #[test]
    fn test_copy_counter_is_dropped() {
        assert_eq!(normalize("book (1).pdf"), normalize("book.pdf"));
        assert_eq!(normalize("Dune [2].epub"), "dune");
    }

    #[test]
    fn test_accents_fold() {
        assert_eq!(normalize_title("Les Misérables"), "les miserables");
        assert_eq!(normalize_author("Émile Zola"), "emile zola");
    }

    #[test]
    fn test_bracketed_tags_removed() {
        assert_eq!(normalize_title("Dune [Retail] {calibre}"), "dune");
    }

    #[test]
    fn test_volume_numbers_keep_books_apart() {
        assert_eq!(normalize_title("The Way of Kings Book 1"), "way of kings book 1");
        assert_eq!(normalize_title("Mistborn (Book 2)"), "mistborn book 2");
        assert_ne!(normalize_title("Mistborn Book 1"), normalize_title("Mistborn Book 2"));
        assert_ne!(normalize_title("Foundation 2"), normalize_title("Foundation 3"));
    }

    #[test]
    fn test_publication_year_is_dropped() {
        assert_eq!(normalize_title("Dune (1965)"), "dune");
        assert_eq!(normalize_title("Dune 1965"), "dune");
    }

    #[test]
    fn test_numeric_title_survives() {
        assert_eq!(normalize_title("1984"), "1984");
    }

    #[test]
    fn test_apostrophes_do_not_split_words() {
        assert_eq!(
            normalize_title("Ender's Game: Collector's Edition"),
            normalize_title("Enders Game")
        );
    }

    #[test]
    fn test_author_suffix_and_punctuation() {
        assert_eq!(normalize_author("Martin Luther King, Jr."), "martin luther king");
        assert_eq!(normalize_author("J.R.R. Tolkien"), "j r r tolkien");
        assert_eq!(normalize_author(""), "");
    }

    #[test]
    fn test_empty_title_falls_back_to_stem() {
        let key = NormalizedKey::new("(Unabridged)", "", "(Unabridged) 7");
        assert_eq!(key.title(), "(unabridged) 7");
        assert_eq!(key.author(), UNKNOWN_AUTHOR);

        // Two all-noise names must not merge.
        let other = NormalizedKey::new("[retail]", "", "[retail]");
        assert_ne!(key, other);
    }

    #[test]
    fn test_key_display() {
        let key = NormalizedKey::new("Dune", "Frank Herbert", "Dune");
        assert_eq!(key.to_string(), "frank herbert||dune");
    }
}
