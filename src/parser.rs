//! Chapter name parsing, natural sort keys and chapter ordering

use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

use crate::models::Chapter;

/// Ordering key extracted from a chapter directory name
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChapterInfo {
    /// Chapter number, fractional values allowed (1.5, 2.1)
    pub number: Option<f64>,
    /// Volume number, when the name carries one
    pub volume: Option<i64>,
}

/// Ordered pattern rules, first match wins. The bool marks two-capture
/// (volume + chapter) forms. The trailing catch-all picks up any bare number
/// and can mis-parse names embedding unrelated digits; it is kept because the
/// scan order depends on it.
static CHAPTER_PATTERNS: LazyLock<Vec<(Regex, bool)>> = LazyLock::new(|| {
    [
        (r"(?i)vol\.?\s*(\d+),?\s*ch\.?\s*(\d+\.?\d*)", true),
        (r"(?i)volume\s*(\d+)\s*chapter\s*(\d+\.?\d*)", true),
        (r"(?i)chapter\s*(\d+\.?\d*)", false),
        (r"(?i)cap[ií]tulo\s*(\d+\.?\d*)", false),
        (r"(?i)ch\.?\s*(\d+\.?\d*)", false),
        (r"^(\d+\.?\d*)(?:\s*[-_].*)?", false),
        (r"(\d+\.?\d*)(?:\s|$)", false),
    ]
    .iter()
    .map(|(pattern, has_volume)| (Regex::new(pattern).expect("invalid chapter pattern"), *has_volume))
    .collect()
});

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W+").expect("invalid slug pattern"));

/// Extract the ordering key from a chapter directory name.
///
/// Patterns are tried in priority order against the full name; a numeric
/// parse failure on a matched pattern counts as no match and the next
/// pattern is tried. No pattern matching leaves both fields `None`.
pub fn parse_chapter_name(chapter_name: &str) -> ChapterInfo {
    for (pattern, has_volume) in CHAPTER_PATTERNS.iter() {
        let Some(captures) = pattern.captures(chapter_name) else {
            continue;
        };

        if *has_volume {
            let volume = captures.get(1).and_then(|m| m.as_str().parse::<i64>().ok());
            let number = captures.get(2).and_then(|m| m.as_str().parse::<f64>().ok());
            if let (Some(volume), Some(number)) = (volume, number) {
                return ChapterInfo {
                    number: Some(number),
                    volume: Some(volume),
                };
            }
        } else if let Some(number) = captures.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) {
            return ChapterInfo {
                number: Some(number),
                volume: None,
            };
        }
    }

    ChapterInfo::default()
}

/// One segment of a natural sort key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortSegment {
    /// Maximal digit run, compared as an integer
    Number(u128),
    /// Text between digit runs, compared case-insensitively
    Text(String),
}

/// Split a string into alternating text/number segments so that embedded
/// digit runs compare numerically: `page1 < page2 < page10`.
pub fn natural_sort_key(text: &str) -> Vec<SortSegment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_digits = false;

    for ch in text.chars() {
        if ch.is_ascii_digit() != in_digits && !current.is_empty() {
            segments.push(make_segment(&current, in_digits));
            current.clear();
        }
        in_digits = ch.is_ascii_digit();
        current.push(ch);
    }
    if !current.is_empty() {
        segments.push(make_segment(&current, in_digits));
    }

    segments
}

fn make_segment(run: &str, is_digits: bool) -> SortSegment {
    if is_digits {
        // Digit runs longer than a u128 are clamped; they only need to sort
        // after every realistic page number
        SortSegment::Number(run.parse().unwrap_or(u128::MAX))
    } else {
        SortSegment::Text(run.to_lowercase())
    }
}

/// Order chapters newest-first: numbered chapters before unnumbered ones,
/// numbered descending by number, unnumbered ascending by name.
pub fn sort_chapters(chapters: &mut [Chapter]) {
    chapters.sort_by(|a, b| match (a.number, b.number) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    });
}

/// Derive a slug id from a manga title: lowercase, non-word runs collapsed
/// to a single `-`, leading/trailing separators trimmed.
pub fn generate_manga_id(title: &str) -> String {
    let lowered = title.to_lowercase();
    NON_WORD
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Render a chapter number for use in chapter ids: integral values without
/// the fractional part ("15"), fractional values as-is ("1.5")
pub fn format_chapter_number(number: f64) -> String {
    if number.fract() == 0.0 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn chapter(name: &str, number: Option<f64>) -> Chapter {
        Chapter {
            id: "test-ch-0".to_string(),
            name: name.to_string(),
            number,
            volume: None,
            path: PathBuf::from(name),
            pages: Vec::new(),
            page_count: 1,
            date_added: Utc::now(),
        }
    }

    #[test]
    fn test_parse_volume_and_chapter() {
        let info = parse_chapter_name("Vol. 1, Ch. 15");
        assert_eq!(info.number, Some(15.0));
        assert_eq!(info.volume, Some(1));

        let info = parse_chapter_name("Volume 2 Chapter 5");
        assert_eq!(info.number, Some(5.0));
        assert_eq!(info.volume, Some(2));

        let info = parse_chapter_name("vol 3 ch 2");
        assert_eq!(info.number, Some(2.0));
        assert_eq!(info.volume, Some(3));
    }

    #[test]
    fn test_parse_bare_chapter_words() {
        assert_eq!(parse_chapter_name("Chapter 7").number, Some(7.0));
        assert_eq!(parse_chapter_name("Capítulo 7").number, Some(7.0));
        assert_eq!(parse_chapter_name("Ch. 7").number, Some(7.0));
        assert_eq!(parse_chapter_name("chapter 1.5").number, Some(1.5));
        assert_eq!(parse_chapter_name("Chapter 7").volume, None);
    }

    #[test]
    fn test_parse_leading_number() {
        assert_eq!(parse_chapter_name("007 - Title").number, Some(7.0));
        assert_eq!(parse_chapter_name("12_extra").number, Some(12.0));
    }

    #[test]
    fn test_parse_standalone_number() {
        assert_eq!(parse_chapter_name("Special 42").number, Some(42.0));
    }

    #[test]
    fn test_parse_no_match() {
        let info = parse_chapter_name("Random Text");
        assert_eq!(info.number, None);
        assert_eq!(info.volume, None);
    }

    #[test]
    fn test_natural_sort_orders_digit_runs_numerically() {
        let mut names = vec!["page1.jpg", "page10.jpg", "page2.jpg"];
        names.sort_by_key(|n| natural_sort_key(n));
        assert_eq!(names, vec!["page1.jpg", "page2.jpg", "page10.jpg"]);
    }

    #[test]
    fn test_natural_sort_is_case_insensitive() {
        assert_eq!(natural_sort_key("Page1"), natural_sort_key("page1"));
    }

    #[test]
    fn test_sort_chapters_numbered_descending_then_unnumbered() {
        let mut chapters = vec![
            chapter("Chapter 10", Some(10.0)),
            chapter("Chapter 2", Some(2.0)),
            chapter("Extra Chapter", None),
            chapter("Chapter 1.5", Some(1.5)),
        ];
        sort_chapters(&mut chapters);

        let order: Vec<&str> = chapters.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            order,
            vec!["Chapter 10", "Chapter 2", "Chapter 1.5", "Extra Chapter"]
        );
    }

    #[test]
    fn test_sort_chapters_unnumbered_by_name() {
        let mut chapters = vec![
            chapter("Omake B", None),
            chapter("Omake A", None),
            chapter("Chapter 1", Some(1.0)),
        ];
        sort_chapters(&mut chapters);

        let order: Vec<&str> = chapters.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(order, vec!["Chapter 1", "Omake A", "Omake B"]);
    }

    #[test]
    fn test_generate_manga_id() {
        assert_eq!(generate_manga_id("One Piece"), "one-piece");
        assert_eq!(
            generate_manga_id("Demon Slayer: Kimetsu no Yaiba"),
            "demon-slayer-kimetsu-no-yaiba"
        );
        assert_eq!(generate_manga_id("--My  Manga!!--"), "my-manga");
        assert_eq!(generate_manga_id("Berserk"), "berserk");
    }

    #[test]
    fn test_format_chapter_number() {
        assert_eq!(format_chapter_number(15.0), "15");
        assert_eq!(format_chapter_number(1.5), "1.5");
        assert_eq!(format_chapter_number(0.0), "0");
    }

    proptest! {
        #[test]
        fn natural_sort_matches_numeric_order(a in 0u32..100_000, b in 0u32..100_000) {
            let key_a = natural_sort_key(&format!("page{a}.jpg"));
            let key_b = natural_sort_key(&format!("page{b}.jpg"));
            prop_assert_eq!(key_a.cmp(&key_b), a.cmp(&b));
        }

        #[test]
        fn parsed_chapter_numbers_are_non_negative(name in "\\PC*") {
            if let Some(number) = parse_chapter_name(&name).number {
                prop_assert!(number >= 0.0);
            }
        }
    }
}
