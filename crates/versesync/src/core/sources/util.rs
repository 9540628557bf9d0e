//! Source Utilities
//!
//! Book and chapter ordering, audio file filtering.

use std::cmp::Ordering;

/// Canonical book order (Old Testament, deuterocanon, New Testament)
const CANONICAL_BOOK_ORDER: &[&str] = &[
    "Genesis",
    "Exodus",
    "Leviticus",
    "Numbers",
    "Deuteronomy",
    "Joshua",
    "Judges",
    "Ruth",
    "1 Samuel",
    "2 Samuel",
    "1 Kings",
    "2 Kings",
    "3 Kings",
    "4 Kings",
    "Ezra",
    "Nehemiah",
    "1 Esdras",
    "2 Esdras",
    "Tobit",
    "Judith",
    "Esther",
    "1 Maccabees",
    "2 Maccabees",
    "3 Maccabees",
    "4 Maccabees",
    "Job",
    "Psalms",
    "Proverbs",
    "Ecclesiastes",
    "Song of Songs",
    "Wisdom",
    "Sirach",
    "Isaiah",
    "Jeremiah",
    "Lamentations",
    "Baruch",
    "Ezekiel",
    "Daniel",
    "Hosea",
    "Joel",
    "Amos",
    "Obadiah",
    "Jonah",
    "Micah",
    "Nahum",
    "Habakkuk",
    "Zephaniah",
    "Haggai",
    "Zechariah",
    "Malachi",
    "Matthew",
    "Mark",
    "Luke",
    "John",
    "Acts",
    "Romans",
    "1 Corinthians",
    "2 Corinthians",
    "Galatians",
    "Ephesians",
    "Philippians",
    "Colossians",
    "1 Thessalonians",
    "2 Thessalonians",
    "1 Timothy",
    "2 Timothy",
    "Titus",
    "Philemon",
    "Hebrews",
    "James",
    "1 Peter",
    "2 Peter",
    "1 John",
    "2 John",
    "3 John",
    "Jude",
    "Revelation",
    "Apocalypse",
];

/// Sorts book names into canonical order
///
/// Unrecognized names keep their relative order and go last.
pub fn sort_in_canonical_order<S: AsRef<str>>(books: &mut [S]) {
    let rank = |name: &str| {
        CANONICAL_BOOK_ORDER
            .iter()
            .position(|b| *b == name)
            .unwrap_or(CANONICAL_BOOK_ORDER.len())
    };
    books.sort_by_key(|b| rank(b.as_ref()));
}

/// Whether the file name has one of the extensions (case-insensitive)
pub fn is_valid_audio_file<S: AsRef<str>>(file: &str, extensions: &[S]) -> bool {
    let lower = file.to_lowercase();
    extensions.iter().any(|ext| {
        let ext = ext.as_ref().trim_start_matches('.').to_lowercase();
        !ext.is_empty() && lower.ends_with(&format!(".{}", ext))
    })
}

/// Natural ordering for chapter names: numeric runs compare by value
pub fn compare_chapter_names(a: &str, b: &str) -> Ordering {
    let (mut a, mut b) = (a, b);
    loop {
        match (a.chars().next(), b.chars().next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let (na, ra) = split_digits(a);
                let (nb, rb) = split_digits(b);
                let ord = na
                    .trim_start_matches('0')
                    .len()
                    .cmp(&nb.trim_start_matches('0').len())
                    .then_with(|| na.trim_start_matches('0').cmp(nb.trim_start_matches('0')));
                if ord != Ordering::Equal {
                    return ord;
                }
                a = ra;
                b = rb;
            }
            (Some(ca), Some(cb)) => {
                let ord = ca.to_lowercase().cmp(cb.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                a = &a[ca.len_utf8()..];
                b = &b[cb.len_utf8()..];
            }
        }
    }
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}
