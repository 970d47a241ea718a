//! Roman numeral vocabulary for top-level Articles
//!
//! The agreement numbers its Articles I through XLII. The vocabulary is a
//! fixed, ordered table: classification, ordering checks and coverage all
//! read from it so they can never disagree about what a valid numeral is.

/// Highest Article ordinal the vocabulary recognizes.
pub const MAX_ARTICLES: usize = 42;

const ONES: [&str; 10] = ["", "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX"];
const TENS: [&str; 5] = ["", "X", "XX", "XXX", "XL"];

/// Convert a 1-based ordinal into its numeral, if it is in the vocabulary.
pub fn ordinal_to_numeral(ordinal: usize) -> Option<String> {
    if ordinal == 0 || ordinal > MAX_ARTICLES {
        return None;
    }
    Some(format!("{}{}", TENS[ordinal / 10], ONES[ordinal % 10]))
}

/// Position of a numeral in the vocabulary (1-based), or `None` if the token
/// is not one of I..XLII written canonically.
pub fn numeral_to_ordinal(numeral: &str) -> Option<usize> {
    (1..=MAX_ARTICLES).find(|&n| ordinal_to_numeral(n).as_deref() == Some(numeral))
}

/// True if `token` is a canonical numeral in the vocabulary.
pub fn is_article_numeral(token: &str) -> bool {
    numeral_to_ordinal(token).is_some()
}

/// The full ordered vocabulary, I..XLII.
pub fn canonical_numerals() -> Vec<String> {
    (1..=MAX_ARTICLES).filter_map(ordinal_to_numeral).collect()
}
