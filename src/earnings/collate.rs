//! Locale-style string ordering for manager names.
//! Three levels, compared in turn: base letters ignoring case and accents, then accents, then case
//! with lowercase first. Strings equal on all three levels compare Equal so a stable sort keeps
//! their input order.

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

fn primary_key(s: &str) -> Vec<char> {
    s.nfd().filter(|c| !is_combining_mark(*c)).flat_map(char::to_lowercase).collect()
}

fn secondary_key(s: &str) -> Vec<char> {
    s.nfd().flat_map(char::to_lowercase).collect()
}

fn tertiary_key(s: &str) -> Vec<u8> {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c.is_uppercase() { 1 } else { 0 })
        .collect()
}

pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    primary_key(a)
        .cmp(&primary_key(b))
        .then_with(|| secondary_key(a).cmp(&secondary_key(b)))
        .then_with(|| tertiary_key(a).cmp(&tertiary_key(b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_is_not_primary() {
        assert_eq!(locale_cmp("anna", "Bernd"), Ordering::Less);
        assert_eq!(locale_cmp("Zoe", "adam"), Ordering::Greater);
        assert_eq!(locale_cmp("anna", "Anna"), Ordering::Less);
    }

    #[test]
    fn accents_sort_with_base_letter() {
        assert_eq!(locale_cmp("Özil", "Peters"), Ordering::Less);
        assert_eq!(locale_cmp("Oz", "Öz"), Ordering::Less);
        assert_eq!(locale_cmp("Élise", "Eric"), Ordering::Less);
    }

    #[test]
    fn composed_and_decomposed_are_equal() {
        assert_eq!(locale_cmp("Jos\u{e9}", "Jose\u{301}"), Ordering::Equal);
    }
}
