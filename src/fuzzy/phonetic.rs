//! Phonetic codes: Soundex and Metaphone
//!
//! Both operate on ASCII letters only; other characters are ignored
//! (Metaphone) or act as separators (Soundex).

/// Soundex digit per letter A..Z; `0` marks letters that are not coded
const SOUNDEX_TABLE: &[u8; 26] = b"01230120022455012623010202";

const SOUNDEX_LEN: usize = 4;

fn soundex_code(c: char) -> char {
    let upper = c.to_ascii_uppercase();
    if upper.is_ascii_uppercase() {
        SOUNDEX_TABLE[(upper as u8 - b'A') as usize] as char
    } else {
        upper
    }
}

/// Four-character Soundex code (`"Robert"` -> `"R163"`)
///
/// Leading non-letters are skipped; input without letters yields an empty
/// string. Adjacent characters with the same code collapse, and uncoded
/// letters (vowels, H, W, Y) are dropped but still separate equal codes.
pub fn soundex(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let Some(start) = chars.iter().position(|c| c.is_ascii_alphabetic()) else {
        return String::new();
    };

    let mut code = String::with_capacity(SOUNDEX_LEN);
    code.push(chars[start].to_ascii_uppercase());

    let mut prev = chars[start];
    for &c in &chars[start + 1..] {
        if code.len() >= SOUNDEX_LEN {
            break;
        }
        if c.is_ascii_alphabetic() && soundex_code(c) != soundex_code(prev) {
            let digit = soundex_code(c);
            if digit != '0' {
                code.push(digit);
            }
        }
        prev = c;
    }

    while code.len() < SOUNDEX_LEN {
        code.push('0');
    }
    code
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'A' | 'E' | 'I' | 'O' | 'U')
}

fn is_vowel_at(c: Option<char>) -> bool {
    c.is_some_and(is_vowel)
}

/// Metaphone key of `input`, truncated to `max_len` characters
///
/// `0` stands for the "th" sound. Vowels are kept only in first position.
pub fn metaphone(input: &str, max_len: usize) -> String {
    let word: Vec<char> = input
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let mut key = String::new();
    if word.is_empty() || max_len == 0 {
        return key;
    }

    let at = |i: usize| word.get(i).copied();

    // Initial-letter exceptions
    let mut i = match (word[0], at(1)) {
        ('A', Some('E')) => {
            key.push('E');
            2
        }
        ('G' | 'K' | 'P', Some('N')) => {
            key.push('N');
            2
        }
        ('W', Some('R')) => {
            key.push('R');
            2
        }
        ('W', next) if next == Some('H') || is_vowel_at(next) => {
            key.push('W');
            2
        }
        ('X', _) => {
            key.push('S');
            1
        }
        (first, _) if is_vowel(first) => {
            key.push(first);
            1
        }
        _ => 0,
    };

    while i < word.len() && key.len() < max_len {
        let c = word[i];
        let prev = i.checked_sub(1).and_then(at);
        let next = at(i + 1);
        let after = at(i + 2);

        // Doubled letters sound once, except C ("accent")
        if c != 'C' && prev == Some(c) {
            i += 1;
            continue;
        }

        let mut skip = 0;
        match c {
            'A' | 'E' | 'I' | 'O' | 'U' => {}
            'B' => {
                // silent in a trailing "MB"
                if !(prev == Some('M') && next.is_none()) {
                    key.push('B');
                }
            }
            'C' => {
                if next == Some('I') && after == Some('A') {
                    key.push('X');
                } else if next == Some('H') {
                    key.push(if prev == Some('S') { 'K' } else { 'X' });
                    skip = 1;
                } else if matches!(next, Some('I' | 'E' | 'Y')) {
                    if prev != Some('S') {
                        key.push('S');
                    }
                } else {
                    key.push('K');
                }
            }
            'D' => {
                if next == Some('G') && matches!(after, Some('E' | 'I' | 'Y')) {
                    key.push('J');
                    skip = 2;
                } else {
                    key.push('T');
                }
            }
            'G' => {
                if next == Some('H') {
                    if is_vowel_at(after) {
                        key.push('K');
                    }
                    skip = 1;
                } else if next == Some('N')
                    && (after.is_none()
                        || (after == Some('E') && at(i + 3) == Some('D') && at(i + 4).is_none()))
                {
                    // silent in trailing "GN" / "GNED"
                } else if matches!(next, Some('I' | 'E' | 'Y')) && prev != Some('G') {
                    key.push('J');
                } else {
                    key.push('K');
                }
            }
            'H' => {
                if is_vowel_at(next) && !matches!(prev, Some('C' | 'G' | 'P' | 'S' | 'T')) {
                    key.push('H');
                }
            }
            'K' => {
                if prev != Some('C') {
                    key.push('K');
                }
            }
            'P' => {
                if next == Some('H') {
                    key.push('F');
                    skip = 1;
                } else {
                    key.push('P');
                }
            }
            'Q' => key.push('K'),
            'S' => {
                if next == Some('H') {
                    key.push('X');
                    skip = 1;
                } else if next == Some('I') && matches!(after, Some('O' | 'A')) {
                    key.push('X');
                } else {
                    key.push('S');
                }
            }
            'T' => {
                if next == Some('I') && matches!(after, Some('O' | 'A')) {
                    key.push('X');
                } else if next == Some('H') {
                    key.push('0');
                    skip = 1;
                } else if !(next == Some('C') && after == Some('H')) {
                    key.push('T');
                }
            }
            'V' => key.push('F'),
            'W' | 'Y' => {
                if is_vowel_at(next) {
                    key.push(c);
                }
            }
            'X' => key.push_str("KS"),
            'Z' => key.push('S'),
            // F J L M N R
            other => key.push(other),
        }

        i += 1 + skip;
    }

    key.truncate(max_len);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soundex_reference_codes() {
        assert_eq!(soundex("Robert"), "R163");
        assert_eq!(soundex("Rupert"), "R163");
        assert_eq!(soundex("Tymczak"), "T522");
        assert_eq!(soundex("Pfister"), "P236");
    }

    #[test]
    fn test_soundex_pads_and_skips_leading_noise() {
        assert_eq!(soundex("mouse"), "M200");
        assert_eq!(soundex("  42mouse"), "M200");
        assert_eq!(soundex("123"), "");
        assert_eq!(soundex(""), "");
    }

    #[test]
    fn test_soundex_typos() {
        assert_eq!(soundex("mouse"), soundex("mouce"));
        assert_eq!(soundex("computer"), "C513");
        assert_eq!(soundex("copmuter"), "C153");
    }

    #[test]
    fn test_metaphone_basic() {
        assert_eq!(metaphone("knight", 10), "NT");
        assert_eq!(metaphone("phone", 10), "FN");
        assert_eq!(metaphone("Thomas", 10), "0MS");
        assert_eq!(metaphone("xylophone", 10), "SLFN");
    }

    #[test]
    fn test_metaphone_typos() {
        assert_eq!(metaphone("mouse", 10), metaphone("mouce", 10));
        assert_eq!(metaphone("computer", 10), "KMPTR");
        assert_eq!(metaphone("copmuter", 10), "KPMTR");
    }

    #[test]
    fn test_metaphone_respects_max_len() {
        assert_eq!(metaphone("computer", 3), "KMP");
        assert_eq!(metaphone("computer", 0), "");
        assert_eq!(metaphone("", 4), "");
    }
}
