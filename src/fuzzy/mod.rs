//! String similarity algorithms behind the fuzzy search methods
//!
//! SQLite ships none of the fuzzy-matching functions the benchmark methods
//! query with. These are pure Rust implementations registered on each
//! connection as SQL scalar functions (see [`crate::prepare`]):
//!
//! - `levenshtein(a, b)` - edit distance
//! - `soundex(s)` - four-character phonetic code
//! - `metaphone(s, max_len)` - consonant-skeleton phonetic code
//! - `similarity(a, b)` - trigram similarity with pg_trgm semantics

pub mod levenshtein;
pub mod phonetic;
pub mod trigram;

pub use levenshtein::levenshtein;
pub use phonetic::{metaphone, soundex};
pub use trigram::{trigram_similarity, trigrams, DEFAULT_SIMILARITY_THRESHOLD};
