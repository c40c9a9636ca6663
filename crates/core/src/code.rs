//! # Code Module
//!
//! Sub-account code handling: the dot-notation transformer, candidate
//! generation for the allocator and the prefix sequence used to find a
//! parent account.
//!
//! Codes are compared and measured in characters, not bytes.

/// Sub-account code length used when the caller does not know the exercise.
pub const DEFAULT_CODE_LENGTH: usize = 10;

/// Highest numeric suffix the allocator tries under a parent account.
pub const MAX_SUFFIX: u32 = 999;

/// Number of characters in a code.
pub fn code_len(code: &str) -> usize {
    code.chars().count()
}

/// Transform a dot-notation shorthand into a canonical code.
///
/// `"570.1"` with length 10 becomes `"5700000001"`. Input without a dot, or
/// with more than one dot, is returned trimmed but otherwise unchanged. The
/// result is never truncated.
///
/// # Examples
/// ```
/// use quickcreate_core::code::transform;
///
/// assert_eq!(transform("570.1", 10), "5700000001");
/// assert_eq!(transform("43.1", 6), "430001");
/// assert_eq!(transform("570.1.2", 10), "570.1.2");
/// ```
pub fn transform(code: &str, target_length: usize) -> String {
    let code = code.trim();
    let mut parts = code.split('.');

    match (parts.next(), parts.next(), parts.next()) {
        (Some(prefix), Some(suffix), None) => pad_code(prefix, suffix, target_length),
        _ => code.to_string(),
    }
}

/// [`transform`] with [`DEFAULT_CODE_LENGTH`].
pub fn transform_default(code: &str) -> String {
    transform(code, DEFAULT_CODE_LENGTH)
}

/// Right-pad `prefix` with `'0'` so that `prefix + suffix` reaches
/// `target_length` characters. A prefix that is already long enough is kept
/// as-is.
pub fn pad_code(prefix: &str, suffix: &str, target_length: usize) -> String {
    let width = target_length.saturating_sub(code_len(suffix));
    let zeros = width.saturating_sub(code_len(prefix));

    let mut code = String::with_capacity(prefix.len() + zeros + suffix.len());
    code.push_str(prefix);
    code.extend(std::iter::repeat('0').take(zeros));
    code.push_str(suffix);
    code
}

/// Candidate sub-account codes under `parent`, in allocation order.
///
/// Suffixes run from 1 to `max_suffix` without leading zeros. Candidates that
/// cannot have exactly `length` characters (parent too long for the suffix)
/// are skipped.
pub fn candidate_codes(
    parent: &str,
    length: usize,
    max_suffix: u32,
) -> impl Iterator<Item = String> + '_ {
    (1..=max_suffix)
        .map(move |suffix| pad_code(parent, &suffix.to_string(), length))
        .filter(move |candidate| code_len(candidate) == length)
}

/// Prefixes of `code` tried when looking for its parent account.
///
/// Starts with the code minus its last two characters and drops one more
/// character each step, ending with the one-character prefix. Codes of two
/// characters or fewer yield nothing.
pub fn parent_candidates(code: &str) -> impl Iterator<Item = &str> + '_ {
    let offsets: Vec<usize> = code.char_indices().map(|(offset, _)| offset).collect();
    let count = offsets.len();

    (1..count.saturating_sub(1))
        .rev()
        .map(move |len| &code[..offsets[len]])
}

/// Shape of a free-text search query, as far as code suggestions care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryShape<'a> {
    /// Two to four digits, e.g. `"570"`: looks like a parent account code.
    BarePrefix(&'a str),
    /// Digits, a dot and optional digits, e.g. `"570."` or `"570.12"`.
    Dotted { prefix: &'a str, suffix: &'a str },
    /// Anything else (descriptions, full codes, mixed input).
    Other,
}

impl<'a> QueryShape<'a> {
    /// Classify a query. Surrounding whitespace is ignored.
    pub fn classify(query: &'a str) -> Self {
        let query = query.trim();

        if (2..=4).contains(&query.len()) && all_digits(query) {
            return QueryShape::BarePrefix(query);
        }

        if let Some((prefix, suffix)) = query.split_once('.') {
            if !prefix.is_empty() && all_digits(prefix) && all_digits(suffix) {
                return QueryShape::Dotted { prefix, suffix };
            }
        }

        QueryShape::Other
    }
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// Code prefix to search for when the user typed `query`.
///
/// Dot notation is expanded to the canonical code; a trailing dot (`"570."`)
/// searches by the part before the dot, since the expanded form would end
/// in zeros no real code has.
pub fn search_prefix(query: &str, length: usize) -> String {
    match QueryShape::classify(query) {
        QueryShape::Dotted { prefix, suffix } if suffix.is_empty() => prefix.to_string(),
        _ => transform(query, length),
    }
}
