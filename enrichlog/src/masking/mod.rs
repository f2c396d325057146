//! Masking: how listed properties are transformed before they leave the process.
//!
//! - **`policy`**: the policy enum, the shared [`MaskConfiguration`], and the
//!   pure [`mask`] function.
//!
//! Which members of a structured value are masked is decided by
//! `crate::classification`.

mod policy;

pub use policy::{
    mask, MaskConfiguration, MaskPolicy, UnknownMaskPolicy, DEFAULT_MASK_DIGIT,
    DEFAULT_MASK_LETTER, DEFAULT_MASK_PATTERN, FALLBACK_MASK_PATTERN,
};

/// Case-folds a property name for case-insensitive comparison.
///
/// Each character maps to its simple uppercase form. Characters whose
/// uppercase expands to several characters (`ß` to `SS`) are kept as is, so
/// folding never changes a name's character count.
pub(crate) fn fold_name(name: &str) -> String {
    name.chars().map(fold_char).collect()
}

/// Whether two property names are equal under [`fold_name`].
pub(crate) fn names_match(left: &str, right: &str) -> bool {
    left.chars().count() == right.chars().count()
        && left
            .chars()
            .zip(right.chars())
            .all(|(l, r)| fold_char(l) == fold_char(r))
}

fn fold_char(ch: char) -> char {
    let mut upper = ch.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(single), None) => single,
        _ => ch,
    }
}
