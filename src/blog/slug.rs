//! Category slugs: the hyphenated, lowercase form of a category name used in
//! `/category/{slug}/` links.

/// `"Web Development"` -> `"web-development"`.
pub fn category_slug(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Canonical stored form of a category label: trimmed, with every run of
/// whitespace collapsed to one space, so that `category_slug` and
/// `slug_to_category_title` lead back to the same text.
pub fn normalize_category_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Undo the hyphenation so the result can be compared against a stored
/// `category_title`. Case is left alone; lookups compare case-insensitively.
pub fn slug_to_category_title(slug: &str) -> String {
    slug.replace('-', " ")
}

/// Heading shown on a category page: `"my-tag"` -> `"My Tag"`.
///
/// A letter is upper-cased when it follows a non-letter and lower-cased
/// otherwise.
pub fn display_label(slug: &str) -> String {
    let mut label = String::with_capacity(slug.len());
    let mut prev_is_letter = false;
    for c in slug.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                label.extend(c.to_lowercase());
            } else {
                label.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            label.push(if c == '-' { ' ' } else { c });
            prev_is_letter = false;
        }
    }
    label
}
