use heck::ToSnakeCase;

pub fn snake_case(src: &str) -> String {
    src.to_snake_case()
}

/// Upper-cases the first character, leaving the rest untouched.
pub fn upper_first(src: &str) -> String {
    let mut chars = src.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Removes `_`, `-` and whitespace separators, upper-casing the character
/// that follows each run. The first character keeps its case, so
/// `Father_id` becomes `FatherId` and `homeTeam_id` becomes `homeTeamId`.
pub fn camelize(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut upper_next = false;

    for ch in src.trim().chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }

    out
}

pub fn pluralize(src: &str) -> String {
    pluralizer::pluralize(src, 2, false)
}

pub fn singularize(src: &str) -> String {
    pluralizer::pluralize(src, 1, false)
}
