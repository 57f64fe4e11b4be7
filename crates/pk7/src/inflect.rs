//! English pluralization for table names.
//!
//! `references(:user)` points at `users`, `references(:person)` at `people`.
//! Compound snake_case names only pluralize their last segment, so
//! `line_item` becomes `line_items`.

/// Words whose plural is the word itself.
const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "jeans",
    "police",
];

/// Singular/plural pairs no suffix rule covers.
const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("sex", "sexes"),
    ("move", "moves"),
    ("zombie", "zombies"),
];

/// Pluralize a table base name.
///
/// ```
/// assert_eq!(pk7::inflect::pluralize("user"), "users");
/// assert_eq!(pk7::inflect::pluralize("person"), "people");
/// assert_eq!(pk7::inflect::pluralize("legacy_item"), "legacy_items");
/// assert_eq!(pk7::inflect::pluralize("category"), "categories");
/// ```
pub fn pluralize(word: &str) -> String {
    match word.rfind('_') {
        Some(idx) => {
            let (head, last) = word.split_at(idx + 1);
            format!("{head}{}", pluralize_word(last))
        }
        None => pluralize_word(word),
    }
}

fn pluralize_word(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();

    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }

    for (singular, plural) in IRREGULAR {
        if lower == *singular {
            return match_leading_case(word, plural);
        }
        if lower == *plural {
            return word.to_string();
        }
    }

    match_leading_case(word, &apply_suffix_rules(&lower))
}

/// Suffix rules, most specific first. Input is lowercase.
fn apply_suffix_rules(word: &str) -> String {
    if word.ends_with("quiz") {
        return format!("{word}zes");
    }
    if word == "ox" {
        return format!("{word}en");
    }
    if word == "oxen" {
        return word.to_string();
    }
    for (suffix, replacement) in [("mouse", "mice"), ("louse", "lice")] {
        if word.ends_with(suffix) {
            return format!("{}{replacement}", stem(word, suffix));
        }
    }
    if word.ends_with("mice") || word.ends_with("lice") {
        return word.to_string();
    }
    for suffix in ["matrix", "vertex", "index"] {
        if word.ends_with(suffix) {
            let base = &word[..word.len() - 2];
            return format!("{base}ices");
        }
    }
    if word.ends_with("ices") {
        return word.to_string();
    }
    for suffix in ["x", "ch", "ss", "sh"] {
        if word.ends_with(suffix) {
            return format!("{word}es");
        }
    }
    if let Some(base) = word.strip_suffix('y') {
        let after_consonant = base
            .chars()
            .last()
            .is_some_and(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'));
        if after_consonant || base.ends_with("qu") {
            return format!("{base}ies");
        }
    }
    if word.ends_with("hive") {
        return format!("{word}s");
    }
    if let Some(base) = word.strip_suffix("fe") {
        if !base.ends_with('f') {
            return format!("{base}ves");
        }
    }
    for suffix in ["lf", "rf"] {
        if word.ends_with(suffix) {
            return format!("{}ves", &word[..word.len() - 1]);
        }
    }
    if word.ends_with("sis") {
        return format!("{}ses", stem(word, "sis"));
    }
    if word.ends_with("tum") || word.ends_with("ium") {
        return format!("{}a", stem(word, "um"));
    }
    if word.ends_with("ta") || word.ends_with("ia") {
        return word.to_string();
    }
    for suffix in ["buffalo", "tomato"] {
        if word.ends_with(suffix) {
            return format!("{word}es");
        }
    }
    if word.ends_with("bus") {
        return format!("{word}es");
    }
    if word.ends_with("alias") || word.ends_with("status") {
        return format!("{word}es");
    }
    if word.ends_with("octopi") || word.ends_with("viri") {
        return word.to_string();
    }
    for suffix in ["octopus", "virus"] {
        if word.ends_with(suffix) {
            return format!("{}i", stem(word, "us"));
        }
    }
    for suffix in ["axis", "testis"] {
        if word.ends_with(suffix) {
            return format!("{}es", stem(word, "is"));
        }
    }
    if word.ends_with('s') {
        return word.to_string();
    }

    format!("{word}s")
}

fn stem<'w>(word: &'w str, suffix: &str) -> &'w str {
    &word[..word.len() - suffix.len()]
}

/// Carry the original's leading-character case over to `plural`.
fn match_leading_case(original: &str, plural: &str) -> String {
    let upper = original.chars().next().is_some_and(char::is_uppercase);
    if !upper {
        return plural.to_string();
    }

    let mut chars = plural.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_and_suffix_rules() {
        for (singular, plural) in [
            ("user", "users"),
            ("post", "posts"),
            ("category", "categories"),
            ("day", "days"),
            ("soliloquy", "soliloquies"),
            ("box", "boxes"),
            ("church", "churches"),
            ("kiss", "kisses"),
            ("dish", "dishes"),
            ("quiz", "quizzes"),
            ("ox", "oxen"),
            ("mouse", "mice"),
            ("matrix", "matrices"),
            ("vertex", "vertices"),
            ("index", "indices"),
            ("archive", "archives"),
            ("knife", "knives"),
            ("wolf", "wolves"),
            ("dwarf", "dwarves"),
            ("analysis", "analyses"),
            ("datum", "data"),
            ("medium", "media"),
            ("tomato", "tomatoes"),
            ("bus", "buses"),
            ("status", "statuses"),
            ("alias", "aliases"),
            ("octopus", "octopi"),
            ("virus", "viri"),
            ("axis", "axes"),
            ("testis", "testes"),
        ] {
            assert_eq!(pluralize(singular), plural, "{singular}");
        }
    }

    #[test]
    fn test_irregular_and_uncountable() {
        for (singular, plural) in [
            ("person", "people"),
            ("man", "men"),
            ("woman", "women"),
            ("child", "children"),
            ("sex", "sexes"),
            ("move", "moves"),
            ("zombie", "zombies"),
            ("sheep", "sheep"),
            ("equipment", "equipment"),
            ("species", "species"),
        ] {
            assert_eq!(pluralize(singular), plural, "{singular}");
        }
    }

    #[test]
    fn test_compound_names_pluralize_last_segment() {
        assert_eq!(pluralize("legacy_item"), "legacy_items");
        assert_eq!(pluralize("line_item"), "line_items");
        assert_eq!(pluralize("sales_person"), "sales_people");
        assert_eq!(pluralize("product_category"), "product_categories");
    }

    #[test]
    fn test_already_plural_is_unchanged() {
        for word in ["users", "people", "children", "mice", "data", "indices"] {
            assert_eq!(pluralize(word), word);
        }
    }

    #[test]
    fn test_leading_case_preserved() {
        assert_eq!(pluralize("Person"), "People");
        assert_eq!(pluralize("User"), "Users");
    }
}
