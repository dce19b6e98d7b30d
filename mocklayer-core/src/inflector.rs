//! English singular/plural conversion for model, table and document key names.

const IRREGULAR: [(&str, &str); 8] = [
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("foot", "feet"),
    ("tooth", "teeth"),
];

const UNCOUNTABLE: [&str; 8] = [
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
];

/// Returns the plural form of a singular noun (`author` → `authors`).
pub fn pluralize(word: &str) -> String {
    if word.is_empty() || UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }

    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == word) {
        return (*plural).to_string();
    }

    if let Some(stem) = word.strip_suffix('y') {
        if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{stem}ies");
        }
    }

    if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| word.ends_with(suffix)) {
        return format!("{word}es");
    }

    format!("{word}s")
}

/// Nouns whose singular ends in `ie`, which `-ies` would otherwise turn into `-y`.
const IE_NOUNS: [&str; 16] = [
    "movie", "cookie", "pie", "tie", "lie", "die", "zombie", "rookie", "selfie", "genie",
    "calorie", "prairie", "hoodie", "brownie", "smoothie", "goalie",
];

/// Nouns whose singular ends in `che`, `she` or `xe`, which lose the `e`
/// under the sibilant `-es` rule.
const E_NOUNS: [&str; 11] = [
    "cache", "ache", "headache", "niche", "cliche", "quiche", "avalanche", "moustache",
    "mustache", "psyche", "axe",
];

/// `true` if `word` is `noun` or a snake/kebab compound ending in it.
fn ends_with_noun(word: &str, noun: &str) -> bool {
    word == noun
        || word
            .strip_suffix(noun)
            .is_some_and(|prefix| prefix.ends_with(['_', '-']))
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Returns the singular form of a plural noun (`authors` → `author`).
///
/// Inverts [`pluralize`] for the suffixes it produces. Words that already
/// look singular are returned unchanged.
pub fn singularize(word: &str) -> String {
    if word.is_empty() || UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }

    if let Some((singular, _)) = IRREGULAR.iter().find(|(_, plural)| *plural == word) {
        return (*singular).to_string();
    }

    if IRREGULAR.iter().any(|(singular, _)| *singular == word) {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix("ies") {
        let ie = format!("{stem}ie");
        if IE_NOUNS.iter().any(|noun| ends_with_noun(&ie, noun)) {
            return ie;
        }
        if stem.ends_with(|c: char| !is_vowel(c)) {
            return format!("{stem}y");
        }
    }

    if let Some(stem) = word.strip_suffix("es") {
        let with_e = format!("{stem}e");
        if E_NOUNS.iter().any(|noun| ends_with_noun(&with_e, noun)) {
            return with_e;
        }
        if ["ss", "sh", "ch", "x", "zz"].iter().any(|suffix| stem.ends_with(suffix)) {
            return stem.to_string();
        }
        // `statuses` and `buses`; `houses` and `causes` keep their `e`.
        if stem
            .strip_suffix("us")
            .is_some_and(|before| before.ends_with(|c: char| !is_vowel(c)))
        {
            return stem.to_string();
        }
    }

    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }

    match word.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => word.to_string(),
    }
}
