//! English pluralization
//!
//! Table names for singular nested records are derived by pluralizing the
//! attribute name. The uncoverer only depends on the [`Pluralize`] trait, so
//! any implementation (including a plain closure) can be swapped in.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};

/// Maps a singular noun to its plural form
pub trait Pluralize {
    fn pluralize(&self, word: &str) -> String;
}

impl<F> Pluralize for F
where
    F: Fn(&str) -> String,
{
    fn pluralize(&self, word: &str) -> String {
        self(word)
    }
}

/// Rule-based English pluralizer covering regular, irregular and
/// uncountable nouns
#[derive(Debug, Clone, Copy, Default)]
pub struct English;

impl Pluralize for English {
    fn pluralize(&self, word: &str) -> String {
        pluralize(word)
    }
}

// (singular, plural)
const IRREGULARS: &[(&str, &str)] = &[
    ("i", "we"),
    ("me", "us"),
    ("he", "they"),
    ("she", "they"),
    ("them", "them"),
    ("myself", "ourselves"),
    ("yourself", "yourselves"),
    ("itself", "themselves"),
    ("herself", "themselves"),
    ("himself", "themselves"),
    ("themself", "themselves"),
    ("is", "are"),
    ("was", "were"),
    ("has", "have"),
    ("this", "these"),
    ("that", "those"),
    ("echo", "echoes"),
    ("dingo", "dingoes"),
    ("volcano", "volcanoes"),
    ("tornado", "tornadoes"),
    ("torpedo", "torpedoes"),
    ("genus", "genera"),
    ("viscus", "viscera"),
    ("stigma", "stigmata"),
    ("stoma", "stomata"),
    ("dogma", "dogmata"),
    ("lemma", "lemmata"),
    ("schema", "schemata"),
    ("anathema", "anathemata"),
    ("ox", "oxen"),
    ("axe", "axes"),
    ("die", "dice"),
    ("yes", "yeses"),
    ("foot", "feet"),
    ("eave", "eaves"),
    ("goose", "geese"),
    ("tooth", "teeth"),
    ("quiz", "quizzes"),
    ("human", "humans"),
    ("proof", "proofs"),
    ("carve", "carves"),
    ("valve", "valves"),
    ("looey", "looies"),
    ("thief", "thieves"),
    ("groove", "grooves"),
    ("pickaxe", "pickaxes"),
    ("passerby", "passersby"),
];

const UNCOUNTABLES: &[&str] = &[
    "adulthood", "advice", "agenda", "aid", "aircraft", "alcohol", "ammo", "analytics",
    "anime", "athletics", "audio", "bison", "blood", "bream", "buffalo", "butter", "carp",
    "cash", "chassis", "chess", "clothing", "cod", "commerce", "cooperation", "corps",
    "debris", "diabetes", "digestion", "elk", "energy", "equipment", "excretion",
    "expertise", "firmware", "flounder", "fun", "gallows", "garbage", "graffiti",
    "hardware", "headquarters", "health", "herpes", "highjinks", "homework", "housework",
    "information", "jeans", "justice", "kudos", "labour", "literature", "machinery",
    "mackerel", "mail", "media", "mews", "moose", "music", "mud", "manga", "news", "only",
    "personnel", "pike", "plankton", "pliers", "police", "pollution", "premises", "rain",
    "research", "rice", "salmon", "scissors", "series", "sewage", "shambles", "shrimp",
    "software", "species", "staff", "swine", "tennis", "traffic", "transportation",
    "trout", "tuna", "wealth", "welfare", "whiting", "wildebeest", "wildlife", "you",
];

static UNCOUNTABLE_WORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| UNCOUNTABLES.iter().copied().collect());

static UNCOUNTABLE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"pok[eé]mon$",
        r"[^aeiou]ese$",
        r"deer$",
        r"fish$",
        r"measles$",
        r"o[iu]s$",
        r"pox$",
        r"sheep$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static SINGULAR_TO_PLURAL: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| IRREGULARS.iter().copied().collect());

static IRREGULAR_PLURALS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| IRREGULARS.iter().map(|(_, plural)| *plural).collect());

// Lowest priority first; the last matching rule wins. Matched
// case-insensitively against the word as given.
static PLURAL_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"s?$", "s"),
        (r"[^\x00-\x7F]$", "${0}"),
        (r"([^aeiou]ese)$", "${1}"),
        (r"(ax|test)is$", "${1}es"),
        (r"(alias|[^aou]us|t[lm]as|gas|ris)$", "${1}es"),
        (r"(e[mn]u)s?$", "${1}s"),
        (r"([^l]ias|[aeiou]las|[ejzr]as|[iu]am)$", "${1}"),
        (
            r"(alumn|syllab|vir|radi|nucle|fung|cact|stimul|termin|bacill|foc|uter|loc|strat)(?:us|i)$",
            "${1}i",
        ),
        (r"(alumn|alg|vertebr)(?:a|ae)$", "${1}ae"),
        (r"(seraph|cherub)(?:im)?$", "${1}im"),
        (r"(her|at|gr)o$", "${1}oes"),
        (
            r"(agend|addend|millenni|dat|extrem|bacteri|desiderat|strat|candelabr|errat|ov|symposi|curricul|automat|quor)(?:a|um)$",
            "${1}a",
        ),
        (
            r"(apheli|hyperbat|periheli|asyndet|noumen|phenomen|criteri|organ|prolegomen|hedr|automat)(?:a|on)$",
            "${1}a",
        ),
        (r"sis$", "ses"),
        (r"(?:(kni|wi|li)fe|(ar|l|ea|eo|oa|hoo)f)$", "${1}${2}ves"),
        (r"([^aeiouy]|qu)y$", "${1}ies"),
        (r"([^ch][ieo][ln])ey$", "${1}ies"),
        (r"(x|ch|ss|sh|zz)$", "${1}es"),
        (r"(matr|cod|mur|sil|vert|ind|append)(?:ix|ex)$", "${1}ices"),
        (r"\b((?:tit)?m|l)(?:ice|ouse)$", "${1}ice"),
        (r"(pe)(?:rson|ople)$", "${1}ople"),
        (r"(child)(?:ren)?$", "${1}ren"),
        (r"eaux$", "${0}"),
        (r"m[ae]n$", "men"),
        (r"^thou$", "you"),
    ]
    .iter()
    .map(|(p, r)| (Regex::new(&format!("(?i){p}")).unwrap(), *r))
    .collect()
});

/// Pluralize an English word, preserving its case.
///
/// Only the matched suffix is rewritten, so inner capitals survive
/// (`lineItem` becomes `lineItems`, `userChild` becomes `userChildren`).
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let token = word.to_lowercase();

    if let Some(plural) = SINGULAR_TO_PLURAL.get(token.as_str()) {
        return restore_case(word, plural);
    }
    if IRREGULAR_PLURALS.contains(token.as_str()) || is_uncountable(&token) {
        return word.to_string();
    }

    match PLURAL_RULES.iter().rev().find(|(rule, _)| rule.is_match(word)) {
        Some((rule, replacement)) => rule
            .replace(word, |caps: &Captures| replace_match(word, caps, replacement))
            .into_owned(),
        None => word.to_string(),
    }
}

/// Expand a rule's replacement, taking its case from the matched text
fn replace_match(word: &str, caps: &Captures, replacement: &str) -> String {
    let mut expanded = String::new();
    caps.expand(replacement, &mut expanded);

    let Some(matched) = caps.get(0) else {
        return expanded;
    };
    if !matched.as_str().is_empty() {
        return restore_case(matched.as_str(), &expanded);
    }

    // Empty match (a plain suffix): follow the preceding character
    match word[..matched.start()].chars().next_back() {
        Some(prev) => restore_case(prev.encode_utf8(&mut [0; 4]), &expanded),
        None => expanded,
    }
}

fn is_uncountable(token: &str) -> bool {
    UNCOUNTABLE_WORDS.contains(token) || UNCOUNTABLE_PATTERNS.iter().any(|p| p.is_match(token))
}

/// Apply the casing of `word` to `token`
fn restore_case(word: &str, token: &str) -> String {
    if word == token {
        return token.to_string();
    }
    if word == word.to_lowercase() {
        return token.to_lowercase();
    }
    if word == word.to_uppercase() {
        return token.to_uppercase();
    }

    let mut chars = token.chars();
    let starts_upper = word.chars().next().is_some_and(char::is_uppercase);
    match chars.next() {
        Some(first) if starts_upper => {
            first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
        }
        _ => token.to_lowercase(),
    }
}
