use once_cell::sync::Lazy;
use regex::Regex;

/// Verbs that say nothing about what a method does, with sharper alternatives.
pub const GENERIC_VERBS: &[(&str, &[&str])] = &[
    ("process", &["parse", "transform", "validate"]),
    ("handle", &["dispatch", "route", "respond"]),
    ("manage", &["schedule", "allocate", "track"]),
    ("do", &["apply", "send", "record"]),
    ("perform", &["calculate", "publish", "import"]),
    ("execute", &["submit", "invoke", "apply"]),
    ("run", &["start", "replay", "evaluate"]),
    ("deal", &["resolve", "settle", "assign"]),
];

/// Nouns too vague to name a variable, with sharper alternatives.
pub const VAGUE_NOUNS: &[(&str, &[&str])] = &[
    ("data", &["payload", "records", "attributes"]),
    ("info", &["details", "metadata", "summary"]),
    ("stuff", &["items", "entries"]),
    ("thing", &["item", "entry"]),
    ("things", &["items", "entries"]),
    ("obj", &["record", "model"]),
    ("object", &["record", "model"]),
    ("temp", &["buffer", "pending_value"]),
    ("tmp", &["buffer", "pending_value"]),
    ("val", &["amount", "setting"]),
    ("res", &["response", "outcome"]),
    ("ret", &["outcome", "response"]),
    ("foo", &["a descriptive name"]),
    ("bar", &["a descriptive name"]),
];

/// Naming shapes that read in the passive voice.
pub static PASSIVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^(?:was|were|been|being)_\w+",
        r"^\w+_(?:was|were|been|being)_\w+",
        r"^\w+ed_by_\w+$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Local variable assignment: `data = ...` (not `==` or `=~`).
pub static LOCAL_ASSIGNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([a-z_][a-zA-Z0-9_]*)\s*(?:\|\|=|=[^=~>])").unwrap());

/// Alternatives for a generic verb, if `verb` is one.
pub fn verb_alternatives(verb: &str) -> Option<&'static [&'static str]> {
    GENERIC_VERBS
        .iter()
        .find(|(generic, _)| *generic == verb)
        .map(|(_, alternatives)| *alternatives)
}

/// Alternatives for a vague noun, if `noun` is one.
pub fn noun_alternatives(noun: &str) -> Option<&'static [&'static str]> {
    VAGUE_NOUNS
        .iter()
        .find(|(vague, _)| *vague == noun)
        .map(|(_, alternatives)| *alternatives)
}

/// Suggested replacement when `method` (without `self.`) is named by a generic verb
/// alone or a generic verb plus a vague noun (`process`, `handle_data`).
pub fn generic_method_suggestion(method: &str) -> Option<String> {
    let bare = method
        .trim_start_matches("self.")
        .trim_end_matches(['?', '!', '=']);
    let mut words = bare.split('_').filter(|w| !w.is_empty());
    let verb = words.next()?;
    let rest: Vec<&str> = words.collect();
    let alternatives = verb_alternatives(verb)?;

    match rest.as_slice() {
        [] => Some(alternatives[0].to_string()),
        [noun] if noun_alternatives(noun).is_some() || *noun == "it" => {
            let noun_hint = noun_alternatives(noun)
                .map(|n| n[0])
                .unwrap_or("subject");
            Some(format!("{}_{}", alternatives[0], noun_hint))
        }
        _ => None,
    }
}

pub fn is_passive_name(name: &str) -> bool {
    let bare = name.trim_start_matches("self.");
    PASSIVE_PATTERNS.iter().any(|p| p.is_match(bare))
}
