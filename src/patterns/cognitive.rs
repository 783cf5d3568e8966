use once_cell::sync::Lazy;
use regex::Regex;

pub static TYPE_DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*class\s+[A-Z][\w:]*").unwrap());

/// Value-object contexts where operator methods are expected.
pub static OPERATOR_CONTEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"include\s+(?:Comparable|Enumerable)\b|Struct\.new|Data\.define|<\s*(?:Struct|Numeric|Delegator|SimpleDelegator)\b",
    )
    .unwrap()
});

pub static RESPOND_TO_MISSING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"def\s+respond_to_missing\?").unwrap());

/// Method names that overload operators or intercept dispatch.
pub const OPERATOR_METHODS: &[&str] = &[
    "+", "-", "*", "/", "%", "**", "==", "!=", "<", ">", "<=", ">=", "<=>", "===", "=~", "[]",
    "[]=", "<<", ">>", "!", "~", "+@", "-@", "coerce",
];

pub const METHOD_MISSING: &str = "method_missing";

/// Distinct blank-line gap sizes tolerated before the rhythm is called inconsistent.
pub const MAX_DISTINCT_GAPS: usize = 2;

/// Minimum method count before front-loading is judged.
pub const FRONT_LOAD_MIN_METHODS: usize = 6;

pub fn is_operator_method(name: &str) -> bool {
    OPERATOR_METHODS.contains(&name.trim_start_matches("self."))
}
