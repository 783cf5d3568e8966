use super::RuleSpec;
use crate::core::Severity;

/// The built-in literal rule table.
pub fn builtin_rules() -> Vec<RuleSpec> {
    vec![
        RuleSpec::new(
            "hardcoded-secret",
            r#"(?i)\b(?:password|passwd|secret|api_key|apikey|access_token|auth_token)\b\s*(?:=|:|=>)\s*["'][^"']{4,}["']"#,
            "SECURITY",
            Severity::Critical,
            "Hardcoded credential; load it from the environment or a secrets store",
        ),
        RuleSpec::new(
            "shell-interpolation",
            r#"\b(?:system|exec|spawn)\s*\(?\s*"[^"]*#\{"#,
            "SECURITY",
            Severity::Critical,
            "Shell command built from interpolated input",
        ),
        RuleSpec::new(
            "sql-interpolation",
            r#"\b(?:where|execute|find_by_sql|exec_query|select_all)\s*\(?\s*"[^"]*#\{"#,
            "SECURITY",
            Severity::Critical,
            "SQL assembled by string interpolation; use bound parameters",
        ),
        RuleSpec::new(
            "dynamic-eval",
            r"\b(?:eval|instance_eval|class_eval)\s*[\(\s]",
            "SECURITY",
            Severity::Error,
            "Dynamic evaluation of code",
        ),
        RuleSpec::new(
            "debugger-left-in",
            r"\bbinding\.pry\b|\bbyebug\b|^\s*debugger\b",
            "CLEAN_CODE",
            Severity::Error,
            "Debugger breakpoint left in code",
        ),
        RuleSpec::new(
            "rescue-exception",
            r"\brescue\s+Exception\b",
            "FAIL_FAST",
            Severity::Error,
            "Rescuing Exception also swallows interrupts and exits",
        ),
        RuleSpec::new(
            "network-without-timeout",
            r"Net::HTTP\.(?:get|post|start)|HTTParty\.(?:get|post|put|patch|delete)|Faraday\.new|URI\.open|RestClient\.",
            "RESILIENCE",
            Severity::Warning,
            "External call without a timeout",
        )
        .unless(r"(?i)timeout")
        .whole_text(),
        RuleSpec::new(
            "file-open-without-close",
            r"(?m)File\.open\([^)]*\)[ \t]*$",
            "RESOURCE_SAFETY",
            Severity::Error,
            "File opened without a block or an explicit close",
        )
        .unless(r"\.close\b")
        .whole_text(),
        RuleSpec::new(
            "global-variable",
            r"^\s*\$[a-z_]\w*\s*=[^=]",
            "ENCAPSULATION",
            Severity::Warning,
            "Global variable assignment",
        ),
        RuleSpec::new(
            "class-variable",
            r"@@\w+\s*(?:\|\|)?=[^=]",
            "ENCAPSULATION",
            Severity::Warning,
            "Class variable shared across the whole hierarchy",
        ),
        RuleSpec::new(
            "fixed-sleep",
            r"\bsleep\s*\(?\s*\d",
            "PERFORMANCE",
            Severity::Warning,
            "Fixed sleep; wait on a condition instead",
        ),
        RuleSpec::new(
            "magic-number",
            r"[=<>+*/,(]\s*\d{3,}\b",
            "MAGIC_NUMBER",
            Severity::Info,
            "Unexplained numeric literal; name it as a constant",
        )
        .unless(r"^\s*[A-Z][A-Z0-9_]*\s*="),
    ]
}
