use once_cell::sync::Lazy;
use regex::Regex;

/// File, network and persistence calls that are expensive to repeat per iteration.
pub static IO_OPERATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"File\.(?:read|write|open|readlines|foreach)\b|IO\.\w+|Net::HTTP|HTTParty\.|Faraday\.|\.(?:save|update|create|destroy|delete|insert|reload)!?(?:\(|\s|$)|\.(?:find|find_by|where|execute|query)\b",
    )
    .unwrap()
});

/// Single-record persistence calls; several in a row suggest a missing bulk operation.
pub static SAVE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.(?:save|update|insert|create|update_attribute)!?(?:\(|\s|$)").unwrap()
});

/// Iterator with a brace block on one line: `rows.each { |r| r.save }`.
pub static INLINE_LOOP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\.(?:each|each_with_index|each_with_object|map|flat_map|select|reject|times|find_each)\s*\{",
    )
    .unwrap()
});

/// Sequential save-like calls at or above this count are reported.
pub const MIN_SEQUENTIAL_SAVES: usize = 3;
