use xxhash_rust::xxh64::xxh64;

/// A design principle the model-assisted conceptual pass can be asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principle {
    pub id: &'static str,
    pub question: &'static str,
}

pub const CONCEPTUAL_PRINCIPLES: &[Principle] = &[
    Principle {
        id: "SRP",
        question: "Does any class or method have more than one reason to change?",
    },
    Principle {
        id: "OCP",
        question: "Would adding a new variant require editing existing conditionals?",
    },
    Principle {
        id: "LSP",
        question: "Do subclasses weaken preconditions or break the parent's contract?",
    },
    Principle {
        id: "ISP",
        question: "Are callers forced to depend on methods they never use?",
    },
    Principle {
        id: "DIP",
        question: "Do high-level policies instantiate low-level details directly?",
    },
    Principle {
        id: "DRY",
        question: "Is the same knowledge encoded in more than one place?",
    },
    Principle {
        id: "KISS",
        question: "Is there indirection or cleverness the problem does not need?",
    },
    Principle {
        id: "YAGNI",
        question: "Is there speculative generality with no current caller?",
    },
    Principle {
        id: "LAW_OF_DEMETER",
        question: "Does code reach through collaborators to their collaborators?",
    },
    Principle {
        id: "TELL_DONT_ASK",
        question: "Does code query an object's state and then decide on its behalf?",
    },
    Principle {
        id: "COMPOSITION_OVER_INHERITANCE",
        question: "Is inheritance used only to share code rather than to model substitution?",
    },
    Principle {
        id: "FAIL_FAST",
        question: "Are invalid states tolerated and carried forward instead of rejected early?",
    },
];

/// Pick `count` principles deterministically for `seed`.
///
/// Principles are ranked by a seeded hash of their id, so the same seed always
/// yields the same subset while different seeds rotate coverage.
pub fn sample_principles(count: usize, seed: u64) -> Vec<Principle> {
    let mut ranked: Vec<(u64, Principle)> = CONCEPTUAL_PRINCIPLES
        .iter()
        .map(|p| (xxh64(p.id.as_bytes(), seed), *p))
        .collect();
    ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(b.1.id)));
    ranked.into_iter().take(count).map(|(_, p)| p).collect()
}

pub fn find_principle(id: &str) -> Option<Principle> {
    CONCEPTUAL_PRINCIPLES
        .iter()
        .find(|p| p.id.eq_ignore_ascii_case(id))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_is_deterministic_per_seed() {
        assert_eq!(sample_principles(3, 7), sample_principles(3, 7));
        assert_eq!(sample_principles(3, 7).len(), 3);
    }

    #[test]
    fn sampling_never_repeats_and_caps_at_catalog_size() {
        let all = sample_principles(100, 1);
        assert_eq!(all.len(), CONCEPTUAL_PRINCIPLES.len());
        let mut ids: Vec<_> = all.iter().map(|p| p.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), CONCEPTUAL_PRINCIPLES.len());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(find_principle("dry").map(|p| p.id), Some("DRY"));
        assert!(find_principle("NOPE").is_none());
    }
}
