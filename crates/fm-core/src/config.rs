use std::sync::OnceLock;

const STRICT_ENUMS_VAR: &str = "FERROMAP_STRICT_ENUMS";
const SEQUENTIAL_VAR: &str = "FERROMAP_SEQUENTIAL";

fn env_true(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|val| {
        let trimmed = val.trim();
        !trimmed.is_empty() && !matches!(trimmed, "0" | "false" | "FALSE" | "False")
    })
}

fn bool_from_env(key: &str) -> bool {
    env_true(key).unwrap_or(false)
}

/// Unmapped enum members fail resolution instead of deferring to a runtime error.
pub fn strict_enum_mode() -> bool {
    static STRICT: OnceLock<bool> = OnceLock::new();
    *STRICT.get_or_init(|| bool_from_env(STRICT_ENUMS_VAR))
}

/// Resolve independent mapper declarations one after another.
pub fn sequential_mode() -> bool {
    static SEQUENTIAL: OnceLock<bool> = OnceLock::new();
    *SEQUENTIAL.get_or_init(|| bool_from_env(SEQUENTIAL_VAR))
}
