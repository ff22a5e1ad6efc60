/// Variable holding the `tracing` filter directives.
pub const LOG_VAR: &str = "LC3VM_LOG";
/// Variable which forces minimal output when set to `1`.
pub const MINIMAL_VAR: &str = "LC3VM_MINIMAL";

/// Settings taken from the process environment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Env {
    pub log_filter: Option<String>,
    pub minimal: bool,
}

impl Env {
    pub fn from_process() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup, eg. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            log_filter: lookup(LOG_VAR).filter(|v| !v.is_empty()),
            minimal: lookup(MINIMAL_VAR).is_some_and(|v| v == "1"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(vars: &[(&str, &str)]) -> Env {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Env::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn unset_variables_give_defaults() {
        assert_eq!(env_of(&[]), Env::default());
    }

    #[test]
    fn reads_filter_and_minimal() {
        let env = env_of(&[(LOG_VAR, "lc3vm=trace"), (MINIMAL_VAR, "1")]);
        assert_eq!(env.log_filter.as_deref(), Some("lc3vm=trace"));
        assert!(env.minimal);
    }

    #[test]
    fn minimal_only_when_exactly_one() {
        assert!(!env_of(&[(MINIMAL_VAR, "true")]).minimal);
        assert!(!env_of(&[(MINIMAL_VAR, "")]).minimal);
    }

    #[test]
    fn empty_filter_is_ignored() {
        assert_eq!(env_of(&[(LOG_VAR, "")]).log_filter, None);
    }
}
