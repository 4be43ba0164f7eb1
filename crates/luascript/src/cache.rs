//! Process-wide output cache.
//!
//! Keyed by a fingerprint of the source text plus every option that
//! affects the output. Readers take the lock shared; writers are
//! serialized. The cache stores finished output strings only; IR is
//! never cached.

use std::hash::{Hash, Hasher};
use std::sync::RwLock;

use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHasher};

use crate::options::TranspileOptions;

static CACHE: Lazy<RwLock<FxHashMap<u64, String>>> =
    Lazy::new(|| RwLock::new(FxHashMap::default()));

/// Fingerprint of a source string under the output-relevant options.
pub fn fingerprint(source: &str, options: &TranspileOptions) -> u64 {
    let mut hasher = FxHasher::default();
    source.hash(&mut hasher);
    options.include_runtime.hash(&mut hasher);
    options.use_canonical_ir.hash(&mut hasher);
    options.validate_lua_balance.hash(&mut hasher);
    options.indent.hash(&mut hasher);
    hasher.finish()
}

/// Look up a cached output.
pub fn lookup(key: u64) -> Option<String> {
    let cache = CACHE.read().unwrap_or_else(|poisoned| poisoned.into_inner());
    cache.get(&key).cloned()
}

/// Store a finished output.
pub fn store(key: u64, code: &str) {
    let mut cache = CACHE
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    cache.insert(key, code.to_string());
}

/// Drop every cached entry. Intended for tests and teardown.
pub fn clear() {
    let mut cache = CACHE
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    cache.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_depends_on_source_and_options() {
        let defaults = TranspileOptions::default();
        let a = fingerprint("let x = 1;", &defaults);
        let b = fingerprint("let x = 2;", &defaults);
        assert_ne!(a, b);

        let no_runtime = TranspileOptions {
            include_runtime: false,
            ..TranspileOptions::default()
        };
        assert_ne!(a, fingerprint("let x = 1;", &no_runtime));

        // The filename does not affect the output, so it must not affect
        // the key either.
        let named = TranspileOptions {
            filename: Some("a.ls".to_string()),
            ..TranspileOptions::default()
        };
        assert_eq!(a, fingerprint("let x = 1;", &named));
    }

    #[test]
    fn store_then_lookup() {
        let key = fingerprint("store_then_lookup unique source", &TranspileOptions::default());
        assert!(lookup(key).is_none());
        store(key, "local x = 1\n");
        assert_eq!(lookup(key).as_deref(), Some("local x = 1\n"));
    }
}
