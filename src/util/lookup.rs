//! Required-key lookups.
//!
//! Index lookups that must succeed go through [`Require::require`], which
//! reports the map and key on absence. Lookups where absence is expected
//! (unresolved requires, unknown classes) use plain `get`.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::hash::Hash;

use thiserror::Error;

/// A lookup that was required to succeed did not.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("missing key {key} in {map}")]
    NotFound { map: &'static str, key: String },
}

/// Map lookup that fails with [`LookupError::NotFound`].
pub trait Require<K: ?Sized, V> {
    fn require(&self, map: &'static str, key: &K) -> Result<&V, LookupError>;
}

impl<Q, K, V> Require<Q, V> for BTreeMap<K, V>
where
    K: Borrow<Q> + Ord,
    Q: Ord + Debug + ?Sized,
{
    fn require(&self, map: &'static str, key: &Q) -> Result<&V, LookupError> {
        self.get(key).ok_or_else(|| LookupError::NotFound {
            map,
            key: format!("{:?}", key),
        })
    }
}

impl<Q, K, V> Require<Q, V> for HashMap<K, V>
where
    K: Borrow<Q> + Eq + Hash,
    Q: Eq + Hash + Debug + ?Sized,
{
    fn require(&self, map: &'static str, key: &Q) -> Result<&V, LookupError> {
        self.get(key).ok_or_else(|| LookupError::NotFound {
            map,
            key: format!("{:?}", key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_present_and_missing() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), 1);

        assert_eq!(map.require("libraries", "a"), Ok(&1));
        assert_eq!(
            map.require("libraries", "b"),
            Err(LookupError::NotFound {
                map: "libraries",
                key: "\"b\"".to_string()
            })
        );
    }

    #[test]
    fn test_require_on_hash_map() {
        let mut map = HashMap::new();
        map.insert(3u32, "x");
        let err = map.require("nodes", &4u32).unwrap_err();
        assert_eq!(err.to_string(), "missing key 4 in nodes");
    }
}
