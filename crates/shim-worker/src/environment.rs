// ResolvedEnvironment: the explicit variable set handed from input resolution
// to every lifecycle script. Children receive a snapshot taken at spawn time,
// so writes made before a spawn are visible to that child and later ones.
//
// Names and values are kept as `OsString` so variables that are not valid
// Unicode still reach the children; string lookups only see Unicode values.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

use shim_common::constants::variables;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedEnvironment {
    vars: BTreeMap<OsString, OsString>,
}

impl ResolvedEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the current process environment, byte-for-byte.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars_os().collect(),
        }
    }

    /// The value of `name`, if it is set to valid Unicode.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_os(name).and_then(OsStr::to_str)
    }

    pub fn get_os(&self, name: &str) -> Option<&OsStr> {
        self.vars.get(OsStr::new(name)).map(OsString::as_os_str)
    }

    /// The value of `name` if it is set to something other than the empty string.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(OsStr::new(name))
    }

    pub fn set(&mut self, name: impl Into<OsString>, value: impl Into<OsString>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<OsString> {
        self.vars.remove(OsStr::new(name))
    }

    /// Mark the environment the way a hosted runner does for every process.
    /// Earlier values are overwritten.
    pub fn mark_as_ci(&mut self) {
        self.set(variables::GITHUB_ACTIONS, "true");
        self.set(variables::CI, "true");
    }

    /// Copy of the variables for a child process.
    pub fn snapshot(&self) -> BTreeMap<OsString, OsString> {
        self.vars.clone()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ResolvedEnvironment
where
    K: Into<OsString>,
    V: Into<OsString>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
