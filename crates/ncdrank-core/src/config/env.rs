use std::str::FromStr;

use crate::error::Result;

/// Variable lookup seam; production passes `std::env::var`, tests pass a map.
pub(crate) trait EnvLookup {
    fn get(&self, name: &str) -> Option<String>;
}

impl<F> EnvLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        self(name)
    }
}

#[must_use]
pub(super) fn read_non_empty(env: &impl EnvLookup, name: &str) -> Option<String> {
    env.get(name)
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[must_use]
pub(super) fn read_usize(env: &impl EnvLookup, name: &str, default_value: usize) -> usize {
    env.get(name)
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .unwrap_or(default_value)
}

/// A signed count; `None` when missing or unparsable.
#[must_use]
pub(super) fn read_i64(env: &impl EnvLookup, name: &str) -> Option<i64> {
    env.get(name)
        .and_then(|raw| raw.trim().parse::<i64>().ok())
}

/// Unlike the numeric readers, a present-but-invalid value is an error: a
/// silently ignored codec or level would change every score.
pub(super) fn read_parsed<T>(env: &impl EnvLookup, name: &str) -> Result<Option<T>>
where
    T: FromStr<Err = crate::error::RankError>,
{
    read_non_empty(env, name)
        .map(|raw| raw.parse::<T>())
        .transpose()
}

#[cfg(test)]
pub(crate) fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
    let map = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect::<std::collections::HashMap<_, _>>();
    move |name: &str| map.get(name).cloned()
}
