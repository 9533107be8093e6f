//! Parameter-signature merging.

use ns_core::{Error, Result};
use std::collections::HashMap;

/// Merge the parameter lists of several terms.
///
/// Returns the first-occurrence-ordered union of all names and, for each term,
/// the position of each of its parameters in the union. Gathering
/// `args[map[k]]` for `k` in order reproduces the argument vector of that term.
pub fn merge_signatures<'a, I>(terms: I) -> (Vec<String>, Vec<Vec<usize>>)
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut names: Vec<String> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let maps = terms
        .into_iter()
        .map(|term| {
            term.iter()
                .map(|name| {
                    *index.entry(name.as_str()).or_insert_with(|| {
                        names.push(name.clone());
                        names.len() - 1
                    })
                })
                .collect()
        })
        .collect();
    (names, maps)
}

/// Reject a signature with repeated names.
pub(crate) fn unique_names(names: Vec<String>) -> Result<Vec<String>> {
    let mut seen = HashMap::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        if let Some(first) = seen.insert(name.as_str(), i) {
            return Err(Error::Validation(format!(
                "duplicate parameter name '{name}' at positions {first} and {i}"
            )));
        }
    }
    Ok(names)
}

/// Require one argument per parameter.
pub(crate) fn check_args(args: &[f64], names: &[String]) -> Result<()> {
    if args.len() != names.len() {
        return Err(Error::Validation(format!(
            "expected {} arguments ({}), got {}",
            names.len(),
            names.join(", "),
            args.len()
        )));
    }
    Ok(())
}
