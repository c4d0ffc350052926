//! Post-pass over a full discovery result that decides which mods can load.

use crate::config::DisabledMods;
use crate::models::descriptor::{DependencyRecord, ModDescriptor};
use crate::utils::version::satisfies;
use std::collections::HashMap;
use tracing::debug;

pub const DUPLICATE_ERROR: &str =
    "Another installation of this mod takes precedence; this copy will not be loaded.";
pub const FAULTY_DEPENDENCY_ERROR: &str =
    "A dependency of this mod is installed but has errors or is disabled.";

fn missing_message(missing: &[DependencyRecord]) -> String {
    let list = missing
        .iter()
        .map(|d| match d.version.trim() {
            "" | "*" => d.mod_id.clone(),
            v => format!("{} (v{} or newer)", d.mod_id, v),
        })
        .collect::<Vec<_>>()
        .join(", ");

    if missing.len() == 1 {
        format!("Missing dependency: {list}")
    } else {
        format!("Missing dependencies: {list}")
    }
}

/// Fills `load_error`, `missing_dependencies` and `dependency_has_errors`
/// for every descriptor. `mods` must be in discovery order.
pub fn apply(mods: &mut [ModDescriptor], disabled: &dyn DisabledMods) {
    for m in mods.iter_mut() {
        m.reset_load_status();
    }

    let providers = mark_duplicates(mods);

    // A mod failing can break mods that depend on it, so repeat until no
    // verdict changes. Each round can only add errors, so this terminates.
    for round in 0..=mods.len() {
        let mut changed = false;

        for i in 0..mods.len() {
            if mods[i].has_error() || mods[i].load_error.is_some() || mods[i].dependencies.is_empty() {
                continue;
            }

            let verdict = check_dependencies(mods, i, &providers, disabled);
            let m = &mut mods[i];
            match verdict {
                Verdict::Satisfied => {}
                Verdict::FaultyProvider => {
                    m.dependency_has_errors = true;
                    m.missing_dependencies.clear();
                    m.load_error = Some(FAULTY_DEPENDENCY_ERROR.to_string());
                    changed = true;
                }
                Verdict::Missing(missing) => {
                    m.load_error = Some(missing_message(&missing));
                    m.missing_dependencies = missing;
                    changed = true;
                }
            }
        }

        if !changed {
            debug!(rounds = round + 1, "Load status settled");
            break;
        }
    }
}

/// Picks one primary per mod id (first in order without a parse error) and
/// flags every other sibling. Returns the index that answers dependency
/// lookups for each lowercase id.
fn mark_duplicates(mods: &mut [ModDescriptor]) -> HashMap<String, usize> {
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, m) in mods.iter().enumerate() {
        groups.entry(m.mod_id.to_lowercase()).or_default().push(i);
    }

    let mut providers = HashMap::with_capacity(groups.len());
    for (id, members) in groups {
        let primary = members.iter().copied().find(|&i| !mods[i].has_error());

        if let Some(primary) = primary {
            for &i in members.iter().filter(|&&i| i != primary) {
                mods[i].load_error = Some(DUPLICATE_ERROR.to_string());
            }
        }

        // With no clean copy the first one still stands in as the provider,
        // so dependents report it as faulty rather than missing.
        providers.insert(id, primary.unwrap_or(members[0]));
    }
    providers
}

enum Verdict {
    Satisfied,
    FaultyProvider,
    Missing(Vec<DependencyRecord>),
}

fn check_dependencies(
    mods: &[ModDescriptor],
    index: usize,
    providers: &HashMap<String, usize>,
    disabled: &dyn DisabledMods,
) -> Verdict {
    let mut missing = Vec::new();

    for dep in mods[index].dependencies.iter().filter(|d| !d.is_core) {
        let Some(&p) = providers.get(&dep.mod_id.to_lowercase()) else {
            missing.push(dep.clone());
            continue;
        };
        let provider = &mods[p];

        if provider.has_error()
            || provider.load_error.is_some()
            || disabled.is_disabled(&provider.mod_id, provider.version.as_deref())
        {
            return Verdict::FaultyProvider;
        }

        if !satisfies(provider.version.as_deref(), &dep.version) {
            missing.push(dep.clone());
        }
    }

    if missing.is_empty() {
        Verdict::Satisfied
    } else {
        Verdict::Missing(missing)
    }
}
