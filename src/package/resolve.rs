//! Canonical package resolution across layered repositories.

use super::{PackageRecord, Repository};

/// Follow an alias chain until a canonical record is reached.
///
/// Resolving an already-canonical record returns it unchanged. A dangling
/// alias (target name absent from the repository) resolves to the alias
/// itself, best-effort. Alias cycles are malformed input and are not
/// detected here.
pub fn resolve_canonical<'a>(
    repository: &'a dyn Repository,
    record: &'a PackageRecord,
) -> &'a PackageRecord {
    let mut current = record;
    while let Some(target) = current.alias_of() {
        let matches = repository.find_packages(target);
        let next = matches
            .iter()
            .find(|candidate| !candidate.is_alias())
            .or_else(|| matches.first())
            .copied();
        match next {
            Some(next) => current = next,
            None => break,
        }
    }
    current
}

/// All canonical records matching `name`, in first-seen order.
///
/// Matches are grouped by declared name; for each group the first non-alias
/// record wins, or the first record overall when every match is an alias.
/// The kept record is then resolved through its alias chain.
pub fn canonical_packages<'a>(
    repository: &'a dyn Repository,
    name: &str,
) -> Vec<&'a PackageRecord> {
    struct Group<'a> {
        name: &'a str,
        pick: &'a PackageRecord,
    }

    let mut groups: Vec<Group<'a>> = Vec::new();
    for record in repository.find_packages(name) {
        match groups.iter_mut().find(|group| group.name == record.name()) {
            Some(group) => {
                if group.pick.is_alias() && !record.is_alias() {
                    group.pick = record;
                }
            }
            None => groups.push(Group {
                name: record.name(),
                pick: record,
            }),
        }
    }

    groups
        .into_iter()
        .map(|group| resolve_canonical(repository, group.pick))
        .collect()
}

/// The first canonical record matching `name`, if any.
pub fn find_package<'a>(repository: &'a dyn Repository, name: &str) -> Option<&'a PackageRecord> {
    canonical_packages(repository, name).into_iter().next()
}
