//! Menu reference resolution.
//!
//! Agents point at workflows and tasks with free-form path strings. The
//! resolver maps each of them to the identifier of the entity it names, so
//! an agent can be granted exactly the skills its menu invokes.

use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use indexmap::map::Entry;
use regex::Regex;
use tracing::debug;

use bmadconv_shared::{Agent, CanonicalId, Task, Workflow, normalize};

/// Root token a reference may start with.
const PROJECT_ROOT_TOKEN: &str = "{project-root}/";

/// The skills one agent may invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipRecord {
    pub agent: CanonicalId,
    /// Resolved menu references, first-seen order, no duplicates.
    pub owned: Vec<CanonicalId>,
}

/// Lookup from reference keys to identifiers, built once per run.
#[derive(Debug, Clone, Default)]
pub struct ReferenceResolver {
    lookup: IndexMap<String, CanonicalId>,
}

impl ReferenceResolver {
    /// Index every workflow, then every task, by manifest path and by name.
    ///
    /// On a key collision the entity inserted first keeps the key.
    pub fn new(workflows: &[Workflow], tasks: &[Task]) -> Self {
        let mut resolver = Self::default();

        for wf in workflows {
            let id = wf.canonical_id();
            resolver.insert(&wf.path, &id);
            resolver.insert(&wf.name, &id);
        }
        for task in tasks {
            let id = task.canonical_id();
            resolver.insert(&task.path, &id);
            resolver.insert(&task.name, &id);
        }

        debug!(keys = resolver.lookup.len(), "reference lookup built");
        resolver
    }

    fn insert(&mut self, key: &str, id: &CanonicalId) {
        if key.is_empty() {
            return;
        }
        match self.lookup.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(id.clone());
            }
            Entry::Occupied(slot) if slot.get() != id => {
                debug!(key, kept = %slot.get(), dropped = %id, "reference key collision");
            }
            Entry::Occupied(_) => {}
        }
    }

    /// Map one reference string to an identifier, or `None` when nothing
    /// matches.
    ///
    /// Rules, first match wins:
    /// 1. exact key
    /// 2. exact key after stripping `{project-root}/`
    /// 3. `…/workflows/…/{dir}/workflow*.{md,yaml,yml}` → `dir`, fuzzy
    /// 4. `…/tasks/{name}.{md,xml,yaml,yml}` → `name`, fuzzy
    /// 5. file basename without extension, fuzzy
    pub fn resolve(&self, reference: &str) -> Option<CanonicalId> {
        static WORKFLOW_DIR_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"(?:^|/)workflows/(?:.*/)?([^/]+)/workflow[^/]*\.(?:md|ya?ml)$")
                .expect("valid regex")
        });
        static TASK_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"(?:^|/)tasks/([^/]+)\.(?:md|xml|ya?ml)$").expect("valid regex")
        });

        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }

        if let Some(id) = self.lookup.get(reference) {
            return Some(id.clone());
        }

        let stripped = reference.strip_prefix(PROJECT_ROOT_TOKEN).unwrap_or(reference);
        if let Some(id) = self.lookup.get(stripped) {
            return Some(id.clone());
        }

        let captured = |re: &LazyLock<Regex>| {
            re.captures(stripped)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str())
        };

        if let Some(dir) = captured(&WORKFLOW_DIR_RE) {
            if let Some(id) = self.fuzzy(dir) {
                return Some(id);
            }
        }
        if let Some(name) = captured(&TASK_FILE_RE) {
            if let Some(id) = self.fuzzy(name) {
                return Some(id);
            }
        }

        let stem = Path::new(stripped).file_stem().and_then(|s| s.to_str());
        let found = stem.and_then(|s| self.fuzzy(s));
        if found.is_none() {
            debug!(reference, "unresolved menu reference dropped");
        }
        found
    }

    /// First key, in insertion order, whose normalized form equals the
    /// normalized `candidate`.
    fn fuzzy(&self, candidate: &str) -> Option<CanonicalId> {
        let wanted = normalize(candidate);
        if wanted.is_empty() {
            return None;
        }
        self.lookup
            .iter()
            .find(|(key, _)| normalize(key) == wanted)
            .map(|(_, id)| id.clone())
    }

    /// Resolve every menu reference of `agent`.
    pub fn ownership(&self, agent: &Agent) -> OwnershipRecord {
        let mut owned: Vec<CanonicalId> = Vec::new();

        for item in &agent.menu {
            let Some(reference) = &item.reference else {
                continue;
            };
            if let Some(id) = self.resolve(&reference.target) {
                if !owned.contains(&id) {
                    owned.push(id);
                }
            }
        }

        OwnershipRecord {
            agent: agent.canonical_id(),
            owned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmadconv_shared::{MenuItem, MenuRef, RefKind};
    use pretty_assertions::assert_eq;

    fn workflow(module: &str, name: &str, path: &str) -> Workflow {
        Workflow {
            name: name.into(),
            module: module.into(),
            path: path.into(),
            ..Workflow::default()
        }
    }

    fn task(module: &str, name: &str, path: &str) -> Task {
        Task {
            name: name.into(),
            module: module.into(),
            path: path.into(),
            ..Task::default()
        }
    }

    fn resolver() -> ReferenceResolver {
        ReferenceResolver::new(
            &[
                workflow("core", "brainstorming", "_bmad/core/workflows/brainstorming/workflow.md"),
                workflow("bmm", "create-prd", "_bmad/bmm/workflows/2-plan/prd/workflow.yaml"),
                workflow("bmm", "review", "_bmad/bmm/workflows/review/workflow.yaml"),
            ],
            &[
                task("core", "index-docs", "_bmad/core/tasks/index-docs.xml"),
                task("bmm", "other", "_bmad/core/tasks/review.xml"),
            ],
        )
    }

    fn id(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    fn resolve(r: &ReferenceResolver, reference: &str) -> Option<String> {
        r.resolve(reference).map(|id| id.to_string())
    }

    #[test]
    fn exact_and_project_root_paths() {
        let r = resolver();
        assert_eq!(
            resolve(&r, "_bmad/core/workflows/brainstorming/workflow.md"),
            id("bmad-brainstorming")
        );
        assert_eq!(
            resolve(&r, "{project-root}/_bmad/core/tasks/index-docs.xml"),
            id("bmad-task-index-docs")
        );
        assert_eq!(resolve(&r, "create-prd"), id("bmad-bmm-create-prd"));
    }

    #[test]
    fn workflow_directory_pattern() {
        let r = resolver();
        // Directory `prd` does not name the workflow; `Brainstorming` does.
        assert_eq!(
            resolve(&r, "{project-root}/_bmad/core/workflows/x/Brainstorming/workflow.yaml"),
            id("bmad-brainstorming")
        );
        assert_eq!(
            resolve(&r, "_bmad/bmm/workflows/create_prd/workflow-v2.md"),
            id("bmad-bmm-create-prd")
        );
    }

    #[test]
    fn task_pattern_and_basename_fallback() {
        let r = resolver();
        assert_eq!(resolve(&r, "/elsewhere/tasks/Index_Docs.md"), id("bmad-task-index-docs"));
        assert_eq!(resolve(&r, "docs/index-docs.txt"), id("bmad-task-index-docs"));
    }

    #[test]
    fn exact_path_beats_fuzzy_name() {
        let r = resolver();
        // The task pattern would yield `review`, which fuzzily names the
        // workflow inserted earlier; the exact path names the task.
        assert_eq!(resolve(&r, "_bmad/core/tasks/review.xml"), id("bmad-bmm-task-other"));
        assert_eq!(resolve(&r, "_bmad/elsewhere/tasks/review.xml"), id("bmad-bmm-review"));
    }

    #[test]
    fn unknown_references_are_dropped() {
        let r = resolver();
        assert_eq!(resolve(&r, "todo"), None);
        assert_eq!(resolve(&r, ""), None);
        assert_eq!(resolve(&r, "{project-root}/"), None);
    }

    #[test]
    fn first_inserted_key_wins() {
        let r = ReferenceResolver::new(
            &[workflow("core", "party", "a/workflow.md"), workflow("bmm", "party", "b/workflow.md")],
            &[],
        );
        assert_eq!(resolve(&r, "party"), id("bmad-party"));
        assert_eq!(resolve(&r, "b/workflow.md"), id("bmad-bmm-party"));
    }

    #[test]
    fn ownership_is_deduplicated_in_menu_order() {
        let r = resolver();
        let item = |kind, target: &str| MenuItem {
            reference: Some(MenuRef {
                kind,
                target: target.into(),
            }),
            ..MenuItem::default()
        };
        let agent = Agent {
            name: "analyst".into(),
            module: "bmm".into(),
            menu: vec![
                item(RefKind::Exec, "{project-root}/_bmad/core/tasks/index-docs.xml"),
                MenuItem::default(),
                item(RefKind::Workflow, "todo"),
                item(RefKind::Workflow, "_bmad/bmm/workflows/2-plan/prd/workflow.yaml"),
                item(RefKind::Exec, "_bmad/core/tasks/index-docs.xml"),
            ],
            ..Agent::default()
        };

        let record = r.ownership(&agent);
        assert_eq!(record.agent.as_str(), "bmad-bmm-analyst");
        let owned: Vec<_> = record.owned.iter().map(CanonicalId::as_str).collect();
        assert_eq!(owned, vec!["bmad-task-index-docs", "bmad-bmm-create-prd"]);
    }
}
