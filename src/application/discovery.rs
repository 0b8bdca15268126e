// Discovery matcher - Infers runtime dashboards from observed metric names
use crate::domain::dashboard::{add_to_runtimes, Runtime};
use crate::domain::template::Template;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Per-template outcome of a discovery pass; unvisited templates have no entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiscoveryState {
    Matched,
    /// Included by a matching template, never emitted on its own
    Excluded,
}

/// Matches templates against observed metrics and groups the survivors by runtime.
///
/// Templates are examined in name order. A template matches when its trimmed
/// `discover_on` equals one of the trimmed metric names. Every template included
/// by a matching one is excluded, whether it matched before or matches later.
pub fn match_runtimes(metrics: &[String], templates: &BTreeMap<String, Template>) -> Vec<Runtime> {
    let observed: HashSet<&str> = metrics.iter().map(|m| m.trim()).collect();
    let mut states: HashMap<String, DiscoveryState> = HashMap::new();
    let mut matched_order: Vec<(&String, &Template)> = Vec::new();

    for (name, template) in templates {
        let discover_on = template.discover_on.trim();
        if discover_on.is_empty() || !observed.contains(discover_on) {
            continue;
        }
        if !states.contains_key(name) {
            states.insert(name.clone(), DiscoveryState::Matched);
            matched_order.push((name, template));
        }
        for included in template.included_templates() {
            tracing::debug!("Discovery: {} excluded, included by {}", included, name);
            states.insert(included, DiscoveryState::Excluded);
        }
    }

    let mut runtimes = Vec::new();
    for (name, template) in matched_order {
        if states.get(name) == Some(&DiscoveryState::Matched) {
            add_to_runtimes(&mut runtimes, template);
        }
    }
    runtimes.sort_by(|a, b| a.name.cmp(&b.name));
    runtimes
}
