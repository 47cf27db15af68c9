//! Stable ordering of report columns and rows
//!
//! Default order is alphabetical (employees by last then first name). A saved
//! managing-partner layout overrides it: listed ids come first in saved order,
//! anything not yet listed follows in default order.

use super::Employee;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Persisted custom order for the managing-partner view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOrder {
    /// Employee ids, left to right
    pub employee_order: Vec<u64>,
    /// Client charge codes, top to bottom
    pub client_order: Vec<String>,
}

impl LayoutOrder {
    /// Append ids that are not yet listed, keeping everything already saved.
    /// Returns true when the layout changed and should be persisted.
    pub fn reconcile(&mut self, employee_ids: &[u64], client_codes: &[String]) -> bool {
        let added_employees = append_missing(&mut self.employee_order, employee_ids);
        let added_clients = append_missing(&mut self.client_order, client_codes);
        added_employees || added_clients
    }

    /// Replace the employee order outright (explicit save), dropping duplicates
    pub fn set_employee_order(&mut self, order: Vec<u64>) {
        self.employee_order = dedup(order);
    }

    pub fn set_client_order(&mut self, order: Vec<String>) {
        self.client_order = dedup(order);
    }
}

fn append_missing<K: Clone + Eq + Hash>(saved: &mut Vec<K>, current: &[K]) -> bool {
    let known: HashSet<K> = saved.iter().cloned().collect();
    let before = saved.len();
    let mut seen = HashSet::new();
    for key in current {
        if !known.contains(key) && seen.insert(key.clone()) {
            saved.push(key.clone());
        }
    }
    saved.len() != before
}

fn dedup<K: Clone + Eq + Hash>(order: Vec<K>) -> Vec<K> {
    let mut seen = HashSet::new();
    order.into_iter().filter(|k| seen.insert(k.clone())).collect()
}

/// Reorder `items` so keys listed in `saved` lead, in saved order. Items
/// whose key is not listed keep their incoming relative order at the end;
/// saved keys with no item are ignored.
pub fn apply_saved_order<T, K, F>(items: Vec<T>, saved: &[K], key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> &K,
{
    let rank: HashMap<&K, usize> = saved.iter().enumerate().map(|(i, k)| (k, i)).collect();
    let mut ranked: Vec<(usize, usize, T)> = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let r = rank.get(key(&item)).copied().unwrap_or(usize::MAX);
            (r, i, item)
        })
        .collect();
    ranked.sort_by_key(|(r, i, _)| (*r, *i));
    ranked.into_iter().map(|(_, _, item)| item).collect()
}

/// Alphabetical by last name, then first name, then id
pub fn sort_employees(employees: &mut [Employee]) {
    employees.sort_by(compare_employees);
}

pub fn compare_employees(a: &Employee, b: &Employee) -> Ordering {
    a.last_name
        .to_lowercase()
        .cmp(&b.last_name.to_lowercase())
        .then_with(|| a.first_name.to_lowercase().cmp(&b.first_name.to_lowercase()))
        .then_with(|| a.id.cmp(&b.id))
}
