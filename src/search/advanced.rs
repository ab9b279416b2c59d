use std::collections::HashSet;
use std::hash::Hash;

use crate::error::Result;
use crate::keys::{FixedKey, PositionalKey};
use crate::query::ast::{has_any_positive_criteria, QueryKind, QueryNode};
use crate::search::cancel::CancellationToken;
use crate::search::simple::{contains_all, contains_all_facets, contains_any, contains_any_tokens};
use crate::store::OrderedStore;

/// A probe candidate: a token to enumerate postings for, and whether it is
/// a facet self-reference (so enumeration must additionally check
/// `prev_token == token`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Probe {
    token: u64,
    is_facet: bool,
}

/// Structural recursion choosing which tokens' postings are cheap enough
/// to enumerate as probes. An empty result means "no cheap probe; the
/// caller must fall back to a full index scan".
fn find_probe_tokens(node: &QueryNode<u64>) -> Vec<Probe> {
    match node.kind {
        QueryKind::Not => Vec::new(),
        QueryKind::And => {
            if !node.tokens.is_empty() {
                let token = node.first_look_at.unwrap_or(node.tokens[0]);
                vec![Probe { token, is_facet: node.is_facet }]
            } else if !node.children.is_empty() {
                node.children
                    .iter()
                    .map(find_probe_tokens)
                    .filter(|probes| !probes.is_empty())
                    .min_by_key(|probes| probes.len())
                    .unwrap_or_default()
            } else {
                Vec::new()
            }
        }
        QueryKind::Or => {
            if !node.tokens.is_empty() {
                node.tokens.iter().map(|&token| Probe { token, is_facet: node.is_facet }).collect()
            } else if !node.children.is_empty() {
                if node.children.iter().any(|c| c.kind == QueryKind::Not) {
                    Vec::new()
                } else {
                    node.children.iter().flat_map(find_probe_tokens).collect()
                }
            } else {
                Vec::new()
            }
        }
    }
}

/// Recursively evaluates whether `record` satisfies `node`, opening a
/// fresh verification iterator for each leaf check.
fn matches<R: FixedKey>(store: &dyn OrderedStore, node: &QueryNode<u64>, record: R) -> Result<bool> {
    let result = match node.kind {
        QueryKind::And => {
            if !node.tokens.is_empty() {
                let mut iter = store.forward_iter()?;
                if node.is_facet {
                    contains_all_facets(&mut *iter, &node.tokens, record)
                } else {
                    contains_all(&mut *iter, &node.tokens, record, node.respect_token_order)
                }
            } else if !node.children.is_empty() {
                let mut all = true;
                for child in &node.children {
                    if !matches::<R>(store, child, record)? {
                        all = false;
                        break;
                    }
                }
                all
            } else {
                false
            }
        }
        QueryKind::Or => {
            if !node.tokens.is_empty() {
                let mut iter = store.forward_iter()?;
                if node.is_facet {
                    contains_any(&mut *iter, &node.tokens, record)
                } else {
                    contains_any_tokens(&mut *iter, &node.tokens, record)
                }
            } else if !node.children.is_empty() {
                let mut any = false;
                for child in &node.children {
                    if matches::<R>(store, child, record)? {
                        any = true;
                        break;
                    }
                }
                any
            } else {
                false
            }
        }
        QueryKind::Not => {
            if !node.tokens.is_empty() {
                let mut iter = store.forward_iter()?;
                if node.is_facet {
                    !contains_any(&mut *iter, &node.tokens, record)
                } else if node.respect_token_order {
                    !contains_all(&mut *iter, &node.tokens, record, true)
                } else {
                    !contains_any_tokens(&mut *iter, &node.tokens, record)
                }
            } else if !node.children.is_empty() {
                let mut none_match = true;
                for child in &node.children {
                    if matches::<R>(store, child, record)? {
                        none_match = false;
                        break;
                    }
                }
                none_match
            } else {
                false
            }
        }
    };
    Ok(result)
}

/// Evaluates an arbitrary Boolean/facet AST against the primary index,
/// applying pagination with the same de-dup discipline as the simple
/// executor, generalized over however many probe tokens are enumerated.
pub fn search<R: FixedKey + Eq + Hash>(
    store: &dyn OrderedStore,
    node: &QueryNode<u64>,
    skip: usize,
    limit: usize,
    cancel: &CancellationToken,
) -> Result<Vec<R>> {
    if !has_any_positive_criteria(node) {
        return full_scan(store, node, skip, limit, cancel);
    }

    let probes = find_probe_tokens(node);
    if probes.is_empty() {
        return Ok(Vec::new());
    }

    let mut results = Vec::new();
    let mut seen: HashSet<R> = HashSet::new();
    let mut off = 0usize;

    'probes: for probe in probes {
        let mut enumerator = store.forward_iter()?;
        enumerator.seek(&PositionalKey::<R>::token_prefix(probe.token));

        while let Some((key_bytes, _)) = enumerator.next() {
            if cancel.is_cancelled() {
                break 'probes;
            }
            if !PositionalKey::<R>::starts_with_token(&key_bytes, probe.token) {
                break;
            }

            let key = PositionalKey::<R>::decode(&key_bytes);
            if probe.is_facet && key.prev_token != probe.token {
                continue;
            }
            if !seen.insert(key.record) {
                continue;
            }
            if !matches::<R>(store, node, key.record)? {
                continue;
            }

            if off >= skip {
                results.push(key.record);
            }
            off += 1;
            if limit > 0 && off == skip + limit {
                break 'probes;
            }
        }
    }

    Ok(results)
}

fn full_scan<R: FixedKey + Eq + Hash>(
    store: &dyn OrderedStore,
    node: &QueryNode<u64>,
    skip: usize,
    limit: usize,
    cancel: &CancellationToken,
) -> Result<Vec<R>> {
    let mut results = Vec::new();
    let mut seen: HashSet<R> = HashSet::new();
    let mut off = 0usize;

    let mut iter = store.forward_iter()?;
    while let Some((key_bytes, _)) = iter.next() {
        if cancel.is_cancelled() {
            break;
        }
        let key = PositionalKey::<R>::decode(&key_bytes);
        if !seen.insert(key.record) {
            continue;
        }
        if !matches::<R>(store, node, key.record)? {
            continue;
        }
        if off >= skip {
            results.push(key.record);
        }
        off += 1;
        if limit > 0 && off == skip + limit {
            break;
        }
    }

    Ok(results)
}
