use crate::error::Result;
use crate::keys::{FixedKey, PositionalKey, START_OF_RECORD};
use crate::search::cancel::CancellationToken;
use crate::store::{KvIterator, OrderedStore};

/// Verifies that `record` carries every token in `tokens`, seeking a fresh
/// position in `iter` for each one. When `respect_order` is set, each
/// token after the first must chain through `prev_token` to the token
/// before it; otherwise only token+record presence is required.
pub(crate) fn contains_all<R: FixedKey>(iter: &mut dyn KvIterator, tokens: &[u64], record: R, respect_order: bool) -> bool {
    let mut prev: Option<u64> = None;

    for &token in tokens {
        let seek_prev = if respect_order { prev.unwrap_or(START_OF_RECORD) } else { START_OF_RECORD };
        let seek_key = PositionalKey::<R>::new(token, record, seek_prev).encode();
        iter.seek(&seek_key);

        match iter.next() {
            Some((key_bytes, _)) => {
                if !PositionalKey::<R>::starts_with_token_record(&key_bytes, token, record) {
                    return false;
                }
                if respect_order {
                    if let Some(expected_prev) = prev {
                        let decoded = PositionalKey::<R>::decode(&key_bytes);
                        if decoded.prev_token != expected_prev {
                            return false;
                        }
                    }
                }
            }
            None => return false,
        }

        if respect_order {
            prev = Some(token);
        }
    }

    true
}

/// Verifies that `record` carries at least one of `facets`, via the facet
/// self-reference `(f, record, f)`.
pub(crate) fn contains_any<R: FixedKey>(iter: &mut dyn KvIterator, facets: &[u64], record: R) -> bool {
    for &facet in facets {
        let key = PositionalKey::<R>::new(facet, record, facet).encode();
        iter.seek(&key);
        if let Some((key_bytes, _)) = iter.next() {
            if key_bytes == key {
                return true;
            }
        }
    }
    false
}

/// Facet conjunction: every facet in `tokens` must be present via its
/// self-reference `(t, record, t)`.
pub(crate) fn contains_all_facets<R: FixedKey>(iter: &mut dyn KvIterator, tokens: &[u64], record: R) -> bool {
    for &token in tokens {
        let key = PositionalKey::<R>::new(token, record, token).encode();
        iter.seek(&key);
        match iter.next() {
            Some((key_bytes, _)) if key_bytes == key => {}
            _ => return false,
        }
    }
    true
}

/// Plain (non-facet) disjunction: true if any of `tokens` occurs anywhere
/// in `record`, regardless of its `prev_token`.
pub(crate) fn contains_any_tokens<R: FixedKey>(iter: &mut dyn KvIterator, tokens: &[u64], record: R) -> bool {
    for &token in tokens {
        let seek_key = PositionalKey::<R>::token_record_prefix(token, record);
        iter.seek(&seek_key);
        if let Some((key_bytes, _)) = iter.next() {
            if PositionalKey::<R>::starts_with_token_record(&key_bytes, token, record) {
                return true;
            }
        }
    }
    false
}

/// Conjunctive token search with an optional disjunctive facet filter and
/// pagination. See the module-level probe-and-verify algorithm used
/// throughout this crate's search executors.
#[allow(clippy::too_many_arguments)]
pub fn simple_search<R: FixedKey>(
    store: &dyn OrderedStore,
    tokens: &[u64],
    first_look_at: Option<u64>,
    respect_order: bool,
    facets: &[u64],
    skip: usize,
    limit: usize,
    cancel: &CancellationToken,
) -> Result<Vec<R>> {
    if tokens.is_empty() && facets.is_empty() {
        return Ok(Vec::new());
    }

    let facet_only = tokens.is_empty();
    let probe = first_look_at.unwrap_or_else(|| if facet_only { facets[0] } else { tokens[0] });

    let mut enumerator = store.forward_iter()?;
    enumerator.seek(&PositionalKey::<R>::token_prefix(probe));

    let mut results = Vec::new();
    let mut last_record: Option<R> = None;
    let mut off = 0usize;

    while let Some((key_bytes, _)) = enumerator.next() {
        if cancel.is_cancelled() {
            break;
        }
        if !PositionalKey::<R>::starts_with_token(&key_bytes, probe) {
            break;
        }

        let key = PositionalKey::<R>::decode(&key_bytes);
        if last_record == Some(key.record) {
            continue;
        }
        last_record = Some(key.record);

        if facet_only {
            if key.prev_token != probe {
                continue;
            }
        } else {
            let mut verifier = store.forward_iter()?;
            if !contains_all(&mut *verifier, tokens, key.record, respect_order) {
                continue;
            }
            if !facets.is_empty() {
                let mut facet_verifier = store.forward_iter()?;
                if !contains_any(&mut *facet_verifier, facets, key.record) {
                    continue;
                }
            }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LIVE;

    struct FakeStore {
        entries: Vec<(Vec<u8>, u8)>,
    }

    struct FakeIter {
        entries: Vec<(Vec<u8>, u8)>,
        pos: usize,
    }

    impl KvIterator for FakeIter {
        fn seek(&mut self, key: &[u8]) {
            self.pos = self.entries.partition_point(|(k, _)| k.as_slice() < key);
        }

        fn next(&mut self) -> Option<(Vec<u8>, u8)> {
            let item = self.entries.get(self.pos).cloned();
            if item.is_some() {
                self.pos += 1;
            }
            item
        }
    }

    impl OrderedStore for FakeStore {
        fn upsert(&self, _key: &[u8], _value: u8) -> Result<()> {
            unimplemented!()
        }
        fn try_add(&self, _key: &[u8], _value: u8) -> Result<bool> {
            unimplemented!()
        }
        fn force_delete(&self, _key: &[u8]) -> Result<()> {
            unimplemented!()
        }
        fn try_get(&self, _key: &[u8]) -> Result<Option<u8>> {
            unimplemented!()
        }
        fn forward_iter(&self) -> Result<Box<dyn KvIterator>> {
            Ok(Box::new(FakeIter { entries: self.entries.clone(), pos: 0 }))
        }
        fn reverse_iter(&self) -> Result<Box<dyn KvIterator>> {
            unimplemented!()
        }
        fn evict_to_disk(&self) -> Result<()> {
            unimplemented!()
        }
        fn try_cancel_background_threads(&self) {}
        fn wait_for_background_threads(&self) {}
        fn destroy(&self) -> Result<()> {
            unimplemented!()
        }
        fn is_read_only(&self) -> bool {
            false
        }
        fn set_read_only(&self, _read_only: bool) {}
    }

    fn make_store(entries: Vec<((u64, u64, u64), u8)>) -> FakeStore {
        let mut entries: Vec<(Vec<u8>, u8)> =
            entries.into_iter().map(|((t, r, p), v)| (PositionalKey::<u64>::new(t, r, p).encode(), v)).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        FakeStore { entries }
    }

    const FOX: u64 = 10;
    const COW: u64 = 20;
    const CAT: u64 = 30;

    #[test]
    fn finds_record_by_single_token() {
        let store = make_store(vec![((FOX, 1, START_OF_RECORD), LIVE)]);
        let cancel = CancellationToken::new();
        let result = simple_search::<u64>(&store, &[FOX], None, false, &[], 0, 0, &cancel).unwrap();
        assert_eq!(result, vec![1]);
    }

    #[test]
    fn conjunctive_search_requires_all_tokens() {
        let store = make_store(vec![
            ((FOX, 2, START_OF_RECORD), LIVE),
            ((COW, 2, FOX), LIVE),
            ((CAT, 2, COW), LIVE),
            ((FOX, 3, START_OF_RECORD), LIVE),
        ]);
        let cancel = CancellationToken::new();
        let result = simple_search::<u64>(&store, &[FOX, COW], None, false, &[], 0, 0, &cancel).unwrap();
        assert_eq!(result, vec![2]);
    }

    #[test]
    fn respects_token_order_when_requested() {
        let store = make_store(vec![
            ((FOX, 2, START_OF_RECORD), LIVE),
            ((COW, 2, FOX), LIVE),
            ((CAT, 3, START_OF_RECORD), LIVE),
            ((FOX, 3, CAT), LIVE),
        ]);
        let cancel = CancellationToken::new();
        let ordered = simple_search::<u64>(&store, &[FOX, COW], None, true, &[], 0, 0, &cancel).unwrap();
        assert_eq!(ordered, vec![2]);
    }

    #[test]
    fn facet_only_search_uses_self_reference() {
        let facet = 999u64;
        let store = make_store(vec![((facet, 3, facet), LIVE)]);
        let cancel = CancellationToken::new();
        let result = simple_search::<u64>(&store, &[], None, false, &[facet], 0, 0, &cancel).unwrap();
        assert_eq!(result, vec![3]);
    }

    #[test]
    fn pagination_skips_and_limits() {
        let store = make_store(vec![
            ((FOX, 1, START_OF_RECORD), LIVE),
            ((FOX, 2, START_OF_RECORD), LIVE),
            ((FOX, 3, START_OF_RECORD), LIVE),
        ]);
        let cancel = CancellationToken::new();
        let result = simple_search::<u64>(&store, &[FOX], None, false, &[], 1, 1, &cancel).unwrap();
        assert_eq!(result, vec![2]);
    }

    #[test]
    fn empty_tokens_and_facets_return_empty() {
        let store = make_store(vec![]);
        let cancel = CancellationToken::new();
        let result = simple_search::<u64>(&store, &[], None, false, &[], 0, 0, &cancel).unwrap();
        assert!(result.is_empty());
    }
}
