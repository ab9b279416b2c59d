use crate::hashing::{HashGenerator, Tokenizer};
use crate::query::ast::QueryNode;

/// Lowers a string-AST produced by the parser into a hashed-token AST ready
/// for the search executors.
///
/// A leaf's raw strings are tokenized independently. A raw string that
/// tokenizes to zero or one word is a "simple" contribution and is folded
/// into a single flat, unordered sibling leaf alongside the other simple
/// strings of the same parent. A raw string that tokenizes to more than one
/// word (a phrase, or a word-run lexeme that splits further) carries a
/// positional constraint between its own tokens that must not be mixed with
/// unrelated tokens, so it is exploded into its own ordered sub-leaf.
/// Facet leaves are never tokenized: each raw string is hashed whole.
pub fn lower_query(node: &QueryNode<String>, tokenizer: &dyn Tokenizer, hasher: &dyn HashGenerator) -> QueryNode<u64> {
    if !node.children.is_empty() {
        let children = node.children.iter().map(|c| lower_query(c, tokenizer, hasher)).collect();
        return QueryNode::with_children(node.kind, children);
    }

    if node.is_facet {
        let tokens = node.tokens.iter().map(|s| hasher.hash(s)).collect();
        return QueryNode::leaf(node.kind, tokens, false, true);
    }

    let mut flat = Vec::new();
    let mut multi_children = Vec::new();

    for raw in &node.tokens {
        let words: Vec<u64> = tokenizer
            .tokenize(raw)
            .map(|slice| hasher.hash(slice.resolve(raw)))
            .collect();

        match words.len() {
            0 => {}
            1 => flat.push(words[0]),
            _ => multi_children.push(QueryNode::leaf(node.kind, words, true, false)),
        }
    }

    if multi_children.is_empty() {
        return QueryNode::leaf(node.kind, flat, false, false);
    }

    if !flat.is_empty() {
        multi_children.push(QueryNode::leaf(node.kind, flat, false, false));
    }
    QueryNode::with_children(node.kind, multi_children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenizerConfig;
    use crate::hashing::{DefaultHashGenerator, WordTokenizer};
    use crate::query::ast::QueryKind;

    fn tokenizer() -> WordTokenizer {
        WordTokenizer::from(TokenizerConfig::default().with_min_length(1).unwrap())
    }

    #[test]
    fn single_word_leaf_flattens() {
        let node = QueryNode::leaf(QueryKind::And, vec!["cat".to_string()], false, false);
        let lowered = lower_query(&node, &tokenizer(), &DefaultHashGenerator);
        assert_eq!(lowered.tokens.len(), 1);
        assert!(lowered.children.is_empty());
    }

    #[test]
    fn bare_word_run_flattens_into_one_unordered_leaf() {
        let node = QueryNode::leaf(QueryKind::And, vec!["cat".to_string(), "cow".to_string()], false, false);
        let lowered = lower_query(&node, &tokenizer(), &DefaultHashGenerator);
        assert_eq!(lowered.tokens.len(), 2);
        assert!(!lowered.respect_token_order);
    }

    #[test]
    fn phrase_explodes_into_ordered_sub_leaf() {
        let node = QueryNode::leaf(QueryKind::And, vec!["fox cow cat".to_string()], false, false);
        let lowered = lower_query(&node, &tokenizer(), &DefaultHashGenerator);
        assert_eq!(lowered.children.len(), 1);
        assert!(lowered.children[0].respect_token_order);
        assert_eq!(lowered.children[0].tokens.len(), 3);
    }

    #[test]
    fn mixed_phrase_and_bare_word_splits_flat_and_ordered() {
        let node = QueryNode::leaf(QueryKind::And, vec!["fox cow cat".to_string(), "dog".to_string()], false, false);
        let lowered = lower_query(&node, &tokenizer(), &DefaultHashGenerator);
        assert_eq!(lowered.children.len(), 2);
        assert!(lowered.children.iter().any(|c| c.respect_token_order && c.tokens.len() == 3));
        assert!(lowered.children.iter().any(|c| !c.respect_token_order && c.tokens.len() == 1));
    }

    #[test]
    fn facet_leaf_is_hashed_whole_without_tokenizing() {
        let node = QueryNode::leaf(QueryKind::And, vec!["category:red".to_string()], false, true);
        let lowered = lower_query(&node, &tokenizer(), &DefaultHashGenerator);
        assert_eq!(lowered.tokens, vec![DefaultHashGenerator.hash("category:red")]);
    }
}
