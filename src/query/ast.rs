/// The three shapes a [`QueryNode`] can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    And,
    Or,
    Not,
}

/// A tagged tree node: either a leaf carrying tokens, or an inner node
/// carrying children. Both empty is the "empty" node produced by tolerated
/// grammar edge cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryNode<T> {
    pub kind: QueryKind,
    pub tokens: Vec<T>,
    pub children: Vec<QueryNode<T>>,
    /// Meaningful on leaves carrying more than one token: whether the
    /// tokens must chain through `prev_token` in order.
    pub respect_token_order: bool,
    /// Marks facet semantics: tokens are `hash("name:value")` self
    /// references rather than ordinary word tokens.
    pub is_facet: bool,
    /// Overrides the probe-token choice for this subtree.
    pub first_look_at: Option<T>,
}

impl<T> QueryNode<T> {
    pub fn empty(kind: QueryKind) -> Self {
        QueryNode { kind, tokens: Vec::new(), children: Vec::new(), respect_token_order: false, is_facet: false, first_look_at: None }
    }

    pub fn leaf(kind: QueryKind, tokens: Vec<T>, respect_token_order: bool, is_facet: bool) -> Self {
        QueryNode { kind, tokens, children: Vec::new(), respect_token_order, is_facet, first_look_at: None }
    }

    pub fn with_children(kind: QueryKind, children: Vec<QueryNode<T>>) -> Self {
        QueryNode { kind, tokens: Vec::new(), children, respect_token_order: false, is_facet: false, first_look_at: None }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.children.is_empty()
    }

    pub fn with_first_look_at(mut self, token: T) -> Self {
        self.first_look_at = Some(token);
        self
    }
}

/// A query root with pagination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery<T> {
    pub root: QueryNode<T>,
    pub skip: usize,
    pub limit: usize,
}

impl<T> SearchQuery<T> {
    pub fn new(root: QueryNode<T>, skip: usize, limit: usize) -> Self {
        SearchQuery { root, skip, limit }
    }
}

/// True iff `node` contains at least one non-empty, non-`Not` sub-tree
/// that is not an `Or` containing a `Not` child (such a sub-tree would
/// otherwise require a full-index scan rather than a cheap probe).
pub fn has_any_positive_criteria<T>(node: &QueryNode<T>) -> bool {
    fn is_locally_positive<T>(node: &QueryNode<T>) -> bool {
        if node.kind == QueryKind::Not || node.is_empty() {
            return false;
        }
        if node.kind == QueryKind::Or && node.children.iter().any(|c| c.kind == QueryKind::Not) {
            return false;
        }
        true
    }

    is_locally_positive(node) || node.children.iter().any(has_any_positive_criteria)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_node_has_no_positive_criteria() {
        let node: QueryNode<u64> = QueryNode::with_children(QueryKind::Not, vec![QueryNode::leaf(QueryKind::And, vec![1], false, false)]);
        assert!(!has_any_positive_criteria(&node));
    }

    #[test]
    fn or_containing_not_has_no_positive_criteria() {
        let not_child: QueryNode<u64> = QueryNode::with_children(QueryKind::Not, vec![QueryNode::leaf(QueryKind::And, vec![1], false, false)]);
        let or_node: QueryNode<u64> = QueryNode::with_children(QueryKind::Or, vec![not_child]);
        assert!(!has_any_positive_criteria(&or_node));
    }

    #[test]
    fn plain_and_leaf_is_positive() {
        let node: QueryNode<u64> = QueryNode::leaf(QueryKind::And, vec![1, 2], false, false);
        assert!(has_any_positive_criteria(&node));
    }

    #[test]
    fn and_with_a_positive_child_and_a_not_child_is_positive() {
        let not_child: QueryNode<u64> = QueryNode::with_children(QueryKind::Not, vec![QueryNode::leaf(QueryKind::And, vec![1], false, false)]);
        let positive_child: QueryNode<u64> = QueryNode::leaf(QueryKind::And, vec![2], false, false);
        let and_node: QueryNode<u64> = QueryNode::with_children(QueryKind::And, vec![not_child, positive_child]);
        assert!(has_any_positive_criteria(&and_node));
    }
}
