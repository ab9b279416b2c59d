use crate::error::{Error, Result};
use crate::query::ast::{QueryKind, QueryNode};
use crate::query::lexer::{lex, LexToken};

/// Recursive-descent / precedence-climbing parser over [`LexToken`]s.
/// `AND` binds tighter than `OR` (precedence 2 vs. 1), both
/// left-associative. Malformed input is tolerated rather than rejected
/// wherever the grammar has an obvious recovery (trailing operators,
/// unclosed parens/brackets); only a genuinely stray token raises
/// [`crate::error::ErrorKind::UnexpectedToken`].
pub struct Parser<'a> {
    tokens: &'a [LexToken],
    pos: usize,
}

const PREC_OR: u8 = 1;
const PREC_AND: u8 = 2;

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [LexToken]) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&LexToken> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&LexToken> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn parse_expression(&mut self, min_prec: u8) -> Result<QueryNode<String>> {
        let mut lhs = self.parse_term()?;

        loop {
            let prec = match self.peek() {
                Some(LexToken::And) => PREC_AND,
                Some(LexToken::Or) => PREC_OR,
                _ => break,
            };
            if prec < min_prec {
                break;
            }
            let kind = match self.advance() {
                Some(LexToken::And) => QueryKind::And,
                Some(LexToken::Or) => QueryKind::Or,
                _ => unreachable!(),
            };

            if self.at_end() {
                // trailing operator: tolerate by dropping it
                break;
            }

            let rhs = self.parse_expression(prec + 1)?;
            lhs = merge(kind, lhs, rhs);
        }

        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<QueryNode<String>> {
        if let Some(LexToken::In) = self.peek() {
            self.advance();
            let list = self.parse_list()?;
            return Ok(QueryNode::with_children(QueryKind::Or, list));
        }

        if let Some(LexToken::Not) = self.peek() {
            self.advance();
            if let Some(LexToken::In) = self.peek() {
                self.advance();
                let list = self.parse_list()?;
                let inner = QueryNode::with_children(QueryKind::Or, list);
                return Ok(QueryNode::with_children(QueryKind::Not, vec![inner]));
            }
            let inner = self.parse_factor()?;
            return Ok(QueryNode::with_children(QueryKind::Not, vec![inner]));
        }

        self.parse_factor()
    }

    fn parse_factor(&mut self) -> Result<QueryNode<String>> {
        match self.peek() {
            Some(LexToken::LParen) => {
                self.advance();
                let inner = self.parse_expression(PREC_OR)?;
                match self.peek() {
                    Some(LexToken::RParen) => {
                        self.advance();
                    }
                    _ => {
                        // tolerate unclosed paren: take whatever we parsed
                    }
                }
                Ok(inner)
            }
            Some(LexToken::LBracket) => {
                let list = self.parse_list()?;
                Ok(QueryNode::with_children(QueryKind::Or, list))
            }
            Some(LexToken::Word(_)) | Some(LexToken::Phrase(_)) => self.parse_word_run(),
            Some(_) => Err(Error::unexpected_token(format!("{:?}", self.peek()))),
            None => Ok(QueryNode::empty(QueryKind::And)),
        }
    }

    /// Consumes a run of words/phrases, detecting the facet grammar
    /// (`name:value`, `name IN [...]`, `name NOT IN [...]`) along the way.
    /// A plain run of bare words/phrases collapses into one unordered `And`
    /// leaf of strings (token ordering is resolved later during lowering).
    fn parse_word_run(&mut self) -> Result<QueryNode<String>> {
        let first = match self.advance() {
            Some(LexToken::Word(w)) => w.clone(),
            Some(LexToken::Phrase(p)) => p.clone(),
            _ => unreachable!(),
        };

        if let Some(LexToken::Colon) = self.peek() {
            self.advance();
            let value = match self.advance() {
                Some(LexToken::Word(w)) => w.clone(),
                Some(LexToken::Phrase(p)) => p.clone(),
                _ => String::new(),
            };
            let facet = format!("{first}:{value}");
            return Ok(QueryNode::leaf(QueryKind::And, vec![facet], false, true));
        }

        if let Some(LexToken::In) = self.peek() {
            self.advance();
            let values = self.parse_list()?;
            let children = values
                .into_iter()
                .map(|v| {
                    let value = v.tokens.first().cloned().unwrap_or_default();
                    QueryNode::leaf(QueryKind::And, vec![format!("{first}:{value}")], false, true)
                })
                .collect();
            return Ok(QueryNode::with_children(QueryKind::Or, children));
        }

        let mut strings = vec![first];
        loop {
            match self.peek() {
                Some(LexToken::Word(w)) => {
                    strings.push(w.clone());
                    self.advance();
                }
                Some(LexToken::Phrase(p)) => {
                    strings.push(p.clone());
                    self.advance();
                }
                _ => break,
            }
        }

        Ok(QueryNode::leaf(QueryKind::And, strings, false, false))
    }

    /// Parses a `[a, b, c]` list. Tolerates a missing closing bracket.
    fn parse_list(&mut self) -> Result<Vec<QueryNode<String>>> {
        match self.peek() {
            Some(LexToken::LBracket) => {
                self.advance();
            }
            _ => return Ok(Vec::new()),
        }

        let mut items = Vec::new();
        loop {
            match self.peek() {
                Some(LexToken::RBracket) | None => break,
                Some(LexToken::Comma) => {
                    self.advance();
                }
                Some(LexToken::Word(w)) => {
                    items.push(QueryNode::leaf(QueryKind::And, vec![w.clone()], false, false));
                    self.advance();
                }
                Some(LexToken::Phrase(p)) => {
                    items.push(QueryNode::leaf(QueryKind::And, vec![p.clone()], false, false));
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }

        if let Some(LexToken::RBracket) = self.peek() {
            self.advance();
        }

        Ok(items)
    }
}

/// Folds `rhs` into `lhs` under `kind`, flattening consecutive same-kind
/// `And`/`Or` chains instead of nesting them one level per operator.
fn merge(kind: QueryKind, lhs: QueryNode<String>, rhs: QueryNode<String>) -> QueryNode<String> {
    let mut children = Vec::new();
    if lhs.kind == kind && lhs.tokens.is_empty() {
        children.extend(lhs.children);
    } else {
        children.push(lhs);
    }
    if rhs.kind == kind && rhs.tokens.is_empty() {
        children.extend(rhs.children);
    } else {
        children.push(rhs);
    }
    QueryNode::with_children(kind, children)
}

pub fn parse_query(input: &str) -> Result<QueryNode<String>> {
    let tokens = lex(input);
    if tokens.is_empty() {
        return Ok(QueryNode::empty(QueryKind::And));
    }
    let mut parser = Parser::new(&tokens);
    parser.parse_expression(PREC_OR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_binds_tighter_than_or() {
        let node = parse_query("cat AND dog OR fox").unwrap();
        assert_eq!(node.kind, QueryKind::Or);
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[0].kind, QueryKind::And);
    }

    #[test]
    fn parses_not_prefix() {
        let node = parse_query("NOT fox").unwrap();
        assert_eq!(node.kind, QueryKind::Not);
        assert_eq!(node.children[0].tokens, vec!["fox".to_string()]);
    }

    #[test]
    fn parses_parenthesized_and_not_grouping() {
        let node = parse_query("(cat OR dog) AND NOT (fox OR dog)").unwrap();
        assert_eq!(node.kind, QueryKind::And);
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[1].kind, QueryKind::Not);
    }

    #[test]
    fn parses_facet_expr() {
        let node = parse_query("category:red").unwrap();
        assert!(node.is_facet);
        assert_eq!(node.tokens, vec!["category:red".to_string()]);
    }

    #[test]
    fn parses_facet_in_list() {
        let node = parse_query("category IN [red, blue]").unwrap();
        assert_eq!(node.kind, QueryKind::Or);
        assert_eq!(node.children.len(), 2);
        assert!(node.children[0].is_facet);
        assert_eq!(node.children[0].tokens, vec!["category:red".to_string()]);
    }

    #[test]
    fn collapses_bare_word_run_into_single_leaf() {
        let node = parse_query("cat cow").unwrap();
        assert_eq!(node.kind, QueryKind::And);
        assert_eq!(node.tokens, vec!["cat".to_string(), "cow".to_string()]);
    }

    #[test]
    fn tolerates_unclosed_paren() {
        let node = parse_query("(cat AND dog").unwrap();
        assert_eq!(node.kind, QueryKind::And);
    }

    #[test]
    fn tolerates_trailing_operator() {
        let node = parse_query("cat AND").unwrap();
        assert_eq!(node.tokens, vec!["cat".to_string()]);
    }
}
