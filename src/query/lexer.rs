use nom::character::complete::char as nom_char;
use nom::IResult;

/// Lexical tokens of the query grammar. Reserved words (`AND`/`OR`/`NOT`/
/// `IN`) are matched case-insensitively; `&`/`|`/`-` are operator aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexToken {
    Word(String),
    Phrase(String),
    And,
    Or,
    Not,
    In,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
}

pub fn lex(input: &str) -> Vec<LexToken> {
    let mut tokens = Vec::new();
    let mut cursor = 0usize;

    while cursor < input.len() {
        let rest = &input[cursor..];
        let c = match rest.chars().next() {
            Some(c) => c,
            None => break,
        };

        if c.is_whitespace() {
            cursor += c.len_utf8();
            continue;
        }

        match c {
            '(' => {
                tokens.push(LexToken::LParen);
                cursor += 1;
            }
            ')' => {
                tokens.push(LexToken::RParen);
                cursor += 1;
            }
            '[' => {
                tokens.push(LexToken::LBracket);
                cursor += 1;
            }
            ']' => {
                tokens.push(LexToken::RBracket);
                cursor += 1;
            }
            ',' => {
                tokens.push(LexToken::Comma);
                cursor += 1;
            }
            ':' => {
                tokens.push(LexToken::Colon);
                cursor += 1;
            }
            '&' => {
                tokens.push(LexToken::And);
                cursor += 1;
            }
            '|' => {
                tokens.push(LexToken::Or);
                cursor += 1;
            }
            '-' => {
                tokens.push(LexToken::Not);
                cursor += 1;
            }
            '\'' | '"' => {
                let (consumed, phrase) = lex_phrase(rest, c);
                tokens.push(LexToken::Phrase(phrase));
                cursor += consumed;
            }
            _ => {
                let mut end = 0;
                for ch in rest.chars() {
                    if is_word_boundary(ch) {
                        break;
                    }
                    end += ch.len_utf8();
                }
                let word = &rest[..end];
                cursor += end;
                tokens.push(classify_word(word));
            }
        }
    }

    tokens
}

fn is_word_boundary(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | ',' | ':' | '&' | '|' | '-' | '\'' | '"')
}

fn classify_word(word: &str) -> LexToken {
    match word.to_ascii_uppercase().as_str() {
        "AND" => LexToken::And,
        "OR" => LexToken::Or,
        "NOT" => LexToken::Not,
        "IN" => LexToken::In,
        _ => LexToken::Word(word.to_string()),
    }
}

/// Parses a quoted phrase with `\`-escapes starting at `rest[0]` (the
/// opening quote). An unterminated phrase is tolerated: it is consumed to
/// the end of input rather than raising an error.
fn lex_phrase(rest: &str, quote: char) -> (usize, String) {
    match parse_quoted(quote)(rest) {
        Ok((remaining, content)) => (rest.len() - remaining.len(), content),
        Err(_) => (rest.len(), unescape(&rest[quote.len_utf8()..])),
    }
}

fn parse_quoted(quote: char) -> impl Fn(&str) -> IResult<&str, String> {
    move |input: &str| {
        let (input, _) = nom_char(quote)(input)?;
        let mut result = String::new();
        let mut chars = input.char_indices();
        loop {
            match chars.next() {
                None => return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Eof))),
                Some((idx, c)) if c == quote => return Ok((&input[idx + c.len_utf8()..], result)),
                Some((idx, '\\')) => match chars.next() {
                    Some((_, escaped)) => result.push(escaped),
                    None => return Err(nom::Err::Error(nom::error::Error::new(&input[idx..], nom::error::ErrorKind::Eof))),
                },
                Some((_, c)) => result.push(c),
            }
        }
    }
}

fn unescape(input: &str) -> String {
    let mut result = String::new();
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                result.push(escaped);
            }
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_operator_aliases() {
        let tokens = lex("a & b | -c");
        assert_eq!(
            tokens,
            vec![
                LexToken::Word("a".into()),
                LexToken::And,
                LexToken::Word("b".into()),
                LexToken::Or,
                LexToken::Not,
                LexToken::Word("c".into()),
            ]
        );
    }

    #[test]
    fn lexes_reserved_words_case_insensitively() {
        let tokens = lex("a and b OR not c");
        assert_eq!(
            tokens,
            vec![
                LexToken::Word("a".into()),
                LexToken::And,
                LexToken::Word("b".into()),
                LexToken::Or,
                LexToken::Not,
                LexToken::Word("c".into()),
            ]
        );
    }

    #[test]
    fn lexes_quoted_phrase_with_escape() {
        let tokens = lex(r#"'cat \'s cow'"#);
        assert_eq!(tokens, vec![LexToken::Phrase("cat 's cow".into())]);
    }

    #[test]
    fn tolerates_unterminated_phrase() {
        let tokens = lex("'cat cow");
        assert_eq!(tokens, vec![LexToken::Phrase("cat cow".into())]);
    }

    #[test]
    fn lexes_facet_grammar_tokens() {
        let tokens = lex("category:red");
        assert_eq!(tokens, vec![LexToken::Word("category".into()), LexToken::Colon, LexToken::Word("red".into())]);
    }
}
