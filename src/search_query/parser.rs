use super::condition::Condition;
use super::lexer::{Token, TokenKind};
use super::Query;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("cannot parse an empty token list")]
    EmptyTokenList,

    #[error("unexpected token {token} at position {position}")]
    UnexpectedToken { token: TokenKind, position: usize },

    #[error("unexpected end of tokens after position {position}")]
    UnexpectedEnd { position: usize },
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Result<&'a Token, ParseError> {
        match self.tokens.get(self.pos) {
            Some(tok) => {
                self.pos += 1;
                Ok(tok)
            }
            None => Err(ParseError::UnexpectedEnd {
                position: self.tokens.last().map(|t| t.position).unwrap_or_default(),
            }),
        }
    }

    /// query = criteria* EndOfQuery
    fn parse_query(&mut self, query: &mut Query) -> Result<(), ParseError> {
        loop {
            if let Some(Token {
                kind: TokenKind::EndOfQuery,
                ..
            }) = self.peek()
            {
                self.advance()?;
                return Ok(());
            }
            let condition = self.parse_criteria()?;
            query.add_condition(condition);
        }
    }

    /// criteria = Text | Qualifier Text | Qualifier | Tag | Not Tag
    fn parse_criteria(&mut self) -> Result<Condition, ParseError> {
        let tok = self.advance()?;
        match &tok.kind {
            TokenKind::Text(value) => Ok(Condition::text(value.as_str())),
            TokenKind::Qualifier(qualifier) => match self.peek() {
                Some(Token {
                    kind: TokenKind::Text(value),
                    ..
                }) => {
                    self.advance()?;
                    Ok(Condition::qualifier(*qualifier, value.as_str()))
                }
                // a bare `url:` is searched as the word itself
                _ => Ok(Condition::text(qualifier.as_str())),
            },
            TokenKind::Tag(value) => Ok(Condition::tag(value.as_str(), false)),
            TokenKind::Not => {
                let next = self.advance()?;
                match &next.kind {
                    TokenKind::Tag(value) => Ok(Condition::tag(value.as_str(), true)),
                    other => Err(ParseError::UnexpectedToken {
                        token: other.clone(),
                        position: next.position,
                    }),
                }
            }
            other => Err(ParseError::UnexpectedToken {
                token: other.clone(),
                position: tok.position,
            }),
        }
    }
}

/// Builds a query out of a token stream terminated by `EndOfQuery`.
pub fn parse(tokens: &[Token]) -> Result<Query, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::EmptyTokenList);
    }

    let mut query = Query::default();
    let mut parser = Parser::new(tokens);
    parser.parse_query(&mut query)?;

    if let Some(tok) = parser.peek() {
        return Err(ParseError::UnexpectedToken {
            token: tok.kind.clone(),
            position: tok.position,
        });
    }

    Ok(query)
}
