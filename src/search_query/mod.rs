mod condition;
mod lexer;
mod parser;

use std::str::FromStr;

use serde::Serialize;

pub use condition::{Condition, ConditionKind};
pub use lexer::{tokenize, Qualifier, Token, TokenKind};
pub use parser::{parse, ParseError};

/// A parsed search string: conditions in the order they were typed.
///
/// Syntax:
/// - `word`, `"quoted phrase"` → text conditions
/// - `url: value` → qualifier condition (a lone `url:` is the text `url`)
/// - `#tag` / `-#tag` → tag to require / exclude
/// - `\x` → `x` taken literally
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Query {
    conditions: Vec<Condition>,
}

impl Query {
    pub fn add_condition(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn conditions(&self, kind: ConditionKind) -> Vec<&Condition> {
        self.conditions
            .iter()
            .filter(|c| c.is_kind(kind))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whole input as a single text condition. Used when the typed query
    /// doesn't parse and the caller prefers searching it verbatim.
    pub fn literal(input: &str) -> Self {
        let mut query = Query::default();
        let input = input.trim();
        if !input.is_empty() {
            query.add_condition(Condition::text(input));
        }
        query
    }
}

impl FromStr for Query {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens = tokenize(s);
        parse(&tokens)
    }
}
