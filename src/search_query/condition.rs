use serde::Serialize;

use super::lexer::Qualifier;

/// One criterion of a search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Condition {
    Text { value: String },
    Qualifier { qualifier: Qualifier, value: String },
    Tag { value: String, not: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    Any,
    Text,
    Qualifier,
    Tag,
}

impl Condition {
    pub fn text(value: impl Into<String>) -> Self {
        Condition::Text {
            value: value.into(),
        }
    }

    pub fn qualifier(qualifier: Qualifier, value: impl Into<String>) -> Self {
        Condition::Qualifier {
            qualifier,
            value: value.into(),
        }
    }

    pub fn tag(value: impl Into<String>, not: bool) -> Self {
        Condition::Tag {
            value: value.into(),
            not,
        }
    }

    pub fn is_kind(&self, kind: ConditionKind) -> bool {
        match kind {
            ConditionKind::Any => true,
            ConditionKind::Text => self.is_text(),
            ConditionKind::Qualifier => self.is_qualifier(),
            ConditionKind::Tag => self.is_tag(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Condition::Text { .. })
    }

    pub fn is_qualifier(&self) -> bool {
        matches!(self, Condition::Qualifier { .. })
    }

    pub fn is_tag(&self) -> bool {
        matches!(self, Condition::Tag { .. })
    }

    pub fn value(&self) -> &str {
        match self {
            Condition::Text { value }
            | Condition::Qualifier { value, .. }
            | Condition::Tag { value, .. } => value,
        }
    }

    /// Qualifier name for qualifier conditions.
    pub fn qualifier_name(&self) -> Option<Qualifier> {
        match self {
            Condition::Qualifier { qualifier, .. } => Some(*qualifier),
            _ => None,
        }
    }

    /// True only for negated tags (`-#tag`).
    pub fn is_not(&self) -> bool {
        matches!(self, Condition::Tag { not: true, .. })
    }
}
