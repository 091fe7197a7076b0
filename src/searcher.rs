use serde::Serialize;

use crate::links::{Link, LinkStore, Pagination};
use crate::search_query::{parse, tokenize, ConditionKind, ParseError, Qualifier, Query, Token};

#[derive(thiserror::Error, Debug)]
pub enum SearchError {
    #[error("invalid search query: {0}")]
    Query(#[from] ParseError),

    #[error("store error: {0:?}")]
    Store(#[from] anyhow::Error),
}

/// Predicate handed over to a [`LinkStore`]. All parts are AND-ed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkFilter {
    /// Free text for the store's full-text search. `None` means no text
    /// constraint at all, never "match the empty string".
    pub text: Option<String>,
    pub url_contains: Vec<String>,
    pub required_tags: Vec<String>,
    pub excluded_tags: Vec<String>,
    pub exclude_never_only: bool,
}

impl LinkFilter {
    pub fn compile(query: &Query) -> Self {
        let texts = query
            .conditions(ConditionKind::Text)
            .into_iter()
            .map(|c| c.value())
            .collect::<Vec<_>>();

        let mut filter = LinkFilter {
            text: if texts.is_empty() {
                None
            } else {
                Some(texts.join(" "))
            },
            // owner's never-only links are hidden whatever the query says
            exclude_never_only: true,
            ..Default::default()
        };

        for condition in query.conditions(ConditionKind::Qualifier) {
            if condition.qualifier_name() == Some(Qualifier::Url) {
                filter.url_contains.push(condition.value().to_string());
            }
        }

        for condition in query.conditions(ConditionKind::Tag) {
            let tag = condition.value().to_string();
            if condition.is_not() {
                filter.excluded_tags.push(tag);
            } else {
                filter.required_tags.push(tag);
            }
        }

        filter
    }

    /// In-process evaluation, used by the stores that don't delegate the
    /// search to an external engine.
    pub fn matches(&self, link: &Link) -> bool {
        if self.exclude_never_only && link.is_never_only() {
            return false;
        }

        let url = link.url.to_lowercase();
        if !self
            .url_contains
            .iter()
            .all(|part| url.contains(&part.to_lowercase()))
        {
            return false;
        }

        let has_tag = |tag: &String| {
            let tag = tag.to_lowercase();
            link.tags.iter().any(|t| t.to_lowercase() == tag)
        };
        if !self.required_tags.iter().all(has_tag) {
            return false;
        }
        if self.excluded_tags.iter().any(has_tag) {
            return false;
        }

        if let Some(text) = &self.text {
            // every word must show up in the title or the url
            let title = link.title.to_lowercase();
            for word in text.to_lowercase().split_whitespace() {
                if !title.contains(word) && !url.contains(word) {
                    return false;
                }
            }
        }

        true
    }
}

pub struct LinksSearcher<'a> {
    store: &'a dyn LinkStore,
    literal_fallback: bool,
}

impl<'a> LinksSearcher<'a> {
    pub fn new(store: &'a dyn LinkStore) -> Self {
        Self {
            store,
            literal_fallback: false,
        }
    }

    /// Search unparsable input as one literal text condition instead of
    /// failing.
    pub fn with_literal_fallback(mut self, enabled: bool) -> Self {
        self.literal_fallback = enabled;
        self
    }

    #[tracing::instrument(level = "debug", skip(self, query))]
    pub fn get_links(
        &self,
        user_id: &str,
        query: &Query,
        page: Pagination,
    ) -> Result<Vec<Link>, SearchError> {
        let filter = LinkFilter::compile(query);
        log::debug!("compiled filter {filter:?}");
        Ok(self.store.search(user_id, &filter, page)?)
    }

    #[tracing::instrument(level = "debug", skip(self, query))]
    pub fn count_links(&self, user_id: &str, query: &Query) -> Result<usize, SearchError> {
        let filter = LinkFilter::compile(query);
        Ok(self.store.count(user_id, &filter)?)
    }

    pub fn get_links_str(
        &self,
        user_id: &str,
        input: &str,
        page: Pagination,
    ) -> Result<Vec<Link>, SearchError> {
        let query = self.parse(input)?;
        self.get_links(user_id, &query, page)
    }

    pub fn count_links_str(&self, user_id: &str, input: &str) -> Result<usize, SearchError> {
        let query = self.parse(input)?;
        self.count_links(user_id, &query)
    }

    fn parse(&self, input: &str) -> Result<Query, SearchError> {
        self.parse_tokens(input, &tokenize(input))
    }

    /// Parses an already tokenized `input`, falling back to
    /// [`Query::literal`] when enabled. The tokenizer always closes quotes
    /// and attaches a trailing EndOfQuery, so tokens coming from a string
    /// currently always parse; the fallback guards token streams that don't.
    pub(crate) fn parse_tokens(&self, input: &str, tokens: &[Token]) -> Result<Query, SearchError> {
        match parse(tokens) {
            Ok(query) => Ok(query),
            Err(err) if self.literal_fallback => {
                log::warn!("search query {input:?} is invalid ({err}), searching it literally");
                Ok(Query::literal(input))
            }
            Err(err) => Err(err.into()),
        }
    }
}
