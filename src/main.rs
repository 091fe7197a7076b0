use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod links;
mod search_query;
mod searcher;
#[cfg(test)]
mod tests;

use config::Config;
use links::{CollectionKind, CsvStore, LinkCreate, Pagination};
use search_query::Query;
use searcher::LinksSearcher;

pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect::<Vec<_>>()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();

    match args.command {
        cli::Command::Tokens { query } => {
            let tokens = search_query::tokenize(&query);
            println!("{}", serde_json::to_string_pretty(&tokens)?);
            Ok(())
        }

        cli::Command::Parse { query } => {
            let query: Query = query.parse()?;
            if query.is_empty() {
                log::warn!("query has no conditions, it matches every link");
            }
            println!("{}", serde_json::to_string_pretty(&query)?);
            Ok(())
        }

        cli::Command::Search {
            query,
            user,
            offset,
            limit,
            count,
        } => {
            let config = Config::load_with(config::base_path()?)?;
            let store = CsvStore::load(&config.links_path().to_string_lossy())
                .context("failed to load link store")?;
            let searcher = LinksSearcher::new(&store).with_literal_fallback(config.literal_fallback);

            if count {
                let total = searcher.count_links_str(&user, &query)?;
                println!("{total} links found");
                return Ok(());
            }

            let page = Pagination {
                offset,
                limit: limit.or(config.default_limit),
            };
            let links = searcher.get_links_str(&user, &query, page)?;
            println!("{}", serde_json::to_string_pretty(&links)?);
            Ok(())
        }

        cli::Command::Add {
            user,
            url,
            title,
            tags,
            collections,
        } => {
            let url = url::Url::parse(&url).with_context(|| format!("invalid url {url:?}"))?;

            let collections = collections
                .map(|c| parse_list(&c))
                .unwrap_or_default()
                .iter()
                .map(|c| c.parse::<CollectionKind>())
                .collect::<anyhow::Result<Vec<_>>>()?;

            let config = Config::load_with(config::base_path()?)?;
            let store = CsvStore::load(&config.links_path().to_string_lossy())
                .context("failed to load link store")?;

            let link = store.create(LinkCreate {
                user_id: user,
                url: url.to_string(),
                title,
                tags: tags.map(|t| parse_list(&t)),
                collections,
                published_at: None,
            })?;
            println!("{}", serde_json::to_string_pretty(&link)?);
            Ok(())
        }
    }
}
