use crate::{parse_list, searcher::LinkFilter};
use anyhow::{anyhow, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    hash::Hash,
    io::ErrorKind,
    str::FromStr,
    sync::{Arc, RwLock},
    time::Instant,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Bookmarks,
    News,
    Read,
    /// Links the owner asked to never see again.
    Never,
    Collection,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Bookmarks => "bookmarks",
            CollectionKind::News => "news",
            CollectionKind::Read => "read",
            CollectionKind::Never => "never",
            CollectionKind::Collection => "collection",
        }
    }
}

impl FromStr for CollectionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bookmarks" => Ok(CollectionKind::Bookmarks),
            "news" => Ok(CollectionKind::News),
            "read" => Ok(CollectionKind::Read),
            "never" => Ok(CollectionKind::Never),
            "collection" => Ok(CollectionKind::Collection),
            other => bail!("unknown collection kind {other:?}"),
        }
    }
}

#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: u64,
    pub user_id: String,

    pub title: String,
    pub url: String,
    pub tags: Vec<String>,
    pub collections: Vec<CollectionKind>,

    pub published_at: DateTime<Utc>,
}

impl Hash for Link {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Link {
    /// Only attached to the owner's "never" collection.
    pub fn is_never_only(&self) -> bool {
        !self.collections.is_empty()
            && self.collections.iter().all(|c| *c == CollectionKind::Never)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LinkCreate {
    pub user_id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub collections: Vec<CollectionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub offset: usize,
    pub limit: Option<usize>,
}

/// Storage collaborator consulted by the searcher.
pub trait LinkStore: Send + Sync {
    /// Matching links of `user_id`, newest first.
    fn search(
        &self,
        user_id: &str,
        filter: &LinkFilter,
        page: Pagination,
    ) -> anyhow::Result<Vec<Link>>;
    fn count(&self, user_id: &str, filter: &LinkFilter) -> anyhow::Result<usize>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    list: Arc<RwLock<Vec<Link>>>,
}

impl MemoryStore {
    pub fn new(links: Vec<Link>) -> Self {
        Self {
            list: Arc::new(RwLock::new(links)),
        }
    }

    pub fn create(&self, link_create: LinkCreate) -> anyhow::Result<Link> {
        self.write_locked(|links| Ok(Self::push(links, link_create)))
    }

    /// Runs `f` with the list write-locked.
    fn write_locked<R>(
        &self,
        f: impl FnOnce(&mut Vec<Link>) -> anyhow::Result<R>,
    ) -> anyhow::Result<R> {
        let mut links = self
            .list
            .write()
            .map_err(|_| anyhow!("link list lock poisoned"))?;
        f(&mut *links)
    }

    fn push(links: &mut Vec<Link>, link_create: LinkCreate) -> Link {
        let id = links.iter().map(|l| l.id + 1).max().unwrap_or(0);

        let mut tags = link_create.tags.unwrap_or_default();
        let mut seen = HashSet::new();
        tags.retain(|item| seen.insert(item.to_lowercase()));

        let link = Link {
            id,
            user_id: link_create.user_id,
            title: link_create.title.unwrap_or_default(),
            url: link_create.url,
            tags,
            collections: link_create.collections,
            published_at: link_create.published_at.unwrap_or_else(Utc::now),
        };

        links.push(link.clone());
        link
    }

    fn matching(&self, user_id: &str, filter: &LinkFilter) -> anyhow::Result<Vec<Link>> {
        let links = self
            .list
            .read()
            .map_err(|_| anyhow!("link list lock poisoned"))?;

        Ok(links
            .iter()
            .filter(|l| l.user_id == user_id && filter.matches(l))
            .cloned()
            .collect())
    }
}

impl LinkStore for MemoryStore {
    fn search(
        &self,
        user_id: &str,
        filter: &LinkFilter,
        page: Pagination,
    ) -> anyhow::Result<Vec<Link>> {
        let mut output = self.matching(user_id, filter)?;

        output.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let limit = page.limit.unwrap_or(usize::MAX);
        Ok(output.into_iter().skip(page.offset).take(limit).collect())
    }

    fn count(&self, user_id: &str, filter: &LinkFilter) -> anyhow::Result<usize> {
        Ok(self.matching(user_id, filter)?.len())
    }
}

const CSV_HEADERS: [&str; 7] = [
    "id",
    "user_id",
    "url",
    "title",
    "tags",
    "collections",
    "published_at",
];

/// Links persisted in a csv file, searched in memory.
#[derive(Debug, Clone)]
pub struct CsvStore {
    inner: MemoryStore,
    path: String,
}

impl CsvStore {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        if let Err(err) = std::fs::metadata(path) {
            match err.kind() {
                ErrorKind::NotFound => {
                    log::info!("Creating new link store at {path}");
                    let mut csv_wrt = csv::Writer::from_path(path)?;
                    csv_wrt.write_record(CSV_HEADERS)?;
                    csv_wrt.flush()?;
                }
                _ => Err(err)?,
            }
        }

        let now = Instant::now();
        let mut csv_reader = csv::Reader::from_path(path)?;

        let mut links = vec![];
        for record in csv_reader.records() {
            let record = record?;
            let field = |idx: usize| {
                record
                    .get(idx)
                    .ok_or_else(|| anyhow!("couldnt get record {}", CSV_HEADERS[idx]))
            };

            let collections = parse_list(field(5)?)
                .iter()
                .map(|c| c.parse::<CollectionKind>())
                .collect::<anyhow::Result<Vec<_>>>()?;

            links.push(Link {
                id: field(0)?.parse::<u64>()?,
                user_id: field(1)?.to_string(),
                url: field(2)?.to_string(),
                title: field(3)?.to_string(),
                tags: parse_list(field(4)?),
                collections,
                published_at: DateTime::parse_from_rfc3339(field(6)?)?.with_timezone(&Utc),
            });
        }

        log::debug!(
            "took {}ms to read csv",
            now.elapsed().as_micros() as f64 / 1000.0
        );

        Ok(CsvStore {
            inner: MemoryStore::new(links),
            path: path.to_string(),
        })
    }

    /// Appends the link and persists the file under the same write lock;
    /// the link is dropped again if the file can't be written.
    pub fn create(&self, link_create: LinkCreate) -> anyhow::Result<Link> {
        self.inner.write_locked(|links| {
            let link = MemoryStore::push(links, link_create);
            if let Err(err) = self.write_file(links) {
                links.pop();
                return Err(err);
            }
            Ok(link)
        })
    }

    /// Caller must hold the list write lock: the temp file is shared.
    fn write_file(&self, links: &[Link]) -> anyhow::Result<()> {
        let temp_path = format!("{}-tmp", &self.path);
        let mut csv_wrt = csv::Writer::from_path(&temp_path)?;
        csv_wrt.write_record(CSV_HEADERS)?;
        for link in links.iter() {
            let collections = link
                .collections
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>();
            csv_wrt.write_record([
                &link.id.to_string(),
                &link.user_id,
                &link.url,
                &link.title,
                &link.tags.join(","),
                &collections.join(","),
                &link.published_at.to_rfc3339(),
            ])?;
        }
        csv_wrt.flush()?;
        std::fs::rename(&temp_path, &self.path)?;

        Ok(())
    }
}

impl LinkStore for CsvStore {
    fn search(
        &self,
        user_id: &str,
        filter: &LinkFilter,
        page: Pagination,
    ) -> anyhow::Result<Vec<Link>> {
        self.inner.search(user_id, filter, page)
    }

    fn count(&self, user_id: &str, filter: &LinkFilter) -> anyhow::Result<usize> {
        self.inner.count(user_id, filter)
    }
}
