use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the tokens of a search query
    Tokens {
        /// e.g. '"My Title" url:flus.fr #news -#discard'
        query: String,
    },

    /// Print the conditions of a search query
    Parse {
        /// e.g. '"My Title" url:flus.fr #news -#discard'
        query: String,
    },

    /// Search links of a user
    Search {
        query: String,

        /// Owner of the links
        #[clap(short, long)]
        user: String,

        /// Skip this many results
        #[clap(long, default_value = "0")]
        offset: usize,

        /// Maximum number of results
        #[clap(short, long)]
        limit: Option<usize>,

        /// Only print the number of matching links
        #[clap(short, long, default_value = "false")]
        count: bool,
    },

    /// Add a link to the store
    Add {
        /// Owner of the link
        #[clap(short, long)]
        user: String,

        /// a url
        #[clap(long)]
        url: String,

        /// Link title
        #[clap(short, long)]
        title: Option<String>,

        /// Comma separated tags
        #[clap(long)]
        tags: Option<String>,

        /// Comma separated collections (bookmarks, news, read, never, collection)
        #[clap(long)]
        collections: Option<String>,
    },
}
