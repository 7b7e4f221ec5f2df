//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::query::Order;

/// Clutch headless WordPress client CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Config file path (default: clutch.toml)
    #[arg(short = 'C', long, default_value = "clutch.toml")]
    pub config: PathBuf,

    /// Override the WordPress site URL
    #[arg(long)]
    pub site: Option<String>,

    /// Override the destination site URL used for absolute links
    #[arg(long)]
    pub destination: Option<String>,

    /// Request draft content
    #[arg(long)]
    pub draft: bool,

    /// Emit absolute destination URLs instead of paths
    #[arg(long)]
    pub absolute: bool,

    /// Print fetch and resolution details to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Shared pagination arguments for list commands
#[derive(clap::Args, Debug, Clone)]
pub struct PageArgs {
    /// Page number (1-based)
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Items per page
    #[arg(long, default_value_t = 10)]
    pub per_page: u32,

    /// Full-text search
    #[arg(long)]
    pub search: Option<String>,
}

/// Select an entity by id or by slug
#[derive(clap::Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct Selector {
    #[arg(long)]
    pub id: Option<u64>,

    #[arg(long)]
    pub slug: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// Parse `taxonomy=1,2,3`.
fn parse_filter(raw: &str) -> Result<(String, Vec<u64>), String> {
    let (taxonomy, ids) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected TAXONOMY=IDS, got `{raw}`"))?;
    if taxonomy.is_empty() {
        return Err(format!("missing taxonomy in `{raw}`"));
    }
    let ids = ids
        .split(',')
        .map(|id| id.trim().parse::<u64>().map_err(|err| format!("bad id `{id}`: {err}")))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((taxonomy.to_owned(), ids))
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List posts of a post type
    Posts {
        #[arg(long, default_value = "post")]
        post_type: String,

        #[arg(long, value_enum)]
        order: Option<SortOrder>,

        #[arg(long)]
        order_by: Option<String>,

        /// Taxonomy filter, e.g. `category=3,4`
        #[arg(long = "filter", value_name = "TAXONOMY=IDS", value_parser = parse_filter)]
        filters: Vec<(String, Vec<u64>)>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Fetch one post
    Post {
        #[arg(long, default_value = "post")]
        post_type: String,

        #[command(flatten)]
        select: Selector,
    },

    /// List terms of a taxonomy
    Terms {
        #[arg(long, default_value = "category")]
        taxonomy: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Fetch one taxonomy term
    Term {
        #[arg(long, default_value = "category")]
        taxonomy: String,

        #[command(flatten)]
        select: Selector,
    },

    /// List users
    Users {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Fetch one user
    User {
        #[command(flatten)]
        select: Selector,
    },

    /// Fetch one media item
    Media {
        id: u64,
    },

    /// Site-wide search
    Search {
        query: String,

        /// Restrict to an object type (post, term, post-format)
        #[arg(long = "type")]
        kind: Option<String>,

        #[arg(long)]
        subtype: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        per_page: u32,
    },

    /// Fetch a navigation menu
    Menu {
        id: u64,
    },

    /// Translate a WordPress URL into a destination route
    Link {
        url: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_post_by_slug() {
        let cli = Cli::parse_from(["clutch", "post", "--slug", "hello-world"]);
        match cli.command {
            Commands::Post { post_type, select } => {
                assert_eq!(post_type, "post");
                assert_eq!(select.slug.as_deref(), Some("hello-world"));
                assert_eq!(select.id, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.config, PathBuf::from("clutch.toml"));
    }

    #[test]
    fn test_selector_requires_exactly_one() {
        assert!(Cli::try_parse_from(["clutch", "user"]).is_err());
        assert!(Cli::try_parse_from(["clutch", "user", "--id", "1", "--slug", "a"]).is_err());
        assert!(Cli::try_parse_from(["clutch", "user", "--id", "1"]).is_ok());
    }

    #[test]
    fn test_parse_posts_filters() {
        let cli = Cli::parse_from([
            "clutch",
            "-C",
            "site/clutch.toml",
            "posts",
            "--filter",
            "category=3,4",
            "--per-page",
            "5",
            "--order",
            "asc",
        ]);
        match cli.command {
            Commands::Posts {
                filters,
                page,
                order,
                ..
            } => {
                assert_eq!(filters, vec![("category".to_string(), vec![3, 4])]);
                assert_eq!(page.per_page, 5);
                assert_eq!(page.page, 1);
                assert_eq!(order, Some(SortOrder::Asc));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_filter_errors() {
        assert!(parse_filter("category").is_err());
        assert!(parse_filter("=3").is_err());
        assert!(parse_filter("category=x").is_err());
        assert_eq!(parse_filter("post_tag=7").unwrap(), ("post_tag".into(), vec![7]));
    }
}
