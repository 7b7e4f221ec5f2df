//! Clutch - a headless WordPress client.

use anyhow::{Result, bail};
use clap::Parser;
use clutch::cli::{Cli, Commands, PageArgs, Selector};
use clutch::logger::set_verbose;
use clutch::{Client, ClientConfig, PostQuery, SearchQuery, TermQuery, UserQuery, log_verbose};
use serde::Serialize;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    set_verbose(cli.verbose);

    let config = load_config(&cli)?;
    let client = Client::new(&config)?;
    run(&client, &cli.command).await
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = if cli.config.exists() {
        ClientConfig::from_path(&cli.config)?
    } else {
        ClientConfig::default()
    };
    config.update_with_cli(cli);

    // `--site` alone is enough to run without a config file
    if !config.config_path.exists() && cli.site.is_none() {
        bail!("Config file not found.");
    }
    config.validate()?;

    log_verbose!("config"; "site {}", config.site.url);
    Ok(config)
}

async fn run(client: &Client, command: &Commands) -> Result<()> {
    match command {
        Commands::Posts {
            post_type,
            order,
            order_by,
            filters,
            page,
        } => {
            let mut query = PostQuery::new(post_type.as_str()).page(page.page, page.per_page);
            query.search = page.search.clone();
            query.order = order.map(Into::into);
            query.order_by = order_by.clone();
            query.taxonomies = filters.clone();
            print(&client.fetch_posts(&query).await)
        }
        Commands::Post { post_type, select } => {
            let post = match select_key(select)? {
                Key::Id(id) => client.fetch_post_by_id(id, Some(post_type.as_str())).await,
                Key::Slug(slug) => client.fetch_post_by_slug(slug, post_type).await,
            };
            print_found("post", post)
        }
        Commands::Terms { taxonomy, page } => {
            let mut query = TermQuery::new(taxonomy.as_str()).page(page.page, page.per_page);
            query.search = page.search.clone();
            print(&client.fetch_taxonomy_terms(&query).await)
        }
        Commands::Term { taxonomy, select } => {
            let term = match select_key(select)? {
                Key::Id(id) => client.fetch_taxonomy_term_by_id(taxonomy, id).await,
                Key::Slug(slug) => client.fetch_taxonomy_term_by_slug(taxonomy, slug).await,
            };
            print_found("term", term)
        }
        Commands::Users { page } => print(&client.fetch_users(&user_query(page)).await),
        Commands::User { select } => {
            let user = match select_key(select)? {
                Key::Id(id) => client.fetch_user_by_id(id).await,
                Key::Slug(slug) => client.fetch_user_by_slug(slug).await,
            };
            print_found("user", user)
        }
        Commands::Media { id } => print_found("media", client.fetch_media_by_id(*id).await),
        Commands::Search {
            query,
            kind,
            subtype,
            page,
            per_page,
        } => {
            let query = SearchQuery {
                search: query.clone(),
                kind: kind.clone(),
                subtype: subtype.clone(),
                page: Some(*page),
                per_page: Some(*per_page),
            };
            print(&client.fetch_search_results(&query).await)
        }
        Commands::Menu { id } => print_found("menu", client.fetch_menu_by_id(*id).await),
        Commands::Link { url } => {
            println!("{}", client.resolve_link(url).await);
            Ok(())
        }
    }
}

enum Key<'a> {
    Id(u64),
    Slug(&'a str),
}

fn select_key(select: &Selector) -> Result<Key<'_>> {
    match (select.id, select.slug.as_deref()) {
        (Some(id), _) => Ok(Key::Id(id)),
        (None, Some(slug)) => Ok(Key::Slug(slug)),
        (None, None) => bail!("either --id or --slug is required"),
    }
}

fn user_query(page: &PageArgs) -> UserQuery {
    UserQuery {
        page: Some(page.page),
        per_page: Some(page.per_page),
        search: page.search.clone(),
    }
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_found<T: Serialize>(kind: &str, value: Option<T>) -> Result<()> {
    match value {
        Some(value) => print(&value),
        None => bail!("{kind} not found"),
    }
}
