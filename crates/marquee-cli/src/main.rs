use std::io::IsTerminal;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use marquee_core::clean::TitleCleaner;
use marquee_core::config::AppConfig;
use marquee_core::matcher::MatchStrategy;
use marquee_core::models::MediaKind;
use marquee_core::season::extract_season;
use marquee_runtime::{ListingQuery, ResourceQuery, RuntimeError};

#[derive(Parser)]
#[command(name = "marquee")]
#[command(about = "Match titles to TMDB metadata and find VOD streams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Strip subtitles, parentheticals, season markers and noise tokens
    Clean {
        titles: Vec<String>,
    },
    /// Show the base name and season parsed from a title
    Season {
        title: String,
    },
    /// Resolve titles to TMDB metadata
    Lookup {
        #[arg(required = true)]
        titles: Vec<String>,
        #[arg(short, long, value_enum, default_value_t = KindArg::Tv)]
        kind: KindArg,
        #[arg(short, long)]
        season: Option<u32>,
        /// Fallback when no name matches exactly (default from config)
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
        /// Skip the on-disk result cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Resolve one page of the Douban hot list to TMDB metadata
    Hot {
        #[arg(short, long, value_enum, default_value_t = KindArg::Movie)]
        kind: KindArg,
        /// Listing section, e.g. 热门 or 豆瓣高分 (films), tv or show (series)
        #[arg(short, long)]
        category: Option<String>,
        /// Region or genre filter, e.g. 华语 (films), tv_domestic (series)
        #[arg(short = 't', long = "type")]
        list_type: Option<String>,
        /// Minimum rating, 0 to 9
        #[arg(short, long, default_value_t = 0)]
        rating: u8,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        /// Fallback when no name matches exactly (default from config)
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
        /// Skip the on-disk result cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Find playable streams on the configured VOD sites
    Resources {
        name: String,
        #[arg(short, long, value_enum, default_value_t = KindArg::Tv)]
        kind: KindArg,
        /// Overrides the season parsed from the name
        #[arg(short, long)]
        season: Option<u32>,
        #[arg(short, long)]
        episode: Option<u32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Movie,
    Tv,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Movie => MediaKind::Movie,
            KindArg::Tv => MediaKind::Tv,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Similarity,
    Recency,
}

impl From<StrategyArg> for MatchStrategy {
    fn from(strategy: StrategyArg) -> Self {
        match strategy {
            StrategyArg::Similarity => MatchStrategy::ByLexicalSimilarity,
            StrategyArg::Recency => MatchStrategy::ByRecency,
        }
    }
}

#[derive(Serialize)]
struct CleanedTitle<'a> {
    raw: &'a str,
    cleaned: String,
    query: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), RuntimeError> {
    let config = AppConfig::load()?;

    match cli.command {
        Command::Clean { titles } => {
            let cleaner = TitleCleaner::new(&config.matching.noise_tokens)?;
            let cleaned: Vec<CleanedTitle> = titles
                .iter()
                .map(|raw| CleanedTitle {
                    raw,
                    cleaned: cleaner.clean(raw),
                    query: cleaner.query_for(raw),
                })
                .collect();
            print_json(&cleaned)
        }
        Command::Season { title } => print_json(&extract_season(&title)),
        Command::Lookup {
            titles,
            kind,
            season,
            strategy,
            no_cache,
        } => {
            let lookup = marquee_runtime::tmdb_lookup(&config, cache_for(&config, no_cache))?;
            let strategy = strategy.map(MatchStrategy::from);

            if let [title] = titles.as_slice() {
                let item = lookup
                    .resolve_title(title, kind.into(), season, strategy)
                    .await?;
                print_json(&item)
            } else {
                let items = lookup
                    .resolve_many(&titles, kind.into(), season, strategy)
                    .await;
                print_json(&items)
            }
        }
        Command::Hot {
            kind,
            category,
            list_type,
            rating,
            page,
            strategy,
            no_cache,
        } => {
            let query = listing_query(kind, category, list_type, rating, page);
            let listing = marquee_runtime::douban_listing(&config)?;
            let lookup = marquee_runtime::tmdb_lookup(&config, cache_for(&config, no_cache))?;
            let items = marquee_runtime::resolve_listing(
                &listing,
                &lookup,
                &query,
                strategy.map(MatchStrategy::from),
            )
            .await?;
            print_json(&items)
        }
        Command::Resources {
            name,
            kind,
            season,
            episode,
        } => {
            let sites = marquee_runtime::vod_clients(&config);
            let query = ResourceQuery {
                series_name: name,
                kind: kind.into(),
                season,
                episode,
            };
            let resources = marquee_runtime::load_resources(&sites, &query).await;
            print_json(&resources)
        }
    }
}

fn cache_for(config: &AppConfig, no_cache: bool) -> Option<marquee_runtime::SharedCache> {
    if no_cache {
        return None;
    }
    marquee_runtime::open_cache(config).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Result cache unavailable");
        None
    })
}

/// Start from the per-kind defaults and apply whatever was given.
fn listing_query(
    kind: KindArg,
    category: Option<String>,
    list_type: Option<String>,
    rating: u8,
    page: u32,
) -> ListingQuery {
    let mut query = match kind {
        KindArg::Movie => ListingQuery::movie(),
        KindArg::Tv => ListingQuery::tv(),
    };
    if let Some(category) = category {
        query.category = category;
    }
    if let Some(list_type) = list_type {
        query.list_type = list_type;
    }
    query.min_rating = rating;
    query.page = page;
    query
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), RuntimeError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| RuntimeError::Core(e.into()))?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_lookup_args() {
        let cli = Cli::try_parse_from([
            "marquee", "lookup", "庆余年", "--kind", "tv", "--season", "2", "--strategy", "recency",
            "--no-cache",
        ])
        .unwrap();
        match cli.command {
            Command::Lookup {
                titles,
                season,
                strategy,
                no_cache,
                ..
            } => {
                assert_eq!(titles, vec!["庆余年".to_string()]);
                assert_eq!(season, Some(2));
                assert!(matches!(strategy, Some(StrategyArg::Recency)));
                assert!(no_cache);
            }
            _ => panic!("expected lookup"),
        }
    }

    #[test]
    fn test_lookup_requires_title() {
        assert!(Cli::try_parse_from(["marquee", "lookup"]).is_err());
    }

    #[test]
    fn test_resources_defaults_to_tv() {
        let cli = Cli::try_parse_from(["marquee", "resources", "庆余年", "-e", "3"]).unwrap();
        match cli.command {
            Command::Resources { kind, episode, .. } => {
                assert!(matches!(MediaKind::from(kind), MediaKind::Tv));
                assert_eq!(episode, Some(3));
            }
            _ => panic!("expected resources"),
        }
    }

    #[test]
    fn test_hot_defaults_to_movies() {
        let cli = Cli::try_parse_from(["marquee", "hot"]).unwrap();
        match cli.command {
            Command::Hot {
                kind,
                category,
                list_type,
                rating,
                page,
                ..
            } => {
                let query = listing_query(kind, category, list_type, rating, page);
                assert_eq!(query, ListingQuery::movie());
            }
            _ => panic!("expected hot"),
        }
    }

    #[test]
    fn test_hot_args_override_kind_defaults() {
        let cli = Cli::try_parse_from([
            "marquee", "hot", "--kind", "tv", "--type", "tv_domestic", "-r", "7", "-p", "2",
            "--no-cache",
        ])
        .unwrap();
        match cli.command {
            Command::Hot {
                kind,
                category,
                list_type,
                rating,
                page,
                no_cache,
                ..
            } => {
                let query = listing_query(kind, category, list_type, rating, page);
                assert_eq!(query.kind, MediaKind::Tv);
                assert_eq!(query.category, "tv");
                assert_eq!(query.list_type, "tv_domestic");
                assert_eq!(query.min_rating, 7);
                assert_eq!(query.page, 2);
                assert!(no_cache);
            }
            _ => panic!("expected hot"),
        }
    }

    #[test]
    fn test_lookup_many_keeps_season() {
        let cli =
            Cli::try_parse_from(["marquee", "lookup", "庆余年", "狂飙", "-s", "2"]).unwrap();
        match cli.command {
            Command::Lookup { titles, season, .. } => {
                assert_eq!(titles.len(), 2);
                assert_eq!(season, Some(2));
            }
            _ => panic!("expected lookup"),
        }
    }
}
