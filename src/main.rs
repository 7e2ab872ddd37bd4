//! Marginalia CLI
//!
//! Fetches annotations from a running Zotero's local API (preferring
//! the Better BibTeX bridge when available) and renders them as
//! org-mode, Markdown, or raw JSON. Status messages go to stderr so
//! `--stdout` output stays clean for piping.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use marginalia::annotations::{CollectionAnnotations, ItemAnnotations, Library};
use marginalia::api::ZoteroClient;
use marginalia::bbt::BetterBibTexClient;
use marginalia::citekey::CitekeyResolver;
use marginalia::config::Config;
use marginalia::render::{
    assemble_collection, assemble_item, render_annotation_listing, ChapterMaps, Syntax,
};
use marginalia::toc::ChapterMapService;

/// Export Zotero annotations as structured plain text
#[derive(Parser, Debug)]
#[command(name = "marginalia")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Numeric library id (1 = personal library)
    #[arg(short, long, global = true, default_value_t = 1)]
    library: i64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export the annotations of one item
    Item {
        /// Zotero item key
        key: String,

        #[command(flatten)]
        output: OutputArgs,

        /// Citation key to use instead of resolving one
        #[arg(long)]
        cite_key: Option<String>,
    },

    /// Export the annotations of every item in a collection
    Collection {
        /// Zotero collection key
        key: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print a flat listing of one item's annotations to stdout
    List {
        /// Zotero item key
        key: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ListFormat::Org)]
        format: ListFormat,
    },

    /// List group libraries visible to the running Zotero
    Libraries,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ListFormat {
    Org,
    Markdown,
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Org)]
    format: Format,

    /// Write to this file instead of annotations_{key}.{ext}
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the document to stdout instead of a file
    #[arg(long)]
    stdout: bool,

    /// Skip chapter map extraction (no chapter headings)
    #[arg(long)]
    no_chapters: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Org,
    Markdown,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "marginalia=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env();
    debug!(api = %config.api.base_url, "configuration loaded");

    let cli = Cli::parse();
    let library = Library::from_id(cli.library);
    let api = ZoteroClient::new(&config.api);
    let bbt = BetterBibTexClient::new(&config.bbt);

    match cli.command {
        Commands::Item {
            key,
            output,
            cite_key,
        } => {
            let item = fetch_item(&api, &bbt, &key, &library).await;
            if let Some(error) = &item.error {
                anyhow::bail!("{}", error);
            }
            info!(
                title = %item.title,
                attachments = item.attachments.len(),
                annotations = item.annotation_count(),
                "item fetched"
            );

            let citation_key = match cite_key {
                Some(key) => Some(key),
                None => match &item.citation_key {
                    Some(key) => Some(key.clone()),
                    None => {
                        CitekeyResolver::standard(bbt, api)
                            .resolve(&key, &library)
                            .await
                    }
                },
            };

            let chapter_maps = if output.no_chapters {
                ChapterMaps::new()
            } else {
                ChapterMapService::new(config.toc.clone(), &config.storage)
                    .chapter_maps_for_item(&item)
            };

            let document = match output.format {
                Format::Org => assemble_item(
                    &item,
                    &library,
                    citation_key.as_deref(),
                    &chapter_maps,
                    Syntax::Org,
                ),
                Format::Markdown => assemble_item(
                    &item,
                    &library,
                    citation_key.as_deref(),
                    &chapter_maps,
                    Syntax::Markdown,
                ),
                Format::Json => serde_json::to_string_pretty(&ItemAnnotations {
                    citation_key,
                    ..item.clone()
                })?,
            };
            write_document(&document, &output, &key)?;
        }

        Commands::Collection { key, output } => {
            let collection = api.collection_annotations(&key, &library).await;
            if let Some(error) = &collection.error {
                anyhow::bail!("{}", error);
            }
            info!(
                name = %collection.name,
                items = collection.items.len(),
                "collection fetched"
            );

            let collection = resolve_collection_citekeys(collection, &bbt, &api, &library).await;

            let chapter_maps = if output.no_chapters {
                ChapterMaps::new()
            } else {
                let service = ChapterMapService::new(config.toc.clone(), &config.storage);
                let mut maps = ChapterMaps::new();
                for item in &collection.items {
                    maps.extend(service.chapter_maps_for_item(item));
                }
                maps
            };

            let document = match output.format {
                Format::Org => assemble_collection(&collection, &chapter_maps, Syntax::Org),
                Format::Markdown => {
                    assemble_collection(&collection, &chapter_maps, Syntax::Markdown)
                }
                Format::Json => serde_json::to_string_pretty(&collection)?,
            };
            write_document(&document, &output, &key)?;
        }

        Commands::List { key, format } => {
            let item = fetch_item(&api, &bbt, &key, &library).await;
            if let Some(error) = &item.error {
                anyhow::bail!("{}", error);
            }
            let syntax = match format {
                ListFormat::Org => Syntax::Org,
                ListFormat::Markdown => Syntax::Markdown,
            };
            println!(
                "{}",
                render_annotation_listing(&item, &library, None, syntax)
            );
        }

        Commands::Libraries => {
            let groups = api
                .libraries()
                .await
                .context("listing libraries (is Zotero running?)")?;
            println!("1\tPersonal Library");
            for group in groups {
                println!("{}\t{}", group.id, group.display_name());
            }
        }
    }

    Ok(())
}

/// Fetch one item, preferring Better BibTeX for its richer records.
async fn fetch_item(
    api: &ZoteroClient,
    bbt: &BetterBibTexClient,
    item_key: &str,
    library: &Library,
) -> ItemAnnotations {
    if bbt.is_available().await {
        match bbt.item_annotations(item_key, library).await {
            Ok(item) => return item,
            Err(e) => {
                warn!(error = %e, "Better BibTeX fetch failed, falling back to local API");
            }
        }
    }
    api.item_annotations(item_key, library).await
}

/// Fill in citation keys for collection items that lack one.
async fn resolve_collection_citekeys(
    mut collection: CollectionAnnotations,
    bbt: &BetterBibTexClient,
    api: &ZoteroClient,
    library: &Library,
) -> CollectionAnnotations {
    let resolver = CitekeyResolver::standard(bbt.clone(), api.clone());
    for item in &mut collection.items {
        if item.citation_key.is_none() {
            item.citation_key = resolver.resolve(&item.key, library).await;
        }
    }
    collection
}

fn write_document(document: &str, output: &OutputArgs, key: &str) -> anyhow::Result<()> {
    if output.stdout {
        println!("{}", document);
        return Ok(());
    }

    let path = match &output.output {
        Some(path) => path.clone(),
        None => {
            let extension = match output.format {
                Format::Org => Syntax::Org.extension(),
                Format::Markdown => Syntax::Markdown.extension(),
                Format::Json => "json",
            };
            PathBuf::from(format!("annotations_{}.{}", key, extension))
        }
    };

    let mut file = std::fs::File::create(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    file.write_all(document.as_bytes())?;
    file.write_all(b"\n")?;
    info!(path = %path.display(), "saved");
    Ok(())
}
