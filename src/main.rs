use std::path::PathBuf;

use mnema::cli::{Cli, Commands, ConfigAction};
use mnema::config::Config;
use mnema::error::{MnemaError, Result};
use mnema::item::NewItem;
use mnema::{KnowledgeItem, KnowledgeService};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    // Config commands must work without loading the embedding model
    if let Commands::Config { action } = &cli.command {
        return cmd_config(cli.config, action);
    }

    let config = Config::load_or_default(cli.config.as_deref())?;
    let service = KnowledgeService::open(&config)?;

    match cli.command {
        Commands::Add {
            title,
            content,
            file,
            tags,
        } => cmd_add(&service, title, content, file, tags),
        Commands::Search {
            query,
            limit,
            threshold,
            json,
        } => cmd_search(&service, &config, &query, limit, threshold, json),
        Commands::Tags { query, limit } => cmd_tags(&service, &query, limit),
        Commands::List { json } => cmd_list(&service, json),
        Commands::Show { id } => cmd_show(&service, id),
        Commands::Delete { id } => cmd_delete(&service, id),
        Commands::Stats => cmd_stats(&service),
        Commands::Config { .. } => unreachable!("handled above"),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "mnema=debug" } else { "mnema=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn cmd_add(
    service: &KnowledgeService,
    title: String,
    content: Option<String>,
    file: Option<PathBuf>,
    tags: Option<String>,
) -> Result<()> {
    // Empty content is rejected here, not in the pipeline
    let new_item = match (content, file) {
        (Some(text), None) => {
            if text.trim().is_empty() {
                return Err(MnemaError::Config(
                    "Note content must not be empty".to_string(),
                ));
            }
            NewItem {
                title,
                text_content: text,
                original_filename: None,
                tags_csv: tags,
            }
        }
        (None, Some(path)) => {
            let text = std::fs::read_to_string(&path).map_err(|e| MnemaError::Io {
                source: e,
                context: format!("Failed to read {}", path.display()),
            })?;
            if text.trim().is_empty() {
                return Err(MnemaError::Config(format!(
                    "File {} contains no text",
                    path.display()
                )));
            }
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned());
            NewItem {
                title,
                text_content: text,
                original_filename: filename,
                tags_csv: tags,
            }
        }
        _ => {
            return Err(MnemaError::Config(
                "Provide exactly one of --content or --file".to_string(),
            ));
        }
    };

    let item = service.ingest(new_item)?;

    println!("✓ Added item {} ({})", item.id, item.title);
    if !item.tags.is_empty() {
        println!("  Tags: {}", item.tags.join(", "));
    }

    Ok(())
}

fn cmd_search(
    service: &KnowledgeService,
    config: &Config,
    query: &str,
    limit: Option<usize>,
    threshold: Option<f32>,
    json: bool,
) -> Result<()> {
    let top_k = limit.unwrap_or(config.search.default_top_k);
    let threshold = threshold.unwrap_or(config.search.default_threshold);

    let results = service.hybrid_search(query, top_k, threshold)?;

    if json {
        let items: Vec<&KnowledgeItem> = results.iter().map(|r| &r.item).collect();
        println!("{}", serde_json::to_string_pretty(&items).map_err(anyhow::Error::from)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results for \"{}\"", query);
        return Ok(());
    }

    for (rank, result) in results.iter().enumerate() {
        println!(
            "{}. [{}] {} (score {:.2}{})",
            rank + 1,
            result.item.id,
            result.item.title,
            result.combined_score,
            if result.exact { ", exact" } else { "" },
        );
        if !result.item.tags.is_empty() {
            println!("   tags: {}", result.item.tags.join(", "));
        }
        println!("   {}", snippet(&result.item.text_content, 100));
    }

    Ok(())
}

fn cmd_tags(service: &KnowledgeService, query: &str, limit: usize) -> Result<()> {
    let results = service.tag_search(query, limit)?;

    if results.is_empty() {
        println!("No tagged items close to \"{}\"", query);
        return Ok(());
    }

    for (rank, item) in results.iter().enumerate() {
        println!(
            "{}. [{}] {} (tags: {})",
            rank + 1,
            item.id,
            item.title,
            item.tags.join(", ")
        );
    }

    Ok(())
}

fn cmd_list(service: &KnowledgeService, json: bool) -> Result<()> {
    let items = service.list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&items).map_err(anyhow::Error::from)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("Store is empty");
        return Ok(());
    }

    for item in &items {
        let kind = if item.is_document() { "doc " } else { "note" };
        println!(
            "[{}] {} {} ({})",
            item.id,
            kind,
            item.title,
            item.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}

fn cmd_show(service: &KnowledgeService, id: i64) -> Result<()> {
    let item = service.get(id)?;

    println!("Title:   {}", item.title);
    if let Some(filename) = &item.original_filename {
        println!("Source:  {}", filename);
    }
    if !item.tags.is_empty() {
        println!("Tags:    {}", item.tags.join(", "));
    }
    println!("Created: {}", item.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Updated: {}", item.updated_at.format("%Y-%m-%d %H:%M:%S"));
    println!();
    println!("{}", item.text_content);

    Ok(())
}

fn cmd_delete(service: &KnowledgeService, id: i64) -> Result<()> {
    service.delete(id)?;
    println!("✓ Deleted item {}", id);
    Ok(())
}

fn cmd_stats(service: &KnowledgeService) -> Result<()> {
    let stats = service.stats()?;

    println!("Items:          {}", stats.item_count);
    println!("  from files:   {}", stats.document_count);
    println!("  embedded:     {}", stats.embedded_count);
    println!("  with tag vec: {}", stats.tagged_count);

    Ok(())
}

fn cmd_config(path: Option<PathBuf>, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init { force } => {
            let target = path.unwrap_or_else(Config::default_path);
            if target.exists() && !force {
                return Err(MnemaError::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    target.display()
                )));
            }
            Config::default().save(&target)?;
            println!("✓ Wrote default config to {}", target.display());
            Ok(())
        }
        ConfigAction::Show => {
            let config = Config::load_or_default(path.as_deref())?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn snippet(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim().replace('\n', " ");
    if trimmed.chars().count() <= max_chars {
        trimmed
    } else {
        let cut: String = trimmed.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}
