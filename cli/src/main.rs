use anyhow::{bail, Context, Result};
use chief_core::{load_pantry, DataPaths, Normalizer, Pantry, RecipeId, Vocabulary};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "chief")]
#[command(about = "Find recipes for the ingredients you have on hand", long_about = None)]
struct Cli {
    /// Directory holding Recipes.json and ing.json
    #[arg(long, global = true, default_value = "./data")]
    data: String,
    /// JSON file with {"add": {...}, "remove": {...}} vocabulary overrides
    #[arg(long, global = true)]
    vocabulary: Option<String>,
    /// Print JSON instead of text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the datasets and report what was loaded and skipped
    Stats,
    /// Rank recipes against the ingredients you have
    Match {
        /// An ingredient on hand; repeat for more. None lists the whole corpus.
        #[arg(long = "have")]
        have: Vec<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Autocomplete an ingredient from the catalog
    Suggest {
        query: String,
        #[arg(long, default_value_t = chief_core::DEFAULT_SUGGESTION_LIMIT)]
        limit: usize,
    },
    /// Print the comparison key of each phrase
    Normalize { phrases: Vec<String> },
    /// Print one recipe
    Show { id: RecipeId },
}

#[derive(Serialize)]
struct Hit<'a> {
    id: RecipeId,
    title: &'a str,
    matches: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let vocabulary = match &cli.vocabulary {
        Some(path) => Vocabulary::from_overrides_file(path)?,
        None => Vocabulary::default(),
    };
    let normalizer = Arc::new(Normalizer::new(vocabulary));

    if let Commands::Normalize { phrases } = &cli.command {
        return normalize_phrases(&normalizer, phrases, cli.json);
    }

    let paths = DataPaths::new(&cli.data);
    let pantry = load_pantry(&paths, normalizer)
        .with_context(|| format!("loading datasets from {}", paths.root.display()))?;

    match cli.command {
        Commands::Stats => stats(&pantry, cli.json),
        Commands::Match { have, limit } => match_recipes(&pantry, &have, limit, cli.json),
        Commands::Suggest { query, limit } => suggestions(&pantry, &query, limit, cli.json),
        Commands::Show { id } => show(&pantry, id, cli.json),
        Commands::Normalize { .. } => Ok(()),
    }
}

fn normalize_phrases(normalizer: &Normalizer, phrases: &[String], json: bool) -> Result<()> {
    let keys: Vec<(&str, String)> = phrases.iter().map(|p| (p.as_str(), normalizer.normalize(p))).collect();
    if json {
        let rows: Vec<_> = keys.iter().map(|(p, k)| serde_json::json!({ "phrase": p, "key": k })).collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for (phrase, key) in keys {
            println!("{phrase}\t{key}");
        }
    }
    Ok(())
}

fn stats(pantry: &Pantry, json: bool) -> Result<()> {
    let index = pantry.index.stats();
    if json {
        let out = serde_json::json!({
            "recipes": pantry.corpus.len(),
            "report": pantry.report,
            "index": index,
            "catalog": pantry.catalog.len(),
            "catalog_skipped": pantry.catalog_report.skipped,
            "catalog_error": pantry.catalog_error,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    println!("recipes:        {}", pantry.corpus.len());
    println!("skipped:        {}", pantry.report.skipped);
    println!("fallback lists: {}", pantry.report.fallbacks);
    println!("ingredient keys: {} ({} postings)", index.num_keys, index.num_postings);
    println!("catalog:        {} (skipped {})", pantry.catalog.len(), pantry.catalog_report.skipped);
    if let Some(err) = &pantry.catalog_error {
        println!("catalog error:  {err}");
    }
    for skipped in &pantry.report.records {
        println!("  record {}: {}", skipped.position, skipped.reason);
    }
    Ok(())
}

fn match_recipes(pantry: &Pantry, have: &[String], limit: usize, json: bool) -> Result<()> {
    let ranking = pantry.rank(have);
    tracing::info!(total_hits = ranking.len(), keys = ?ranking.keys(), "ranked");
    let hits: Vec<Hit> = ranking
        .window(limit)
        .iter()
        .map(|m| Hit { id: m.recipe.id, title: &m.recipe.title, matches: m.count, image: m.recipe.image() })
        .collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else {
        for hit in &hits {
            println!("{:>3}  {:>6}  {}", hit.matches, hit.id, hit.title);
        }
        println!("{} of {} recipes", hits.len(), ranking.len());
    }
    Ok(())
}

fn suggestions(pantry: &Pantry, query: &str, limit: usize, json: bool) -> Result<()> {
    let hits = pantry.suggest(query, limit);
    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else {
        for entry in hits {
            println!("{:>6}  {}", entry.use_count, entry.term);
        }
    }
    Ok(())
}

fn show(pantry: &Pantry, id: RecipeId, json: bool) -> Result<()> {
    let Some(recipe) = pantry.corpus.get(id) else {
        bail!("no recipe with id {id}");
    };
    if json {
        println!("{}", serde_json::to_string_pretty(recipe)?);
        return Ok(());
    }
    println!("{}\n", recipe.title);
    for (line, key) in recipe.ingredients.iter().zip(recipe.normalized_ingredients.iter()) {
        println!("  - {line}  [{key}]");
    }
    println!("\n{}", recipe.instructions);
    Ok(())
}
