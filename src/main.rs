use std::str::FromStr;

use clap::Parser;
use serde_json::{Value, json};
use scout::display::product_hits;
use scout::paginator::search_pages;
use scout::{EntityType, SearchClient, SearchOutcome, SearchRequest, Summary};

/// Search the course catalog through its GraphQL gateway.
#[derive(Debug, Parser)]
#[command(name = "scout", version)]
struct Args {
    /// Search term
    #[arg(long, default_value = "python")]
    query: String,

    /// Maximum number of results per page
    #[arg(long, default_value_t = 10)]
    limit: u32,

    /// Index to search: PRODUCTS or SUGGESTIONS
    #[arg(long, default_value = "PRODUCTS", value_parser = EntityType::from_str)]
    entity: EntityType,

    /// Also ask the suggestions index (sent with the first page only)
    #[arg(long)]
    suggestions: bool,

    /// Facet filter such as `productDifficultyLevel:Beginner` (repeatable)
    #[arg(long = "facet-filter")]
    facet_filters: Vec<String>,

    /// Follow the cursor for up to this many pages
    #[arg(long, default_value_t = 1)]
    pages: usize,

    /// Print the product hits as a JSON list
    #[arg(long, conflicts_with = "json")]
    extract: bool,

    /// Print the full responses as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(long)]
    debug: bool,
}

const SUGGESTION_LIMIT: u32 = 7;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let client = SearchClient::from_env()?;
    let primary = SearchRequest::new(args.entity, &args.query, args.limit)
        .with_facet_filters(args.facet_filters);

    let mut requests = vec![primary];
    if args.suggestions && args.entity != EntityType::Suggestions {
        requests.push(SearchRequest::suggestions(&args.query, SUGGESTION_LIMIT));
    }
    let summary = !args.extract && !args.json;
    if summary {
        println!("Searching for {:?}...", args.query);
    }
    let outcomes = search_pages(&client, &requests, args.pages).await?;

    if args.extract {
        println!("{}", serde_json::to_string_pretty(&product_hits(&outcomes))?);
    } else if args.json {
        let responses = outcomes
            .into_iter()
            .map(outcome_json)
            .collect::<Result<Vec<_>, _>>()?;
        println!("{}", serde_json::to_string_pretty(&Value::Array(responses))?);
    } else {
        print!("{}", Summary(&outcomes));
    }
    Ok(())
}

fn outcome_json(outcome: SearchOutcome) -> serde_json::Result<Value> {
    match outcome {
        Ok(response) => serde_json::to_value(response),
        Err(e) => Ok(json!({ "error": e.to_string() })),
    }
}
