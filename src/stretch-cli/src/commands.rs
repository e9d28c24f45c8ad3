use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use stretch_rs::{Document, GetOptions, Params, SearchResults, Server};

use crate::{Command, IndexCommand, SearchArgs};

pub async fn run(server: &Server, command: Command) -> Result<()> {
    match command {
        Command::Info => print_json(&server.info().await?),
        Command::Health => print_json(&server.cluster_health().await?),
        Command::Up => {
            if server.is_up().await {
                println!("up");
                Ok(())
            } else {
                bail!("{} is not answering", server.base_url());
            }
        }
        Command::Index(cmd) => run_index(server, cmd).await,
        Command::Search(args) => run_search(server, args).await,
        Command::Get(args) => {
            let options = GetOptions {
                fields: args.fields,
                raw: args.raw,
                ..GetOptions::default()
            };
            let doc = server
                .index(args.index)
                .doc_type(args.doc_type)
                .get_with(&args.id, &options)
                .await?;
            print_json(&doc)
        }
        Command::Put(args) => {
            let source = parse_json(&args.source, "document")?;
            let res = server
                .index(args.index)
                .doc_type(args.doc_type)
                .put(&args.id, &source)
                .await?;
            print_json(&res)
        }
        Command::Delete { index, doc_type, id } => {
            match server.index(index).doc_type(doc_type).delete(&id).await? {
                Some(res) => print_json(&res),
                None => {
                    tracing::warn!("Document {} did not exist", id);
                    Ok(())
                }
            }
        }
        Command::Bulk { index, file } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let docs = parse_documents(&contents)?;
            tracing::info!("Bulk indexing {} documents into {}", docs.len(), index);
            let res = server.index(index).bulk_index(&docs).await?;
            print_json(&res)
        }
        Command::Analyze {
            text,
            index,
            analyzer,
        } => {
            let params: Params = analyzer.into_iter().map(|a| ("analyzer", a)).collect();
            let res = match index {
                Some(name) => server.index(name).analyze(&text, &params).await?,
                None => server.analyze(&text, &params).await?,
            };
            print_json(&res)
        }
    }
}

async fn run_index(server: &Server, cmd: IndexCommand) -> Result<()> {
    let res = match cmd {
        IndexCommand::Create { name, body } => {
            let options = match body {
                Some(body) => parse_json(&body, "index body")?,
                None => json!({}),
            };
            server.index(name).create(&options).await?
        }
        IndexCommand::Delete { name } => server.index(name).delete().await?,
        IndexCommand::Exists { name } => {
            let exists = server.index(&name).exists().await?;
            json!({ "index": name, "exists": exists })
        }
        IndexCommand::Stats { name } => server.index(name).stats().await?,
        IndexCommand::Mapping { name } => server.index(name).get_mapping().await?,
        IndexCommand::Settings { name } => server.index(name).get_settings().await?,
        IndexCommand::Refresh { name } => server.index(name).refresh().await?,
    };
    print_json(&res)
}

async fn run_search(server: &Server, args: SearchArgs) -> Result<()> {
    let body = match &args.query {
        Some(q) => parse_json(q, "query")?,
        None => json!({ "query": { "match_all": {} } }),
    };
    let params: Params = args.params.into_iter().collect();

    let index = server.index(args.index);
    let results = match args.doc_type {
        Some(doc_type) => index.doc_type(doc_type).search_with_params(&params, &body).await?,
        None => index.search_with_params(&params, &body).await?,
    };
    print_json(&search_summary(&results))
}

fn search_summary(results: &SearchResults) -> Value {
    let mut summary = json!({
        "total": results.total(),
        "results": results.results(),
    });
    if let Some(facets) = results.facets() {
        summary["facets"] = facets.clone();
    }
    if let Some(aggregations) = results.aggregations() {
        summary["aggregations"] = aggregations.clone();
    }
    summary
}

fn parse_json(text: &str, what: &str) -> Result<Value> {
    serde_json::from_str(text).with_context(|| format!("{what} is not valid JSON"))
}

/// A bulk file holds one JSON array of objects
fn parse_documents(contents: &str) -> Result<Vec<Document>> {
    let value = parse_json(contents, "bulk file")?;
    let Value::Array(items) = value else {
        bail!("bulk file must contain a JSON array of documents");
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(doc) => Ok(doc),
            _ => bail!("bulk document {i} is not a JSON object"),
        })
        .collect()
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
