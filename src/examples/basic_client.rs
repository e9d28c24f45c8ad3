//! Basic Client Example
//!
//! Indexes a few documents, searches them and cleans up.
//! Needs a search server on http://localhost:9200 (or STRETCH_URL).
//!
//! Run with: cargo run -p stretch-rs --example basic_client

use serde_json::json;
use stretch_rs::{GetOptions, Params, Server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::var("STRETCH_URL").unwrap_or_else(|_| "http://localhost:9200".to_string());
    let server = Server::new(&url)?;

    if !server.is_up().await {
        println!("No server answering at {url}");
        return Ok(());
    }

    let index = server.index("stretch_example");
    if index.exists().await? {
        index.delete().await?;
    }
    index
        .create(&json!({"mappings": {"tweet": {"properties": {"message": {"type": "string"}}}}}))
        .await?;
    println!("Created index {}\n", index.name());

    // Bulk load
    let docs: Vec<_> = ["hello world", "hello again", "goodbye"]
        .iter()
        .enumerate()
        .filter_map(|(i, message)| {
            json!({"_type": "tweet", "_id": i + 1, "message": message})
                .as_object()
                .cloned()
        })
        .collect();
    index.bulk_index(&docs).await?;
    index.refresh().await?;

    let tweets = index.doc_type("tweet");
    let doc = tweets.get("1").await?;
    println!("Document 1: {doc}");

    let raw = tweets.get_with("2", &GetOptions::raw()).await?;
    println!("Document 2 (raw): {raw}\n");

    let res = tweets
        .search_with_params(
            &Params::new().with("size", 10),
            &json!({
                "query": {"match": {"message": "hello"}},
                "highlight": {"fields": {"message": {}}}
            }),
        )
        .await?;
    println!("Search for 'hello': {} hits", res.total());
    for (i, hit) in res.results().iter().enumerate() {
        println!("   {}. {:?} (score: {:?})", i + 1, hit.get("message"), hit.get("_score"));
        if let Some(highlight) = hit.get("_highlight") {
            println!("      highlight: {highlight}");
        }
    }

    let all = index
        .msearch(&[
            json!({"query": {"match_all": {}}}),
            json!({"query": {"match": {"message": "goodbye"}}}),
        ])
        .await?;
    println!("\nmsearch totals: {:?}", all.iter().map(|r| r.total()).collect::<Vec<_>>());

    index.delete().await?;
    Ok(())
}
