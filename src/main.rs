use std::env;

use ambi_scout::{AmbiClient, Config, Credentials, FilterCriteria};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = Config::from_env()?;
    let credentials = Credentials {
        username: env::var("AMBI_USERNAME")?,
        password: env::var("AMBI_PASSWORD")?,
    };

    let filters = FilterCriteria {
        search_keyword1: env::var("SEARCH_KEYWORD").ok(),
        income_min: env::var("INCOME_MIN").ok().and_then(|v| v.parse().ok()),
        max_pages: env::var("MAX_PAGES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1),
        ..Default::default()
    };

    let client = AmbiClient::new(cfg)?;
    let candidates = client.search_with_retries(&credentials, &filters).await?;

    println!("\n==============================");
    println!("TOTAL CANDIDATES FOUND: {}", candidates.len());
    println!("==============================\n");

    for candidate in &candidates {
        println!("{}", serde_json::to_string(candidate)?);
    }

    Ok(())
}
