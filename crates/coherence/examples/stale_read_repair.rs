//! A slow reader refills the cache with a stale row; the delayed second
//! delete removes it.

use coherence::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coherence=debug".into()),
        )
        .init();

    let database = MemoryDatabase::<String>::new().with_read_latency(Duration::from_millis(100));
    database.upsert("price", "10".to_string()).await?;

    let memory = MemoryCache::<String>::with_defaults();
    let cache = Arc::new(
        DoubleDeleteCache::builder(memory.clone(), database.clone())
            .delay(Duration::from_millis(300))
            .error_handler(|err| eprintln!("background repair failed: {err}"))
            .build(),
    );

    // Reader misses and loads "10" from the database
    let reader = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.get("price").await })
    };
    sleep(Duration::from_millis(20)).await;

    // Writer updates the row while the read is still in flight
    cache.set("price", "12".to_string()).await?;
    println!("database now holds {:?}", database.row("price"));

    println!("reader got {}", reader.await??);
    println!("cache after stale refill: {:?}", memory.peek("price"));

    sleep(Duration::from_millis(400)).await;
    println!("cache after second delete: {:?}", memory.peek("price"));
    println!("fresh read: {}", cache.get("price").await?);

    Ok(())
}
