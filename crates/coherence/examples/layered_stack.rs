//! Sharding over coalescing over delayed double delete, with tracing output

use coherence::TracingMetrics;
use coherence::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // 1. One shared system of record, slow enough for reads to overlap
    let database = MemoryDatabase::<String>::new().with_read_latency(Duration::from_millis(50));
    database.upsert("user:1", "ada".to_string()).await?;

    // 2. Four buckets, each its own cache with its own decorators
    let metrics = TracingMetrics::new().with_service_name("layered-stack");
    let buckets = (0..4)
        .map(|_| {
            let ddd = DoubleDeleteCache::builder(MemoryCache::with_defaults(), database.clone())
                .delay(Duration::from_millis(200))
                .metrics(metrics.clone())
                .build();
            CoalescingCache::<_, String>::new(ddd).with_metrics(metrics.clone())
        })
        .collect();
    let cache = Arc::new(ShardedCache::new(buckets)?);

    println!("user:1 lives in bucket {}", cache.bucket_index("user:1")?);

    // 3. Ten concurrent readers share one database fetch
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get("user:1").await })
        })
        .collect();
    for handle in handles {
        println!("read: {}", handle.await??);
    }

    // 4. Write, then read back through the stack
    cache.set("user:1", "grace".to_string()).await?;
    println!("after write: {}", cache.get("user:1").await?);

    // 5. Let the delayed second delete run
    tokio::time::sleep(Duration::from_millis(300)).await;

    Cache::<String>::delete(&cache, "user:1").await?;
    match Cache::<String>::get(&cache, "user:1").await {
        Err(CacheError::Miss) => println!("user:1 is gone"),
        other => println!("unexpected: {other:?}"),
    }

    Ok(())
}
