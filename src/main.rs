use thread_ext::{Config, SpawnResult, ThreadPool};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;


fn main() -> SpawnResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let now = Instant::now();
    let pool = ThreadPool::with_config(Config::cpu_bound())?;

    let handles = (0..100_000u64)
        .map(|i| pool.submit(move || i * i))
        .collect::<SpawnResult<Vec<_>>>()?;
    let delayed = pool.schedule(|| "delayed", Duration::from_millis(50))?;

    let mut sum = 0u64;
    for handle in handles {
        sum = sum.wrapping_add(handle.join()?);
    }
    let tag = delayed.join()?;

    let metrics = pool.metrics();
    pool.shutdown();

    println!("sum: {}, {}: {:?}", sum, tag, now.elapsed());
    println!(
        "completed: {}, failed: {}, success rate: {:.1}%",
        metrics.completed_tasks,
        metrics.failed_tasks,
        metrics.success_rate() * 100.0
    );
    Ok(())
}
