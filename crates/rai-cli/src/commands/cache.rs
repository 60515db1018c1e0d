//! Cache commands - inspect and clear cached model artifacts.

use rai_coach::CoachConfig;

use super::open_disk_session;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

pub(crate) async fn status(json: bool) -> miette::Result<()> {
    let config = CoachConfig::from_env();
    let cache_dir = config.cache_dir();
    let session = open_disk_session(config).await?;
    let state = session.refresh_cache_status().await;

    if json {
        let out = serde_json::json!({
            "cache_dir": cache_dir,
            "cached": state.cached,
            "cache_size_bytes": state.cache_size_bytes,
        });
        println!("{}", out);
        return Ok(());
    }

    println!("Cache directory: {}", cache_dir.display());
    if state.cached {
        println!(
            "Cached models:   {:.2} GB",
            state.cache_size_bytes as f64 / GIB
        );
    } else {
        println!("No cached models found.");
    }
    Ok(())
}

pub(crate) async fn clear() -> miette::Result<()> {
    let config = CoachConfig::from_env();
    let session = open_disk_session(config).await?;

    let removed = session.clear_model_cache().await;
    if removed == 0 {
        println!("Cache is already empty.");
    } else {
        println!("Removed {} cache partition(s).", removed);
    }
    Ok(())
}
