//! Model management commands.

use rai_coach::{local_ai_paths, CoachConfig, ModelRegistry};
use rai_local_ai::{ArtifactDownloader, DirCacheStorage, LoadProgress};

use crate::progress::{percent, percent_bar};

/// Download a model's artifact into the cache.
pub(crate) async fn pull(id: Option<&str>) -> miette::Result<()> {
    let config = CoachConfig::from_env();
    let registry = ModelRegistry::builtin();

    let model = match id.or(config.default_model.as_deref()) {
        Some(id) => registry.get_by_id(id).ok_or_else(|| {
            miette::miette!("Unknown model '{}'. Run `rai models` to list the catalog.", id)
        })?,
        None => registry.get_recommended_or_first(),
    };

    local_ai_paths::ensure_dirs(&config.data_dir)
        .map_err(|e| miette::miette!("Failed to create data directories: {}", e))?;

    let downloader = ArtifactDownloader::new(DirCacheStorage::new(config.cache_dir()));
    if downloader.is_downloaded(model) {
        println!("Model '{}' is already cached.", model.name);
        return Ok(());
    }

    println!("Downloading model: {} ({})", model.name, model.size);
    println!("This may take a while depending on your connection...");
    println!();

    let pb = percent_bar();
    let bar = pb.clone();
    let report = move |p: LoadProgress| {
        bar.set_position(percent(p.fraction));
        bar.set_message(p.text);
    };

    match downloader.fetch(model, &report).await {
        Ok(path) => {
            pb.finish_with_message("done");
            println!();
            println!("Model downloaded successfully!");
            println!("Location: {}", path.display());
            Ok(())
        }
        Err(e) => {
            pb.abandon();
            Err(miette::miette!("Failed to download model: {}", e))
        }
    }
}
