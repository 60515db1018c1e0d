//! Info command - show information about the RAI installation.

use rai_coach::{local_ai_paths, CoachConfig, ModelRegistry, DEFAULT_LOCAL_AI_PORT};
use rai_local_ai::detect_device;

pub(crate) fn run() -> miette::Result<()> {
    let config = CoachConfig::from_env();
    let data_dir = &config.data_dir;

    println!("RAI - Resilience AI");
    println!("===================");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("Data directory:   {}", data_dir.display());
    println!("Cache directory:  {}", config.cache_dir().display());
    println!("State directory:  {}", config.state_dir().display());
    println!();

    let server = local_ai_paths::llama_server_path(data_dir);
    println!("Server binary:    {}", server.display());
    println!("  Exists: {}", server.exists());
    println!("Engine backend:   {}", config.engine);
    println!("Device:           {}", detect_device());
    println!("Server port:      {}", config.server_port);
    if config.server_port != DEFAULT_LOCAL_AI_PORT {
        println!("  (default {})", DEFAULT_LOCAL_AI_PORT);
    }
    println!();

    let default_model = match &config.default_model {
        Some(id) => id.clone(),
        None => ModelRegistry::builtin()
            .get_recommended_or_first()
            .id
            .to_string(),
    };
    println!("Default model:    {}", default_model);
    println!("Transcript cap:   {}", config.transcript_cap);
    println!("History limit:    {}", config.history_limit);
    println!(
        "Persist history:  {}",
        if config.persist_transcript { "yes" } else { "no" }
    );

    Ok(())
}
