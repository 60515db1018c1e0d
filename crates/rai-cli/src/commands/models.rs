//! Models command - list the catalog.

use rai_coach::CoachConfig;

use super::open_disk_session;

pub(crate) async fn run(json: bool) -> miette::Result<()> {
    let config = CoachConfig::from_env();
    let session = open_disk_session(config).await?;
    let default_id = session.default_model_id().to_string();

    if json {
        let models = serde_json::to_string_pretty(session.list_available())
            .map_err(|e| miette::miette!("Failed to serialize catalog: {}", e))?;
        println!("{}", models);
        return Ok(());
    }

    println!("Available models:");
    for model in session.list_available() {
        let mut flags = Vec::new();
        if model.recommended {
            flags.push("recommended");
        }
        if model.id == default_id {
            flags.push("default");
        }
        if session.is_model_cached(model.id).await {
            flags.push("cached");
        }

        println!();
        println!("  {}", model.id);
        println!("    {} - {}", model.name, model.description);
        println!(
            "    {} | {}{}",
            model.size,
            model.specialization.label(),
            if flags.is_empty() {
                String::new()
            } else {
                format!(" | {}", flags.join(", "))
            }
        );
    }

    println!();
    println!("Download one with: rai model pull <id>");
    Ok(())
}
