//! CLI command implementations

use anyhow::{Context, Result};

use crate::cli::args::{ConfigCommand, LineChange};
use crate::config::Settings;
use crate::script::{CharacterId, LineEdit, Script, ScriptId};
use crate::video::JobPhase;
use crate::workflow::{Action, WorkflowController};

/// Build a controller and load the user's scripts
async fn connect(settings: &Settings) -> Result<WorkflowController> {
    let mut controller = WorkflowController::from_settings(settings)?;
    controller
        .load()
        .await
        .context("Failed to load scripts")?;
    Ok(controller)
}

fn find<'a>(controller: &'a WorkflowController, id: &ScriptId) -> Result<&'a Script> {
    controller
        .script(id)
        .with_context(|| format!("Script not found: {}", id))
}

/// List the user's scripts
pub async fn list_scripts(settings: &Settings) -> Result<()> {
    let controller = connect(settings).await?;

    if controller.scripts().is_empty() {
        println!("No scripts found");
        return Ok(());
    }

    println!(
        "{:<12} {:<34} {:<7} {:<12} {:<14}",
        "ID", "Prompt", "Lines", "Date", "Video"
    );
    println!("{}", "-".repeat(81));

    for script in controller.scripts() {
        println!(
            "{:<12} {:<34} {:<7} {:<12} {:<14}",
            truncate(script.id.as_str(), 10),
            truncate(&script.original_prompt, 32),
            script.dialogue.len(),
            script.created_at.format("%Y-%m-%d"),
            phase_label(&controller.job_phase(&script.id).unwrap_or(JobPhase::Idle)),
        );
    }

    println!();
    println!(
        "Token balance: {} (a video costs {})",
        controller.token_balance(),
        controller.generation_cost()
    );

    Ok(())
}

/// Show one script
pub async fn show_script(settings: &Settings, id: &str) -> Result<()> {
    let controller = connect(settings).await?;
    let id = ScriptId::new(id);
    print_script(&controller, find(&controller, &id)?);

    let actions = controller.legal_actions(&id)?;
    let available: Vec<&str> = actions.enabled().map(|a| a.as_str()).collect();
    println!();
    println!("Actions: {}", available.join(", "));

    Ok(())
}

fn print_script(controller: &WorkflowController, script: &Script) {
    println!("Script: {}", script.id);
    println!("Prompt: {}", script.original_prompt);
    println!("Updated: {}", script.updated_at.format("%Y-%m-%d %H:%M"));
    let cast: Vec<&str> = script
        .selected_characters
        .iter()
        .map(|c| controller.speaker_name(c))
        .collect();
    println!("Cast: {}", cast.join(", "));
    if let Some(phase) = controller.job_phase(&script.id) {
        println!("Video: {}", phase_label(&phase));
        match phase {
            JobPhase::Completed {
                video_path: Some(path),
            } => println!("  {}", path),
            JobPhase::Failed { message } => println!("  {}", message),
            _ => {}
        }
    }
    println!();

    for (index, line) in script.dialogue.iter().enumerate() {
        println!(
            "{:>3}. {}: {}",
            index + 1,
            controller.speaker_name(&line.speaker),
            line.text
        );
    }
}

/// Open the right kind of edit session for the script's state
fn open_editor(controller: &mut WorkflowController, id: &ScriptId) -> Result<()> {
    let actions = controller.legal_actions(id)?;
    if actions.allows(Action::ChangeScript) {
        controller.change_script(id)?;
    } else {
        controller.start_edit(id)?;
    }
    Ok(())
}

fn line_index(line: usize) -> Result<usize> {
    line.checked_sub(1)
        .context("Line numbers start at 1")
}

/// Change one line and save
pub async fn edit_line(
    settings: &Settings,
    id: &str,
    line: usize,
    change: LineChange,
) -> Result<()> {
    let mut controller = connect(settings).await?;
    let id = ScriptId::new(id);
    let index = line_index(line)?;

    open_editor(&mut controller, &id)?;
    if let Some(speaker) = change.speaker {
        controller.edit_line(&id, index, LineEdit::Speaker(CharacterId::new(speaker)))?;
    }
    if let Some(text) = change.text {
        controller.edit_line(&id, index, LineEdit::Text(text))?;
    }

    save_and_report(&mut controller, &id).await
}

/// Append a line and save
pub async fn add_line(
    settings: &Settings,
    id: &str,
    text: String,
    speaker: Option<String>,
) -> Result<()> {
    let mut controller = connect(settings).await?;
    let id = ScriptId::new(id);

    open_editor(&mut controller, &id)?;
    controller.add_line(&id, speaker.map(CharacterId::new))?;
    let last = controller
        .session(&id)
        .map(|s| s.buffer().len())
        .context("Edit session closed unexpectedly")?;
    controller.edit_line(&id, last - 1, LineEdit::Text(text))?;

    save_and_report(&mut controller, &id).await
}

/// Remove a line and save
pub async fn remove_line(settings: &Settings, id: &str, line: usize) -> Result<()> {
    let mut controller = connect(settings).await?;
    let id = ScriptId::new(id);
    let index = line_index(line)?;

    open_editor(&mut controller, &id)?;
    controller.remove_line(&id, index)?;

    save_and_report(&mut controller, &id).await
}

async fn save_and_report(controller: &mut WorkflowController, id: &ScriptId) -> Result<()> {
    if !controller.has_changes(id)? {
        controller.cancel(id)?;
        println!("No changes to save");
        return Ok(());
    }

    controller.save(id).await?;
    let lines = find(controller, id)?.dialogue.len();
    println!("Saved script {} ({} lines)", id, lines);
    Ok(())
}

/// Request a video, optionally following it to the end
pub async fn generate_video(settings: &Settings, id: &str, watch: bool) -> Result<()> {
    let mut controller = connect(settings).await?;
    let id = ScriptId::new(id);

    let submission = controller.generate(&id).await?;
    println!("Video job {} queued for script {}", submission.job_id, id);

    if watch {
        follow_jobs(&mut controller).await?;
    }

    controller.shutdown();
    Ok(())
}

/// Follow every active job
pub async fn watch_jobs(settings: &Settings) -> Result<()> {
    let mut controller = connect(settings).await?;

    if !controller.is_polling() {
        println!("No active video jobs");
        return Ok(());
    }

    follow_jobs(&mut controller).await?;
    controller.shutdown();
    Ok(())
}

async fn follow_jobs(controller: &mut WorkflowController) -> Result<()> {
    print_active(controller);

    while controller.is_polling() {
        tokio::select! {
            report = controller.next_poll() => {
                for id in &report.completed {
                    let path = controller
                        .script(id)
                        .and_then(|s| s.final_video_path.clone())
                        .unwrap_or_default();
                    println!("Video ready for {}: {}", id, path);
                }
                for (id, message) in &report.failed {
                    println!("Video failed for {}: {}", id, message);
                }
                if !report.updated.is_empty() {
                    print_active(controller);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("Stopped watching; jobs keep running on the server");
                break;
            }
        }
    }

    Ok(())
}

fn print_active(controller: &WorkflowController) {
    for script in controller.scripts().iter().filter(|s| s.has_active_job()) {
        if let Some(phase) = controller.job_phase(&script.id) {
            println!("  {} {}", script.id, phase_label(&phase));
        }
    }
}

/// Delete a script after confirmation
pub async fn delete_script(settings: &Settings, id: &str, yes: bool) -> Result<()> {
    if !yes {
        anyhow::bail!("Refusing to delete {} without --yes", id);
    }

    let mut controller = connect(settings).await?;
    let id = ScriptId::new(id);
    find(&controller, &id)?;

    controller.delete(&id).await?;
    println!("Deleted script {}", id);
    Ok(())
}

/// Handle config subcommands
pub fn config_command(settings: &Settings, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let toml = toml::to_string_pretty(settings)?;
            println!("{}", toml);
        }
        ConfigCommand::Path => {
            let path = Settings::config_path()?;
            println!("{}", path.display());
        }
        ConfigCommand::Init { force } => {
            let path = Settings::config_path()?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Settings::write_default(&path)?;
            println!("Configuration initialized at: {}", path.display());
        }
        ConfigCommand::Set { key, value } => {
            let updated = set_value(settings, &key, &value)?;
            let path = Settings::config_path()?;
            updated.write_to(&path)?;
            println!("Set {} = {} in {}", key, value, path.display());
        }
    }

    Ok(())
}

/// Apply a dotted `section.field` assignment and re-validate the result.
fn set_value(settings: &Settings, key: &str, value: &str) -> Result<Settings> {
    let (section, field) = key
        .split_once('.')
        .with_context(|| format!("Expected a key like 'video.poll_interval_secs', got '{}'", key))?;

    let mut root = toml::Value::try_from(settings)?;
    let table = root
        .get_mut(section)
        .and_then(toml::Value::as_table_mut)
        .with_context(|| format!("Unknown config section '{}'", section))?;

    let current = table
        .get(field)
        .with_context(|| format!("Unknown config key '{}'", key))?;

    let parsed = match current {
        toml::Value::Integer(_) => toml::Value::Integer(
            value
                .parse()
                .with_context(|| format!("'{}' expects an integer", key))?,
        ),
        toml::Value::Boolean(_) => toml::Value::Boolean(
            value
                .parse()
                .with_context(|| format!("'{}' expects true or false", key))?,
        ),
        _ => toml::Value::String(value.to_string()),
    };
    table.insert(field.to_string(), parsed);

    root.try_into()
        .with_context(|| format!("Invalid value '{}' for '{}'", value, key))
}

fn phase_label(phase: &JobPhase) -> String {
    match phase {
        JobPhase::Idle => "-".to_string(),
        JobPhase::PendingConfirmation { .. } => "submitted".to_string(),
        JobPhase::Queued => "queued".to_string(),
        JobPhase::InProgress { progress } => format!("rendering {:.0}%", progress),
        JobPhase::Completed { .. } => "ready".to_string(),
        JobPhase::Failed { .. } => "failed".to_string(),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_value_updates_nested_integer() {
        let settings = Settings::default();
        let updated = set_value(&settings, "video.poll_interval_secs", "10").unwrap();
        assert_eq!(updated.video.poll_interval_secs, 10);
    }

    #[test]
    fn set_value_rejects_unknown_keys_and_bad_values() {
        let settings = Settings::default();
        assert!(set_value(&settings, "video.frame_rate", "30").is_err());
        assert!(set_value(&settings, "video.generation_cost", "lots").is_err());
        assert!(set_value(&settings, "video.poll_source", "carrier_pigeon").is_err());
        assert!(set_value(&settings, "nodot", "1").is_err());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("héllo wörld again", 8), "héllo...");
    }
}
