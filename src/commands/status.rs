use crate::Context;
use crate::cli::ManifestArgs;
use crate::commands::{State, resolve_instance};
use crate::manifests;
use crate::ui;
use anyhow::Result;
use colored::Colorize;
use declarative::{READY, find_condition};
use profile::{Observed, Profile};

pub fn run(ctx: &Context, args: &ManifestArgs) -> Result<()> {
    let definition = manifests::load_definition(&args.definition)?;
    let instance = manifests::load_instance(&args.instance, &ctx.config.namespace)?;
    let state = State::open(ctx)?;
    let instance = resolve_instance(&state.store, instance)?;
    let key = instance.key();
    let recorded = find_condition(&instance.status.conditions, READY).cloned();

    let profile = Profile::new(definition, instance, &state.store)
        .with_options(ctx.config.build.clone());

    ui::header(&key.to_string());
    for child in profile.make_ownerless_artifacts()? {
        match child.observe(&state.store)? {
            Observed::Absent => println!("  {} {}", "-".dimmed(), child.key().to_string().dimmed()),
            Observed::Present { ready: Some(condition) } => println!(
                "  {} {} {}",
                ui::status_badge(condition.status),
                child.key(),
                condition.message.dimmed()
            ),
            Observed::Present { ready: None } => {
                println!("  {} {}", "?".yellow(), child.key());
            }
        }
    }

    let status = profile.artifact_status()?;
    let condition = status.ready_condition();
    println!();
    if !status.resources_exist {
        ui::warn("No objects exist yet; run `profiles reconcile` first");
    }
    ui::kv("Ready", &ui::status_badge(condition.status).to_string());
    ui::kv("Reason", &condition.reason);
    if !condition.message.is_empty() {
        ui::kv("Message", &condition.message);
    }

    match recorded {
        Some(recorded) => ui::dim(&format!(
            "recorded on instance: Ready={} ({}) since {}",
            recorded.status,
            recorded.reason,
            recorded.last_transition_time.to_rfc3339()
        )),
        None => ui::dim("no Ready condition recorded on the instance"),
    }
    Ok(())
}
