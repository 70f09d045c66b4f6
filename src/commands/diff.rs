use crate::Context;
use crate::cli::ManifestArgs;
use crate::commands::{State, resolve_instance};
use crate::manifests;
use crate::ui;
use anyhow::Result;
use declarative::DiffSummary;
use profile::Profile;

pub fn run(ctx: &Context, args: &ManifestArgs) -> Result<()> {
    let definition = manifests::load_definition(&args.definition)?;
    let instance = manifests::load_instance(&args.instance, &ctx.config.namespace)?;
    let state = State::open(ctx)?;
    let instance = resolve_instance(&state.store, instance)?;
    let key = instance.key();

    let diffs = Profile::new(definition, instance, &state.store)
        .with_options(ctx.config.build.clone())
        .plan_artifacts()?;
    let summary = DiffSummary::from_diffs(&diffs);

    if !ctx.quiet {
        ui::header(&format!("Plan for {key}"));
        for diff in diffs.iter().filter(|d| ctx.verbose > 0 || !d.is_in_sync()) {
            println!("  {}", ui::diff_line(diff));
        }
        println!();
    }

    if summary.has_changes() {
        ui::info(&format!(
            "{} to create, {} to update, {} in sync",
            summary.additions, summary.modifications, summary.in_sync
        ));
    } else {
        ui::success(&format!("All {} objects in sync", summary.in_sync));
    }
    Ok(())
}
