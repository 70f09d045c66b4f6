use crate::Context;
use crate::cli::ManifestArgs;
use crate::commands::State;
use crate::manifests::{self, DefinitionFile};
use crate::ui;
use anyhow::Result;
use apis::{ProfileInstance, ProfileInstanceSpec, ProfileInstanceStatus};
use declarative::{MemoryStore, ResourceStoreExt};
use profile::{InstanceReconciler, PassOutcome};

pub fn run(ctx: &Context, args: &ManifestArgs) -> Result<()> {
    let manifest = manifests::load_instance(&args.instance, &ctx.config.namespace)?;
    let state = State::open(ctx)?;

    let instance = upsert_instance(&state.store, &manifest)?;
    let reconciler = InstanceReconciler::new(&state.store, DefinitionFile(args.definition.clone()))
        .with_options(ctx.config.build.clone());
    let outcome = reconciler.reconcile(instance.namespace(), instance.name());

    // Failed passes still record their condition on the instance.
    state.save()?;

    match outcome? {
        PassOutcome::Deleted => ui::warn(&format!("{} no longer exists", instance.key())),
        PassOutcome::Reconciled { summary, condition } => {
            if summary.total_changes() > 0 {
                ui::success(&format!(
                    "{} created, {} updated, {} unchanged",
                    summary.created, summary.modified, summary.unchanged
                ));
            } else {
                ui::success(&format!("All {} objects up to date", summary.unchanged));
            }
            ui::kv("Ready", &ui::status_badge(condition.status).to_string());
            ui::kv("Reason", &condition.reason);
            if !condition.message.is_empty() {
                ui::kv("Message", &condition.message);
            }
        }
    }
    Ok(())
}

/// Store the manifest's instance, updating `spec` of an existing one
pub fn upsert_instance(store: &MemoryStore, manifest: &ProfileInstance) -> Result<ProfileInstance> {
    match store.get::<ProfileInstanceSpec, ProfileInstanceStatus>(
        manifest.namespace(),
        manifest.name(),
    ) {
        Ok(stored) => {
            if stored.spec == manifest.spec {
                return Ok(stored);
            }
            log::info!("{}: spec changed, updating", stored.key());
            let updated = ProfileInstance {
                spec: manifest.spec.clone(),
                ..stored
            };
            Ok(store.update(&updated)?)
        }
        Err(e) if e.is_not_found() => {
            log::info!("{}: storing new instance", manifest.key());
            Ok(store.create(manifest)?)
        }
        Err(e) => Err(e.into()),
    }
}
