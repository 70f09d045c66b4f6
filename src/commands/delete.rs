use crate::Context;
use crate::cli::DeleteArgs;
use crate::commands::State;
use crate::ui;
use anyhow::{Result, bail};
use apis::ProfileInstanceSpec;
use declarative::{ObjectKey, ResourceSpec};

pub fn run(ctx: &Context, args: &DeleteArgs) -> Result<()> {
    let namespace = args.namespace.as_deref().unwrap_or(&ctx.config.namespace);
    let key = ObjectKey::new(ProfileInstanceSpec::KIND, namespace, &args.name);

    let state = State::open(ctx)?;
    if !state.store.contains(&key) {
        bail!("{key} not found in {}", state.path.display());
    }

    let removed = state.store.delete(&key)?;
    state.save()?;

    for key in removed.iter().skip(1) {
        ui::dim(&format!("garbage collected {key}"));
    }
    ui::success(&format!(
        "Deleted {key} and {} owned objects",
        removed.len().saturating_sub(1)
    ));
    Ok(())
}
