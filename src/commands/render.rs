use crate::Context;
use crate::cli::{OutputFormat, RenderArgs};
use crate::commands::{State, resolve_instance};
use crate::manifests;
use anyhow::{Context as _, Result};
use profile::{ChildObject, Profile};

pub fn run(ctx: &Context, args: &RenderArgs) -> Result<()> {
    let definition = manifests::load_definition(&args.manifests.definition)?;
    let instance = manifests::load_instance(&args.manifests.instance, &ctx.config.namespace)?;
    let state = State::open(ctx)?;
    let instance = resolve_instance(&state.store, instance)?;

    let children = Profile::new(definition, instance, &state.store)
        .with_options(ctx.config.build.clone())
        .make_artifacts()?;
    log::info!("rendered {} objects", children.len());

    print!("{}", format_children(&children, args.output)?);
    Ok(())
}

/// Serialize children as a YAML stream or a JSON array
pub fn format_children(children: &[ChildObject], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let mut out =
                serde_json::to_string_pretty(children).context("Failed to serialize objects")?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Yaml => {
            let mut out = String::new();
            for child in children {
                out.push_str("---\n");
                out.push_str(
                    &serde_yaml::to_string(child)
                        .with_context(|| format!("Failed to serialize {}", child.key()))?,
                );
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;
    use declarative::MemoryStore;

    fn children() -> Vec<ChildObject> {
        let store = MemoryStore::new();
        Profile::new(fixtures::definition(), fixtures::instance(), &store)
            .make_artifacts()
            .unwrap()
    }

    #[test]
    fn test_yaml_stream() {
        let out = format_children(&children(), OutputFormat::Yaml).unwrap();
        assert_eq!(out.matches("---\n").count(), 5);
        assert!(out.contains("kind: GitRepository"));
        assert!(out.contains("name: my-nginx-nginx-profile-main"));
        assert!(out.contains("kind: HelmRepository"));
        assert!(out.contains("prune: true"));
    }

    #[test]
    fn test_json_array() {
        let out = format_children(&children(), OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        let kinds: Vec<_> = parsed
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["kind"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            kinds,
            [
                "GitRepository",
                "HelmRelease",
                "Kustomization",
                "HelmRelease",
                "HelmRepository"
            ]
        );
        assert_eq!(
            parsed[1]["metadata"]["ownerReferences"][0]["name"],
            "my-nginx"
        );
    }
}
