//! Artifact spec builder
//!
//! Expands a profile definition's artifacts into the child objects that
//! install them for one instance. Building is pure: the same definition,
//! instance and options always produce field-identical objects in the same
//! order.
//!
//! Output order:
//! 1. git repositories
//! 2. git-sourced Helm releases, in artifact order
//! 3. kustomizations, in artifact order
//! 4. chart-sourced Helm releases, in artifact order
//! 5. Helm repositories

use crate::child::ChildObject;
use crate::error::{Error, Result};
use apis::{
    Artifact, ArtifactKind, ArtifactSource, Chart, CrossNamespaceObjectReference,
    CrossNamespaceSourceReference, GitRepository, GitRepositoryRef, GitRepositorySpec,
    HelmChartTemplate, HelmChartTemplateSpec, HelmRelease, HelmReleaseSpec, HelmRepository,
    HelmRepositorySpec, Interval, Kustomization, KustomizationSpec, ProfileDefinition,
    ProfileInstance, ProfileRef,
};
use declarative::ResourceSpec;
use serde::{Deserialize, Serialize};

/// Tunables for built objects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Poll interval of git and Helm repositories
    pub source_interval: Interval,

    /// Reconcile interval of Helm releases
    pub release_interval: Interval,

    /// Reconcile interval of kustomizations
    pub kustomization_interval: Interval,

    /// Whether kustomizations garbage-collect objects removed from the overlay
    pub prune: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            source_interval: Interval::from_mins(1),
            release_interval: Interval::from_mins(5),
            kustomization_interval: Interval::from_mins(5),
            prune: true,
        }
    }
}

/// Last `/`-separated segment of a repository URL
pub fn repo_name_from_url(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// `{instance}-{repo}-{revision}`
pub fn git_repository_name(instance: &str, url: &str, revision: &str) -> String {
    format!("{instance}-{}-{revision}", repo_name_from_url(url))
}

/// `{instance}-{profile}-{artifact}`
pub fn artifact_object_name(instance: &str, profile: &str, artifact: &str) -> String {
    format!("{instance}-{profile}-{artifact}")
}

/// `{instance}-{repo}-{branch}-{chart}`, where repo and branch are the
/// instance's profile repository
pub fn helm_repository_name(instance: &str, profile_url: &str, branch: &str, chart: &str) -> String {
    format!(
        "{instance}-{}-{branch}-{chart}",
        repo_name_from_url(profile_url)
    )
}

/// Build the child objects for `instance`, without owner references
pub fn build(
    definition: &ProfileDefinition,
    instance: &ProfileInstance,
    options: &BuildOptions,
) -> Result<Vec<ChildObject>> {
    let mut builder = Builder::new(definition, instance, options);
    for artifact in &definition.spec.artifacts {
        builder.add(artifact)?;
    }
    Ok(builder.finish())
}

struct Builder<'a> {
    profile_name: &'a str,
    instance: &'a ProfileInstance,
    options: &'a BuildOptions,

    git_repositories: Vec<GitRepository>,
    git_releases: Vec<HelmRelease>,
    kustomizations: Vec<Kustomization>,
    chart_releases: Vec<HelmRelease>,
    /// Helm repositories with the chart URL they were keyed by
    helm_repositories: Vec<(String, HelmRepository)>,
}

impl<'a> Builder<'a> {
    fn new(
        definition: &'a ProfileDefinition,
        instance: &'a ProfileInstance,
        options: &'a BuildOptions,
    ) -> Self {
        Self {
            profile_name: definition.name(),
            instance,
            options,
            git_repositories: Vec::new(),
            git_releases: Vec::new(),
            kustomizations: Vec::new(),
            chart_releases: Vec::new(),
            helm_repositories: Vec::new(),
        }
    }

    fn add(&mut self, artifact: &Artifact) -> Result<()> {
        let source = artifact.source()?;
        let kind = artifact.artifact_kind()?;

        match (kind, source) {
            (ArtifactKind::HelmChart, ArtifactSource::Chart(chart)) => {
                let repository = self.helm_repository(chart);
                let release = self.release(
                    artifact,
                    &chart.name,
                    &chart.version,
                    HelmRepositorySpec::KIND,
                    repository,
                );
                self.chart_releases.push(release);
            }
            (ArtifactKind::HelmChart, ArtifactSource::Path(path)) => {
                let repository = self.profile_repository()?;
                let release = self.release(artifact, path, "", GitRepositorySpec::KIND, repository);
                self.git_releases.push(release);
            }
            (ArtifactKind::HelmChart, ArtifactSource::Profile(nested)) => {
                let repository = self.nested_repository(nested)?;
                let release =
                    self.release(artifact, &nested.path, "", GitRepositorySpec::KIND, repository);
                self.git_releases.push(release);
            }
            (ArtifactKind::Kustomize, ArtifactSource::Path(path)) => {
                let repository = self.profile_repository()?;
                let kustomization = self.kustomization(artifact, path, repository);
                self.kustomizations.push(kustomization);
            }
            (ArtifactKind::Kustomize, ArtifactSource::Profile(nested)) => {
                let repository = self.nested_repository(nested)?;
                let kustomization = self.kustomization(artifact, &nested.path, repository);
                self.kustomizations.push(kustomization);
            }
            (ArtifactKind::Kustomize, ArtifactSource::Chart(_)) => {
                log::warn!(
                    "artifact {} is a Kustomize artifact; its chart is ignored",
                    artifact.name
                );
                let repository = self.profile_repository()?;
                let kustomization = self.kustomization(artifact, "", repository);
                self.kustomizations.push(kustomization);
            }
        }
        Ok(())
    }

    fn finish(self) -> Vec<ChildObject> {
        let Self {
            git_repositories,
            git_releases,
            kustomizations,
            chart_releases,
            helm_repositories,
            ..
        } = self;

        git_repositories
            .into_iter()
            .map(ChildObject::from)
            .chain(git_releases.into_iter().map(ChildObject::from))
            .chain(kustomizations.into_iter().map(ChildObject::from))
            .chain(chart_releases.into_iter().map(ChildObject::from))
            .chain(
                helm_repositories
                    .into_iter()
                    .map(|(_, repository)| ChildObject::from(repository)),
            )
            .collect()
    }

    fn instance_name(&self) -> &str {
        self.instance.name()
    }

    fn namespace(&self) -> &str {
        self.instance.namespace()
    }

    /// The instance's own profile repository
    fn profile_repository(&mut self) -> Result<String> {
        let instance = self.instance;
        let spec = &instance.spec;
        let reference = GitRepositoryRef::branch(&spec.branch);
        self.git_repository_for(&spec.profile_url, reference, &spec.branch)
    }

    /// Repository of a nested profile, checked out at its branch or version tag
    fn nested_repository(&mut self, nested: &ProfileRef) -> Result<String> {
        let reference = if nested.branch.is_empty() {
            GitRepositoryRef::tag(&nested.version)
        } else {
            GitRepositoryRef::branch(&nested.branch)
        };
        self.git_repository_for(&nested.url, reference, nested.revision())
    }

    /// Name of the git repository keyed by (url, revision), added on first use
    ///
    /// Names only carry the last URL segment, so two URLs ending alike at the
    /// same revision cannot both be built.
    fn git_repository_for(
        &mut self,
        url: &str,
        reference: GitRepositoryRef,
        revision: &str,
    ) -> Result<String> {
        let name = git_repository_name(self.instance_name(), url, revision);
        let same_name = self.git_repositories.iter().find(|repo| repo.name() == name);
        if let Some(repo) = same_name.filter(|repo| repo.spec.url != url) {
            return Err(Error::NameCollision {
                name,
                first: repo.spec.url.clone(),
                second: url.to_string(),
            });
        }
        let exists = self.git_repositories.iter().any(|repo| {
            repo.spec.url == url && repo.spec.reference.as_ref() == Some(&reference)
        });
        if !exists {
            log::debug!("adding GitRepository {name} for {url} at {revision}");
            let repository = GitRepository::new(
                &name,
                self.namespace(),
                GitRepositorySpec {
                    url: url.to_string(),
                    reference: Some(reference),
                    interval: self.options.source_interval,
                },
            );
            self.git_repositories.push(repository);
        }
        Ok(name)
    }

    /// Name of the Helm repository keyed by chart URL, added on first use
    fn helm_repository(&mut self, chart: &Chart) -> String {
        if let Some((_, repository)) = self
            .helm_repositories
            .iter()
            .find(|(url, _)| *url == chart.url)
        {
            return repository.name().to_string();
        }

        let spec = &self.instance.spec;
        let name = helm_repository_name(
            self.instance_name(),
            &spec.profile_url,
            &spec.branch,
            &chart.name,
        );
        log::debug!("adding HelmRepository {name} for {}", chart.url);
        let repository = HelmRepository::new(
            &name,
            self.namespace(),
            HelmRepositorySpec {
                url: chart.url.clone(),
                interval: self.options.source_interval,
            },
        );
        self.helm_repositories.push((chart.url.clone(), repository));
        name
    }

    fn release(
        &self,
        artifact: &Artifact,
        chart: &str,
        version: &str,
        source_kind: &str,
        source_name: String,
    ) -> HelmRelease {
        let spec = &self.instance.spec;
        HelmRelease::new(
            artifact_object_name(self.instance_name(), self.profile_name, &artifact.name),
            self.namespace(),
            HelmReleaseSpec {
                chart: HelmChartTemplate {
                    spec: HelmChartTemplateSpec {
                        chart: chart.to_string(),
                        version: version.to_string(),
                        source_ref: CrossNamespaceObjectReference {
                            kind: source_kind.to_string(),
                            name: source_name,
                            namespace: self.namespace().to_string(),
                        },
                    },
                },
                interval: self.options.release_interval,
                values: spec.values.clone(),
                values_from: spec.values_from.clone(),
            },
        )
    }

    fn kustomization(&self, artifact: &Artifact, path: &str, source_name: String) -> Kustomization {
        Kustomization::new(
            artifact_object_name(self.instance_name(), self.profile_name, &artifact.name),
            self.namespace(),
            KustomizationSpec {
                path: path.to_string(),
                interval: self.options.kustomization_interval,
                prune: self.options.prune,
                target_namespace: self.namespace().to_string(),
                source_ref: CrossNamespaceSourceReference {
                    kind: GitRepositorySpec::KIND.to_string(),
                    name: source_name,
                    namespace: self.namespace().to_string(),
                },
            },
        )
    }
}
