//! Readiness aggregation over built children
//!
//! Each child that exists contributes its `Ready` condition. A child that
//! exists but has not reported readiness yet counts as `Unknown`.

use crate::child::{ChildObject, Observed};
use crate::error::{Error, Result};
use declarative::{Condition, ConditionStatus, ResourceStore, Verb};

/// Reason set on the instance when every child is ready
pub const REASON_READY: &str = "ArtifactsReady";

/// Reason set on the instance when some child is not ready
pub const REASON_NOT_READY: &str = "ArtifactNotReady";

/// Reason set on the instance when the definition could not be fetched
pub const REASON_FETCH_FAILED: &str = "FetchProfileFailed";

/// Reason set on the instance when converging its children failed
pub const REASON_CREATE_FAILED: &str = "CreateFailed";

/// Reason of the condition standing in for a child without one
pub const REASON_NO_READY_CONDITION: &str = "NoReadyCondition";

/// Readiness of a set of children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactStatus {
    /// At least one child exists in the store
    pub resources_exist: bool,

    /// Non-True `Ready` conditions of the children that exist
    pub not_ready_conditions: Vec<Condition>,
}

impl ArtifactStatus {
    pub fn is_ready(&self) -> bool {
        self.resources_exist && self.not_ready_conditions.is_empty()
    }

    /// True when ready, False when any child is False, Unknown otherwise
    pub fn overall(&self) -> ConditionStatus {
        if self.is_ready() {
            ConditionStatus::True
        } else if self
            .not_ready_conditions
            .iter()
            .any(|c| c.status == ConditionStatus::False)
        {
            ConditionStatus::False
        } else {
            ConditionStatus::Unknown
        }
    }

    /// The `Ready` condition to report on the instance
    pub fn ready_condition(&self) -> Condition {
        if self.is_ready() {
            return Condition::ready(
                ConditionStatus::True,
                REASON_READY,
                "all artifact resources ready",
            );
        }

        let message = self
            .not_ready_conditions
            .iter()
            .map(|c| c.message.as_str())
            .collect::<Vec<_>>()
            .join(",");
        Condition::ready(self.overall(), REASON_NOT_READY, message)
    }
}

/// Fetch every child by name and fold their readiness
pub fn artifact_status<T: ResourceStore + ?Sized>(
    store: &T,
    children: &[ChildObject],
) -> Result<ArtifactStatus> {
    let mut status = ArtifactStatus::default();

    for child in children {
        let observed = child.observe(store).map_err(|source| Error::Store {
            verb: Verb::Get,
            kind: child.kind().to_string(),
            name: child.name().to_string(),
            source,
        })?;

        match observed {
            Observed::Absent => log::debug!("{} does not exist yet", child.key()),
            Observed::Present { ready } => {
                status.resources_exist = true;
                match ready {
                    Some(condition) if condition.is_true() => {}
                    Some(condition) => {
                        log::info!(
                            "{} {}={}, message:{}",
                            child.key(),
                            condition.type_,
                            condition.status,
                            condition.message
                        );
                        status.not_ready_conditions.push(condition);
                    }
                    None => status.not_ready_conditions.push(Condition::ready(
                        ConditionStatus::Unknown,
                        REASON_NO_READY_CONDITION,
                        format!("{} {} has not reported readiness", child.kind(), child.name()),
                    )),
                }
            }
        }
    }

    Ok(status)
}
