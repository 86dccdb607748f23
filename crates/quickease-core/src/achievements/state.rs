//! Earned badges and the display queue.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::rules::{AchievementRule, RULES};
use super::stats::UserStatsSnapshot;
use crate::backend::{AchievementStore, GrantOutcome};
use crate::events::Event;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub title: String,
    pub description: String,
}

impl From<&AchievementRule> for Badge {
    fn from(rule: &AchievementRule) -> Self {
        Self {
            id: rule.id.to_string(),
            title: rule.title.to_string(),
            description: rule.description.to_string(),
        }
    }
}

/// Outcome of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationReport {
    /// Newly granted and queued, in rule order.
    pub unlocked: Vec<Badge>,
    /// The backend already had these; marked earned without queueing.
    pub already_granted: Vec<String>,
    /// Grant attempts that failed; retried on the next evaluation.
    pub failed: Vec<String>,
}

impl EvaluationReport {
    pub fn events(&self) -> Vec<Event> {
        self.unlocked
            .iter()
            .map(|badge| Event::BadgeUnlocked {
                badge: badge.clone(),
            })
            .collect()
    }
}

/// Badges already granted plus those waiting to be shown.
///
/// Owned by one authenticated session. The earned set is the only
/// de-duplication key: a badge is granted at most once as long as it is in
/// `earned`, no matter how often evaluation re-runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AchievementState {
    earned: BTreeSet<String>,
    #[serde(default)]
    pending: VecDeque<Badge>,
}

impl AchievementState {
    pub fn new<I, S>(earned: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            earned: earned.into_iter().map(Into::into).collect(),
            pending: VecDeque::new(),
        }
    }

    pub fn earned(&self) -> &BTreeSet<String> {
        &self.earned
    }

    pub fn is_earned(&self, id: &str) -> bool {
        self.earned.contains(id)
    }

    /// Union ids reported by the backend into the earned set.
    pub fn merge_earned<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.earned.extend(ids.into_iter().map(Into::into));
    }

    /// Rules satisfied by `snapshot` that have not been earned, in rule order.
    pub fn candidates(&self, snapshot: &UserStatsSnapshot) -> Vec<&'static AchievementRule> {
        RULES
            .iter()
            .filter(|rule| !self.earned.contains(rule.id) && rule.is_met(snapshot))
            .collect()
    }

    /// Grant every newly satisfied badge and queue it for display.
    ///
    /// A failed grant is logged and left out of both the earned set and the
    /// queue; the next evaluation will try it again.
    pub async fn evaluate<S: AchievementStore>(
        &mut self,
        snapshot: &UserStatsSnapshot,
        store: &S,
    ) -> EvaluationReport {
        let mut report = EvaluationReport::default();
        for rule in self.candidates(snapshot) {
            match store.grant(rule.id).await {
                Ok(GrantOutcome::Granted) => {
                    info!(badge = rule.id, "achievement unlocked");
                    self.earned.insert(rule.id.to_string());
                    let badge = Badge::from(rule);
                    self.pending.push_back(badge.clone());
                    report.unlocked.push(badge);
                }
                Ok(GrantOutcome::AlreadyGranted) => {
                    self.earned.insert(rule.id.to_string());
                    report.already_granted.push(rule.id.to_string());
                }
                Err(e) => {
                    warn!(badge = rule.id, error = %e, "failed to persist achievement");
                    report.failed.push(rule.id.to_string());
                }
            }
        }
        report
    }

    // ── Display queue ────────────────────────────────────────────────

    /// Badge to show now, if any.
    pub fn current(&self) -> Option<&Badge> {
        self.pending.front()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Badge> {
        self.pending.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Pop the front of the queue after the user has seen it.
    pub fn acknowledge(&mut self) -> Option<Event> {
        self.pending
            .pop_front()
            .map(|badge| Event::BadgeAcknowledged { badge })
    }
}
