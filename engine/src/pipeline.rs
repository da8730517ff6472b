//! The sync pipeline for one fixture.
//!
//! Stages run in a fixed order over a shared context:
//!
//! 1. base fixture and teams - failure aborts the pipeline
//! 2. participants - errors propagate and fail the pipeline, since events
//!    and statistics depend on resolved participant ids
//! 3. events - runs only once participants succeeded
//! 4. participant statistics - best effort, errors are logged and count as
//!    zero changes
//! 5. team statistics - best effort, same as above
//!
//! The caller loads [`ExistingState`] beforehand and wraps the whole run in
//! one unit of work, committing only when [`SyncResult::success`] is true.

use crate::error::Result;
use crate::feed::MatchFeed;
use crate::ids::IdGenerator;
use crate::normalize::EventNormalizer;
use crate::participant::{lineup_participants, statistics_participants, ParticipantSources};
use crate::reconcile::{ChangeCounts, ChangeSet, ReconciliationPlanner, UpdatePolicy};
use crate::record::{
    EventAttrs, FixtureAttrs, ParticipantAttrs, PersistedEvent, PersistedFixture,
    PersistedParticipant, PersistedPlayerStat, PersistedTeam, PersistedTeamStat, TeamAttrs,
};
use crate::statistics::{player_stat_attrs, team_stat_attrs};
use crate::{DomainEvent, Error, FixtureId, IdentityKey, SurrogateId, SyncOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, error, warn};

/// Persistence boundary. Implementations stage or write each change set;
/// the engine never writes anything itself.
pub trait UnitOfWork {
    fn apply_fixture(&mut self, changes: &ChangeSet<PersistedFixture>) -> Result<()>;

    fn apply_teams(&mut self, changes: &ChangeSet<PersistedTeam>) -> Result<()>;

    fn apply_participants(
        &mut self,
        fixture: FixtureId,
        changes: &ChangeSet<PersistedParticipant>,
    ) -> Result<()>;

    fn apply_events(&mut self, fixture: FixtureId, changes: &ChangeSet<PersistedEvent>)
        -> Result<()>;

    fn apply_player_statistics(
        &mut self,
        fixture: FixtureId,
        changes: &ChangeSet<PersistedPlayerStat>,
    ) -> Result<()>;

    fn apply_team_statistics(
        &mut self,
        fixture: FixtureId,
        changes: &ChangeSet<PersistedTeamStat>,
    ) -> Result<()>;
}

/// Everything persisted for one fixture, as loaded before a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingState {
    pub fixture: Option<PersistedFixture>,
    /// Rows for the teams named by the feed
    pub teams: Vec<PersistedTeam>,
    pub participants: Vec<PersistedParticipant>,
    pub events: Vec<PersistedEvent>,
    pub player_stats: Vec<PersistedPlayerStat>,
    pub team_stats: Vec<PersistedTeamStat>,
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Base,
    Participants,
    Events,
    PlayerStatistics,
    TeamStatistics,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Base => "base",
            Stage::Participants => "participants",
            Stage::Events => "events",
            Stage::PlayerStatistics => "player_statistics",
            Stage::TeamStatistics => "team_statistics",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageReport {
    pub stage: Stage,
    pub counts: ChangeCounts,
    /// Set when the stage failed (fatal) or was absorbed (statistics)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageReport {
    fn ok(stage: Stage, counts: ChangeCounts) -> Self {
        Self {
            stage,
            counts,
            error: None,
        }
    }

    fn failed(stage: Stage, err: &Error) -> Self {
        Self {
            stage,
            counts: ChangeCounts::default(),
            error: Some(err.to_string()),
        }
    }
}

/// Aggregated result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub fixture_id: FixtureId,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub totals: ChangeCounts,
    pub stages: Vec<StageReport>,
}

impl SyncResult {
    /// The report of a stage, if it ran.
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    /// Counts of a stage, zero if it did not run.
    pub fn counts(&self, stage: Stage) -> ChangeCounts {
        self.stage(stage).map(|r| r.counts).unwrap_or_default()
    }
}

/// Shared state handed from stage to stage.
#[derive(Default)]
struct SyncContext {
    existing: ExistingState,
    events: Vec<DomainEvent>,
    participant_ids: BTreeMap<IdentityKey, SurrogateId>,
    reports: Vec<StageReport>,
}

/// Reconciles one fixture feed against its persisted state.
pub struct SyncPipeline<'a> {
    feed: &'a MatchFeed,
    ids: &'a mut dyn IdGenerator,
    options: SyncOptions,
}

impl<'a> SyncPipeline<'a> {
    /// Create a pipeline with default options.
    pub fn new(feed: &'a MatchFeed, ids: &'a mut dyn IdGenerator) -> Self {
        Self {
            feed,
            ids,
            options: SyncOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Run every stage against `existing`, handing change sets to `uow`.
    pub fn run(&mut self, existing: ExistingState, uow: &mut dyn UnitOfWork) -> SyncResult {
        let fixture_id = self.feed.fixture.id;
        let mut ctx = SyncContext {
            existing,
            ..SyncContext::default()
        };

        let outcome = self.run_stages(&mut ctx, uow);
        let totals = ctx
            .reports
            .iter()
            .fold(ChangeCounts::default(), |acc, r| acc + r.counts);

        match outcome {
            Ok(()) => {
                debug!(
                    fixture = fixture_id,
                    created = totals.created,
                    updated = totals.updated,
                    deleted = totals.deleted,
                    "sync pipeline finished"
                );
                SyncResult {
                    fixture_id,
                    success: true,
                    message: None,
                    totals,
                    stages: ctx.reports,
                }
            }
            Err(e) => {
                error!(fixture = fixture_id, error = %e, "sync pipeline failed");
                SyncResult {
                    fixture_id,
                    success: false,
                    message: Some(e.to_string()),
                    totals,
                    stages: ctx.reports,
                }
            }
        }
    }

    fn run_stages(&mut self, ctx: &mut SyncContext, uow: &mut dyn UnitOfWork) -> Result<()> {
        let outcome = self.reconcile_base(ctx, uow);
        required(&mut ctx.reports, Stage::Base, outcome)?;

        let outcome = self.reconcile_participants(ctx, uow);
        required(&mut ctx.reports, Stage::Participants, outcome)?;

        let outcome = self.reconcile_events(ctx, uow);
        required(&mut ctx.reports, Stage::Events, outcome)?;

        let report = best_effort(Stage::PlayerStatistics, self.reconcile_player_statistics(ctx, uow));
        ctx.reports.push(report);

        let report = best_effort(Stage::TeamStatistics, self.reconcile_team_statistics(ctx, uow));
        ctx.reports.push(report);

        Ok(())
    }

    fn planner(&mut self, policy: UpdatePolicy) -> ReconciliationPlanner<'_> {
        ReconciliationPlanner::new(&mut *self.ids, policy)
    }

    fn reconcile_base(
        &mut self,
        ctx: &mut SyncContext,
        uow: &mut dyn UnitOfWork,
    ) -> Result<ChangeCounts> {
        let feed = self.feed;
        validate_feed(feed)?;
        if let Some(persisted) = &ctx.existing.fixture {
            if persisted.attrs.external_id != feed.fixture.id {
                return Err(Error::FixtureMismatch {
                    feed: feed.fixture.id,
                    persisted: persisted.attrs.external_id,
                });
            }
        }

        let existing_fixture = ctx.existing.fixture.take().into_iter().collect();
        let fixture = self
            .planner(UpdatePolicy::InPlace)
            .plan(vec![FixtureAttrs::from_feed(feed)], existing_fixture);

        let existing_teams = std::mem::take(&mut ctx.existing.teams);
        let mut teams = self
            .planner(UpdatePolicy::InPlace)
            .plan(TeamAttrs::from_feed(feed), existing_teams);
        if !teams.changes.to_delete.is_empty() {
            debug!(
                count = teams.changes.to_delete.len(),
                "team rows outside this fixture left untouched"
            );
            teams.changes.to_delete.clear();
        }

        uow.apply_fixture(&fixture.changes)?;
        uow.apply_teams(&teams.changes)?;

        let counts = fixture.changes.counts() + teams.changes.counts();
        debug!(fixture = feed.fixture.id, ?counts, "base fixture reconciled");
        Ok(counts)
    }

    fn reconcile_participants(
        &mut self,
        ctx: &mut SyncContext,
        uow: &mut dyn UnitOfWork,
    ) -> Result<ChangeCounts> {
        let feed = self.feed;
        let (lineup, sheets) = lineup_participants(feed);
        let normalized = EventNormalizer::new(feed, &lineup, &sheets, &self.options).normalize();

        let merged = ParticipantSources {
            lineup,
            events: normalized.participants,
            statistics: statistics_participants(feed),
        }
        .merge();

        let incoming: Vec<ParticipantAttrs> = merged.into_values().map(Into::into).collect();
        let existing = std::mem::take(&mut ctx.existing.participants);
        let plan = self.planner(UpdatePolicy::InPlace).plan(incoming, existing);

        uow.apply_participants(feed.fixture.id, &plan.changes)?;

        ctx.participant_ids = plan.ids;
        ctx.events = normalized.events;

        let counts = plan.changes.counts();
        debug!(fixture = feed.fixture.id, ?counts, "participants reconciled");
        Ok(counts)
    }

    fn reconcile_events(
        &mut self,
        ctx: &mut SyncContext,
        uow: &mut dyn UnitOfWork,
    ) -> Result<ChangeCounts> {
        let policy = if self.options.replace_shifted_events {
            UpdatePolicy::ReplaceOnIdentityChange
        } else {
            UpdatePolicy::InPlace
        };

        let incoming: Vec<EventAttrs> = ctx
            .events
            .iter()
            .map(|event| EventAttrs::resolve(event, &ctx.participant_ids))
            .collect();
        let existing = std::mem::take(&mut ctx.existing.events);
        let plan = self.planner(policy).plan(incoming, existing);

        uow.apply_events(self.feed.fixture.id, &plan.changes)?;

        let counts = plan.changes.counts();
        debug!(fixture = self.feed.fixture.id, ?counts, "events reconciled");
        Ok(counts)
    }

    fn reconcile_player_statistics(
        &mut self,
        ctx: &mut SyncContext,
        uow: &mut dyn UnitOfWork,
    ) -> Result<ChangeCounts> {
        let incoming = player_stat_attrs(self.feed, &ctx.participant_ids)?;
        let existing = std::mem::take(&mut ctx.existing.player_stats);
        let plan = self.planner(UpdatePolicy::InPlace).plan(incoming, existing);

        uow.apply_player_statistics(self.feed.fixture.id, &plan.changes)?;
        Ok(plan.changes.counts())
    }

    fn reconcile_team_statistics(
        &mut self,
        ctx: &mut SyncContext,
        uow: &mut dyn UnitOfWork,
    ) -> Result<ChangeCounts> {
        let incoming = team_stat_attrs(self.feed)?;
        let existing = std::mem::take(&mut ctx.existing.team_stats);
        let plan = self.planner(UpdatePolicy::InPlace).plan(incoming, existing);

        uow.apply_team_statistics(self.feed.fixture.id, &plan.changes)?;
        Ok(plan.changes.counts())
    }
}

/// Report a stage whose failure aborts the run, then pass the outcome on.
fn required(
    reports: &mut Vec<StageReport>,
    stage: Stage,
    outcome: Result<ChangeCounts>,
) -> Result<()> {
    match outcome {
        Ok(counts) => {
            reports.push(StageReport::ok(stage, counts));
            Ok(())
        }
        Err(e) => {
            reports.push(StageReport::failed(stage, &e));
            Err(e)
        }
    }
}

/// Statistics are enrichment: a failure is logged and contributes nothing.
fn best_effort(stage: Stage, outcome: Result<ChangeCounts>) -> StageReport {
    match outcome {
        Ok(counts) => {
            debug!(%stage, ?counts, "statistics reconciled");
            StageReport::ok(stage, counts)
        }
        Err(e) => {
            warn!(%stage, error = %e, "statistics stage failed, continuing without it");
            StageReport::failed(stage, &e)
        }
    }
}

fn validate_feed(feed: &MatchFeed) -> Result<()> {
    if feed.fixture.id <= 0 {
        return Err(Error::InvalidFeed(format!(
            "fixture id must be positive, got {}",
            feed.fixture.id
        )));
    }
    let (home, away) = (feed.teams.home.id, feed.teams.away.id);
    if home <= 0 || away <= 0 {
        return Err(Error::InvalidFeed(format!(
            "team ids must be positive, got {} and {}",
            home, away
        )));
    }
    if home == away {
        return Err(Error::InvalidFeed(format!(
            "home and away team are both {}",
            home
        )));
    }
    Ok(())
}
