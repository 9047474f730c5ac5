//! Practice session recording
//!
//! Accumulates published fluidity scores while a practice session is active
//! and reduces them to a summary when it ends. Also hosts the mastery rule
//! that decides when a skill counts as learned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;
use uuid::Uuid;

use crate::config::PracticeConfig;
use crate::error::MotionError;
use crate::motion::types::MotionAnalysis;

/// Practice lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PracticeState {
    Idle,
    Active,
    Paused,
    Complete,
}

impl PracticeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PracticeState::Idle => "idle",
            PracticeState::Active => "active",
            PracticeState::Paused => "paused",
            PracticeState::Complete => "complete",
        }
    }
}

/// One practice session for a skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeSession {
    pub id: String,
    pub skill_id: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub fluidity_scores: Vec<u8>,
    pub completed: bool,
}

impl PracticeSession {
    /// Mean fluidity of this session, `None` without scores
    pub fn average_fluidity(&self) -> Option<f64> {
        mean(&self.fluidity_scores)
    }
}

/// Reduced view of a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Rounded mean fluidity, 0 without scores
    pub average: u8,
    /// Highest fluidity, 0 without scores
    pub peak: u8,
    /// Number of recorded scores
    pub samples: usize,
    /// Session length in whole minutes (rounded)
    pub duration_minutes: i64,
}

impl SessionSummary {
    pub fn from_scores(scores: &[u8]) -> Self {
        Self {
            average: mean(scores).map(|m| m.round() as u8).unwrap_or(0),
            peak: scores.iter().copied().max().unwrap_or(0),
            samples: scores.len(),
            duration_minutes: 0,
        }
    }

    pub fn for_session(session: &PracticeSession) -> Self {
        let mut summary = Self::from_scores(&session.fluidity_scores);
        if let Some(end) = session.end_time {
            let millis = (end - session.start_time).num_milliseconds();
            summary.duration_minutes = (millis as f64 / 60_000.0).round() as i64;
        }
        summary
    }
}

/// A finished session together with its summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedPractice {
    pub session: PracticeSession,
    pub summary: SessionSummary,
}

/// Records fluidity scores for the session in progress
#[derive(Debug, Clone)]
pub struct PracticeRecorder {
    config: PracticeConfig,
    state: PracticeState,
    session: Option<PracticeSession>,
    history: VecDeque<u8>,
}

impl Default for PracticeRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl PracticeRecorder {
    pub fn new() -> Self {
        Self::with_config(PracticeConfig::default())
    }

    pub fn with_config(config: PracticeConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(config.history_limit),
            config,
            state: PracticeState::Idle,
            session: None,
        }
    }

    pub fn state(&self) -> PracticeState {
        self.state
    }

    /// Session in progress, if any
    pub fn session(&self) -> Option<&PracticeSession> {
        self.session.as_ref()
    }

    /// Scores recorded so far, oldest first
    pub fn history(&self) -> Vec<u8> {
        self.history.iter().copied().collect()
    }

    /// Running summary of the session in progress
    pub fn live_summary(&self) -> SessionSummary {
        SessionSummary::from_scores(&self.history())
    }

    /// Begin a new session for `skill_id`
    pub fn start(&mut self, skill_id: &str) -> Result<&PracticeSession, MotionError> {
        self.start_at(skill_id, Utc::now())
    }

    pub fn start_at(
        &mut self,
        skill_id: &str,
        start_time: DateTime<Utc>,
    ) -> Result<&PracticeSession, MotionError> {
        if !matches!(self.state, PracticeState::Idle | PracticeState::Complete) {
            return Err(self.invalid("idle or complete"));
        }

        self.history.clear();
        self.state = PracticeState::Active;
        debug!(skill_id, "practice session started");

        Ok(self.session.insert(PracticeSession {
            id: Uuid::new_v4().to_string(),
            skill_id: skill_id.to_string(),
            start_time,
            end_time: None,
            fluidity_scores: Vec::new(),
            completed: false,
        }))
    }

    pub fn pause(&mut self) -> Result<(), MotionError> {
        if self.state != PracticeState::Active {
            return Err(self.invalid("active"));
        }
        self.state = PracticeState::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), MotionError> {
        if self.state != PracticeState::Paused {
            return Err(self.invalid("paused"));
        }
        self.state = PracticeState::Active;
        Ok(())
    }

    /// Record the fluidity of a published analysis.
    ///
    /// Only scores from active movement with a non-zero fluidity are kept,
    /// and only while the session is active. Returns whether the score was
    /// recorded.
    pub fn record(&mut self, analysis: &MotionAnalysis) -> bool {
        if self.state != PracticeState::Active
            || !analysis.is_active
            || analysis.fluidity_score == 0
        {
            return false;
        }

        self.history.push_back(analysis.fluidity_score);
        while self.history.len() > self.config.history_limit {
            self.history.pop_front();
        }
        true
    }

    /// End the session in progress
    pub fn finish(&mut self) -> Result<CompletedPractice, MotionError> {
        self.finish_at(Utc::now())
    }

    pub fn finish_at(&mut self, end_time: DateTime<Utc>) -> Result<CompletedPractice, MotionError> {
        if !matches!(self.state, PracticeState::Active | PracticeState::Paused) {
            return Err(self.invalid("active or paused"));
        }
        let actual = self.state.as_str();
        let session = self
            .session
            .as_mut()
            .ok_or(MotionError::InvalidPracticeState {
                expected: "active or paused",
                actual,
            })?;

        session.end_time = Some(end_time);
        session.fluidity_scores = self.history.iter().copied().collect();
        session.completed = true;
        self.state = PracticeState::Complete;

        let session = session.clone();
        let summary = SessionSummary::for_session(&session);
        debug!(
            skill_id = %session.skill_id,
            average = summary.average,
            peak = summary.peak,
            "practice session complete"
        );

        Ok(CompletedPractice { session, summary })
    }

    /// Discard any session and return to idle
    pub fn reset(&mut self) {
        self.state = PracticeState::Idle;
        self.session = None;
        self.history.clear();
    }

    fn invalid(&self, expected: &'static str) -> MotionError {
        MotionError::InvalidPracticeState {
            expected,
            actual: self.state.as_str(),
        }
    }
}

/// Rounded mean fluidity across every score of every session
pub fn overall_average_fluidity(sessions: &[PracticeSession]) -> Option<u8> {
    let scores: Vec<u8> = sessions
        .iter()
        .flat_map(|s| s.fluidity_scores.iter().copied())
        .collect();
    mean(&scores).map(|m| m.round() as u8)
}

/// Highest per-session mean among completed sessions
pub fn best_session_average(sessions: &[PracticeSession]) -> Option<f64> {
    sessions
        .iter()
        .filter(|s| s.completed)
        .filter_map(PracticeSession::average_fluidity)
        .fold(None, |best: Option<f64>, avg| {
            Some(best.map_or(avg, |b| b.max(avg)))
        })
}

/// Whether `skill_id` has been mastered.
///
/// Requires at least `mastery_min_sessions` completed sessions for the skill
/// whose pooled scores average at least `mastery_min_average`.
pub fn is_skill_mastered(
    sessions: &[PracticeSession],
    skill_id: &str,
    config: &PracticeConfig,
) -> bool {
    let skill_sessions: Vec<&PracticeSession> = sessions
        .iter()
        .filter(|s| s.completed && s.skill_id == skill_id)
        .collect();

    if skill_sessions.len() < config.mastery_min_sessions {
        return false;
    }

    let scores: Vec<u8> = skill_sessions
        .iter()
        .flat_map(|s| s.fluidity_scores.iter().copied())
        .collect();

    mean(&scores).is_some_and(|avg| avg >= config.mastery_min_average)
}

fn mean(scores: &[u8]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let sum: u64 = scores.iter().map(|&s| s as u64).sum();
    Some(sum as f64 / scores.len() as f64)
}
