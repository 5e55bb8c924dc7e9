use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{segment, ApiClient, OnUnauthorized};
use crate::error::{AppError, AppResult};
use crate::identity::ManagerRef;

/// Depth of a manager under a team manager. Each level carries a default downline rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Level {
    #[default]
    A,
    B,
    C,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::A, Level::B, Level::C];

    /// Percent.
    pub fn default_rate(&self) -> f64 {
        match self {
            Level::A => 10.0,
            Level::B => 7.5,
            Level::C => 5.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::A => "A",
            Level::B => "B",
            Level::C => "C",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "A" | "a" => Some(Level::A),
            "B" | "b" => Some(Level::B),
            "C" | "c" => Some(Level::C),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        format!("Level {} ({}%)", self.as_str(), self.default_rate())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenealogyAssignment {
    pub id: String,
    pub manager: ManagerRef,
    pub parent_manager: ManagerRef,
    pub level: Level,
    pub commission_rate: f64,
    #[serde(default)]
    pub created_at: String,
}

/// Downline of one team manager. The backend shape is passed through untouched.
pub type TeamDownline = serde_json::Value;

/// Create/edit form for an assignment, also the request body for both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDraft {
    pub manager_id: String,
    pub parent_manager_id: String,
    pub level: Level,
    pub commission_rate: f64,
}

impl Default for AssignmentDraft {
    fn default() -> Self {
        Self { manager_id: String::new(), parent_manager_id: String::new(), level: Level::A, commission_rate: Level::A.default_rate() }
    }
}

impl AssignmentDraft {
    pub fn from_assignment(a: &GenealogyAssignment) -> Self {
        Self {
            manager_id: a.manager.id.clone(),
            parent_manager_id: a.parent_manager.id.clone(),
            level: a.level,
            commission_rate: a.commission_rate,
        }
    }

    /// Changing the level resets the rate to that level's default.
    pub fn set_level(&mut self, level: Level) {
        self.level = level;
        self.commission_rate = level.default_rate();
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.manager_id.trim().is_empty() || self.parent_manager_id.trim().is_empty() {
            return Err(AppError::validation("missing_field", "Please fill in all required fields"));
        }
        if self.manager_id.trim() == self.parent_manager_id.trim() {
            return Err(AppError::validation("self_parent", "A manager cannot be their own parent"));
        }
        if !(self.commission_rate > 0.0 && self.commission_rate <= 100.0) {
            return Err(AppError::validation("invalid_rate", "Commission rate must be between 0 and 100"));
        }
        Ok(())
    }
}

pub struct GenealogyApi<'a> {
    api: &'a ApiClient,
}

impl<'a> GenealogyApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self { Self { api } }

    pub async fn list(&self) -> AppResult<Vec<GenealogyAssignment>> {
        self.api.get_json("/genealogy", &[], "Failed to load genealogy data").await
    }

    pub async fn team_downline(&self, team_manager_id: &str) -> AppResult<TeamDownline> {
        let path = format!("/genealogy/team/{}", segment(team_manager_id));
        self.api.get_json(&path, &[], "Failed to load team downline").await
    }

    pub async fn create(&self, draft: &AssignmentDraft) -> AppResult<GenealogyAssignment> {
        draft.validate()?;
        let created: GenealogyAssignment = self
            .api
            .send_json(Method::POST, "/genealogy", draft, OnUnauthorized::ExpireSession, "Operation failed")
            .await?;
        info!(target: "commission_desk::genealogy", "assignment created id={} level={}", created.id, created.level.as_str());
        Ok(created)
    }

    pub async fn update(&self, id: &str, draft: &AssignmentDraft) -> AppResult<GenealogyAssignment> {
        draft.validate()?;
        let path = format!("/genealogy/{}", segment(id));
        self.api.send_json(Method::PUT, &path, draft, OnUnauthorized::ExpireSession, "Operation failed").await
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let path = format!("/genealogy/{}", segment(id));
        self.api.send_unit(Method::DELETE, &path, "Failed to delete assignment").await?;
        info!(target: "commission_desk::genealogy", "assignment deleted id={}", id);
        Ok(())
    }
}
