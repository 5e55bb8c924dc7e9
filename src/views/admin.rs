use tracing::{debug, info};

use super::{Completion, Loadable, ViewScope};
use crate::api::{ApiClient, AssignmentDraft, GenealogyAssignment, UploadBatch, UploadFile, UploadResult};
use crate::error::{AppError, AppResult};

/// How many batches the upload page lists.
pub const RECENT_UPLOADS: usize = 5;

#[derive(Debug, Clone)]
pub struct UploadHistoryView {
    batches: Loadable<Vec<UploadBatch>>,
    last_upload: Loadable<UploadResult>,
}

impl Default for UploadHistoryView {
    fn default() -> Self { Self::new() }
}

impl UploadHistoryView {
    pub fn new() -> Self {
        let scope = ViewScope::new();
        Self { batches: Loadable::new(scope.clone()), last_upload: Loadable::new(scope) }
    }

    pub fn batches(&self) -> &Loadable<Vec<UploadBatch>> { &self.batches }
    pub fn last_upload(&self) -> &Loadable<UploadResult> { &self.last_upload }
    pub fn unmount(&self) { self.batches.scope().unmount(); }

    pub fn recent(&self) -> &[UploadBatch] {
        let all = self.batches.data().map(Vec::as_slice).unwrap_or(&[]);
        &all[..all.len().min(RECENT_UPLOADS)]
    }

    pub async fn refresh(&mut self, api: &ApiClient) -> Completion {
        let ticket = self.batches.begin();
        let result = api.uploads().batches().await;
        self.batches.complete(ticket, result)
    }

    /// Upload, then reload the history when the import went through.
    pub async fn upload(&mut self, api: &ApiClient, file: UploadFile) -> Completion {
        let ticket = self.last_upload.begin();
        let result = api.uploads().upload_excel(file).await;
        let done = self.last_upload.complete(ticket, result);
        if done == Completion::Applied {
            self.refresh(api).await;
        }
        done
    }
}

/// Genealogy admin page: assignment list plus the create/edit form.
#[derive(Debug, Clone)]
pub struct GenealogyView {
    assignments: Loadable<Vec<GenealogyAssignment>>,
    draft: AssignmentDraft,
    editing: Option<String>,
    notice: Option<String>,
}

impl Default for GenealogyView {
    fn default() -> Self { Self::new() }
}

impl GenealogyView {
    pub fn new() -> Self { Self::with_scope(ViewScope::new()) }

    pub fn with_scope(scope: ViewScope) -> Self {
        Self { assignments: Loadable::new(scope), draft: AssignmentDraft::default(), editing: None, notice: None }
    }

    pub fn assignments(&self) -> &Loadable<Vec<GenealogyAssignment>> { &self.assignments }
    pub fn draft(&self) -> &AssignmentDraft { &self.draft }
    pub fn draft_mut(&mut self) -> &mut AssignmentDraft { &mut self.draft }
    pub fn editing(&self) -> Option<&str> { self.editing.as_deref() }
    pub fn notice(&self) -> Option<&str> { self.notice.as_deref() }
    pub fn unmount(&self) { self.assignments.scope().unmount(); }

    pub fn edit(&mut self, assignment: &GenealogyAssignment) {
        self.draft = AssignmentDraft::from_assignment(assignment);
        self.editing = Some(assignment.id.clone());
    }

    pub fn reset_form(&mut self) {
        self.draft = AssignmentDraft::default();
        self.editing = None;
    }

    pub async fn refresh(&mut self, api: &ApiClient) -> Completion {
        let ticket = self.assignments.begin();
        let result = api.genealogy().list().await;
        self.assignments.complete(ticket, result)
    }

    /// Create or update from the form. On success the form resets and the list reloads; on
    /// failure the form is kept for another try.
    pub async fn submit(&mut self, api: &ApiClient) -> AppResult<GenealogyAssignment> {
        self.notice = None;
        let result = match &self.editing {
            Some(id) => api.genealogy().update(id, &self.draft).await,
            None => api.genealogy().create(&self.draft).await,
        };
        if !self.assignments.scope().is_mounted() {
            debug!(target: "commission_desk::views", "genealogy save finished after unmount; view left as is");
            return result;
        }
        match result {
            Ok(saved) => {
                let verb = if self.editing.is_some() { "updated" } else { "created" };
                self.notice = Some(format!("Genealogy assignment {} successfully", verb));
                self.reset_form();
                self.refresh(api).await;
                Ok(saved)
            }
            Err(e) => Err(self.surface(e)),
        }
    }

    pub async fn delete(&mut self, api: &ApiClient, id: &str) -> AppResult<()> {
        self.notice = None;
        let result = api.genealogy().delete(id).await;
        if !self.assignments.scope().is_mounted() {
            debug!(target: "commission_desk::views", "genealogy delete finished after unmount; view left as is");
            return result;
        }
        match result {
            Ok(()) => {
                info!(target: "commission_desk::views", "genealogy row removed id={}", id);
                self.notice = Some("Genealogy assignment deleted successfully".to_string());
                if self.editing.as_deref() == Some(id) {
                    self.reset_form();
                }
                self.refresh(api).await;
                Ok(())
            }
            Err(e) => Err(self.surface(e)),
        }
    }

    fn surface(&mut self, e: AppError) -> AppError {
        self.assignments.set_error(e.clone());
        e
    }
}
