//! View models: the state a screen renders from, and the request lifecycle around it.
//!
//! A fetch is split into `begin` (take a ticket, show loading) and `complete` (apply the result).
//! Results that arrive after the view was torn down, or after a newer request started, are
//! dropped. A failed request keeps whatever was displayed before and adds a dismissible error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::error::{AppError, AppResult};

mod admin;
mod dashboard;
mod reports;

pub use admin::{GenealogyView, UploadHistoryView, RECENT_UPLOADS};
pub use dashboard::DashboardView;
pub use reports::{EarningsSet, Export, ReportsView};

/// Liveness of one mounted view. Clones share the flag, so whoever owns the screen can tear it
/// down while a fetch for it is still pending.
#[derive(Debug, Clone)]
pub struct ViewScope {
    mounted: Arc<AtomicBool>,
}

impl Default for ViewScope {
    fn default() -> Self { Self::new() }
}

impl ViewScope {
    pub fn new() -> Self { Self { mounted: Arc::new(AtomicBool::new(true)) } }
    pub fn is_mounted(&self) -> bool { self.mounted.load(Ordering::Acquire) }
    pub fn unmount(&self) { self.mounted.store(false, Ordering::Release); }
}

/// Handle for one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Ticket {
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Failed,
    /// View gone or request superseded; nothing changed.
    Discarded,
}

#[derive(Debug, Clone)]
pub struct Loadable<T> {
    data: Option<T>,
    loading: bool,
    error: Option<AppError>,
    generation: u64,
    scope: ViewScope,
}

impl<T> Loadable<T> {
    pub fn new(scope: ViewScope) -> Self {
        Self { data: None, loading: false, error: None, generation: 0, scope }
    }

    pub fn data(&self) -> Option<&T> { self.data.as_ref() }
    pub fn is_loading(&self) -> bool { self.loading }
    pub fn error(&self) -> Option<&AppError> { self.error.as_ref() }
    pub fn scope(&self) -> &ViewScope { &self.scope }

    pub fn dismiss_error(&mut self) { self.error = None; }

    /// Show an error without touching data, for failures that never reached the network.
    pub fn set_error(&mut self, err: AppError) { self.error = Some(err); }

    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.loading = true;
        self.error = None;
        Ticket { generation: self.generation }
    }

    pub fn complete(&mut self, ticket: Ticket, result: AppResult<T>) -> Completion {
        if !self.scope.is_mounted() {
            debug!(target: "commission_desk::views", "result for unmounted view dropped");
            return Completion::Discarded;
        }
        if ticket.generation != self.generation {
            debug!(target: "commission_desk::views", "stale result dropped gen={} current={}", ticket.generation, self.generation);
            return Completion::Discarded;
        }
        self.loading = false;
        match result {
            Ok(v) => {
                self.data = Some(v);
                Completion::Applied
            }
            Err(e) => {
                debug!(target: "commission_desk::views", "load failed: {}", e);
                self.error = Some(e);
                Completion::Failed
            }
        }
    }
}
