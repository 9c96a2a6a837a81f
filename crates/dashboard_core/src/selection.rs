//! Delete confirmation driven entirely by the URL: the dialog is open exactly
//! when the entity's selection parameter is present.

use std::{fmt, future::Future};

use shared::{
    domain::EntityKind,
    protocol::MutationResponse,
    query::{Location, SelectionState},
};
use tracing::debug;

use crate::{
    cache::Invalidate,
    mutation::{MutationController, MutationError, MutationPhase},
    notify::Notifier,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    Open { id: i64 },
    /// Confirm was pressed; both actions stay disabled until it settles.
    Pending { id: i64 },
}

impl DialogState {
    pub fn derive(selection: SelectionState, phase: MutationPhase) -> Self {
        match (selection.active_id, phase) {
            (None, _) => DialogState::Closed,
            (Some(id), MutationPhase::Pending) => DialogState::Pending { id },
            (Some(id), _) => DialogState::Open { id },
        }
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self, DialogState::Closed)
    }

    pub fn actions_enabled(&self) -> bool {
        matches!(self, DialogState::Open { .. })
    }
}

/// Client-side routing seam.
pub trait Navigator: Send + Sync {
    fn push(&self, url: &str);
}

impl<N: Navigator + ?Sized> Navigator for &N {
    fn push(&self, url: &str) {
        (**self).push(url);
    }
}

/// Confirmation dialog for one list view at one URL.
#[derive(Debug, Clone)]
pub struct ConfirmationFlow {
    kind: EntityKind,
    location: Location,
}

impl ConfirmationFlow {
    pub fn new(kind: EntityKind, location: Location) -> Self {
        Self { kind, location }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn selection(&self) -> SelectionState {
        SelectionState::from_location(&self.location, self.kind)
    }

    pub fn state<N: Notifier>(&self, controller: &MutationController<N>) -> DialogState {
        DialogState::derive(self.selection(), controller.status().phase)
    }

    /// URL that opens the dialog for `id`, keeping the list state.
    pub fn request_url(&self, id: i64) -> String {
        let patch = SelectionState::selected(id).patch(self.kind);
        self.location.apply(&patch).to_string()
    }

    /// URL that closes the dialog. Only the selection parameter is removed.
    pub fn cancel_url(&self) -> String {
        let patch = SelectionState::default().patch(self.kind);
        self.location.apply(&patch).to_string()
    }

    /// Where a successful delete lands: the bare list, back on page one.
    pub fn success_url(&self) -> String {
        self.location.bare().to_string()
    }

    pub fn request(&self, id: i64, navigator: &dyn Navigator) {
        navigator.push(&self.request_url(id));
    }

    pub fn cancel(&self, navigator: &dyn Navigator) {
        navigator.push(&self.cancel_url());
    }

    /// Runs the delete for the selected id. On success the browser is sent to
    /// the bare list and every affected list is invalidated; on failure the URL
    /// is left alone so the dialog stays open over the error toast.
    pub async fn confirm<N, F, Fut, E>(
        &self,
        controller: &MutationController<N>,
        navigator: &dyn Navigator,
        invalidator: &dyn Invalidate,
        op: F,
    ) -> Result<MutationResponse, MutationError>
    where
        N: Notifier,
        F: FnOnce(i64) -> Fut,
        Fut: Future<Output = Result<MutationResponse, E>>,
        E: fmt::Display,
    {
        let target = self.selection().active_id;
        let response = controller.execute(target, op).await?;
        debug!(entity = %self.kind, "delete confirmed, leaving dialog");
        navigator.push(&self.success_url());
        invalidator.invalidate_after_change(self.kind);
        Ok(response)
    }
}

#[cfg(test)]
#[path = "tests/selection_tests.rs"]
mod tests;
