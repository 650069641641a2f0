use shared::tasks::TaskAction;

/// Which modal the page is showing. A single field holds the whole answer,
/// so "at most one modal open per entity kind" holds by construction:
/// opening one replaces (and thereby force-closes) the other before the
/// next render ever sees the state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModalState {
    #[default]
    Closed,
    /// Edit form; `None` means the create variant of the form.
    Edit(Option<i64>),
    DeleteConfirm(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdateRequest {
    pub task_id: i64,
    pub action: TaskAction,
}

/// Minimal state needed to coordinate one entity kind's multi-step UI
/// workflow (open modal -> fill form -> stage -> dispatch -> clear) across
/// re-render cycles. Scoped to one user session; never shared.
///
/// Each staged slot holds at most one value; staging replaces any previous
/// value, and draining is read-and-clear.
#[derive(Debug)]
pub struct SessionStore<T> {
    modal: ModalState,
    staged_form: Option<T>,
    staged_deletion: Option<i64>,
    staged_status: Option<StatusUpdateRequest>,
}

impl<T> Default for SessionStore<T> {
    fn default() -> Self {
        Self {
            modal: ModalState::Closed,
            staged_form: None,
            staged_deletion: None,
            staged_status: None,
        }
    }
}

impl<T> SessionStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modal(&self) -> ModalState {
        self.modal
    }

    /// Opens the edit modal (`None` = create form), force-closing any
    /// delete confirmation.
    pub fn open_edit(&mut self, id: Option<i64>) {
        self.modal = ModalState::Edit(id);
    }

    /// Opens the delete confirmation, force-closing any edit modal.
    pub fn open_delete_confirm(&mut self, id: i64) {
        self.modal = ModalState::DeleteConfirm(id);
    }

    pub fn close_all_modals(&mut self) {
        self.modal = ModalState::Closed;
    }

    /// Stages a validated form submission and closes the form's modal; the
    /// dispatcher picks it up on the next drain.
    pub fn stage_form_submission(&mut self, record: T) {
        self.staged_form = Some(record);
        self.modal = ModalState::Closed;
    }

    pub fn drain_staged_form(&mut self) -> Option<T> {
        self.staged_form.take()
    }

    /// Turns an open delete confirmation into a staged deletion. A no-op
    /// when no confirmation is showing.
    pub fn confirm_deletion(&mut self) {
        if let ModalState::DeleteConfirm(id) = self.modal {
            self.staged_deletion = Some(id);
            self.modal = ModalState::Closed;
        }
    }

    pub fn drain_staged_deletion(&mut self) -> Option<i64> {
        self.staged_deletion.take()
    }

    pub fn stage_status_update(&mut self, task_id: i64, action: TaskAction) {
        self.staged_status = Some(StatusUpdateRequest { task_id, action });
        self.modal = ModalState::Closed;
    }

    pub fn drain_staged_status_update(&mut self) -> Option<StatusUpdateRequest> {
        self.staged_status.take()
    }

    /// True when a drain would dispatch at least one action.
    pub fn has_staged_work(&self) -> bool {
        self.staged_form.is_some() || self.staged_deletion.is_some() || self.staged_status.is_some()
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::Patient;

    use super::*;

    #[test]
    fn opening_delete_confirm_force_closes_the_edit_modal() {
        let mut store = SessionStore::<Patient>::new();
        store.open_edit(Some(1));
        store.open_delete_confirm(2);
        assert_eq!(store.modal(), ModalState::DeleteConfirm(2));

        store.open_edit(None);
        assert_eq!(store.modal(), ModalState::Edit(None));
    }

    #[test]
    fn rapid_repeated_triggers_leave_exactly_one_modal() {
        let mut store = SessionStore::<Patient>::new();
        // Simulates several click handlers firing within one render cycle.
        store.open_edit(Some(1));
        store.open_delete_confirm(1);
        store.open_edit(Some(3));
        store.open_delete_confirm(7);
        assert_eq!(store.modal(), ModalState::DeleteConfirm(7));

        store.close_all_modals();
        assert_eq!(store.modal(), ModalState::Closed);
    }

    #[test]
    fn staging_a_form_closes_the_modal_and_drain_clears_the_slot() {
        let mut store = SessionStore::<Patient>::new();
        store.open_edit(None);
        store.stage_form_submission(Patient {
            full_name: "Maria Souza".into(),
            ..Patient::default()
        });

        assert_eq!(store.modal(), ModalState::Closed);
        assert!(store.has_staged_work());

        let drained = store.drain_staged_form().expect("staged form");
        assert_eq!(drained.full_name, "Maria Souza");
        assert!(store.drain_staged_form().is_none(), "drain must clear");
        assert!(!store.has_staged_work());
    }

    #[test]
    fn staging_replaces_any_previous_submission() {
        let mut store = SessionStore::<Patient>::new();
        store.stage_form_submission(Patient {
            full_name: "first".into(),
            ..Patient::default()
        });
        store.stage_form_submission(Patient {
            full_name: "second".into(),
            ..Patient::default()
        });
        assert_eq!(store.drain_staged_form().expect("form").full_name, "second");
        assert!(store.drain_staged_form().is_none());
    }

    #[test]
    fn deletion_must_be_confirmed_through_the_open_modal() {
        let mut store = SessionStore::<Patient>::new();
        store.confirm_deletion();
        assert!(store.drain_staged_deletion().is_none());

        store.open_delete_confirm(9);
        store.confirm_deletion();
        assert_eq!(store.modal(), ModalState::Closed);
        assert_eq!(store.drain_staged_deletion(), Some(9));
        assert!(store.drain_staged_deletion().is_none());
    }

    #[test]
    fn status_updates_stage_one_request_at_a_time() {
        let mut store = SessionStore::<shared::domain::ProcessTask>::new();
        store.stage_status_update(4, TaskAction::Start);
        store.stage_status_update(4, TaskAction::Cancel);

        let request = store.drain_staged_status_update().expect("request");
        assert_eq!(request.task_id, 4);
        assert_eq!(request.action, TaskAction::Cancel);
        assert!(store.drain_staged_status_update().is_none());
    }
}
