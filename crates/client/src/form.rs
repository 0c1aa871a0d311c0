//! Address form mode controller.
//!
//! The form is either closed, adding a new address, or editing one cached
//! address. Every transition replaces the whole [`FormDraft`]; nothing is
//! patched in place. Each opened or closed draft gets a fresh epoch, so a
//! confirmation only closes the draft it was taken from.

use addressbook_core::{AddressField, AddressFields, AddressId, User};
use tracing::debug;

use crate::error::Precondition;

/// Which form is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormMode {
    /// No form.
    #[default]
    Closed,
    /// Adding a new address.
    Adding,
    /// Editing the cached address with this id.
    Editing(AddressId),
}

/// The form in progress: its mode and unsaved field values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormDraft {
    mode: FormMode,
    fields: AddressFields,
    epoch: u64,
}

impl FormDraft {
    fn closed(epoch: u64) -> Self {
        Self {
            epoch,
            ..Self::default()
        }
    }

    fn adding(epoch: u64) -> Self {
        Self {
            mode: FormMode::Adding,
            fields: AddressFields::default(),
            epoch,
        }
    }

    const fn editing(id: AddressId, fields: AddressFields, epoch: u64) -> Self {
        Self {
            mode: FormMode::Editing(id),
            fields,
            epoch,
        }
    }

    fn with_field(&self, field: AddressField, value: String) -> Self {
        let mut fields = self.fields.clone();
        fields.set(field, value);
        Self {
            mode: self.mode,
            fields,
            epoch: self.epoch,
        }
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> FormMode {
        self.mode
    }

    /// Unsaved field values. Empty while closed.
    #[must_use]
    pub const fn fields(&self) -> &AddressFields {
        &self.fields
    }

    /// Whether a form is showing.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.mode != FormMode::Closed
    }
}

/// Which request a submission turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionTarget {
    /// Create a new address.
    Add,
    /// Update the address with this id.
    Update(AddressId),
}

/// What a submit should send, captured from the draft at submit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    target: SubmissionTarget,
    fields: AddressFields,
    epoch: u64,
}

impl Submission {
    /// The request to send.
    #[must_use]
    pub const fn target(&self) -> SubmissionTarget {
        self.target
    }

    /// The fields to send.
    #[must_use]
    pub const fn fields(&self) -> &AddressFields {
        &self.fields
    }
}

/// State machine over [`FormDraft`].
#[derive(Debug, Default)]
pub struct FormController {
    draft: FormDraft,
    epochs: u64,
}

impl FormController {
    /// A closed form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current draft.
    #[must_use]
    pub const fn draft(&self) -> &FormDraft {
        &self.draft
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> FormMode {
        self.draft.mode
    }

    fn next_epoch(&mut self) -> u64 {
        self.epochs += 1;
        self.epochs
    }

    fn close(&mut self) {
        let epoch = self.next_epoch();
        self.draft = FormDraft::closed(epoch);
    }

    /// Open an empty add form, discarding any other draft.
    pub fn start_add(&mut self) {
        let epoch = self.next_epoch();
        self.draft = FormDraft::adding(epoch);
        debug!("Address form opened for add");
    }

    /// Open the edit form for `id`, pre-filled from the cached address.
    ///
    /// # Errors
    ///
    /// [`Precondition::UnknownAddress`] if `user` has no such address; the
    /// draft is unchanged.
    pub fn start_edit(&mut self, user: &User, id: AddressId) -> Result<(), Precondition> {
        let address = user.address(id).ok_or(Precondition::UnknownAddress(id))?;
        let epoch = self.next_epoch();
        self.draft = FormDraft::editing(id, address.fields.clone(), epoch);
        debug!(address_id = %id, "Address form opened for edit");
        Ok(())
    }

    /// Close the form and drop the draft.
    pub fn cancel(&mut self) {
        self.close();
    }

    /// The add/cancel button: opens an add form when closed, closes
    /// anything else.
    pub fn toggle(&mut self) {
        if self.draft.is_open() {
            self.cancel();
        } else {
            self.start_add();
        }
    }

    /// Change one field of the open draft.
    ///
    /// # Errors
    ///
    /// [`Precondition::FormClosed`] if no form is open.
    pub fn set_field(
        &mut self,
        field: AddressField,
        value: impl Into<String>,
    ) -> Result<(), Precondition> {
        if !self.draft.is_open() {
            return Err(Precondition::FormClosed);
        }
        self.draft = self.draft.with_field(field, value.into());
        Ok(())
    }

    /// Capture what submitting the current draft should send. The draft is
    /// kept until the submission is confirmed.
    ///
    /// # Errors
    ///
    /// [`Precondition::FormClosed`] if no form is open.
    pub fn submission(&self) -> Result<Submission, Precondition> {
        let target = match self.draft.mode {
            FormMode::Closed => return Err(Precondition::FormClosed),
            FormMode::Adding => SubmissionTarget::Add,
            FormMode::Editing(id) => SubmissionTarget::Update(id),
        };
        Ok(Submission {
            target,
            fields: self.draft.fields.clone(),
            epoch: self.draft.epoch,
        })
    }

    /// A submission was confirmed by the service.
    ///
    /// Closes the form only if it still shows the draft the submission was
    /// taken from. Any draft opened in the meantime stays open, even one in
    /// the same mode.
    pub fn confirm(&mut self, submission: &Submission) {
        if self.draft.epoch == submission.epoch {
            self.close();
        }
    }

    /// An address left the cache; an edit form bound to it is closed.
    pub fn address_removed(&mut self, id: AddressId) {
        if self.draft.mode == FormMode::Editing(id) {
            debug!(address_id = %id, "Edited address removed; closing form");
            self.close();
        }
    }

    /// Bring the form back in line with the cache. Without a cached user the
    /// form closes; an edit form whose address is gone closes.
    pub fn reconcile(&mut self, user: Option<&User>) {
        match (self.draft.mode, user) {
            (FormMode::Closed, _) => {}
            (_, None) => self.close(),
            (FormMode::Editing(id), Some(user)) if !user.has_address(id) => {
                self.address_removed(id);
            }
            _ => {}
        }
    }
}
