//! Submission path for student writes.
//!
//! Decides, per write, whether to call the service directly or park the
//! write in the offline queue. A write is sent directly only when the service
//! is known to be reachable and nothing is already queued, so replay order
//! always matches submission order.

use tracing::{debug, info};

use super::context::SyncContext;
use super::operation::QueuedOperation;
use super::queue::SyncQueue;
use crate::api::{Backend, NewStudent, Student, StudentDraft};
use crate::error::RollcallError;

/// What happened to a submitted write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The service created the student.
    Sent(Student),
    /// The service deleted (or had already deleted) the student.
    Deleted(i64),
    /// The write was queued; `count` is the new queue length.
    Queued { count: usize },
    /// A local-only student was discarded from the queue.
    DiscardedLocal(NewStudent),
}

impl Submission {
    #[must_use]
    pub const fn is_queued(&self) -> bool {
        matches!(self, Self::Queued { .. })
    }
}

/// Which student a delete refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    /// A student known to the service by id.
    Remote(i64),
    /// A student that only exists as a queued create at this position.
    Pending(usize),
}

/// Routes student writes to the service or the offline queue.
pub struct StudentDispatcher<'a> {
    backend: &'a dyn Backend,
    context: &'a SyncContext,
    queue: &'a SyncQueue<'a>,
}

impl<'a> StudentDispatcher<'a> {
    #[must_use]
    pub const fn new(
        backend: &'a dyn Backend,
        context: &'a SyncContext,
        queue: &'a SyncQueue<'a>,
    ) -> Self {
        Self {
            backend,
            context,
            queue,
        }
    }

    /// Whether a write may skip the queue.
    fn can_send_directly(&self) -> bool {
        self.context.is_available() && self.queue.is_empty()
    }

    /// Validate and submit a new student.
    ///
    /// # Errors
    ///
    /// Returns a validation error before anything is sent or queued, a
    /// rejection when the service refuses the student, or a storage error
    /// when the queue cannot be written.
    pub fn create(&self, draft: StudentDraft) -> Result<Submission, RollcallError> {
        let student = draft.validate()?;

        if self.can_send_directly() {
            match self.backend.create_student(&student) {
                Ok(created) => {
                    info!(id = created.id, name = %created.name, "student created");
                    return Ok(Submission::Sent(created));
                }
                Err(e) if e.is_network() => {
                    debug!(error = %e, "create failed to reach the service, queueing");
                    self.context.set_available(false);
                }
                Err(e) => return Err(e),
            }
        }

        self.park(QueuedOperation::CreateStudent(student))
    }

    /// Delete a student.
    ///
    /// # Errors
    ///
    /// Returns [`RollcallError::NotFound`] when a pending target does not
    /// point at a queued create, a rejection when the service refuses the
    /// delete, or a storage error when the queue cannot be written.
    pub fn delete(&self, target: DeleteTarget) -> Result<Submission, RollcallError> {
        match target {
            DeleteTarget::Remote(id) => self.delete_remote(id),
            DeleteTarget::Pending(index) => self.delete_pending(index),
        }
    }

    fn delete_remote(&self, id: i64) -> Result<Submission, RollcallError> {
        if self.can_send_directly() {
            match self.backend.delete_student(id) {
                Ok(()) => {
                    info!(id, "student deleted");
                    return Ok(Submission::Deleted(id));
                }
                Err(e) if e.is_network() => {
                    debug!(error = %e, "delete failed to reach the service, queueing");
                    self.context.set_available(false);
                }
                Err(e) => return Err(e),
            }
        }

        self.park(QueuedOperation::DeleteStudent { id })
    }

    /// A student that was never sent is removed from the queue; the service
    /// is not involved.
    fn delete_pending(&self, index: usize) -> Result<Submission, RollcallError> {
        let is_create = self
            .queue
            .list()
            .get(index)
            .is_some_and(|op| op.as_create().is_some());
        if !is_create {
            return Err(RollcallError::NotFound(format!(
                "No pending student at position {}",
                index + 1
            )));
        }

        match self.queue.dequeue_at(index)? {
            Some(QueuedOperation::CreateStudent(student)) => Ok(Submission::DiscardedLocal(student)),
            _ => Err(RollcallError::NotFound(format!(
                "No pending student at position {}",
                index + 1
            ))),
        }
    }

    /// Remove the first queued create for a student with this name.
    ///
    /// Returns `None` when no such create is queued.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be written.
    pub fn discard_pending_create(&self, name: &str) -> Result<Option<NewStudent>, RollcallError> {
        let Some(index) = self.queue.find_pending_create(name) else {
            return Ok(None);
        };

        Ok(self
            .queue
            .dequeue_at(index)?
            .and_then(|op| match op {
                QueuedOperation::CreateStudent(student) => Some(student),
                QueuedOperation::DeleteStudent { .. } => None,
            }))
    }

    fn park(&self, operation: QueuedOperation) -> Result<Submission, RollcallError> {
        info!(%operation, "service unavailable, queued for later");
        let count = self.queue.enqueue(operation)?;
        Ok(Submission::Queued { count })
    }
}
