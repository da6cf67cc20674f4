//! Error types for rootstore.
//!
//! Uses `thiserror` for the error definitions. Every failure is a value
//! returned to the immediate caller; nothing is retried or swallowed.

use std::fmt;

use thiserror::Error;

use crate::entity::EntityId;

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for rootstore operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// A commit found the store moved past the diff's base snapshot.
    #[must_use]
    pub fn stale_base(base: u64, current: u64) -> Self {
        Self::new(ErrorKind::StaleBase { base, current })
    }

    /// A session tried to join a shared diff that no longer fits the store.
    #[must_use]
    pub fn inconsistent_batch(owner: impl Into<String>, reason: BatchInconsistency) -> Self {
        Self::new(ErrorKind::InconsistentBatch {
            owner: owner.into(),
            reason,
        })
    }

    /// Creates an entity not found error.
    #[must_use]
    pub fn entity_not_found(id: EntityId) -> Self {
        Self::new(ErrorKind::EntityNotFound(id))
    }

    /// Creates a duplicate entity error.
    #[must_use]
    pub fn duplicate_entity(id: EntityId) -> Self {
        Self::new(ErrorKind::DuplicateEntity(id))
    }

    /// Creates a dangling parent error.
    #[must_use]
    pub fn dangling_parent(child: EntityId, parent: EntityId) -> Self {
        Self::new(ErrorKind::DanglingParent { child, parent })
    }

    /// Creates a parent cycle error.
    #[must_use]
    pub fn parent_cycle(child: EntityId, parent: EntityId) -> Self {
        Self::new(ErrorKind::ParentCycle { child, parent })
    }

    /// Creates a subscription failure error.
    #[must_use]
    pub fn subscription_failed(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::SubscriptionFailed(reason.into()))
    }

    /// Creates a disposed-resource error.
    #[must_use]
    pub fn disposed(what: impl Into<String>) -> Self {
        Self::new(ErrorKind::Disposed(what.into()))
    }

    /// Creates a session closed error.
    #[must_use]
    pub fn session_closed() -> Self {
        Self::new(ErrorKind::SessionClosed)
    }

    /// Creates an error for re-entering a diff this thread already holds.
    #[must_use]
    pub fn reentrant_access(what: impl Into<String>) -> Self {
        Self::new(ErrorKind::ReentrantAccess(what.into()))
    }

    /// Creates a commit authority error.
    #[must_use]
    pub fn commit_authority(owner: impl Into<String>) -> Self {
        Self::new(ErrorKind::CommitAuthority {
            owner: owner.into(),
        })
    }

    /// Returns true if this is a [`ErrorKind::StaleBase`] error.
    #[must_use]
    pub fn is_stale_base(&self) -> bool {
        matches!(self.kind, ErrorKind::StaleBase { .. })
    }

    /// Returns true if this is a [`ErrorKind::InconsistentBatch`] error.
    #[must_use]
    pub fn is_inconsistent_batch(&self) -> bool {
        matches!(self.kind, ErrorKind::InconsistentBatch { .. })
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The store's current snapshot is no longer the diff's base.
    #[error("stale base: diff built on version {base}, store is at version {current}")]
    StaleBase {
        /// Version the diff was built from.
        base: u64,
        /// Version the store is at now.
        current: u64,
    },

    /// An explicit shared diff cannot be joined.
    #[error("inconsistent batch for {owner}: {reason}")]
    InconsistentBatch {
        /// Owner that attempted to join.
        owner: String,
        /// Why the shared diff does not fit.
        reason: BatchInconsistency,
    },

    /// Entity does not exist in the snapshot or diff.
    #[error("entity not found: {0:?}")]
    EntityNotFound(EntityId),

    /// Entity id is already taken.
    #[error("duplicate entity: {0:?}")]
    DuplicateEntity(EntityId),

    /// Entity points at a parent that does not exist.
    #[error("entity {child:?} references missing parent {parent:?}")]
    DanglingParent {
        /// The entity being written.
        child: EntityId,
        /// The parent it references.
        parent: EntityId,
    },

    /// Entity would become its own ancestor.
    #[error("entity {child:?} cannot move under {parent:?}: that would form a cycle")]
    ParentCycle {
        /// The entity being written.
        child: EntityId,
        /// The parent it was given.
        parent: EntityId,
    },

    /// The host's invalidation source refused a subscription.
    #[error("subscription failed: {0}")]
    SubscriptionFailed(String),

    /// A resource was used after disposal.
    #[error("{0} has been disposed")]
    Disposed(String),

    /// The session's diff was already committed or discarded.
    #[error("session closed: its diff was already committed or discarded")]
    SessionClosed,

    /// A joined session tried to commit a diff owned by its batch.
    #[error("{owner} joined a shared diff and cannot commit it; the batch owns the commit")]
    CommitAuthority {
        /// Owner of the joined session.
        owner: String,
    },

    /// The diff is already borrowed further up this thread's stack.
    #[error("{0} is already in use on this thread")]
    ReentrantAccess(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Reasons a shared diff cannot be joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchInconsistency {
    /// The diff was built against an older version of the store.
    StaleBase {
        /// Version the batch's diff was built from.
        batch_base: u64,
        /// Version the store is at now.
        current: u64,
    },
    /// The diff belongs to a different store.
    ForeignStore {
        /// Store the owner lives in.
        expected: u64,
        /// Store the diff was built from.
        actual: u64,
    },
}

impl fmt::Display for BatchInconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleBase {
                batch_base,
                current,
            } => write!(
                f,
                "shared diff built on version {batch_base}, store is at version {current}"
            ),
            Self::ForeignStore { expected, actual } => write!(
                f,
                "shared diff belongs to store {actual}, expected store {expected}"
            ),
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation that failed (e.g. `"commit"`).
    pub operation: Option<String>,
    /// Owner the operation ran for.
    pub owner: Option<String>,
    /// Chain of enclosing operations, innermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the failing operation.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Sets the owner.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Adds an enclosing operation.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(operation) = &self.operation {
            write!(f, "during {operation}")?;
            if let Some(owner) = &self.owner {
                write!(f, " for {owner}")?;
            }
        }
        for frame in &self.stack {
            writeln!(f)?;
            write!(f, "  in {frame}")?;
        }
        Ok(())
    }
}
