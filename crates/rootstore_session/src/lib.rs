//! Mutation sessions and the module root façade for rootstore.
//!
//! This crate provides:
//! - [`MutableSessionCoordinator`] - Opens fresh sessions or joins a batch's shared diff
//! - [`Batch`] / [`SharedDiff`] - One diff, many sessions, one atomic commit
//! - [`RootModel`] - Derived view of a module's roots and dependencies
//! - [`ModuleRootComponent`] - Cached, forwarding façade for one module
//! - [`ModifiableRootModel`] - Domain edits over a session

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod batch;
pub mod component;
pub mod coordinator;
pub mod fields;
pub mod modifiable;
pub mod order_roots;
pub mod owner;
pub mod root_model;
pub mod session;
pub mod shared;

pub use batch::Batch;
pub use component::ModuleRootComponent;
pub use coordinator::MutableSessionCoordinator;
pub use modifiable::ModifiableRootModel;
pub use order_roots::OrderRoots;
pub use owner::{BatchId, OwnerId};
pub use root_model::{
    ContentEntry, DependencyScope, ModelSource, ModuleExtension, OrderEntry, RootModel, SourceRoot,
};
pub use session::{Session, SessionKind};
pub use shared::SharedDiff;
