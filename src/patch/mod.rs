//! Attribute patch engine.
//!
//! A wire PatchOp is normalised into a [`PatchRequest`], then each
//! operation is dispatched through the fixed attribute table of the target
//! kind ([`TargetUser`] or [`TargetGroup`]). Dispatch is pure: anything that
//! needs a downstream call beyond the field update is recorded as a
//! [`DeferredCall`] in the [`DispatchContext`].

pub mod dispatch;
pub mod group;
pub mod operation;
pub mod target;
pub mod user;
pub mod value;

pub use dispatch::{apply, apply_all, DispatchContext, Handler, PatchTarget};
pub use operation::{OperationName, PatchOperation, PatchRequest};
pub use target::{DeferredCall, FieldUpdate, TargetGroup, TargetUser};
pub use value::{normalize, OperationValue};
