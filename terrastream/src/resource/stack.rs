//! LIFO ownership of render-side resources.

use std::fmt;

use thiserror::Error;
use tracing::{debug, trace};

/// Identifier a render backend assigns to a resource it created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A render-side resource that must be explicitly released.
///
/// `destroy` consumes the handle, so a resource cannot be released twice.
pub trait GpuResource {
    /// Backend identifier of this resource.
    fn id(&self) -> ResourceId;

    /// Releases the resource.
    fn destroy(self);
}

/// Errors from [`ResourceStack`] operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    /// `pop` was called on an empty stack.
    #[error("Resource stack is empty")]
    Empty,
}

/// Owns render resources and releases them in reverse creation order.
///
/// Resources pushed later may depend on earlier ones (a mesh on its
/// texture, a transform on its mesh), so dependents always go first.
/// Dropping the stack tears down whatever is left.
pub struct ResourceStack<R: GpuResource> {
    entries: Vec<R>,
}

impl<R: GpuResource> ResourceStack<R> {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates an empty stack with room for `capacity` resources.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Takes ownership of `resource`.
    pub fn push(&mut self, resource: R) {
        trace!(id = %resource.id(), depth = self.entries.len() + 1, "Resource pushed");
        self.entries.push(resource);
    }

    /// Destroys the most recently pushed resource and returns its id.
    pub fn pop(&mut self) -> Result<ResourceId, StackError> {
        let resource = self.entries.pop().ok_or(StackError::Empty)?;
        let id = resource.id();
        resource.destroy();
        trace!(%id, depth = self.entries.len(), "Resource destroyed");
        Ok(id)
    }

    /// The most recently pushed resource, if any.
    pub fn peek(&self) -> Option<&R> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Destroys every resource, newest first. Returns how many were released.
    pub fn teardown(&mut self) -> usize {
        let count = self.entries.len();
        while let Some(resource) = self.entries.pop() {
            resource.destroy();
        }
        if count > 0 {
            debug!(count, "Resource stack torn down");
        }
        count
    }
}

impl<R: GpuResource> Default for ResourceStack<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: GpuResource> Drop for ResourceStack<R> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<R: GpuResource> fmt::Debug for ResourceStack<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceStack")
            .field("len", &self.entries.len())
            .finish()
    }
}
