//! Scoped release of connection, statement and cursor handles.

use crate::db::source::Release;
use std::ops::{Deref, DerefMut};
use tracing::{trace, warn};

/// RAII guard that releases its handle when dropped.
///
/// The store keeps one guard per handle as a local, so the guards are dropped
/// in reverse order of acquisition: cursor, then statement, then connection.
/// This holds for normal returns, `?` early returns and failures while mapping
/// rows alike.
///
/// A failed release is logged and swallowed. It never replaces the result the
/// operation already produced.
pub struct Scoped<H: Release> {
    handle: H,
}

impl<H: Release> Scoped<H> {
    pub fn new(handle: H) -> Self {
        trace!(kind = H::KIND, "Handle opened");
        Self { handle }
    }
}

impl<H: Release> Deref for Scoped<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.handle
    }
}

impl<H: Release> DerefMut for Scoped<H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut self.handle
    }
}

impl<H: Release> Drop for Scoped<H> {
    fn drop(&mut self) {
        match self.handle.release() {
            Ok(()) => trace!(kind = H::KIND, "Handle released"),
            Err(e) => warn!(kind = H::KIND, error = %e, "Failed to release handle"),
        }
    }
}

impl<H: Release + std::fmt::Debug> std::fmt::Debug for Scoped<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scoped")
            .field("kind", &H::KIND)
            .field("handle", &self.handle)
            .finish()
    }
}
