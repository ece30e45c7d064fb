use adgate_types::{DomError, ElementId, ElementSpec};

use crate::host::PageHost;

/// An inserted element that is removed from the page when dropped.
///
/// Removal is best-effort: a failure is logged and otherwise ignored.
pub(crate) struct ScopedElement<'h> {
    host: &'h dyn PageHost,
    id: ElementId,
}

impl<'h> ScopedElement<'h> {
    pub(crate) fn insert(host: &'h dyn PageHost, spec: &ElementSpec) -> Result<Self, DomError> {
        let id = host.insert_element(spec)?;
        Ok(Self { host, id })
    }

    pub(crate) fn id(&self) -> ElementId {
        self.id
    }
}

impl Drop for ScopedElement<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.host.remove_element(self.id) {
            tracing::warn!(element = %self.id, error = %e, "Failed to remove probe element");
        }
    }
}
