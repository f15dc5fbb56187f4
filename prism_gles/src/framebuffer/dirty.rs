/// Explicit dirty-state machine for framebuffer rebuilds
///
/// `SizeDirty` dominates `AttachmentsDirty`: a size change forces the
/// shared depth-stencil surface to be rebuilt before the render pass and
/// device framebuffers, while an attachment change alone only rebuilds
/// the latter.

/// Rebuild state of a framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirtyState {
    #[default]
    Clean,
    /// Attachments changed; render pass and device framebuffers must be
    /// rebuilt
    AttachmentsDirty,
    /// Dimensions changed; the shared depth-stencil surface must be
    /// rebuilt as well
    SizeDirty,
}

impl DirtyState {
    /// Record an attachment change. Does not downgrade `SizeDirty`.
    pub fn mark_attachments(&mut self) {
        if *self == DirtyState::Clean {
            *self = DirtyState::AttachmentsDirty;
        }
    }

    /// Record a size change
    pub fn mark_size(&mut self) {
        *self = DirtyState::SizeDirty;
    }

    pub fn needs_rebuild(self) -> bool {
        self != DirtyState::Clean
    }

    pub fn size_dirty(self) -> bool {
        self == DirtyState::SizeDirty
    }

    /// The depth-stencil surface has been rebuilt; attachments still need
    /// their rebuild pass
    pub fn resolve_size(&mut self) {
        if *self == DirtyState::SizeDirty {
            *self = DirtyState::AttachmentsDirty;
        }
    }

    /// All rebuilds done
    pub fn resolve(&mut self) {
        *self = DirtyState::Clean;
    }
}

#[cfg(test)]
#[path = "dirty_tests.rs"]
mod tests;
