//! Call-stack capture.

#![allow(missing_docs)]

use smol_str::SmolStr;

use super::hook::TraceFrame;
use super::resolve::{is_dynamic_source, SourceResolver};
use super::{FrameDescriptor, StackDescriptor};

/// Renders a live frame chain into a [`StackDescriptor`].
pub struct StackSnapshotter<'r> {
    resolver: &'r dyn SourceResolver,
    show_dynamic_code: bool,
}

impl<'r> StackSnapshotter<'r> {
    #[must_use]
    pub fn new(resolver: &'r dyn SourceResolver) -> Self {
        Self {
            resolver,
            show_dynamic_code: false,
        }
    }

    #[must_use]
    pub fn show_dynamic_code(mut self, show: bool) -> Self {
        self.show_dynamic_code = show;
        self
    }

    /// Walk from `top` towards the module frame, innermost first.
    ///
    /// Stops at the first frame whose file is neither resolvable nor dynamic.
    /// Dynamic frames are skipped unless shown. Frames whose locals cannot be
    /// read are left out.
    #[must_use]
    pub fn snapshot(&self, top: &dyn TraceFrame) -> StackDescriptor {
        let mut frames = Vec::new();
        let mut current = Some(top);
        while let Some(frame) = current {
            current = frame.caller();
            let file = frame.file();
            let dynamic = is_dynamic_source(file);
            if !dynamic && !self.resolver.resolves(file) {
                break;
            }
            if dynamic && !self.show_dynamic_code {
                continue;
            }
            match frame.locals() {
                Ok(locals) => frames.push(FrameDescriptor {
                    file: SmolStr::new(file),
                    name: SmolStr::new(frame.name()),
                    line: frame.line(),
                    locals,
                }),
                Err(err) => {
                    tracing::debug!(file, name = frame.name(), %err, "omitting frame from snapshot");
                }
            }
        }
        StackDescriptor::new(frames)
    }
}
