//! Debug data types.

#![allow(missing_docs)]

use std::fmt;

use smol_str::SmolStr;

use crate::memory::Locals;

use super::resolve::normalize_source_path;

/// Breakpoint keyed by (file, line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    /// Normalized source path.
    pub file: SmolStr,
    /// 1-based line.
    pub line: u32,
    /// Removed after the first stop it causes.
    pub temporary: bool,
    /// Expression evaluated against the frame's locals.
    pub condition: Option<SmolStr>,
    /// Stop on the Nth passing hit.
    pub hit_count: Option<u64>,
    ignore_count: u64,
}

impl Breakpoint {
    /// Unconditional breakpoint. The path is normalized.
    #[must_use]
    pub fn new(file: &str, line: u32) -> Self {
        Self {
            file: normalize_source_path(file),
            line,
            temporary: false,
            condition: None,
            hit_count: None,
            ignore_count: 0,
        }
    }

    #[must_use]
    pub fn with_condition(mut self, condition: impl Into<SmolStr>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Skip the first `count - 1` passing hits. A count of 0 behaves as 1.
    #[must_use]
    pub fn with_hit_count(mut self, count: u64) -> Self {
        self.hit_count = Some(count);
        self.ignore_count = count.saturating_sub(1);
        self
    }

    #[must_use]
    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    /// Passing hits still to skip before this breakpoint stops.
    #[must_use]
    pub fn remaining_ignores(&self) -> u64 {
        self.ignore_count
    }

    pub(crate) fn consume_ignore(&mut self) -> bool {
        if self.ignore_count == 0 {
            return false;
        }
        self.ignore_count -= 1;
        true
    }
}

/// One captured frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDescriptor {
    pub file: SmolStr,
    pub name: SmolStr,
    pub line: u32,
    pub locals: Locals,
}

/// Captured call stack, innermost frame first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StackDescriptor {
    frames: Vec<FrameDescriptor>,
}

impl StackDescriptor {
    #[must_use]
    pub fn new(frames: Vec<FrameDescriptor>) -> Self {
        Self { frames }
    }

    #[must_use]
    pub fn frames(&self) -> &[FrameDescriptor] {
        &self.frames
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn innermost(&self) -> Option<&FrameDescriptor> {
        self.frames.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameDescriptor> {
        self.frames.iter()
    }
}

impl fmt::Display for StackDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in &self.frames {
            write!(f, "{}:{} in {}", frame.file, frame.line, frame.name)?;
            if !frame.locals.is_empty() {
                let locals: Vec<String> = frame
                    .locals
                    .iter()
                    .map(|(name, value)| format!("{name}={}", value.repr()))
                    .collect();
                write!(f, " [{}]", locals.join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Command that releases a suspended program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeCommand {
    Continue,
    StepInto,
    /// Stop at the next line at or above the given depth, by default the
    /// depth at suspension.
    StepOver(Option<u32>),
    /// Stop at the next line above the given depth, by default the depth at
    /// suspension.
    StepOut(Option<u32>),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspendReason {
    Breakpoint,
    Step,
    Exception,
}

/// Notification sent to the controller when the program suspends.
#[derive(Debug, Clone, PartialEq)]
pub struct SuspendEvent {
    pub reason: SuspendReason,
    pub file: SmolStr,
    pub line: u32,
    /// Call depth at suspension, 1 for module code.
    pub depth: u32,
    pub stack: StackDescriptor,
    /// Error message for [`SuspendReason::Exception`].
    pub exception: Option<SmolStr>,
}

/// Tracer lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracerPhase {
    Running,
    EvaluatingStop,
    Suspended,
    Terminated,
}

/// Result of applying a controller command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    Applied,
    Ignored,
}

/// Diagnostic message for the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugLog {
    pub message: String,
    pub file: SmolStr,
    pub line: u32,
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use super::*;
    use crate::value::Value;

    #[test]
    fn hit_count_sets_ignore_counter() {
        let bp = Breakpoint::new("./a.lt", 3).with_hit_count(4);
        assert_eq!(bp.file, "a.lt");
        assert_eq!(bp.remaining_ignores(), 3);
        assert_eq!(Breakpoint::new("a.lt", 3).with_hit_count(0).remaining_ignores(), 0);
    }

    #[test]
    fn stack_renders_innermost_first() {
        let mut locals = Locals::new();
        locals.insert("n".into(), Value::Int(2));
        locals.insert("s".into(), Value::from("x"));
        let stack = StackDescriptor::new(vec![
            FrameDescriptor {
                file: "a.lt".into(),
                name: "f".into(),
                line: 4,
                locals,
            },
            FrameDescriptor {
                file: "a.lt".into(),
                name: "<module>".into(),
                line: 9,
                locals: Locals::new(),
            },
        ]);
        expect![[r#"
            a.lt:4 in f [n=2, s="x"]
            a.lt:9 in <module>
        "#]]
        .assert_eq(&stack.to_string());
        assert_eq!(stack.innermost().map(|frame| frame.line), Some(4));
    }
}
