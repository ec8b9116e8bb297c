//! Call frames and local variables.

#![allow(missing_docs)]

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::debug::TraceFrame;
use crate::error::RuntimeError;
use crate::value::Value;

/// Local variables of one frame, in assignment order.
pub type Locals = IndexMap<SmolStr, Value>;

/// Name given to the frame that executes a module's top-level statements.
pub const MODULE_FRAME_NAME: &str = "<module>";

/// A live call frame.
///
/// Frames borrow their caller, so the chain from the innermost frame to the
/// module frame is always available while a call is executing.
#[derive(Debug)]
pub struct Frame<'a> {
    pub file: SmolStr,
    pub name: SmolStr,
    /// Line currently executing, 0 before the first statement.
    pub line: u32,
    pub locals: Locals,
    pub caller: Option<&'a Frame<'a>>,
}

impl<'a> Frame<'a> {
    /// Top-level frame for a module; its locals are the module globals.
    #[must_use]
    pub fn module(file: impl Into<SmolStr>) -> Self {
        Self {
            file: file.into(),
            name: SmolStr::new_static(MODULE_FRAME_NAME),
            line: 0,
            locals: Locals::new(),
            caller: None,
        }
    }

    /// Frame for a call made from `caller`.
    #[must_use]
    pub fn call(
        file: impl Into<SmolStr>,
        name: impl Into<SmolStr>,
        line: u32,
        caller: &'a Frame<'a>,
    ) -> Self {
        Self {
            file: file.into(),
            name: name.into(),
            line,
            locals: Locals::new(),
            caller: Some(caller),
        }
    }

    /// Outermost frame of the chain.
    #[must_use]
    pub fn root(&self) -> &Frame<'a> {
        let mut current = self;
        while let Some(caller) = current.caller {
            current = caller;
        }
        current
    }

    /// Look up a name in this frame, then in the module globals.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.locals
            .get(name)
            .or_else(|| self.root().locals.get(name))
    }

    pub fn set_local(&mut self, name: impl Into<SmolStr>, value: Value) {
        self.locals.insert(name.into(), value);
    }

    /// Number of frames in the chain, this one included.
    #[must_use]
    pub fn depth(&self) -> u32 {
        let mut depth = 1;
        let mut current = self;
        while let Some(caller) = current.caller {
            depth += 1;
            current = caller;
        }
        depth
    }
}

impl TraceFrame for Frame<'_> {
    fn file(&self) -> &str {
        &self.file
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn line(&self) -> u32 {
        self.line
    }

    fn locals(&self) -> Result<Locals, RuntimeError> {
        Ok(self.locals.clone())
    }

    fn caller(&self) -> Option<&dyn TraceFrame> {
        self.caller.map(|frame| frame as &dyn TraceFrame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_falls_back_to_module_globals() {
        let mut module = Frame::module("main.lt");
        module.set_local("limit", Value::Int(3));
        module.set_local("x", Value::Int(1));
        let mut call = Frame::call("main.lt", "f", 4, &module);
        call.set_local("x", Value::Int(2));

        assert_eq!(call.lookup("x"), Some(&Value::Int(2)));
        assert_eq!(call.lookup("limit"), Some(&Value::Int(3)));
        assert_eq!(call.lookup("missing"), None);
        assert_eq!(call.depth(), 2);
        assert_eq!(call.root().name, MODULE_FRAME_NAME);
    }

    #[test]
    fn scope_shadows_globals_with_locals() {
        let mut module = Frame::module("main.lt");
        module.set_local("limit", Value::Int(3));
        module.set_local("x", Value::Int(1));
        let outer = Frame::call("main.lt", "g", 7, &module);
        let mut inner = Frame::call("main.lt", "f", 4, &outer);
        inner.set_local("x", Value::Int(2));

        let scope = inner.scope().unwrap();
        assert_eq!(scope.get("x"), Some(&Value::Int(2)));
        assert_eq!(scope.get("limit"), Some(&Value::Int(3)));
        assert_eq!(scope.len(), 2);
        assert_eq!(module.scope().unwrap(), module.locals);
    }
}
