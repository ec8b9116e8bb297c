//! Breakpoint storage and matching.

#![allow(missing_docs)]

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::eval::evaluate_condition;
use crate::memory::Locals;

use super::resolve::normalize_source_path;
use super::{Breakpoint, DebugLog};

/// Breakpoints keyed by normalized (file, line).
#[derive(Debug, Clone, Default)]
pub struct BreakpointTable {
    entries: IndexMap<(SmolStr, u32), Breakpoint>,
}

impl BreakpointTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `breakpoint`, replacing and returning any entry at its key.
    pub fn set(&mut self, breakpoint: Breakpoint) -> Option<Breakpoint> {
        let key = (breakpoint.file.clone(), breakpoint.line);
        let previous = self.entries.shift_remove(&key);
        self.entries.insert(key, breakpoint);
        previous
    }

    pub fn clear(&mut self, file: &str, line: u32) -> Option<Breakpoint> {
        self.entries
            .shift_remove(&(normalize_source_path(file), line))
    }

    /// Remove every breakpoint in `file`, returning how many were removed.
    pub fn clear_file(&mut self, file: &str) -> usize {
        let file = normalize_source_path(file);
        let before = self.entries.len();
        self.entries.retain(|(bp_file, _), _| *bp_file != file);
        before - self.entries.len()
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn get(&self, file: &str, line: u32) -> Option<&Breakpoint> {
        self.entries.get(&(normalize_source_path(file), line))
    }

    /// Whether `should_stop` at this location would read locals.
    #[must_use]
    pub fn needs_locals(&self, file: &str, line: u32) -> bool {
        self.get(file, line)
            .is_some_and(|bp| bp.condition.is_some())
    }

    /// Decide whether execution at (`file`, `line`) stops.
    ///
    /// Conditions that fail to evaluate count as satisfied; a warning is
    /// pushed to `logs`. Hit counts skip passing hits until the Nth. A
    /// temporary breakpoint is removed when it stops.
    pub fn should_stop(
        &mut self,
        file: &str,
        line: u32,
        locals: &Locals,
        logs: &mut Vec<DebugLog>,
    ) -> bool {
        let key = (normalize_source_path(file), line);
        let Some(breakpoint) = self.entries.get_mut(&key) else {
            return false;
        };
        if let Some(condition) = &breakpoint.condition {
            match evaluate_condition(condition, locals) {
                Ok(true) => {}
                Ok(false) => return false,
                Err(err) => {
                    tracing::warn!(%file, line, %condition, %err, "breakpoint condition failed, stopping");
                    logs.push(DebugLog {
                        message: format!(
                            "error evaluating breakpoint condition '{condition}': {err}"
                        ),
                        file: key.0.clone(),
                        line,
                    });
                }
            }
        }
        if breakpoint.consume_ignore() {
            return false;
        }
        if breakpoint.temporary {
            self.entries.shift_remove(&key);
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Breakpoint> {
        self.entries.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn hit(table: &mut BreakpointTable, file: &str, line: u32) -> bool {
        table.should_stop(file, line, &Locals::new(), &mut Vec::new())
    }

    #[test]
    fn set_then_clear_leaves_nothing() {
        let mut table = BreakpointTable::new();
        table.set(Breakpoint::new("a.lt", 3));
        assert!(table.get("a.lt", 3).is_some());
        assert!(table.clear("./a.lt", 3).is_some());
        assert!(table.get("a.lt", 3).is_none());
        assert!(table.clear("a.lt", 3).is_none());
        assert!(!hit(&mut table, "a.lt", 3));
    }

    #[test]
    fn second_set_replaces_first() {
        let mut table = BreakpointTable::new();
        table.set(Breakpoint::new("a.lt", 3).with_condition("x > 1"));
        let old = table.set(Breakpoint::new("a.lt", 3));
        assert_eq!(old.and_then(|bp| bp.condition), Some("x > 1".into()));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("a.lt", 3).and_then(|bp| bp.condition.clone()), None);
    }

    #[test]
    fn hit_count_stops_on_nth_hit() {
        let mut table = BreakpointTable::new();
        table.set(Breakpoint::new("a.lt", 5).with_hit_count(3));
        let hits: Vec<bool> = (0..4).map(|_| hit(&mut table, "a.lt", 5)).collect();
        assert_eq!(hits, vec![false, false, true, true]);
    }

    #[test]
    fn temporary_breakpoint_stops_once() {
        let mut table = BreakpointTable::new();
        table.set(Breakpoint::new("a.lt", 5).temporary());
        assert!(hit(&mut table, "a.lt", 5));
        assert!(!hit(&mut table, "a.lt", 5));
        assert!(table.is_empty());
    }

    #[test]
    fn false_condition_does_not_consume_hit_count() {
        let mut table = BreakpointTable::new();
        table.set(
            Breakpoint::new("a.lt", 2)
                .with_condition("i % 2 == 0")
                .with_hit_count(2),
        );
        let mut stops = Vec::new();
        for i in 0..6 {
            let mut locals = Locals::new();
            locals.insert("i".into(), Value::Int(i));
            if table.should_stop("a.lt", 2, &locals, &mut Vec::new()) {
                stops.push(i);
            }
        }
        assert_eq!(stops, vec![2, 4]);
    }

    #[test]
    fn failing_condition_fails_open_with_log() {
        let mut table = BreakpointTable::new();
        table.set(Breakpoint::new("a.lt", 2).with_condition("missing > 1"));
        let mut logs = Vec::new();
        assert!(table.should_stop("a.lt", 2, &Locals::new(), &mut logs));
        assert_eq!(logs.len(), 1);
        assert!(logs[0].message.contains("undefined variable 'missing'"));
        assert!(table.needs_locals("a.lt", 2));
    }

    #[test]
    fn clear_file_only_touches_that_file() {
        let mut table = BreakpointTable::new();
        table.set(Breakpoint::new("a.lt", 1));
        table.set(Breakpoint::new("a.lt", 2));
        table.set(Breakpoint::new("b.lt", 1));
        assert_eq!(table.clear_file("a.lt"), 2);
        let left: Vec<_> = table.iter().map(|bp| bp.file.clone()).collect();
        assert_eq!(left, vec![SmolStr::new("b.lt")]);
        table.clear_all();
        assert!(table.is_empty());
    }
}
