//! Variable scope for template expansion.
//! A stack of frames: the base frame holds user inputs merged with
//! defaults, and each `for_each` iteration pushes a frame binding a
//! single identifier. Lookup is innermost-first. The scope is a plain
//! value owned by the orchestrator, never process-wide state.

use indexmap::IndexMap;

#[derive(Debug, Clone)]
pub struct Scope {
    frames: Vec<IndexMap<String, String>>,
}

impl Scope {
    /// Creates a scope whose base frame is the given bindings.
    pub fn new(base: IndexMap<String, String>) -> Self {
        Self { frames: vec![base] }
    }

    /// Pushes a frame binding a single key. Paired with `pop_frame`
    /// around the body of a `for_each` iteration.
    pub fn push_frame(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let mut frame = IndexMap::new();
        frame.insert(key.into(), value.into());
        self.frames.push(frame);
    }

    pub fn pop_frame(&mut self) {
        debug_assert!(self.frames.len() > 1, "cannot pop the base frame");
        self.frames.pop();
    }

    /// Number of frames currently on the stack.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Innermost-first lookup.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).map(String::as_str))
    }

    /// Flattens the stack into a JSON object for the expander; inner
    /// frames shadow outer ones.
    pub fn to_context(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for frame in &self.frames {
            for (k, v) in frame {
                map.insert(k.clone(), serde_json::Value::String(v.clone()));
            }
        }
        serde_json::Value::Object(map)
    }
}
