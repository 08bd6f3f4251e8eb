//! Resolution path used for cycle detection and diagnostics.
//!
//! The stack is a persistent list: [`BindingStack::push`] returns a new stack sharing its tail
//! with the old one, so each recursive resolution step owns the exact path that led to it.

use std::{fmt, sync::Arc};

use crate::{
    declarations::CallableId,
    types::{ClassId, ContextualTypeKey, TypeKey},
};

/// One step of a resolution path, e.g. `Foo is injected at [AppGraph] Bar(…, foo)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingStackEntry {
    pub contextual_key: ContextualTypeKey,
    pub usage: Option<String>,
    pub context: Option<String>,
}

impl BindingStackEntry {
    /// An entry without usage or context
    pub fn simple(contextual_key: ContextualTypeKey) -> Self {
        Self {
            contextual_key,
            usage: None,
            context: None,
        }
    }

    /// Requested by an accessor or injector of the graph
    pub fn requested_at(contextual_key: ContextualTypeKey, accessor: &CallableId) -> Self {
        Self {
            contextual_key,
            usage: Some("is requested at".to_string()),
            context: Some(accessor.to_string()),
        }
    }

    /// Injected into a parameter of a constructor or function
    pub fn injected_at(
        contextual_key: ContextualTypeKey,
        function: &CallableId,
        parameter: Option<&str>,
    ) -> Self {
        let context = match parameter {
            Some(parameter) => format!("{function}(…, {parameter})"),
            None => function.to_string(),
        };
        Self {
            contextual_key,
            usage: Some("is injected at".to_string()),
            context: Some(context),
        }
    }

    /// Injected into a member of a class
    pub fn member_injected_at(contextual_key: ContextualTypeKey, member: &CallableId) -> Self {
        Self {
            contextual_key,
            usage: Some("is injected at".to_string()),
            context: Some(member.to_string()),
        }
    }

    /// Provided by a provider function
    pub fn provided_at(contextual_key: ContextualTypeKey, function: &CallableId) -> Self {
        Self {
            contextual_key,
            usage: Some("is provided at".to_string()),
            context: Some(function.to_string()),
        }
    }

    /// Bound by a creator parameter or a binds function
    pub fn bound_at(contextual_key: ContextualTypeKey, site: impl Into<String>) -> Self {
        Self {
            contextual_key,
            usage: Some("is bound at".to_string()),
            context: Some(site.into()),
        }
    }

    pub fn type_key(&self) -> &TypeKey {
        self.contextual_key.type_key()
    }

    pub fn render(&self, graph: &ClassId, short: bool) -> String {
        let mut rendered = self.contextual_key.render(short);
        if let Some(usage) = &self.usage {
            rendered.push(' ');
            rendered.push_str(usage);
        }
        if let Some(context) = &self.context {
            rendered.push_str(&format!("\n    [{graph}] {context}"));
        }
        rendered
    }
}

#[derive(Debug)]
struct Frame {
    entry: BindingStackEntry,
    parent: Option<Arc<Frame>>,
}

/// Immutable resolution path of one graph
#[derive(Debug, Clone)]
pub struct BindingStack {
    graph: ClassId,
    head: Option<Arc<Frame>>,
    depth: usize,
}

impl BindingStack {
    pub fn new(graph: ClassId) -> Self {
        Self {
            graph,
            head: None,
            depth: 0,
        }
    }

    pub fn graph(&self) -> &ClassId {
        &self.graph
    }

    /// A new stack with `entry` on top, `self` is left untouched
    #[must_use]
    pub fn push(&self, entry: BindingStackEntry) -> Self {
        Self {
            graph: self.graph.clone(),
            head: Some(Arc::new(Frame {
                entry,
                parent: self.head.clone(),
            })),
            depth: self.depth + 1,
        }
    }

    pub fn top(&self) -> Option<&BindingStackEntry> {
        self.head.as_deref().map(|frame| &frame.entry)
    }

    pub fn len(&self) -> usize {
        self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    /// Entries from the most recent to the oldest
    pub fn entries(&self) -> Entries<'_> {
        Entries {
            next: self.head.as_deref(),
        }
    }

    pub fn contains(&self, type_key: &TypeKey) -> bool {
        self.entries().any(|entry| entry.type_key() == type_key)
    }

    /// Entries from the most recent back to the oldest entry for `type_key`, inclusive.
    ///
    /// Empty when the key is not on the stack.
    pub fn entries_since(&self, type_key: &TypeKey) -> Vec<&BindingStackEntry> {
        let entries: Vec<_> = self.entries().collect();
        match entries
            .iter()
            .rposition(|entry| entry.type_key() == type_key)
        {
            Some(position) => entries[..=position].to_vec(),
            None => Vec::new(),
        }
    }

    /// Renders every entry indented by four spaces, most recent first
    pub fn render(&self, short: bool) -> String {
        self.render_limited(short, usize::MAX)
    }

    /// Like [`Self::render`] but stops after `limit` entries, ending with `...`
    pub fn render_limited(&self, short: bool, limit: usize) -> String {
        let mut lines = Vec::new();
        for entry in self.entries().take(limit) {
            for line in entry.render(&self.graph, short).lines() {
                lines.push(format!("    {line}"));
            }
        }
        if self.depth > limit {
            lines.push("    ...".to_string());
        }
        lines.join("\n")
    }
}
impl fmt::Display for BindingStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

pub struct Entries<'a> {
    next: Option<&'a Frame>,
}
impl<'a> Iterator for Entries<'a> {
    type Item = &'a BindingStackEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.next?;
        self.next = frame.parent.as_deref();
        Some(&frame.entry)
    }
}
