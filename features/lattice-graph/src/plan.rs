//! Field planning for a validated graph.
//!
//! Decides which bindings are materialized as fields of the generated graph and in which
//! order those fields are initialized, so that no initializer references a field that does
//! not exist yet.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    sync::Arc,
};

use petgraph::{
    graph::{DiGraph, NodeIndex},
    Direction,
};
use serde::Serialize;

use crate::{
    binding::Binding,
    errors::BindingGraphError,
    graph::{BindingGraph, Root},
    types::TypeKey,
};

/// A binding materialized as a field of the generated graph
#[derive(Debug, Clone)]
pub struct PlannedField {
    pub type_key: TypeKey,
    pub binding: Arc<Binding>,
    pub field_name: String,
    /// Created as an empty delegate first and patched after every other field
    pub is_deferred: bool,
}

/// Fields in initialization order
#[derive(Debug, Clone, Default)]
pub struct BindingPlan {
    pub fields: Vec<PlannedField>,
    pub deferred: BTreeSet<TypeKey>,
    pub use_counts: BTreeMap<TypeKey, usize>,
}

impl BindingPlan {
    pub fn field(&self, type_key: &TypeKey) -> Option<&PlannedField> {
        self.fields.iter().find(|field| &field.type_key == type_key)
    }

    pub fn field_name(&self, type_key: &TypeKey) -> Option<&str> {
        self.field(type_key).map(|field| field.field_name.as_str())
    }

    pub fn report(&self) -> PlanReport {
        PlanReport {
            fields: self
                .fields
                .iter()
                .map(|field| FieldReport {
                    key: field.type_key.to_string(),
                    field: field.field_name.clone(),
                    kind: field.binding.kind_name(),
                    scope: field.binding.scope().map(ToString::to_string),
                    deferred: field.is_deferred,
                    uses: self.use_counts.get(&field.type_key).copied().unwrap_or_default(),
                })
                .collect(),
            inlined: self
                .use_counts
                .keys()
                .filter(|key| self.field(key).is_none())
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Serializable view of a [`BindingPlan`]
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub fields: Vec<FieldReport>,
    pub inlined: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldReport {
    pub key: String,
    pub field: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub deferred: bool,
    pub uses: usize,
}

/// Walks a validated [`BindingGraph`] from its roots and plans its fields
pub struct BindingPlanner<'g, 'a> {
    graph: &'g BindingGraph<'a>,
    deferred: &'g BTreeSet<TypeKey>,
    use_counts: BTreeMap<TypeKey, usize>,
    nodes: BTreeMap<TypeKey, Arc<Binding>>,
    edges: BTreeMap<TypeKey, BTreeSet<TypeKey>>,
}

impl<'g, 'a> BindingPlanner<'g, 'a> {
    pub fn new(graph: &'g BindingGraph<'a>, deferred: &'g BTreeSet<TypeKey>) -> Self {
        Self {
            graph,
            deferred,
            use_counts: BTreeMap::new(),
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
        }
    }

    pub fn plan(mut self, roots: &[Root]) -> Result<BindingPlan, BindingGraphError> {
        for root in roots {
            if let Some(binding) = self.graph.find_binding(root.contextual_key.type_key()) {
                self.reference(binding.type_key().clone(), binding.clone());
            }
        }

        let field_keys: BTreeSet<TypeKey> = self
            .nodes
            .iter()
            .filter(|(key, binding)| self.needs_field(key, binding))
            .map(|(key, _)| key.clone())
            .collect();

        let order = self.initialization_order(&field_keys)?;

        let mut taken = HashSet::new();
        let mut fields = Vec::with_capacity(order.len());
        for type_key in order {
            let Some(binding) = self.nodes.get(&type_key) else {
                continue;
            };
            let field_name = unique_name(&mut taken, &field_base(&binding.name_hint()));
            fields.push(PlannedField {
                is_deferred: self.deferred.contains(&type_key),
                binding: binding.clone(),
                type_key,
                field_name,
            });
        }

        tracing::debug!(
            graph = %self.graph.graph(),
            fields = fields.len(),
            inlined = self.nodes.len() - fields.len(),
            deferred = self.deferred.len(),
            "Planned binding fields"
        );

        Ok(BindingPlan {
            fields,
            deferred: self.deferred.clone(),
            use_counts: self.use_counts,
        })
    }

    /// Counts one use of `key` and walks its dependencies on the first use
    fn reference(&mut self, key: TypeKey, binding: Arc<Binding>) {
        let count = self.use_counts.entry(key.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            return;
        }

        let mut children = Vec::new();
        match binding.as_ref() {
            Binding::Multibinding(multibinding) => {
                for source in &multibinding.sources {
                    children.push((
                        source.contribution_key(),
                        Arc::new(Binding::Provided(source.clone())),
                    ));
                }
            }
            other => {
                for site in other.dependency_sites() {
                    if let Some(dependency) = self.graph.find_binding(site.contextual_key.type_key()) {
                        children.push((dependency.type_key().clone(), dependency.clone()));
                    }
                }
            }
        }

        self.edges
            .insert(key.clone(), children.iter().map(|(key, _)| key.clone()).collect());
        self.nodes.insert(key, binding);
        for (child, binding) in children {
            self.reference(child, binding);
        }
    }

    fn needs_field(&self, key: &TypeKey, binding: &Binding) -> bool {
        match binding {
            Binding::Absent(_) => false,
            _ if self.deferred.contains(key) => true,
            Binding::Multibinding(_) | Binding::Assisted(_) => false,
            _ if binding.always_needs_field() => true,
            _ => self.use_counts.get(key).copied().unwrap_or_default() > 1,
        }
    }

    /// Field dependencies of `key`, looking through inlined bindings
    fn field_dependencies(&self, key: &TypeKey, field_keys: &BTreeSet<TypeKey>) -> BTreeSet<TypeKey> {
        let mut found = BTreeSet::new();
        let mut seen = HashSet::new();
        let mut pending: Vec<TypeKey> = self
            .edges
            .get(key)
            .map(|edges| edges.iter().cloned().collect())
            .unwrap_or_default();

        while let Some(next) = pending.pop() {
            if !seen.insert(next.clone()) {
                continue;
            }
            if field_keys.contains(&next) {
                found.insert(next);
            } else if let Some(edges) = self.edges.get(&next) {
                pending.extend(edges.iter().cloned());
            }
        }
        found
    }

    /// Kahn's algorithm over the field graph, ties broken by key order.
    ///
    /// Deferred fields exist as delegates from the start, so nothing waits for them.
    fn initialization_order(&self, field_keys: &BTreeSet<TypeKey>) -> Result<Vec<TypeKey>, BindingGraphError> {
        let mut dag = DiGraph::<TypeKey, ()>::new();
        let indices: BTreeMap<TypeKey, NodeIndex> = field_keys
            .iter()
            .map(|key| (key.clone(), dag.add_node(key.clone())))
            .collect();

        for (key, &dependent) in &indices {
            for dependency in self.field_dependencies(key, field_keys) {
                if self.deferred.contains(&dependency) {
                    continue;
                }
                if let Some(&dependency) = indices.get(&dependency) {
                    dag.update_edge(dependency, dependent, ());
                }
            }
        }

        let mut in_degree: HashMap<NodeIndex, usize> = dag
            .node_indices()
            .map(|index| (index, dag.neighbors_directed(index, Direction::Incoming).count()))
            .collect();
        let mut ready: BTreeSet<(TypeKey, NodeIndex)> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(&index, _)| (dag[index].clone(), index))
            .collect();

        let mut order = Vec::with_capacity(indices.len());
        while let Some((key, index)) = ready.pop_first() {
            order.push(key);
            for dependent in dag.neighbors_directed(index, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert((dag[dependent].clone(), dependent));
                    }
                }
            }
        }

        if order.len() != indices.len() {
            let sorted: HashSet<_> = order.iter().collect();
            let trace = field_keys
                .iter()
                .filter(|key| !sorted.contains(key))
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" --> ");
            return Err(BindingGraphError::DependencyCycle {
                trace,
                stack: String::new(),
            });
        }
        Ok(order)
    }
}

fn field_base(name_hint: &str) -> String {
    match name_hint.strip_suffix("Provider") {
        Some(stem) if !stem.is_empty() => name_hint.to_string(),
        _ => format!("{name_hint}Provider"),
    }
}

fn unique_name(taken: &mut HashSet<String>, base: &str) -> String {
    if taken.insert(base.to_string()) {
        return base.to_string();
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{base}{suffix}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        declarations::{CallableId, FunctionDecl, InjectableClass, ParameterDecl},
        source::DeclarationIndex,
        stack::BindingStackEntry,
        types::{Annotation, ClassId, ContextualTypeKey, Symbols, TypeRef},
    };
    use pretty_assertions::assert_eq;

    fn injectable(name: &str, dependencies: &[(&str, TypeRef)]) -> InjectableClass {
        let mut constructor = FunctionDecl::constructor(name);
        for (parameter, ty) in dependencies {
            constructor = constructor.with_parameter(ParameterDecl::new(*parameter, ty.clone()));
        }
        InjectableClass::new(constructor)
    }

    fn root(name: &str) -> Root {
        let contextual_key = ContextualTypeKey::plain(TypeKey::plain(TypeRef::of(name)));
        Root {
            entry: BindingStackEntry::requested_at(
                contextual_key.clone(),
                &CallableId::new("app.AppGraph", "get"),
            ),
            contextual_key,
        }
    }

    fn plan(index: &DeclarationIndex, roots: &[Root], scopes: &BTreeSet<Annotation>) -> BindingPlan {
        let symbols = Symbols::default();
        let mut graph = BindingGraph::new(ClassId::new("app.AppGraph"), index, &symbols);
        let validation = graph.validate_roots(roots, scopes).unwrap();
        BindingPlanner::new(&graph, &validation.deferred_types)
            .plan(roots)
            .unwrap()
    }

    fn field_keys(plan: &BindingPlan) -> Vec<String> {
        plan.fields.iter().map(|field| field.type_key.to_string()).collect()
    }

    #[test]
    fn test_scoped_chain_is_initialized_dependencies_first() {
        let scope = Annotation::new("app.AppScope");
        let index = DeclarationIndex::new()
            .with_injectable(injectable("app.A", &[("b", TypeRef::of("app.B"))]).scoped(scope.clone()))
            .with_injectable(injectable("app.B", &[("c", TypeRef::of("app.C"))]).scoped(scope.clone()))
            .with_injectable(injectable("app.C", &[]).scoped(scope.clone()));

        let plan = plan(&index, &[root("app.A")], &BTreeSet::from([scope]));

        assert_eq!(field_keys(&plan), vec!["app.C", "app.B", "app.A"]);
        assert_eq!(plan.field_name(&TypeKey::plain(TypeRef::of("app.B"))), Some("bProvider"));
    }

    #[test]
    fn test_unscoped_bindings_used_once_are_inlined() {
        let index = DeclarationIndex::new()
            .with_injectable(injectable(
                "app.A",
                &[("b", TypeRef::of("app.B")), ("c", TypeRef::of("app.C"))],
            ))
            .with_injectable(injectable("app.B", &[("d", TypeRef::of("app.D"))]))
            .with_injectable(injectable("app.C", &[("d", TypeRef::of("app.D"))]))
            .with_injectable(injectable("app.D", &[]));

        let plan = plan(&index, &[root("app.A")], &BTreeSet::new());

        assert_eq!(field_keys(&plan), vec!["app.D"]);
        let report = plan.report();
        assert_eq!(report.inlined, vec!["app.A", "app.B", "app.C"]);
        assert_eq!(report.fields[0].uses, 2);
        assert_eq!(report.fields[0].field, "dProvider");
    }

    #[test]
    fn test_deferred_binding_gets_a_field() {
        let symbols = Symbols::default();
        let index = DeclarationIndex::new().with_injectable(injectable(
            "app.A",
            &[("a", symbols.provider_of(TypeRef::of("app.A")))],
        ));

        let plan = plan(&index, &[root("app.A")], &BTreeSet::new());

        assert_eq!(field_keys(&plan), vec!["app.A"]);
        assert!(plan.fields[0].is_deferred);
        assert!(plan.deferred.contains(&TypeKey::plain(TypeRef::of("app.A"))));
    }

    #[test]
    fn test_fields_wait_for_their_field_dependencies() {
        let scope = Annotation::new("app.AppScope");
        // B is inlined into A, so A has to wait for Z
        let index = DeclarationIndex::new()
            .with_injectable(injectable("app.A", &[("b", TypeRef::of("app.B"))]).scoped(scope.clone()))
            .with_injectable(injectable("app.B", &[("z", TypeRef::of("app.Z"))]))
            .with_injectable(injectable("app.Z", &[]).scoped(scope.clone()));

        let plan = plan(&index, &[root("app.A")], &BTreeSet::from([scope]));

        assert_eq!(field_keys(&plan), vec!["app.Z", "app.A"]);
    }

    #[test]
    fn test_unique_name() {
        let mut taken = HashSet::new();
        assert_eq!(unique_name(&mut taken, "fooProvider"), "fooProvider");
        assert_eq!(unique_name(&mut taken, "fooProvider"), "fooProvider2");
        assert_eq!(unique_name(&mut taken, "fooProvider"), "fooProvider3");
    }

    #[test]
    fn test_field_base_does_not_repeat_provider() {
        assert_eq!(field_base("api"), "apiProvider");
        assert_eq!(field_base("parentGraphApiProvider"), "parentGraphApiProvider");
        assert_eq!(field_base("provider"), "providerProvider");
    }
}
