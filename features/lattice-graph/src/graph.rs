use std::{
    collections::{btree_map::Entry, BTreeMap, BTreeSet, HashSet, VecDeque},
    sync::Arc,
};

use crate::{
    binding::{
        AssistedBinding, Binding, ConstructorInjectedBinding, DependencySite,
        MembersInjectedBinding, MultibindingBinding, MultibindingKind, ProvidedBinding,
    },
    declarations::{
        AssistedFactoryDecl, DeclarationOrigin, FunctionDecl, InjectableClass,
        MultibindingContribution,
    },
    errors::{BindingGraphError, LatticeErrors, StructuralError},
    node::DependencyGraphNode,
    parameters::{single_qualifier, Parameter, Parameters},
    source::BindingCandidates,
    stack::{BindingStack, BindingStackEntry},
    types::{Annotation, ClassId, ContextualTypeKey, Symbols, TypeKey, TypeRef},
};

/// Where validation starts walking: the graph, its accessors and its injectors
#[derive(Debug, Clone)]
pub struct Root {
    pub contextual_key: ContextualTypeKey,
    pub entry: BindingStackEntry,
}

/// Whether the dependencies of a registered binding have been resolved yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyState {
    /// Registered, dependencies not looked at
    Pending,
    /// Every dependency has a binding, or is reported missing
    Resolved(BTreeSet<TypeKey>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    /// Keys on a cycle broken by a Provider or Lazy, initialized through a delegate
    pub deferred_types: BTreeSet<TypeKey>,
}

/// State of one validation run
#[derive(Default)]
struct Walk {
    visited: HashSet<TypeKey>,
    deferred: BTreeSet<TypeKey>,
    reported_missing: HashSet<TypeKey>,
    errors: Vec<BindingGraphError>,
}

impl Walk {
    fn report(&mut self, error: BindingGraphError, key: &TypeKey) {
        if matches!(error, BindingGraphError::MissingBinding { .. })
            && !self.reported_missing.insert(key.clone())
        {
            return;
        }
        self.errors.push(error);
    }
}

/// Binding registry of a single graph declaration.
///
/// Bindings are registered first without looking at their dependencies. Validation then walks
/// from the roots, creating constructor injected and assisted bindings on demand.
pub struct BindingGraph<'a> {
    graph: ClassId,
    candidates: &'a dyn BindingCandidates,
    symbols: &'a Symbols,
    bindings: BTreeMap<TypeKey, Arc<Binding>>,
    /// `Map<K, Provider<V>>` keys resolving to their `Map<K, V>` multibinding
    multibinding_aliases: BTreeMap<TypeKey, TypeKey>,
    dependencies: BTreeMap<TypeKey, DependencyState>,
    deferred_types: BTreeSet<TypeKey>,
}

impl<'a> BindingGraph<'a> {
    pub fn new(graph: ClassId, candidates: &'a dyn BindingCandidates, symbols: &'a Symbols) -> Self {
        Self {
            graph,
            candidates,
            symbols,
            bindings: BTreeMap::new(),
            multibinding_aliases: BTreeMap::new(),
            dependencies: BTreeMap::new(),
            deferred_types: BTreeSet::new(),
        }
    }

    pub fn graph(&self) -> &ClassId {
        &self.graph
    }

    pub fn symbols(&self) -> &'a Symbols {
        self.symbols
    }

    /// A fresh stack for this graph
    pub fn stack(&self) -> BindingStack {
        BindingStack::new(self.graph.clone())
    }

    /// Registers `binding` under `key` without resolving its dependencies.
    ///
    /// [`Binding::Absent`] is never stored.
    pub fn add_binding(
        &mut self,
        key: TypeKey,
        binding: impl Into<Arc<Binding>>,
        stack: &BindingStack,
    ) -> Result<(), BindingGraphError> {
        let binding = binding.into();
        if matches!(*binding, Binding::Absent(_)) {
            return Ok(());
        }

        if let Some(multibinding) = self
            .multibinding_aliases
            .get(&key)
            .and_then(|target| self.bindings.get(target))
        {
            return Err(BindingGraphError::DuplicateBinding {
                key: binding.type_key().clone(),
                reason: format!("{binding} and the provider view of {multibinding}"),
                stack: stack.render(false),
            });
        }

        match self.bindings.entry(key) {
            Entry::Occupied(existing) => {
                let existing = existing.get();
                let reason = if Arc::ptr_eq(existing, &binding) {
                    format!("The identical binding was added twice: {binding}")
                } else if existing == &binding {
                    format!("Bindings are equal: {binding}")
                } else {
                    format!("{existing} and {binding}")
                };
                Err(BindingGraphError::DuplicateBinding {
                    key: binding.type_key().clone(),
                    reason,
                    stack: stack.render(false),
                })
            }
            Entry::Vacant(vacant) => {
                tracing::trace!(key = %vacant.key(), kind = binding.kind_name(), "Adding binding");
                self.dependencies
                    .insert(vacant.key().clone(), DependencyState::Pending);
                vacant.insert(binding);
                Ok(())
            }
        }
    }

    /// Whether `key` has a registered binding, including multibinding aliases
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.find_binding(key).is_some()
    }

    pub fn find_binding(&self, key: &TypeKey) -> Option<&Arc<Binding>> {
        self.bindings.get(key).or_else(|| {
            self.multibinding_aliases
                .get(key)
                .and_then(|target| self.bindings.get(target))
        })
    }

    /// Registered bindings ordered by key
    pub fn bindings(&self) -> impl Iterator<Item = (&TypeKey, &Arc<Binding>)> {
        self.bindings.iter()
    }

    pub fn deferred_types(&self) -> &BTreeSet<TypeKey> {
        &self.deferred_types
    }

    /// Returns the binding of `contextual_key`, creating it if it can be created on demand.
    ///
    /// `stack` must already contain the entry for this request.
    pub fn get_or_create_binding(
        &mut self,
        contextual_key: &ContextualTypeKey,
        stack: &BindingStack,
    ) -> Result<Arc<Binding>, BindingGraphError> {
        let key = contextual_key.type_key();
        if let Some(existing) = self.find_binding(key) {
            return Ok(existing.clone());
        }

        let candidates = self.candidates;
        let class_id = &key.ty().class_id;
        if key.qualifier().is_none() {
            if let Some(class) = candidates.injectable_class(class_id) {
                let binding = Arc::new(Binding::ConstructorInjected(
                    self.constructor_injected(class, key)?,
                ));
                self.add_binding(key.clone(), binding.clone(), stack)?;
                return Ok(binding);
            }

            if let Some(factory) = candidates.assisted_factory(class_id) {
                let binding = Arc::new(Binding::Assisted(self.assisted(factory, key, stack)?));
                self.add_binding(key.clone(), binding.clone(), stack)?;
                return Ok(binding);
            }

            if *class_id == self.symbols.members_injector {
                if let Some(binding) = self.members_injector(key)? {
                    let binding = Arc::new(binding);
                    self.add_binding(key.clone(), binding.clone(), stack)?;
                    return Ok(binding);
                }
            }
        }

        if contextual_key.has_default() {
            return Ok(Arc::new(Binding::Absent(key.clone())));
        }

        Err(BindingGraphError::MissingBinding {
            key: contextual_key.render(false),
            stack: stack.render(false),
        })
    }

    fn constructor_injected(
        &self,
        class: &InjectableClass,
        key: &TypeKey,
    ) -> Result<ConstructorInjectedBinding, BindingGraphError> {
        if class.scopes.len() > 1 {
            return Err(StructuralError::MultipleScopes {
                class: class.class_id.clone(),
                scopes: render_annotations(&class.scopes),
            }
            .into());
        }
        if class.origin == (DeclarationOrigin::External { has_generated_factory: false }) {
            return Err(StructuralError::MissingUpstreamFactory {
                class: class.class_id.clone(),
            }
            .into());
        }

        let constructor = Parameters::for_function(&class.constructor, None, self.symbols)?;
        let members = Parameters::for_members(&class.injected_members, self.symbols)?;

        Ok(ConstructorInjectedBinding {
            type_key: key.clone(),
            class_id: class.class_id.clone(),
            constructor: class.constructor.callable_id.clone(),
            is_assisted: class.is_assisted(),
            parameters: constructor.merge_with(&members),
            scope: class.scopes.first().cloned(),
            origin: class.origin,
            has_injected_members: !class.injected_members.is_empty(),
        })
    }

    fn assisted(
        &mut self,
        factory: &AssistedFactoryDecl,
        key: &TypeKey,
        stack: &BindingStack,
    ) -> Result<AssistedBinding, BindingGraphError> {
        let [function] = factory.functions.as_slice() else {
            return Err(StructuralError::AssistedFactoryWithoutSingleFunction {
                factory: factory.class_id.clone(),
                count: factory.functions.len(),
            }
            .into());
        };

        let target_type = &function.return_type;
        let target_class = self
            .candidates
            .injectable_class(&target_type.class_id)
            .filter(|class| class.is_assisted())
            .ok_or_else(|| StructuralError::AssistedTargetNotInjectable {
                factory: factory.class_id.clone(),
                target: target_type.render(false),
            })?;

        let target_key = TypeKey::plain(target_type.clone());
        let target = match self.find_binding(&target_key).map(|binding| binding.as_ref()) {
            Some(Binding::ConstructorInjected(target)) => target.clone(),
            _ => {
                let target = self.constructor_injected(target_class, &target_key)?;
                let entry = BindingStackEntry::injected_at(
                    ContextualTypeKey::plain(target_key.clone()),
                    &function.callable_id,
                    None,
                );
                self.add_binding(
                    target_key,
                    Binding::ConstructorInjected(target.clone()),
                    &stack.push(entry),
                )?;
                target
            }
        };

        let parameters = Parameters::for_function(function, None, self.symbols)?;
        let expected = assisted_signature(target.parameters.assisted_parameters());
        let actual = assisted_signature(parameters.non_instance_parameters());
        if expected != actual {
            return Err(StructuralError::AssistedParametersMismatch {
                factory: factory.class_id.clone(),
                target: target.type_key.to_string(),
                expected: expected.iter().map(render_signature).collect::<Vec<_>>().join(", "),
                actual: actual.iter().map(render_signature).collect::<Vec<_>>().join(", "),
            }
            .into());
        }

        Ok(AssistedBinding {
            type_key: key.clone(),
            factory: factory.class_id.clone(),
            function: function.clone(),
            target,
            parameters,
        })
    }

    fn members_injector(&self, key: &TypeKey) -> Result<Option<Binding>, BindingGraphError> {
        let Some(target) = key.ty().argument(0) else {
            return Ok(None);
        };
        let Some(members) = self.candidates.injected_members(&target.class_id) else {
            return Ok(None);
        };
        Ok(Some(Binding::MembersInjected(MembersInjectedBinding {
            type_key: key.clone(),
            target: target.class_id.clone(),
            parameters: Parameters::for_members(members, self.symbols)?,
            is_from_injector_function: false,
            injector: None,
        })))
    }

    /// Returns the multibinding of `type_key`, creating it if needed.
    ///
    /// A Map multibinding also becomes reachable as `Map<K, Provider<V>>`.
    pub fn get_or_create_multibinding(
        &mut self,
        type_key: &TypeKey,
        kind: MultibindingKind,
    ) -> Result<&mut MultibindingBinding, BindingGraphError> {
        if kind == MultibindingKind::Map && !self.bindings.contains_key(type_key) {
            if let Some(mirror) = provider_map_key(type_key, self.symbols) {
                if let Some(existing) = self.bindings.get(&mirror) {
                    return Err(BindingGraphError::DuplicateBinding {
                        key: mirror,
                        reason: format!("{existing} and the provider view of multibinding {type_key}"),
                        stack: String::new(),
                    });
                }
                self.multibinding_aliases.insert(mirror, type_key.clone());
            }
        }

        let entry = match self.bindings.entry(type_key.clone()) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                self.dependencies
                    .insert(type_key.clone(), DependencyState::Pending);
                vacant.insert(Arc::new(Binding::Multibinding(MultibindingBinding {
                    type_key: type_key.clone(),
                    kind,
                    sources: BTreeSet::new(),
                    is_declared: false,
                })))
            }
        };

        match Arc::make_mut(entry) {
            Binding::Multibinding(multibinding) => Ok(multibinding),
            other => Err(BindingGraphError::DuplicateBinding {
                key: type_key.clone(),
                reason: format!("{other} is not a multibinding"),
                stack: String::new(),
            }),
        }
    }

    /// Adds a `@IntoSet`, `@ElementsIntoSet` or `@IntoMap` contribution to its multibinding
    pub fn add_multibinding_contribution(
        &mut self,
        source: ProvidedBinding,
    ) -> Result<(), BindingGraphError> {
        let (key, kind) = self.multibinding_key(&source)?;
        let multibinding = self.get_or_create_multibinding(&key, kind)?;

        if let Some(map_key) = &source.map_key {
            let duplicates: Vec<_> = multibinding
                .sources
                .iter()
                .filter(|existing| {
                    existing.map_key.as_ref().map(|k| &k.value) == Some(&map_key.value)
                })
                .map(|existing| existing.provider.to_string())
                .collect();
            if !duplicates.is_empty() {
                return Err(StructuralError::DuplicateMapKey {
                    key,
                    map_key: map_key.value.clone(),
                    sites: duplicates
                        .into_iter()
                        .chain(std::iter::once(source.provider.to_string()))
                        .collect::<Vec<_>>()
                        .join(", "),
                }
                .into());
            }
        }

        tracing::trace!(multibinding = %key, source = %source.provider, "Adding contribution");
        multibinding.sources.insert(source);
        Ok(())
    }

    /// Registers a `@Multibinds` declaration, the multibinding may then be empty
    pub fn declare_multibinding(&mut self, function: &FunctionDecl) -> Result<(), BindingGraphError> {
        let site = function.callable_id.to_string();
        let qualifier = single_qualifier(&function.qualifiers, &site)?;
        let ty = &function.return_type;
        let kind = if ty.class_id == self.symbols.set && ty.arguments.len() == 1 {
            MultibindingKind::Set
        } else if ty.class_id == self.symbols.map && ty.arguments.len() == 2 {
            MultibindingKind::Map
        } else {
            return Err(StructuralError::InvalidMultibindingType {
                function: site,
                ty: ty.render(false),
                reason: "@Multibinds, it must return a Set or a Map".to_string(),
            }
            .into());
        };

        let key = TypeKey::new(ty.clone(), qualifier);
        self.get_or_create_multibinding(&key, kind)?.is_declared = true;
        Ok(())
    }

    fn multibinding_key(
        &self,
        source: &ProvidedBinding,
    ) -> Result<(TypeKey, MultibindingKind), BindingGraphError> {
        let element = source.type_key.ty().clone();
        let qualifier = source.type_key.qualifier().cloned();
        match source.contribution {
            Some(MultibindingContribution::IntoSet) | None => Ok((
                TypeKey::new(self.symbols.set_of(element), qualifier),
                MultibindingKind::Set,
            )),
            Some(MultibindingContribution::ElementsIntoSet) => {
                if element.class_id == self.symbols.set && element.arguments.len() == 1 {
                    Ok((source.type_key.clone(), MultibindingKind::Set))
                } else {
                    Err(StructuralError::InvalidMultibindingType {
                        function: source.provider.to_string(),
                        ty: element.render(false),
                        reason: "@ElementsIntoSet, it must return a Set".to_string(),
                    }
                    .into())
                }
            }
            Some(MultibindingContribution::IntoMap) => {
                let map_key = source.map_key.as_ref().ok_or_else(|| {
                    StructuralError::MissingMapKey {
                        function: source.provider.to_string(),
                    }
                })?;
                Ok((
                    TypeKey::new(
                        self.symbols.map_of(map_key.key_type.clone(), element),
                        qualifier,
                    ),
                    MultibindingKind::Map,
                ))
            }
        }
    }

    /// Whether `from` transitively depends on `to`
    pub fn depends_on(&self, from: &TypeKey, to: &TypeKey) -> bool {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([from.clone()]);
        while let Some(key) = queue.pop_front() {
            let Some(binding) = self.find_binding(&key) else {
                continue;
            };
            for dependency in binding.dependencies() {
                if &dependency == to {
                    return true;
                }
                if seen.insert(dependency.clone()) {
                    queue.push_back(dependency);
                }
            }
        }
        false
    }

    /// Dependencies of `key`, creating bindings for them on demand the first time
    pub fn resolved_dependencies(&mut self, key: &TypeKey) -> Result<BTreeSet<TypeKey>, LatticeErrors> {
        let mut walk = Walk::default();
        let resolved = self.resolve_state(key, &mut walk);
        if walk.errors.is_empty() {
            Ok(resolved)
        } else {
            Err(LatticeErrors {
                errors: walk.errors,
            })
        }
    }

    fn resolve_state(&mut self, key: &TypeKey, walk: &mut Walk) -> BTreeSet<TypeKey> {
        if let Some(DependencyState::Resolved(resolved)) = self.dependencies.get(key) {
            return resolved.clone();
        }
        let Some(binding) = self.find_binding(key).cloned() else {
            self.dependencies
                .insert(key.clone(), DependencyState::Resolved(BTreeSet::new()));
            return BTreeSet::new();
        };

        let stack = self
            .stack()
            .push(BindingStackEntry::simple(binding.contextual_type_key()));
        for site in binding.dependency_sites() {
            let dependency = site.contextual_key.type_key().clone();
            if let Err(error) = self.get_or_create_binding(&site.contextual_key, &stack.push(site.entry)) {
                walk.report(error, &dependency);
            }
        }

        let resolved = binding.dependencies();
        self.dependencies
            .insert(key.clone(), DependencyState::Resolved(resolved.clone()));
        resolved
    }

    /// Validates the graph reachable from `node`'s roots
    pub fn validate(&mut self, node: &DependencyGraphNode) -> Result<ValidationResult, LatticeErrors> {
        self.validate_roots(&node.roots(), &node.scopes)
    }

    /// Walks every root looking for cycles, scope mismatches and missing bindings.
    ///
    /// Returns all issues found, not just the first one.
    pub fn validate_roots(
        &mut self,
        roots: &[Root],
        scopes: &BTreeSet<Annotation>,
    ) -> Result<ValidationResult, LatticeErrors> {
        let mut walk = Walk::default();

        let stack = self.stack();
        for root in roots {
            let site = DependencySite {
                contextual_key: root.contextual_key.clone(),
                entry: root.entry.clone(),
            };
            self.visit_edge(None, &site, &stack, scopes, &mut walk);
        }

        // Bindings registered but unreachable from any root still need their dependencies
        loop {
            let pending: Vec<_> = self
                .dependencies
                .iter()
                .filter(|(_, state)| **state == DependencyState::Pending)
                .map(|(key, _)| key.clone())
                .collect();
            if pending.is_empty() {
                break;
            }
            for key in pending {
                self.resolve_state(&key, &mut walk);
            }
        }

        if !walk.errors.is_empty() {
            tracing::debug!(graph = %self.graph, errors = walk.errors.len(), "Binding graph is invalid");
            return Err(LatticeErrors {
                errors: walk.errors,
            });
        }

        tracing::debug!(
            graph = %self.graph,
            bindings = self.bindings.len(),
            deferred = walk.deferred.len(),
            "Binding graph is valid"
        );
        self.deferred_types = walk.deferred.clone();
        Ok(ValidationResult {
            deferred_types: walk.deferred,
        })
    }

    fn visit_edge(
        &mut self,
        consumer: Option<&Binding>,
        site: &DependencySite,
        parent: &BindingStack,
        scopes: &BTreeSet<Annotation>,
        walk: &mut Walk,
    ) {
        let key = site.contextual_key.type_key();

        // Circular Dependency Check
        if parent.contains(key) {
            self.on_cycle(site, parent, walk);
            return;
        }

        let stack = parent.push(site.entry.clone());
        let binding = match self.get_or_create_binding(&site.contextual_key, &stack) {
            Ok(binding) => binding,
            Err(error) => {
                walk.report(error, key);
                return;
            }
        };

        if let Binding::ConstructorInjected(target) = binding.as_ref() {
            if target.is_assisted && !matches!(consumer, Some(Binding::Assisted(_))) {
                walk.errors.push(
                    StructuralError::AssistedInjectedRequestedDirectly {
                        key: key.clone(),
                        stack: stack.render(false),
                    }
                    .into(),
                );
                return;
            }
        }

        if matches!(*binding, Binding::Absent(_)) || !walk.visited.insert(key.clone()) {
            return;
        }

        tracing::trace!(key = %key, kind = binding.kind_name(), depth = stack.len(), "Visiting binding");
        self.check_scope(binding.as_ref(), key, &stack, scopes, walk);

        if let Binding::Multibinding(multibinding) = binding.as_ref() {
            for source in &multibinding.sources {
                let source_stack = stack.push(BindingStackEntry::provided_at(
                    ContextualTypeKey::plain(source.contribution_key()),
                    &source.provider,
                ));
                let source_binding = Binding::Provided(source.clone());
                self.check_scope(&source_binding, &source.contribution_key(), &source_stack, scopes, walk);
                for dependency in source_binding.dependency_sites() {
                    self.visit_edge(Some(&source_binding), &dependency, &source_stack, scopes, walk);
                }
            }
        } else {
            for dependency in binding.dependency_sites() {
                self.visit_edge(Some(binding.as_ref()), &dependency, &stack, scopes, walk);
            }
        }

        self.dependencies
            .insert(key.clone(), DependencyState::Resolved(binding.dependencies()));
    }

    /// A key already on the stack was requested again.
    ///
    /// When any edge of the loop goes through a Provider or Lazy the re-entered key is
    /// deferred, otherwise the loop is a hard error.
    fn on_cycle(&self, site: &DependencySite, parent: &BindingStack, walk: &mut Walk) {
        let key = site.contextual_key.type_key();
        let since = parent.entries_since(key);
        let inner_edges = &since[..since.len().saturating_sub(1)];
        let breakable = site.contextual_key.is_deferrable()
            || inner_edges
                .iter()
                .any(|entry| entry.contextual_key.is_deferrable());

        if breakable {
            tracing::trace!(key = %key, "Cycle broken by a deferrable request");
            walk.deferred.insert(key.clone());
            return;
        }

        let trace = since
            .iter()
            .chain(since.first())
            .map(|entry| entry.type_key().to_string())
            .collect::<Vec<_>>()
            .join(" --> ");
        walk.errors.push(BindingGraphError::DependencyCycle {
            trace,
            stack: parent.push(site.entry.clone()).render(false),
        });
    }

    fn check_scope(
        &self,
        binding: &Binding,
        key: &TypeKey,
        stack: &BindingStack,
        scopes: &BTreeSet<Annotation>,
        walk: &mut Walk,
    ) {
        let Some(scope) = binding.scope() else {
            return;
        };
        if scopes.contains(scope) {
            return;
        }
        walk.errors.push(BindingGraphError::IncompatiblyScopedBindings {
            graph: self.graph.clone(),
            graph_scopes: if scopes.is_empty() {
                "unscoped".to_string()
            } else {
                render_annotations(scopes)
            },
            key: key.clone(),
            scope: scope.render(false),
            stack: stack.render(false),
        });
    }

    /// Every registered binding, one per line, followed by the multibinding aliases
    pub fn render_report(&self) -> String {
        let mut lines = Vec::new();
        for (key, binding) in &self.bindings {
            let mut line = format!("{key} = {}", binding.kind_name());
            if let Some(scope) = binding.scope() {
                line.push_str(&format!(" {scope}"));
            }
            if let Some(declaration) = binding.declaration() {
                line.push_str(&format!(" ({declaration})"));
            }
            if self.deferred_types.contains(key) {
                line.push_str(" [deferred]");
            }
            lines.push(line);
        }
        for (alias, target) in &self.multibinding_aliases {
            lines.push(format!("{alias} -> {target}"));
        }
        lines.join("\n")
    }
}

/// `Map<K, Provider<V>>` for a `Map<K, V>` key
fn provider_map_key(map_key: &TypeKey, symbols: &Symbols) -> Option<TypeKey> {
    let ty = map_key.ty();
    let (key, value) = (ty.argument(0)?, ty.argument(1)?);
    let mirror: TypeRef = symbols.map_of(key.clone(), symbols.provider_of(value.clone()));
    Some(TypeKey::new(mirror, map_key.qualifier().cloned()))
}

fn render_annotations<'a>(annotations: impl IntoIterator<Item = &'a Annotation>) -> String {
    annotations
        .into_iter()
        .map(|annotation| annotation.render(false))
        .collect::<Vec<_>>()
        .join(", ")
}

type AssistedSignature = BTreeSet<(TypeKey, String)>;

fn assisted_signature<'p>(
    parameters: impl Iterator<Item = &'p Parameter>,
) -> AssistedSignature {
    parameters
        .map(|parameter| {
            (
                parameter.contextual_key.type_key().clone(),
                parameter.assisted_identifier.clone(),
            )
        })
        .collect()
}

fn render_signature((key, identifier): &(TypeKey, String)) -> String {
    if identifier.is_empty() {
        key.to_string()
    } else {
        format!("@Assisted(\"{identifier}\") {key}")
    }
}
