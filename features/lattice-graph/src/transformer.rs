//! The compilation session: turns graph declarations into graph implementations.

use std::{fmt, fs, path::Path};

use lattice_config::{LatticeOptions, Severity};
use serde::Serialize;

use crate::{
    binding::{Binding, BoundInstanceBinding, GraphDependencyBinding, MembersInjectedBinding, ProvidedBinding},
    codegen::{BindingCodeGenerator, Expression, GeneratedArtifacts},
    declarations::{CallableId, ProviderDecl, Visibility},
    errors::{BindingGraphError, LatticeErrors, ReportError, StructuralError},
    graph::BindingGraph,
    node::{graph_instance_parameter, DependencyGraphNode, NodeCache},
    parameters::Parameters,
    plan::{BindingPlan, BindingPlanner, PlanReport},
    source::BindingCandidates,
    stack::BindingStackEntry,
    types::{ClassId, ContextualTypeKey, Symbols, TypeKey},
};

/// One step of the generated graph constructor, in execution order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Emission {
    /// Keeps a creator parameter as a property of the graph
    StoreParameter { name: String, key: String },
    /// Creates an empty delegate for a deferred field
    DeclareDelegate { field: String, key: String },
    InitializeField {
        field: String,
        key: String,
        initializer: Expression,
    },
    /// Sets the real provider of a deferred field once every other field exists
    PatchDelegate {
        field: String,
        key: String,
        initializer: Expression,
    },
}

impl fmt::Display for Emission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Emission::StoreParameter { name, key } => write!(f, "store {name}: {key}"),
            Emission::DeclareDelegate { field, key } => write!(f, "{field} = DelegateFactory<{key}>()"),
            Emission::InitializeField {
                field, initializer, ..
            } => write!(f, "{field} = {initializer}"),
            Emission::PatchDelegate {
                field, initializer, ..
            } => write!(f, "{field}.setDelegate({initializer})"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccessorImplementation {
    pub accessor: CallableId,
    pub contextual_key: ContextualTypeKey,
    pub body: Expression,
}

#[derive(Debug, Clone)]
pub struct InjectorImplementation {
    pub injector: CallableId,
    pub target: ClassId,
    pub body: Expression,
}

/// Everything needed to emit the implementation of one graph declaration
#[derive(Debug, Clone)]
pub struct GraphImplementation {
    pub graph: ClassId,
    pub emissions: Vec<Emission>,
    pub accessors: Vec<AccessorImplementation>,
    pub injectors: Vec<InjectorImplementation>,
    pub plan: BindingPlan,
}

/// Body of an abstract member of a graph that failed, it errors when called
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stub {
    pub member: CallableId,
    pub message: String,
}

#[derive(Debug)]
pub enum GraphOutcome {
    Generated(GraphImplementation),
    Failed {
        graph: ClassId,
        errors: LatticeErrors,
        stubs: Vec<Stub>,
    },
}

impl GraphOutcome {
    pub fn graph(&self) -> &ClassId {
        match self {
            GraphOutcome::Generated(implementation) => &implementation.graph,
            GraphOutcome::Failed { graph, .. } => graph,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, GraphOutcome::Generated(_))
    }
}

#[derive(Serialize)]
struct PlanDocument<'i> {
    graph: String,
    plan: PlanReport,
    emissions: &'i [Emission],
}

/// Owns the state shared by every graph of one compilation.
///
/// Nodes and generated factories are cached here, so a factory needed by two graphs is only
/// generated once.
pub struct DependencyGraphTransformer<'c> {
    candidates: &'c dyn BindingCandidates,
    options: LatticeOptions,
    symbols: Symbols,
    nodes: NodeCache,
    artifacts: GeneratedArtifacts,
}

impl<'c> DependencyGraphTransformer<'c> {
    pub fn new(candidates: &'c dyn BindingCandidates, options: LatticeOptions) -> Self {
        Self {
            candidates,
            symbols: Symbols::from_options(&options),
            options,
            nodes: NodeCache::new(),
            artifacts: GeneratedArtifacts::default(),
        }
    }

    pub fn options(&self) -> &LatticeOptions {
        &self.options
    }

    pub fn artifacts(&self) -> &GeneratedArtifacts {
        &self.artifacts
    }

    pub fn nodes(&self) -> &NodeCache {
        &self.nodes
    }

    /// Transforms every graph declaration independently.
    ///
    /// A failing graph does not stop the others, it yields stubs instead.
    pub fn transform_all(&mut self) -> Vec<GraphOutcome> {
        if !self.options.enabled {
            tracing::debug!("Lattice is disabled, skipping all graph declarations");
            return Vec::new();
        }

        let graphs: Vec<ClassId> = self
            .candidates
            .graph_declarations()
            .into_iter()
            .map(|declaration| declaration.class_id.clone())
            .collect();

        graphs
            .into_iter()
            .map(|class_id| match self.transform(&class_id) {
                Ok(implementation) => GraphOutcome::Generated(implementation),
                Err(errors) => {
                    tracing::error!(graph = %class_id, "{errors}");
                    GraphOutcome::Failed {
                        stubs: self.stubs(&class_id),
                        graph: class_id,
                        errors,
                    }
                }
            })
            .collect()
    }

    /// Builds, validates and plans the binding graph of `class_id`
    pub fn transform(&mut self, class_id: &ClassId) -> Result<GraphImplementation, LatticeErrors> {
        let span = tracing::info_span!("graph", graph = %class_id);
        let _entered = span.enter();

        let node = self
            .nodes
            .get_or_compute(class_id, self.candidates, &self.symbols)?;

        let mut graph = BindingGraph::new(class_id.clone(), self.candidates, &self.symbols);
        register_bindings(
            &mut graph,
            &node,
            self.candidates,
            self.options.public_provider_severity,
        )?;

        let validation = graph.validate(&node)?;
        if self.options.debug {
            tracing::debug!("Binding graph of {class_id}:\n{}", graph.render_report());
        }

        let plan = BindingPlanner::new(&graph, &validation.deferred_types).plan(&node.roots())?;

        let mut generator = BindingCodeGenerator::new(&graph, &plan, &mut self.artifacts);
        let mut emissions = Vec::new();
        if let Some(creator) = &node.creator {
            for parameter in &creator.parameters.value_parameters {
                emissions.push(Emission::StoreParameter {
                    name: parameter.name.clone(),
                    key: parameter.contextual_key.type_key().to_string(),
                });
            }
        }
        for field in plan.fields.iter().filter(|field| field.is_deferred) {
            emissions.push(Emission::DeclareDelegate {
                field: field.field_name.clone(),
                key: field.type_key.to_string(),
            });
        }
        for field in plan.fields.iter().filter(|field| !field.is_deferred) {
            emissions.push(Emission::InitializeField {
                field: field.field_name.clone(),
                key: field.type_key.to_string(),
                initializer: generator.field_initializer(field),
            });
        }
        for field in plan.fields.iter().filter(|field| field.is_deferred) {
            emissions.push(Emission::PatchDelegate {
                field: field.field_name.clone(),
                key: field.type_key.to_string(),
                initializer: generator.field_initializer(field),
            });
        }

        let accessors = node
            .exposed_types
            .iter()
            .map(|exposed| AccessorImplementation {
                accessor: exposed.accessor.callable_id.clone(),
                contextual_key: exposed.contextual_key.clone(),
                body: generator.accessor_body(&exposed.contextual_key),
            })
            .collect();

        let injectors = node
            .injectors
            .iter()
            .map(|injector| {
                let target = injector
                    .function
                    .parameters
                    .first()
                    .map(|parameter| parameter.name.clone())
                    .unwrap_or_default();
                let provider =
                    generator.provider_for(&ContextualTypeKey::plain(injector.type_key.clone()));
                InjectorImplementation {
                    injector: injector.function.callable_id.clone(),
                    target: injector.target.clone(),
                    body: Expression::InjectMembers {
                        injector: Box::new(provider),
                        target,
                    },
                }
            })
            .collect();

        let implementation = GraphImplementation {
            graph: class_id.clone(),
            emissions,
            accessors,
            injectors,
            plan,
        };

        if self.options.debug {
            for emission in &implementation.emissions {
                tracing::debug!("{emission}");
            }
        }
        if let Some(destination) = &self.options.reports_destination {
            if let Err(error) = write_reports(destination, &graph, &implementation) {
                tracing::warn!(graph = %class_id, "Could not write reports: {error}");
            }
        }

        tracing::debug!(
            fields = implementation.plan.fields.len(),
            accessors = implementation.accessors.len(),
            injectors = implementation.injectors.len(),
            "Generated graph implementation"
        );
        Ok(implementation)
    }

    fn stubs(&self, class_id: &ClassId) -> Vec<Stub> {
        let Some(declaration) = self.candidates.graph_declaration(class_id) else {
            return Vec::new();
        };
        declaration
            .abstract_members()
            .map(|member| Stub {
                member: member.clone(),
                message: format!("Never called: {class_id} failed to compile"),
            })
            .collect()
    }
}

/// Registers every binding the graph declares, without resolving any dependency
fn register_bindings(
    graph: &mut BindingGraph<'_>,
    node: &DependencyGraphNode,
    candidates: &dyn BindingCandidates,
    public_provider_severity: Severity,
) -> Result<(), LatticeErrors> {
    let mut errors: Vec<BindingGraphError> = Vec::new();
    let stack = graph.stack();
    let symbols = graph.symbols();

    let this = graph_instance_parameter(node);
    let this_stack = stack.push(this.binding_stack_entry.clone());
    let this = Binding::BoundInstance(BoundInstanceBinding {
        type_key: node.type_key.clone(),
        parameter: this,
    });
    if let Err(error) = graph.add_binding(node.type_key.clone(), this, &this_stack) {
        errors.push(error);
    }

    for (type_key, decl) in node.provider_functions.iter().chain(&node.binds_functions) {
        let binding = match provided_binding(type_key, decl, node, symbols) {
            Ok(binding) => binding,
            Err(error) => {
                errors.push(error.into());
                continue;
            }
        };

        if binding.is_public && !decl.binds {
            match public_provider_severity {
                Severity::None => {}
                Severity::Warn => tracing::warn!(
                    provider = %binding.provider,
                    "Provider function should be private"
                ),
                Severity::Error => errors.push(
                    StructuralError::PublicProvider {
                        function: binding.provider.to_string(),
                    }
                    .into(),
                ),
            }
        }

        let result = if binding.is_into_multibinding() {
            graph.add_multibinding_contribution(binding)
        } else {
            let entry = BindingStackEntry::provided_at(binding.contextual_key.clone(), &binding.provider);
            graph.add_binding(type_key.clone(), Binding::Provided(binding), &stack.push(entry))
        };
        if let Err(error) = result {
            errors.push(error);
        }
    }

    for multibinds in &node.multibinds {
        if let Err(error) = graph.declare_multibinding(&multibinds.function) {
            errors.push(error);
        }
    }

    for parameter in node.bound_instances() {
        let type_key = parameter.contextual_key.type_key().clone();
        let binding = Binding::BoundInstance(BoundInstanceBinding {
            type_key: type_key.clone(),
            parameter: parameter.clone(),
        });
        if let Err(error) = graph.add_binding(type_key, binding, &stack.push(parameter.binding_stack_entry.clone())) {
            errors.push(error);
        }
    }

    for dependency in &node.dependencies {
        let parameter = &dependency.parameter;
        let parameter_stack = stack.push(parameter.binding_stack_entry.clone());
        let type_key = parameter.contextual_key.type_key().clone();
        let binding = Binding::BoundInstance(BoundInstanceBinding {
            type_key: type_key.clone(),
            parameter: parameter.clone(),
        });
        if let Err(error) = graph.add_binding(type_key, binding, &parameter_stack) {
            errors.push(error);
        }

        for exposed in &dependency.node.exposed_types {
            let type_key = exposed.contextual_key.type_key().clone();
            let binding = Binding::GraphDependency(GraphDependencyBinding {
                type_key: type_key.clone(),
                graph: dependency.node.class_id.clone(),
                getter: exposed.accessor.callable_id.clone(),
                contextual_key: exposed.contextual_key.clone(),
                graph_parameter: parameter.name.clone(),
            });
            let entry = BindingStackEntry::provided_at(exposed.contextual_key.clone(), &exposed.accessor.callable_id);
            if let Err(error) = graph.add_binding(type_key, binding, &parameter_stack.push(entry)) {
                errors.push(error);
            }
        }
    }

    for injector in &node.injectors {
        // Several injectors for one class share their MembersInjector
        if graph.contains(&injector.type_key) {
            continue;
        }
        let parameters = match candidates.injected_members(&injector.target) {
            Some(members) => match Parameters::for_members(members, symbols) {
                Ok(parameters) => parameters,
                Err(error) => {
                    errors.push(error.into());
                    continue;
                }
            },
            None => Parameters::empty(),
        };
        let binding = Binding::MembersInjected(MembersInjectedBinding {
            type_key: injector.type_key.clone(),
            target: injector.target.clone(),
            parameters,
            is_from_injector_function: true,
            injector: Some(injector.function.callable_id.clone()),
        });
        let entry = BindingStackEntry::requested_at(
            ContextualTypeKey::plain(injector.type_key.clone()),
            &injector.function.callable_id,
        );
        if let Err(error) = graph.add_binding(injector.type_key.clone(), binding, &stack.push(entry)) {
            errors.push(error);
        }
    }

    tracing::debug!(
        providers = node.provider_functions.len(),
        binds = node.binds_functions.len(),
        bound_instances = node.bound_instances().count(),
        graph_dependencies = node.dependencies.len(),
        injectors = node.injectors.len(),
        errors = errors.len(),
        "Registered declared bindings"
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(LatticeErrors { errors })
    }
}

fn provided_binding(
    type_key: &TypeKey,
    decl: &ProviderDecl,
    node: &DependencyGraphNode,
    symbols: &Symbols,
) -> Result<ProvidedBinding, StructuralError> {
    let function = &decl.function;
    let site = function.callable_id.to_string();

    if decl.scopes.len() > 1 {
        return Err(StructuralError::MultipleScopes {
            class: function.callable_id.owner.clone(),
            scopes: decl
                .scopes
                .iter()
                .map(|scope| scope.render(false))
                .collect::<Vec<_>>()
                .join(", "),
        });
    }
    if decl.map_keys.len() > 1 {
        return Err(StructuralError::MultipleMapKeys { function: site });
    }

    let parameters = Parameters::for_function(function, Some(&node.class_id), symbols)?;

    let aliased_type = if decl.binds {
        let sources: Vec<_> = parameters.non_instance_parameters().collect();
        let [source] = sources.as_slice() else {
            return Err(StructuralError::InvalidBindsFunction {
                function: site,
                reason: format!(
                    "must have exactly one parameter or receiver, found {}",
                    sources.len()
                ),
            });
        };
        if source.contextual_key.type_key() == type_key {
            return Err(StructuralError::InvalidBindsFunction {
                function: site,
                reason: format!("binds {type_key} to itself"),
            });
        }
        Some(source.contextual_key.clone())
    } else {
        None
    };

    Ok(ProvidedBinding {
        type_key: type_key.clone(),
        contextual_key: ContextualTypeKey::plain(type_key.clone()),
        provider: function.callable_id.clone(),
        parameters,
        scope: decl.scopes.first().cloned(),
        contribution: decl.contribution,
        map_key: decl.map_keys.first().cloned(),
        aliased_type,
        is_public: function.visibility == Visibility::Public,
    })
}

/// Writes `<graph>-keys.txt` and `<graph>-plan.json` into `destination`
pub fn write_reports(
    destination: &Path,
    graph: &BindingGraph<'_>,
    implementation: &GraphImplementation,
) -> Result<(), ReportError> {
    fs::create_dir_all(destination).map_err(|source| ReportError::Io {
        path: destination.to_path_buf(),
        source,
    })?;

    let name = implementation.graph.as_str();
    let keys = destination.join(format!("{name}-keys.txt"));
    fs::write(&keys, graph.render_report()).map_err(|source| ReportError::Io {
        path: keys.clone(),
        source,
    })?;

    let document = PlanDocument {
        graph: name.to_string(),
        plan: implementation.plan.report(),
        emissions: &implementation.emissions,
    };
    let plan = destination.join(format!("{name}-plan.json"));
    fs::write(&plan, serde_json::to_string_pretty(&document)?).map_err(|source| ReportError::Io {
        path: plan.clone(),
        source,
    })?;

    tracing::debug!(destination = %destination.display(), "Wrote graph reports");
    Ok(())
}
