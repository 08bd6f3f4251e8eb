use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use crate::{
    declarations::{FunctionDecl, GraphDeclaration, MultibindsDecl, ProviderDecl},
    errors::{BindingGraphError, LatticeErrors, StructuralError},
    graph::Root,
    parameters::{single_qualifier, Parameter, ParameterKind, Parameters},
    source::BindingCandidates,
    stack::BindingStackEntry,
    types::{Annotation, ClassId, ContextualTypeKey, Symbols, TypeKey, TypeRef},
};

/// An accessor of a graph and the shape it returns
#[derive(Debug, Clone)]
pub struct ExposedType {
    pub accessor: FunctionDecl,
    pub contextual_key: ContextualTypeKey,
}

/// An injector function, keyed by the `MembersInjector<T>` of its target
#[derive(Debug, Clone)]
pub struct Injector {
    pub function: FunctionDecl,
    pub target: ClassId,
    pub type_key: TypeKey,
}

/// A creator parameter providing another graph instance
#[derive(Debug, Clone)]
pub struct GraphDependencyParameter {
    pub parameter: Parameter,
    pub node: Arc<DependencyGraphNode>,
}

#[derive(Debug, Clone)]
pub struct Creator {
    pub class_id: ClassId,
    pub function: FunctionDecl,
    pub parameters: Parameters,
}

/// Everything the engine needs to know about one graph declaration
#[derive(Debug, Clone)]
pub struct DependencyGraphNode {
    pub class_id: ClassId,
    pub type_key: TypeKey,
    pub scopes: BTreeSet<Annotation>,
    pub provider_functions: Vec<(TypeKey, ProviderDecl)>,
    pub binds_functions: Vec<(TypeKey, ProviderDecl)>,
    pub multibinds: Vec<MultibindsDecl>,
    pub exposed_types: Vec<ExposedType>,
    pub injectors: Vec<Injector>,
    pub creator: Option<Creator>,
    /// Graphs passed to the creator, in parameter order
    pub dependencies: Vec<GraphDependencyParameter>,
}

impl DependencyGraphNode {
    /// The graph itself, each accessor and each injector
    pub fn roots(&self) -> Vec<Root> {
        let graph_key = ContextualTypeKey::plain(self.type_key.clone());
        let mut roots = vec![Root {
            entry: BindingStackEntry::simple(graph_key.clone()),
            contextual_key: graph_key,
        }];
        for exposed in &self.exposed_types {
            roots.push(Root {
                entry: BindingStackEntry::requested_at(
                    exposed.contextual_key.clone(),
                    &exposed.accessor.callable_id,
                ),
                contextual_key: exposed.contextual_key.clone(),
            });
        }
        for injector in &self.injectors {
            let contextual_key = ContextualTypeKey::plain(injector.type_key.clone());
            roots.push(Root {
                entry: BindingStackEntry::requested_at(
                    contextual_key.clone(),
                    &injector.function.callable_id,
                ),
                contextual_key,
            });
        }
        roots
    }

    /// Creator parameters bound as instances
    pub fn bound_instances(&self) -> impl Iterator<Item = &Parameter> {
        self.creator
            .iter()
            .flat_map(|creator| creator.parameters.value_parameters.iter())
            .filter(|parameter| parameter.is_binds_instance)
    }
}

/// Memoized [`DependencyGraphNode`]s, shared by every graph of a compilation
#[derive(Debug, Default)]
pub struct NodeCache {
    nodes: HashMap<ClassId, Arc<DependencyGraphNode>>,
}

impl NodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, class_id: &ClassId) -> Option<&Arc<DependencyGraphNode>> {
        self.nodes.get(class_id)
    }

    /// Returns the node of `class_id`, computing it and the graphs it depends on if needed
    pub fn get_or_compute(
        &mut self,
        class_id: &ClassId,
        candidates: &dyn BindingCandidates,
        symbols: &Symbols,
    ) -> Result<Arc<DependencyGraphNode>, LatticeErrors> {
        let mut chain = Vec::new();
        self.compute(class_id, candidates, symbols, &mut chain)
    }

    fn compute(
        &mut self,
        class_id: &ClassId,
        candidates: &dyn BindingCandidates,
        symbols: &Symbols,
        chain: &mut Vec<ClassId>,
    ) -> Result<Arc<DependencyGraphNode>, LatticeErrors> {
        if let Some(node) = self.nodes.get(class_id) {
            return Ok(node.clone());
        }

        if let Some(position) = chain.iter().position(|id| id == class_id) {
            let trace = chain[position..]
                .iter()
                .chain(std::iter::once(class_id))
                .map(ClassId::to_string)
                .collect::<Vec<_>>()
                .join(" --> ");
            return Err(BindingGraphError::GraphDependencyCycle { trace }.into());
        }

        let Some(declaration) = candidates.graph_declaration(class_id) else {
            return Err(StructuralError::NotADependencyGraph {
                class: class_id.clone(),
            }
            .into());
        };

        chain.push(class_id.clone());
        let node = self.build(declaration, candidates, symbols, chain);
        chain.pop();

        let node = Arc::new(node?);
        tracing::debug!(
            graph = %class_id,
            accessors = node.exposed_types.len(),
            injectors = node.injectors.len(),
            dependencies = node.dependencies.len(),
            "Computed dependency graph node"
        );
        self.nodes.insert(class_id.clone(), node.clone());
        Ok(node)
    }

    fn build(
        &mut self,
        declaration: &GraphDeclaration,
        candidates: &dyn BindingCandidates,
        symbols: &Symbols,
        chain: &mut Vec<ClassId>,
    ) -> Result<DependencyGraphNode, LatticeErrors> {
        let mut errors = Vec::new();
        let class_id = &declaration.class_id;

        let mut provider_functions = Vec::new();
        let mut binds_functions = Vec::new();
        for provider in &declaration.providers {
            let function = &provider.function;
            match single_qualifier(&function.qualifiers, &function.callable_id.to_string()) {
                Ok(qualifier) => {
                    let type_key = TypeKey::new(function.return_type.clone(), qualifier);
                    if provider.binds {
                        binds_functions.push((type_key, provider.clone()));
                    } else {
                        provider_functions.push((type_key, provider.clone()));
                    }
                }
                Err(error) => errors.push(error.into()),
            }
        }

        let mut exposed_types = Vec::new();
        for accessor in &declaration.accessors {
            let function = &accessor.function;
            match single_qualifier(&function.qualifiers, &function.callable_id.to_string()) {
                Ok(qualifier) => exposed_types.push(ExposedType {
                    contextual_key: ContextualTypeKey::from_type(
                        &function.return_type,
                        qualifier,
                        false,
                        symbols,
                    ),
                    accessor: function.clone(),
                }),
                Err(error) => errors.push(error.into()),
            }
        }

        let mut injectors = Vec::new();
        for injector in &declaration.injectors {
            let Some(target) = injector.function.parameters.first() else {
                tracing::warn!(
                    injector = %injector.function.callable_id,
                    "Injector function without a target parameter is ignored"
                );
                continue;
            };
            injectors.push(Injector {
                function: injector.function.clone(),
                target: target.ty.class_id.clone(),
                type_key: TypeKey::plain(symbols.members_injector_of(target.ty.clone())),
            });
        }

        let mut creator = None;
        let mut dependencies = Vec::new();
        if let Some(decl) = &declaration.creator {
            match Parameters::for_function(&decl.function, None, symbols) {
                Ok(parameters) => {
                    for parameter in &parameters.value_parameters {
                        if parameter.is_binds_instance {
                            continue;
                        }
                        let dependency_class = &parameter.contextual_key.type_key().ty().class_id;
                        if candidates.graph_declaration(dependency_class).is_none() {
                            errors.push(
                                StructuralError::InvalidCreatorParameter {
                                    graph: class_id.clone(),
                                    parameter: parameter.name.clone(),
                                }
                                .into(),
                            );
                            continue;
                        }
                        match self.compute(dependency_class, candidates, symbols, chain) {
                            Ok(node) => dependencies.push(GraphDependencyParameter {
                                parameter: parameter.clone(),
                                node,
                            }),
                            Err(nested) => errors.extend(nested.errors),
                        }
                    }
                    creator = Some(Creator {
                        class_id: decl.class_id.clone(),
                        function: decl.function.clone(),
                        parameters,
                    });
                }
                Err(error) => errors.push(error.into()),
            }
        }

        if !errors.is_empty() {
            return Err(LatticeErrors { errors });
        }

        Ok(DependencyGraphNode {
            class_id: class_id.clone(),
            type_key: TypeKey::plain(TypeRef::of(class_id.clone())),
            scopes: declaration.scopes.iter().cloned().collect(),
            provider_functions,
            binds_functions,
            multibinds: declaration.multibinds.clone(),
            exposed_types,
            injectors,
            creator,
            dependencies,
        })
    }
}

/// The instance parameter binding the graph to itself
pub(crate) fn graph_instance_parameter(node: &DependencyGraphNode) -> Parameter {
    let contextual_key = ContextualTypeKey::plain(node.type_key.clone());
    Parameter {
        kind: ParameterKind::Instance,
        name: "thisGraphInstance".to_string(),
        binding_stack_entry: BindingStackEntry::bound_at(contextual_key.clone(), node.class_id.to_string()),
        contextual_key,
        is_assisted: false,
        assisted_identifier: String::new(),
        is_binds_instance: false,
        is_graph_instance: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        declarations::{CallableId, CreatorDecl, ParameterDecl},
        source::DeclarationIndex,
    };

    fn creator(graph: &str, parameters: Vec<ParameterDecl>) -> CreatorDecl {
        let factory = ClassId::new(format!("{graph}.Factory"));
        let mut function = FunctionDecl::new(CallableId::new(factory.clone(), "create"), TypeRef::of(graph));
        for parameter in parameters {
            function = function.with_parameter(parameter);
        }
        CreatorDecl {
            class_id: factory,
            function,
        }
    }

    #[test]
    fn test_node_collects_members() {
        let index = DeclarationIndex::new().with_graph(
            GraphDeclaration::new("app.AppGraph")
                .scoped(Annotation::new("app.AppScope"))
                .with_accessor("repository", TypeRef::of("app.Repository"))
                .with_injector("inject", TypeRef::of("app.MainActivity"))
                .with_creator(creator(
                    "app.AppGraph",
                    vec![ParameterDecl::new("name", TypeRef::of("kotlin.String")).binds_instance()],
                )),
        );
        let mut cache = NodeCache::new();
        let node = cache
            .get_or_compute(&ClassId::new("app.AppGraph"), &index, &Symbols::default())
            .unwrap();

        assert_eq!(node.type_key.as_str(), "app.AppGraph");
        assert_eq!(node.exposed_types.len(), 1);
        assert_eq!(
            node.injectors[0].type_key.as_str(),
            "lattice.MembersInjector<app.MainActivity>"
        );
        assert_eq!(node.bound_instances().count(), 1);
        assert_eq!(node.roots().len(), 3);
        assert!(cache.get(&ClassId::new("app.AppGraph")).is_some());
    }

    #[test]
    fn test_graph_dependency_cycle() {
        let index = DeclarationIndex::new()
            .with_graph(GraphDeclaration::new("app.A").with_creator(creator(
                "app.A",
                vec![ParameterDecl::new("b", TypeRef::of("app.B"))],
            )))
            .with_graph(GraphDeclaration::new("app.B").with_creator(creator(
                "app.B",
                vec![ParameterDecl::new("a", TypeRef::of("app.A"))],
            )));

        let errors = NodeCache::new()
            .get_or_compute(&ClassId::new("app.A"), &index, &Symbols::default())
            .unwrap_err();
        assert_eq!(errors.tags(), vec!["GraphDependencyCycle"]);
        assert!(errors.errors[0]
            .to_string()
            .contains("app.A --> app.B --> app.A"));
    }

    #[test]
    fn test_invalid_creator_parameter() {
        let index = DeclarationIndex::new().with_graph(GraphDeclaration::new("app.A").with_creator(
            creator("app.A", vec![ParameterDecl::new("name", TypeRef::of("kotlin.String"))]),
        ));

        let errors = NodeCache::new()
            .get_or_compute(&ClassId::new("app.A"), &index, &Symbols::default())
            .unwrap_err();
        assert_eq!(errors.tags(), vec!["InvalidCreatorParameter"]);
    }
}
