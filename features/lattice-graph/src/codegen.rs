//! Provider shaped code for bindings.
//!
//! Nothing here emits a concrete target format. [`Expression`] describes the calls a backend
//! has to make, and [`GeneratedArtifacts`] records which factory classes must exist.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;

use crate::{
    binding::{capitalize, Binding, MultibindingKind, ProvidedBinding},
    declarations::{CallableId, MultibindingContribution},
    graph::BindingGraph,
    parameters::Parameters,
    plan::{BindingPlan, PlannedField},
    types::{ClassId, ContextualTypeKey, Wrapping},
};

/// A parameter handed to a factory, always as a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Argument {
    pub name: String,
    /// How the consuming parameter wants the value
    pub wrapping: Wrapping,
    pub provider: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetElement {
    pub provider: Expression,
    /// `@ElementsIntoSet` contributions add a whole collection
    pub is_collection: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapEntry {
    pub key: String,
    pub provider: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    /// A provider field of the generated graph
    Field { name: String },
    /// A stored creator parameter, or `this` for the graph itself
    Parameter { name: String },
    ConstructorFactory {
        factory: String,
        arguments: Vec<Argument>,
    },
    ProviderFactory {
        factory: String,
        arguments: Vec<Argument>,
    },
    AssistedFactoryImpl {
        factory: String,
        target: Box<Expression>,
    },
    SetBuilder { elements: Vec<SetElement> },
    MapBuilder {
        entries: Vec<MapEntry>,
        provider_values: bool,
    },
    GraphAccessor {
        graph_parameter: String,
        getter: String,
        /// Shape the getter returns
        wrapping: Wrapping,
    },
    InstanceFactory { instance: Box<Expression> },
    MembersInjector {
        injector: String,
        arguments: Vec<Argument>,
    },
    DoubleCheck { provider: Box<Expression> },
    DelegateFactory,
    /// The consumer's default value is used
    Absent,
    Invoke { provider: Box<Expression> },
    LazyOf { provider: Box<Expression> },
    ProviderOfLazy { provider: Box<Expression> },
    InjectMembers {
        injector: Box<Expression>,
        target: String,
    },
}

impl Expression {
    /// Converts a provider into the shape a consumer declared
    pub fn unwrap_to(self, wrapping: Wrapping) -> Expression {
        match wrapping {
            Wrapping::Instance => Expression::Invoke {
                provider: Box::new(self),
            },
            Wrapping::Provider => self,
            Wrapping::Lazy => Expression::LazyOf {
                provider: Box::new(self),
            },
            Wrapping::ProviderOfLazy => Expression::ProviderOfLazy {
                provider: Box::new(self),
            },
        }
    }
}
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn arguments(arguments: &[Argument]) -> String {
            arguments
                .iter()
                .map(|argument| argument.provider.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        }

        match self {
            Expression::Field { name } | Expression::Parameter { name } => f.write_str(name),
            Expression::ConstructorFactory { factory, arguments: args }
            | Expression::ProviderFactory { factory, arguments: args } => {
                write!(f, "{factory}.create({})", arguments(args))
            }
            Expression::AssistedFactoryImpl { factory, target } => {
                write!(f, "{factory}_Impl.create({target})")
            }
            Expression::SetBuilder { elements } => {
                f.write_str("SetFactory.builder()")?;
                for element in elements {
                    if element.is_collection {
                        write!(f, ".addCollectionProvider({})", element.provider)?;
                    } else {
                        write!(f, ".addProvider({})", element.provider)?;
                    }
                }
                f.write_str(".build()")
            }
            Expression::MapBuilder {
                entries,
                provider_values,
            } => {
                if *provider_values {
                    f.write_str("MapProviderFactory.builder()")?;
                } else {
                    f.write_str("MapFactory.builder()")?;
                }
                for entry in entries {
                    write!(f, ".put({}, {})", entry.key, entry.provider)?;
                }
                f.write_str(".build()")
            }
            Expression::GraphAccessor {
                graph_parameter,
                getter,
                wrapping,
            } => match wrapping {
                Wrapping::Instance => write!(f, "provider {{ {graph_parameter}.{getter}() }}"),
                Wrapping::Provider => write!(f, "{graph_parameter}.{getter}()"),
                Wrapping::Lazy => write!(f, "provider {{ {graph_parameter}.{getter}().value }}"),
                Wrapping::ProviderOfLazy => {
                    write!(f, "provider {{ {graph_parameter}.{getter}().invoke().value }}")
                }
            },
            Expression::InstanceFactory { instance } => write!(f, "InstanceFactory.create({instance})"),
            Expression::MembersInjector {
                injector,
                arguments: args,
            } => write!(f, "{injector}.create({})", arguments(args)),
            Expression::DoubleCheck { provider } => write!(f, "DoubleCheck.provider({provider})"),
            Expression::DelegateFactory => f.write_str("DelegateFactory()"),
            Expression::Absent => f.write_str("<absent>"),
            Expression::Invoke { provider } => write!(f, "{provider}.invoke()"),
            Expression::LazyOf { provider } => write!(f, "DoubleCheck.lazy({provider})"),
            Expression::ProviderOfLazy { provider } => write!(f, "ProviderOfLazy.create({provider})"),
            Expression::InjectMembers { injector, target } => {
                write!(f, "{injector}.injectMembers({target})")
            }
        }
    }
}

/// Factory class of a constructor injected class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactoryClass {
    pub name: String,
    pub target: String,
    pub is_assisted: bool,
    pub parameters: Vec<String>,
}

/// Factory class calling a provider function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderFactoryClass {
    pub name: String,
    pub function: String,
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembersInjectorClass {
    pub name: String,
    pub target: String,
    pub parameters: Vec<String>,
}

/// Factories generated during a compilation, shared by every graph.
///
/// Each class is created once, later graphs reuse it.
#[derive(Debug, Default)]
pub struct GeneratedArtifacts {
    pub factories: BTreeMap<ClassId, FactoryClass>,
    pub provider_factories: BTreeMap<CallableId, ProviderFactoryClass>,
    pub injectors: BTreeMap<ClassId, MembersInjectorClass>,
}

impl GeneratedArtifacts {
    fn factory_for(&mut self, class_id: &ClassId, is_assisted: bool, parameters: &Parameters) -> &FactoryClass {
        self.factories.entry(class_id.clone()).or_insert_with(|| {
            tracing::trace!(class = %class_id, "Generating factory");
            FactoryClass {
                name: format!("{}_Factory", class_id.short_name()),
                target: class_id.to_string(),
                is_assisted,
                parameters: parameter_names(parameters),
            }
        })
    }

    fn provider_factory_for(&mut self, function: &CallableId, parameters: &Parameters) -> &ProviderFactoryClass {
        self.provider_factories
            .entry(function.clone())
            .or_insert_with(|| {
                tracing::trace!(function = %function, "Generating provider factory");
                ProviderFactoryClass {
                    name: format!("{}_{}Factory", function.owner.short_name(), capitalize(&function.name)),
                    function: function.to_string(),
                    parameters: parameter_names(parameters),
                }
            })
    }

    fn injector_for(&mut self, class_id: &ClassId, parameters: &Parameters) -> &MembersInjectorClass {
        self.injectors.entry(class_id.clone()).or_insert_with(|| {
            tracing::trace!(class = %class_id, "Generating members injector");
            MembersInjectorClass {
                name: format!("{}_MembersInjector", class_id.short_name()),
                target: class_id.to_string(),
                parameters: parameter_names(parameters),
            }
        })
    }
}

fn parameter_names(parameters: &Parameters) -> Vec<String> {
    parameters
        .all_parameters()
        .map(|parameter| parameter.name.clone())
        .collect()
}

/// Produces provider shaped expressions for the bindings of one planned graph
pub struct BindingCodeGenerator<'s, 'g, 'a> {
    graph: &'g BindingGraph<'a>,
    plan: &'s BindingPlan,
    artifacts: &'s mut GeneratedArtifacts,
}

impl<'s, 'g, 'a> BindingCodeGenerator<'s, 'g, 'a> {
    pub fn new(graph: &'g BindingGraph<'a>, plan: &'s BindingPlan, artifacts: &'s mut GeneratedArtifacts) -> Self {
        Self {
            graph,
            plan,
            artifacts,
        }
    }

    /// Initializer of a planned field, scoped bindings are memoized
    pub fn field_initializer(&mut self, field: &PlannedField) -> Expression {
        let provider = self.generate(&field.binding);
        if field.binding.is_scoped() {
            Expression::DoubleCheck {
                provider: Box::new(provider),
            }
        } else {
            provider
        }
    }

    /// A provider of `contextual_key`, reusing its field when there is one
    pub fn provider_for(&mut self, contextual_key: &ContextualTypeKey) -> Expression {
        let requested = contextual_key.type_key();
        let Some(binding) = self.graph.find_binding(requested).cloned() else {
            return Expression::Absent;
        };
        if let Some(name) = self.plan.field_name(binding.type_key()) {
            return Expression::Field {
                name: name.to_string(),
            };
        }
        match binding.as_ref() {
            // A `Map<K, Provider<V>>` request resolves to the `Map<K, V>` multibinding
            Binding::Multibinding(multibinding) if binding.type_key() != requested => {
                self.map_builder(&multibinding.sources, true)
            }
            _ => self.generate(&binding),
        }
    }

    /// Expression for the body of an accessor returning `contextual_key`
    pub fn accessor_body(&mut self, contextual_key: &ContextualTypeKey) -> Expression {
        self.provider_for(contextual_key)
            .unwrap_to(contextual_key.wrapping())
    }

    /// Provider for `binding`, ignoring any field of its own
    pub fn generate(&mut self, binding: &Binding) -> Expression {
        match binding {
            Binding::ConstructorInjected(constructor) => {
                let factory = self
                    .artifacts
                    .factory_for(&constructor.class_id, constructor.is_assisted, &constructor.parameters)
                    .name
                    .clone();
                Expression::ConstructorFactory {
                    factory,
                    arguments: self.arguments(&constructor.parameters),
                }
            }
            Binding::Provided(provided) => self.provided(provided),
            Binding::Assisted(assisted) => {
                let target = match self.plan.field_name(&assisted.target.type_key) {
                    Some(name) => Expression::Field {
                        name: name.to_string(),
                    },
                    None => self.generate(&Binding::ConstructorInjected(assisted.target.clone())),
                };
                Expression::AssistedFactoryImpl {
                    factory: assisted.factory.short_name().to_string(),
                    target: Box::new(target),
                }
            }
            Binding::Multibinding(multibinding) => match multibinding.kind {
                MultibindingKind::Set => Expression::SetBuilder {
                    elements: multibinding
                        .sources
                        .iter()
                        .map(|source| SetElement {
                            provider: self.contribution(source),
                            is_collection: source.contribution
                                == Some(MultibindingContribution::ElementsIntoSet),
                        })
                        .collect(),
                },
                MultibindingKind::Map => self.map_builder(&multibinding.sources, false),
            },
            Binding::BoundInstance(bound) => {
                let name = if bound.parameter.is_graph_instance {
                    "this".to_string()
                } else {
                    bound.parameter.name.clone()
                };
                Expression::InstanceFactory {
                    instance: Box::new(Expression::Parameter { name }),
                }
            }
            Binding::GraphDependency(dependency) => Expression::GraphAccessor {
                graph_parameter: dependency.graph_parameter.clone(),
                getter: dependency.getter.name.clone(),
                wrapping: dependency.contextual_key.wrapping(),
            },
            Binding::MembersInjected(members) => {
                let injector = self
                    .artifacts
                    .injector_for(&members.target, &members.parameters)
                    .name
                    .clone();
                Expression::MembersInjector {
                    injector,
                    arguments: self.arguments(&members.parameters),
                }
            }
            Binding::Absent(_) => Expression::Absent,
        }
    }

    fn provided(&mut self, provided: &ProvidedBinding) -> Expression {
        if let Some(aliased) = &provided.aliased_type {
            return self.provider_for(aliased);
        }
        let factory = self
            .artifacts
            .provider_factory_for(&provided.provider, &provided.parameters)
            .name
            .clone();
        Expression::ProviderFactory {
            factory,
            arguments: self.arguments(&provided.parameters),
        }
    }

    /// A multibinding contribution, through its own field if it has one
    fn contribution(&mut self, source: &ProvidedBinding) -> Expression {
        match self.plan.field_name(&source.contribution_key()) {
            Some(name) => Expression::Field {
                name: name.to_string(),
            },
            None => self.provided(source),
        }
    }

    fn map_builder<'b>(
        &mut self,
        sources: impl IntoIterator<Item = &'b ProvidedBinding>,
        provider_values: bool,
    ) -> Expression {
        let entries = sources
            .into_iter()
            .map(|source| MapEntry {
                key: source
                    .map_key
                    .as_ref()
                    .map(|map_key| map_key.value.clone())
                    .unwrap_or_default(),
                provider: self.contribution(source),
            })
            .collect();
        Expression::MapBuilder {
            entries,
            provider_values,
        }
    }

    fn arguments(&mut self, parameters: &Parameters) -> Vec<Argument> {
        let mut arguments = Vec::new();
        for parameter in parameters.all_parameters() {
            if parameter.is_assisted {
                continue;
            }
            let provider = if parameter.is_graph_instance {
                Expression::InstanceFactory {
                    instance: Box::new(Expression::Parameter {
                        name: "this".to_string(),
                    }),
                }
            } else {
                self.provider_for(&parameter.contextual_key)
            };
            arguments.push(Argument {
                name: parameter.name.clone(),
                wrapping: parameter.contextual_key.wrapping(),
                provider,
            });
        }
        arguments
    }
}
