//! How a [`TypeKey`] is satisfied within a graph.
//!
//! [`Binding`] is a closed set of strategies. Each variant carries what code generation needs
//! to produce a provider for the key, and [`Binding::dependency_sites`] lists what has to be
//! resolved first.

use std::{cmp::Ordering, collections::BTreeSet, fmt};

use crate::{
    declarations::{CallableId, DeclarationOrigin, FunctionDecl, MapKey, MultibindingContribution},
    parameters::{Parameter, Parameters},
    stack::BindingStackEntry,
    types::{Annotation, ClassId, ContextualTypeKey, TypeKey, MULTIBINDING_ELEMENT},
};

/// A dependency of a binding together with where it is injected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySite {
    pub contextual_key: ContextualTypeKey,
    pub entry: BindingStackEntry,
}

impl From<&Parameter> for DependencySite {
    fn from(parameter: &Parameter) -> Self {
        Self {
            contextual_key: parameter.contextual_key.clone(),
            entry: parameter.binding_stack_entry.clone(),
        }
    }
}

/// A class created through its `@Inject` constructor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorInjectedBinding {
    pub type_key: TypeKey,
    pub class_id: ClassId,
    pub constructor: CallableId,
    pub is_assisted: bool,
    /// Constructor parameters followed by member injection parameters
    pub parameters: Parameters,
    pub scope: Option<Annotation>,
    pub origin: DeclarationOrigin,
    pub has_injected_members: bool,
}

/// A value returned by a `@Provides` function, or aliased by a `@Binds` function
#[derive(Debug, Clone)]
pub struct ProvidedBinding {
    pub type_key: TypeKey,
    pub contextual_key: ContextualTypeKey,
    pub provider: CallableId,
    pub parameters: Parameters,
    pub scope: Option<Annotation>,
    pub contribution: Option<MultibindingContribution>,
    pub map_key: Option<MapKey>,
    /// Set for `@Binds` functions, the key this binding passes through
    pub aliased_type: Option<ContextualTypeKey>,
    pub is_public: bool,
}

impl ProvidedBinding {
    pub fn is_into_multibinding(&self) -> bool {
        self.contribution.is_some()
    }

    /// Identity of a multibinding contribution.
    ///
    /// Contributions share their element type, so they are told apart by a synthetic
    /// qualifier naming the contributing function.
    pub fn contribution_key(&self) -> TypeKey {
        let qualifier =
            Annotation::new(MULTIBINDING_ELEMENT).with_argument(format!("\"{}\"", self.provider));
        TypeKey::new(self.type_key.ty().clone(), Some(qualifier))
    }

    pub fn name_hint(&self) -> String {
        let name = self.provider.name.as_str();
        let trimmed = name
            .strip_prefix("provide")
            .or_else(|| name.strip_prefix("bind"))
            .filter(|rest| !rest.is_empty())
            .unwrap_or(name);
        decapitalize(trimmed)
    }

    fn ordering_tuple(
        &self,
    ) -> (
        &TypeKey,
        String,
        &Option<Annotation>,
        &Parameters,
        &CallableId,
        &ContextualTypeKey,
        &Option<MapKey>,
    ) {
        (
            &self.type_key,
            self.name_hint(),
            &self.scope,
            &self.parameters,
            &self.provider,
            &self.contextual_key,
            &self.map_key,
        )
    }
}
impl PartialEq for ProvidedBinding {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
            && self.contribution == other.contribution
            && self.aliased_type == other.aliased_type
            && self.is_public == other.is_public
    }
}
impl Eq for ProvidedBinding {}
impl PartialOrd for ProvidedBinding {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ProvidedBinding {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordering_tuple()
            .cmp(&other.ordering_tuple())
            .then_with(|| self.contribution.cmp(&other.contribution))
            .then_with(|| self.aliased_type.cmp(&other.aliased_type))
            .then_with(|| self.is_public.cmp(&other.is_public))
    }
}

/// An `@AssistedFactory` implementation creating its assisted target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistedBinding {
    pub type_key: TypeKey,
    pub factory: ClassId,
    pub function: FunctionDecl,
    pub target: ConstructorInjectedBinding,
    /// Parameters of the factory function, passed on as assisted arguments
    pub parameters: Parameters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum MultibindingKind {
    Set,
    Map,
}

/// A Set or Map assembled from contributions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultibindingBinding {
    pub type_key: TypeKey,
    pub kind: MultibindingKind,
    pub sources: BTreeSet<ProvidedBinding>,
    /// Declared through `@Multibinds`, so it may be empty
    pub is_declared: bool,
}

/// An instance handed to the graph's creator, or the graph itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundInstanceBinding {
    pub type_key: TypeKey,
    pub parameter: Parameter,
}

/// Satisfied by an accessor of a dependency graph instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphDependencyBinding {
    pub type_key: TypeKey,
    pub graph: ClassId,
    pub getter: CallableId,
    /// Shape the getter returns
    pub contextual_key: ContextualTypeKey,
    /// Creator parameter holding the dependency graph instance
    pub graph_parameter: String,
}

/// Injects the members of an existing instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembersInjectedBinding {
    pub type_key: TypeKey,
    pub target: ClassId,
    pub parameters: Parameters,
    /// Created for an injector function of the graph rather than a `MembersInjector<T>` request
    pub is_from_injector_function: bool,
    /// Injector function implemented by this binding
    pub injector: Option<CallableId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    ConstructorInjected(ConstructorInjectedBinding),
    Provided(ProvidedBinding),
    Assisted(AssistedBinding),
    Multibinding(MultibindingBinding),
    BoundInstance(BoundInstanceBinding),
    GraphDependency(GraphDependencyBinding),
    MembersInjected(MembersInjectedBinding),
    /// No binding exists but the consumer declares a default value; never stored
    Absent(TypeKey),
}

impl Binding {
    pub fn type_key(&self) -> &TypeKey {
        match self {
            Binding::ConstructorInjected(binding) => &binding.type_key,
            Binding::Provided(binding) => &binding.type_key,
            Binding::Assisted(binding) => &binding.type_key,
            Binding::Multibinding(binding) => &binding.type_key,
            Binding::BoundInstance(binding) => &binding.type_key,
            Binding::GraphDependency(binding) => &binding.type_key,
            Binding::MembersInjected(binding) => &binding.type_key,
            Binding::Absent(type_key) => type_key,
        }
    }

    pub fn contextual_type_key(&self) -> ContextualTypeKey {
        match self {
            Binding::Provided(binding) => binding.contextual_key.clone(),
            Binding::BoundInstance(binding) => binding.parameter.contextual_key.clone(),
            other => ContextualTypeKey::plain(other.type_key().clone()),
        }
    }

    pub fn scope(&self) -> Option<&Annotation> {
        match self {
            Binding::ConstructorInjected(binding) => binding.scope.as_ref(),
            Binding::Provided(binding) => binding.scope.as_ref(),
            _ => None,
        }
    }

    pub fn is_scoped(&self) -> bool {
        self.scope().is_some()
    }

    pub fn parameters(&self) -> Option<&Parameters> {
        match self {
            Binding::ConstructorInjected(binding) => Some(&binding.parameters),
            Binding::Provided(binding) => Some(&binding.parameters),
            Binding::Assisted(binding) => Some(&binding.parameters),
            Binding::MembersInjected(binding) => Some(&binding.parameters),
            _ => None,
        }
    }

    /// Everything that has to be resolved before this binding can be created
    pub fn dependency_sites(&self) -> Vec<DependencySite> {
        match self {
            Binding::ConstructorInjected(binding) => sites(&binding.parameters),
            Binding::Provided(binding) => sites(&binding.parameters),
            Binding::MembersInjected(binding) => sites(&binding.parameters),
            Binding::Assisted(binding) => {
                let contextual_key = ContextualTypeKey::plain(binding.target.type_key.clone());
                vec![DependencySite {
                    entry: BindingStackEntry::injected_at(
                        contextual_key.clone(),
                        &binding.function.callable_id,
                        None,
                    ),
                    contextual_key,
                }]
            }
            Binding::Multibinding(binding) => binding
                .sources
                .iter()
                .flat_map(|source| sites(&source.parameters))
                .collect(),
            Binding::BoundInstance(_) | Binding::GraphDependency(_) | Binding::Absent(_) => {
                Vec::new()
            }
        }
    }

    /// Keys of [`Self::dependency_sites`]
    pub fn dependencies(&self) -> BTreeSet<TypeKey> {
        self.dependency_sites()
            .into_iter()
            .map(|site| site.contextual_key.type_key().clone())
            .collect()
    }

    /// Readable base for the name of a generated field
    pub fn name_hint(&self) -> String {
        match self {
            Binding::ConstructorInjected(binding) => decapitalize(binding.class_id.short_name()),
            Binding::Provided(binding) => binding.name_hint(),
            Binding::Assisted(binding) => decapitalize(binding.factory.short_name()),
            Binding::Multibinding(binding) => {
                let element = match binding.kind {
                    MultibindingKind::Set => binding.type_key.ty().argument(0),
                    MultibindingKind::Map => binding.type_key.ty().argument(1),
                };
                let element = element
                    .map(|ty| ty.class_id.short_name().to_string())
                    .unwrap_or_default();
                match binding.kind {
                    MultibindingKind::Set => format!("setOf{element}"),
                    MultibindingKind::Map => format!("mapOf{element}"),
                }
            }
            Binding::BoundInstance(binding) => binding.parameter.name.clone(),
            Binding::GraphDependency(binding) => {
                format!(
                    "{}{}",
                    decapitalize(binding.graph.short_name()),
                    capitalize(&binding.getter.name)
                )
            }
            Binding::MembersInjected(binding) => {
                format!("{}MembersInjector", decapitalize(binding.target.short_name()))
            }
            Binding::Absent(type_key) => decapitalize(type_key.ty().class_id.short_name()),
        }
    }

    /// Where the binding is declared, for diagnostics and reports
    pub fn declaration(&self) -> Option<String> {
        match self {
            Binding::ConstructorInjected(binding) => Some(binding.constructor.to_string()),
            Binding::Provided(binding) => Some(binding.provider.to_string()),
            Binding::Assisted(binding) => Some(binding.function.callable_id.to_string()),
            Binding::Multibinding(binding) => (!binding.sources.is_empty()).then(|| {
                binding
                    .sources
                    .iter()
                    .map(|source| source.provider.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            }),
            Binding::BoundInstance(binding) => binding.parameter.binding_stack_entry.context.clone(),
            Binding::GraphDependency(binding) => Some(binding.getter.to_string()),
            Binding::MembersInjected(binding) => binding
                .injector
                .as_ref()
                .map(ToString::to_string)
                .or_else(|| Some(binding.target.to_string())),
            Binding::Absent(_) => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Binding::ConstructorInjected(_) => "ConstructorInjected",
            Binding::Provided(binding) if binding.aliased_type.is_some() => "Alias",
            Binding::Provided(_) => "Provided",
            Binding::Assisted(_) => "Assisted",
            Binding::Multibinding(_) => "Multibinding",
            Binding::BoundInstance(_) => "BoundInstance",
            Binding::GraphDependency(_) => "GraphDependency",
            Binding::MembersInjected(_) => "MembersInjected",
            Binding::Absent(_) => "Absent",
        }
    }

    /// Graph dependencies and injector backed members injection call outside the graph
    pub fn always_needs_field(&self) -> bool {
        match self {
            Binding::GraphDependency(_) => true,
            Binding::MembersInjected(binding) => binding.is_from_injector_function,
            other => other.is_scoped(),
        }
    }
}
impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.type_key(), self.kind_name())?;
        if let Some(scope) = self.scope() {
            write!(f, " {scope}")?;
        }
        if let Some(declaration) = self.declaration() {
            write!(f, " at {declaration}")?;
        }
        Ok(())
    }
}

fn sites(parameters: &Parameters) -> Vec<DependencySite> {
    parameters.dependencies().map(DependencySite::from).collect()
}

pub(crate) fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
