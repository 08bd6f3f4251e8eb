//! Declarations discovered in user code.
//!
//! These are the binding candidates the annotation discovery layer hands to the engine.
//! They are plain data; everything the engine derives from them lives in [`crate::binding`].

use std::fmt;

use crate::types::{Annotation, ClassId, TypeRef};

/// A function or constructor, identified by its owner and name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallableId {
    pub owner: ClassId,
    pub name: String,
}

impl CallableId {
    pub fn new(owner: impl Into<ClassId>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn constructor(owner: impl Into<ClassId>) -> Self {
        Self::new(owner, "<init>")
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }
}
impl fmt::Display for CallableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_constructor() {
            write!(f, "{}", self.owner)
        } else {
            write!(f, "{}.{}", self.owner, self.name)
        }
    }
}

/// A declared parameter of a constructor, function or creator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDecl {
    pub name: String,
    pub ty: TypeRef,
    /// All qualifier annotations, more than one is an error
    pub qualifiers: Vec<Annotation>,
    pub has_default: bool,
    /// Identifier of an `@Assisted` parameter, empty for the default identifier
    pub assisted: Option<String>,
    pub is_binds_instance: bool,
}

impl ParameterDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            qualifiers: Vec::new(),
            has_default: false,
            assisted: None,
            is_binds_instance: false,
        }
    }

    pub fn qualified(mut self, qualifier: Annotation) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    pub fn assisted(mut self, identifier: impl Into<String>) -> Self {
        self.assisted = Some(identifier.into());
        self
    }

    pub fn binds_instance(mut self) -> Self {
        self.is_binds_instance = true;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    #[default]
    Private,
    Internal,
    Public,
}

/// A constructor, function or property getter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    pub callable_id: CallableId,
    /// Receiver the function is called on, e.g. the graph for provider functions
    pub dispatch_receiver: Option<TypeRef>,
    pub extension_receiver: Option<ParameterDecl>,
    pub parameters: Vec<ParameterDecl>,
    pub return_type: TypeRef,
    /// Qualifiers on the function (or property) itself
    pub qualifiers: Vec<Annotation>,
    pub is_property: bool,
    pub visibility: Visibility,
}

impl FunctionDecl {
    pub fn new(callable_id: CallableId, return_type: TypeRef) -> Self {
        Self {
            callable_id,
            dispatch_receiver: None,
            extension_receiver: None,
            parameters: Vec::new(),
            return_type,
            qualifiers: Vec::new(),
            is_property: false,
            visibility: Visibility::default(),
        }
    }

    /// The primary constructor of `class_id`
    pub fn constructor(class_id: impl Into<ClassId>) -> Self {
        let class_id = class_id.into();
        Self::new(
            CallableId::constructor(class_id.clone()),
            TypeRef::of(class_id),
        )
    }

    pub fn with_parameter(mut self, parameter: ParameterDecl) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_dispatch_receiver(mut self, receiver: TypeRef) -> Self {
        self.dispatch_receiver = Some(receiver);
        self
    }

    pub fn with_extension_receiver(mut self, receiver: ParameterDecl) -> Self {
        self.extension_receiver = Some(receiver);
        self
    }

    pub fn qualified(mut self, qualifier: Annotation) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    pub fn property(mut self) -> Self {
        self.is_property = true;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Where a declaration was compiled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeclarationOrigin {
    /// Part of the current compilation, factories are generated on demand
    #[default]
    Local,
    /// From a dependency, its factory must already have been generated there
    External { has_generated_factory: bool },
}

/// A class with an `@Inject` constructor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectableClass {
    pub class_id: ClassId,
    pub constructor: FunctionDecl,
    pub scopes: Vec<Annotation>,
    /// Injected properties and functions, each called after construction
    pub injected_members: Vec<FunctionDecl>,
    pub origin: DeclarationOrigin,
}

impl InjectableClass {
    pub fn new(constructor: FunctionDecl) -> Self {
        Self {
            class_id: constructor.callable_id.owner.clone(),
            constructor,
            scopes: Vec::new(),
            injected_members: Vec::new(),
            origin: DeclarationOrigin::Local,
        }
    }

    pub fn scoped(mut self, scope: Annotation) -> Self {
        self.scopes.push(scope);
        self
    }

    pub fn with_member(mut self, member: FunctionDecl) -> Self {
        self.injected_members.push(member);
        self
    }

    pub fn with_origin(mut self, origin: DeclarationOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn is_assisted(&self) -> bool {
        self.constructor.parameters.iter().any(|p| p.assisted.is_some())
    }
}

/// How a provider function contributes to a multibinding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MultibindingContribution {
    IntoSet,
    ElementsIntoSet,
    IntoMap,
}

/// A `@MapKey` annotation on a map contribution
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapKey {
    pub annotation: Annotation,
    pub key_type: TypeRef,
    /// Rendered key value
    pub value: String,
}

impl MapKey {
    pub fn new(annotation: Annotation, key_type: TypeRef, value: impl Into<String>) -> Self {
        Self {
            annotation,
            key_type,
            value: value.into(),
        }
    }
}

/// A `@Provides` or `@Binds` function declared in a graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDecl {
    pub function: FunctionDecl,
    pub scopes: Vec<Annotation>,
    pub contribution: Option<MultibindingContribution>,
    pub map_keys: Vec<MapKey>,
    /// `@Binds` functions alias their return type to their single parameter or receiver
    pub binds: bool,
}

impl ProviderDecl {
    pub fn provides(function: FunctionDecl) -> Self {
        Self {
            function,
            scopes: Vec::new(),
            contribution: None,
            map_keys: Vec::new(),
            binds: false,
        }
    }

    pub fn binds(function: FunctionDecl) -> Self {
        Self {
            binds: true,
            ..Self::provides(function)
        }
    }

    pub fn scoped(mut self, scope: Annotation) -> Self {
        self.scopes.push(scope);
        self
    }

    pub fn into_set(mut self) -> Self {
        self.contribution = Some(MultibindingContribution::IntoSet);
        self
    }

    pub fn elements_into_set(mut self) -> Self {
        self.contribution = Some(MultibindingContribution::ElementsIntoSet);
        self
    }

    pub fn into_map(mut self, key: MapKey) -> Self {
        self.contribution = Some(MultibindingContribution::IntoMap);
        self.map_keys.push(key);
        self
    }
}

/// An `@AssistedFactory` interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistedFactoryDecl {
    pub class_id: ClassId,
    /// Abstract functions, exactly one is expected
    pub functions: Vec<FunctionDecl>,
}

/// An abstract graph member exposing a binding, e.g. `val repository: Repository`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorDecl {
    pub function: FunctionDecl,
}

/// An abstract `fun inject(target: Foo)` member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectorDecl {
    pub function: FunctionDecl,
}

/// A `@Multibinds` declaration, allowing the multibinding to be empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultibindsDecl {
    pub function: FunctionDecl,
}

/// The factory interface creating a graph instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatorDecl {
    pub class_id: ClassId,
    pub function: FunctionDecl,
}

/// A `@DependencyGraph` interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphDeclaration {
    pub class_id: ClassId,
    pub scopes: Vec<Annotation>,
    pub providers: Vec<ProviderDecl>,
    pub multibinds: Vec<MultibindsDecl>,
    pub accessors: Vec<AccessorDecl>,
    pub injectors: Vec<InjectorDecl>,
    pub creator: Option<CreatorDecl>,
}

impl GraphDeclaration {
    pub fn new(class_id: impl Into<ClassId>) -> Self {
        Self {
            class_id: class_id.into(),
            scopes: Vec::new(),
            providers: Vec::new(),
            multibinds: Vec::new(),
            accessors: Vec::new(),
            injectors: Vec::new(),
            creator: None,
        }
    }

    pub fn scoped(mut self, scope: Annotation) -> Self {
        self.scopes.push(scope);
        self
    }

    pub fn with_provider(mut self, provider: ProviderDecl) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn with_multibinds(mut self, function: FunctionDecl) -> Self {
        self.multibinds.push(MultibindsDecl { function });
        self
    }

    /// Adds an accessor `name(): ty` owned by this graph
    pub fn with_accessor(mut self, name: &str, ty: TypeRef) -> Self {
        let function = FunctionDecl::new(CallableId::new(self.class_id.clone(), name), ty);
        self.accessors.push(AccessorDecl { function });
        self
    }

    pub fn with_accessor_decl(mut self, function: FunctionDecl) -> Self {
        self.accessors.push(AccessorDecl { function });
        self
    }

    /// Adds an injector `name(target: ty)` owned by this graph
    pub fn with_injector(mut self, name: &str, target: TypeRef) -> Self {
        let function = FunctionDecl::new(
            CallableId::new(self.class_id.clone(), name),
            TypeRef::of("kotlin.Unit"),
        )
        .with_parameter(ParameterDecl::new("target", target));
        self.injectors.push(InjectorDecl { function });
        self
    }

    pub fn with_creator(mut self, creator: CreatorDecl) -> Self {
        self.creator = Some(creator);
        self
    }

    /// Every abstract member the generated implementation has to implement
    pub fn abstract_members(&self) -> impl Iterator<Item = &CallableId> {
        self.accessors
            .iter()
            .map(|accessor| &accessor.function.callable_id)
            .chain(self.injectors.iter().map(|injector| &injector.function.callable_id))
    }
}
