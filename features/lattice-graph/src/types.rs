use std::{
    cmp::Ordering,
    collections::BTreeSet,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use lattice_config::LatticeOptions;

pub const LATTICE_PROVIDER: &str = "lattice.Provider";
pub const KOTLIN_LAZY: &str = "kotlin.Lazy";
pub const KOTLIN_SET: &str = "kotlin.collections.Set";
pub const KOTLIN_MAP: &str = "kotlin.collections.Map";
pub const LATTICE_MEMBERS_INJECTOR: &str = "lattice.MembersInjector";
pub const MULTIBINDING_ELEMENT: &str = "lattice.internal.MultibindingElement";

/// Fully qualified name of a class, e.g. `kotlin.collections.Set`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(Arc<str>);

impl ClassId {
    pub fn new(fq_name: impl AsRef<str>) -> Self {
        Self(Arc::from(fq_name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Simple name without the package
    pub fn short_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}
impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
impl From<&str> for ClassId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A type as written in a declaration, e.g. `Map<String, Provider<Foo>>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub class_id: ClassId,
    pub arguments: Vec<TypeRef>,
    pub nullable: bool,
}

impl TypeRef {
    pub fn of(class_id: impl Into<ClassId>) -> Self {
        Self::generic(class_id, Vec::new())
    }

    pub fn generic(class_id: impl Into<ClassId>, arguments: Vec<TypeRef>) -> Self {
        Self {
            class_id: class_id.into(),
            arguments,
            nullable: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn argument(&self, index: usize) -> Option<&TypeRef> {
        self.arguments.get(index)
    }

    pub fn render(&self, short: bool) -> String {
        let mut rendered = String::new();
        self.render_into(&mut rendered, short);
        rendered
    }

    fn render_into(&self, out: &mut String, short: bool) {
        if short {
            out.push_str(self.class_id.short_name());
        } else {
            out.push_str(self.class_id.as_str());
        }
        if !self.arguments.is_empty() {
            out.push('<');
            for (index, argument) in self.arguments.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                argument.render_into(out, short);
            }
            out.push('>');
        }
        if self.nullable {
            out.push('?');
        }
    }
}
impl PartialOrd for TypeRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for TypeRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.render(false).cmp(&other.render(false))
    }
}
impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

/// An annotation instance: qualifiers, scopes and map keys
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Annotation {
    pub class_id: ClassId,
    /// Rendered arguments, e.g. `"name"` or `AppScope::class`
    pub arguments: Vec<String>,
}

impl Annotation {
    pub fn new(class_id: impl Into<ClassId>) -> Self {
        Self {
            class_id: class_id.into(),
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    pub fn render(&self, short: bool) -> String {
        let name = if short {
            self.class_id.short_name()
        } else {
            self.class_id.as_str()
        };
        if self.arguments.is_empty() {
            format!("@{name}")
        } else {
            format!("@{name}({})", self.arguments.join(", "))
        }
    }
}
impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

/// Canonical identity of a binding target: a type and an optional qualifier.
///
/// Keys are compared, hashed and ordered by their rendered form, which is computed once.
#[derive(Clone)]
pub struct TypeKey {
    rendered: Arc<str>,
    ty: TypeRef,
    qualifier: Option<Annotation>,
}

impl TypeKey {
    pub fn new(ty: TypeRef, qualifier: Option<Annotation>) -> Self {
        let rendered = Self::render_parts(&ty, qualifier.as_ref(), false);
        Self {
            rendered: Arc::from(rendered),
            ty,
            qualifier,
        }
    }

    pub fn plain(ty: TypeRef) -> Self {
        Self::new(ty, None)
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn qualifier(&self) -> Option<&Annotation> {
        self.qualifier.as_ref()
    }

    pub fn as_str(&self) -> &str {
        &self.rendered
    }

    pub fn render(&self, short: bool) -> String {
        if short {
            Self::render_parts(&self.ty, self.qualifier.as_ref(), true)
        } else {
            self.rendered.to_string()
        }
    }

    fn render_parts(ty: &TypeRef, qualifier: Option<&Annotation>, short: bool) -> String {
        match qualifier {
            Some(qualifier) => format!("{} {}", qualifier.render(short), ty.render(short)),
            None => ty.render(short),
        }
    }
}
impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.rendered == other.rendered
    }
}
impl Eq for TypeKey {}
impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rendered.hash(state);
    }
}
impl PartialOrd for TypeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for TypeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rendered.cmp(&other.rendered)
    }
}
impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeKey").field(&&*self.rendered).finish()
    }
}
impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

/// A [`TypeKey`] as it appears at an injection site, e.g. `Provider<Foo>` or `Lazy<Foo>`
#[derive(Debug, Clone)]
pub struct ContextualTypeKey {
    type_key: TypeKey,
    /// Declared type when it was unwrapped, used for rendering
    raw_type: Option<TypeRef>,
    is_wrapped_in_provider: bool,
    is_wrapped_in_lazy: bool,
    is_lazy_wrapped_in_provider: bool,
    has_default: bool,
}

impl ContextualTypeKey {
    /// Derives the contextual key of a declared type.
    ///
    /// A known Provider or Lazy wrapper is unwrapped once, `Provider<Lazy<T>>` twice.
    /// Any other nesting stays part of the raw type.
    pub fn from_type(
        ty: &TypeRef,
        qualifier: Option<Annotation>,
        has_default: bool,
        symbols: &Symbols,
    ) -> Self {
        let is_wrapped_in_provider = symbols.is_provider(&ty.class_id) && ty.arguments.len() == 1;
        let is_wrapped_in_lazy = symbols.is_lazy(&ty.class_id) && ty.arguments.len() == 1;
        let is_lazy_wrapped_in_provider = is_wrapped_in_provider
            && ty.arguments[0].arguments.len() == 1
            && symbols.is_lazy(&ty.arguments[0].class_id);

        let unwrapped = if is_lazy_wrapped_in_provider {
            &ty.arguments[0].arguments[0]
        } else if is_wrapped_in_provider || is_wrapped_in_lazy {
            &ty.arguments[0]
        } else {
            ty
        };

        Self {
            type_key: TypeKey::new(unwrapped.clone(), qualifier),
            raw_type: (is_wrapped_in_provider || is_wrapped_in_lazy).then(|| ty.clone()),
            is_wrapped_in_provider,
            is_wrapped_in_lazy,
            is_lazy_wrapped_in_provider,
            has_default,
        }
    }

    /// Key requested directly, without any wrapper
    pub fn plain(type_key: TypeKey) -> Self {
        Self {
            type_key,
            raw_type: None,
            is_wrapped_in_provider: false,
            is_wrapped_in_lazy: false,
            is_lazy_wrapped_in_provider: false,
            has_default: false,
        }
    }

    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    pub fn is_wrapped_in_provider(&self) -> bool {
        self.is_wrapped_in_provider
    }

    pub fn is_wrapped_in_lazy(&self) -> bool {
        self.is_wrapped_in_lazy
    }

    pub fn is_lazy_wrapped_in_provider(&self) -> bool {
        self.is_lazy_wrapped_in_provider
    }

    pub fn has_default(&self) -> bool {
        self.has_default
    }

    /// Requests through a Provider or Lazy do not construct the value immediately
    pub fn is_deferrable(&self) -> bool {
        self.is_wrapped_in_provider || self.is_wrapped_in_lazy
    }

    pub fn wrapping(&self) -> Wrapping {
        if self.is_lazy_wrapped_in_provider {
            Wrapping::ProviderOfLazy
        } else if self.is_wrapped_in_provider {
            Wrapping::Provider
        } else if self.is_wrapped_in_lazy {
            Wrapping::Lazy
        } else {
            Wrapping::Instance
        }
    }

    pub fn render(&self, short: bool) -> String {
        match &self.raw_type {
            Some(raw) => TypeKey::render_parts(raw, self.type_key.qualifier(), short),
            None => self.type_key.render(short),
        }
    }

    fn ordering_tuple(&self) -> (&TypeKey, bool, bool, bool, bool) {
        (
            &self.type_key,
            self.is_wrapped_in_provider,
            self.is_wrapped_in_lazy,
            self.is_lazy_wrapped_in_provider,
            self.has_default,
        )
    }
}
impl PartialEq for ContextualTypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.ordering_tuple() == other.ordering_tuple()
    }
}
impl Eq for ContextualTypeKey {}
impl Hash for ContextualTypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ordering_tuple().hash(state);
    }
}
impl PartialOrd for ContextualTypeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ContextualTypeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordering_tuple().cmp(&other.ordering_tuple())
    }
}
impl fmt::Display for ContextualTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

/// Shape in which a dependency is handed to its consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Wrapping {
    Instance,
    Provider,
    Lazy,
    ProviderOfLazy,
}

/// Well known class ids the engine needs to recognize
#[derive(Debug, Clone)]
pub struct Symbols {
    provider_types: BTreeSet<ClassId>,
    lazy_types: BTreeSet<ClassId>,
    pub provider: ClassId,
    pub set: ClassId,
    pub map: ClassId,
    pub members_injector: ClassId,
    pub multibinding_element: ClassId,
}
impl Default for Symbols {
    fn default() -> Self {
        Self::from_options(&LatticeOptions::default())
    }
}

impl Symbols {
    pub fn from_options(options: &LatticeOptions) -> Self {
        let provider = ClassId::new(LATTICE_PROVIDER);
        let mut provider_types = BTreeSet::from([provider.clone()]);
        provider_types.extend(options.interop.provider_types.iter().map(ClassId::new));

        let mut lazy_types = BTreeSet::from([ClassId::new(KOTLIN_LAZY)]);
        lazy_types.extend(options.interop.lazy_types.iter().map(ClassId::new));

        Self {
            provider_types,
            lazy_types,
            provider,
            set: ClassId::new(KOTLIN_SET),
            map: ClassId::new(KOTLIN_MAP),
            members_injector: ClassId::new(LATTICE_MEMBERS_INJECTOR),
            multibinding_element: ClassId::new(MULTIBINDING_ELEMENT),
        }
    }

    pub fn is_provider(&self, class_id: &ClassId) -> bool {
        self.provider_types.contains(class_id)
    }

    pub fn is_lazy(&self, class_id: &ClassId) -> bool {
        self.lazy_types.contains(class_id)
    }

    pub fn set_of(&self, element: TypeRef) -> TypeRef {
        TypeRef::generic(self.set.clone(), vec![element])
    }

    pub fn map_of(&self, key: TypeRef, value: TypeRef) -> TypeRef {
        TypeRef::generic(self.map.clone(), vec![key, value])
    }

    pub fn provider_of(&self, ty: TypeRef) -> TypeRef {
        TypeRef::generic(self.provider.clone(), vec![ty])
    }

    pub fn members_injector_of(&self, ty: TypeRef) -> TypeRef {
        TypeRef::generic(self.members_injector.clone(), vec![ty])
    }
}
