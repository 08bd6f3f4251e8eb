use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::types::{ClassId, TypeKey};

/// Errors in the shape of declarations, found while walking the graph
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("[Lattice/MultipleScopes] '{class}' declares more than one scope: {scopes}")]
    #[diagnostic(code(lattice::multiple_scopes))]
    MultipleScopes { class: ClassId, scopes: String },

    #[error("[Lattice/MultipleQualifiers] '{site}' has more than one qualifier: {qualifiers}")]
    #[diagnostic(code(lattice::multiple_qualifiers))]
    MultipleQualifiers { site: String, qualifiers: String },

    #[error("[Lattice/MissingUpstreamFactory] '{class}' is injectable but its module did not generate a factory for it")]
    #[diagnostic(
        code(lattice::missing_upstream_factory),
        help("Apply the Lattice compiler plugin to the module declaring this class")
    )]
    MissingUpstreamFactory { class: ClassId },

    #[error("[Lattice/AssistedFactoryWithoutSingleFunction] '{factory}' must declare exactly one abstract function, found {count}")]
    #[diagnostic(code(lattice::assisted_factory_functions))]
    AssistedFactoryWithoutSingleFunction { factory: ClassId, count: usize },

    #[error("[Lattice/AssistedTargetNotInjectable] '{factory}' creates '{target}' which has no assisted @Inject constructor")]
    #[diagnostic(code(lattice::assisted_target))]
    AssistedTargetNotInjectable { factory: ClassId, target: String },

    #[error("[Lattice/AssistedParametersMismatch] '{factory}' parameters [{actual}] do not match the assisted parameters of '{target}' [{expected}]")]
    #[diagnostic(code(lattice::assisted_parameters))]
    AssistedParametersMismatch {
        factory: ClassId,
        target: String,
        expected: String,
        actual: String,
    },

    #[error("[Lattice/AssistedInjectedRequestedDirectly] '{key}' uses assisted injection and can only be requested through its @AssistedFactory\n{stack}")]
    #[diagnostic(code(lattice::assisted_requested_directly))]
    AssistedInjectedRequestedDirectly { key: TypeKey, stack: String },

    #[error("[Lattice/MissingMapKey] '{function}' contributes into a map but declares no @MapKey")]
    #[diagnostic(code(lattice::missing_map_key))]
    MissingMapKey { function: String },

    #[error("[Lattice/MultipleMapKeys] '{function}' declares more than one @MapKey")]
    #[diagnostic(code(lattice::multiple_map_keys))]
    MultipleMapKeys { function: String },

    #[error("[Lattice/DuplicateMapKey] '{key}' has more than one contribution for map key {map_key}: {sites}")]
    #[diagnostic(code(lattice::duplicate_map_key))]
    DuplicateMapKey {
        key: TypeKey,
        map_key: String,
        sites: String,
    },

    #[error("[Lattice/InvalidMultibindingType] '{function}' returns '{ty}' which cannot be used for {reason}")]
    #[diagnostic(code(lattice::invalid_multibinding_type))]
    InvalidMultibindingType {
        function: String,
        ty: String,
        reason: String,
    },

    #[error("[Lattice/InvalidCreatorParameter] Parameter '{parameter}' of '{graph}'s creator must be annotated @BindsInstance or be a dependency graph")]
    #[diagnostic(code(lattice::invalid_creator_parameter))]
    InvalidCreatorParameter { graph: ClassId, parameter: String },

    #[error("[Lattice/NotADependencyGraph] '{class}' is not annotated @DependencyGraph")]
    #[diagnostic(code(lattice::not_a_dependency_graph))]
    NotADependencyGraph { class: ClassId },

    #[error("[Lattice/InvalidBindsFunction] '{function}' {reason}")]
    #[diagnostic(code(lattice::invalid_binds_function))]
    InvalidBindsFunction { function: String, reason: String },

    #[error("[Lattice/PublicProvider] Provider function '{function}' should be private")]
    #[diagnostic(
        code(lattice::public_provider),
        help("Provider functions are called by generated code only, make them private")
    )]
    PublicProvider { function: String },
}

/// Issues with the binding graph of a single graph declaration
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum BindingGraphError {
    #[error("[Lattice/DuplicateBinding] Multiple bindings found for {key}: {reason}\n{stack}")]
    #[diagnostic(code(lattice::duplicate_binding))]
    DuplicateBinding {
        key: TypeKey,
        reason: String,
        stack: String,
    },

    #[error("[Lattice/MissingBinding] Cannot find an @Inject constructor or @Provides-annotated function/property for: {key}\n{stack}")]
    #[diagnostic(
        code(lattice::missing_binding),
        help("Add an @Inject constructor to the class or provide it from the graph")
    )]
    MissingBinding { key: String, stack: String },

    #[error("[Lattice/DependencyCycle] Found a dependency cycle: {trace}\n{stack}")]
    #[diagnostic(
        code(lattice::dependency_cycle),
        help("Break the cycle by requesting one of the types as Provider<T> or Lazy<T>")
    )]
    DependencyCycle { trace: String, stack: String },

    #[error("[Lattice/GraphDependencyCycle] Dependency graph dependency cycle detected: {trace}")]
    #[diagnostic(code(lattice::graph_dependency_cycle))]
    GraphDependencyCycle { trace: String },

    #[error("[Lattice/IncompatiblyScopedBindings] {graph} (scopes {graph_scopes}) may not reference bindings from different scopes: {key} (scoped to {scope})\n{stack}")]
    #[diagnostic(code(lattice::incompatibly_scoped_bindings))]
    IncompatiblyScopedBindings {
        graph: ClassId,
        graph_scopes: String,
        key: TypeKey,
        scope: String,
        stack: String,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Structural(#[from] StructuralError),
}

impl BindingGraphError {
    /// Stable tag at the start of the message, e.g. `DependencyCycle`
    pub fn tag(&self) -> &'static str {
        match self {
            BindingGraphError::DuplicateBinding { .. } => "DuplicateBinding",
            BindingGraphError::MissingBinding { .. } => "MissingBinding",
            BindingGraphError::DependencyCycle { .. } => "DependencyCycle",
            BindingGraphError::GraphDependencyCycle { .. } => "GraphDependencyCycle",
            BindingGraphError::IncompatiblyScopedBindings { .. } => "IncompatiblyScopedBindings",
            BindingGraphError::Structural(error) => error.tag(),
        }
    }
}

impl StructuralError {
    pub fn tag(&self) -> &'static str {
        match self {
            StructuralError::MultipleScopes { .. } => "MultipleScopes",
            StructuralError::MultipleQualifiers { .. } => "MultipleQualifiers",
            StructuralError::MissingUpstreamFactory { .. } => "MissingUpstreamFactory",
            StructuralError::AssistedFactoryWithoutSingleFunction { .. } => {
                "AssistedFactoryWithoutSingleFunction"
            }
            StructuralError::AssistedTargetNotInjectable { .. } => "AssistedTargetNotInjectable",
            StructuralError::AssistedParametersMismatch { .. } => "AssistedParametersMismatch",
            StructuralError::AssistedInjectedRequestedDirectly { .. } => {
                "AssistedInjectedRequestedDirectly"
            }
            StructuralError::MissingMapKey { .. } => "MissingMapKey",
            StructuralError::MultipleMapKeys { .. } => "MultipleMapKeys",
            StructuralError::DuplicateMapKey { .. } => "DuplicateMapKey",
            StructuralError::InvalidMultibindingType { .. } => "InvalidMultibindingType",
            StructuralError::InvalidCreatorParameter { .. } => "InvalidCreatorParameter",
            StructuralError::NotADependencyGraph { .. } => "NotADependencyGraph",
            StructuralError::InvalidBindsFunction { .. } => "InvalidBindsFunction",
            StructuralError::PublicProvider { .. } => "PublicProvider",
        }
    }
}

/// All issues collected for one graph declaration
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
#[diagnostic(code(lattice::graph_errors))]
pub struct LatticeErrors {
    #[related]
    pub errors: Vec<BindingGraphError>,
}
impl std::fmt::Display for LatticeErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("The binding graph had one or more errors:".to_string());
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}
impl From<BindingGraphError> for LatticeErrors {
    fn from(error: BindingGraphError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}
impl From<StructuralError> for LatticeErrors {
    fn from(error: StructuralError) -> Self {
        BindingGraphError::from(error).into()
    }
}

impl LatticeErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn tags(&self) -> Vec<&'static str> {
        self.errors.iter().map(BindingGraphError::tag).collect()
    }
}

/// Errors when writing the binding graph reports of a graph
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize the emission plan: {0}")]
    Json(#[from] serde_json::Error),
}
