//! Lattice Graph is the compile time binding graph engine of the Lattice dependency injection
//! compiler.
//!
//! For every `@DependencyGraph` declaration it decides how each requested type is provided,
//! validates the result and plans the fields of the generated graph implementation.
//!
//! # Examples
//!
//! ```rust
//! use lattice_config::LatticeOptions;
//! use lattice_graph::{
//!     declarations::{FunctionDecl, GraphDeclaration, InjectableClass, ParameterDecl},
//!     source::DeclarationIndex,
//!     transformer::DependencyGraphTransformer,
//!     types::{ClassId, TypeRef},
//! };
//!
//! let index = DeclarationIndex::new()
//!     .with_injectable(InjectableClass::new(
//!         FunctionDecl::constructor("app.Repository")
//!             .with_parameter(ParameterDecl::new("api", TypeRef::of("app.Api"))),
//!     ))
//!     .with_injectable(InjectableClass::new(FunctionDecl::constructor("app.Api")))
//!     .with_graph(GraphDeclaration::new("app.AppGraph").with_accessor("repository", TypeRef::of("app.Repository")));
//!
//! let mut transformer = DependencyGraphTransformer::new(&index, LatticeOptions::default());
//! let implementation = transformer.transform(&ClassId::new("app.AppGraph")).unwrap();
//!
//! assert_eq!(
//!     implementation.accessors[0].body.to_string(),
//!     "Repository_Factory.create(Api_Factory.create()).invoke()"
//! );
//! ```
//!
//! Lattice Graph consists of the following components:
//!
//! 1. Types - type keys and the shape a type is requested in
//! 2. Declarations - what the compiler front end found, looked up through [`source::BindingCandidates`]
//! 3. Bindings - how a single type key is satisfied
//! 4. BindingGraph - registration, on demand creation and validation of bindings
//! 5. Planner - which bindings become fields, and in which order
//! 6. Codegen - provider shaped expressions for each binding
//! 7. Transformer - the compilation session running all of the above per graph

pub mod binding;
pub mod codegen;
pub mod declarations;
pub mod errors;
pub mod graph;
pub mod node;
pub mod parameters;
pub mod plan;
pub mod source;
pub mod stack;
pub mod transformer;
pub mod types;

pub use binding::Binding;
pub use errors::{BindingGraphError, LatticeErrors, StructuralError};
pub use graph::BindingGraph;
pub use stack::BindingStack;
pub use transformer::{DependencyGraphTransformer, GraphImplementation, GraphOutcome};
pub use types::{ContextualTypeKey, TypeKey};
