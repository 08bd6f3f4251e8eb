use std::collections::HashMap;

use crate::{
    declarations::{AssistedFactoryDecl, FunctionDecl, GraphDeclaration, InjectableClass},
    types::ClassId,
};

/// Source of binding candidates, implemented by the annotation discovery layer
pub trait BindingCandidates {
    /// The `@Inject` constructor class with this id, if any
    fn injectable_class(&self, class_id: &ClassId) -> Option<&InjectableClass>;
    /// Injected members of a class, whether or not it has an `@Inject` constructor
    fn injected_members(&self, class_id: &ClassId) -> Option<&[FunctionDecl]>;
    /// The `@AssistedFactory` interface with this id, if any
    fn assisted_factory(&self, class_id: &ClassId) -> Option<&AssistedFactoryDecl>;
    /// The `@DependencyGraph` declaration with this id, if any
    fn graph_declaration(&self, class_id: &ClassId) -> Option<&GraphDeclaration>;
    /// All graph declarations in a stable order
    fn graph_declarations(&self) -> Vec<&GraphDeclaration>;
}

/// In memory [`BindingCandidates`], filled builder style
#[derive(Debug, Default, Clone)]
pub struct DeclarationIndex {
    injectables: HashMap<ClassId, InjectableClass>,
    members: HashMap<ClassId, Vec<FunctionDecl>>,
    assisted_factories: HashMap<ClassId, AssistedFactoryDecl>,
    graphs: HashMap<ClassId, GraphDeclaration>,
    /// Registration order of graphs
    graph_order: Vec<ClassId>,
}

impl DeclarationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_injectable(mut self, class: InjectableClass) -> Self {
        if !class.injected_members.is_empty() {
            self.members
                .insert(class.class_id.clone(), class.injected_members.clone());
        }
        self.injectables.insert(class.class_id.clone(), class);
        self
    }

    /// A class that is only member injected, e.g. through an injector function
    pub fn with_members(mut self, class_id: impl Into<ClassId>, members: Vec<FunctionDecl>) -> Self {
        self.members.insert(class_id.into(), members);
        self
    }

    pub fn with_assisted_factory(mut self, factory: AssistedFactoryDecl) -> Self {
        self.assisted_factories
            .insert(factory.class_id.clone(), factory);
        self
    }

    pub fn with_graph(mut self, graph: GraphDeclaration) -> Self {
        let class_id = graph.class_id.clone();
        if self.graphs.insert(class_id.clone(), graph).is_none() {
            self.graph_order.push(class_id);
        }
        self
    }
}

impl BindingCandidates for DeclarationIndex {
    fn injectable_class(&self, class_id: &ClassId) -> Option<&InjectableClass> {
        self.injectables.get(class_id)
    }

    fn injected_members(&self, class_id: &ClassId) -> Option<&[FunctionDecl]> {
        self.members.get(class_id).map(Vec::as_slice)
    }

    fn assisted_factory(&self, class_id: &ClassId) -> Option<&AssistedFactoryDecl> {
        self.assisted_factories.get(class_id)
    }

    fn graph_declaration(&self, class_id: &ClassId) -> Option<&GraphDeclaration> {
        self.graphs.get(class_id)
    }

    fn graph_declarations(&self) -> Vec<&GraphDeclaration> {
        self.graph_order
            .iter()
            .filter_map(|class_id| self.graphs.get(class_id))
            .collect()
    }
}
