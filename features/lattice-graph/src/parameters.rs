use std::cmp::Ordering;

use crate::{
    declarations::{CallableId, FunctionDecl, ParameterDecl},
    errors::StructuralError,
    stack::BindingStackEntry,
    types::{Annotation, ClassId, ContextualTypeKey, Symbols, TypeKey, TypeRef},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParameterKind {
    /// Receiver a function is dispatched on
    Instance,
    ExtensionReceiver,
    Value,
}

/// A resolved parameter of a constructor, provider, member injection or creator
#[derive(Debug, Clone)]
pub struct Parameter {
    pub kind: ParameterKind,
    pub name: String,
    pub contextual_key: ContextualTypeKey,
    pub is_assisted: bool,
    /// Empty for the default `@Assisted` identifier
    pub assisted_identifier: String,
    pub is_binds_instance: bool,
    /// The receiver is the graph itself, nothing needs to be resolved
    pub is_graph_instance: bool,
    /// Where this parameter is injected, pushed while resolving it
    pub binding_stack_entry: BindingStackEntry,
}

impl Parameter {
    /// Resolves a declared parameter of `function`
    pub fn from_decl(
        kind: ParameterKind,
        decl: &ParameterDecl,
        function: &CallableId,
        symbols: &Symbols,
    ) -> Result<Self, StructuralError> {
        let site = format!("{function}.{}", decl.name);
        let qualifier = single_qualifier(&decl.qualifiers, &site)?;
        let contextual_key =
            ContextualTypeKey::from_type(&decl.ty, qualifier, decl.has_default, symbols);
        let binding_stack_entry =
            BindingStackEntry::injected_at(contextual_key.clone(), function, Some(&decl.name));

        Ok(Self {
            kind,
            name: decl.name.clone(),
            contextual_key,
            is_assisted: decl.assisted.is_some(),
            assisted_identifier: decl.assisted.clone().unwrap_or_default(),
            is_binds_instance: decl.is_binds_instance,
            is_graph_instance: false,
            binding_stack_entry,
        })
    }

    /// The receiver a function is called on
    pub fn instance(receiver: &TypeRef, function: &CallableId, graph: Option<&ClassId>) -> Self {
        let contextual_key = ContextualTypeKey::plain(TypeKey::plain(receiver.clone()));
        Self {
            kind: ParameterKind::Instance,
            name: "instance".to_string(),
            binding_stack_entry: BindingStackEntry::injected_at(
                contextual_key.clone(),
                function,
                None,
            ),
            contextual_key,
            is_assisted: false,
            assisted_identifier: String::new(),
            is_binds_instance: false,
            is_graph_instance: graph == Some(&receiver.class_id),
        }
    }

    /// A parameter of an injected member, e.g. the value of an `@Inject lateinit var`
    pub fn member(
        decl: &ParameterDecl,
        member: &CallableId,
        symbols: &Symbols,
    ) -> Result<Self, StructuralError> {
        let mut parameter = Self::from_decl(ParameterKind::Value, decl, member, symbols)?;
        parameter.binding_stack_entry =
            BindingStackEntry::member_injected_at(parameter.contextual_key.clone(), member);
        Ok(parameter)
    }

    /// Whether resolving this parameter requires a binding from the graph
    pub fn requires_binding(&self) -> bool {
        !self.is_assisted && !self.is_graph_instance
    }

    fn ordering_tuple(&self) -> (ParameterKind, &str, &ContextualTypeKey, bool, &str) {
        (
            self.kind,
            &self.name,
            &self.contextual_key,
            self.is_assisted,
            &self.assisted_identifier,
        )
    }
}
impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.ordering_tuple() == other.ordering_tuple()
            && self.is_binds_instance == other.is_binds_instance
            && self.is_graph_instance == other.is_graph_instance
    }
}
impl Eq for Parameter {}
impl PartialOrd for Parameter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Parameter {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordering_tuple()
            .cmp(&other.ordering_tuple())
            .then(self.is_binds_instance.cmp(&other.is_binds_instance))
            .then(self.is_graph_instance.cmp(&other.is_graph_instance))
    }
}

/// Parameters of a callable: optional receivers followed by value parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Parameters {
    pub callable_id: Option<CallableId>,
    pub instance: Option<Parameter>,
    pub extension_receiver: Option<Parameter>,
    pub value_parameters: Vec<Parameter>,
}

impl Parameters {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolves all parameters of `function`.
    ///
    /// A dispatch receiver matching `graph` is marked as the graph instance.
    pub fn for_function(
        function: &FunctionDecl,
        graph: Option<&ClassId>,
        symbols: &Symbols,
    ) -> Result<Self, StructuralError> {
        let callable_id = &function.callable_id;
        let instance = function
            .dispatch_receiver
            .as_ref()
            .map(|receiver| Parameter::instance(receiver, callable_id, graph));
        let extension_receiver = function
            .extension_receiver
            .as_ref()
            .map(|receiver| {
                Parameter::from_decl(ParameterKind::ExtensionReceiver, receiver, callable_id, symbols)
            })
            .transpose()?;
        let value_parameters = function
            .parameters
            .iter()
            .map(|decl| Parameter::from_decl(ParameterKind::Value, decl, callable_id, symbols))
            .collect::<Result<_, _>>()?;

        Ok(Self {
            callable_id: Some(callable_id.clone()),
            instance,
            extension_receiver,
            value_parameters,
        })
    }

    /// Parameters of injected members, in declaration order
    pub fn for_members(members: &[FunctionDecl], symbols: &Symbols) -> Result<Self, StructuralError> {
        let mut value_parameters = Vec::new();
        for member in members {
            for decl in &member.parameters {
                value_parameters.push(Parameter::member(decl, &member.callable_id, symbols)?);
            }
        }
        Ok(Self {
            callable_id: None,
            instance: None,
            extension_receiver: None,
            value_parameters,
        })
    }

    /// Extension receiver followed by the value parameters
    pub fn non_instance_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.extension_receiver
            .iter()
            .chain(self.value_parameters.iter())
    }

    pub fn all_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.instance.iter().chain(self.non_instance_parameters())
    }

    /// Parameters that have to be satisfied from the graph
    pub fn dependencies(&self) -> impl Iterator<Item = &Parameter> {
        self.all_parameters().filter(|p| p.requires_binding())
    }

    pub fn assisted_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.non_instance_parameters().filter(|p| p.is_assisted)
    }

    pub fn is_empty(&self) -> bool {
        self.instance.is_none()
            && self.extension_receiver.is_none()
            && self.value_parameters.is_empty()
    }

    /// Folds `other` into these parameters.
    ///
    /// Receivers are kept from `self`, value parameters are appended.
    #[must_use]
    pub fn merge_with(&self, other: &Parameters) -> Parameters {
        let mut merged = self.clone();
        merged
            .value_parameters
            .extend(other.value_parameters.iter().cloned());
        merged
    }
}

/// At most one qualifier is allowed on a declaration
pub(crate) fn single_qualifier(
    qualifiers: &[Annotation],
    site: &str,
) -> Result<Option<Annotation>, StructuralError> {
    match qualifiers {
        [] => Ok(None),
        [qualifier] => Ok(Some(qualifier.clone())),
        _ => Err(StructuralError::MultipleQualifiers {
            site: site.to_string(),
            qualifiers: qualifiers
                .iter()
                .map(|q| q.render(false))
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}
