use lattice_config::{LatticeOptions, Severity};
use lattice_graph::{
    declarations::{
        AssistedFactoryDecl, CallableId, CreatorDecl, FunctionDecl, GraphDeclaration, InjectableClass, MapKey,
        ParameterDecl, ProviderDecl, Visibility,
    },
    source::DeclarationIndex,
    transformer::{DependencyGraphTransformer, GraphImplementation, GraphOutcome},
    types::{Annotation, ClassId, Symbols, TypeRef},
};
use pretty_assertions::assert_eq;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn injectable(name: &str, dependencies: &[(&str, TypeRef)]) -> InjectableClass {
    let mut constructor = FunctionDecl::constructor(name);
    for (parameter, ty) in dependencies {
        constructor = constructor.with_parameter(ParameterDecl::new(*parameter, ty.clone()));
    }
    InjectableClass::new(constructor)
}

fn provides(graph: &str, name: &str, ty: TypeRef) -> FunctionDecl {
    FunctionDecl::new(CallableId::new(graph, name), ty).with_dispatch_receiver(TypeRef::of(graph))
}

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

fn transform(index: &DeclarationIndex, graph: &str) -> GraphImplementation {
    init_tracing();
    let mut transformer = DependencyGraphTransformer::new(index, LatticeOptions::default());
    match transformer.transform(&ClassId::new(graph)) {
        Ok(implementation) => implementation,
        Err(errors) => panic!("{errors}"),
    }
}

fn emissions(implementation: &GraphImplementation) -> Vec<String> {
    implementation.emissions.iter().map(ToString::to_string).collect()
}

fn accessors(implementation: &GraphImplementation) -> Vec<String> {
    implementation
        .accessors
        .iter()
        .map(|accessor| accessor.body.to_string())
        .collect()
}

#[test]
fn test_scoped_binding_becomes_a_double_checked_field() {
    let scope = Annotation::new("app.AppScope");
    let clock = Symbols::default().provider_of(TypeRef::of("app.Clock"));
    let index = DeclarationIndex::new()
        .with_injectable(
            injectable("app.Repository", &[("api", TypeRef::of("app.Api")), ("clock", clock)])
                .scoped(scope.clone()),
        )
        .with_injectable(injectable("app.Api", &[]))
        .with_graph(
            GraphDeclaration::new("app.AppGraph")
                .scoped(scope)
                .with_provider(ProviderDecl::provides(provides(
                    "app.AppGraph",
                    "provideClock",
                    TypeRef::of("app.Clock"),
                )))
                .with_accessor("repository", TypeRef::of("app.Repository")),
        );

    let implementation = transform(&index, "app.AppGraph");

    assert_eq!(
        emissions(&implementation),
        vec![
            "repositoryProvider = DoubleCheck.provider(Repository_Factory.create(\
             Api_Factory.create(), AppGraph_ProvideClockFactory.create(InstanceFactory.create(this))))"
        ]
    );
    assert_eq!(accessors(&implementation), vec!["repositoryProvider.invoke()"]);
}

#[test]
fn test_shared_unscoped_binding_gets_a_field() {
    let index = DeclarationIndex::new()
        .with_injectable(injectable("app.Api", &[]))
        .with_injectable(injectable("app.Users", &[("api", TypeRef::of("app.Api"))]))
        .with_graph(
            GraphDeclaration::new("app.AppGraph")
                .with_accessor("api", TypeRef::of("app.Api"))
                .with_accessor("users", TypeRef::of("app.Users")),
        );

    let implementation = transform(&index, "app.AppGraph");

    assert_eq!(emissions(&implementation), vec!["apiProvider = Api_Factory.create()"]);
    assert_eq!(
        accessors(&implementation),
        vec![
            "apiProvider.invoke()",
            "Users_Factory.create(apiProvider).invoke()"
        ]
    );
}

#[test]
fn test_deferred_field_is_declared_then_patched() {
    let provider_of_a = Symbols::default().provider_of(TypeRef::of("app.A"));
    let index = DeclarationIndex::new()
        .with_injectable(injectable("app.A", &[("b", TypeRef::of("app.B"))]))
        .with_injectable(injectable("app.B", &[("a", provider_of_a)]))
        .with_graph(GraphDeclaration::new("app.AppGraph").with_accessor("a", TypeRef::of("app.A")));

    let implementation = transform(&index, "app.AppGraph");

    assert_eq!(
        emissions(&implementation),
        vec![
            "aProvider = DelegateFactory<app.A>()",
            "aProvider.setDelegate(A_Factory.create(B_Factory.create(aProvider)))",
        ]
    );
    assert_eq!(accessors(&implementation), vec!["aProvider.invoke()"]);
}

#[test]
fn test_accessor_unwraps_to_its_declared_shape() {
    let symbols = Symbols::default();
    let index = DeclarationIndex::new()
        .with_injectable(injectable("app.Api", &[]))
        .with_graph(
            GraphDeclaration::new("app.AppGraph")
                .with_accessor("apiProvider", symbols.provider_of(TypeRef::of("app.Api")))
                .with_accessor(
                    "lazyApi",
                    TypeRef::generic("kotlin.Lazy", vec![TypeRef::of("app.Api")]),
                ),
        );

    let implementation = transform(&index, "app.AppGraph");

    assert_eq!(
        accessors(&implementation),
        vec!["apiProvider", "DoubleCheck.lazy(apiProvider)"]
    );
}

#[test]
fn test_bound_instance_and_binds_alias() {
    let index = DeclarationIndex::new()
        .with_injectable(injectable("app.RealGreeter", &[("name", TypeRef::of("kotlin.String"))]))
        .with_graph(
            GraphDeclaration::new("app.AppGraph")
                .with_provider(ProviderDecl::binds(
                    FunctionDecl::new(CallableId::new("app.AppGraph", "bindGreeter"), TypeRef::of("app.Greeter"))
                        .with_parameter(ParameterDecl::new("impl", TypeRef::of("app.RealGreeter"))),
                ))
                .with_accessor("greeter", TypeRef::of("app.Greeter"))
                .with_creator(creator(
                    "app.AppGraph",
                    vec![ParameterDecl::new("name", TypeRef::of("kotlin.String")).binds_instance()],
                )),
        );

    let implementation = transform(&index, "app.AppGraph");

    assert_eq!(emissions(&implementation), vec!["store name: kotlin.String"]);
    assert_eq!(
        accessors(&implementation),
        vec!["RealGreeter_Factory.create(InstanceFactory.create(name)).invoke()"]
    );
}

#[test]
fn test_graph_dependency_is_called_through_a_field() {
    let index = DeclarationIndex::new()
        .with_injectable(injectable("app.Api", &[]))
        .with_injectable(injectable("app.Repository", &[("api", TypeRef::of("app.Api"))]))
        .with_graph(GraphDeclaration::new("app.ParentGraph").with_accessor("api", TypeRef::of("app.Api")))
        .with_graph(
            GraphDeclaration::new("app.ChildGraph")
                .with_accessor("repository", TypeRef::of("app.Repository"))
                .with_creator(creator(
                    "app.ChildGraph",
                    vec![ParameterDecl::new("parent", TypeRef::of("app.ParentGraph"))],
                )),
        );

    let implementation = transform(&index, "app.ChildGraph");

    assert_eq!(
        emissions(&implementation),
        vec![
            "store parent: app.ParentGraph",
            "parentGraphApiProvider = provider { parent.api() }",
        ]
    );
    assert_eq!(
        accessors(&implementation),
        vec!["Repository_Factory.create(parentGraphApiProvider).invoke()"]
    );
}

#[test]
fn test_graph_dependency_returning_a_provider_is_used_directly() {
    let symbols = Symbols::default();
    let index = DeclarationIndex::new()
        .with_injectable(injectable("app.Api", &[]))
        .with_injectable(injectable("app.Repository", &[("api", TypeRef::of("app.Api"))]))
        .with_graph(
            GraphDeclaration::new("app.ParentGraph")
                .with_accessor("apiProvider", symbols.provider_of(TypeRef::of("app.Api"))),
        )
        .with_graph(
            GraphDeclaration::new("app.ChildGraph")
                .with_accessor("repository", TypeRef::of("app.Repository"))
                .with_creator(creator(
                    "app.ChildGraph",
                    vec![ParameterDecl::new("parent", TypeRef::of("app.ParentGraph"))],
                )),
        );

    let implementation = transform(&index, "app.ChildGraph");

    assert_eq!(
        emissions(&implementation),
        vec![
            "store parent: app.ParentGraph",
            "parentGraphApiProvider = parent.apiProvider()",
        ]
    );
    assert_eq!(
        accessors(&implementation),
        vec!["Repository_Factory.create(parentGraphApiProvider).invoke()"]
    );
}

#[test]
fn test_set_multibinding() {
    let graph = "app.AppGraph";
    let plugin = TypeRef::of("app.Plugin");
    let index = DeclarationIndex::new().with_graph(
        GraphDeclaration::new(graph)
            .with_provider(
                ProviderDecl::provides(FunctionDecl::new(CallableId::new(graph, "provideBeta"), plugin.clone()))
                    .into_set(),
            )
            .with_provider(
                ProviderDecl::provides(FunctionDecl::new(CallableId::new(graph, "provideAlpha"), plugin.clone()))
                    .into_set(),
            )
            .with_accessor("plugins", Symbols::default().set_of(plugin)),
    );

    let implementation = transform(&index, graph);

    assert_eq!(
        accessors(&implementation),
        vec![
            "SetFactory.builder()\
             .addProvider(AppGraph_ProvideAlphaFactory.create())\
             .addProvider(AppGraph_ProvideBetaFactory.create())\
             .build().invoke()"
        ]
    );
}

#[test]
fn test_map_multibinding_requested_as_map_of_providers() {
    let graph = "app.AppGraph";
    let symbols = Symbols::default();
    let string = TypeRef::of("kotlin.String");
    let plugin = TypeRef::of("app.Plugin");
    let key = MapKey::new(Annotation::new("app.StringKey"), string.clone(), "\"a\"");
    let index = DeclarationIndex::new().with_graph(
        GraphDeclaration::new(graph)
            .with_provider(
                ProviderDecl::provides(FunctionDecl::new(CallableId::new(graph, "providePluginA"), plugin.clone()))
                    .into_map(key),
            )
            .with_accessor(
                "plugins",
                symbols.map_of(string, symbols.provider_of(plugin)),
            ),
    );

    let implementation = transform(&index, graph);

    assert_eq!(
        accessors(&implementation),
        vec!["MapProviderFactory.builder().put(\"a\", AppGraph_ProvidePluginAFactory.create()).build().invoke()"]
    );
}

#[test]
fn test_provided_map_of_providers_next_to_map_contributions_fails() {
    let graph = "app.AppGraph";
    let symbols = Symbols::default();
    let string = TypeRef::of("kotlin.String");
    let plugin = TypeRef::of("app.Plugin");
    let providers = symbols.map_of(string.clone(), symbols.provider_of(plugin.clone()));
    let key = MapKey::new(Annotation::new("app.StringKey"), string, "\"a\"");
    let index = DeclarationIndex::new().with_graph(
        GraphDeclaration::new(graph)
            .with_provider(
                ProviderDecl::provides(FunctionDecl::new(CallableId::new(graph, "providePluginA"), plugin))
                    .into_map(key),
            )
            .with_provider(ProviderDecl::provides(provides(graph, "provideRawMap", providers.clone())))
            .with_accessor("plugins", providers),
    );

    let errors = DependencyGraphTransformer::new(&index, LatticeOptions::default())
        .transform(&ClassId::new(graph))
        .unwrap_err();

    assert_eq!(errors.tags(), vec!["DuplicateBinding"]);
    let message = errors.errors[0].to_string();
    assert!(message.contains("app.AppGraph.provideRawMap"), "{message}");
}

#[test]
fn test_assisted_factory() {
    let index = DeclarationIndex::new()
        .with_injectable(InjectableClass::new(
            FunctionDecl::constructor("app.Presenter")
                .with_parameter(ParameterDecl::new("id", TypeRef::of("kotlin.String")).assisted(""))
                .with_parameter(ParameterDecl::new("api", TypeRef::of("app.Api"))),
        ))
        .with_injectable(injectable("app.Api", &[]))
        .with_assisted_factory(AssistedFactoryDecl {
            class_id: ClassId::new("app.PresenterFactory"),
            functions: vec![FunctionDecl::new(
                CallableId::new("app.PresenterFactory", "create"),
                TypeRef::of("app.Presenter"),
            )
            .with_parameter(ParameterDecl::new("id", TypeRef::of("kotlin.String")).assisted(""))],
        })
        .with_graph(
            GraphDeclaration::new("app.AppGraph")
                .with_accessor("presenterFactory", TypeRef::of("app.PresenterFactory")),
        );

    init_tracing();
    let mut transformer = DependencyGraphTransformer::new(&index, LatticeOptions::default());
    let implementation = transformer.transform(&ClassId::new("app.AppGraph")).unwrap();

    assert_eq!(
        accessors(&implementation),
        vec!["PresenterFactory_Impl.create(Presenter_Factory.create(Api_Factory.create())).invoke()"]
    );
    let factory = &transformer.artifacts().factories[&ClassId::new("app.Presenter")];
    assert!(factory.is_assisted);
    assert_eq!(factory.parameters, vec!["id", "api"]);
}

#[test]
fn test_assisted_factory_signature_must_match() {
    let index = DeclarationIndex::new()
        .with_injectable(InjectableClass::new(
            FunctionDecl::constructor("app.Presenter")
                .with_parameter(ParameterDecl::new("id", TypeRef::of("kotlin.String")).assisted("")),
        ))
        .with_assisted_factory(AssistedFactoryDecl {
            class_id: ClassId::new("app.PresenterFactory"),
            functions: vec![FunctionDecl::new(
                CallableId::new("app.PresenterFactory", "create"),
                TypeRef::of("app.Presenter"),
            )
            .with_parameter(ParameterDecl::new("id", TypeRef::of("kotlin.Int")).assisted(""))],
        })
        .with_graph(
            GraphDeclaration::new("app.AppGraph")
                .with_accessor("presenterFactory", TypeRef::of("app.PresenterFactory")),
        );

    let errors = DependencyGraphTransformer::new(&index, LatticeOptions::default())
        .transform(&ClassId::new("app.AppGraph"))
        .unwrap_err();
    assert_eq!(errors.tags(), vec!["AssistedParametersMismatch"]);
}

#[test]
fn test_injector_function() {
    let index = DeclarationIndex::new()
        .with_injectable(injectable("app.Api", &[]))
        .with_members(
            "app.MainActivity",
            vec![FunctionDecl::new(
                CallableId::new("app.MainActivity", "setApi"),
                TypeRef::of("kotlin.Unit"),
            )
            .with_parameter(ParameterDecl::new("api", TypeRef::of("app.Api")))],
        )
        .with_graph(GraphDeclaration::new("app.AppGraph").with_injector("inject", TypeRef::of("app.MainActivity")));

    let implementation = transform(&index, "app.AppGraph");

    assert_eq!(
        emissions(&implementation),
        vec!["mainActivityMembersInjectorProvider = MainActivity_MembersInjector.create(Api_Factory.create())"]
    );
    assert_eq!(
        implementation.injectors[0].body.to_string(),
        "mainActivityMembersInjectorProvider.injectMembers(target)"
    );
}

#[test]
fn test_failed_graph_yields_stubs_and_siblings_still_generate() {
    init_tracing();
    let index = DeclarationIndex::new()
        .with_injectable(injectable("app.A", &[("b", TypeRef::of("app.B"))]))
        .with_injectable(injectable("app.B", &[("a", TypeRef::of("app.A"))]))
        .with_injectable(injectable("app.C", &[]))
        .with_graph(GraphDeclaration::new("app.BrokenGraph").with_accessor("a", TypeRef::of("app.A")))
        .with_graph(GraphDeclaration::new("app.GoodGraph").with_accessor("c", TypeRef::of("app.C")));

    let outcomes = DependencyGraphTransformer::new(&index, LatticeOptions::default()).transform_all();

    assert_eq!(outcomes.len(), 2);
    match &outcomes[0] {
        GraphOutcome::Failed { graph, errors, stubs } => {
            assert_eq!(graph.as_str(), "app.BrokenGraph");
            assert_eq!(errors.tags(), vec!["DependencyCycle"]);
            assert!(errors.to_string().contains("app.B --> app.A --> app.B"));
            assert_eq!(stubs.len(), 1);
            assert_eq!(stubs[0].member, CallableId::new("app.BrokenGraph", "a"));
        }
        GraphOutcome::Generated(_) => panic!("app.BrokenGraph has a dependency cycle"),
    }
    assert!(outcomes[1].is_generated());
    assert_eq!(outcomes[1].graph().as_str(), "app.GoodGraph");
}

#[test]
fn test_factories_are_shared_between_graphs() {
    let index = DeclarationIndex::new()
        .with_injectable(injectable("app.Api", &[]))
        .with_graph(GraphDeclaration::new("app.FirstGraph").with_accessor("api", TypeRef::of("app.Api")))
        .with_graph(GraphDeclaration::new("app.SecondGraph").with_accessor("api", TypeRef::of("app.Api")));

    let mut transformer = DependencyGraphTransformer::new(&index, LatticeOptions::default());
    let outcomes = transformer.transform_all();

    assert!(outcomes.iter().all(GraphOutcome::is_generated));
    assert_eq!(transformer.artifacts().factories.len(), 1);
    assert_eq!(transformer.artifacts().factories[&ClassId::new("app.Api")].name, "Api_Factory");
}

#[test]
fn test_disabled_transformer_skips_everything() {
    let index = DeclarationIndex::new()
        .with_graph(GraphDeclaration::new("app.AppGraph").with_accessor("missing", TypeRef::of("app.Missing")));
    let options = LatticeOptions {
        enabled: false,
        ..LatticeOptions::default()
    };

    let outcomes = DependencyGraphTransformer::new(&index, options).transform_all();
    assert!(outcomes.is_empty());
}

#[test]
fn test_public_provider_severity() {
    let index = DeclarationIndex::new().with_graph(
        GraphDeclaration::new("app.AppGraph")
            .with_provider(ProviderDecl::provides(
                provides("app.AppGraph", "provideName", TypeRef::of("kotlin.String"))
                    .with_visibility(Visibility::Public),
            ))
            .with_accessor("name", TypeRef::of("kotlin.String")),
    );
    let graph = ClassId::new("app.AppGraph");

    let warn = LatticeOptions {
        public_provider_severity: Severity::Warn,
        ..LatticeOptions::default()
    };
    assert!(DependencyGraphTransformer::new(&index, warn).transform(&graph).is_ok());

    let error = LatticeOptions {
        public_provider_severity: Severity::Error,
        ..LatticeOptions::default()
    };
    let errors = DependencyGraphTransformer::new(&index, error)
        .transform(&graph)
        .unwrap_err();
    assert_eq!(errors.tags(), vec!["PublicProvider"]);
}

#[test]
fn test_scoped_binding_in_unscoped_graph_fails() {
    let index = DeclarationIndex::new()
        .with_injectable(injectable("app.Session", &[]).scoped(Annotation::new("app.UserScope")))
        .with_graph(GraphDeclaration::new("app.AppGraph").with_accessor("session", TypeRef::of("app.Session")));

    let errors = DependencyGraphTransformer::new(&index, LatticeOptions::default())
        .transform(&ClassId::new("app.AppGraph"))
        .unwrap_err();

    assert_eq!(errors.tags(), vec!["IncompatiblyScopedBindings"]);
    let message = errors.to_string();
    assert!(message.starts_with("The binding graph had one or more errors:\n- [Lattice/IncompatiblyScopedBindings]"));
    assert!(message.contains("app.Session is requested at"), "{message}");
}

#[test]
fn test_duplicate_provider_fails() {
    let graph = "app.AppGraph";
    let index = DeclarationIndex::new().with_graph(
        GraphDeclaration::new(graph)
            .with_provider(ProviderDecl::provides(provides(graph, "provideName", TypeRef::of("kotlin.String"))))
            .with_provider(ProviderDecl::provides(provides(graph, "provideOtherName", TypeRef::of("kotlin.String"))))
            .with_accessor("name", TypeRef::of("kotlin.String")),
    );

    let errors = DependencyGraphTransformer::new(&index, LatticeOptions::default())
        .transform(&ClassId::new(graph))
        .unwrap_err();

    assert_eq!(errors.tags(), vec!["DuplicateBinding"]);
    let message = errors.errors[0].to_string();
    assert!(message.contains("app.AppGraph.provideName"), "{message}");
    assert!(message.contains("app.AppGraph.provideOtherName"), "{message}");
}

#[test]
fn test_invalid_binds_function() {
    let graph = "app.AppGraph";
    let index = DeclarationIndex::new().with_graph(
        GraphDeclaration::new(graph).with_provider(ProviderDecl::binds(FunctionDecl::new(
            CallableId::new(graph, "bindGreeter"),
            TypeRef::of("app.Greeter"),
        ))),
    );

    let errors = DependencyGraphTransformer::new(&index, LatticeOptions::default())
        .transform(&ClassId::new(graph))
        .unwrap_err();
    assert_eq!(errors.tags(), vec!["InvalidBindsFunction"]);
}

#[test]
fn test_map_contribution_needs_a_single_map_key() {
    let graph = "app.AppGraph";
    let string = TypeRef::of("kotlin.String");
    let function = FunctionDecl::new(CallableId::new(graph, "providePlugin"), TypeRef::of("app.Plugin"));
    let index = DeclarationIndex::new().with_graph(
        GraphDeclaration::new(graph).with_provider(
            ProviderDecl::provides(function)
                .into_map(MapKey::new(Annotation::new("app.StringKey"), string.clone(), "\"a\""))
                .into_map(MapKey::new(Annotation::new("app.StringKey"), string, "\"b\"")),
        ),
    );

    let errors = DependencyGraphTransformer::new(&index, LatticeOptions::default())
        .transform(&ClassId::new(graph))
        .unwrap_err();
    assert_eq!(errors.tags(), vec!["MultipleMapKeys"]);
}
