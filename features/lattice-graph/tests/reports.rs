use lattice_config::LatticeOptions;
use lattice_graph::{
    declarations::{FunctionDecl, GraphDeclaration, InjectableClass, ParameterDecl},
    source::DeclarationIndex,
    transformer::DependencyGraphTransformer,
    types::{Annotation, ClassId, TypeRef},
};
use pretty_assertions::assert_eq;

fn index() -> DeclarationIndex {
    let scope = Annotation::new("app.AppScope");
    DeclarationIndex::new()
        .with_injectable(InjectableClass::new(FunctionDecl::constructor("app.Api")).scoped(scope.clone()))
        .with_injectable(InjectableClass::new(
            FunctionDecl::constructor("app.Repository")
                .with_parameter(ParameterDecl::new("api", TypeRef::of("app.Api"))),
        ))
        .with_graph(
            GraphDeclaration::new("app.AppGraph")
                .scoped(scope)
                .with_accessor("repository", TypeRef::of("app.Repository")),
        )
}

#[test]
fn test_reports_are_written_per_graph() {
    let destination = tempfile::tempdir().unwrap();
    let options = LatticeOptions {
        reports_destination: Some(destination.path().join("lattice")),
        ..LatticeOptions::default()
    };
    let index = index();

    DependencyGraphTransformer::new(&index, options)
        .transform(&ClassId::new("app.AppGraph"))
        .unwrap();

    let keys = std::fs::read_to_string(destination.path().join("lattice/app.AppGraph-keys.txt")).unwrap();
    assert_eq!(
        keys.lines().collect::<Vec<_>>(),
        vec![
            "app.Api = ConstructorInjected @app.AppScope (app.Api)",
            "app.AppGraph = BoundInstance (app.AppGraph)",
            "app.Repository = ConstructorInjected (app.Repository)",
        ]
    );

    let plan = std::fs::read_to_string(destination.path().join("lattice/app.AppGraph-plan.json")).unwrap();
    let plan: serde_json::Value = serde_json::from_str(&plan).unwrap();
    assert_eq!(plan["graph"], "app.AppGraph");
    assert_eq!(plan["plan"]["fields"][0]["field"], "apiProvider");
    assert_eq!(plan["plan"]["fields"][0]["scope"], "@app.AppScope");
    assert_eq!(plan["plan"]["inlined"], serde_json::json!(["app.AppGraph", "app.Repository"]));
    assert_eq!(plan["emissions"][0]["step"], "initialize_field");
    assert_eq!(plan["emissions"][0]["initializer"]["kind"], "double_check");
}

#[test]
fn test_no_reports_without_destination() {
    let destination = tempfile::tempdir().unwrap();
    let index = index();

    DependencyGraphTransformer::new(&index, LatticeOptions::default())
        .transform(&ClassId::new("app.AppGraph"))
        .unwrap();

    assert_eq!(std::fs::read_dir(destination.path()).unwrap().count(), 0);
}
