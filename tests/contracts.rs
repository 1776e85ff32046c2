use concord::{ConfigurationRegistry, Container, Inject, ResolveErrorKind, ServiceStatus, TypeInfo, TypeUniverse};
use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};
use tracing_test::traced_test;

struct Gateway(&'static str);
struct Checkout(Arc<Gateway>);

fn universe() -> TypeUniverse {
    TypeUniverse::new()
        .register::<Gateway>(|d| d.constructor(&["region"], |Inject(region): Inject<&'static str>| Ok(Gateway(*region))))
        .register::<Checkout>(|d| {
            d.constructor(&["gateway"], |Inject(gateway): Inject<Gateway>| Ok(Checkout(gateway)))
                .require_contract("gateway", "production")
        })
}

fn container() -> Container {
    let universe = universe();
    let registry = ConfigurationRegistry::builder()
        .configure::<Gateway>(|c| c.dependency("region", "default"))
        .contract(["eu", "production"], |c| c.configure::<Gateway>(|c| c.dependency("region", "eu-prod")))
        .contract(["production"], |c| c.configure::<Gateway>(|c| c.dependency("region", "prod")))
        .build(&universe);
    Container::new(universe, registry)
}

#[test]
#[traced_test]
fn test_contract_overrides() {
    let container = container();

    assert_eq!(container.get::<Gateway>().unwrap().0, "default");
    assert_eq!(container.get_with_contracts::<Gateway>(&["production"]).unwrap().0, "prod");
    assert_eq!(container.get_with_contracts::<Gateway>(&["unknown"]).unwrap().0, "default");

    let service = container.resolve(TypeInfo::of::<Gateway>(), &["unknown"]);
    assert!(service.used_contracts().is_empty());
    assert_eq!(service.declared_contracts(), ["unknown"]);
}

#[test]
#[traced_test]
fn test_required_contracts() {
    let container = container();

    let service = container.resolve(TypeInfo::of::<Gateway>(), &["eu", "production"]);
    assert_eq!(service.single::<Gateway>().unwrap().0, "eu-prod");
    assert_eq!(service.used_contracts(), ["eu", "production"]);

    let service = container.resolve(TypeInfo::of::<Gateway>(), &["eu", "staging", "production"]);
    assert_eq!(service.single::<Gateway>().unwrap().0, "eu-prod");

    // prerequisites must be declared before the contract
    let service = container.resolve(TypeInfo::of::<Gateway>(), &["production", "eu"]);
    assert_eq!(service.single::<Gateway>().unwrap().0, "prod");
    assert_eq!(service.used_contracts(), ["production"]);
}

#[test]
#[traced_test]
fn test_parameter_contracts() {
    let container = container();

    let checkout = container.get::<Checkout>().unwrap();
    assert_eq!(checkout.0 .0, "prod");

    let service = container.resolve(TypeInfo::of::<Checkout>(), &["eu"]);
    assert_eq!(service.single::<Checkout>().unwrap().0 .0, "eu-prod");
    assert_eq!(service.used_contracts(), ["eu"]);
    assert_eq!(
        service.construction_log(),
        "Checkout[eu]\n\tGateway[eu->production]\n\t\tregion -> eu-prod"
    );

    let service = container.resolve(TypeInfo::of::<Checkout>(), &["production"]);
    assert_eq!(service.status(), ServiceStatus::DependencyError);
    assert_eq!(
        service.error_message().as_deref(),
        Some("contract [production] already declared, all declared contracts [production]")
    );
}

#[test]
#[traced_test]
fn test_contracts_union() {
    let gateway_call_count = Arc::new(AtomicU8::new(0));

    let universe = TypeUniverse::new().register::<Gateway>({
        let gateway_call_count = gateway_call_count.clone();
        move |d| {
            d.constructor(&["region"], move |Inject(region): Inject<&'static str>| {
                gateway_call_count.fetch_add(1, Ordering::SeqCst);
                Ok(Gateway(*region))
            })
        }
    });
    let registry = ConfigurationRegistry::builder()
        .contract(["eu"], |c| c.configure::<Gateway>(|c| c.dependency("region", "eu")))
        .contract(["us"], |c| c.configure::<Gateway>(|c| c.dependency("region", "us")))
        .contract(["broken"], |c| c.configure::<Gateway>(|c| c.dependency("region", 5_u8)))
        .contracts_union("regions", ["eu"])
        .contracts_union("regions", ["us"])
        .contracts_union("failing", ["broken", "eu"])
        .build(&universe);
    let container = Container::new(universe, registry);

    let regions = container
        .resolve(TypeInfo::of::<Gateway>(), &["regions"])
        .all::<Gateway>()
        .unwrap()
        .iter()
        .map(|gateway| gateway.0)
        .collect::<Vec<_>>();
    assert_eq!(regions, ["eu", "us"]);
    assert_eq!(gateway_call_count.load(Ordering::SeqCst), 2);

    // cached per combination
    let eu = container.get_with_contracts::<Gateway>(&["eu"]).unwrap();
    assert_eq!(eu.0, "eu");
    assert_eq!(gateway_call_count.load(Ordering::SeqCst), 2);

    let service = container.resolve(TypeInfo::of::<Gateway>(), &["failing"]);
    assert_eq!(service.status(), ServiceStatus::DependencyError);
    assert!(service.instances().is_empty());
    assert_eq!(service.dependencies().len(), 1);
    match service.single::<Gateway>() {
        Err(ResolveErrorKind::Failed { message, .. }) => {
            assert_eq!(message, "can't cast value [5] from [u8] to [&str] for dependency [region]");
        }
        _ => panic!("cast error expected"),
    }
}

#[test]
#[traced_test]
fn test_contracts_union_replace() {
    let universe = universe();
    let registry = ConfigurationRegistry::builder()
        .contract(["eu"], |c| c.configure::<Gateway>(|c| c.dependency("region", "eu")))
        .contract(["us"], |c| c.configure::<Gateway>(|c| c.dependency("region", "us")))
        .contracts_union("regions", ["eu", "us"])
        .contracts_union_replace("regions", ["us"])
        .build(&universe);
    let container = Container::new(universe, registry);

    let service = container.resolve(TypeInfo::of::<Gateway>(), &["regions"]);
    assert_eq!(service.single::<Gateway>().unwrap().0, "us");
}

#[test]
#[traced_test]
fn test_named_services() {
    let container = container();

    let primary = container.resolve_named(TypeInfo::of::<Gateway>(), &[], Some("primary"));
    let unnamed = container.resolve(TypeInfo::of::<Gateway>(), &[]);

    assert_eq!(primary.name(), Some("primary"));
    assert_eq!(unnamed.name(), None);
    assert!(!Arc::ptr_eq(
        &primary.single::<Gateway>().unwrap(),
        &unnamed.single::<Gateway>().unwrap()
    ));
    assert!(Arc::ptr_eq(
        &primary,
        &container.resolve_named(TypeInfo::of::<Gateway>(), &[], Some("primary"))
    ));
}
