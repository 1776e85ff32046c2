use concord::{ConfigurationRegistry, Container, Inject, ResolveErrorKind, ServiceStatus, TypeInfo, TypeUniverse};
use std::sync::Arc;
use tracing_test::traced_test;

struct Migrations;
struct Endpoint;
struct Clock;
#[allow(dead_code)]
struct Mailer(Arc<Endpoint>, Option<Arc<Clock>>, u16);
#[allow(dead_code)]
struct Queue(Arc<String>);
#[allow(dead_code)]
struct Worker(Arc<Queue>);

fn universe() -> TypeUniverse {
    TypeUniverse::new()
        .register::<Migrations>(|d| d.constructor(&[], || Ok(Migrations)))
        .register::<Mailer>(|d| {
            d.constructor(
                &["endpoint", "clock", "port"],
                |Inject(endpoint): Inject<Endpoint>, clock: Option<Inject<Clock>>, Inject(port): Inject<u16>| {
                    Ok(Mailer(endpoint, clock.map(|Inject(clock)| clock), *port))
                },
            )
        })
        .register::<Queue>(|d| d.constructor(&["url"], |Inject(url): Inject<String>| Ok(Queue(url))))
        .register::<Worker>(|d| d.constructor(&["queue"], |Inject(queue): Inject<Queue>| Ok(Worker(queue))))
}

#[test]
#[traced_test]
fn test_resolved_log() {
    let universe = universe();
    let registry = ConfigurationRegistry::builder()
        .configure::<Mailer>(|c| {
            c.implicit_dependency::<Migrations>()
                .dependency("endpoint", Endpoint)
                .dependency("port", 25_u8)
                .comment("outgoing mail")
        })
        .build(&universe);
    let container = Container::new(universe, registry);

    let service = container.resolve(TypeInfo::of::<Mailer>(), &[]);
    assert_eq!(service.status(), ServiceStatus::Ok);
    assert_eq!(
        service.construction_log(),
        "Mailer - outgoing mail\n\tMigrations - implicit\n\tEndpoint const\n\t!Clock\n\tport -> 25"
    );

    let mailer = service.single::<Mailer>().unwrap();
    assert!(mailer.1.is_none());
    assert_eq!(mailer.2, 25);
}

#[test]
#[traced_test]
fn test_error_log() {
    let universe = universe();
    let registry = ConfigurationRegistry::builder().build(&universe);
    let container = Container::new(universe, registry);

    let service = container.resolve(TypeInfo::of::<Worker>(), &[]);
    assert_eq!(service.status(), ServiceStatus::DependencyError);
    assert_eq!(
        service.construction_log(),
        "!Worker\n\t!Queue\n\t\t!url <---------------"
    );

    match container.get::<Worker>() {
        Err(ResolveErrorKind::Failed { type_name, message, log }) => {
            assert_eq!(type_name, "Worker");
            assert_eq!(message, "parameter [url] of simple type [String] can't be created");
            assert_eq!(log, service.construction_log());
        }
        _ => panic!("failure expected"),
    }
}

#[test]
#[traced_test]
fn test_not_resolved_log() {
    let universe = universe();
    let registry = ConfigurationRegistry::builder()
        .configure::<Queue>(|c| c.dont_use())
        .build(&universe);
    let container = Container::new(universe, registry);

    let service = container.resolve(TypeInfo::of::<Worker>(), &[]);
    assert_eq!(service.status(), ServiceStatus::NotResolved);
    assert_eq!(service.construction_log(), "!Worker\n\t!Queue - DontUse");
    assert!(matches!(
        container.get::<Worker>(),
        Err(ResolveErrorKind::NotResolved { .. })
    ));
}
