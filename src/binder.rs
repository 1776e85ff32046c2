use alloc::{collections::BTreeSet, string::String, vec::Vec};

use crate::{
    configuration::{DependencyConfiguration, ImplementationConfiguration},
    context::ResolutionContext,
    dependency_resolver::Parameter,
    errors::ConstructorErrorKind,
    instantiator::Constructor,
    registry::ConfigurationRegistry,
    universe::TypeDescriptor,
};

/// Constructor selection and argument overrides for one concrete type
pub(crate) struct ImplementationBinder<'a> {
    descriptor: &'a TypeDescriptor,
    implementation_configuration: Option<&'a ImplementationConfiguration>,
    definition_configuration: Option<&'a ImplementationConfiguration>,
    used_names: BTreeSet<&'a str>,
}

impl<'a> ImplementationBinder<'a> {
    #[inline]
    #[must_use]
    pub(crate) fn new(descriptor: &'a TypeDescriptor) -> Self {
        Self {
            descriptor,
            implementation_configuration: None,
            definition_configuration: None,
            used_names: BTreeSet::new(),
        }
    }

    /// Looks up overrides of the type and of its generic definition through the declared contracts
    pub(crate) fn set_context(&mut self, context: &mut ResolutionContext, registry: &'a ConfigurationRegistry) {
        self.implementation_configuration = context.get_or_null(registry, &self.descriptor.type_info);
        self.definition_configuration = self
            .descriptor
            .definition
            .and_then(|definition| context.get_or_null(registry, &definition));
    }

    /// The only constructor, or the only marked one when there are several
    pub(crate) fn try_get_constructor(&self) -> Result<&'a Constructor, ConstructorErrorKind> {
        match self.descriptor.constructors.as_slice() {
            [] => Err(ConstructorErrorKind::NoConstructors),
            [constructor] => Ok(constructor),
            constructors => {
                let mut marked = constructors.iter().filter(|constructor| constructor.marked);
                match (marked.next(), marked.next()) {
                    (Some(constructor), None) => Ok(constructor),
                    _ => Err(ConstructorErrorKind::ManyConstructors {
                        count: constructors.len(),
                    }),
                }
            }
        }
    }

    /// Override for `parameter`: the type's own configuration first, then its generic definition's
    pub(crate) fn get_dependency_configuration(&mut self, parameter: &Parameter) -> Option<&'a DependencyConfiguration> {
        if let Some((configuration, name)) = self
            .implementation_configuration
            .and_then(|implementation| implementation.get_or_null(parameter))
        {
            if let Some(name) = name {
                self.used_names.insert(name);
            }
            return Some(configuration);
        }
        self.definition_configuration
            .and_then(|definition| definition.get_or_null(parameter))
            .map(|(configuration, _)| configuration)
    }

    /// Named overrides of the type's own configuration never consulted
    #[must_use]
    pub(crate) fn unused_dependency_configuration_names(&self) -> Vec<String> {
        self.implementation_configuration
            .map(|implementation| {
                implementation
                    .names()
                    .filter(|name| !self.used_names.contains(name))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::ImplementationBinder;
    use crate::{
        any::TypeInfo,
        configuration::DependencyConfiguration,
        context::ResolutionContext,
        dependency_resolver::{Parameter, ParameterKind},
        errors::ConstructorErrorKind,
        inject::Inject,
        registry::ConfigurationRegistry,
        universe::TypeUniverse,
    };

    use alloc::{
        format,
        string::{String, ToString as _},
        sync::Arc,
    };
    use core::marker::PhantomData;
    use tracing_test::traced_test;

    struct Pool;
    struct Config(&'static str);
    struct Repository<T>(Arc<Pool>, PhantomData<T>);
    struct RepositoryDefinition;
    struct User;
    struct Order;

    #[test]
    #[traced_test]
    fn test_constructor_selection() {
        let universe = TypeUniverse::new()
            .register::<Pool>(|d| d.constructor(&[], || Ok(Pool)))
            .register::<Config>(|d| {
                d.constructor(&[], || Ok(Config("default")))
                    .marked_constructor(&["pool"], |Inject(_pool): Inject<Pool>| Ok(Config("pooled")))
            })
            .register::<User>(|d| d.constructor(&[], || Ok(User)).constructor(&["pool"], |Inject(_pool): Inject<Pool>| Ok(User)))
            .register::<Order>(|d| d);

        let binder = ImplementationBinder::new(universe.get(&TypeInfo::of::<Pool>()).unwrap());
        assert!(binder.try_get_constructor().is_ok());

        let binder = ImplementationBinder::new(universe.get(&TypeInfo::of::<Config>()).unwrap());
        assert_eq!(binder.try_get_constructor().unwrap().parameters().len(), 1);

        let binder = ImplementationBinder::new(universe.get(&TypeInfo::of::<User>()).unwrap());
        assert_eq!(
            binder.try_get_constructor().unwrap_err(),
            ConstructorErrorKind::ManyConstructors { count: 2 }
        );

        let binder = ImplementationBinder::new(universe.get(&TypeInfo::of::<Order>()).unwrap());
        assert_eq!(binder.try_get_constructor().unwrap_err(), ConstructorErrorKind::NoConstructors);
    }

    #[test]
    #[traced_test]
    fn test_dependency_configuration() {
        let universe = TypeUniverse::new()
            .register::<Repository<User>>(|d| {
                d.constructor(&["pool"], |Inject(pool): Inject<Pool>| {
                    Ok(Repository(pool, PhantomData))
                })
                .definition::<RepositoryDefinition>()
            })
            .register::<Repository<Order>>(|d| {
                d.constructor(&["pool"], |Inject(pool): Inject<Pool>| {
                    Ok(Repository(pool, PhantomData))
                })
                .definition::<RepositoryDefinition>()
            });
        let registry = ConfigurationRegistry::builder()
            .configure::<RepositoryDefinition>(|c| c.dependency("pool", Pool).dependency("table", "any"))
            .configure::<Repository<User>>(|c| c.dependency("table", "users").dependency("schema", "public"))
            .build(&universe);

        let table = Parameter::new("table", TypeInfo::of::<&'static str>(), ParameterKind::Single);
        let pool = universe.get(&TypeInfo::of::<Repository<User>>()).unwrap().constructors()[0].parameters()[0].clone();

        let mut context = ResolutionContext::new();
        let mut binder = ImplementationBinder::new(universe.get(&TypeInfo::of::<Repository<User>>()).unwrap());
        binder.set_context(&mut context, &registry);

        let Some(DependencyConfiguration::Value(value)) = binder.get_dependency_configuration(&table) else {
            panic!("table override expected");
        };
        assert_eq!(value.downcast::<&'static str>().as_deref(), Some(&"users"));
        assert!(matches!(
            binder.get_dependency_configuration(&pool),
            Some(DependencyConfiguration::Value(_))
        ));
        assert_eq!(binder.unused_dependency_configuration_names(), ["schema"]);

        let mut binder = ImplementationBinder::new(universe.get(&TypeInfo::of::<Repository<Order>>()).unwrap());
        binder.set_context(&mut context, &registry);
        let Some(DependencyConfiguration::Value(value)) = binder.get_dependency_configuration(&table) else {
            panic!("table override expected");
        };
        assert_eq!(value.downcast::<&'static str>().as_deref(), Some(&"any"));
        assert!(binder.unused_dependency_configuration_names().is_empty());
    }
}
