use alloc::{
    format,
    string::{String, ToString as _},
    sync::Arc,
    vec::Vec,
};
use tracing::{debug, debug_span, error, info_span, warn};

use crate::{
    any::{Instance, TypeInfo},
    binder::ImplementationBinder,
    cache::{Cache, CacheKey, SlotAccess, WaitGraph},
    config::Config,
    configuration::{BindingConfiguration, DependencyConfiguration, ImplementationSelectorDecision},
    container_service::{ContainerService, ServiceStatus},
    context::ResolutionContext,
    dependency::{cast_error, DependencyValue, ServiceDependency},
    dependency_resolver::{Parameter, ParameterKind},
    errors::{ContainerErrorKind, ResolveErrorKind},
    registry::{ConfigurationBuilder, ConfigurationRegistry},
    universe::{TypeDescriptor, TypeUniverse},
    utils::simple::is_simple_type,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLevel {
    /// Shared by the static container and every local container created from it
    Static,
    /// Owned by one container
    Local,
}

struct ContainerInner {
    universe: Arc<TypeUniverse>,
    registry: Arc<ConfigurationRegistry>,
    config: Config,
    cache: Cache,
    waits: Arc<WaitGraph>,
    cache_level: CacheLevel,
    name: Option<String>,
    parent: Option<Container>,
}

#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Creates a static container
    #[inline]
    #[must_use]
    pub fn new(universe: TypeUniverse, registry: ConfigurationRegistry) -> Self {
        Self::with_config(universe, registry, Config::default())
    }

    #[inline]
    #[must_use]
    pub fn with_config(universe: TypeUniverse, registry: ConfigurationRegistry, config: Config) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                universe: Arc::new(universe),
                registry: Arc::new(registry),
                config,
                cache: Cache::new(),
                waits: Arc::new(WaitGraph::new()),
                cache_level: CacheLevel::Static,
                name: None,
                parent: None,
            }),
        }
    }

    /// Creates a local container whose configuration is layered over this one.
    /// Static services requested from it are still constructed and cached here.
    ///
    /// # Errors
    /// Returns [`ContainerErrorKind::NotStatic`] if this container is a local one
    pub fn create_local_container(
        &self,
        name: &str,
        configure: impl FnOnce(ConfigurationBuilder) -> ConfigurationBuilder,
    ) -> Result<Self, ContainerErrorKind> {
        if self.inner.cache_level != CacheLevel::Static {
            let err = ContainerErrorKind::NotStatic { name: name.to_string() };
            error!("{}", err);
            return Err(err);
        }

        let registry = configure(ConfigurationBuilder::new()).build_with_parent(&self.inner.universe, Some(self.inner.registry.clone()));
        debug!(name, "Local container created");

        Ok(Self {
            inner: Arc::new(ContainerInner {
                universe: self.inner.universe.clone(),
                registry: Arc::new(registry),
                config: self.inner.config,
                cache: Cache::new(),
                waits: self.inner.waits.clone(),
                cache_level: CacheLevel::Local,
                name: Some(name.to_string()),
                parent: Some(self.clone()),
            }),
        })
    }

    #[inline]
    #[must_use]
    pub fn resolve(&self, type_info: TypeInfo, contracts: &[&str]) -> Arc<ContainerService> {
        self.resolve_named(type_info, contracts, None)
    }

    /// Resolves `type_info` under `contracts`. Services with different `name`s are cached separately.
    #[must_use]
    pub fn resolve_named(&self, type_info: TypeInfo, contracts: &[&str], name: Option<&str>) -> Arc<ContainerService> {
        let span = info_span!(
            "resolve",
            service = type_info.name,
            contracts = ?contracts,
            container = self.inner.name.as_deref().unwrap_or("static"),
        );
        let _guard = span.enter();

        let contracts = contracts.iter().map(|contract| (*contract).to_string()).collect::<Vec<_>>();
        let mut context = ResolutionContext::new();
        let service = context.resolve(type_info, &contracts, name, self);

        match service.status {
            ServiceStatus::Ok => debug!("Resolved"),
            ServiceStatus::NotResolved => warn!("Not resolved"),
            _ => error!(message = service.error_message().as_deref().unwrap_or_default(), "Resolution failed"),
        }
        service
    }

    /// Single instance of `T`
    ///
    /// # Errors
    /// Returns an error if `T` can't be resolved, fails, or has several implementations
    #[inline]
    pub fn get<T: ?Sized + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        self.resolve(TypeInfo::of::<T>(), &[]).single()
    }

    /// Single instance of `T` under `contracts`
    ///
    /// # Errors
    /// Returns an error if `T` can't be resolved, fails, or has several implementations
    #[inline]
    pub fn get_with_contracts<T: ?Sized + 'static>(&self, contracts: &[&str]) -> Result<Arc<T>, ResolveErrorKind> {
        self.resolve(TypeInfo::of::<T>(), contracts).single()
    }

    /// Every implementation of `T`
    ///
    /// # Errors
    /// Returns an error if the resolution of `T` or of one of its implementations fails
    #[inline]
    pub fn get_all<T: ?Sized + 'static>(&self) -> Result<Vec<Arc<T>>, ResolveErrorKind> {
        self.resolve(TypeInfo::of::<T>(), &[]).all()
    }

    #[must_use]
    pub fn get_cache_level(&self, type_info: &TypeInfo) -> CacheLevel {
        let is_static = self.inner.registry.is_static(type_info)
            || self
                .inner
                .universe
                .get(type_info)
                .is_some_and(TypeDescriptor::is_static);
        if is_static {
            CacheLevel::Static
        } else {
            CacheLevel::Local
        }
    }

    #[inline]
    #[must_use]
    pub fn cache_level(&self) -> CacheLevel {
        self.inner.cache_level
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ConfigurationRegistry {
        &self.inner.registry
    }

    #[inline]
    #[must_use]
    pub fn universe(&self) -> &TypeUniverse {
        &self.inner.universe
    }

    /// Cached service for the type under the declared contracts, constructed on first request
    pub(crate) fn resolve_singleton(
        &self,
        type_info: TypeInfo,
        name: Option<&str>,
        context: &mut ResolutionContext,
    ) -> Arc<ContainerService> {
        if self.inner.cache_level == CacheLevel::Local && self.get_cache_level(&type_info) == CacheLevel::Static {
            if let Some(parent) = &self.inner.parent {
                debug!(service = type_info.name, "Delegated to static container");
                return parent.resolve_singleton(type_info, name, context);
            }
        }

        let span = debug_span!("resolve_singleton", service = type_info.name, contracts = ?context.declared_contract_names());
        let _guard = span.enter();

        if context.is_resolving(&type_info) {
            let mut service = ContainerService::new(type_info);
            context.instantiate(&mut service, name, self);
            return Arc::new(service);
        }

        let slot = self
            .inner
            .cache
            .slot(CacheKey::new(type_info, context.declared_contracts_key(), name));
        match slot.acquire(&self.inner.waits, context.request()) {
            SlotAccess::Cached(service) => {
                debug!("Found in cache");
                return service;
            }
            SlotAccess::Cyclic => {
                let mut service = ContainerService::new(type_info);
                context.fail_cyclic(&mut service, name, self);
                return Arc::new(service);
            }
            SlotAccess::Owned => debug!("Not found in cache"),
        }

        let mut service = ContainerService::new(type_info);
        context.instantiate(&mut service, name, self);
        let service = Arc::new(service);
        slot.complete(&self.inner.waits, service.clone());

        debug!(status = ?service.status, "Cached");
        service
    }

    /// Construction walk of one service
    pub(crate) fn instantiate(&self, service: &mut ContainerService, context: &mut ResolutionContext) {
        let registry = &*self.inner.registry;
        let binding = context.get_or_null::<BindingConfiguration>(registry, &service.type_info);

        if let Some(binding) = binding {
            if binding.dont_use {
                service.comment = Some(String::from("DontUse"));
                service.end_not_resolved();
                return;
            }

            for implicit in &binding.implicit_dependencies {
                let dependency = context.resolve(implicit.type_info, &implicit.contracts, None, self);
                service.add_dependency(ServiceDependency::from_service(dependency).with_comment("implicit"));
                if service.status.is_bad() {
                    return;
                }
            }

            if let Some(instance) = &binding.instance {
                service.add_instance(instance.clone());
                service.end_resolve_dependencies();
                return;
            }

            if binding.comment.is_some() {
                service.comment.clone_from(&binding.comment);
            }
        }

        match self.inner.universe.get(&service.type_info) {
            Some(descriptor) if binding.map_or(true, |binding| binding.implementation_types.is_none()) => {
                self.instantiate_implementation(service, descriptor, context);
            }
            _ => self.instantiate_interface(service, binding, context),
        }
        service.end_resolve_dependencies();
    }

    /// Collects the instances of every candidate implementation
    fn instantiate_interface(
        &self,
        service: &mut ContainerService,
        binding: Option<&BindingConfiguration>,
        context: &mut ResolutionContext,
    ) {
        let type_info = service.type_info;
        let universe = &*self.inner.universe;

        let explicit = binding.and_then(|binding| binding.implementation_types.as_deref());
        let mut candidates = explicit.map(<[TypeInfo]>::to_vec).unwrap_or_default();
        if explicit.is_none() || binding.is_some_and(|binding| binding.use_autosearch) {
            for inheritor in universe.inheritors_of(&type_info) {
                if !candidates.contains(inheritor) {
                    candidates.push(*inheritor);
                }
            }
        }

        for selector in self.inner.registry.get_implementation_selectors() {
            for decision in selector(&type_info, &candidates) {
                match decision {
                    ImplementationSelectorDecision::Include(candidate) => {
                        if !candidates.contains(&candidate) {
                            candidates.push(candidate);
                        }
                    }
                    ImplementationSelectorDecision::Exclude(candidate) => {
                        candidates.retain(|existing| *existing != candidate);
                    }
                }
            }
        }
        let names = candidates.iter().map(|candidate| candidate.name).collect::<Vec<_>>();
        debug!(candidates = ?names, "Implementations found");

        for candidate in candidates {
            if candidate == type_info {
                if let Some(descriptor) = universe.get(&type_info) {
                    self.instantiate_implementation(service, descriptor, context);
                    if service.status.is_bad() {
                        return;
                    }
                }
                continue;
            }

            let implementation = context.resolve(candidate, &[], None, self);
            if implementation.status.is_bad() {
                service.add_dependency(ServiceDependency::service_error(implementation));
                return;
            }

            let mut instances = Vec::with_capacity(implementation.instances.len());
            for instance in &implementation.instances {
                match self.cast_instance(instance, &type_info) {
                    Some(instance) => instances.push(instance),
                    None => {
                        let message = format!("can't cast [{}] to [{}]", instance.type_info(), type_info);
                        let name = implementation.type_info.short_name();
                        service.add_dependency(ServiceDependency::error(Some(implementation.clone()), name, message));
                        return;
                    }
                }
            }
            for instance in instances {
                service.add_instance(instance);
            }
            service.add_dependency(ServiceDependency::from_service(implementation));
        }
    }

    /// Binds a constructor of a concrete type, resolves its parameters in order and invokes it
    fn instantiate_implementation(
        &self,
        service: &mut ContainerService,
        descriptor: &TypeDescriptor,
        context: &mut ResolutionContext,
    ) {
        let mut binder = ImplementationBinder::new(descriptor);
        binder.set_context(context, &self.inner.registry);

        let constructor = match binder.try_get_constructor() {
            Ok(constructor) => constructor,
            Err(err) => {
                error!("{}", err);
                service.end_with_error(err.to_string());
                return;
            }
        };

        let mut arguments = Vec::with_capacity(constructor.parameters.len());
        for parameter in &constructor.parameters {
            let dependency = self.instantiate_dependency(parameter, &mut binder, context);
            let status = dependency.status;
            arguments.push(dependency.argument());
            service.add_dependency(dependency);

            if service.status.is_bad() {
                return;
            }
            if status == ServiceStatus::NotResolved && !parameter.optional {
                service.end_not_resolved();
                return;
            }
        }

        let unused = binder.unused_dependency_configuration_names();
        if !unused.is_empty() {
            let message = format!("unused dependency configurations [{}]", unused.join(","));
            warn!(service = service.type_info.name, "{}", message);
            service.unused_dependency_configurations = unused;
            if self.inner.config.unused_configuration_is_error {
                service.end_with_error(message);
                return;
            }
        }

        match constructor.invoke(arguments) {
            Ok(instance) => {
                debug!("Constructed");
                service.add_instance(instance);
            }
            Err(err) => {
                error!("{}", err);
                service.end_with_error(format!("construction exception: {err}"));
            }
        }
    }

    /// Resolves one constructor parameter
    fn instantiate_dependency(
        &self,
        parameter: &Parameter,
        binder: &mut ImplementationBinder<'_>,
        context: &mut ResolutionContext,
    ) -> ServiceDependency {
        let mut implementation_type = parameter.type_info;
        match binder.get_dependency_configuration(parameter) {
            Some(DependencyConfiguration::Value(value)) => {
                return ServiceDependency::constant(parameter, value.clone()).cast_to(parameter);
            }
            Some(DependencyConfiguration::Implementation(type_info)) => implementation_type = *type_info,
            None => {}
        }

        if is_simple_type(&implementation_type) {
            if parameter.optional {
                return ServiceDependency::not_resolved(None, parameter.name);
            }
            return ServiceDependency::error(
                None,
                parameter.name,
                format!(
                    "parameter [{}] of simple type [{}] can't be created",
                    parameter.name, implementation_type
                ),
            );
        }

        let child = context.resolve(implementation_type, &parameter.contracts, None, self);
        if child.status.is_bad() {
            return ServiceDependency::service_error(child);
        }
        if child.status == ServiceStatus::NotResolved {
            if parameter.kind == ParameterKind::All {
                return ServiceDependency::service(child, DependencyValue::All(Vec::new()));
            }
            return ServiceDependency::not_resolved(Some(child), parameter.name);
        }

        let mut instances = Vec::with_capacity(child.instances.len());
        for instance in &child.instances {
            match self.cast_instance(instance, &parameter.type_info) {
                Some(instance) => instances.push(instance),
                None => {
                    let message = cast_error(instance, &parameter.type_info, parameter.name);
                    return ServiceDependency::error(Some(child.clone()), parameter.name, message);
                }
            }
        }

        match parameter.kind {
            ParameterKind::All => ServiceDependency::service(child, DependencyValue::All(instances)),
            ParameterKind::Single => match instances.len() {
                1 => {
                    let instance = instances.remove(0);
                    ServiceDependency::service(child, DependencyValue::Single(instance))
                }
                _ => ServiceDependency::error(
                    Some(child),
                    parameter.name,
                    format!("many implementations for [{implementation_type}]"),
                ),
            },
        }
    }

    /// Converts an instance to `target`: identity, or upcast through the instance type's descriptor
    fn cast_instance(&self, instance: &Instance, target: &TypeInfo) -> Option<Instance> {
        if instance.type_info() == *target {
            return Some(instance.clone());
        }
        self.inner
            .universe
            .get(&instance.type_info())
            .and_then(|descriptor| descriptor.cast(instance, target))
    }
}
