use alloc::{
    string::{String, ToString as _},
    sync::Arc,
    vec::Vec,
};
use core::any::type_name;

use crate::{
    any::{Instance, TypeInfo},
    configuration::contract_eq,
    dependency::ServiceDependency,
    errors::ResolveErrorKind,
    log::ConstructionLogWriter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    NotResolved,
    Ok,
    Error,
    DependencyError,
    Failed,
}

impl ServiceStatus {
    #[inline]
    #[must_use]
    pub const fn is_bad(self) -> bool {
        matches!(self, Self::Error | Self::DependencyError | Self::Failed)
    }

    #[inline]
    #[must_use]
    pub const fn is_good(self) -> bool {
        !self.is_bad()
    }
}

/// Result of resolving one type under one contract set.
///
/// Immutable once published to a cache; every dependency links to the service it was resolved from,
/// so the whole construction tree can be inspected or rendered with [`Self::construction_log`].
#[derive(Debug)]
pub struct ContainerService {
    pub(crate) type_info: TypeInfo,
    pub(crate) name: Option<String>,
    pub(crate) status: ServiceStatus,
    pub(crate) declared_contracts: Vec<String>,
    pub(crate) used_contracts: Vec<String>,
    pub(crate) dependencies: Vec<ServiceDependency>,
    pub(crate) instances: Vec<Instance>,
    pub(crate) comment: Option<String>,
    pub(crate) message: Option<String>,
    pub(crate) is_static: bool,
    pub(crate) unused_dependency_configurations: Vec<String>,
}

impl ContainerService {
    #[must_use]
    pub(crate) fn new(type_info: TypeInfo) -> Self {
        Self {
            type_info,
            name: None,
            status: ServiceStatus::NotResolved,
            declared_contracts: Vec::new(),
            used_contracts: Vec::new(),
            dependencies: Vec::new(),
            instances: Vec::new(),
            comment: None,
            message: None,
            is_static: false,
            unused_dependency_configurations: Vec::new(),
        }
    }

    /// Records a child outcome. A bad child makes the service a dependency error, and the contracts
    /// it used count as used by this service when they are declared here too.
    pub(crate) fn add_dependency(&mut self, dependency: ServiceDependency) {
        if dependency.status.is_bad() && !self.status.is_bad() {
            self.status = ServiceStatus::DependencyError;
        }
        if let Some(service) = &dependency.service {
            for contract in &service.used_contracts {
                if self.declared_contracts.iter().any(|declared| contract_eq(declared, contract)) {
                    self.use_contract(contract);
                }
            }
        }
        self.dependencies.push(dependency);
    }

    #[inline]
    pub(crate) fn add_instance(&mut self, instance: Instance) {
        if !self.instances.iter().any(|existing| existing.ptr_eq(&instance)) {
            self.instances.push(instance);
        }
    }

    #[inline]
    pub(crate) fn use_contract(&mut self, contract: &str) {
        if !self.used_contracts.iter().any(|used| contract_eq(used, contract)) {
            self.used_contracts.push(contract.to_string());
        }
    }

    /// Orders used contracts as they were declared
    pub(crate) fn sort_used_contracts(&mut self) {
        let declared = &self.declared_contracts;
        self.used_contracts.sort_by_key(|used| {
            declared
                .iter()
                .position(|declared| contract_eq(declared, used))
                .unwrap_or(usize::MAX)
        });
    }

    /// Merges the outcome of another combination of contracts into this aggregate
    pub(crate) fn union_from(&mut self, other: &Arc<ContainerService>) {
        for instance in &other.instances {
            self.add_instance(instance.clone());
        }
        for contract in &other.used_contracts {
            self.use_contract(contract);
        }
        self.dependencies.push(ServiceDependency::from_service(other.clone()));
        if other.status.is_bad() && !self.status.is_bad() {
            self.status = other.status;
            self.message = other.error_message();
        }
    }

    /// Final status once all dependencies are added
    #[inline]
    pub(crate) fn end_resolve_dependencies(&mut self) {
        if self.status.is_good() {
            self.status = if self.instances.is_empty() {
                ServiceStatus::NotResolved
            } else {
                ServiceStatus::Ok
            };
        }
    }

    #[inline]
    pub(crate) fn end_not_resolved(&mut self) {
        self.instances.clear();
        self.status = ServiceStatus::NotResolved;
    }

    #[inline]
    pub(crate) fn end_with_error(&mut self, message: impl Into<String>) {
        self.instances.clear();
        self.message = Some(message.into());
        self.status = ServiceStatus::Error;
    }

    #[inline]
    pub(crate) fn end_with_failure(&mut self, message: impl Into<String>) {
        self.instances.clear();
        self.message = Some(message.into());
        self.status = ServiceStatus::Failed;
    }

    #[inline]
    #[must_use]
    pub const fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    #[must_use]
    pub const fn status(&self) -> ServiceStatus {
        self.status
    }

    /// Contracts declared when the service was resolved
    #[inline]
    #[must_use]
    pub fn declared_contracts(&self) -> &[String] {
        &self.declared_contracts
    }

    /// Declared contracts whose configuration affected the service or its dependencies
    #[inline]
    #[must_use]
    pub fn used_contracts(&self) -> &[String] {
        &self.used_contracts
    }

    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &[ServiceDependency] {
        &self.dependencies
    }

    #[inline]
    #[must_use]
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    #[inline]
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    #[inline]
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.is_static
    }

    /// Named dependency overrides the constructor never consulted
    #[inline]
    #[must_use]
    pub fn unused_dependency_configurations(&self) -> &[String] {
        &self.unused_dependency_configurations
    }

    /// First error message found in the construction tree
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        if matches!(self.status, ServiceStatus::Error | ServiceStatus::Failed) {
            if let Some(message) = &self.message {
                return Some(message.clone());
            }
        }
        self.dependencies.iter().find_map(|dependency| {
            if dependency.status == ServiceStatus::Error {
                if let Some(comment) = &dependency.comment {
                    return Some(comment.clone());
                }
            }
            dependency.service.as_ref().and_then(|service| {
                if service.status.is_bad() {
                    service.error_message()
                } else {
                    None
                }
            })
        })
    }

    #[must_use]
    pub fn construction_log(&self) -> String {
        let mut writer = ConstructionLogWriter::new();
        writer.write_service(self, None);
        writer.finish()
    }

    /// Fails with the first error of the construction tree if the service isn't usable
    pub fn check(&self) -> Result<(), ResolveErrorKind> {
        if self.status.is_bad() {
            return Err(ResolveErrorKind::Failed {
                type_name: self.type_info.short_name(),
                message: self.error_message().unwrap_or_default(),
                log: self.construction_log(),
            });
        }
        Ok(())
    }

    /// The single instance of the service
    pub fn single<T: ?Sized + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        self.check()?;
        match self.instances.as_slice() {
            [] => Err(ResolveErrorKind::NotResolved {
                type_name: self.type_info.short_name(),
                log: self.construction_log(),
            }),
            [instance] => instance.downcast::<T>().ok_or(ResolveErrorKind::IncorrectType {
                expected: type_name::<T>(),
                actual: instance.type_info().name,
            }),
            instances => Err(ResolveErrorKind::ManyImplementations {
                type_name: self.type_info.short_name(),
                count: instances.len(),
            }),
        }
    }

    /// Every instance of the service, possibly none
    pub fn all<T: ?Sized + 'static>(&self) -> Result<Vec<Arc<T>>, ResolveErrorKind> {
        self.check()?;
        self.instances
            .iter()
            .map(|instance| {
                instance.downcast::<T>().ok_or(ResolveErrorKind::IncorrectType {
                    expected: type_name::<T>(),
                    actual: instance.type_info().name,
                })
            })
            .collect()
    }
}
