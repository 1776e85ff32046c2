use alloc::{
    format,
    string::{String, ToString as _},
    sync::Arc,
    vec::Vec,
};

use crate::{
    any::{Instance, TypeInfo},
    container_service::{ContainerService, ServiceStatus},
    dependency_resolver::{ArgumentValue, Parameter},
    utils::simple::{dump_value, is_simple_type, widen},
};

#[derive(Debug, Clone)]
pub enum DependencyValue {
    None,
    Single(Instance),
    All(Vec<Instance>),
}

/// Resolved outcome of one constructor parameter, implicit dependency or implementation
#[derive(Debug, Clone)]
pub struct ServiceDependency {
    pub(crate) service: Option<Arc<ContainerService>>,
    pub(crate) value: DependencyValue,
    pub(crate) name: String,
    pub(crate) comment: Option<String>,
    pub(crate) status: ServiceStatus,
    pub(crate) constant: bool,
}

impl ServiceDependency {
    fn new(service: Option<Arc<ContainerService>>, name: String, status: ServiceStatus) -> Self {
        Self {
            service,
            value: DependencyValue::None,
            name,
            comment: None,
            status,
            constant: false,
        }
    }

    /// Configured value passed to `parameter`
    #[must_use]
    pub(crate) fn constant(parameter: &Parameter, value: Instance) -> Self {
        let name = if is_simple_type(&value.type_info()) {
            parameter.name.to_string()
        } else {
            value.type_info().short_name()
        };
        Self {
            value: DependencyValue::Single(value),
            constant: true,
            ..Self::new(None, name, ServiceStatus::Ok)
        }
    }

    #[must_use]
    pub(crate) fn service(service: Arc<ContainerService>, value: DependencyValue) -> Self {
        let name = service.type_info.short_name();
        Self {
            value,
            ..Self::new(Some(service), name, ServiceStatus::Ok)
        }
    }

    /// Dependency on a resolved service, status taken from the service
    #[must_use]
    pub(crate) fn from_service(service: Arc<ContainerService>) -> Self {
        match service.status {
            ServiceStatus::Ok => {
                let value = DependencyValue::All(service.instances.clone());
                Self::service(service, value)
            }
            ServiceStatus::NotResolved => {
                let name = service.type_info.short_name();
                Self::not_resolved(Some(service), name)
            }
            _ => Self::service_error(service),
        }
    }

    #[must_use]
    pub(crate) fn not_resolved(service: Option<Arc<ContainerService>>, name: impl Into<String>) -> Self {
        Self::new(service, name.into(), ServiceStatus::NotResolved)
    }

    #[must_use]
    pub(crate) fn error(service: Option<Arc<ContainerService>>, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            comment: Some(message.into()),
            ..Self::new(service, name.into(), ServiceStatus::Error)
        }
    }

    /// Dependency on a service that failed itself
    #[must_use]
    pub(crate) fn service_error(service: Arc<ContainerService>) -> Self {
        let name = service.type_info.short_name();
        Self::new(Some(service), name, ServiceStatus::DependencyError)
    }

    #[inline]
    #[must_use]
    pub(crate) fn with_comment(mut self, comment: impl Into<String>) -> Self {
        if self.status != ServiceStatus::Error {
            self.comment = Some(comment.into());
        }
        self
    }

    /// Converts a single value to the parameter type.
    ///
    /// Optional parameters already carry their inner type, so only identity and
    /// lossless integer widening remain.
    #[must_use]
    pub(crate) fn cast_to(self, parameter: &Parameter) -> Self {
        let DependencyValue::Single(instance) = &self.value else {
            return self;
        };
        if instance.type_info() == parameter.type_info {
            return self;
        }

        match widen(instance, &parameter.type_info) {
            Some(value) => Self {
                value: DependencyValue::Single(value),
                ..self
            },
            None => {
                let message = cast_error(instance, &parameter.type_info, parameter.name);
                Self::error(self.service, parameter.name, message)
            }
        }
    }

    /// Argument passed to the constructor
    #[must_use]
    pub(crate) fn argument(&self) -> ArgumentValue {
        match (&self.status, &self.value) {
            (ServiceStatus::Ok, DependencyValue::Single(instance)) => ArgumentValue::Single(instance.clone()),
            (ServiceStatus::Ok, DependencyValue::All(instances)) => ArgumentValue::All(instances.clone()),
            _ => ArgumentValue::Missing,
        }
    }

    #[inline]
    #[must_use]
    pub fn service_ref(&self) -> Option<&ContainerService> {
        self.service.as_deref()
    }

    #[inline]
    #[must_use]
    pub const fn value(&self) -> &DependencyValue {
        &self.value
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    #[inline]
    #[must_use]
    pub const fn status(&self) -> ServiceStatus {
        self.status
    }

    #[inline]
    #[must_use]
    pub const fn is_constant(&self) -> bool {
        self.constant
    }
}

pub(crate) fn cast_error(instance: &Instance, target: &TypeInfo, parameter: &str) -> String {
    let source = instance.type_info();
    format!(
        "can't cast value [{}] from [{}] to [{}] for dependency [{}]",
        dump_value(instance).unwrap_or_else(|| source.short_name()),
        source,
        target,
        parameter,
    )
}
