#![no_std]

extern crate alloc;

#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod binder;
pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod configuration;
pub(crate) mod container;
pub(crate) mod container_service;
pub(crate) mod context;
pub(crate) mod dependency;
pub(crate) mod dependency_resolver;
pub(crate) mod errors;
pub(crate) mod inject;
pub(crate) mod instantiator;
pub(crate) mod log;
pub(crate) mod registry;
pub(crate) mod universe;
pub(crate) mod utils;

pub use any::{Instance, TypeInfo};
pub use config::Config;
pub use configuration::{
    BindingConfiguration, ContractConfiguration, DependencyConfiguration, ImplementationConfiguration,
    ImplementationSelector, ImplementationSelectorDecision, ServiceConfiguration, ServiceName,
};
pub use container::{CacheLevel, Container};
pub use container_service::{ContainerService, ServiceStatus};
pub use dependency::{DependencyValue, ServiceDependency};
pub use dependency_resolver::{ArgumentValue, Dependencies, DependencyResolver, Parameter, ParameterKind};
pub use errors::{ConstructorErrorKind, ContainerErrorKind, ContractErrorKind, InstantiateErrorKind, ResolveErrorKind};
pub use inject::{Inject, InjectAll};
pub use instantiator::{Constructor, Instantiator};
pub use registry::{ConfigurationBuilder, ConfigurationRegistry, ContractBuilder, ServiceConfigurationBuilder};
pub use universe::{TypeDescriptor, TypeDescriptorBuilder, TypeUniverse};
