mod container;
mod dependency_resolver;
mod instantiate;
mod instantiator;

pub use container::{ContainerErrorKind, ContractErrorKind};
pub use dependency_resolver::ResolveErrorKind;
pub use instantiate::InstantiateErrorKind;
pub use instantiator::ConstructorErrorKind;
