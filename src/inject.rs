use alloc::{sync::Arc, vec::Vec};
use core::any::type_name;

use crate::{
    any::TypeInfo,
    dependency_resolver::{ArgumentValue, DependencyResolver, Parameter, ParameterKind},
    errors::InstantiateErrorKind,
};

/// Injects the single implementation of `Dep`
pub struct Inject<Dep: ?Sized>(pub Arc<Dep>);

impl<Dep: ?Sized + 'static> DependencyResolver for Inject<Dep> {
    fn parameter(name: &'static str) -> Parameter {
        Parameter::new(name, TypeInfo::of::<Dep>(), ParameterKind::Single)
    }

    fn resolve(name: &'static str, value: ArgumentValue) -> Result<Self, InstantiateErrorKind> {
        match value {
            ArgumentValue::Single(instance) => instance.downcast::<Dep>().map(Self),
            _ => None,
        }
        .ok_or(InstantiateErrorKind::IncorrectArgument {
            name,
            expected: type_name::<Dep>(),
        })
    }

    fn type_info() -> TypeInfo {
        TypeInfo::of::<Dep>()
    }
}

/// Injects every implementation of `Dep`, in candidate order
pub struct InjectAll<Dep: ?Sized>(pub Vec<Arc<Dep>>);

impl<Dep: ?Sized + 'static> DependencyResolver for InjectAll<Dep> {
    fn parameter(name: &'static str) -> Parameter {
        Parameter::new(name, TypeInfo::of::<Dep>(), ParameterKind::All)
    }

    fn resolve(name: &'static str, value: ArgumentValue) -> Result<Self, InstantiateErrorKind> {
        match value {
            ArgumentValue::All(instances) => instances
                .iter()
                .map(|instance| instance.downcast::<Dep>())
                .collect::<Option<Vec<_>>>()
                .map(Self),
            _ => None,
        }
        .ok_or(InstantiateErrorKind::IncorrectArgument {
            name,
            expected: type_name::<Dep>(),
        })
    }

    fn type_info() -> TypeInfo {
        TypeInfo::of::<Dep>()
    }
}

/// Optional parameter: `None` when the dependency isn't resolved
impl<Dep: DependencyResolver> DependencyResolver for Option<Dep> {
    fn parameter(name: &'static str) -> Parameter {
        Dep::parameter(name).optional()
    }

    fn resolve(name: &'static str, value: ArgumentValue) -> Result<Self, InstantiateErrorKind> {
        match value {
            ArgumentValue::Missing => Ok(None),
            value => Dep::resolve(name, value).map(Some),
        }
    }
}
