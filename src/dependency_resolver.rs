use alloc::{string::String, vec, vec::Vec};

use crate::{
    any::{Instance, TypeInfo},
    errors::InstantiateErrorKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Exactly one implementation is injected
    Single,
    /// Every implementation is injected
    All,
}

/// Formal constructor parameter as seen by the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: &'static str,
    pub type_info: TypeInfo,
    pub kind: ParameterKind,
    pub optional: bool,
    /// Contracts declared while this parameter is resolved
    pub contracts: Vec<String>,
}

impl Parameter {
    #[inline]
    #[must_use]
    pub fn new(name: &'static str, type_info: TypeInfo, kind: ParameterKind) -> Self {
        Self {
            name,
            type_info,
            kind,
            optional: false,
            contracts: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Value handed to a constructor for one parameter
#[derive(Debug, Clone)]
pub enum ArgumentValue {
    Missing,
    Single(Instance),
    All(Vec<Instance>),
}

pub trait DependencyResolver: Sized {
    fn parameter(name: &'static str) -> Parameter;

    fn resolve(name: &'static str, value: ArgumentValue) -> Result<Self, InstantiateErrorKind>;

    #[inline]
    #[must_use]
    fn type_info() -> TypeInfo
    where
        Self: 'static,
    {
        TypeInfo::of::<Self>()
    }
}

/// Constructor argument list, implemented for tuples of [`DependencyResolver`]
pub trait Dependencies: Sized {
    const ARITY: usize;

    fn parameters(names: &[&'static str]) -> Vec<Parameter>;

    fn resolve(names: &[&'static str], values: Vec<ArgumentValue>) -> Result<Self, InstantiateErrorKind>;
}

macro_rules! impl_dependencies {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_mut)]
        impl<$($ty,)*> Dependencies for ($($ty,)*)
        where
            $( $ty: DependencyResolver, )*
        {
            const ARITY: usize = 0 $(+ count_one!($ty))*;

            #[inline]
            #[allow(unused_variables)]
            fn parameters(names: &[&'static str]) -> Vec<Parameter> {
                let mut names = names.iter().copied();
                vec![$($ty::parameter(names.next().unwrap_or_default()),)*]
            }

            #[inline]
            #[allow(unused_variables)]
            fn resolve(names: &[&'static str], values: Vec<ArgumentValue>) -> Result<Self, InstantiateErrorKind> {
                let mut names = names.iter().copied();
                let mut values = values.into_iter();
                Ok(($(
                    $ty::resolve(
                        names.next().unwrap_or_default(),
                        values.next().unwrap_or(ArgumentValue::Missing),
                    )?,
                )*))
            }
        }
    };
}

all_the_tuples!(impl_dependencies);

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{ArgumentValue, Dependencies, ParameterKind};
    use crate::{
        any::{Instance, TypeInfo},
        errors::InstantiateErrorKind,
        inject::{Inject, InjectAll},
    };

    use alloc::{
        format,
        string::{String, ToString as _},
        vec,
        vec::Vec,
    };
    use tracing_test::traced_test;

    struct Database;
    struct Plugin(u8);

    type Deps = (Inject<Database>, InjectAll<Plugin>, Option<Inject<u32>>);

    #[test]
    #[traced_test]
    fn test_parameters() {
        assert_eq!(Deps::ARITY, 3);
        assert_eq!(<()>::ARITY, 0);

        let parameters = Deps::parameters(&["database", "plugins", "retries"]);
        assert_eq!(parameters.len(), 3);

        assert_eq!(parameters[0].name, "database");
        assert_eq!(parameters[0].type_info, TypeInfo::of::<Database>());
        assert_eq!(parameters[0].kind, ParameterKind::Single);
        assert!(!parameters[0].optional);

        assert_eq!(parameters[1].type_info, TypeInfo::of::<Plugin>());
        assert_eq!(parameters[1].kind, ParameterKind::All);

        assert_eq!(parameters[2].type_info, TypeInfo::of::<u32>());
        assert!(parameters[2].optional);
    }

    #[test]
    #[traced_test]
    fn test_resolve() {
        let names = ["database", "plugins", "retries"];
        let (Inject(_database), InjectAll(plugins), retries) = Deps::resolve(
            &names,
            vec![
                ArgumentValue::Single(Instance::new(Database)),
                ArgumentValue::All(vec![Instance::new(Plugin(1)), Instance::new(Plugin(2))]),
                ArgumentValue::Missing,
            ],
        )
        .unwrap();

        assert_eq!(plugins.iter().map(|plugin| plugin.0).collect::<Vec<_>>(), [1, 2]);
        assert!(retries.is_none());

        let result = Deps::resolve(&names, vec![ArgumentValue::Single(Instance::new(Plugin(1)))]);
        assert!(matches!(
            result,
            Err(InstantiateErrorKind::IncorrectArgument { name: "database", .. })
        ));
    }
}
