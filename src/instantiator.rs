use alloc::{string::String, sync::Arc, vec::Vec};
use core::fmt;

use super::{
    any::Instance,
    dependency_resolver::{ArgumentValue, Dependencies, DependencyResolver, Parameter},
    errors::InstantiateErrorKind,
};

pub trait Instantiator<Deps>: Send + Sync + 'static
where
    Deps: Dependencies,
{
    type Provides: Send + Sync + 'static;
    type Error: Into<InstantiateErrorKind>;

    fn instantiate(&self, dependencies: Deps) -> Result<Self::Provides, Self::Error>;
}

pub(crate) type BoxedInstantiator = Arc<dyn Fn(Vec<ArgumentValue>) -> Result<Instance, InstantiateErrorKind> + Send + Sync>;

#[must_use]
pub(crate) fn boxed_instantiator<Inst, Deps>(names: &'static [&'static str], instantiator: Inst) -> BoxedInstantiator
where
    Inst: Instantiator<Deps>,
    Deps: Dependencies,
{
    Arc::new(move |values| {
        let dependencies = Deps::resolve(names, values)?;
        let provides = instantiator.instantiate(dependencies).map_err(Into::into)?;
        Ok(Instance::new(provides))
    })
}

macro_rules! impl_instantiator {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, Response, Err, $($ty,)*> Instantiator<($($ty,)*)> for F
        where
            F: Fn($($ty,)*) -> Result<Response, Err> + Send + Sync + 'static,
            Response: Send + Sync + 'static,
            Err: Into<InstantiateErrorKind>,
            $( $ty: DependencyResolver, )*
        {
            type Provides = Response;
            type Error = Err;

            fn instantiate(&self, ($($ty,)*): ($($ty,)*)) -> Result<Self::Provides, Self::Error> {
                self($($ty,)*)
            }
        }
    };
}

all_the_tuples!(impl_instantiator);

/// One way of constructing a type: ordered parameters and the closure consuming them
#[derive(Clone)]
pub struct Constructor {
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) marked: bool,
    pub(crate) instantiator: BoxedInstantiator,
}

impl Constructor {
    /// # Panics
    /// Panics if the number of `names` differs from the number of constructor arguments
    #[must_use]
    pub fn new<Inst, Deps>(names: &'static [&'static str], instantiator: Inst) -> Self
    where
        Inst: Instantiator<Deps>,
        Deps: Dependencies,
    {
        assert_eq!(
            names.len(),
            Deps::ARITY,
            "constructor of {} has {} arguments, but {} names given",
            core::any::type_name::<Inst::Provides>(),
            Deps::ARITY,
            names.len(),
        );

        Self {
            parameters: Deps::parameters(names),
            marked: false,
            instantiator: boxed_instantiator(names, instantiator),
        }
    }

    /// Marks the constructor as the one to use when a type has several
    #[inline]
    #[must_use]
    pub fn marked(mut self) -> Self {
        self.marked = true;
        self
    }

    /// Declares `contract` while the parameter named `parameter` is resolved
    #[inline]
    #[must_use]
    pub fn require_contract(mut self, parameter: &str, contract: impl Into<String>) -> Self {
        let contract = contract.into();
        for item in self.parameters.iter_mut().filter(|item| item.name == parameter) {
            item.contracts.push(contract.clone());
        }
        self
    }

    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    #[inline]
    #[must_use]
    pub const fn is_marked(&self) -> bool {
        self.marked
    }

    #[inline]
    pub(crate) fn invoke(&self, arguments: Vec<ArgumentValue>) -> Result<Instance, InstantiateErrorKind> {
        (self.instantiator)(arguments)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("parameters", &self.parameters)
            .field("marked", &self.marked)
            .finish_non_exhaustive()
    }
}
