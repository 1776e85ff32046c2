use alloc::{collections::BTreeMap, sync::Arc, vec::Vec};
use core::{fmt, marker::PhantomData};

use crate::{
    any::{Instance, TypeInfo},
    dependency_resolver::Dependencies,
    errors::InstantiateErrorKind,
    instantiator::{Constructor, Instantiator},
};

type Caster = Arc<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;

/// Metadata of one concrete type known to the container
pub struct TypeDescriptor {
    pub(crate) type_info: TypeInfo,
    pub(crate) definition: Option<TypeInfo>,
    pub(crate) constructors: Vec<Constructor>,
    pub(crate) casters: BTreeMap<TypeInfo, Caster>,
    pub(crate) is_static: bool,
}

impl TypeDescriptor {
    fn new(type_info: TypeInfo) -> Self {
        Self {
            type_info,
            definition: None,
            constructors: Vec::new(),
            casters: BTreeMap::new(),
            is_static: false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    /// Marker of the open generic definition this type is an instantiation of
    #[inline]
    #[must_use]
    pub const fn definition(&self) -> Option<TypeInfo> {
        self.definition
    }

    #[inline]
    #[must_use]
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    #[inline]
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.is_static
    }

    #[inline]
    #[must_use]
    pub fn implements(&self, type_info: &TypeInfo) -> bool {
        self.casters.contains_key(type_info)
    }

    /// Upcasts an instance of this type to one of the types it implements
    #[must_use]
    pub fn cast(&self, instance: &Instance, target: &TypeInfo) -> Option<Instance> {
        if *target == self.type_info {
            return Some(instance.clone());
        }
        self.casters.get(target).and_then(|caster| caster(instance))
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_info", &self.type_info)
            .field("definition", &self.definition)
            .field("constructors", &self.constructors)
            .field("implements", &self.casters.keys().collect::<Vec<_>>())
            .field("is_static", &self.is_static)
            .finish()
    }
}

pub struct TypeDescriptorBuilder<T> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> TypeDescriptorBuilder<T> {
    #[inline]
    #[must_use]
    fn new() -> Self {
        Self {
            descriptor: TypeDescriptor::new(TypeInfo::of::<T>()),
            _marker: PhantomData,
        }
    }

    /// Adds a constructor with the given parameter names.
    ///
    /// # Panics
    /// Panics if the number of `names` differs from the number of constructor arguments
    #[inline]
    #[must_use]
    pub fn constructor<Inst, Deps>(self, names: &'static [&'static str], instantiator: Inst) -> Self
    where
        Inst: Instantiator<Deps, Provides = T, Error = InstantiateErrorKind>,
        Deps: Dependencies,
    {
        self.with_constructor(Constructor::new(names, instantiator))
    }

    /// Same as [`Self::constructor`], but the constructor is the one used when there are several
    ///
    /// # Panics
    /// Panics if the number of `names` differs from the number of constructor arguments
    #[inline]
    #[must_use]
    pub fn marked_constructor<Inst, Deps>(self, names: &'static [&'static str], instantiator: Inst) -> Self
    where
        Inst: Instantiator<Deps, Provides = T, Error = InstantiateErrorKind>,
        Deps: Dependencies,
    {
        self.with_constructor(Constructor::new(names, instantiator).marked())
    }

    #[inline]
    #[must_use]
    fn with_constructor(mut self, constructor: Constructor) -> Self {
        self.descriptor.constructors.push(constructor);
        self
    }

    /// Declares `contract` while parameter `parameter` of any constructor is resolved
    #[inline]
    #[must_use]
    pub fn require_contract(mut self, parameter: &str, contract: &str) -> Self {
        self.descriptor.constructors = self
            .descriptor
            .constructors
            .into_iter()
            .map(|constructor| constructor.require_contract(parameter, contract))
            .collect();
        self
    }

    /// Declares that `T` implements `I`, `cast` performs the upcast (usually `|value| value`)
    #[inline]
    #[must_use]
    pub fn implements<I>(mut self, cast: fn(Arc<T>) -> Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.descriptor.casters.insert(
            TypeInfo::of::<I>(),
            Arc::new(move |instance: &Instance| instance.downcast::<T>().map(|value| Instance::from_arc(cast(value)))),
        );
        self
    }

    /// Declares `T` as an instantiation of the open generic definition marked by `D`
    #[inline]
    #[must_use]
    pub fn definition<D: ?Sized + 'static>(mut self) -> Self {
        self.descriptor.definition = Some(TypeInfo::of::<D>());
        self
    }

    #[inline]
    #[must_use]
    pub fn static_service(mut self) -> Self {
        self.descriptor.is_static = true;
        self
    }
}

/// Closed set of types the container may construct
#[derive(Default, Debug)]
pub struct TypeUniverse {
    types: BTreeMap<TypeInfo, TypeDescriptor>,
    order: Vec<TypeInfo>,
    inheritors: BTreeMap<TypeInfo, Vec<TypeInfo>>,
}

impl TypeUniverse {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T`. Registering a type again replaces its previous descriptor.
    #[must_use]
    pub fn register<T>(mut self, describe: impl FnOnce(TypeDescriptorBuilder<T>) -> TypeDescriptorBuilder<T>) -> Self
    where
        T: Send + Sync + 'static,
    {
        let descriptor = describe(TypeDescriptorBuilder::new()).descriptor;
        let type_info = descriptor.type_info;

        if self.types.contains_key(&type_info) {
            for inheritors in self.inheritors.values_mut() {
                inheritors.retain(|inheritor| *inheritor != type_info);
            }
        } else {
            self.order.push(type_info);
        }
        for base in descriptor.casters.keys() {
            self.inheritors.entry(*base).or_default().push(type_info);
        }
        self.types.insert(type_info, descriptor);
        self
    }

    #[inline]
    #[must_use]
    pub fn get(&self, type_info: &TypeInfo) -> Option<&TypeDescriptor> {
        self.types.get(type_info)
    }

    /// Descriptors in registration order
    #[inline]
    pub fn types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.order.iter().filter_map(|type_info| self.types.get(type_info))
    }

    /// Types implementing `type_info`, in registration order
    #[inline]
    #[must_use]
    pub fn inheritors_of(&self, type_info: &TypeInfo) -> &[TypeInfo] {
        self.inheritors.get(type_info).map(Vec::as_slice).unwrap_or_default()
    }
}
