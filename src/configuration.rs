use alloc::{
    collections::BTreeMap,
    string::String,
    sync::Arc,
    vec::Vec,
};

use crate::{
    any::{Instance, TypeInfo},
    dependency_resolver::Parameter,
};

/// Contract names compare case-insensitively
#[inline]
#[must_use]
pub(crate) fn normalize_contract(name: &str) -> String {
    name.to_lowercase()
}

#[inline]
#[must_use]
pub(crate) fn contract_eq(left: &str, right: &str) -> bool {
    normalize_contract(left) == normalize_contract(right)
}

/// Type requested under a list of contracts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceName {
    pub type_info: TypeInfo,
    pub contracts: Vec<String>,
}

impl ServiceName {
    #[inline]
    #[must_use]
    pub fn new(type_info: TypeInfo, contracts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            type_info,
            contracts: contracts.into_iter().map(Into::into).collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            contracts: Vec::new(),
        }
    }
}

impl core::fmt::Display for ServiceName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.type_info)?;
        if !self.contracts.is_empty() {
            write!(f, "[{}]", self.contracts.join("->"))?;
        }
        Ok(())
    }
}

/// How a type is bound to its implementations
#[derive(Debug, Clone, Default)]
pub struct BindingConfiguration {
    pub(crate) implementation_types: Option<Vec<TypeInfo>>,
    pub(crate) use_autosearch: bool,
    pub(crate) dont_use: bool,
    pub(crate) instance: Option<Instance>,
    pub(crate) implicit_dependencies: Vec<ServiceName>,
    pub(crate) comment: Option<String>,
}

impl BindingConfiguration {
    #[inline]
    #[must_use]
    pub fn implementation_types(&self) -> Option<&[TypeInfo]> {
        self.implementation_types.as_deref()
    }

    #[inline]
    #[must_use]
    pub const fn use_autosearch(&self) -> bool {
        self.use_autosearch
    }

    #[inline]
    #[must_use]
    pub const fn dont_use(&self) -> bool {
        self.dont_use
    }

    #[inline]
    #[must_use]
    pub const fn instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn implicit_dependencies(&self) -> &[ServiceName] {
        &self.implicit_dependencies
    }

    #[inline]
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

#[derive(Debug, Clone)]
pub enum DependencyConfiguration {
    /// Constant passed as the argument
    Value(Instance),
    /// Type resolved in place of the parameter type
    Implementation(TypeInfo),
}

/// Constructor-argument overrides of a concrete type
#[derive(Debug, Clone, Default)]
pub struct ImplementationConfiguration {
    pub(crate) by_name: BTreeMap<String, DependencyConfiguration>,
    pub(crate) by_type: BTreeMap<TypeInfo, DependencyConfiguration>,
}

impl ImplementationConfiguration {
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty() && self.by_type.is_empty()
    }

    /// Override for `parameter`, looked up by name then by type. The name key is returned when matched by name.
    #[must_use]
    pub fn get_or_null(&self, parameter: &Parameter) -> Option<(&DependencyConfiguration, Option<&str>)> {
        if let Some((name, configuration)) = self.by_name.get_key_value(parameter.name) {
            return Some((configuration, Some(name.as_str())));
        }
        self.by_type
            .get(&parameter.type_info)
            .map(|configuration| (configuration, None))
    }

    #[inline]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }
}

/// Override record of one type under one exact contract combination
#[derive(Debug, Clone, Default)]
pub struct ServiceConfiguration {
    pub(crate) contracts: Vec<String>,
    pub(crate) binding: Option<BindingConfiguration>,
    pub(crate) implementation: Option<ImplementationConfiguration>,
}

impl ServiceConfiguration {
    #[inline]
    #[must_use]
    pub(crate) fn new(contracts: Vec<String>) -> Self {
        Self {
            contracts,
            binding: None,
            implementation: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn contracts(&self) -> &[String] {
        &self.contracts
    }

    #[inline]
    #[must_use]
    pub const fn binding(&self) -> Option<&BindingConfiguration> {
        self.binding.as_ref()
    }

    #[inline]
    #[must_use]
    pub const fn implementation(&self) -> Option<&ImplementationConfiguration> {
        self.implementation.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.binding.is_none() && self.implementation.as_ref().map_or(true, ImplementationConfiguration::is_empty)
    }
}

/// Configuration kind looked up through the contract stack
pub(crate) trait ConfigurationKind {
    fn select(configuration: &ServiceConfiguration) -> Option<&Self>;
}

impl ConfigurationKind for BindingConfiguration {
    #[inline]
    fn select(configuration: &ServiceConfiguration) -> Option<&Self> {
        configuration.binding.as_ref()
    }
}

impl ConfigurationKind for ImplementationConfiguration {
    #[inline]
    fn select(configuration: &ServiceConfiguration) -> Option<&Self> {
        configuration.implementation.as_ref()
    }
}

/// Records of one type, keyed by normalized contract combination
#[derive(Debug, Clone, Default)]
pub(crate) struct ServiceConfigurationSet {
    configurations: BTreeMap<Vec<String>, ServiceConfiguration>,
}

impl ServiceConfigurationSet {
    #[inline]
    #[must_use]
    pub(crate) fn get(&self, key: &[String]) -> Option<&ServiceConfiguration> {
        self.configurations.get(key)
    }

    #[must_use]
    pub(crate) fn get_by_contracts(&self, contracts: &[String]) -> Option<&ServiceConfiguration> {
        let key = contracts.iter().map(|name| normalize_contract(name)).collect::<Vec<_>>();
        self.get(&key)
    }

    #[inline]
    pub(crate) fn take(&mut self, contracts: &[String]) -> ServiceConfiguration {
        let key = contracts.iter().map(|name| normalize_contract(name)).collect::<Vec<_>>();
        self.configurations
            .remove(&key)
            .unwrap_or_else(|| ServiceConfiguration::new(contracts.to_vec()))
    }

    #[inline]
    pub(crate) fn insert(&mut self, configuration: ServiceConfiguration) {
        let key = configuration
            .contracts
            .iter()
            .map(|name| normalize_contract(name))
            .collect::<Vec<_>>();
        self.configurations.insert(key, configuration);
    }
}

/// Named configuration scope, applicable when its prerequisites are declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractConfiguration {
    pub(crate) name: String,
    pub(crate) required_contracts: Vec<String>,
    pub(crate) union_contract_names: Option<Vec<String>>,
    pub(crate) key: Vec<String>,
}

impl ContractConfiguration {
    #[must_use]
    pub(crate) fn new(name: String, required_contracts: Vec<String>) -> Self {
        let key = required_contracts
            .iter()
            .chain(core::iter::once(&name))
            .map(|name| normalize_contract(name))
            .collect();
        Self {
            name,
            required_contracts,
            union_contract_names: None,
            key,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn required_contracts(&self) -> &[String] {
        &self.required_contracts
    }

    #[inline]
    #[must_use]
    pub fn union_contract_names(&self) -> Option<&[String]> {
        self.union_contract_names.as_deref()
    }

    /// Key of the per-type records defined by this contract: prerequisites then the name, normalized
    #[inline]
    #[must_use]
    pub fn key(&self) -> &[String] {
        &self.key
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImplementationSelectorDecision {
    Include(TypeInfo),
    Exclude(TypeInfo),
}

/// Global rule adjusting the candidate implementations of a type
pub type ImplementationSelector = Arc<dyn Fn(&TypeInfo, &[TypeInfo]) -> Vec<ImplementationSelectorDecision> + Send + Sync>;
