use alloc::{
    boxed::Box,
    collections::{BTreeMap, BTreeSet},
    string::String,
    sync::Arc,
    vec::Vec,
};
use tracing::debug;

use crate::{
    any::{Instance, TypeInfo},
    configuration::{
        normalize_contract, BindingConfiguration, ConfigurationKind, ContractConfiguration, DependencyConfiguration,
        ImplementationConfiguration, ImplementationSelector, ImplementationSelectorDecision, ServiceConfiguration,
        ServiceConfigurationSet, ServiceName,
    },
    universe::{TypeDescriptor, TypeUniverse},
};

type DynamicConfigurator = Box<dyn Fn(&TypeDescriptor, ServiceConfigurationBuilder) -> ServiceConfigurationBuilder>;

struct DynamicConfiguration {
    base: Option<TypeInfo>,
    configure: DynamicConfigurator,
}

/// Builder of one [`ServiceConfiguration`]
pub struct ServiceConfigurationBuilder {
    configuration: ServiceConfiguration,
}

impl ServiceConfigurationBuilder {
    #[inline]
    #[must_use]
    fn new(configuration: ServiceConfiguration) -> Self {
        Self { configuration }
    }

    #[inline]
    fn binding(&mut self) -> &mut BindingConfiguration {
        self.configuration.binding.get_or_insert_with(BindingConfiguration::default)
    }

    #[inline]
    fn implementation(&mut self) -> &mut ImplementationConfiguration {
        self.configuration
            .implementation
            .get_or_insert_with(ImplementationConfiguration::default)
    }

    /// Resolves the type through `I` instead of searching for implementations
    #[inline]
    #[must_use]
    pub fn use_implementation<I: ?Sized + 'static>(self) -> Self {
        self.use_implementation_type(TypeInfo::of::<I>())
    }

    #[inline]
    #[must_use]
    pub fn use_implementation_type(mut self, type_info: TypeInfo) -> Self {
        let types = self.binding().implementation_types.get_or_insert_with(Vec::new);
        if !types.contains(&type_info) {
            types.push(type_info);
        }
        self
    }

    /// Searches the universe for implementations even when some are configured explicitly
    #[inline]
    #[must_use]
    pub fn use_autosearch(mut self, use_autosearch: bool) -> Self {
        self.binding().use_autosearch = use_autosearch;
        self
    }

    #[inline]
    #[must_use]
    pub fn dont_use(mut self) -> Self {
        self.binding().dont_use = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn use_instance<V: Send + Sync + 'static>(self, value: V) -> Self {
        self.use_instance_arc(Arc::new(value))
    }

    /// Same as [`Self::use_instance`], for trait objects
    #[inline]
    #[must_use]
    pub fn use_instance_arc<V: ?Sized + Send + Sync + 'static>(mut self, value: Arc<V>) -> Self {
        self.binding().instance = Some(Instance::from_arc(value));
        self
    }

    /// Resolves `D` before the type is constructed
    #[inline]
    #[must_use]
    pub fn implicit_dependency<D: ?Sized + 'static>(self) -> Self {
        self.implicit_dependency_name(ServiceName::of::<D>())
    }

    #[inline]
    #[must_use]
    pub fn implicit_dependency_name(mut self, name: ServiceName) -> Self {
        self.binding().implicit_dependencies.push(name);
        self
    }

    #[inline]
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.binding().comment = Some(comment.into());
        self
    }

    /// Passes `value` as the argument of the constructor parameter named `name`
    #[inline]
    #[must_use]
    pub fn dependency<V: Send + Sync + 'static>(mut self, name: impl Into<String>, value: V) -> Self {
        self.implementation()
            .by_name
            .insert(name.into(), DependencyConfiguration::Value(Instance::new(value)));
        self
    }

    /// Passes `value` as the argument of every constructor parameter of type `P`
    #[inline]
    #[must_use]
    pub fn dependency_of_type<P: ?Sized + 'static, V: Send + Sync + 'static>(mut self, value: V) -> Self {
        self.implementation()
            .by_type
            .insert(TypeInfo::of::<P>(), DependencyConfiguration::Value(Instance::new(value)));
        self
    }

    /// Resolves `I` for the constructor parameter named `name`
    #[inline]
    #[must_use]
    pub fn dependency_implementation<I: ?Sized + 'static>(mut self, name: impl Into<String>) -> Self {
        self.implementation()
            .by_name
            .insert(name.into(), DependencyConfiguration::Implementation(TypeInfo::of::<I>()));
        self
    }

    #[inline]
    #[must_use]
    fn build(self) -> ServiceConfiguration {
        self.configuration
    }
}

/// Collects overrides defined under one contract chain
pub struct ContractBuilder {
    contracts: Vec<String>,
    builder: ConfigurationBuilder,
}

impl ContractBuilder {
    #[inline]
    #[must_use]
    pub fn configure<T: ?Sized + 'static>(
        self,
        configure: impl FnOnce(ServiceConfigurationBuilder) -> ServiceConfigurationBuilder,
    ) -> Self {
        self.configure_type(TypeInfo::of::<T>(), configure)
    }

    #[inline]
    #[must_use]
    pub fn configure_type(
        self,
        type_info: TypeInfo,
        configure: impl FnOnce(ServiceConfigurationBuilder) -> ServiceConfigurationBuilder,
    ) -> Self {
        let Self { contracts, builder } = self;
        Self {
            builder: builder.configure_with_contracts(type_info, &contracts, configure),
            contracts,
        }
    }
}

/// Mutable builder of a [`ConfigurationRegistry`]
#[derive(Default)]
pub struct ConfigurationBuilder {
    configurations: BTreeMap<TypeInfo, ServiceConfigurationSet>,
    contracts: Vec<ContractConfiguration>,
    dynamic_configurations: Vec<DynamicConfiguration>,
    implementation_selectors: Vec<ImplementationSelector>,
    static_services: BTreeSet<TypeInfo>,
}

impl ConfigurationBuilder {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Global (no contract) overrides of `T`
    #[inline]
    #[must_use]
    pub fn configure<T: ?Sized + 'static>(
        self,
        configure: impl FnOnce(ServiceConfigurationBuilder) -> ServiceConfigurationBuilder,
    ) -> Self {
        self.configure_type(TypeInfo::of::<T>(), configure)
    }

    #[inline]
    #[must_use]
    pub fn configure_type(
        self,
        type_info: TypeInfo,
        configure: impl FnOnce(ServiceConfigurationBuilder) -> ServiceConfigurationBuilder,
    ) -> Self {
        self.configure_with_contracts(type_info, &[], configure)
    }

    fn configure_with_contracts(
        mut self,
        type_info: TypeInfo,
        contracts: &[String],
        configure: impl FnOnce(ServiceConfigurationBuilder) -> ServiceConfigurationBuilder,
    ) -> Self {
        let set = self.configurations.entry(type_info).or_default();
        let configuration = configure(ServiceConfigurationBuilder::new(set.take(contracts))).build();
        set.insert(configuration);
        self
    }

    /// Defines a contract. The last of `names` is the contract, the preceding ones are
    /// the contracts that must be declared before it for the definition to apply.
    ///
    /// # Panics
    /// Panics if `names` is empty
    #[must_use]
    pub fn contract<I, S>(mut self, names: I, configure: impl FnOnce(ContractBuilder) -> ContractBuilder) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut contracts = names.into_iter().map(Into::into).collect::<Vec<String>>();
        let name = contracts.pop().expect("contract definition needs a name");
        let definition = ContractConfiguration::new(name, contracts);

        if !self.contracts.iter().any(|contract| contract.key == definition.key) {
            self.contracts.push(definition.clone());
        }

        configure(ContractBuilder {
            contracts: definition.required_contracts.iter().chain([&definition.name]).cloned().collect(),
            builder: self,
        })
        .builder
    }

    /// Defines `name` as an alias expanding to each of `names`, appending to an existing union
    #[inline]
    #[must_use]
    pub fn contracts_union<I, S>(self, name: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.define_contracts_union(name.into(), names.into_iter().map(Into::into).collect(), false)
    }

    /// Same as [`Self::contracts_union`], but replaces an existing union
    #[inline]
    #[must_use]
    pub fn contracts_union_replace<I, S>(self, name: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.define_contracts_union(name.into(), names.into_iter().map(Into::into).collect(), true)
    }

    fn define_contracts_union(mut self, name: String, names: Vec<String>, clear_old: bool) -> Self {
        let key = [normalize_contract(&name)];
        let index = match self.contracts.iter().position(|contract| contract.key == key) {
            Some(index) => index,
            None => {
                self.contracts.push(ContractConfiguration::new(name, Vec::new()));
                self.contracts.len() - 1
            }
        };

        let union = self.contracts[index].union_contract_names.get_or_insert_with(Vec::new);
        if clear_old {
            union.clear();
        }
        union.extend(names);
        self
    }

    /// Configures every universe type (or every implementation of `base`) not configured otherwise.
    /// Configurators run at build time in registration order, the first one to configure a type wins.
    #[inline]
    #[must_use]
    pub fn filtered(
        mut self,
        base: Option<TypeInfo>,
        configure: impl Fn(&TypeDescriptor, ServiceConfigurationBuilder) -> ServiceConfigurationBuilder + 'static,
    ) -> Self {
        self.dynamic_configurations.push(DynamicConfiguration {
            base,
            configure: Box::new(configure),
        });
        self
    }

    #[inline]
    #[must_use]
    pub fn implementation_selector(
        mut self,
        selector: impl Fn(&TypeInfo, &[TypeInfo]) -> Vec<ImplementationSelectorDecision> + Send + Sync + 'static,
    ) -> Self {
        self.implementation_selectors.push(Arc::new(selector));
        self
    }

    /// Caches `T` in the static container even when requested from a local one
    #[inline]
    #[must_use]
    pub fn static_service<T: ?Sized + 'static>(mut self) -> Self {
        self.static_services.insert(TypeInfo::of::<T>());
        self
    }

    #[must_use]
    pub fn build(self, universe: &TypeUniverse) -> ConfigurationRegistry {
        self.build_with_parent(universe, None)
    }

    #[must_use]
    pub(crate) fn build_with_parent(
        self,
        universe: &TypeUniverse,
        parent: Option<Arc<ConfigurationRegistry>>,
    ) -> ConfigurationRegistry {
        let Self {
            mut configurations,
            contracts,
            dynamic_configurations,
            implementation_selectors,
            static_services,
        } = self;

        for DynamicConfiguration { base, configure } in &dynamic_configurations {
            let descriptors = match base {
                Some(base) => universe
                    .inheritors_of(base)
                    .iter()
                    .filter_map(|type_info| universe.get(type_info))
                    .collect::<Vec<_>>(),
                None => universe.types().collect(),
            };

            for descriptor in descriptors {
                if configurations.contains_key(&descriptor.type_info) {
                    continue;
                }

                let configuration = configure(descriptor, ServiceConfigurationBuilder::new(ServiceConfiguration::default())).build();
                if configuration.is_empty() {
                    continue;
                }

                debug!(service = descriptor.type_info.name, "Configured dynamically");
                configurations
                    .entry(descriptor.type_info)
                    .or_default()
                    .insert(configuration);
            }
        }

        let mut contracts_by_name = BTreeMap::<String, Vec<ContractConfiguration>>::new();
        for contract in contracts {
            contracts_by_name
                .entry(normalize_contract(&contract.name))
                .or_default()
                .push(contract);
        }

        ConfigurationRegistry {
            configurations,
            contracts: contracts_by_name,
            implementation_selectors,
            static_services,
            parent,
        }
    }
}

/// Immutable index of configuration overrides
pub struct ConfigurationRegistry {
    configurations: BTreeMap<TypeInfo, ServiceConfigurationSet>,
    contracts: BTreeMap<String, Vec<ContractConfiguration>>,
    implementation_selectors: Vec<ImplementationSelector>,
    static_services: BTreeSet<TypeInfo>,
    parent: Option<Arc<ConfigurationRegistry>>,
}

impl ConfigurationRegistry {
    #[inline]
    #[must_use]
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::new()
    }

    /// Record of `type_info` under exactly `contracts`, compared case-insensitively
    #[must_use]
    pub fn get_configuration_or_null(&self, type_info: &TypeInfo, contracts: &[String]) -> Option<&ServiceConfiguration> {
        self.configurations
            .get(type_info)
            .and_then(|set| set.get_by_contracts(contracts))
            .or_else(|| {
                self.parent
                    .as_ref()
                    .and_then(|parent| parent.get_configuration_or_null(type_info, contracts))
            })
    }

    /// Configuration of kind `K` stored under a normalized contract key
    pub(crate) fn get_kind_or_null<K: ConfigurationKind>(&self, type_info: &TypeInfo, key: &[String]) -> Option<&K> {
        self.configurations
            .get(type_info)
            .and_then(|set| set.get(key))
            .and_then(K::select)
            .or_else(|| {
                self.parent
                    .as_ref()
                    .and_then(|parent| parent.get_kind_or_null(type_info, key))
            })
    }

    /// Alternatives of a union contract, `None` when `contract` isn't a union
    #[must_use]
    pub fn get_contracts_union_or_null(&self, contract: &str) -> Option<&[String]> {
        self.contracts
            .get(&normalize_contract(contract))
            .and_then(|definitions| {
                definitions
                    .iter()
                    .find_map(ContractConfiguration::union_contract_names)
            })
            .or_else(|| {
                self.parent
                    .as_ref()
                    .and_then(|parent| parent.get_contracts_union_or_null(contract))
            })
    }

    /// Definitions of `contract`, local ones first
    #[must_use]
    pub fn get_contract_configurations(&self, contract: &str) -> Vec<&ContractConfiguration> {
        let mut definitions = self
            .contracts
            .get(&normalize_contract(contract))
            .map(|definitions| definitions.iter().collect::<Vec<_>>())
            .unwrap_or_default();

        if let Some(parent) = &self.parent {
            for definition in parent.get_contract_configurations(contract) {
                if !definitions.iter().any(|local| local.key == definition.key) {
                    definitions.push(definition);
                }
            }
        }
        definitions
    }

    /// Selectors of the parent registries first
    #[must_use]
    pub fn get_implementation_selectors(&self) -> Vec<&ImplementationSelector> {
        let mut selectors = self
            .parent
            .as_ref()
            .map(|parent| parent.get_implementation_selectors())
            .unwrap_or_default();
        selectors.extend(self.implementation_selectors.iter());
        selectors
    }

    #[must_use]
    pub fn is_static(&self, type_info: &TypeInfo) -> bool {
        self.static_services.contains(type_info) || self.parent.as_ref().is_some_and(|parent| parent.is_static(type_info))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::ConfigurationRegistry;
    use crate::{
        any::TypeInfo,
        configuration::{BindingConfiguration, DependencyConfiguration, ImplementationConfiguration},
        universe::TypeUniverse,
    };

    use alloc::{
        format,
        string::{String, ToString as _},
        sync::Arc,
        vec,
        vec::Vec,
    };
    use tracing_test::traced_test;

    trait Transport: Send + Sync {}

    struct Smtp;
    struct Sendmail;
    struct Mailer;

    impl Transport for Smtp {}
    impl Transport for Sendmail {}

    fn universe() -> TypeUniverse {
        TypeUniverse::new()
            .register::<Smtp>(|d| d.constructor(&[], || Ok(Smtp)).implements::<dyn Transport>(|value| value))
            .register::<Sendmail>(|d| d.constructor(&[], || Ok(Sendmail)).implements::<dyn Transport>(|value| value))
            .register::<Mailer>(|d| d.constructor(&[], || Ok(Mailer)))
    }

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| String::from(*name)).collect()
    }

    #[test]
    #[traced_test]
    fn test_configure_merges() {
        let registry = ConfigurationRegistry::builder()
            .configure::<Mailer>(|c| c.dependency("retries", 3_u8))
            .configure::<Mailer>(|c| c.comment("outgoing mail"))
            .build(&universe());

        let configuration = registry
            .get_configuration_or_null(&TypeInfo::of::<Mailer>(), &[])
            .unwrap();
        assert_eq!(configuration.binding().and_then(BindingConfiguration::comment), Some("outgoing mail"));
        assert!(matches!(
            configuration.implementation().unwrap().by_name.get("retries"),
            Some(DependencyConfiguration::Value(_))
        ));
    }

    #[test]
    #[traced_test]
    fn test_contract_definitions() {
        let registry = ConfigurationRegistry::builder()
            .contract(["Production"], |c| c.configure::<Mailer>(|c| c.dependency("retries", 5_u8)))
            .contract(["production", "eu"], |c| c.configure::<Mailer>(|c| c.dependency("retries", 7_u8)))
            .build(&universe());

        assert_eq!(registry.get_contract_configurations("PRODUCTION").len(), 1);
        let eu = registry.get_contract_configurations("eu");
        assert_eq!(eu.len(), 1);
        assert_eq!(eu[0].required_contracts(), ["production"]);

        let mailer = TypeInfo::of::<Mailer>();
        assert!(registry.get_configuration_or_null(&mailer, &strings(&["production"])).is_some());
        assert!(registry
            .get_configuration_or_null(&mailer, &strings(&["Production", "EU"]))
            .is_some());
        assert!(registry.get_configuration_or_null(&mailer, &strings(&["eu"])).is_none());
        assert!(registry.get_configuration_or_null(&mailer, &[]).is_none());
        assert!(registry
            .get_kind_or_null::<ImplementationConfiguration>(&mailer, eu[0].key())
            .is_some());
        assert!(registry
            .get_kind_or_null::<BindingConfiguration>(&mailer, eu[0].key())
            .is_none());
    }

    #[test]
    #[traced_test]
    fn test_contracts_union() {
        let registry = ConfigurationRegistry::builder()
            .contracts_union("all", ["a", "b"])
            .contracts_union("ALL", ["c"])
            .contracts_union_replace("other", ["x"])
            .contracts_union_replace("other", ["y", "z"])
            .build(&universe());

        assert_eq!(registry.get_contracts_union_or_null("all"), Some(&strings(&["a", "b", "c"])[..]));
        assert_eq!(registry.get_contracts_union_or_null("other"), Some(&strings(&["y", "z"])[..]));
        assert_eq!(registry.get_contracts_union_or_null("a"), None);
    }

    #[test]
    #[traced_test]
    fn test_filtered_first_wins() {
        let registry = ConfigurationRegistry::builder()
            .configure::<Smtp>(|c| c.comment("explicit"))
            .filtered(Some(TypeInfo::of::<dyn Transport>()), |_, c| c.comment("transport"))
            .filtered(None, |descriptor, c| {
                if descriptor.type_info() == TypeInfo::of::<Mailer>() {
                    c.comment("any")
                } else {
                    c
                }
            })
            .build(&universe());

        let comment = |type_info: TypeInfo| {
            registry
                .get_configuration_or_null(&type_info, &[])
                .and_then(|configuration| configuration.binding())
                .and_then(BindingConfiguration::comment)
        };
        assert_eq!(comment(TypeInfo::of::<Smtp>()), Some("explicit"));
        assert_eq!(comment(TypeInfo::of::<Sendmail>()), Some("transport"));
        assert_eq!(comment(TypeInfo::of::<Mailer>()), Some("any"));
    }

    #[test]
    #[traced_test]
    fn test_parent_layering() {
        let universe = universe();
        let parent = Arc::new(
            ConfigurationRegistry::builder()
                .configure::<Mailer>(|c| c.comment("parent"))
                .contract(["tenant"], |c| c.configure::<Mailer>(|c| c.comment("tenant")))
                .implementation_selector(|_, _| vec![])
                .static_service::<Smtp>()
                .build(&universe),
        );
        let local = ConfigurationRegistry::builder()
            .configure::<Sendmail>(|c| c.comment("local"))
            .implementation_selector(|_, _| vec![])
            .build_with_parent(&universe, Some(parent));

        assert!(local.get_configuration_or_null(&TypeInfo::of::<Mailer>(), &[]).is_some());
        assert!(local.get_configuration_or_null(&TypeInfo::of::<Sendmail>(), &[]).is_some());
        assert_eq!(local.get_contract_configurations("tenant").len(), 1);
        assert_eq!(local.get_implementation_selectors().len(), 2);
        assert!(local.is_static(&TypeInfo::of::<Smtp>()));
        assert!(!local.is_static(&TypeInfo::of::<Mailer>()));
    }
}
