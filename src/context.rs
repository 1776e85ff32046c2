use alloc::{
    collections::BTreeSet,
    format,
    string::{String, ToString as _},
    sync::Arc,
    vec,
    vec::Vec,
};
use core::sync::atomic::{AtomicUsize, Ordering};
use itertools::Itertools as _;
use tracing::{debug, error, warn};

use crate::{
    any::TypeInfo,
    cache::RequestId,
    configuration::{contract_eq, normalize_contract, ConfigurationKind, ContractConfiguration},
    container::{CacheLevel, Container},
    container_service::ContainerService,
    errors::ContractErrorKind,
    registry::ConfigurationRegistry,
};

static NEXT_REQUEST_ID: AtomicUsize = AtomicUsize::new(0);

/// Active contract and the definitions of it whose prerequisites were declared when it was pushed
#[derive(Debug, Clone)]
struct ContractDeclaration {
    name: String,
    definitions: Vec<ContractConfiguration>,
}

/// Service in flight
#[derive(Debug)]
struct ResolutionFrame {
    type_info: TypeInfo,
    used_contracts: Vec<String>,
}

/// State of one top-level resolution request
#[derive(Debug)]
pub(crate) struct ResolutionContext {
    request: RequestId,
    current: Vec<ResolutionFrame>,
    current_types: BTreeSet<TypeInfo>,
    declared_contracts: Vec<ContractDeclaration>,
}

impl ResolutionContext {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            request: NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed),
            current: Vec::new(),
            current_types: BTreeSet::new(),
            declared_contracts: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub(crate) const fn request(&self) -> RequestId {
        self.request
    }

    #[must_use]
    pub(crate) fn declared_contract_names(&self) -> Vec<String> {
        self.declared_contracts
            .iter()
            .map(|declaration| declaration.name.clone())
            .collect()
    }

    /// Normalized declared contracts, part of the cache key
    #[must_use]
    pub(crate) fn declared_contracts_key(&self) -> Vec<String> {
        self.declared_contracts
            .iter()
            .map(|declaration| normalize_contract(&declaration.name))
            .collect()
    }

    #[inline]
    #[must_use]
    pub(crate) fn contract_declared(&self, name: &str) -> bool {
        self.declared_contracts
            .iter()
            .any(|declaration| contract_eq(&declaration.name, name))
    }

    #[inline]
    #[must_use]
    pub(crate) fn is_resolving(&self, type_info: &TypeInfo) -> bool {
        self.current_types.contains(type_info)
    }

    /// Declares `names` in order. On a duplicate name, names pushed by this call are popped again.
    pub(crate) fn push_contract_declarations(
        &mut self,
        registry: &ConfigurationRegistry,
        names: &[String],
    ) -> Result<(), ContractErrorKind> {
        for (pushed, name) in names.iter().enumerate() {
            if self.contract_declared(name) {
                let err = ContractErrorKind::AlreadyDeclared {
                    name: name.clone(),
                    declared: self.declared_contract_names().join("->"),
                };
                self.pop_contract_declarations(pushed);
                return Err(err);
            }

            let definitions = registry
                .get_contract_configurations(name)
                .into_iter()
                .filter(|definition| match_with_declared_contracts(&self.declared_contracts, &definition.required_contracts))
                .cloned()
                .collect();
            self.declared_contracts.push(ContractDeclaration {
                name: name.clone(),
                definitions,
            });
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn pop_contract_declarations(&mut self, count: usize) {
        let len = self.declared_contracts.len().saturating_sub(count);
        self.declared_contracts.truncate(len);
    }

    /// Most specific configuration of kind `K`: innermost declared contract first, then global.
    /// A contract configuration found marks the contract and its prerequisites as used.
    pub(crate) fn get_or_null<'r, K: ConfigurationKind>(
        &mut self,
        registry: &'r ConfigurationRegistry,
        type_info: &TypeInfo,
    ) -> Option<&'r K> {
        for declaration in self.declared_contracts.iter().rev() {
            for definition in &declaration.definitions {
                let Some(configuration) = registry.get_kind_or_null::<K>(type_info, definition.key()) else {
                    continue;
                };
                if let Some(frame) = self.current.last_mut() {
                    for contract in core::iter::once(&declaration.name).chain(&definition.required_contracts) {
                        if !frame.used_contracts.iter().any(|used| contract_eq(used, contract)) {
                            frame.used_contracts.push(contract.clone());
                        }
                    }
                }
                return Some(configuration);
            }
        }
        registry.get_kind_or_null::<K>(type_info, &[])
    }

    /// Resolves `type_info` under `contracts`, expanding union contracts into every combination
    pub(crate) fn resolve(
        &mut self,
        type_info: TypeInfo,
        contracts: &[String],
        name: Option<&str>,
        container: &Container,
    ) -> Arc<ContainerService> {
        if contracts.is_empty() {
            return container.resolve_singleton(type_info, name, self);
        }

        let registry = container.registry();
        let unions = contracts
            .iter()
            .map(|contract| registry.get_contracts_union_or_null(contract))
            .collect::<Vec<_>>();
        if unions.iter().all(Option::is_none) {
            return self.resolve_using_contracts(type_info, name, container, contracts);
        }

        let combinations = contracts
            .iter()
            .zip(unions)
            .map(|(contract, union)| union.map_or_else(|| vec![contract.clone()], <[String]>::to_vec))
            .multi_cartesian_product();

        let mut result = ContainerService::new(type_info);
        result.name = name.map(String::from);
        result.declared_contracts = self.declared_contract_names();
        for combination in combinations {
            let service = self.resolve_using_contracts(type_info, name, container, &combination);
            result.union_from(&service);
            if result.status.is_bad() {
                warn!(contracts = ?combination, "Union combination failed");
                return Arc::new(result);
            }
        }
        result.end_resolve_dependencies();
        Arc::new(result)
    }

    /// Declares `contracts` for the duration of one singleton resolution
    pub(crate) fn resolve_using_contracts(
        &mut self,
        type_info: TypeInfo,
        name: Option<&str>,
        container: &Container,
        contracts: &[String],
    ) -> Arc<ContainerService> {
        if let Err(err) = self.push_contract_declarations(container.registry(), contracts) {
            error!("{}", err);
            let mut service = ContainerService::new(type_info);
            service.declared_contracts = self.declared_contract_names();
            service.end_with_error(err.to_string());
            return Arc::new(service);
        }
        let service = container.resolve_singleton(type_info, name, self);
        self.pop_contract_declarations(contracts.len());
        service
    }

    fn describe(&self, service: &mut ContainerService, name: Option<&str>, container: &Container) {
        service.name = name.map(String::from);
        service.declared_contracts = self.declared_contract_names();
        service.is_static = container.cache_level() == CacheLevel::Static;
    }

    /// Ends `service` as `Failed`: resolving it again from the innermost service in flight closes a cycle
    pub(crate) fn fail_cyclic(&self, service: &mut ContainerService, name: Option<&str>, container: &Container) {
        self.describe(service, name, container);

        let message = format!(
            "cyclic dependency {0} ...-> {1} -> {0}",
            service.type_info,
            self.current
                .last()
                .map_or_else(|| String::from("null"), |previous| previous.type_info.to_string()),
        );
        error!("{}", message);
        service.end_with_failure(message);
    }

    /// Constructs `service` through `container` unless its type is already in flight
    pub(crate) fn instantiate(&mut self, service: &mut ContainerService, name: Option<&str>, container: &Container) {
        let type_info = service.type_info;

        if self.current_types.contains(&type_info) {
            self.fail_cyclic(service, name, container);
            return;
        }
        self.describe(service, name, container);
        self.current_types.insert(type_info);

        self.current.push(ResolutionFrame {
            type_info,
            used_contracts: Vec::new(),
        });
        container.instantiate(service, self);
        if let Some(frame) = self.current.pop() {
            for contract in &frame.used_contracts {
                service.use_contract(contract);
            }
        }
        self.current_types.remove(&type_info);

        service.sort_used_contracts();
        debug!(status = ?service.status, "Instantiated");
    }
}

/// `required` must appear among the declared contracts in the same relative order, gaps allowed
#[must_use]
fn match_with_declared_contracts(declared: &[ContractDeclaration], required: &[String]) -> bool {
    let mut declared = declared.iter();
    required
        .iter()
        .all(|required| declared.any(|declaration| contract_eq(&declaration.name, required)))
}
