use alloc::string::String;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractErrorKind {
    #[error("contract [{name}] already declared, all declared contracts [{declared}]")]
    AlreadyDeclared { name: String, declared: String },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainerErrorKind {
    #[error("local container [{name}] can only be created from a static container")]
    NotStatic { name: String },
}
