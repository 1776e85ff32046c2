/// Error returned by constructor closures
#[derive(thiserror::Error, Debug)]
pub enum InstantiateErrorKind {
    #[error("argument [{name}] isn't of expected type [{expected}]")]
    IncorrectArgument {
        name: &'static str,
        expected: &'static str,
    },
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}
