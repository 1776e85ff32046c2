use alloc::string::String;

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("no implementations for [{type_name}]\n{log}")]
    NotResolved { type_name: String, log: String },
    #[error("many implementations for [{type_name}], found {count}")]
    ManyImplementations { type_name: String, count: usize },
    #[error("service [{type_name}] construction failed: {message}\n\n{log}")]
    Failed {
        type_name: String,
        message: String,
        log: String,
    },
    #[error("Incorrect instance type. Actual: {actual}, expected: {expected}")]
    IncorrectType {
        expected: &'static str,
        actual: &'static str,
    },
}
