#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructorErrorKind {
    #[error("no constructors")]
    NoConstructors,
    #[error("many constructors ({count}) and not exactly one of them is marked for container use")]
    ManyConstructors { count: usize },
}
