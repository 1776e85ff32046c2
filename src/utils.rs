pub(crate) mod simple;
pub(crate) mod type_name;
