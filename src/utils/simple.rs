use alloc::string::{String, ToString as _};
use core::any::TypeId;

use crate::any::{Instance, TypeInfo};

macro_rules! simple_types {
    ($($ty:ty),* $(,)?) => {
        /// Primitive and string types that the container never constructs
        pub(crate) fn is_simple_type(type_info: &TypeInfo) -> bool {
            [$(TypeId::of::<$ty>()),*].contains(&type_info.id)
        }

        /// Renders a simple value for the construction log, `None` for other types
        pub(crate) fn dump_value(instance: &Instance) -> Option<String> {
            $(
                if let Some(value) = instance.downcast::<$ty>() {
                    return Some(value.to_string());
                }
            )*
            None
        }
    };
}

simple_types!(
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str,
);

macro_rules! widen_from {
    ($instance:ident, $target:ident, $from:ty => [$($to:ty),*]) => {
        if let Some(value) = $instance.downcast::<$from>() {
            $(
                if $target.id == TypeId::of::<$to>() {
                    return Some(Instance::new(<$to>::from(*value)));
                }
            )*
            return None;
        }
    };
}

/// Lossless integer conversion of `instance` to `target`
pub(crate) fn widen(instance: &Instance, target: &TypeInfo) -> Option<Instance> {
    widen_from!(instance, target, i8 => [i16, i32, i64, i128]);
    widen_from!(instance, target, i16 => [i32, i64, i128]);
    widen_from!(instance, target, i32 => [i64, i128]);
    widen_from!(instance, target, i64 => [i128]);
    widen_from!(instance, target, u8 => [u16, u32, u64, u128, i16, i32, i64, i128]);
    widen_from!(instance, target, u16 => [u32, u64, u128, i32, i64, i128]);
    widen_from!(instance, target, u32 => [u64, u128, i64, i128]);
    widen_from!(instance, target, u64 => [u128, i128]);
    None
}
