//! Handle/object model and runtime contract for the scripting bridge.
//!
//! # Overview
//!
//! - [`Object`], [`Class`], [`Field`], [`Method`], [`Constructor`] - opaque
//!   handles into a live target, tagged with the [`RuntimeId`] that issued them
//! - [`AnyValue`] - every value that can cross the bridge
//! - [`Runtime`] - the blocking reflection operations a transport implements
//! - [`FieldCache`], [`MethodCache`], [`ConstructorCache`] - per-runtime member
//!   memoization for wrapper types
//! - [`Wrapper`] - the contract wrapper types implement

mod cache;
mod error;
mod handle;
mod runtime;
mod value;
mod wrapper;

pub use cache::{
    ConstructorCache, ConstructorDescriptor, FieldCache, FieldDescriptor, MemberCache,
    MemberDescriptor, MethodCache, MethodDescriptor,
};
pub use error::{ReflectError, Result};
pub use handle::{
    Class, ClassMember, Constructor, Executable, Field, Method, Object, RuntimeId,
    PRIMITIVE_TYPES, STRING_TYPE,
};
pub use runtime::{check_arity, check_owner, Runtime};
pub use value::AnyValue;
pub use wrapper::Wrapper;
