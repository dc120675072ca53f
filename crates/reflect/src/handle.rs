//! Remote handles: objects, classes and class members.
//!
//! Every handle is an opaque `i32` pointer issued by the remote agent plus
//! the identity of the runtime that issued it. Handles are plain values; the
//! host never releases them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_RUNTIME_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one runtime instance.
///
/// Two runtimes never share an id within a process, even after one of them
/// is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuntimeId(u64);

impl RuntimeId {
    pub fn next() -> Self {
        Self(NEXT_RUNTIME_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Names of the target's primitive types.
pub const PRIMITIVE_TYPES: [&str; 8] = [
    "byte", "short", "int", "long", "float", "double", "boolean", "char",
];

/// Fully qualified name of the target's string type.
pub const STRING_TYPE: &str = "java.lang.String";

/// A reference to a live object in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Object {
    runtime: RuntimeId,
    pointer: i32,
}

impl Object {
    pub fn new(runtime: RuntimeId, pointer: i32) -> Self {
        Self { runtime, pointer }
    }

    pub fn runtime(&self) -> RuntimeId {
        self.runtime
    }

    pub fn pointer(&self) -> i32 {
        self.pointer
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Object @{:08X}>", self.pointer)
    }
}

#[derive(Debug)]
struct ClassInner {
    object: Object,
    name: String,
}

/// A class handle. Clones share identity, see [`Class::ptr_eq`].
#[derive(Debug, Clone)]
pub struct Class {
    inner: Arc<ClassInner>,
}

impl Class {
    pub fn new(object: Object, name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ClassInner {
                object,
                name: name.into(),
            }),
        }
    }

    pub fn object(&self) -> &Object {
        &self.inner.object
    }

    pub fn pointer(&self) -> i32 {
        self.inner.object.pointer
    }

    pub fn runtime(&self) -> RuntimeId {
        self.inner.object.runtime
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn is_primitive(&self) -> bool {
        PRIMITIVE_TYPES.contains(&self.name())
    }

    /// True when both values are the very same memoized class.
    pub fn ptr_eq(a: &Class, b: &Class) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.inner.object == other.inner.object
    }
}

impl Eq for Class {}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Class {}>", self.name())
    }
}

/// State shared by fields, methods and constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMember {
    object: Object,
    owner: Class,
    name: String,
}

impl ClassMember {
    pub fn new(object: Object, owner: Class, name: impl Into<String>) -> Self {
        Self {
            object,
            owner,
            name: name.into(),
        }
    }

    pub fn object(&self) -> &Object {
        &self.object
    }

    pub fn owner(&self) -> &Class {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    member: ClassMember,
    field_type: Class,
}

impl Field {
    pub fn new(member: ClassMember, field_type: Class) -> Self {
        Self { member, field_type }
    }

    pub fn object(&self) -> &Object {
        &self.member.object
    }

    pub fn owner(&self) -> &Class {
        &self.member.owner
    }

    pub fn name(&self) -> &str {
        &self.member.name
    }

    pub fn field_type(&self) -> &Class {
        &self.field_type
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Field {} {}.{}>",
            self.field_type.name(),
            self.owner().name(),
            self.name()
        )
    }
}

/// Something that can be invoked remotely: a method or a constructor.
pub trait Executable {
    fn object(&self) -> &Object;

    fn parameter_types(&self) -> &[Class];
}

fn join_names(types: &[Class]) -> String {
    types.iter().map(Class::name).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    member: ClassMember,
    parameter_types: Vec<Class>,
}

impl Method {
    pub fn new(member: ClassMember, parameter_types: Vec<Class>) -> Self {
        Self {
            member,
            parameter_types,
        }
    }

    pub fn owner(&self) -> &Class {
        &self.member.owner
    }

    pub fn name(&self) -> &str {
        &self.member.name
    }

    /// The empty name is the wire's way of addressing a constructor.
    pub fn is_constructor(&self) -> bool {
        self.member.name.is_empty()
    }
}

impl Executable for Method {
    fn object(&self) -> &Object {
        &self.member.object
    }

    fn parameter_types(&self) -> &[Class] {
        &self.parameter_types
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Method {}.{}({})>",
            self.owner().name(),
            self.name(),
            join_names(&self.parameter_types)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constructor {
    member: ClassMember,
    parameter_types: Vec<Class>,
}

impl Constructor {
    pub fn new(object: Object, owner: Class, parameter_types: Vec<Class>) -> Self {
        Self {
            member: ClassMember::new(object, owner, ""),
            parameter_types,
        }
    }

    pub fn owner(&self) -> &Class {
        &self.member.owner
    }
}

impl Executable for Constructor {
    fn object(&self) -> &Object {
        &self.member.object
    }

    fn parameter_types(&self) -> &[Class] {
        &self.parameter_types
    }
}

impl fmt::Display for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Constructor {}({})>",
            self.owner().name(),
            join_names(&self.parameter_types)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_ids_are_unique() {
        let a = RuntimeId::next();
        let b = RuntimeId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn empty_method_name_is_constructor_slot() {
        let rt = RuntimeId::next();
        let owner = Class::new(Object::new(rt, 1), "a.B");
        let init = Method::new(ClassMember::new(Object::new(rt, 2), owner.clone(), ""), vec![]);
        let run = Method::new(ClassMember::new(Object::new(rt, 3), owner, "run"), vec![]);
        assert!(init.is_constructor());
        assert!(!run.is_constructor());
    }

    #[test]
    fn class_identity_and_equality() {
        let rt = RuntimeId::next();
        let a = Class::new(Object::new(rt, 5), "java.lang.String");
        let b = a.clone();
        let c = Class::new(Object::new(rt, 5), "java.lang.String");
        assert!(Class::ptr_eq(&a, &b));
        assert!(!Class::ptr_eq(&a, &c));
        assert_eq!(a, c);
    }

    #[test]
    fn primitive_names() {
        let rt = RuntimeId::next();
        assert!(Class::new(Object::new(rt, 0), "boolean").is_primitive());
        assert!(!Class::new(Object::new(rt, 1), "java.lang.Integer").is_primitive());
    }

    #[test]
    fn display_forms() {
        let rt = RuntimeId::next();
        let owner = Class::new(Object::new(rt, 1), "a.B");
        let int = Class::new(Object::new(rt, 2), "int");
        let method = Method::new(
            ClassMember::new(Object::new(rt, 3), owner.clone(), "sum"),
            vec![int.clone(), int.clone()],
        );
        assert_eq!(method.to_string(), "<Method a.B.sum(int, int)>");
        assert_eq!(Object::new(rt, 255).to_string(), "<Object @000000FF>");
        let ctor = Constructor::new(Object::new(rt, 4), owner, vec![int]);
        assert_eq!(ctor.to_string(), "<Constructor a.B(int)>");
    }
}
