//! Lazily resolved member caches.
//!
//! A wrapper type declares the members it needs once, as `static` caches
//! built from a descriptor supplier. The first call resolves the member
//! against whichever runtime it is given; later calls with the same runtime
//! reuse it, and a call with a different runtime resolves again.
//!
//! ```
//! use scripting_reflect::{MethodCache, MethodDescriptor};
//!
//! static ENUM_NAME: MethodCache =
//!     MethodCache::new(|| MethodDescriptor::new("java.lang.Enum", "name", &[]));
//! ```

use parking_lot::{const_mutex, Mutex};

use crate::{
    AnyValue, Class, Constructor, Executable, Field, Method, Object, Result, Runtime, RuntimeId,
};

/// A recipe for resolving one class member.
pub trait MemberDescriptor {
    type Member: Clone;

    fn resolve<R: Runtime + ?Sized>(&self, rt: &mut R) -> Result<Self::Member>;

    fn runtime_of(member: &Self::Member) -> RuntimeId;
}

fn resolve_classes<R: Runtime + ?Sized>(rt: &mut R, names: &[&str]) -> Result<Vec<Class>> {
    names.iter().map(|name| rt.resolve_class(name)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    pub owner: &'static str,
    pub name: &'static str,
    pub field_type: &'static str,
}

impl FieldDescriptor {
    pub const fn new(owner: &'static str, name: &'static str, field_type: &'static str) -> Self {
        Self {
            owner,
            name,
            field_type,
        }
    }
}

impl MemberDescriptor for FieldDescriptor {
    type Member = Field;

    fn resolve<R: Runtime + ?Sized>(&self, rt: &mut R) -> Result<Field> {
        let owner = rt.resolve_class(self.owner)?;
        let field_type = rt.resolve_class(self.field_type)?;
        rt.resolve_field(&owner, self.name, &field_type)
    }

    fn runtime_of(member: &Field) -> RuntimeId {
        member.object().runtime()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub owner: &'static str,
    pub name: &'static str,
    pub parameter_types: &'static [&'static str],
}

impl MethodDescriptor {
    pub const fn new(
        owner: &'static str,
        name: &'static str,
        parameter_types: &'static [&'static str],
    ) -> Self {
        Self {
            owner,
            name,
            parameter_types,
        }
    }
}

impl MemberDescriptor for MethodDescriptor {
    type Member = Method;

    fn resolve<R: Runtime + ?Sized>(&self, rt: &mut R) -> Result<Method> {
        let owner = rt.resolve_class(self.owner)?;
        let parameter_types = resolve_classes(rt, self.parameter_types)?;
        rt.resolve_method(&owner, self.name, &parameter_types)
    }

    fn runtime_of(member: &Method) -> RuntimeId {
        member.object().runtime()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstructorDescriptor {
    pub owner: &'static str,
    pub parameter_types: &'static [&'static str],
}

impl ConstructorDescriptor {
    pub const fn new(owner: &'static str, parameter_types: &'static [&'static str]) -> Self {
        Self {
            owner,
            parameter_types,
        }
    }
}

impl MemberDescriptor for ConstructorDescriptor {
    type Member = Constructor;

    fn resolve<R: Runtime + ?Sized>(&self, rt: &mut R) -> Result<Constructor> {
        let owner = rt.resolve_class(self.owner)?;
        let parameter_types = resolve_classes(rt, self.parameter_types)?;
        rt.resolve_constructor(&owner, &parameter_types)
    }

    fn runtime_of(member: &Constructor) -> RuntimeId {
        member.object().runtime()
    }
}

/// Memoizes one member per runtime identity.
pub struct MemberCache<D: MemberDescriptor> {
    supplier: fn() -> D,
    slot: Mutex<Option<D::Member>>,
}

pub type FieldCache = MemberCache<FieldDescriptor>;
pub type MethodCache = MemberCache<MethodDescriptor>;
pub type ConstructorCache = MemberCache<ConstructorDescriptor>;

impl<D: MemberDescriptor> MemberCache<D> {
    pub const fn new(supplier: fn() -> D) -> Self {
        Self {
            supplier,
            slot: const_mutex(None),
        }
    }

    /// Returns the member resolved against `rt`, resolving it if needed.
    ///
    /// A failed resolution leaves the cache untouched.
    pub fn ensure<R: Runtime + ?Sized>(&self, rt: &mut R) -> Result<D::Member> {
        let id = rt.id();
        {
            let slot = self.slot.lock();
            if let Some(member) = slot.as_ref().filter(|m| D::runtime_of(*m) == id) {
                return Ok(member.clone());
            }
        }
        let member = (self.supplier)().resolve(rt)?;
        *self.slot.lock() = Some(member.clone());
        Ok(member)
    }

    /// Forgets the memoized member.
    pub fn reset(&self) {
        self.slot.lock().take();
    }
}

impl MemberCache<FieldDescriptor> {
    pub fn get<R: Runtime + ?Sized>(&self, rt: &mut R, owner: &Object) -> Result<AnyValue> {
        let field = self.ensure(rt)?;
        rt.get_field(&field, Some(owner))
    }

    pub fn set<R: Runtime + ?Sized>(
        &self,
        rt: &mut R,
        owner: &Object,
        value: &AnyValue,
    ) -> Result<()> {
        let field = self.ensure(rt)?;
        rt.set_field(&field, Some(owner), value)
    }

    pub fn get_static<R: Runtime + ?Sized>(&self, rt: &mut R) -> Result<AnyValue> {
        let field = self.ensure(rt)?;
        rt.get_field(&field, None)
    }

    pub fn set_static<R: Runtime + ?Sized>(&self, rt: &mut R, value: &AnyValue) -> Result<()> {
        let field = self.ensure(rt)?;
        rt.set_field(&field, None, value)
    }
}

impl MemberCache<MethodDescriptor> {
    pub fn invoke<R: Runtime + ?Sized>(
        &self,
        rt: &mut R,
        owner: &Object,
        args: &[AnyValue],
    ) -> Result<AnyValue> {
        let method = self.ensure(rt)?;
        rt.invoke(&method, Some(owner), args)
    }

    pub fn invoke_static<R: Runtime + ?Sized>(
        &self,
        rt: &mut R,
        args: &[AnyValue],
    ) -> Result<AnyValue> {
        let method = self.ensure(rt)?;
        rt.invoke(&method, None, args)
    }
}

impl MemberCache<ConstructorDescriptor> {
    pub fn construct<R: Runtime + ?Sized>(&self, rt: &mut R, args: &[AnyValue]) -> Result<Object> {
        let constructor = self.ensure(rt)?;
        rt.construct(&constructor, args)
    }
}
