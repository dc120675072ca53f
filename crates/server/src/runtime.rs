//! [`Runtime`] over a packet channel.

use std::collections::HashMap;
use std::io::{Read, Write};

use scripting_buffers::ByteBuffer;
use scripting_reflect::{
    check_arity, check_owner, AnyValue, Class, ClassMember, Constructor, Executable, Field,
    Method, Object, ReflectError, Result, Runtime, RuntimeId,
};
use tracing::debug;

use crate::channel::PacketChannel;
use crate::packet::PacketType;
use crate::value::{get_value, put_value};
use crate::ServerConfig;

/// Name reported for constructor lookups that come back empty.
const CONSTRUCTOR_NAME: &str = "<init>";

/// Reflection runtime speaking the agent's packet protocol over `S`.
///
/// Classes are memoized by name: a repeat [`resolve_class`] returns the very
/// same [`Class`] without touching the stream.
///
/// [`resolve_class`]: Runtime::resolve_class
pub struct RemoteRuntime<S> {
    id: RuntimeId,
    channel: PacketChannel<S>,
    classes: HashMap<String, Class>,
}

impl<S: Read + Write> RemoteRuntime<S> {
    pub fn new(stream: S, config: &ServerConfig) -> Self {
        Self::with_id(RuntimeId::next(), stream, config)
    }

    pub fn with_id(id: RuntimeId, stream: S, config: &ServerConfig) -> Self {
        Self {
            id,
            channel: PacketChannel::new(stream, config),
            classes: HashMap::new(),
        }
    }

    pub fn channel(&self) -> &PacketChannel<S> {
        &self.channel
    }

    pub fn get_ref(&self) -> &S {
        self.channel.get_ref()
    }

    pub fn into_inner(self) -> S {
        self.channel.into_inner()
    }

    /// Number of memoized classes.
    pub fn cached_classes(&self) -> usize {
        self.classes.len()
    }

    /// Returns the memoized class for `name`, or memoizes a new one.
    ///
    /// A memoized class with a different pointer is left alone; the fresh
    /// handle is returned instead.
    fn remember_class(&mut self, name: String, pointer: i32) -> Class {
        if let Some(class) = self.classes.get(&name) {
            if class.pointer() == pointer {
                return class.clone();
            }
            return Class::new(Object::new(self.id, pointer), name);
        }
        let class = Class::new(Object::new(self.id, pointer), name.clone());
        debug!(class = %name, pointer, "resolved class");
        self.classes.insert(name, class.clone());
        class
    }
}

fn put_owner(buf: &mut ByteBuffer, id: RuntimeId, owner: Option<&Object>) -> Result<()> {
    match owner {
        Some(owner) => {
            check_owner(id, owner)?;
            buf.put_i32(owner.pointer())?;
        }
        None => buf.put_i32(-1)?,
    }
    Ok(())
}

fn put_count(buf: &mut ByteBuffer, count: usize) -> Result<()> {
    let count = u8::try_from(count).map_err(|_| ReflectError::TooManyArguments(count))?;
    buf.put_u8(count)?;
    Ok(())
}

/// Reads a member/class index where `-1` means "not found".
fn get_index(buf: &mut ByteBuffer) -> Result<Option<i32>> {
    match buf.get_i32()? {
        -1 => Ok(None),
        index if index >= 0 => Ok(Some(index)),
        index => Err(ReflectError::Protocol(format!("invalid handle index {index}"))),
    }
}

impl<S: Read + Write> Runtime for RemoteRuntime<S> {
    fn id(&self) -> RuntimeId {
        self.id
    }

    fn resolve_class(&mut self, name: &str) -> Result<Class> {
        if let Some(class) = self.classes.get(name) {
            return Ok(class.clone());
        }

        let buf = self.channel.begin()?;
        buf.put_string(name)?;
        let buf = self.channel.exchange(PacketType::GetClass, PacketType::Result)?;
        match get_index(buf)? {
            Some(pointer) => Ok(self.remember_class(name.to_owned(), pointer)),
            None => Err(ReflectError::ClassNotFound(name.to_owned())),
        }
    }

    fn resolve_class_of(&mut self, obj: &Object) -> Result<Class> {
        check_owner(self.id, obj)?;
        let buf = self.channel.begin()?;
        buf.put_i32(obj.pointer())?;
        let buf = self
            .channel
            .exchange(PacketType::ObjectGetClass, PacketType::ResultClass)?;
        let Some(pointer) = get_index(buf)? else {
            return Err(ReflectError::ClassNotFound(obj.to_string()));
        };
        let name = buf.get_string()?;
        Ok(self.remember_class(name, pointer))
    }

    fn resolve_field(&mut self, class: &Class, name: &str, field_type: &Class) -> Result<Field> {
        check_owner(self.id, class.object())?;
        check_owner(self.id, field_type.object())?;
        let buf = self.channel.begin()?;
        buf.put_i32(class.pointer())?;
        buf.put_string(name)?;
        buf.put_i32(field_type.pointer())?;
        let buf = self.channel.exchange(PacketType::GetField, PacketType::Result)?;
        match get_index(buf)? {
            Some(pointer) => Ok(Field::new(
                ClassMember::new(Object::new(self.id, pointer), class.clone(), name),
                field_type.clone(),
            )),
            None => Err(ReflectError::FieldNotFound {
                class: class.name().to_owned(),
                name: name.to_owned(),
            }),
        }
    }

    fn resolve_method(
        &mut self,
        class: &Class,
        name: &str,
        parameter_types: &[Class],
    ) -> Result<Method> {
        check_owner(self.id, class.object())?;
        for ty in parameter_types {
            check_owner(self.id, ty.object())?;
        }
        let buf = self.channel.begin()?;
        buf.put_i32(class.pointer())?;
        buf.put_string(name)?;
        put_count(buf, parameter_types.len())?;
        for ty in parameter_types {
            buf.put_i32(ty.pointer())?;
        }
        let buf = self.channel.exchange(PacketType::GetMethod, PacketType::Result)?;
        match get_index(buf)? {
            Some(pointer) => Ok(Method::new(
                ClassMember::new(Object::new(self.id, pointer), class.clone(), name),
                parameter_types.to_vec(),
            )),
            None => Err(ReflectError::MethodNotFound {
                class: class.name().to_owned(),
                name: if name.is_empty() { CONSTRUCTOR_NAME } else { name }.to_owned(),
            }),
        }
    }

    fn resolve_constructor(
        &mut self,
        class: &Class,
        parameter_types: &[Class],
    ) -> Result<Constructor> {
        let method = self.resolve_method(class, "", parameter_types)?;
        Ok(Constructor::new(*method.object(), class.clone(), parameter_types.to_vec()))
    }

    fn get_field(&mut self, field: &Field, owner: Option<&Object>) -> Result<AnyValue> {
        check_owner(self.id, field.object())?;
        let id = self.id;
        let buf = self.channel.begin()?;
        buf.put_i32(field.object().pointer())?;
        put_owner(buf, id, owner)?;
        let buf = self.channel.exchange(PacketType::FieldGet, PacketType::Result)?;
        get_value(buf, id)
    }

    fn set_field(&mut self, field: &Field, owner: Option<&Object>, value: &AnyValue) -> Result<()> {
        check_owner(self.id, field.object())?;
        let id = self.id;
        let buf = self.channel.begin()?;
        buf.put_i32(field.object().pointer())?;
        put_owner(buf, id, owner)?;
        put_value(buf, id, value, field.field_type())?;
        self.channel.exchange(PacketType::FieldSet, PacketType::Result)?;
        Ok(())
    }

    fn invoke(
        &mut self,
        executable: &dyn Executable,
        owner: Option<&Object>,
        args: &[AnyValue],
    ) -> Result<AnyValue> {
        check_arity(executable, args)?;
        check_owner(self.id, executable.object())?;
        let id = self.id;
        let buf = self.channel.begin()?;
        buf.put_i32(executable.object().pointer())?;
        put_owner(buf, id, owner)?;
        put_count(buf, args.len())?;
        for (arg, ty) in args.iter().zip(executable.parameter_types()) {
            put_value(buf, id, arg, ty)?;
        }
        let buf = self.channel.exchange(PacketType::MethodInvoke, PacketType::Result)?;
        get_value(buf, id)
    }

    fn is_instance(&mut self, class: &Class, obj: &Object) -> Result<bool> {
        check_owner(self.id, class.object())?;
        check_owner(self.id, obj)?;
        let buf = self.channel.begin()?;
        buf.put_i32(class.pointer())?;
        buf.put_i32(obj.pointer())?;
        let buf = self
            .channel
            .exchange(PacketType::ObjectIsInstance, PacketType::ResultByte)?;
        Ok(buf.get_u8()? != 0)
    }
}
