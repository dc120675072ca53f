//! The reflection [`Runtime`] contract.

use crate::{
    AnyValue, Class, Constructor, Executable, Field, Method, Object, ReflectError, Result,
    RuntimeId, Wrapper,
};

/// Reflection operations against one live target.
///
/// Every operation is a single blocking request/response exchange. A
/// generic error sent back by the target surfaces as
/// [`ReflectError::Remote`]. Operations take `&mut self`: one exchange runs at
/// a time, so concurrent callers wrap the runtime in a mutex.
pub trait Runtime {
    /// Identity that every handle issued by this runtime carries.
    fn id(&self) -> RuntimeId;

    /// Looks a class up by its fully qualified name.
    ///
    /// Successful lookups are memoized by name for the lifetime of the
    /// runtime; a repeat call returns the same [`Class`] without any wire
    /// traffic. Failures are never memoized.
    fn resolve_class(&mut self, name: &str) -> Result<Class>;

    /// Asks the target for the runtime class of `obj`.
    fn resolve_class_of(&mut self, obj: &Object) -> Result<Class>;

    fn resolve_field(&mut self, class: &Class, name: &str, field_type: &Class) -> Result<Field>;

    /// Looks a method up by name and exact parameter types.
    ///
    /// The empty name addresses the constructor slot; prefer
    /// [`resolve_constructor`](Runtime::resolve_constructor) for that.
    fn resolve_method(
        &mut self,
        class: &Class,
        name: &str,
        parameter_types: &[Class],
    ) -> Result<Method>;

    fn resolve_constructor(
        &mut self,
        class: &Class,
        parameter_types: &[Class],
    ) -> Result<Constructor>;

    /// Reads a field; `owner` is `None` for a static field.
    fn get_field(&mut self, field: &Field, owner: Option<&Object>) -> Result<AnyValue>;

    /// Writes a field; `owner` is `None` for a static field.
    ///
    /// The value is checked against the field type before anything is sent.
    fn set_field(&mut self, field: &Field, owner: Option<&Object>, value: &AnyValue) -> Result<()>;

    /// Invokes a method or constructor.
    ///
    /// Fails with [`ReflectError::ArgumentCount`] before sending when `args`
    /// doesn't match the executable's parameter count.
    fn invoke(
        &mut self,
        executable: &dyn Executable,
        owner: Option<&Object>,
        args: &[AnyValue],
    ) -> Result<AnyValue>;

    fn is_instance(&mut self, class: &Class, obj: &Object) -> Result<bool>;

    /// Runs a constructor and returns the new object.
    fn construct(&mut self, constructor: &Constructor, args: &[AnyValue]) -> Result<Object> {
        self.invoke(constructor, None, args)?.into_object()
    }

    /// Resolves the remote class a wrapper type is bound to.
    fn resolve_class_for<W: Wrapper>(&mut self) -> Result<Class>
    where
        Self: Sized,
    {
        self.resolve_class(W::TYPE_NAME)
    }
}

/// Fails with [`ReflectError::ForeignHandle`] unless `obj` was issued by `rt`.
pub fn check_owner(rt: RuntimeId, obj: &Object) -> Result<()> {
    if obj.runtime() == rt {
        Ok(())
    } else {
        Err(ReflectError::ForeignHandle {
            pointer: obj.pointer(),
        })
    }
}

/// Fails with [`ReflectError::ArgumentCount`] on a parameter count mismatch.
pub fn check_arity(executable: &dyn Executable, args: &[AnyValue]) -> Result<()> {
    let expected = executable.parameter_types().len();
    if expected == args.len() {
        Ok(())
    } else {
        Err(ReflectError::ArgumentCount {
            expected,
            got: args.len(),
        })
    }
}
