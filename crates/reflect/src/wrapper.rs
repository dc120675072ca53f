//! Contract for host-side wrapper types.

use crate::{AnyValue, Object, ReflectError, Result, RuntimeId};

/// A host type that names a remote class and holds one object of it.
///
/// Wrappers declare the members they use as `static`
/// [`MemberCache`](crate::MemberCache)s and call through a
/// [`Runtime`](crate::Runtime).
pub trait Wrapper: Sized {
    /// Fully qualified name of the remote class.
    const TYPE_NAME: &'static str;

    fn from_raw(raw: Object) -> Self;

    fn raw(&self) -> &Object;

    fn runtime(&self) -> RuntimeId {
        self.raw().runtime()
    }

    /// Wraps a handle returned by the target. Null can't be wrapped.
    fn wrap(value: AnyValue) -> Result<Self> {
        match value {
            AnyValue::Handle(raw) => Ok(Self::from_raw(raw)),
            AnyValue::Null => Err(ReflectError::NullWrap(Self::TYPE_NAME)),
            other => Err(ReflectError::UnexpectedValue {
                expected: "object",
                got: other.to_string(),
            }),
        }
    }

    fn wrap_nullable(value: AnyValue) -> Result<Option<Self>> {
        match value {
            AnyValue::Null => Ok(None),
            other => Self::wrap(other).map(Some),
        }
    }
}
