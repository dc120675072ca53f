//! Values that cross the bridge.

use std::fmt;

use crate::{Object, ReflectError, Result};

/// A value exchanged with the target: a handle, an inline scalar or null.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyValue {
    Handle(Object),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// A UTF-16 code unit.
    Char(u16),
    String(String),
    Bool(bool),
    Null,
}

impl AnyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AnyValue::Null)
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            AnyValue::Handle(obj) => Some(obj),
            _ => None,
        }
    }

    /// Unwraps a handle, failing on any scalar or null.
    pub fn into_object(self) -> Result<Object> {
        match self {
            AnyValue::Handle(obj) => Ok(obj),
            other => Err(ReflectError::UnexpectedValue {
                expected: "object",
                got: other.to_string(),
            }),
        }
    }

    /// Unwraps a handle, mapping null to `None`.
    pub fn into_nullable_object(self) -> Result<Option<Object>> {
        match self {
            AnyValue::Null => Ok(None),
            other => other.into_object().map(Some),
        }
    }

    /// Any integral scalar (char included) widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            AnyValue::Byte(v) => Some(v.into()),
            AnyValue::Short(v) => Some(v.into()),
            AnyValue::Int(v) => Some(v.into()),
            AnyValue::Long(v) => Some(v),
            AnyValue::Char(v) => Some(v.into()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            AnyValue::Float(v) => Some(v.into()),
            AnyValue::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            AnyValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyValue::Handle(obj) => fmt::Display::fmt(obj, f),
            AnyValue::Byte(v) => write!(f, "{v}"),
            AnyValue::Short(v) => write!(f, "{v}"),
            AnyValue::Int(v) => write!(f, "{v}"),
            AnyValue::Long(v) => write!(f, "{v}"),
            AnyValue::Float(v) => write!(f, "{v}"),
            AnyValue::Double(v) => write!(f, "{v}"),
            AnyValue::Char(v) => match char::from_u32(u32::from(*v)) {
                Some(c) => write!(f, "'{c}'"),
                None => write!(f, "'\\u{v:04x}'"),
            },
            AnyValue::String(s) => write!(f, "{s:?}"),
            AnyValue::Bool(v) => write!(f, "{v}"),
            AnyValue::Null => f.write_str("null"),
        }
    }
}

macro_rules! from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for AnyValue {
                fn from(v: $ty) -> Self {
                    AnyValue::$variant(v)
                }
            }
        )*
    };
}

from_scalar! {
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    bool => Bool,
    String => String,
    Object => Handle,
}

impl From<&str> for AnyValue {
    fn from(v: &str) -> Self {
        AnyValue::String(v.to_owned())
    }
}

impl<T: Into<AnyValue>> From<Option<T>> for AnyValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(AnyValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RuntimeId;

    #[test]
    fn conversions() {
        assert_eq!(AnyValue::from(42), AnyValue::Int(42));
        assert_eq!(AnyValue::from("a"), AnyValue::String("a".into()));
        assert_eq!(AnyValue::from(None::<i64>), AnyValue::Null);
        assert_eq!(AnyValue::from(Some(true)), AnyValue::Bool(true));
    }

    #[test]
    fn into_object() {
        let obj = Object::new(RuntimeId::next(), 3);
        assert_eq!(AnyValue::Handle(obj).into_object().unwrap(), obj);
        assert!(AnyValue::Int(3).into_object().is_err());
        assert_eq!(AnyValue::Null.into_nullable_object().unwrap(), None);
    }

    #[test]
    fn borrowing_accessors() {
        let obj = Object::new(RuntimeId::next(), 3);
        assert_eq!(AnyValue::Handle(obj).as_object(), Some(&obj));
        assert_eq!(AnyValue::Null.as_object(), None);
        assert_eq!(AnyValue::Bool(true).as_bool(), Some(true));
        assert_eq!(AnyValue::Int(1).as_bool(), None);
        assert!(AnyValue::Null.is_null());
    }

    #[test]
    fn widening_accessors() {
        assert_eq!(AnyValue::Char(65).as_i64(), Some(65));
        assert_eq!(AnyValue::Float(0.5).as_f64(), Some(0.5));
        assert_eq!(AnyValue::Double(1.0).as_i64(), None);
        assert_eq!(AnyValue::Char(65).to_string(), "'A'");
    }
}
