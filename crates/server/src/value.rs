//! Tagged value encoding.
//!
//! A value starts with a big-endian `i32`. A non-negative number is an
//! object handle; negative numbers are type tags, most followed by a
//! fixed-width payload.

use scripting_buffers::ByteBuffer;
use scripting_reflect::{
    check_owner, AnyValue, Class, Object, ReflectError, Result, RuntimeId, STRING_TYPE,
};

pub const TAG_NULL: i32 = -1;
pub const TAG_BYTE: i32 = -2;
pub const TAG_SHORT: i32 = -3;
pub const TAG_INT: i32 = -4;
pub const TAG_LONG: i32 = -5;
pub const TAG_FLOAT: i32 = -6;
pub const TAG_DOUBLE: i32 = -7;
pub const TAG_CHAR: i32 = -8;
pub const TAG_STRING: i32 = -9;
pub const TAG_FALSE: i32 = -10;
pub const TAG_TRUE: i32 = -11;

fn mismatch(value: &AnyValue, target: &Class) -> ReflectError {
    ReflectError::TypeMismatch {
        value: value.to_string(),
        target: target.name().to_owned(),
    }
}

enum Numeric {
    Integral(i64),
    Floating(f64),
}

fn numeric(value: &AnyValue) -> Option<Numeric> {
    Some(match *value {
        AnyValue::Byte(v) => Numeric::Integral(v.into()),
        AnyValue::Short(v) => Numeric::Integral(v.into()),
        AnyValue::Int(v) => Numeric::Integral(v.into()),
        AnyValue::Long(v) => Numeric::Integral(v),
        AnyValue::Char(v) => Numeric::Integral(v.into()),
        AnyValue::Float(v) => Numeric::Floating(v.into()),
        AnyValue::Double(v) => Numeric::Floating(v),
        _ => return None,
    })
}

/// Encodes `value` as the type `target` expects.
///
/// Handles must belong to `runtime`. Numbers are converted to the target's
/// primitive kind; an integral value that doesn't fit, or a floating point
/// value bound for an integral kind, is a type mismatch.
pub fn put_value(
    buf: &mut ByteBuffer,
    runtime: RuntimeId,
    value: &AnyValue,
    target: &Class,
) -> Result<()> {
    match value {
        AnyValue::Null => {
            if target.is_primitive() {
                return Err(mismatch(value, target));
            }
            buf.put_i32(TAG_NULL)?;
        }
        AnyValue::Handle(obj) => {
            check_owner(runtime, obj)?;
            if obj.pointer() < 0 {
                return Err(ReflectError::Protocol(format!(
                    "handle pointer {} is negative",
                    obj.pointer()
                )));
            }
            buf.put_i32(obj.pointer())?;
        }
        AnyValue::Bool(b) => {
            if target.name() != "boolean" {
                return Err(mismatch(value, target));
            }
            buf.put_i32(if *b { TAG_TRUE } else { TAG_FALSE })?;
        }
        AnyValue::String(s) => {
            if target.name() != STRING_TYPE {
                return Err(mismatch(value, target));
            }
            // Check the length before the tag goes out.
            if s.len() > u16::MAX as usize {
                return Err(scripting_buffers::BufferError::StringTooLong(s.len()).into());
            }
            buf.put_i32(TAG_STRING)?;
            buf.put_string(s)?;
        }
        _ => put_numeric(buf, value, target)?,
    }
    Ok(())
}

fn put_numeric(buf: &mut ByteBuffer, value: &AnyValue, target: &Class) -> Result<()> {
    let Some(num) = numeric(value) else {
        return Err(mismatch(value, target));
    };
    let integral = |num: &Numeric| match *num {
        Numeric::Integral(v) => Ok(v),
        Numeric::Floating(_) => Err(mismatch(value, target)),
    };
    let range = |_| mismatch(value, target);
    match target.name() {
        "byte" => {
            let v = i8::try_from(integral(&num)?).map_err(range)?;
            buf.put_i32(TAG_BYTE)?;
            buf.put_i8(v)?;
        }
        "short" => {
            let v = i16::try_from(integral(&num)?).map_err(range)?;
            buf.put_i32(TAG_SHORT)?;
            buf.put_i16(v)?;
        }
        "int" => {
            let v = i32::try_from(integral(&num)?).map_err(range)?;
            buf.put_i32(TAG_INT)?;
            buf.put_i32(v)?;
        }
        "long" => {
            let v = integral(&num)?;
            buf.put_i32(TAG_LONG)?;
            buf.put_i64(v)?;
        }
        "char" => {
            let v = u16::try_from(integral(&num)?).map_err(range)?;
            buf.put_i32(TAG_CHAR)?;
            buf.put_char(v)?;
        }
        "float" => {
            let v = match num {
                Numeric::Integral(v) => v as f32,
                Numeric::Floating(v) => v as f32,
            };
            buf.put_i32(TAG_FLOAT)?;
            buf.put_f32(v)?;
        }
        "double" => {
            let v = match num {
                Numeric::Integral(v) => v as f64,
                Numeric::Floating(v) => v,
            };
            buf.put_i32(TAG_DOUBLE)?;
            buf.put_f64(v)?;
        }
        _ => return Err(mismatch(value, target)),
    }
    Ok(())
}

/// Decodes one value; handles are stamped with `runtime`.
pub fn get_value(buf: &mut ByteBuffer, runtime: RuntimeId) -> Result<AnyValue> {
    let tag = buf.get_i32()?;
    Ok(match tag {
        ptr if ptr >= 0 => AnyValue::Handle(Object::new(runtime, ptr)),
        TAG_BYTE => AnyValue::Byte(buf.get_i8()?),
        TAG_SHORT => AnyValue::Short(buf.get_i16()?),
        TAG_INT => AnyValue::Int(buf.get_i32()?),
        TAG_LONG => AnyValue::Long(buf.get_i64()?),
        TAG_FLOAT => AnyValue::Float(buf.get_f32()?),
        TAG_DOUBLE => AnyValue::Double(buf.get_f64()?),
        TAG_CHAR => AnyValue::Char(buf.get_char()?),
        TAG_STRING => AnyValue::String(buf.get_string()?),
        TAG_FALSE => AnyValue::Bool(false),
        TAG_TRUE => AnyValue::Bool(true),
        _ => AnyValue::Null,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(rt: RuntimeId, name: &str) -> Class {
        Class::new(Object::new(rt, 1), name)
    }

    fn encode(rt: RuntimeId, value: AnyValue, target: &str) -> Result<Vec<u8>> {
        let mut buf = ByteBuffer::new(64);
        buf.clear();
        put_value(&mut buf, rt, &value, &class(rt, target))?;
        Ok(buf.filled().to_vec())
    }

    #[test]
    fn int_for_int_target() {
        let rt = RuntimeId::next();
        assert_eq!(
            encode(rt, AnyValue::Int(42), "int").unwrap(),
            [0xFF, 0xFF, 0xFF, 0xFC, 0x00, 0x00, 0x00, 0x2A]
        );
    }

    #[test]
    fn integral_narrowing_is_range_checked() {
        let rt = RuntimeId::next();
        assert_eq!(
            encode(rt, AnyValue::Int(-3), "byte").unwrap(),
            [0xFF, 0xFF, 0xFF, 0xFE, 0xFD]
        );
        assert!(matches!(
            encode(rt, AnyValue::Int(300), "byte"),
            Err(ReflectError::TypeMismatch { .. })
        ));
        assert!(encode(rt, AnyValue::Int(-1), "char").is_err());
    }

    #[test]
    fn floating_into_integral_fails() {
        let rt = RuntimeId::next();
        assert!(matches!(
            encode(rt, AnyValue::Double(1.0), "int"),
            Err(ReflectError::TypeMismatch { .. })
        ));
        let widened = encode(rt, AnyValue::Int(2), "double").unwrap();
        assert_eq!(&widened[..4], &TAG_DOUBLE.to_be_bytes());
        assert_eq!(&widened[4..], &2.0f64.to_be_bytes());
    }

    #[test]
    fn null_needs_reference_target() {
        let rt = RuntimeId::next();
        assert!(encode(rt, AnyValue::Null, "int").is_err());
        assert_eq!(
            encode(rt, AnyValue::Null, "java.lang.Object").unwrap(),
            [0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn bool_and_string_targets() {
        let rt = RuntimeId::next();
        assert_eq!(
            encode(rt, AnyValue::Bool(true), "boolean").unwrap(),
            TAG_TRUE.to_be_bytes()
        );
        assert!(encode(rt, AnyValue::Bool(true), "int").is_err());
        assert!(encode(rt, AnyValue::from("x"), "java.lang.Object").is_err());
    }

    #[test]
    fn foreign_handle_is_rejected() {
        let rt = RuntimeId::next();
        let other = RuntimeId::next();
        let obj = AnyValue::Handle(Object::new(other, 9));
        assert!(matches!(
            encode(rt, obj, "java.lang.Object"),
            Err(ReflectError::ForeignHandle { pointer: 9 })
        ));
    }

    #[test]
    fn unknown_negative_tag_is_null() {
        let rt = RuntimeId::next();
        let mut buf = ByteBuffer::new(8);
        buf.clear();
        buf.put_i32(-42).unwrap();
        buf.set_window(0, 4).unwrap();
        assert_eq!(get_value(&mut buf, rt).unwrap(), AnyValue::Null);
    }
}
