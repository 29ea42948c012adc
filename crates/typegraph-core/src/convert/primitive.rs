//! Builtin primitive values.

use typegraph_proto::{current, legacy};

use super::{ConversionContext, FormatConverter, TypeKind};
use crate::catalog::{PrimitiveType, ResolvedType};
use crate::error::Result;

/// Converts primitives. Shapes are strict: a legacy `Short` is not accepted
/// for an `int` attribute.
pub struct PrimitiveConverter;

fn primitive(ty: &ResolvedType<'_>, ctx: &ConversionContext<'_>) -> Result<PrimitiveType> {
    match ty {
        ResolvedType::Primitive(p) => Ok(*p),
        other => Err(ctx.error(format!("'{}' is not a primitive type", other.type_name()))),
    }
}

fn narrow<T: TryFrom<i64>>(v: i64, p: PrimitiveType, ctx: &ConversionContext<'_>) -> Result<T> {
    T::try_from(v).map_err(|_| ctx.error(format!("{} is out of range for {}", v, p)))
}

impl FormatConverter for PrimitiveConverter {
    fn kind(&self) -> TypeKind {
        TypeKind::Primitive
    }

    fn to_current(
        &self,
        value: &legacy::Value,
        ty: &ResolvedType<'_>,
        ctx: &mut ConversionContext<'_>,
    ) -> Result<current::Value> {
        use legacy::Value as L;
        use PrimitiveType as P;

        let p = primitive(ty, ctx)?;
        let converted = match (p, value) {
            (P::Boolean, L::Boolean(b)) => current::Value::Bool(*b),
            (P::Byte, L::Byte(v)) => current::Value::Int((*v).into()),
            (P::Short, L::Short(v)) => current::Value::Int((*v).into()),
            (P::Int, L::Int(v)) => current::Value::Int((*v).into()),
            (P::Long, L::Long(v)) | (P::Date, L::Date(v)) => current::Value::Int(*v),
            (P::Float, L::Float(v)) => current::Value::Float((*v).into()),
            (P::Double, L::Double(v)) => current::Value::Float(*v),
            (P::BigInteger, L::BigInteger(s))
            | (P::BigDecimal, L::BigDecimal(s))
            | (P::String, L::String(s)) => current::Value::String(s.clone()),
            _ => return Err(ctx.mismatch(p.name(), value.shape())),
        };
        Ok(converted)
    }

    fn to_legacy(
        &self,
        value: &current::Value,
        ty: &ResolvedType<'_>,
        ctx: &mut ConversionContext<'_>,
    ) -> Result<legacy::Value> {
        use current::Value as C;
        use PrimitiveType as P;

        let p = primitive(ty, ctx)?;
        let converted = match (p, value) {
            (P::Boolean, C::Bool(b)) => legacy::Value::Boolean(*b),
            (P::Byte, C::Int(v)) => legacy::Value::Byte(narrow(*v, p, ctx)?),
            (P::Short, C::Int(v)) => legacy::Value::Short(narrow(*v, p, ctx)?),
            (P::Int, C::Int(v)) => legacy::Value::Int(narrow(*v, p, ctx)?),
            (P::Long, C::Int(v)) => legacy::Value::Long(*v),
            (P::Date, C::Int(v)) => legacy::Value::Date(*v),
            (P::Float, C::Float(v)) => {
                if v.is_finite() && v.abs() > f64::from(f32::MAX) {
                    return Err(ctx.error(format!("{} is out of range for float", v)));
                }
                legacy::Value::Float(*v as f32)
            }
            (P::Double, C::Float(v)) => legacy::Value::Double(*v),
            (P::BigInteger | P::BigDecimal, C::String(s)) => {
                p.parse_literal(s).map_err(|msg| ctx.error(msg))?;
                if p == P::BigInteger {
                    legacy::Value::BigInteger(s.clone())
                } else {
                    legacy::Value::BigDecimal(s.clone())
                }
            }
            (P::String, C::String(s)) => legacy::Value::String(s.clone()),
            _ => return Err(ctx.mismatch(p.name(), value.shape())),
        };
        Ok(converted)
    }
}
