//! Implicit conversions between emitted and expected types

use crate::config::WellKnownTypes;
use xaml_types::{XConstructor, XMethod, XType};

/// How to turn a value of one type into another
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    /// Reference already usable as the target type
    Upcast,
    /// Box a value type into `object` or one of its interfaces
    Box(XType),
    /// Unbox `object` into a value type
    UnboxAny(XType),
    /// `new Nullable<T>(value)`
    NullableWrap(XConstructor),
    /// `Nullable<T>.Value`; the getter needs the value's address
    NullableUnwrap(XMethod),
    /// User-defined `op_Implicit`
    Implicit(XMethod),
}

/// Plan the conversion from `from` to `to`, `None` when there is none
pub fn plan_conversion(well_known: &WellKnownTypes, from: &XType, to: &XType) -> Option<Conversion> {
    if from == to {
        return Some(Conversion::Upcast);
    }

    if to.is_assignable_from(from) {
        return Some(if from.is_value_type() && !to.is_value_type() {
            Conversion::Box(from.clone())
        } else {
            Conversion::Upcast
        });
    }

    if from.is_object() && to.is_value_type() {
        return Some(Conversion::UnboxAny(to.clone()));
    }

    if well_known.nullable_underlying(to).as_ref() == Some(from) {
        let ctor = to
            .constructors()
            .into_iter()
            .find(|c| !c.is_static() && c.parameters() == [from.clone()])?;
        return Some(Conversion::NullableWrap(ctor));
    }

    if well_known.nullable_underlying(from).as_ref() == Some(to) {
        let getter = from.find_property("Value")?.getter()?;
        return Some(Conversion::NullableUnwrap(getter));
    }

    [from, to]
        .into_iter()
        .flat_map(|owner| {
            owner.find_methods(|m| {
                m.is_static()
                    && m.is_public()
                    && m.name() == "op_Implicit"
                    && m.parameters() == [from.clone()]
                    && m.return_type().as_ref() == Some(to)
            })
        })
        .next()
        .map(Conversion::Implicit)
}
