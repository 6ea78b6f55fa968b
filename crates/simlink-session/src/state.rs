// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Simulator state values
//!
//! A [`StateSnapshot`] maps field names to [`StateValue`]s. Integers, floats,
//! booleans, strings and nested maps serialize directly. Fixed-width numeric
//! scalars and n-dimensional arrays must be normalized first (see
//! [`crate::normalizer`]); serializing a snapshot that still holds one fails.

use ndarray::ArrayD;
use serde::ser::{Error as _, Serialize, Serializer};
use std::collections::BTreeMap;

/// Field name to value mapping produced by the simulator each turn
pub type StateSnapshot = BTreeMap<String, StateValue>;

/// A single state field value
#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Map(StateSnapshot),
    /// Plain sequence; serializable once its elements are
    List(Vec<StateValue>),
    /// Fixed-width numeric that needs unwrapping before transmission
    Numeric(NumericScalar),
    /// N-dimensional array that needs flattening into nested lists
    Array(ArrayD<f64>),
}

/// Fixed-width numeric extension types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericScalar {
    F32(f32),
    I8(i8),
    I16(i16),
    I32(i32),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    /// Boolean stored in a numeric container
    Bool(bool),
}

impl NumericScalar {
    /// Unwrap into the plain scalar equivalent
    pub fn item(self) -> StateValue {
        match self {
            NumericScalar::F32(v) => StateValue::Float(v as f64),
            NumericScalar::I8(v) => StateValue::Int(v as i64),
            NumericScalar::I16(v) => StateValue::Int(v as i64),
            NumericScalar::I32(v) => StateValue::Int(v as i64),
            NumericScalar::U8(v) => StateValue::Int(v as i64),
            NumericScalar::U16(v) => StateValue::Int(v as i64),
            NumericScalar::U32(v) => StateValue::Int(v as i64),
            NumericScalar::U64(v) => match i64::try_from(v) {
                Ok(v) => StateValue::Int(v),
                Err(_) => StateValue::Float(v as f64),
            },
            NumericScalar::Bool(v) => StateValue::Bool(v),
        }
    }
}

impl StateValue {
    /// True for the value kinds the wire format accepts without normalization
    /// and that never need inspecting: int, float, bool, string, map
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            StateValue::Int(_)
                | StateValue::Float(_)
                | StateValue::Bool(_)
                | StateValue::Str(_)
                | StateValue::Map(_)
        )
    }

    /// Short type name used in log and error messages
    pub fn kind(&self) -> &'static str {
        match self {
            StateValue::Int(_) => "int",
            StateValue::Float(_) => "float",
            StateValue::Bool(_) => "bool",
            StateValue::Str(_) => "string",
            StateValue::Map(_) => "map",
            StateValue::List(_) => "list",
            StateValue::Numeric(_) => "numeric",
            StateValue::Array(_) => "array",
        }
    }
}

impl Serialize for StateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StateValue::Int(v) => serializer.serialize_i64(*v),
            StateValue::Float(v) => serializer.serialize_f64(*v),
            StateValue::Bool(v) => serializer.serialize_bool(*v),
            StateValue::Str(v) => serializer.serialize_str(v),
            StateValue::Map(map) => serializer.collect_map(map.iter()),
            StateValue::List(items) => serializer.collect_seq(items.iter()),
            StateValue::Numeric(_) | StateValue::Array(_) => Err(S::Error::custom(format!(
                "{} state value must be normalized before transmission (enable complex state handling)",
                self.kind()
            ))),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:path),* $(,)?) => {
        $(
            impl From<$ty> for StateValue {
                fn from(value: $ty) -> Self {
                    $variant(value)
                }
            }
        )*
    };
}

impl_from! {
    i64 => StateValue::Int,
    f64 => StateValue::Float,
    bool => StateValue::Bool,
    String => StateValue::Str,
    StateSnapshot => StateValue::Map,
    Vec<StateValue> => StateValue::List,
    ArrayD<f64> => StateValue::Array,
    NumericScalar => StateValue::Numeric,
}

macro_rules! impl_from_numeric {
    ($($ty:ty => $scalar:path),* $(,)?) => {
        $(
            impl From<$ty> for StateValue {
                fn from(value: $ty) -> Self {
                    StateValue::Numeric($scalar(value))
                }
            }
        )*
    };
}

impl_from_numeric! {
    f32 => NumericScalar::F32,
    i8 => NumericScalar::I8,
    i16 => NumericScalar::I16,
    i32 => NumericScalar::I32,
    u8 => NumericScalar::U8,
    u16 => NumericScalar::U16,
    u32 => NumericScalar::U32,
    u64 => NumericScalar::U64,
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        StateValue::Str(value.to_string())
    }
}
