//! Runtime values for encoding/decoding (codec representation).

use std::collections::HashMap;

/// A single decoded value (field or compound).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Bool(bool),
    Str(String),
    List(Vec<Value>),
    Struct(Instance),
}

impl Value {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U8(x) => Some(*x as u64),
            Value::U16(x) => Some(*x as u64),
            Value::U32(x) => Some(*x as u64),
            Value::U64(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I8(x) => Some(*x as i64),
            Value::I16(x) => Some(*x as i64),
            Value::I32(x) => Some(*x as i64),
            Value::I64(x) => Some(*x),
            Value::U8(x) => Some(*x as i64),
            Value::U16(x) => Some(*x as i64),
            Value::U32(x) => Some(*x as i64),
            Value::U64(x) => i64::try_from(*x).ok(),
            _ => None,
        }
    }

    /// Any integer variant widened losslessly, for range checks.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::U64(x) => Some(*x as i128),
            other => other.as_i64().map(i128::from),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Instance> {
        match self {
            Value::Struct(i) => Some(i),
            _ => None,
        }
    }

    /// Short name of the variant, used in mismatch messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Struct(_) => "struct",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Instance> for Value {
    fn from(i: Instance) -> Self {
        Value::Struct(i)
    }
}

/// A struct-type instance: the concrete type name plus its field values.
///
/// For union variants the type name is the tag. Discriminator fields are
/// never stored here; their values follow from the variant registration.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    type_name: String,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(type_name: impl Into<String>) -> Self {
        Instance {
            type_name: type_name.into(),
            fields: HashMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    pub(crate) fn from_parts(type_name: String, fields: HashMap<String, Value>) -> Self {
        Instance { type_name, fields }
    }
}
