//! Abstract Syntax Tree for the schema DSL, and its conversion into a [`Schema`].

use crate::error::DefinitionError;
use crate::format::{Format, IntType};
use crate::schema::{FieldBinding, FieldDecl, Schema, StructBuilder};

/// Root of a schema source: struct definitions in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaSource {
    pub structs: Vec<StructSection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructSection {
    pub name: String,
    pub doc: Option<String>,
    pub base: Option<String>,
    pub variant: Option<VariantClause>,
    pub fields: Vec<FieldSection>,
}

/// `= value [as LABEL]` after the base type.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantClause {
    pub value: u64,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSection {
    pub name: String,
    pub doc: Option<String>,
    pub type_expr: TypeExpr,
    pub discriminator: bool,
    pub embed: bool,
    pub c_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Int(IntType),
    /// `T[n]`
    IntArray(IntType, u64),
    Bool,
    /// `str(n)`
    Str(u64),
    /// `hex(n)` or `hex(n, "sep")`
    Hex(u64, String),
    /// `array<T>` or `array<T, len>`
    VarArray(Box<TypeExpr>, IntType),
    /// `varstr` or `varstr<len>`
    VarStr(IntType),
    /// Name of another struct type.
    StructRef(String),
}

impl SchemaSource {
    /// Define every struct in source order.
    pub fn into_schema(self) -> Result<Schema, DefinitionError> {
        let mut schema = Schema::new();
        for s in self.structs {
            let mut b = StructBuilder::new(s.name.clone());
            if let Some(doc) = s.doc {
                b = b.doc(doc);
            }
            if let Some(base) = s.base {
                b = b.extends(base);
            }
            if let Some(v) = s.variant {
                b = b.variant(v.value);
                if let Some(label) = v.label {
                    b = b.variant_label(label);
                }
            }
            for f in s.fields {
                b = b.field(f.into_decl(&s.name)?);
            }
            schema.define(b.build())?;
        }
        Ok(schema)
    }
}

impl FieldSection {
    fn into_decl(self, owner: &str) -> Result<FieldDecl, DefinitionError> {
        let binding = match self.type_expr {
            TypeExpr::StructRef(name) => FieldBinding::Struct(name),
            other => FieldBinding::Format(other.to_format(owner, &self.name)?),
        };
        let mut d = FieldDecl::new(self.name, binding);
        if let Some(doc) = self.doc {
            d = d.doc(doc);
        }
        if let Some(c_name) = self.c_name {
            d = d.c_name(c_name);
        }
        if self.embed {
            d = d.embed();
        }
        if self.discriminator {
            d = d.discriminator();
        }
        Ok(d)
    }
}

impl TypeExpr {
    /// Leaf format for this type. Struct references are only valid as a whole field.
    pub fn to_format(&self, owner: &str, field: &str) -> Result<Format, DefinitionError> {
        let invalid = |reason: &str| DefinitionError::InvalidFormat {
            type_name: owner.to_string(),
            field: field.to_string(),
            reason: reason.to_string(),
        };
        Ok(match self {
            TypeExpr::Int(ty) => Format::int(*ty),
            TypeExpr::IntArray(ty, n) => Format::array(*ty, to_usize(*n).ok_or_else(|| invalid("array length too large"))?),
            TypeExpr::Bool => Format::Bool,
            TypeExpr::Str(n) => Format::fixed_str(to_usize(*n).ok_or_else(|| invalid("string length too large"))?),
            TypeExpr::Hex(n, sep) => Format::hex_sep(to_usize(*n).ok_or_else(|| invalid("hex length too large"))?, sep.clone()),
            TypeExpr::VarArray(child, len) => Format::var_array_with(child.to_format(owner, field)?, *len),
            TypeExpr::VarStr(len) => Format::var_str_with(*len),
            TypeExpr::StructRef(name) => {
                return Err(invalid(&format!("struct type {} cannot be an array element", name)))
            }
        })
    }
}

fn to_usize(n: u64) -> Option<usize> {
    usize::try_from(n).ok()
}
