//! Encode/decode packed struct instances from schema definitions.
//!
//! Fields are laid out back to back in declaration order, inherited fields first,
//! with no padding. A union base resolves to its concrete variant while decoding:
//! once the discriminator is read, decoding restarts from the beginning of the
//! buffer as the registered variant type.

use crate::cgen;
use crate::error::{DecodingError, DefinitionError, EncodingError};
use crate::schema::{FieldBinding, FieldSpec, Schema, StructType};
use crate::value::{Instance, Value};
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Cursor;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    Big,
    #[default]
    Little,
}

#[derive(Debug)]
pub struct Codec {
    pub endianness: Endianness,
    schema: Schema,
}

impl Codec {
    pub fn new(schema: Schema, endianness: Endianness) -> Self {
        Codec { endianness, schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn minimum_size(&self, type_name: &str) -> Option<usize> {
        self.schema.minimum_size(type_name)
    }

    /// Encode an instance as `type_name`. For a union base, the instance may be
    /// any registered descendant; its discriminator values are filled in.
    pub fn encode(&self, type_name: &str, inst: &Instance) -> Result<Vec<u8>, EncodingError> {
        let def = self.struct_def(type_name)?;
        let mut out = Vec::with_capacity(self.schema.minimum_size(type_name).unwrap_or(0));
        self.encode_struct(def, inst, &mut out)?;
        Ok(out)
    }

    fn struct_def(&self, type_name: &str) -> Result<&StructType, EncodingError> {
        self.schema
            .get(type_name)
            .ok_or_else(|| EncodingError::UnknownStruct(type_name.to_string()))
    }

    /// Concrete type to use for `inst` when it is declared as `def`.
    ///
    /// Anything other than `def` itself must be a registered variant below
    /// `def` that is not a union base, i.e. a type decoding can resolve to.
    pub(crate) fn concrete<'s>(
        &'s self,
        def: &'s StructType,
        inst: &Instance,
    ) -> Result<&'s StructType, EncodingError> {
        if inst.type_name() == def.name() {
            return Ok(def);
        }
        let not_a_variant = || EncodingError::NotAVariant {
            expected: def.name().to_string(),
            found: inst.type_name().to_string(),
        };
        if !def.is_union() || !self.schema.is_descendant(inst.type_name(), def.name()) {
            return Err(not_a_variant());
        }
        let concrete = self.struct_def(inst.type_name())?;
        if concrete.variant().is_none() || concrete.is_union() {
            return Err(not_a_variant());
        }
        Ok(concrete)
    }

    fn encode_struct(&self, def: &StructType, inst: &Instance, out: &mut Vec<u8>) -> Result<(), EncodingError> {
        let concrete = self.concrete(def, inst)?;
        // A descendant starts with exactly the fields of `def`, so encoding the
        // concrete field list covers the base layout followed by the variant's own.
        for f in concrete.fields() {
            let value = self.field_value(concrete, f, inst)?;
            match &f.binding {
                FieldBinding::Format(fmt) => {
                    fmt.write(&value, self.endianness, out)
                        .map_err(|source| EncodingError::Value {
                            field: f.name.clone(),
                            source,
                        })?
                }
                FieldBinding::Struct(ty) => {
                    let nested = value.as_struct().ok_or_else(|| EncodingError::StructExpected {
                        field: f.name.clone(),
                        expected: ty.clone(),
                        found: value.kind(),
                    })?;
                    self.encode_struct(self.struct_def(ty)?, nested, out)?;
                }
            }
        }
        Ok(())
    }

    /// Value of field `f` for an instance of `concrete`. Discriminators come from
    /// the variant registry, everything else from the instance.
    pub(crate) fn field_value<'i>(
        &self,
        concrete: &StructType,
        f: &FieldSpec,
        inst: &'i Instance,
    ) -> Result<Cow<'i, Value>, EncodingError> {
        if let Some(ty) = Schema::discriminator_type(f) {
            let value = self
                .schema
                .discriminator_value(concrete.name(), &f.name)
                .ok_or_else(|| EncodingError::UnresolvedDiscriminator {
                    type_name: concrete.name().to_string(),
                    field: f.name.clone(),
                })?;
            return Ok(Cow::Owned(ty.make_value(value as i128)));
        }
        inst.get(&f.name)
            .map(Cow::Borrowed)
            .ok_or_else(|| EncodingError::MissingField {
                type_name: inst.type_name().to_string(),
                field: f.name.clone(),
            })
    }

    /// Decode one `type_name` instance from the front of `bytes`, returning the
    /// instance and the unconsumed remainder.
    pub fn decode<'a>(&self, type_name: &str, bytes: &'a [u8]) -> Result<(Instance, &'a [u8]), DecodingError> {
        let def = self
            .schema
            .get(type_name)
            .ok_or_else(|| DecodingError::UnknownStruct(type_name.to_string()))?;
        let (inst, consumed) = self.decode_struct(def, bytes)?;
        Ok((inst, &bytes[consumed..]))
    }

    fn decode_struct(&self, def: &StructType, data: &[u8]) -> Result<(Instance, usize), DecodingError> {
        let mut r = Cursor::new(data);
        let mut fields = HashMap::with_capacity(def.fields().len());
        for f in def.fields() {
            let value = match &f.binding {
                FieldBinding::Format(fmt) => fmt.read(&mut r, self.endianness)?,
                FieldBinding::Struct(ty) => {
                    let nested = self
                        .schema
                        .get(ty)
                        .ok_or_else(|| DecodingError::UnknownStruct(ty.clone()))?;
                    let start = r.position() as usize;
                    let (inst, used) = self.decode_struct(nested, &data[start..])?;
                    r.set_position((start + used) as u64);
                    Value::Struct(inst)
                }
            };
            if !f.is_discriminator {
                fields.insert(f.name.clone(), value);
                continue;
            }

            let found = value.as_u64().unwrap_or_default();
            if def.discriminator() == Some(f.name.as_str()) {
                let Some(variant) = self.schema.variant_for(def.name(), found) else {
                    debug!(union = def.name(), field = %f.name, value = found, "unknown discriminator value");
                    return Err(DecodingError::UnknownDiscriminator {
                        union: def.name().to_string(),
                        field: f.name.clone(),
                        value: found,
                    });
                };
                trace!(union = def.name(), variant = variant.name(), "resolved union variant");
                return self.decode_struct(variant, data);
            }
            if let Some(expected) = self.schema.discriminator_value(def.name(), &f.name) {
                if expected != found {
                    return Err(DecodingError::DiscriminatorMismatch {
                        type_name: def.name().to_string(),
                        field: f.name.clone(),
                        expected,
                        found,
                    });
                }
            }
        }
        Ok((
            Instance::from_parts(def.name().to_string(), fields),
            r.position() as usize,
        ))
    }

    /// Packed C `typedef struct` for `type_name`; see [`cgen::generate_c_declaration`].
    pub fn generate_c_declaration(&self, type_name: &str, name: Option<&str>) -> Result<String, DefinitionError> {
        cgen::generate_c_declaration(&self.schema, type_name, name)
    }
}
