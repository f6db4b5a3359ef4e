//! JSON bridge: instances to and from JSON objects.
//!
//! Objects use field names as keys in wire order. Discriminators are written as
//! numbers. Reading a union base requires its discriminator key, which selects
//! the variant; inherited discriminators may be omitted but are checked if present.

use crate::codec::Codec;
use crate::error::{DecodingError, EncodingError};
use crate::schema::{FieldBinding, FieldSpec, Schema, StructType};
use crate::value::{Instance, Value};
use serde_json::Map;
use std::collections::HashMap;

impl Codec {
    /// JSON object for `inst` declared as `type_name`.
    pub fn to_json(&self, type_name: &str, inst: &Instance) -> Result<serde_json::Value, EncodingError> {
        let def = self
            .schema()
            .get(type_name)
            .ok_or_else(|| EncodingError::UnknownStruct(type_name.to_string()))?;
        Ok(serde_json::Value::Object(self.struct_to_json(def, inst)?))
    }

    fn struct_to_json(&self, def: &StructType, inst: &Instance) -> Result<Map<String, serde_json::Value>, EncodingError> {
        let concrete = self.concrete(def, inst)?;
        let mut out = Map::new();
        if concrete.name() != def.name() {
            // Discriminator leads, then the concrete type's fields in wire order.
            if let Some(d) = def.discriminator_field() {
                out.insert(d.name.clone(), self.field_to_json(concrete, d, inst)?);
            }
        }
        for f in concrete.fields() {
            out.insert(f.name.clone(), self.field_to_json(concrete, f, inst)?);
        }
        Ok(out)
    }

    fn field_to_json(&self, concrete: &StructType, f: &FieldSpec, inst: &Instance) -> Result<serde_json::Value, EncodingError> {
        let value = self.field_value(concrete, f, inst)?;
        match &f.binding {
            FieldBinding::Format(fmt) => fmt.to_json(&value).map_err(|source| EncodingError::Value {
                field: f.name.clone(),
                source,
            }),
            FieldBinding::Struct(ty) => {
                let nested = value.as_struct().ok_or_else(|| EncodingError::StructExpected {
                    field: f.name.clone(),
                    expected: ty.clone(),
                    found: value.kind(),
                })?;
                let def = self
                    .schema()
                    .get(ty)
                    .ok_or_else(|| EncodingError::UnknownStruct(ty.clone()))?;
                Ok(serde_json::Value::Object(self.struct_to_json(def, nested)?))
            }
        }
    }

    /// Build a `type_name` instance from a JSON object. Unknown keys are ignored.
    pub fn from_json(&self, type_name: &str, json: &serde_json::Value) -> Result<Instance, DecodingError> {
        let def = self
            .schema()
            .get(type_name)
            .ok_or_else(|| DecodingError::UnknownStruct(type_name.to_string()))?;
        let obj = json.as_object().ok_or_else(|| DecodingError::ExpectedObject {
            field: type_name.to_string(),
        })?;
        self.struct_from_json(def, obj)
    }

    fn struct_from_json(&self, def: &StructType, obj: &Map<String, serde_json::Value>) -> Result<Instance, DecodingError> {
        if let Some(d) = def.discriminator_field() {
            let raw = obj.get(&d.name).ok_or_else(|| DecodingError::MissingField {
                type_name: def.name().to_string(),
                field: d.name.clone(),
            })?;
            let value = self.field_from_json(d, raw)?.as_u64().unwrap_or_default();
            let variant = self
                .schema()
                .variant_for(def.name(), value)
                .ok_or_else(|| DecodingError::UnknownDiscriminator {
                    union: def.name().to_string(),
                    field: d.name.clone(),
                    value,
                })?;
            return self.struct_from_json(variant, obj);
        }

        let mut fields = HashMap::with_capacity(def.fields().len());
        for f in def.fields() {
            let raw = obj.get(&f.name);
            if Schema::discriminator_type(f).is_some() {
                if let (Some(raw), Some(expected)) = (raw, self.schema().discriminator_value(def.name(), &f.name)) {
                    let found = self.field_from_json(f, raw)?.as_u64().unwrap_or_default();
                    if found != expected {
                        return Err(DecodingError::DiscriminatorMismatch {
                            type_name: def.name().to_string(),
                            field: f.name.clone(),
                            expected,
                            found,
                        });
                    }
                }
                continue;
            }
            let raw = raw.ok_or_else(|| DecodingError::MissingField {
                type_name: def.name().to_string(),
                field: f.name.clone(),
            })?;
            fields.insert(f.name.clone(), self.field_from_json(f, raw)?);
        }
        Ok(Instance::from_parts(def.name().to_string(), fields))
    }

    fn field_from_json(&self, f: &FieldSpec, raw: &serde_json::Value) -> Result<Value, DecodingError> {
        match &f.binding {
            FieldBinding::Format(fmt) => fmt.from_json(raw).map_err(|source| DecodingError::Json {
                field: f.name.clone(),
                source,
            }),
            FieldBinding::Struct(ty) => {
                let obj = raw.as_object().ok_or_else(|| DecodingError::ExpectedObject {
                    field: f.name.clone(),
                })?;
                let def = self
                    .schema()
                    .get(ty)
                    .ok_or_else(|| DecodingError::UnknownStruct(ty.clone()))?;
                Ok(Value::Struct(self.struct_from_json(def, obj)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::codec::{Codec, Endianness};
    use crate::error::DecodingError;
    use crate::format::Format;
    use crate::schema::{FieldDecl, Schema, StructBuilder};
    use crate::value::{Instance, Value};
    use serde_json::json;

    fn codec() -> Codec {
        let mut s = Schema::new();
        s.define(
            StructBuilder::new("Msg")
                .field(FieldDecl::new("src", Format::u8()))
                .field(FieldDecl::new("kind", Format::u8()).discriminator())
                .build(),
        )
        .unwrap();
        s.define(
            StructBuilder::new("Text")
                .extends("Msg")
                .variant(4)
                .field(FieldDecl::new("body", Format::var_str()))
                .build(),
        )
        .unwrap();
        Codec::new(s, Endianness::Little)
    }

    #[test]
    fn union_json_puts_discriminator_first() {
        let c = codec();
        let text = Instance::new("Text").with("src", Value::U8(7)).with("body", "hi");
        let j = c.to_json("Msg", &text).unwrap();
        assert_eq!(j, json!({"kind": 4, "src": 7, "body": "hi"}));
        let keys: Vec<_> = j.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["kind", "src", "body"]);
        assert_eq!(c.from_json("Msg", &j).unwrap(), text);
    }

    #[test]
    fn from_json_requires_union_discriminator() {
        let c = codec();
        let err = c.from_json("Msg", &json!({"src": 1, "body": "x"})).unwrap_err();
        assert!(matches!(err, DecodingError::MissingField { .. }));
        let err = c
            .from_json("Msg", &json!({"src": 1, "kind": 8, "body": "x"}))
            .unwrap_err();
        assert!(matches!(err, DecodingError::UnknownDiscriminator { value: 8, .. }));
    }

    #[test]
    fn from_json_checks_inherited_discriminator() {
        let c = codec();
        let inst = c.from_json("Text", &json!({"src": 1, "body": "x"})).unwrap();
        assert_eq!(inst.type_name(), "Text");
        let err = c
            .from_json("Text", &json!({"src": 1, "kind": 5, "body": "x"}))
            .unwrap_err();
        assert!(matches!(err, DecodingError::DiscriminatorMismatch { .. }));
        let err = c.from_json("Text", &json!({"src": "one", "body": "x"})).unwrap_err();
        assert!(matches!(err, DecodingError::Json { .. }));
    }
}
