//! Packed C struct/union declarations matching the wire layout.
//!
//! Output uses the `__packed` attribute macro and 4-space indentation. A union
//! base gets an anonymous `union __packed` block after its own fields with one
//! member per registered variant plus a `uint8_t bytes[N]` member sized to the
//! largest variant.

use crate::error::DefinitionError;
use crate::schema::{FieldBinding, FieldSpec, Schema, StructType};

/// Indent every non-empty line by four spaces.
pub fn indent_c(code: &str) -> String {
    code.lines()
        .map(|l| if l.is_empty() { String::new() } else { format!("    {}", l) })
        .collect::<Vec<_>>()
        .join("\n")
}

/// C identifier for a schema name: names containing `_` are lowercased as is,
/// CamelCase names get `_` at each lower-to-upper transition.
pub fn normalize_name(name: &str) -> String {
    if name.contains('_') {
        return name.to_lowercase();
    }
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = c.is_ascii_lowercase();
        out.extend(c.to_lowercase());
    }
    out
}

/// Default typedef name for a struct type: `normalize_name(type) + "_t"`.
pub fn struct_name(type_name: &str) -> String {
    format!("{}_t", normalize_name(type_name))
}

/// `typedef struct __packed {...} name;` for `type_name`, preceded by its doc comment.
pub fn generate_c_declaration(schema: &Schema, type_name: &str, name: Option<&str>) -> Result<String, DefinitionError> {
    let def = lookup(schema, type_name)?;
    let gen = CGen { schema };
    let name = name.map_or_else(|| struct_name(type_name), str::to_string);
    Ok(format!(
        "{}typedef struct __packed {} {};",
        doc_line(def.doc()),
        gen.struct_body(def, false),
        name
    ))
}

/// `typedef union __packed {...} name;` holding only the variant block of a union base.
pub fn generate_c_union_declaration(
    schema: &Schema,
    type_name: &str,
    name: Option<&str>,
) -> Result<String, DefinitionError> {
    let def = lookup(schema, type_name)?;
    if !def.is_union() {
        return Err(DefinitionError::NotAUnion(type_name.to_string()));
    }
    let gen = CGen { schema };
    let name = name.map_or_else(|| format!("{}_union_t", normalize_name(type_name)), str::to_string);
    Ok(format!(
        "{}typedef union __packed {} {};",
        doc_line(def.doc()),
        gen.union_block(def),
        name
    ))
}

/// Complete header with include guard and declarations for every type.
pub fn generate_c_header(schema: &Schema, guard: &str) -> Result<String, DefinitionError> {
    let mut out = String::new();
    out.push_str("/* Generated by meshstruct. Do not edit. */\n");
    out.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
    out.push_str("#include <stdint.h>\n\n");
    out.push_str("#ifndef __packed\n#define __packed __attribute__((packed))\n#endif\n\n");
    for t in schema.struct_types() {
        out.push_str(&generate_c_declaration(schema, t.name(), None)?);
        out.push_str("\n\n");
    }
    out.push_str(&format!("#endif /* {guard} */\n"));
    Ok(out)
}

fn lookup<'s>(schema: &'s Schema, type_name: &str) -> Result<&'s StructType, DefinitionError> {
    schema
        .get(type_name)
        .ok_or_else(|| DefinitionError::UnknownStruct(type_name.to_string()))
}

fn doc_line(doc: Option<&str>) -> String {
    doc.map(|d| format!("/** {} */\n", d)).unwrap_or_default()
}

fn c_field_name(f: &FieldSpec) -> String {
    f.c_name.clone().unwrap_or_else(|| normalize_name(&f.name))
}

struct CGen<'a> {
    schema: &'a Schema,
}

impl CGen<'_> {
    /// Member lines for `def`. Inside a union block a variant only lists the
    /// fields it declares itself; inherited ones sit before the block.
    fn items(&self, def: &StructType, in_union: bool) -> Vec<String> {
        let mut items = Vec::new();
        for f in def.fields() {
            if in_union && f.declaring_type != def.name() {
                continue;
            }
            let name = c_field_name(f);
            let code = match &f.binding {
                FieldBinding::Format(fmt) => fmt.c_code(&name),
                FieldBinding::Struct(ty) => {
                    let Some(nested) = self.schema.get(ty) else { continue };
                    if f.embed {
                        items.extend(self.items(nested, false));
                        continue;
                    }
                    format!("struct __packed {} {};", self.struct_body(nested, false), name)
                }
            };
            items.push(match &f.doc {
                Some(doc) => format!("{} /** {} */", code, doc),
                None => code,
            });
        }
        if def.is_union() {
            items.push(format!("union __packed {};", self.union_block(def)));
        }
        items
    }

    fn struct_body(&self, def: &StructType, in_union: bool) -> String {
        braced(&self.items(def, in_union))
    }

    fn union_block(&self, def: &StructType) -> String {
        let mut members = Vec::new();
        for (_, variant) in self.schema.variants(def.name()) {
            let Some(v) = self.schema.get(variant) else { continue };
            let items = self.items(v, true);
            if items.is_empty() {
                continue;
            }
            let label = v
                .variant()
                .and_then(|tag| tag.label.as_deref())
                .unwrap_or(v.name());
            members.push(format!("struct __packed {} {};", braced(&items), normalize_name(label)));
        }
        members.push(format!("uint8_t bytes[{}];", self.schema.union_size(def.name())));
        braced(&members)
    }
}

fn braced(items: &[String]) -> String {
    format!("{{\n{}\n}}", indent_c(&items.join("\n")))
}
