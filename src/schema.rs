//! Struct types, field specifications and the union variant registry.
//!
//! Types are declared once with [`StructBuilder`] and added to a [`Schema`] in
//! dependency order: a base type or nested struct type must be defined before the
//! type that uses it. The schema is append-only; once loading is done it is only
//! read, so it can be shared freely between threads.
//!
//! A type becomes a union base by flagging one of its own fields as the
//! discriminator. Types that extend it register a variant value for that field;
//! one registry table exists per discriminator field name.

use crate::error::DefinitionError;
use crate::format::{Format, IntType};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// What a field is bound to: exactly one of a format or a nested struct type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldBinding {
    Format(Format),
    Struct(String),
}

impl From<Format> for FieldBinding {
    fn from(f: Format) -> Self {
        FieldBinding::Format(f)
    }
}

/// Field as declared in a [`StructBuilder`].
#[derive(Debug, Clone)]
pub struct FieldDecl {
    name: String,
    binding: FieldBinding,
    doc: Option<String>,
    c_name: Option<String>,
    embed: bool,
    discriminator: bool,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, binding: impl Into<FieldBinding>) -> Self {
        FieldDecl {
            name: name.into(),
            binding: binding.into(),
            doc: None,
            c_name: None,
            embed: false,
            discriminator: false,
        }
    }

    /// Field holding an instance of another struct type.
    pub fn nested(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        FieldDecl::new(name, FieldBinding::Struct(type_name.into()))
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Override the member name used in generated C.
    pub fn c_name(mut self, c_name: impl Into<String>) -> Self {
        self.c_name = Some(c_name.into());
        self
    }

    /// Inline the nested struct's members in generated C instead of a nested block.
    pub fn embed(mut self) -> Self {
        self.embed = true;
        self
    }

    /// Mark this field as the union discriminator of the declaring type.
    pub fn discriminator(mut self) -> Self {
        self.discriminator = true;
        self
    }
}

/// Declaration of a struct type, produced by [`StructBuilder::build`].
#[derive(Debug, Clone)]
pub struct StructDecl {
    name: String,
    doc: Option<String>,
    base: Option<String>,
    variant: Option<u64>,
    variant_label: Option<String>,
    fields: Vec<FieldDecl>,
}

/// Builder for struct type declarations.
#[derive(Debug, Clone)]
pub struct StructBuilder {
    decl: StructDecl,
}

impl StructBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        StructBuilder {
            decl: StructDecl {
                name: name.into(),
                doc: None,
                base: None,
                variant: None,
                variant_label: None,
                fields: Vec::new(),
            },
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.decl.doc = Some(doc.into());
        self
    }

    /// Inherit all fields of `base`, in order, ahead of this type's own fields.
    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.decl.base = Some(base.into());
        self
    }

    /// Register this type under `value` of the nearest ancestor's discriminator.
    pub fn variant(mut self, value: u64) -> Self {
        self.decl.variant = Some(value);
        self
    }

    /// Name used for this variant's member in the generated C union.
    pub fn variant_label(mut self, label: impl Into<String>) -> Self {
        self.decl.variant_label = Some(label.into());
        self
    }

    pub fn field(mut self, field: FieldDecl) -> Self {
        self.decl.fields.push(field);
        self
    }

    pub fn build(self) -> StructDecl {
        self.decl
    }
}

/// A resolved field: binding plus metadata and the type that declared it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub binding: FieldBinding,
    pub doc: Option<String>,
    pub c_name: Option<String>,
    pub embed: bool,
    pub is_discriminator: bool,
    pub declaring_type: String,
}

/// Registration of a variant type in a union table.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantTag {
    /// Union base type owning the discriminator.
    pub union: String,
    /// Discriminator field name.
    pub field: String,
    pub value: u64,
    pub label: Option<String>,
}

/// A defined struct type.
#[derive(Debug, Clone)]
pub struct StructType {
    name: String,
    doc: Option<String>,
    base: Option<String>,
    fields: Vec<FieldSpec>,
    discriminator: Option<String>,
    variant: Option<VariantTag>,
}

impl StructType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// All fields in wire order, inherited ones first.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Fields declared by this type itself.
    pub fn own_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(move |f| f.declaring_type == self.name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Name of the discriminator field this type declares, if it is a union base.
    pub fn discriminator(&self) -> Option<&str> {
        self.discriminator.as_deref()
    }

    pub fn discriminator_field(&self) -> Option<&FieldSpec> {
        self.discriminator.as_deref().and_then(|d| self.field(d))
    }

    pub fn is_union(&self) -> bool {
        self.discriminator.is_some()
    }

    pub fn variant(&self) -> Option<&VariantTag> {
        self.variant.as_ref()
    }
}

#[derive(Debug, Clone)]
struct UnionTable {
    union: String,
    entries: Vec<(u64, String)>,
}

/// Append-only registry of struct types and union variants.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    types: Vec<StructType>,
    by_name: HashMap<String, usize>,
    /// Discriminator field name -> union table.
    unions: HashMap<String, UnionTable>,
}

impl Schema {
    pub fn new() -> Self {
        Schema::default()
    }

    /// Define a struct type. Fails on any malformed declaration; nothing is
    /// registered in that case.
    pub fn define(&mut self, decl: StructDecl) -> Result<(), DefinitionError> {
        if self.by_name.contains_key(&decl.name) {
            return Err(DefinitionError::DuplicateStruct(decl.name));
        }
        let base = match &decl.base {
            Some(b) => Some(
                self.get(b)
                    .ok_or_else(|| DefinitionError::UnknownStruct(b.clone()))?,
            ),
            None => None,
        };

        let mut fields: Vec<FieldSpec> = base.map(|b| b.fields.clone()).unwrap_or_default();
        let inherited = fields.len();
        let mut discriminator: Option<String> = None;

        for f in decl.fields {
            if let Some(prev) = fields.iter().find(|p| p.name == f.name) {
                return Err(if prev.declaring_type == decl.name {
                    DefinitionError::DuplicateField {
                        type_name: decl.name.clone(),
                        field: f.name,
                    }
                } else {
                    DefinitionError::RedeclaredField {
                        type_name: decl.name.clone(),
                        field: f.name,
                        inherited_from: prev.declaring_type.clone(),
                    }
                });
            }
            match &f.binding {
                FieldBinding::Format(fmt) => {
                    fmt.validate().map_err(|reason| DefinitionError::InvalidFormat {
                        type_name: decl.name.clone(),
                        field: f.name.clone(),
                        reason,
                    })?;
                    if f.embed {
                        return Err(DefinitionError::EmbedWithoutStruct {
                            type_name: decl.name.clone(),
                            field: f.name,
                        });
                    }
                }
                FieldBinding::Struct(ty) => {
                    if !self.by_name.contains_key(ty) {
                        return Err(DefinitionError::UnknownStruct(ty.clone()));
                    }
                }
            }
            if f.discriminator {
                let unsigned_scalar = matches!(
                    &f.binding,
                    FieldBinding::Format(fmt) if fmt.as_scalar_int().is_some_and(|t| !t.is_signed())
                );
                if !unsigned_scalar {
                    return Err(DefinitionError::InvalidDiscriminator {
                        type_name: decl.name.clone(),
                        field: f.name,
                    });
                }
                if discriminator.is_some() {
                    return Err(DefinitionError::MultipleDiscriminators(decl.name.clone()));
                }
                if let Some(table) = self.unions.get(&f.name) {
                    return Err(DefinitionError::DuplicateDiscriminatorField {
                        field: f.name,
                        union: table.union.clone(),
                    });
                }
                discriminator = Some(f.name.clone());
            }
            fields.push(FieldSpec {
                name: f.name,
                binding: f.binding,
                doc: f.doc,
                c_name: f.c_name,
                embed: f.embed,
                is_discriminator: f.discriminator,
                declaring_type: decl.name.clone(),
            });
        }

        let variant = match decl.variant {
            Some(value) => Some(self.resolve_variant(&decl.name, base, value, decl.variant_label)?),
            None => None,
        };

        // Every inherited discriminator must have a fixed value for this type.
        for f in fields[..inherited].iter().filter(|f| f.is_discriminator) {
            let own = variant.as_ref().is_some_and(|v| v.field == f.name);
            let from_ancestor = base
                .and_then(|b| self.discriminator_value(&b.name, &f.name))
                .is_some();
            if !own && !from_ancestor {
                return Err(DefinitionError::MissingVariantValue {
                    type_name: decl.name.clone(),
                    union: f.declaring_type.clone(),
                    field: f.name.clone(),
                });
            }
        }

        if fields.is_empty() {
            return Err(DefinitionError::EmptyStruct(decl.name));
        }

        if let Some(base) = base {
            let ancestors: HashSet<&str> = self.lineage(&base.name).map(|t| t.name.as_str()).collect();
            let mut seen = HashSet::new();
            for f in &fields[inherited..] {
                if let FieldBinding::Struct(ty) = &f.binding {
                    if let Some(via) = self.reaches(ty, &ancestors, &mut seen) {
                        return Err(DefinitionError::RecursiveLayout {
                            type_name: decl.name.clone(),
                            field: f.name.clone(),
                            via,
                        });
                    }
                }
            }
        }

        if let Some(tag) = &variant {
            if let Some(table) = self.unions.get_mut(&tag.field) {
                table.entries.push((tag.value, decl.name.clone()));
            }
        }
        if let Some(field) = &discriminator {
            self.unions.insert(
                field.clone(),
                UnionTable {
                    union: decl.name.clone(),
                    entries: Vec::new(),
                },
            );
        }
        self.by_name.insert(decl.name.clone(), self.types.len());
        self.types.push(StructType {
            name: decl.name,
            doc: decl.doc,
            base: decl.base,
            fields,
            discriminator,
            variant,
        });

        // A new variant grows its unions and every type nesting them.
        let overflow = self
            .types
            .iter()
            .find(|t| self.size_of(t, false).is_none())
            .map(|t| t.name.clone());
        if let Some(affected) = overflow {
            let type_name = self.pop_last().map(|t| t.name).unwrap_or_default();
            return Err(DefinitionError::SizeOverflow { type_name, affected });
        }

        if let Some(t) = self.types.last() {
            if let Some(tag) = &t.variant {
                debug!(
                    union = %tag.union,
                    variant = %t.name,
                    value = tag.value,
                    "registered union variant"
                );
            }
            debug!(type_name = %t.name, fields = t.fields.len(), "defined struct type");
        }
        Ok(())
    }

    /// Undo the most recent registration.
    fn pop_last(&mut self) -> Option<StructType> {
        let t = self.types.pop()?;
        self.by_name.remove(&t.name);
        if let Some(d) = &t.discriminator {
            self.unions.remove(d);
        }
        if let Some(tag) = &t.variant {
            if let Some(table) = self.unions.get_mut(&tag.field) {
                table.entries.pop();
            }
        }
        Some(t)
    }

    /// Find the union table a new variant of `base` registers into.
    fn resolve_variant(
        &self,
        type_name: &str,
        base: Option<&StructType>,
        value: u64,
        label: Option<String>,
    ) -> Result<VariantTag, DefinitionError> {
        let base = base.ok_or_else(|| DefinitionError::NotAUnion(type_name.to_string()))?;
        let chain: Vec<&StructType> = self.lineage(&base.name).collect();
        let pos = chain
            .iter()
            .position(|t| t.is_union())
            .ok_or_else(|| DefinitionError::NotAUnion(type_name.to_string()))?;
        let union = chain[pos];
        let field = union.discriminator_field().ok_or_else(|| DefinitionError::NotAUnion(type_name.to_string()))?;

        if let Some(ancestor) = chain[..pos]
            .iter()
            .find(|t| t.variant.as_ref().is_some_and(|v| v.field == field.name))
        {
            return Err(DefinitionError::VariantAlreadyResolved {
                type_name: type_name.to_string(),
                field: field.name.clone(),
                ancestor: ancestor.name.clone(),
            });
        }

        if let FieldBinding::Format(fmt) = &field.binding {
            if let Some(ty) = fmt.as_scalar_int() {
                if value as i128 > ty.max() {
                    return Err(DefinitionError::VariantOutOfRange {
                        type_name: type_name.to_string(),
                        field: field.name.clone(),
                        value,
                        ty,
                    });
                }
            }
        }

        if let Some((_, existing)) = self
            .unions
            .get(&field.name)
            .and_then(|t| t.entries.iter().find(|(v, _)| *v == value))
        {
            return Err(DefinitionError::DuplicateVariant {
                field: field.name.clone(),
                value,
                existing: existing.clone(),
            });
        }

        Ok(VariantTag {
            union: union.name.clone(),
            field: field.name.clone(),
            value,
            label,
        })
    }

    /// Returns the first type in `targets` reachable from `from` through nested
    /// fields or union variants.
    fn reaches(&self, from: &str, targets: &HashSet<&str>, seen: &mut HashSet<String>) -> Option<String> {
        if targets.contains(from) {
            return Some(from.to_string());
        }
        if !seen.insert(from.to_string()) {
            return None;
        }
        let t = self.get(from)?;
        for f in &t.fields {
            if let FieldBinding::Struct(ty) = &f.binding {
                if let Some(hit) = self.reaches(ty, targets, seen) {
                    return Some(hit);
                }
            }
        }
        for (_, v) in self.variants(from) {
            if let Some(hit) = self.reaches(v, targets, seen) {
                return Some(hit);
            }
        }
        None
    }

    pub fn get(&self, name: &str) -> Option<&StructType> {
        self.by_name.get(name).map(|&i| &self.types[i])
    }

    /// All types in definition order.
    pub fn struct_types(&self) -> &[StructType] {
        &self.types
    }

    /// The type itself followed by its ancestors, nearest first.
    pub fn lineage<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a StructType> + 'a {
        std::iter::successors(self.get(name), move |t| t.base.as_deref().and_then(|b| self.get(b)))
    }

    /// True if `ty` is `ancestor` or extends it, directly or indirectly.
    pub fn is_descendant(&self, ty: &str, ancestor: &str) -> bool {
        self.lineage(ty).any(|t| t.name == ancestor)
    }

    /// Registered variants of a union base, in registration order.
    pub fn variants(&self, union: &str) -> &[(u64, String)] {
        self.get(union)
            .and_then(StructType::discriminator)
            .and_then(|d| self.unions.get(d))
            .map(|t| t.entries.as_slice())
            .unwrap_or(&[])
    }

    pub fn variant_for(&self, union: &str, value: u64) -> Option<&StructType> {
        self.variants(union)
            .iter()
            .find(|(v, _)| *v == value)
            .and_then(|(_, name)| self.get(name))
    }

    /// Value the discriminator `field` takes for instances of `ty`.
    pub fn discriminator_value(&self, ty: &str, field: &str) -> Option<u64> {
        self.lineage(ty)
            .find_map(|t| t.variant.as_ref().filter(|v| v.field == field).map(|v| v.value))
    }

    /// Integer type of a discriminator field.
    pub(crate) fn discriminator_type(f: &FieldSpec) -> Option<IntType> {
        match &f.binding {
            FieldBinding::Format(fmt) if f.is_discriminator => fmt.as_scalar_int(),
            _ => None,
        }
    }

    /// Smallest encoded size of `ty`. A union base reserves room for its largest variant.
    pub fn minimum_size(&self, ty: &str) -> Option<usize> {
        self.get(ty).and_then(|t| self.size_of(t, false))
    }

    /// Size of the fields `ty` declares itself, plus its own union block.
    pub fn own_minimum_size(&self, ty: &str) -> Option<usize> {
        self.get(ty).and_then(|t| self.size_of(t, true))
    }

    /// Largest own minimum size among the registered variants of `ty` (0 if none).
    pub fn union_size(&self, ty: &str) -> usize {
        self.checked_union_size(ty).unwrap_or(0)
    }

    fn checked_union_size(&self, ty: &str) -> Option<usize> {
        self.variants(ty)
            .iter()
            .try_fold(0, |largest: usize, (_, v)| Some(largest.max(self.own_minimum_size(v)?)))
    }

    /// `None` if the size does not fit in `usize`.
    fn size_of(&self, t: &StructType, own_only: bool) -> Option<usize> {
        let mut total: usize = 0;
        for f in t.fields.iter().filter(|f| !own_only || f.declaring_type == t.name) {
            total = total.checked_add(self.field_min_size(f)?)?;
        }
        if t.is_union() {
            total = total.checked_add(self.checked_union_size(&t.name)?)?;
        }
        Some(total)
    }

    fn field_min_size(&self, f: &FieldSpec) -> Option<usize> {
        match &f.binding {
            FieldBinding::Format(fmt) => Some(fmt.min_size()),
            FieldBinding::Struct(ty) => self.minimum_size(ty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh_schema() -> Schema {
        let mut s = Schema::new();
        s.define(
            StructBuilder::new("MeshMessage")
                .field(FieldDecl::new("dst", Format::hex_sep(6, ":")))
                .field(FieldDecl::new("msg_type", Format::u8()).discriminator())
                .build(),
        )
        .unwrap();
        s.define(StructBuilder::new("Ping").extends("MeshMessage").variant(2).build())
            .unwrap();
        s.define(
            StructBuilder::new("Echo")
                .extends("MeshMessage")
                .variant(3)
                .field(FieldDecl::new("content", Format::var_str()))
                .field(FieldDecl::new("stamp", Format::u32()))
                .build(),
        )
        .unwrap();
        s
    }

    #[test]
    fn inherited_fields_come_first() {
        let s = mesh_schema();
        let echo = s.get("Echo").unwrap();
        let names: Vec<_> = echo.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["dst", "msg_type", "content", "stamp"]);
        assert_eq!(echo.fields()[1].declaring_type, "MeshMessage");
        assert_eq!(echo.own_fields().count(), 2);
        assert!(echo.fields()[1].is_discriminator);
        assert!(!echo.is_union());
    }

    #[test]
    fn registry_lookups() {
        let s = mesh_schema();
        assert_eq!(s.variants("MeshMessage").len(), 2);
        assert_eq!(s.variant_for("MeshMessage", 3).map(StructType::name), Some("Echo"));
        assert!(s.variant_for("MeshMessage", 9).is_none());
        assert_eq!(s.discriminator_value("Ping", "msg_type"), Some(2));
        assert_eq!(s.discriminator_value("MeshMessage", "msg_type"), None);
        assert!(s.is_descendant("Echo", "MeshMessage"));
        assert!(!s.is_descendant("MeshMessage", "Echo"));
    }

    #[test]
    fn union_minimum_size_reserves_largest_variant() {
        let s = mesh_schema();
        // dst(6) + msg_type(1) + max(Ping 0, Echo 1 + 4)
        assert_eq!(s.minimum_size("MeshMessage"), Some(12));
        assert_eq!(s.own_minimum_size("Echo"), Some(5));
        assert_eq!(s.minimum_size("Echo"), Some(12));
        assert_eq!(s.minimum_size("Ping"), Some(7));
    }

    #[test]
    fn duplicate_variant_value_is_rejected() {
        let mut s = mesh_schema();
        let err = s
            .define(StructBuilder::new("Pong").extends("MeshMessage").variant(2).build())
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::DuplicateVariant {
                field: "msg_type".to_string(),
                value: 2,
                existing: "Ping".to_string()
            }
        );
        assert!(s.get("Pong").is_none());
    }

    #[test]
    fn redeclaring_inherited_field_is_rejected() {
        let mut s = mesh_schema();
        let err = s
            .define(
                StructBuilder::new("Bad")
                    .extends("MeshMessage")
                    .variant(7)
                    .field(FieldDecl::new("dst", Format::u8()))
                    .build(),
            )
            .unwrap_err();
        assert!(matches!(err, DefinitionError::RedeclaredField { .. }));
        // Failed definitions leave the registry untouched.
        assert!(s.variant_for("MeshMessage", 7).is_none());
    }

    #[test]
    fn variant_requires_union_ancestor() {
        let mut s = Schema::new();
        s.define(StructBuilder::new("Plain").field(FieldDecl::new("a", Format::u8())).build())
            .unwrap();
        let err = s
            .define(StructBuilder::new("V").extends("Plain").variant(1).build())
            .unwrap_err();
        assert_eq!(err, DefinitionError::NotAUnion("V".to_string()));
        let err = s.define(StructBuilder::new("W").variant(1).build()).unwrap_err();
        assert_eq!(err, DefinitionError::NotAUnion("W".to_string()));
    }

    #[test]
    fn extending_union_without_value_is_rejected() {
        let mut s = mesh_schema();
        let err = s
            .define(StructBuilder::new("Loose").extends("MeshMessage").build())
            .unwrap_err();
        assert!(matches!(err, DefinitionError::MissingVariantValue { .. }));
    }

    #[test]
    fn empty_struct_is_rejected() {
        let mut s = mesh_schema();
        let err = s.define(StructBuilder::new("Nothing").build()).unwrap_err();
        assert_eq!(err, DefinitionError::EmptyStruct("Nothing".to_string()));
        assert!(s.get("Nothing").is_none());
        // Variants without own fields still carry the inherited header.
        assert_eq!(s.get("Ping").map(|t| t.fields().len()), Some(2));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn size_overflow_is_rejected_and_rolled_back() {
        let mut s = mesh_schema();
        let half = 1usize << 63;
        let err = s
            .define(
                StructBuilder::new("Wide")
                    .field(FieldDecl::new("a", Format::array(IntType::U8, half)))
                    .field(FieldDecl::new("b", Format::array(IntType::U8, half)))
                    .build(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::SizeOverflow {
                type_name: "Wide".to_string(),
                affected: "Wide".to_string()
            }
        );

        s.define(
            StructBuilder::new("Envelope")
                .field(FieldDecl::new("pad", Format::array(IntType::U8, half)))
                .field(FieldDecl::nested("msg", "MeshMessage"))
                .build(),
        )
        .unwrap();
        // Fits alone, but the union grows past what Envelope can hold.
        let err = s
            .define(
                StructBuilder::new("Bulk")
                    .extends("MeshMessage")
                    .variant(9)
                    .field(FieldDecl::new("blob", Format::array(IntType::U8, half)))
                    .build(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::SizeOverflow {
                type_name: "Bulk".to_string(),
                affected: "Envelope".to_string()
            }
        );
        assert!(s.get("Bulk").is_none());
        assert!(s.variant_for("MeshMessage", 9).is_none());
        assert_eq!(s.minimum_size("MeshMessage"), Some(12));
        assert_eq!(s.minimum_size("Envelope"), Some(half + 12));
    }

    #[test]
    fn discriminator_checks() {
        let mut s = mesh_schema();
        let err = s
            .define(
                StructBuilder::new("Other")
                    .field(FieldDecl::new("msg_type", Format::u8()).discriminator())
                    .build(),
            )
            .unwrap_err();
        assert!(matches!(err, DefinitionError::DuplicateDiscriminatorField { .. }));

        let err = s
            .define(
                StructBuilder::new("Signed")
                    .field(FieldDecl::new("kind", Format::i8()).discriminator())
                    .build(),
            )
            .unwrap_err();
        assert!(matches!(err, DefinitionError::InvalidDiscriminator { .. }));

        let err = s
            .define(StructBuilder::new("Big").extends("MeshMessage").variant(256).build())
            .unwrap_err();
        assert!(matches!(err, DefinitionError::VariantOutOfRange { .. }));
    }

    #[test]
    fn nested_types_must_exist_and_embed_needs_struct() {
        let mut s = Schema::new();
        let err = s
            .define(StructBuilder::new("A").field(FieldDecl::nested("b", "B")).build())
            .unwrap_err();
        assert_eq!(err, DefinitionError::UnknownStruct("B".to_string()));
        let err = s
            .define(StructBuilder::new("A").field(FieldDecl::new("x", Format::u8()).embed()).build())
            .unwrap_err();
        assert!(matches!(err, DefinitionError::EmbedWithoutStruct { .. }));
    }

    #[test]
    fn variant_cannot_contain_its_own_union() {
        let mut s = mesh_schema();
        let err = s
            .define(
                StructBuilder::new("Forward")
                    .extends("MeshMessage")
                    .variant(9)
                    .field(FieldDecl::nested("inner", "MeshMessage"))
                    .build(),
            )
            .unwrap_err();
        assert!(matches!(err, DefinitionError::RecursiveLayout { .. }));
    }
}
