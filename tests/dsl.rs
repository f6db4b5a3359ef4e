//! DSL tests: syntax (parse success/failure) and semantics (definition errors, schema files).

use meshstruct::ast::TypeExpr;
use meshstruct::{
    load_schema, load_schema_file, parse, DefinitionError, FieldBinding, Format, IntType, ParseError,
};
use std::io::Write;

// ==================== Syntax: valid programs ====================

#[test]
fn parse_empty_schema() {
    let s = parse("").expect("empty schema can parse");
    assert!(s.structs.is_empty());
}

#[test]
fn parse_empty_struct_body() {
    let s = parse("struct A { k: u8 discriminator; }\nstruct B : A = 1 as BEE {}").expect("parse");
    assert_eq!(s.structs.len(), 2);
    assert!(s.structs[1].fields.is_empty());
}

#[test]
fn parse_all_int_types() {
    let src = r#"
struct AllInts {
  a: u8;
  b: u16;
  c: u32;
  d: u64;
  e: i8;
  f: i16;
  g: i32;
  h: i64;
}
"#;
    let s = parse(src).expect("parse");
    let tys: Vec<_> = s.structs[0]
        .fields
        .iter()
        .map(|f| f.type_expr.clone())
        .collect();
    assert_eq!(
        tys,
        [
            IntType::U8,
            IntType::U16,
            IntType::U32,
            IntType::U64,
            IntType::I8,
            IntType::I16,
            IntType::I32,
            IntType::I64
        ]
        .map(TypeExpr::Int)
    );
}

#[test]
fn parse_comments_and_docs() {
    let src = r#"
// plain comment
/* block
   comment */
/// First line.
/// Second line.
struct A {
  // not a doc
  /// the value
  v: u8; // trailing
}
"#;
    let s = parse(src).expect("parse");
    assert_eq!(s.structs[0].doc.as_deref(), Some("First line. Second line."));
    assert_eq!(s.structs[0].fields[0].doc.as_deref(), Some("the value"));
}

#[test]
fn parse_keyword_prefixed_struct_refs() {
    let src = r#"
struct strange { v: u8; }
struct hexagon { v: u8; }
struct User {
  a: strange;
  b: hexagon;
}
"#;
    let s = parse(src).expect("parse");
    assert_eq!(s.structs[2].fields[0].type_expr, TypeExpr::StructRef("strange".to_string()));
    assert_eq!(s.structs[2].fields[1].type_expr, TypeExpr::StructRef("hexagon".to_string()));
}

#[test]
fn parse_embed_and_hex_literals() {
    let src = r#"
struct Pos { x: i16; }
struct Msg { t: u8 discriminator; }
struct Big : Msg = 0xFF { pos: Pos embed; id: hex(4); }
"#;
    let s = parse(src).expect("parse");
    let big = &s.structs[2];
    assert_eq!(big.variant.as_ref().map(|v| v.value), Some(255));
    assert!(big.fields[0].embed);
    assert_eq!(big.fields[1].type_expr, TypeExpr::Hex(4, String::new()));
}

// ==================== Syntax: invalid programs ====================

#[test]
fn parse_missing_semicolon() {
    assert!(matches!(parse("struct A { v: u8 }"), Err(ParseError::Syntax(_))));
}

#[test]
fn parse_unknown_attribute() {
    assert!(matches!(parse("struct A { v: u8 flagged; }"), Err(ParseError::Syntax(_))));
}

#[test]
fn parse_keyword_needs_separator() {
    assert!(parse("structA { v: u8; }").is_err());
}

#[test]
fn parse_bad_string_array_length() {
    assert!(parse("struct A { v: str(x); }").is_err());
}

// ==================== Semantics ====================

#[test]
fn load_builds_formats() {
    let schema = load_schema(
        r#"
struct A {
  mac: hex(6, ":");
  vals: array<u16, u8> c_name("vals_c");
  note: varstr<u16>;
  tags: u8[4];
}
"#,
    )
    .expect("load");
    let a = schema.get("A").expect("A");
    let bindings: Vec<_> = a.fields().iter().map(|f| f.binding.clone()).collect();
    assert_eq!(bindings[0], FieldBinding::Format(Format::hex_sep(6, ":")));
    assert_eq!(bindings[1], FieldBinding::Format(Format::var_array_with(Format::u16(), IntType::U8)));
    assert_eq!(bindings[2], FieldBinding::Format(Format::var_str_with(IntType::U16)));
    assert_eq!(bindings[3], FieldBinding::Format(Format::array(IntType::U8, 4)));
    assert_eq!(a.fields()[1].c_name.as_deref(), Some("vals_c"));
    assert_eq!(schema.minimum_size("A"), Some(6 + 1 + 2 + 4));
}

#[test]
fn load_rejects_use_before_definition() {
    let err = load_schema("struct A { b: B; } struct B { v: u8; }").unwrap_err();
    assert!(matches!(
        err,
        ParseError::Definition(DefinitionError::UnknownStruct(ref name)) if name == "B"
    ));
}

#[test]
fn load_rejects_struct_array_elements() {
    let err = load_schema("struct P { v: u8; } struct A { ps: array<P>; }").unwrap_err();
    assert!(matches!(
        err,
        ParseError::Definition(DefinitionError::InvalidFormat { .. })
    ));
}

#[test]
fn load_rejects_wide_length_prefix() {
    let err = load_schema("struct A { s: varstr<u64>; }").unwrap_err();
    assert!(matches!(
        err,
        ParseError::Definition(DefinitionError::InvalidFormat { .. })
    ));
    let err = load_schema("struct A { s: str(0); }").unwrap_err();
    assert!(matches!(
        err,
        ParseError::Definition(DefinitionError::InvalidFormat { .. })
    ));
}

#[test]
fn load_rejects_empty_struct() {
    let err = load_schema("struct E {}").unwrap_err();
    assert!(matches!(
        err,
        ParseError::Definition(DefinitionError::EmptyStruct(ref name)) if name == "E"
    ));
    // An empty variant still has the inherited header.
    assert!(load_schema("struct M { t: u8 discriminator; } struct P : M = 1 {}").is_ok());
}

#[test]
#[cfg(target_pointer_width = "64")]
fn load_rejects_sizes_that_overflow() {
    let err = load_schema("struct A { x: u64[2305843009213693952]; }").unwrap_err();
    assert!(matches!(
        err,
        ParseError::Definition(DefinitionError::InvalidFormat { ref field, .. }) if field == "x"
    ));
    let err = load_schema(
        "struct A { x: u8[9223372036854775808]; y: u8[9223372036854775808]; }",
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ParseError::Definition(DefinitionError::SizeOverflow { .. })
    ));
    let schema = load_schema("struct A { x: u8[9223372036854775808]; }").expect("fits");
    assert_eq!(schema.minimum_size("A"), Some(1 << 63));
}

#[test]
fn load_rejects_variable_array_elements() {
    let err = load_schema("struct A { names: array<varstr>; }").unwrap_err();
    assert!(matches!(
        err,
        ParseError::Definition(DefinitionError::InvalidFormat { .. })
    ));
}

#[test]
fn load_rejects_duplicate_variant_value() {
    let err = load_schema(
        r#"
struct M { t: u8 discriminator; }
struct A : M = 1 {}
struct B : M = 1 {}
"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ParseError::Definition(DefinitionError::DuplicateVariant { value: 1, .. })
    ));
}

#[test]
fn load_rejects_second_discriminator_and_non_int() {
    let err = load_schema("struct M { a: u8 discriminator; b: u8 discriminator; }").unwrap_err();
    assert!(matches!(
        err,
        ParseError::Definition(DefinitionError::MultipleDiscriminators(_))
    ));
    let err = load_schema("struct M { a: str(2) discriminator; }").unwrap_err();
    assert!(matches!(
        err,
        ParseError::Definition(DefinitionError::InvalidDiscriminator { .. })
    ));
}

#[test]
fn load_nested_unions() {
    // A variant may itself be a union base with its own discriminator.
    let schema = load_schema(
        r#"
struct Msg { kind: u8 discriminator; }
struct Cfg : Msg = 4 { sub: u8 discriminator; }
struct CfgWifi : Cfg = 1 { channel: u8; }
struct CfgRadio : Cfg = 2 { power: i8; gain: u16; }
"#,
    )
    .expect("load");
    assert_eq!(schema.discriminator_value("CfgRadio", "kind"), Some(4));
    assert_eq!(schema.discriminator_value("CfgRadio", "sub"), Some(2));
    // sub(1) + max(CfgWifi 1, CfgRadio 3)
    assert_eq!(schema.own_minimum_size("Cfg"), Some(4));
    assert_eq!(schema.minimum_size("Msg"), Some(5));

    let err = load_schema(
        r#"
struct Msg { kind: u8 discriminator; }
struct Cfg : Msg = 4 { v: u8; }
struct Deeper : Cfg = 5 {}
"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ParseError::Definition(DefinitionError::VariantAlreadyResolved { .. })
    ));
}

#[test]
fn load_schema_file_from_disk() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "struct M {{ t: u8 discriminator; }}").unwrap();
    writeln!(file, "struct P : M = 2 {{ seq: u16; }}").unwrap();
    let schema = load_schema_file(file.path()).expect("load");
    assert_eq!(schema.variant_for("M", 2).map(|t| t.name()), Some("P"));

    let missing = file.path().with_extension("missing");
    assert!(matches!(load_schema_file(missing), Err(ParseError::Io(_))));
}
