//! Parse schema DSL source into AST using PEST.

use crate::ast::*;
use crate::error::DefinitionError;
use crate::format::IntType;
use crate::schema::Schema;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser as PestParser;
use std::path::Path;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct SchemaParser;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Parse error: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),
    #[error("{0}")]
    Malformed(String),
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse schema source into AST.
pub fn parse(source: &str) -> Result<SchemaSource, ParseError> {
    let pairs = SchemaParser::parse(Rule::schema, source).map_err(Box::new)?;
    let pair = pairs
        .into_iter()
        .next()
        .ok_or_else(|| ParseError::Malformed("empty parse".to_string()))?;
    build_schema(pair)
}

/// Parse and define every struct in `source`.
pub fn load_schema(source: &str) -> Result<Schema, ParseError> {
    Ok(parse(source)?.into_schema()?)
}

pub fn load_schema_file(path: impl AsRef<Path>) -> Result<Schema, ParseError> {
    let source = std::fs::read_to_string(path)?;
    load_schema(&source)
}

fn build_schema(pair: Pair<Rule>) -> Result<SchemaSource, ParseError> {
    let mut structs = Vec::new();
    for inner in pair.into_inner() {
        if inner.as_rule() == Rule::struct_def {
            structs.push(build_struct(inner)?);
        }
    }
    Ok(SchemaSource { structs })
}

fn build_struct(pair: Pair<Rule>) -> Result<StructSection, ParseError> {
    let mut docs = Vec::new();
    let mut name = None;
    let mut base = None;
    let mut variant = None;
    let mut fields = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::doc_comment => docs.push(doc_text(inner)),
            Rule::ident => name = Some(inner.as_str().to_string()),
            Rule::extends_clause => {
                let mut it = inner.into_inner();
                base = it.next().map(|p| p.as_str().to_string());
                if let Some(v) = it.next() {
                    variant = Some(build_variant(v)?);
                }
            }
            Rule::field_def => fields.push(build_field(inner)?),
            _ => {}
        }
    }
    Ok(StructSection {
        name: name.ok_or_else(|| ParseError::Malformed("struct: missing name".to_string()))?,
        doc: join_docs(docs),
        base,
        variant,
        fields,
    })
}

fn build_variant(pair: Pair<Rule>) -> Result<VariantClause, ParseError> {
    let mut value = None;
    let mut label = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::int_lit => value = Some(parse_int(inner.as_str())?),
            Rule::ident => label = Some(inner.as_str().to_string()),
            _ => {}
        }
    }
    Ok(VariantClause {
        value: value.ok_or_else(|| ParseError::Malformed("variant: missing value".to_string()))?,
        label,
    })
}

fn build_field(pair: Pair<Rule>) -> Result<FieldSection, ParseError> {
    let mut docs = Vec::new();
    let mut name = None;
    let mut type_expr = None;
    let mut discriminator = false;
    let mut embed = false;
    let mut c_name = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::doc_comment => docs.push(doc_text(inner)),
            Rule::ident => name = Some(inner.as_str().to_string()),
            Rule::type_expr => type_expr = Some(build_type(inner)?),
            Rule::discriminator_attr => discriminator = true,
            Rule::embed_attr => embed = true,
            Rule::c_name_attr => c_name = inner.into_inner().next().map(string_value),
            _ => {}
        }
    }
    let name = name.ok_or_else(|| ParseError::Malformed("field: missing name".to_string()))?;
    let type_expr = type_expr.ok_or_else(|| ParseError::Malformed(format!("field {}: missing type", name)))?;
    Ok(FieldSection {
        name,
        doc: join_docs(docs),
        type_expr,
        discriminator,
        embed,
        c_name,
    })
}

fn build_type(pair: Pair<Rule>) -> Result<TypeExpr, ParseError> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| ParseError::Malformed("type: empty".to_string()))?;
    let rule = inner.as_rule();
    let text = inner.as_str().to_string();
    let mut parts = inner.into_inner().filter(|p| {
        !matches!(
            p.as_rule(),
            Rule::kw_array | Rule::kw_varstr | Rule::kw_str | Rule::kw_hex
        )
    });
    let malformed = || ParseError::Malformed(format!("type: malformed {:?}", text));
    Ok(match rule {
        Rule::int_type => TypeExpr::Int(parse_int_type(&text)?),
        Rule::bool_type => TypeExpr::Bool,
        Rule::struct_ref => TypeExpr::StructRef(text.trim().to_string()),
        Rule::fixed_array_type => {
            let ty = parse_int_type(parts.next().ok_or_else(malformed)?.as_str())?;
            let n = parse_int(parts.next().ok_or_else(malformed)?.as_str())?;
            TypeExpr::IntArray(ty, n)
        }
        Rule::fixed_str_type => TypeExpr::Str(parse_int(parts.next().ok_or_else(malformed)?.as_str())?),
        Rule::hex_type => {
            let n = parse_int(parts.next().ok_or_else(malformed)?.as_str())?;
            let sep = parts.next().map(string_value).unwrap_or_default();
            TypeExpr::Hex(n, sep)
        }
        Rule::var_array_type => {
            let child = build_type(parts.next().ok_or_else(malformed)?)?;
            let len = match parts.next() {
                Some(p) => parse_int_type(p.as_str())?,
                None => IntType::U8,
            };
            TypeExpr::VarArray(Box::new(child), len)
        }
        Rule::var_str_type => TypeExpr::VarStr(match parts.next() {
            Some(p) => parse_int_type(p.as_str())?,
            None => IntType::U8,
        }),
        other => return Err(ParseError::Malformed(format!("type: unexpected {:?}", other))),
    })
}

fn doc_text(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .next()
        .map(|p| p.as_str().trim().to_string())
        .unwrap_or_default()
}

fn join_docs(docs: Vec<String>) -> Option<String> {
    let docs: Vec<_> = docs.into_iter().filter(|d| !d.is_empty()).collect();
    if docs.is_empty() {
        None
    } else {
        Some(docs.join(" "))
    }
}

/// Contents of a `string_lit` pair, without the quotes.
fn string_value(pair: Pair<Rule>) -> String {
    pair.into_inner()
        .next()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default()
}

fn parse_int_type(s: &str) -> Result<IntType, ParseError> {
    IntType::from_name(s).ok_or_else(|| ParseError::Malformed(format!("unknown integer type: {}", s)))
}

fn parse_int(s: &str) -> Result<u64, ParseError> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|_| ParseError::Malformed(format!("integer literal out of range: {}", s)))
}
