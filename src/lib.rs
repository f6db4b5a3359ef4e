//! # meshstruct: packed struct/union codec for mesh messages
//!
//! Declarative definitions of packed binary messages, shared between a host
//! tool and C firmware. One schema drives four things:
//!
//! - binary encode/decode with no padding, inherited fields first;
//! - discriminated unions: a base type flags one integer field as the
//!   discriminator and each extending type registers a value for it;
//! - a JSON bridge (`Codec::to_json` / `Codec::from_json`);
//! - packed C `typedef struct` / `union` declarations with the same layout.
//!
//! ## Formats
//!
//! - Integers `u8`..`i64` and fixed arrays `T[n]`
//! - `bool` (one byte), `str(n)` (zero padded), `hex(n[, "sep"])` (raw bytes as hex text)
//! - `array<T[, len]>` and `varstr[<len>]`: unsigned length prefix (default `u8`) then elements
//!
//! ## Example DSL
//!
//! ```text
//! struct MeshMessage {
//!   dst: hex(6, ":");
//!   msg_type: u8 discriminator;
//! }
//!
//! struct Echo : MeshMessage = 0x03 {
//!   content: varstr;
//! }
//! ```
//!
//! ## Usage
//!
//! ```
//! use meshstruct::{load_schema, Codec, Endianness, Instance};
//!
//! let schema = load_schema(
//!     "struct Msg { kind: u8 discriminator; }
//!      struct Ping : Msg = 2 { seq: u16; }",
//! )
//! .unwrap();
//! let codec = Codec::new(schema, Endianness::Little);
//! let ping = Instance::new("Ping").with("seq", meshstruct::Value::U16(7));
//! let bytes = codec.encode("Msg", &ping).unwrap();
//! assert_eq!(bytes, [0x02, 0x07, 0x00]);
//! let (decoded, rest) = codec.decode("Msg", &bytes).unwrap();
//! assert_eq!(decoded, ping);
//! assert!(rest.is_empty());
//! ```

pub mod ast;
pub mod cgen;
pub mod codec;
pub mod error;
pub mod format;
pub mod json;
pub mod parser;
pub mod schema;
pub mod value;

pub use ast::SchemaSource;
pub use cgen::{generate_c_declaration, generate_c_header, generate_c_union_declaration, normalize_name};
pub use codec::{Codec, Endianness};
pub use error::{DecodingError, DefinitionError, EncodingError, ValueError};
pub use format::{Format, IntType};
pub use parser::{load_schema, load_schema_file, parse, ParseError};
pub use schema::{FieldBinding, FieldDecl, FieldSpec, Schema, StructBuilder, StructType};
pub use value::{Instance, Value};
