//! Decoder fuzz target: feed arbitrary bytes to the union decoder.
//! Decoding must not panic; it returns an instance or a DecodingError.
//! Anything that decodes must re-encode within the bytes it consumed.
//! Build with: cargo fuzz run decode_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
const MESH: &str = r#"
struct Position { x: i16; y: i16; z: u8; }
struct MeshMessage {
    msg_type: u8 discriminator;
    dst: hex(6, ":");
}
struct Ping : MeshMessage = 0x02 { seq: u16; }
struct Echo : MeshMessage = 0x03 { content: varstr<u16>; }
struct Locate : MeshMessage = 0x10 { pos: Position; peers: array<u32>; }
struct Config : MeshMessage = 0x20 { sub: u8 discriminator; }
struct ConfigBoard : Config = 1 { board: str(8); led: bool; }
"#;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let schema = meshstruct::load_schema(MESH).expect("schema");
    let codec = meshstruct::Codec::new(schema, meshstruct::Endianness::Little);
    if let Ok((inst, rest)) = codec.decode("MeshMessage", data) {
        let consumed = data.len() - rest.len();
        let bytes = codec.encode("MeshMessage", &inst).expect("re-encode");
        // Variable strings drop trailing zero bytes on decode.
        assert!(bytes.len() <= consumed);
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run decode_fuzz");
}
