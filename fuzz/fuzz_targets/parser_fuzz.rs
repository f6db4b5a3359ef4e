//! Schema fuzz target: arbitrary text goes through the loader, and every schema
//! that loads is pushed through sizing, C generation and a decode of the same bytes.
//! Build with: cargo fuzz run parser_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else { return };
    let Ok(schema) = meshstruct::load_schema(text) else { return };

    let names: Vec<String> = schema.struct_types().iter().map(|t| t.name().to_string()).collect();
    for name in &names {
        assert!(schema.minimum_size(name).is_some(), "{} has no size", name);
        meshstruct::generate_c_declaration(&schema, name, None).expect("declaration");
    }
    meshstruct::generate_c_header(&schema, "FUZZ_H").expect("header");

    let codec = meshstruct::Codec::new(schema, meshstruct::Endianness::Little);
    for name in &names {
        if let Ok((inst, rest)) = codec.decode(name, data) {
            let bytes = codec.encode(name, &inst).expect("decoded instance re-encodes");
            assert!(bytes.len() + rest.len() <= data.len());
        }
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run parser_fuzz");
}
