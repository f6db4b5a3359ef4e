//! C declaration generator tests: exact output for structs, unions, embedding and headers.

use meshstruct::cgen::{struct_name, generate_c_union_declaration};
use meshstruct::{generate_c_declaration, generate_c_header, load_schema, DefinitionError, Schema};

const MESH: &str = r#"
/// Mesh message header.
struct MeshMessage {
    /// destination address
    dst: hex(6, ":");
    msg_type: u8 discriminator;
}

struct Ping : MeshMessage = 0x02 as MESH_PING {}

struct EchoRequest : MeshMessage = 0x03 {
    content: varstr;
}

struct SignIn : MeshMessage = 0x04 as MESH_SIGNIN {
    nodeName: str(8);
    rssi: i8 c_name("rssi_dbm");
}

struct Position {
    x: i16;
    y: i16;
}

struct Locate {
    pos: Position embed;
    ttl: u8;
}

/// Position report.
struct Track {
    pos: Position;
    peers: array<u16, u16>;
}
"#;

fn schema() -> Schema {
    load_schema(MESH).expect("schema")
}

#[test]
fn test_union_base_declaration() {
    let expected = "\
/** Mesh message header. */
typedef struct __packed {
    uint8_t dst[6]; /** destination address */
    uint8_t msg_type;
    union __packed {
        struct __packed {
            uint8_t content_num;
            char content[0];
        } echo_request;
        struct __packed {
            char node_name[8];
            int8_t rssi_dbm;
        } mesh_signin;
        uint8_t bytes[9];
    };
} mesh_message_t;";
    assert_eq!(generate_c_declaration(&schema(), "MeshMessage", None).unwrap(), expected);
}

#[test]
fn test_variant_declaration_keeps_full_layout() {
    let expected = "\
typedef struct __packed {
    uint8_t dst[6]; /** destination address */
    uint8_t msg_type;
    char node_name[8];
    int8_t rssi_dbm;
} sign_in_t;";
    assert_eq!(generate_c_declaration(&schema(), "SignIn", None).unwrap(), expected);
}

#[test]
fn test_union_only_declaration() {
    let decl = generate_c_union_declaration(&schema(), "MeshMessage", Some("mesh_payload_t")).unwrap();
    assert!(decl.starts_with("/** Mesh message header. */\ntypedef union __packed {\n    struct __packed {\n"));
    assert!(decl.contains("    } mesh_signin;\n    uint8_t bytes[9];\n} mesh_payload_t;"));
    assert!(!decl.contains("msg_type"));

    let err = generate_c_union_declaration(&schema(), "Position", None).unwrap_err();
    assert_eq!(err, DefinitionError::NotAUnion("Position".to_string()));
}

#[test]
fn test_embedded_and_nested_structs() {
    let s = schema();
    assert_eq!(
        generate_c_declaration(&s, "Locate", None).unwrap(),
        "typedef struct __packed {\n    int16_t x;\n    int16_t y;\n    uint8_t ttl;\n} locate_t;"
    );
    assert_eq!(
        generate_c_declaration(&s, "Track", Some("track_report_t")).unwrap(),
        "\
/** Position report. */
typedef struct __packed {
    struct __packed {
        int16_t x;
        int16_t y;
    } pos;
    uint16_t peers_num;
    uint16_t peers[0];
} track_report_t;"
    );
}

#[test]
fn test_union_reserve_matches_largest_variant() {
    let s = schema();
    let largest = s
        .variants("MeshMessage")
        .iter()
        .filter_map(|(_, v)| s.own_minimum_size(v))
        .max()
        .unwrap();
    let decl = generate_c_declaration(&s, "MeshMessage", None).unwrap();
    assert!(decl.contains(&format!("uint8_t bytes[{}];", largest)));
    assert_eq!(s.minimum_size("MeshMessage"), Some(6 + 1 + largest));
}

#[test]
fn test_variable_members_get_their_own_length() {
    let s = load_schema(
        r#"
struct Echo {
    content: varstr;
    values: array<u16> c_name("vals");
}
"#,
    )
    .unwrap();
    assert_eq!(
        generate_c_declaration(&s, "Echo", None).unwrap(),
        "\
typedef struct __packed {
    uint8_t content_num;
    char content[0];
    uint8_t vals_num;
    uint16_t vals[0];
} echo_t;"
    );
}

#[test]
fn test_union_inside_union() {
    let s = load_schema(
        r#"
struct Msg { kind: u8 discriminator; }
struct Cfg : Msg = 4 { sub: u8 discriminator; }
struct CfgWifi : Cfg = 1 { channel: u8; }
struct CfgRadio : Cfg = 2 { power: i8; gain: u16; }
"#,
    )
    .unwrap();
    let expected = "\
typedef struct __packed {
    uint8_t kind;
    union __packed {
        struct __packed {
            uint8_t sub;
            union __packed {
                struct __packed {
                    uint8_t channel;
                } cfg_wifi;
                struct __packed {
                    int8_t power;
                    uint16_t gain;
                } cfg_radio;
                uint8_t bytes[3];
            };
        } cfg;
        uint8_t bytes[4];
    };
} msg_t;";
    assert_eq!(generate_c_declaration(&s, "Msg", None).unwrap(), expected);
    assert_eq!(s.minimum_size("Msg"), Some(5));
}

#[test]
fn test_header() {
    let header = generate_c_header(&schema(), "MESH_H").unwrap();
    assert!(header.contains("#ifndef MESH_H\n#define MESH_H\n"));
    assert!(header.contains("#include <stdint.h>"));
    assert!(header.contains("#define __packed __attribute__((packed))"));
    assert!(header.contains("} ping_t;"));
    assert!(header.ends_with("#endif /* MESH_H */\n"));
    let mesh = header.find("} mesh_message_t;").unwrap();
    let track = header.find("} track_t;").unwrap();
    assert!(mesh < track);
}

#[test]
fn test_names() {
    assert_eq!(struct_name("MeshMessage"), "mesh_message_t");
    assert_eq!(struct_name("MESH_PING"), "mesh_ping_t");
    assert!(matches!(
        generate_c_declaration(&schema(), "Nope", None),
        Err(DefinitionError::UnknownStruct(_))
    ));
}
