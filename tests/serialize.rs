mod test_utils;

use test_utils::*;

#[test]
fn test_result_serializes_to_plain_data() {
    let data = simple_seal()
        .record(0x40, b"ABC")
        .record(0x4B, &[0x01])
        .record(0x70, &[0xAB])
        .signature(&[0xCA, 0xFE])
        .build();
    let result = decode_ok(&data);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!("ES", json["header"]["issuing_country"]);
    assert_eq!("ABC", json["payload"]["document_number"]);
    assert_eq!(true, json["payload"]["is_adult"]);
    assert_eq!("AB", json["payload"]["unknown"][0]["hex"]);

    let text = serde_json::to_string(&result).unwrap();
    let restored: DecodeResult = serde_json::from_str(&text).unwrap();
    assert_eq!(result, restored);
}

#[test]
fn test_config_from_partial_document() {
    let config: DecoderConfig = serde_json::from_str(r#"{ "require_magic": true }"#).unwrap();
    assert!(config.require_magic);
    assert_eq!(0xDC, config.expected_magic);
    assert_eq!(0xFF, config.signature_tag);
    assert!(config.collect_diagnostics);
}
