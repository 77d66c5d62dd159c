use rstest::rstest;

use super::utils::{read_to_end, transcode_with};

/// Well-formed documents, each transcoded whole and through a 32 byte window
/// fed in small reads.
#[rstest]
#[case::empty_array("[]")]
#[case::empty_object("{}")]
#[case::nested_empty("[[],{},[{}]]")]
#[case::whitespace_everywhere(" \t\r\n[ \t\r\n1 \t\r\n, \t\r\n{ \"a\" : 2 } ] \t\r\n")]
#[case::integers("[0,-0,1,-1,9223372036854775807,-9223372036854775808,18446744073709551616]")]
#[case::fractions("[0.5,-0.0,1.25e-7,1E300,2e+3,123.456e-78]")]
#[case::literals("[true,false,null]")]
#[case::escapes(r#"["\"\\\/\b\f\n\r\t","\u0041\u00e9\u20ac","\ud83d\ude00"]"#)]
#[case::raw_unicode("[\"\u{e9}\u{20ac}\u{1F600}\u{ffff}\"]")]
#[case::duplicate_keys(r#"{"a":1,"a":2}"#)]
#[case::empty_key(r#"{"":""}"#)]
#[case::server_type(r#"{"__type":"Shape:#Drawing","sides":3}"#)]
#[case::server_type_not_first(r#"{"sides":3,"__type":"Shape"}"#)]
#[case::server_type_not_string(r#"{"__type":3}"#)]
#[case::scalar_root("\"lonely\"")]
#[case::number_root("-12.5e3")]
#[case::literal_root(" null ")]
#[case::long_string(r#"["0123456789abcdefghijklmnopqrstuvwxyz0123456789"]"#)]
#[case::long_number("[1234567890123456789012345678901234567890.5]")]
fn good_documents(#[case] input: &str) {
    read_to_end(input.as_bytes()).unwrap();

    let expected: serde_json::Value = serde_json::from_str(input).unwrap();
    for (window, chunk) in [(4096, 4096), (32, 1), (32, 7)] {
        let output = transcode_with(input.as_bytes(), window, chunk).unwrap();
        let actual: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(actual, expected, "window {window}, chunk {chunk}");
    }
}
