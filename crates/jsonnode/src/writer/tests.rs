use std::io;

use rstest::rstest;

use super::*;
use crate::{codec::Decimal, reader::JsonNodeReader, tests::utils::options_with_window};

type Writer = JsonNodeWriter<Vec<u8>>;

fn written(build: impl FnOnce(&mut Writer) -> Result<(), WriterError>) -> String {
    let mut writer = JsonNodeWriter::new(Vec::new());
    build(&mut writer).unwrap();
    String::from_utf8(writer.close().unwrap()).unwrap()
}

fn failure(build: impl FnOnce(&mut Writer) -> Result<(), WriterError>) -> WriterError {
    let mut writer = JsonNodeWriter::new(Vec::new());
    let err = build(&mut writer).unwrap_err();
    assert!(matches!(writer.end_element(), Err(WriterError::Faulted)));
    err
}

fn element<W: io::Write>(
    w: &mut JsonNodeWriter<W>,
    name: &str,
    json_type: &str,
) -> Result<(), WriterError> {
    w.start_element(name)?;
    w.write_attribute("type", json_type)
}

#[test]
fn typed_object_with_string_member() {
    let json = written(|w| {
        element(w, "root", "object")?;
        element(w, "x", "string")?;
        w.write_string("hi")?;
        w.end_element()?;
        w.end_element()
    });
    assert_eq!(json, r#"{"x":"hi"}"#);
}

#[test]
fn types_are_inferred_from_content() {
    let json = written(|w| {
        w.start_element("root")?;
        w.start_element("x")?;
        w.write_string("hi")?;
        w.end_element()?;
        w.start_element("n")?;
        w.write_value(Value::Int32(-3))?;
        w.end_element()?;
        w.start_element("b")?;
        w.write_value(Value::Bool(false))?;
        w.end_element()?;
        w.start_element("z")?;
        w.write_value(Value::Null)?;
        w.end_element()?;
        w.start_element("e")?;
        w.end_element()?;
        w.end_element()
    });
    assert_eq!(json, r#"{"x":"hi","n":-3,"b":false,"z":null,"e":""}"#);
}

#[test]
fn arrays_of_primitives_and_objects() {
    let json = written(|w| {
        element(w, "root", "array")?;
        w.write_array("item", &[Value::Int64(1), Value::from("two"), Value::Float64(2.5)])?;
        element(w, "item", "object")?;
        element(w, "k", "null")?;
        w.end_element()?;
        w.end_element()?;
        element(w, "item", "array")?;
        w.end_element()?;
        element(w, "item", "object")?;
        w.end_element()?;
        w.end_element()
    });
    assert_eq!(json, r#"[1,"two",2.5,{"k":null},[],{}]"#);
}

#[test]
fn server_type_is_the_first_member() {
    let json = written(|w| {
        w.start_element("root")?;
        w.write_attribute("__type", "Point:#Geometry")?;
        element(w, "x", "number")?;
        w.write_string("1")?;
        w.end_element()?;
        w.end_element()
    });
    assert_eq!(json, r#"{"__type":"Point:#Geometry","x":1}"#);

    let json = written(|w| {
        w.start_element("root")?;
        w.write_attribute("__type", "T")?;
        w.end_element()
    });
    assert_eq!(json, r#"{"__type":"T"}"#);
}

#[test]
fn item_attribute_names_object_members() {
    let json = written(|w| {
        element(w, "root", "object")?;
        w.start_element("item")?;
        w.write_attribute("item", "a \"key\"")?;
        w.write_value(Value::Bool(true))?;
        w.end_element()?;
        w.end_element()
    });
    assert_eq!(json, r#"{"a \"key\"":true}"#);
}

#[rstest]
#[case(true, r#""a\/b\"c\\\u0001\u000a\uffff""#)]
#[case(false, r#""a/b\"c\\\u0001\u000a\uffff""#)]
fn string_escaping(#[case] escape_solidus: bool, #[case] expected: &str) {
    let options = WriterOptions {
        escape_solidus,
        ..Default::default()
    };
    let mut w = JsonNodeWriter::with_options(Vec::new(), options);
    w.start_element("root").unwrap();
    w.write_string("a/b\"c\\\u{1}\n\u{ffff}").unwrap();
    w.end_element().unwrap();
    assert_eq!(String::from_utf8(w.close().unwrap()).unwrap(), expected);
}

#[test]
fn utf16_values_keep_unpaired_surrogates() {
    let json = written(|w| {
        w.start_element("root")?;
        w.write_value(Value::Utf16(&[0x61, 0xDC00, 0x62]))?;
        w.end_element()
    });
    assert_eq!(json, r#""a\udc00b""#);
}

#[test]
fn non_finite_floats_are_strings() {
    let json = written(|w| {
        element(w, "root", "array")?;
        w.write_array(
            "item",
            &[Value::Float64(f64::NAN), Value::Float32(f32::INFINITY), Value::Float64(-0.0)],
        )?;
        w.end_element()
    });
    assert_eq!(json, r#"["NaN","INF",-0]"#);
}

#[test]
fn base64_spans_calls() {
    let json = written(|w| {
        w.start_element("root")?;
        w.write_base64(&[1])?;
        w.write_base64(&[2, 3, 4])?;
        w.write_base64(&[])?;
        w.write_base64(&[0xFB, 0xFF])?;
        w.end_element()
    });
    assert_eq!(json, r#""AQIDBPv\/""#);
}

#[test]
fn typed_values_as_text() {
    let json = written(|w| {
        element(w, "root", "array")?;
        w.write_array(
            "item",
            &[
                Value::Decimal(Decimal::from_parts(1250, 2, true).unwrap()),
                Value::UInt64(u64::MAX),
                Value::Char('/'),
                Value::Guid(uuid::Uuid::nil()),
            ],
        )?;
        w.end_element()
    });
    assert_eq!(
        json,
        r#"[-12.50,18446744073709551615,"\/","00000000-0000-0000-0000-000000000000"]"#
    );
}

#[test]
fn number_and_boolean_text_is_validated() {
    let json = written(|w| {
        element(w, "root", "array")?;
        element(w, "item", "number")?;
        w.write_string(" 1")?;
        w.write_string("2e3 ")?;
        w.end_element()?;
        element(w, "item", "boolean")?;
        w.write_string("true")?;
        w.end_element()?;
        w.end_element()
    });
    assert_eq!(json, "[12e3,true]");
}

#[test]
fn whitespace_in_containers_is_dropped() {
    let json = written(|w| {
        w.write_string("\n")?;
        element(w, "root", "object")?;
        w.write_string("\n  ")?;
        element(w, "a", "array")?;
        w.write_string(" ")?;
        w.end_element()?;
        w.end_element()
    });
    assert_eq!(json, r#"{"a":[]}"#);
}

#[rstest]
#[case::root_name(|w: &mut Writer| w.start_element("x"))]
#[case::second_root(|w: &mut Writer| { w.start_element("root")?; w.end_element()?; w.start_element("root") })]
#[case::end_without_start(|w: &mut Writer| w.end_element())]
#[case::unknown_attribute(|w: &mut Writer| { w.start_element("root")?; w.write_attribute("xmlns", "x") })]
#[case::duplicate_attribute(|w: &mut Writer| { element(w, "root", "object")?; w.write_attribute("type", "array") })]
#[case::invalid_type(|w: &mut Writer| element(w, "root", "integer"))]
#[case::attribute_after_content(|w: &mut Writer| { w.start_element("root")?; w.write_string("x")?; w.write_attribute("type", "string") })]
#[case::text_in_object(|w: &mut Writer| { element(w, "root", "object")?; w.write_string("x") })]
#[case::element_in_string(|w: &mut Writer| { element(w, "root", "string")?; w.start_element("a") })]
#[case::array_item_name(|w: &mut Writer| { element(w, "root", "array")?; w.start_element("a") })]
#[case::invalid_number(|w: &mut Writer| { element(w, "root", "number")?; w.write_string("1.")?; w.end_element() })]
#[case::invalid_boolean(|w: &mut Writer| { element(w, "root", "boolean")?; w.write_string("yes")?; w.end_element() })]
#[case::content_in_null(|w: &mut Writer| { element(w, "root", "null")?; w.write_string("x") })]
#[case::server_type_on_array(|w: &mut Writer| { element(w, "root", "array")?; w.write_attribute("__type", "T")?; w.end_element() })]
#[case::text_outside_root(|w: &mut Writer| w.write_string("x"))]
#[case::non_finite_number(|w: &mut Writer| { element(w, "root", "number")?; w.write_value(Value::Float64(f64::NAN))?; w.end_element() })]
fn protocol_violations(#[case] build: fn(&mut Writer) -> Result<(), WriterError>) {
    let err = failure(build);
    let expected = match err {
        WriterError::InvalidRootElementName(_)
        | WriterError::MultipleRootElements
        | WriterError::EndElementNoOpenNodes
        | WriterError::UnknownAttribute(_)
        | WriterError::DuplicateAttribute(_)
        | WriterError::InvalidTypeAttribute(_)
        | WriterError::AttributeAfterContent(_)
        | WriterError::TextNotAllowed(_)
        | WriterError::ElementNotAllowed(_)
        | WriterError::InvalidArrayItemName(_)
        | WriterError::InvalidNumber(_)
        | WriterError::InvalidBoolean(_)
        | WriterError::ContentInNullElement
        | WriterError::ServerTypeNotAllowed(_)
        | WriterError::TextOutsideElement => true,
        _ => false,
    };
    assert!(expected, "unexpected error {err:?}");
}

#[test]
fn violations_report_their_kind() {
    assert!(matches!(
        failure(|w| w.start_element("x")),
        WriterError::InvalidRootElementName(name) if name == "x"
    ));
    assert!(matches!(
        failure(|w| {
            element(w, "root", "object")?;
            w.write_string("x")
        }),
        WriterError::TextNotAllowed(JsonType::Object)
    ));
    assert!(matches!(
        failure(|w| {
            element(w, "root", "number")?;
            w.start_element("a")
        }),
        WriterError::ElementNotAllowed(JsonType::Number)
    ));
    assert!(matches!(
        failure(|w| {
            element(w, "root", "array")?;
            w.write_attribute("__type", "T")?;
            w.end_element()
        }),
        WriterError::ServerTypeNotAllowed(JsonType::Array)
    ));
}

#[test]
fn close_requires_balanced_elements() {
    let mut w = JsonNodeWriter::new(Vec::new());
    w.start_element("root").unwrap();
    w.start_element("a").unwrap();
    assert!(matches!(w.close(), Err(WriterError::UnclosedElements(2))));

    let mut w = JsonNodeWriter::new(Vec::new());
    element(&mut w, "root", "null").unwrap();
    w.end_element().unwrap();
    assert_eq!(w.close().unwrap(), b"null");
    assert!(matches!(w.close(), Err(WriterError::WriterClosed)));
    assert!(matches!(w.start_element("root"), Err(WriterError::WriterClosed)));
}

#[test]
fn reset_starts_a_new_document() {
    let mut w = JsonNodeWriter::new(Vec::new());
    assert!(w.start_element("nope").is_err());
    w.reset(Vec::new());
    w.start_element("root").unwrap();
    w.write_value(Value::Int8(7)).unwrap();
    w.end_element().unwrap();
    assert_eq!(w.close().unwrap(), b"7");
}

#[test]
fn small_buffers_stream_to_the_sink() {
    struct Counting<'a>(&'a mut Vec<usize>, Vec<u8>);
    impl io::Write for Counting<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.push(buf.len());
            self.1.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let mut writes = Vec::new();
    let options = WriterOptions {
        buffer_capacity: 4,
        ..Default::default()
    };
    let mut w = JsonNodeWriter::with_options(Counting(&mut writes, Vec::new()), options);
    element(&mut w, "root", "array").unwrap();
    w.write_array("item", &[Value::Int32(10), Value::Int32(20), Value::Int32(30)])
        .unwrap();
    w.end_element().unwrap();
    let sink = w.close().unwrap();
    assert_eq!(sink.1, b"[10,20,30]");
    assert!(writes.len() > 1);
}

#[test]
fn sink_errors_fault_the_writer() {
    struct Broken;
    impl io::Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let mut w = JsonNodeWriter::new(Broken);
    w.start_element("root").unwrap();
    w.end_element().unwrap();
    assert!(matches!(w.close(), Err(WriterError::Io(_))));
    assert!(matches!(w.flush(), Err(WriterError::Faulted)));
}

#[rstest]
#[case(r#"{"a":[1,{"b":null}],"c":"x","d":{},"e":[]}"#)]
#[case(r#"{"__type":"T","n":-0.5e-3}"#)]
#[case(r#"[true,false,"",[[]]]"#)]
#[case("\"text\"")]
fn write_node_copies_documents(#[case] input: &str) {
    let mut reader = JsonNodeReader::new(input.as_bytes());
    let mut w = JsonNodeWriter::new(Vec::new());
    w.write_node(&mut reader).unwrap();
    assert_eq!(reader.read_state(), crate::ReadState::EndOfFile);
    assert_eq!(String::from_utf8(w.close().unwrap()).unwrap(), input);
}

#[test]
fn write_node_copies_complex_text() {
    let text = "0123456789".repeat(10);
    let input = format!("[\"{text}\",{}]", "9".repeat(40));
    let mut reader = JsonNodeReader::with_options(input.as_bytes(), options_with_window(16));
    let mut w = JsonNodeWriter::new(Vec::new());
    w.write_node(&mut reader).unwrap();
    assert_eq!(String::from_utf8(w.close().unwrap()).unwrap(), input);
}

#[test]
fn write_node_copies_one_subtree() {
    let mut reader = JsonNodeReader::new(&br#"{"a":{"x":[1]},"b":2}"#[..]);
    reader.read_next().unwrap();
    reader.read_next().unwrap();
    let mut w = JsonNodeWriter::new(Vec::new());
    w.start_element("root").unwrap();
    w.write_node(&mut reader).unwrap();
    assert_eq!(reader.local_name(), "b");
    w.end_element().unwrap();
    assert_eq!(w.close().unwrap(), br#"{"a":{"x":[1]}}"#);
}

#[test]
fn reader_errors_do_not_fault_the_writer() {
    let mut reader = JsonNodeReader::new(&b"[1,]"[..]);
    let mut w = JsonNodeWriter::new(Vec::new());
    assert!(matches!(w.write_node(&mut reader), Err(WriterError::Reader(_))));
    assert_eq!(w.depth(), 1);
    w.end_element().unwrap();
    assert_eq!(w.close().unwrap(), b"[1]");
}
