use rstest::rstest;

use super::utils::transcode_with;
use crate::{ErrorSource, QuotaError, WriterError};

fn reader_error(input: &[u8], window: usize, chunk: usize) -> ErrorSource {
    match transcode_with(input, window, chunk) {
        Err(WriterError::Reader(e)) => e.into_source(),
        other => panic!("expected a reader error, got {other:?}"),
    }
}

/// Malformed documents fail the same way however the input arrives.
#[rstest]
#[case::trailing_comma(b"[1,2,]")]
#[case::trailing_member_comma(br#"{"a":[],}"#)]
#[case::missing_colon(br#"{"a" []}"#)]
#[case::missing_comma(br#"[{} {}]"#)]
#[case::unquoted_key(b"{a:1}")]
#[case::single_quotes(b"['x']")]
#[case::leading_zero(b"[007]")]
#[case::leading_plus(b"[+1]")]
#[case::bare_fraction(b"[.5]")]
#[case::dangling_exponent(b"[1e]")]
#[case::hex_number(b"[0x10]")]
#[case::capital_literal(b"[True]")]
#[case::nan_literal(b"[NaN]")]
#[case::unterminated_string(br#"["abc"#)]
#[case::unterminated_array(b"[[1]")]
#[case::unterminated_object(br#"{"a":{}"#)]
#[case::raw_tab(b"[\"a\tb\"]")]
#[case::bad_escape(br#"["\x41"]"#)]
#[case::short_unicode_escape(br#"["\u41"]"#)]
#[case::lone_low_surrogate(br#"["\udc00"]"#)]
#[case::unpaired_high_surrogate(br#"["\ud800x"]"#)]
#[case::overlong_utf8(b"[\"\xc0\xaf\"]")]
#[case::truncated_utf8(b"[\"\xe2\x82\"]")]
#[case::two_roots(b"{} []")]
#[case::comment(b"[1] // done")]
fn bad_documents(#[case] input: &[u8]) {
    for (window, chunk) in [(4096, 4096), (16, 1), (17, 5)] {
        let source = reader_error(input, window, chunk);
        assert!(
            matches!(source, ErrorSource::Syntax(_)),
            "window {window}, chunk {chunk}: {source:?}"
        );
    }
}

#[rstest]
#[case::deep_arrays(format!("{}{}", "[".repeat(40), "]".repeat(40)), 32)]
#[case::deep_objects(format!("{}1{}", r#"{"a":"#.repeat(33), "}".repeat(33)), 32)]
fn documents_over_the_depth_quota(#[case] input: String, #[case] max_depth: usize) {
    let source = reader_error(input.as_bytes(), 4096, 7);
    assert!(matches!(source, ErrorSource::Quota(QuotaError::MaxDepthExceeded(d)) if d == max_depth));
}
