use quickcheck::{Arbitrary, Gen};
use serde_json::{Map, Number, Value};

/// Characters that exercise escaping and multi-byte sequences.
const ALPHABET: &[char] = &[
    'a', 'b', 'z', '0', ' ', '"', '\\', '/', '\n', '\t', '\u{1}', '\u{e9}', '\u{20ac}', '\u{ffff}',
    '\u{1F600}',
];

/// Keys stay short so that they always fit a 32 byte window once escaped.
const MAX_KEY_CHARS: usize = 4;

fn text(g: &mut Gen, max_chars: usize) -> String {
    let len = usize::arbitrary(g) % (max_chars + 1);
    (0..len).map(|_| *g.choose(ALPHABET).unwrap_or(&'a')).collect()
}

fn number(g: &mut Gen) -> Value {
    match u8::arbitrary(g) % 3 {
        0 => Value::from(i64::arbitrary(g)),
        1 => Value::from(u64::arbitrary(g)),
        _ => {
            let mut f = f64::arbitrary(g);
            while !f.is_finite() {
                f = f64::arbitrary(g);
            }
            Number::from_f64(f).map_or(Value::Null, Value::Number)
        }
    }
}

fn value(g: &mut Gen, depth: usize) -> Value {
    let choices = if depth == 0 { 4 } else { 6 };
    match usize::arbitrary(g) % choices {
        0 => Value::Null,
        1 => Value::Bool(bool::arbitrary(g)),
        2 => number(g),
        3 => Value::String(text(g, 40)),
        4 => {
            let len = usize::arbitrary(g) % 4;
            Value::Array((0..len).map(|_| value(g, depth - 1)).collect())
        }
        _ => {
            let len = usize::arbitrary(g) % 4;
            let mut map = Map::new();
            for _ in 0..len {
                map.insert(text(g, MAX_KEY_CHARS), value(g, depth - 1));
            }
            Value::Object(map)
        }
    }
}

/// A JSON document at most four containers deep.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Document(pub(crate) Value);

impl Arbitrary for Document {
    fn arbitrary(g: &mut Gen) -> Self {
        let depth = usize::arbitrary(g) % 5;
        Document(value(g, depth))
    }
}

/// How a document is fed to the reader.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Feed {
    pub(crate) max_bytes_per_read: usize,
    pub(crate) chunk: usize,
    pub(crate) pretty: bool,
}

impl Arbitrary for Feed {
    fn arbitrary(g: &mut Gen) -> Self {
        Feed {
            max_bytes_per_read: *g.choose(&[32, 33, 48, 64, 4096]).unwrap_or(&4096),
            chunk: 1 + usize::arbitrary(g) % 64,
            pretty: bool::arbitrary(g),
        }
    }
}
