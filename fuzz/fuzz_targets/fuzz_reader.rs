#![no_main]
use std::io::{self, Read};

use arbitrary::Arbitrary;
use jsonnode::{
    JsonNodeReader, JsonNodeWriter, MIN_BYTES_PER_READ, ReaderError, ReaderOptions, ReaderQuotas,
    WriterError, transcode,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    window: u8,
    chunk: u8,
    data: Vec<u8>,
}

/// Hands out at most `chunk` bytes per read.
struct Trickle<'a> {
    data: &'a [u8],
    chunk: usize,
}

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.chunk).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

fn options(window: usize) -> ReaderOptions {
    ReaderOptions {
        quotas: ReaderQuotas {
            max_bytes_per_read: window,
            ..ReaderQuotas::default()
        },
        ..ReaderOptions::default()
    }
}

fn read_all(data: &[u8], window: usize, chunk: usize) -> Result<(), ReaderError> {
    let mut reader = JsonNodeReader::with_options(Trickle { data, chunk }, options(window));
    loop {
        match reader.read_next() {
            Ok(true) => assert!(reader.scope_depth() >= reader.depth()),
            Ok(false) => return Ok(()),
            Err(e) => {
                assert!(reader.read_next().is_err(), "reader must stay faulted");
                return Err(e);
            }
        }
    }
}

fuzz_target!(|input: Input| {
    let window = MIN_BYTES_PER_READ + usize::from(input.window);
    let chunk = 1 + usize::from(input.chunk);
    let accepted = read_all(&input.data, window, chunk);

    // serde_json is stricter on number range, so only documents it accepts
    // are compared.
    let Ok(reference) = serde_json::from_slice::<serde_json::Value>(&input.data) else {
        return;
    };
    if let Err(e) = accepted {
        assert!(e.is_quota(), "rejected a valid document: {e}");
        return;
    }
    let mut reader =
        JsonNodeReader::with_options(Trickle { data: &input.data, chunk }, options(window));
    let mut writer = JsonNodeWriter::new(Vec::new());
    match transcode(&mut reader, &mut writer) {
        Ok(()) => {
            let output = writer.close().unwrap();
            let copied: serde_json::Value = serde_json::from_slice(&output).unwrap();
            assert_eq!(copied, reference);
        }
        Err(WriterError::Reader(e)) => panic!("second read disagrees with the first: {e}"),
        Err(e) => panic!("writer rejected reader output: {e}"),
    }
});
