#![no_main]

use libfuzzer_sys::fuzz_target;
use newline_stream::{ConvertFlags, ConvertStatus, Error, NewlineConverter, NewlineType};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // Control bytes:
    // data[0] bits 0-1: target newline type
    // data[0] bit 2: flush between the two halves
    // data[1]: output buffer size and split point
    let target = NewlineType::ALL[usize::from(data[0] & 0x03) % 3];
    let flush = (data[0] & 0x04) != 0;
    let out_size = usize::from(data[1] & 0x0f);
    let payload = &data[2..];
    let split = usize::from(data[1] >> 4).min(payload.len());

    let mut converter = NewlineConverter::new(target);
    let mut out = vec![0u8; out_size];
    if out_size < 2 {
        assert_eq!(
            converter.convert(payload, &mut out, ConvertFlags::INPUT_AT_END),
            Err(Error::InsufficientOutputSpace { required: 2 })
        );
        return;
    }

    let between = if flush {
        ConvertFlags::FLUSH
    } else {
        ConvertFlags::NONE
    };
    let mut pending = payload[..split].to_vec();
    let mut output = Vec::new();
    for (chunk, flags) in [
        (&[][..], between),
        (&payload[split..], ConvertFlags::INPUT_AT_END),
    ] {
        pending.extend_from_slice(chunk);
        loop {
            match converter.convert(&pending, &mut out, flags) {
                Ok(result) => {
                    assert!(
                        result.bytes_read() > 0
                            || result.bytes_written() > 0
                            || result.status() != ConvertStatus::Converted
                    );
                    pending.drain(..result.bytes_read());
                    output.extend_from_slice(&out[..result.bytes_written()]);
                    if result.status() != ConvertStatus::Converted
                        || (!flags.input_at_end() && pending.is_empty())
                    {
                        break;
                    }
                }
                Err(Error::AmbiguousStreamState) if !flags.input_at_end() => break,
                Err(err) => panic!("unexpected error: {err}"),
            }
        }
    }

    assert!(pending.is_empty());
    assert_eq!(output, target.normalize(payload));
});
