#![cfg(any(feature = "futures-io", feature = "tokio"))]

macro_rules! dual_test {
    ($name:ident, $body:block) => {
        mod $name {
            use newline_stream::NewlineType;

            #[cfg(feature = "futures-io")]
            #[async_std::test]
            async fn futures_io() {
                use futures_util::AsyncWriteExt;
                use newline_stream::FuturesIoExt;

                $body
            }

            #[cfg(feature = "tokio")]
            #[tokio::test]
            async fn tokio() {
                use newline_stream::TokioExt;
                use tokio::io::AsyncWriteExt;

                $body
            }
        }
    };
}

dual_test!(crlf_split_across_chunks, {
    for target in NewlineType::ALL {
        let mut writer = target.wrap_async_writer_with_buffer_size(Vec::new(), 4);
        writer.write_all(b"foo\r").await.unwrap();
        writer.write_all(b"\nbar").await.unwrap();
        let out = writer.finish().await.unwrap();
        assert_eq!(out, target.normalize(b"foo\r\nbar"));
    }
});

dual_test!(crlf_split_by_flush, {
    let mut writer = NewlineType::CrLf.wrap_async_writer_with_buffer_size(Vec::new(), 4);
    writer.write_all(b"foo\r").await.unwrap();
    writer.flush().await.unwrap();
    writer.write_all(b"\nbar").await.unwrap();
    let out = writer.finish().await.unwrap();
    assert_eq!(out, b"foo\r\nbar".to_vec());
});

dual_test!(lone_lf_in_first_chunk_converted_to_crlf, {
    let mut writer = NewlineType::CrLf.wrap_async_writer_with_buffer_size(Vec::new(), 5);
    writer.write_all(b"line1\n").await.unwrap();
    writer.write_all(b"line2").await.unwrap();
    let out = writer.finish().await.unwrap();
    assert_eq!(out, b"line1\r\nline2".to_vec());
});

dual_test!(multiple_crs_and_crlf_mixed_across_boundaries, {
    let mut writer = NewlineType::Lf.wrap_async_writer_with_buffer_size(Vec::new(), 1);
    writer.write_all(b"\r").await.unwrap();
    writer.write_all(b"\r\n").await.unwrap();
    let out = writer.finish().await.unwrap();
    assert_eq!(out, b"\n\n".to_vec());
});

dual_test!(trailing_cr_is_converted_on_finish, {
    let mut writer = NewlineType::CrLf.wrap_async_writer_with_buffer_size(Vec::new(), 8);
    writer.write_all(b"a\nb\r").await.unwrap();
    let out = writer.finish().await.unwrap();
    assert_eq!(out, b"a\r\nb\r\n".to_vec());
});

dual_test!(chunked_writes_for_every_buffer_size, {
    let chunks: [&[u8]; 5] = [b"hel", b"lo\n\r", b"\r", b"\nx", b"\r"];
    for target in NewlineType::ALL {
        let expected = target.normalize(&chunks.concat());
        for buf_size in 2..=5 {
            let mut writer = target.wrap_async_writer_with_buffer_size(Vec::new(), buf_size);
            for chunk in chunks {
                writer.write_all(chunk).await.unwrap();
            }
            let out = writer.finish().await.unwrap();
            assert_eq!(out, expected, "{target} with buffer {buf_size}");
        }
    }
});

dual_test!(flush_after_every_chunk, {
    let chunks: [&[u8]; 4] = [b"a\r", b"\n", b"b\r", b"\rc"];
    let mut writer = NewlineType::CrLf.wrap_async_writer_with_buffer_size(Vec::new(), 2);
    for chunk in chunks {
        writer.write_all(chunk).await.unwrap();
        writer.flush().await.unwrap();
    }
    let out = writer.finish().await.unwrap();
    assert_eq!(out, b"a\r\nb\r\n\r\nc".to_vec());
});
