mod helpers;

use helpers::{convert_chunks, convert_with_memory};
use newline_stream::{boundary::NewlineCounts, ConvertFlags, NewlineType};
use proptest::{
    arbitrary::any,
    collection::vec,
    prop_assert_eq, prop_oneof, proptest,
    sample::select,
    strategy::{Just, Strategy},
    test_runner::Config,
};

// Inputs dense in CR and LF, so that splits regularly land inside a CR LF pair.
fn newline_heavy() -> impl Strategy<Value = Vec<u8>> {
    vec(
        prop_oneof![
            2 => Just(b'\r'),
            2 => Just(b'\n'),
            1 => any::<u8>(),
        ],
        0..256,
    )
}

fn target() -> impl Strategy<Value = NewlineType> {
    select(NewlineType::ALL.to_vec())
}

proptest! {
    #![proptest_config(Config::with_cases(5000))]

    #[test]
    fn split_anywhere_matches_single_pass(
        data in newline_heavy(),
        target in target(),
        split in any::<u16>(),
        memory in 2usize..8,
        flush in any::<bool>(),
    ) {
        let split = split as usize % (data.len() + 1);
        let (a, b) = data.split_at(split);
        let between = if flush { ConvertFlags::FLUSH } else { ConvertFlags::NONE };

        let expected = target.normalize(&data);
        prop_assert_eq!(convert_chunks(target, &[a, b], memory, between), expected.clone());
        prop_assert_eq!(convert_with_memory(target, &data, memory), expected);
    }

    #[test]
    fn many_splits_match_single_pass(
        data in newline_heavy(),
        target in target(),
        chunk in 1usize..5,
    ) {
        let chunks: Vec<&[u8]> = data.chunks(chunk).collect();
        let chunks = if chunks.is_empty() { vec![&data[..]] } else { chunks };
        prop_assert_eq!(
            convert_chunks(target, &chunks, 2, ConvertFlags::NONE),
            target.normalize(&data)
        );
    }

    #[test]
    fn idempotent(data in newline_heavy(), target in target()) {
        let once = target.normalize(&data);
        prop_assert_eq!(target.normalize(&once), once);
    }

    #[test]
    fn conversion_keeps_line_structure(
        data in newline_heavy(),
        first in target(),
        second in target(),
    ) {
        let via_first = second.normalize(&first.normalize(&data));
        prop_assert_eq!(via_first, second.normalize(&data));
        prop_assert_eq!(
            NewlineCounts::count(&first.normalize(&data)).total(),
            NewlineCounts::count(&data).total()
        );
    }

    #[test]
    fn output_uses_only_target(data in newline_heavy(), target in target()) {
        let counts = NewlineCounts::count(&target.normalize(&data));
        let of_target = match target {
            NewlineType::Cr => counts.cr,
            NewlineType::Lf => counts.lf,
            NewlineType::CrLf => counts.crlf,
        };
        prop_assert_eq!(of_target, counts.total());
    }

    #[test]
    fn uniform_input_is_unchanged(
        lines in vec(vec(any::<u8>().prop_filter("no newline", |b| *b != b'\r' && *b != b'\n'), 0..16), 0..16),
        target in target(),
    ) {
        let input = lines.join(target.as_bytes());
        prop_assert_eq!(target.normalize(&input), input);
    }
}
