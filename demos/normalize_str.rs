use newline_stream::{boundary::NewlineCounts, NewlineType};

fn main() {
    let text = "Line one\nLine two\rLine three\r\nLine four";
    println!("Before: {text:?}");
    println!("Counts: {:?}", NewlineCounts::count(text.as_bytes()));

    for target in NewlineType::ALL {
        println!("As {target}: {:?}", target.normalize_str(text));
    }
}
