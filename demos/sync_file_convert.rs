use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};

use newline_stream::{IoExt, NewlineType};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        eprintln!("Usage: {} <cr|lf|cr-lf> <input> <output>", args[0]);
        std::process::exit(1);
    }
    let target: NewlineType = args[1].parse()?;
    let input_path = &args[2];
    let output_path = &args[3];

    let infile = File::open(input_path)?;
    let mut reader = target.wrap_reader(infile);

    let outfile = File::create(output_path)?;
    let mut writer = BufWriter::new(outfile);

    std::io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    Ok(())
}
