use newline_stream::{NewlineType, TokioExt};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufReader, BufWriter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 4 {
        eprintln!("Usage: {} <cr|lf|cr-lf> <input> <output>", args[0]);
        std::process::exit(1);
    }
    let target: NewlineType = args[1].parse()?;
    let input_path = &args[2];
    let output_path = &args[3];

    let infile = File::open(input_path).await?;
    let mut reader = BufReader::new(infile);

    let outfile = File::create(output_path).await?;
    let mut writer = target.wrap_async_writer(BufWriter::new(outfile));

    tokio::io::copy(&mut reader, &mut writer).await?;
    // Shutting down ends the converted stream, so a final CR is converted too.
    writer.shutdown().await?;
    Ok(())
}
