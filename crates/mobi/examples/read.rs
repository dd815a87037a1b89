use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;
use mobi::MOBIFile;

/// Decode a MOBI file and print its headers or text.
#[derive(Parser, Debug)]
struct Args {
    /// Path to the .mobi/.prc file
    path: PathBuf,

    /// Print the decoded headers instead of the book text
    #[arg(long)]
    headers: bool,

    /// Write every decoded record to this directory
    #[arg(long)]
    dump: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut file = File::open(&args.path)
        .with_context(|| format!("failed to open {}", args.path.display()))?;
    let mobi = MOBIFile::from_reader(&mut file)?;
    info!(
        "{}: {} records, content {:?}",
        args.path.display(),
        mobi.records.len(),
        mobi.content_range()
    );

    if let Some(dir) = &args.dump {
        std::fs::create_dir_all(dir)?;
        for record in &mobi.records {
            let bytes = mobi.record(record.index).unwrap_or_default();
            File::create(dir.join(format!("record_{}.bin", record.index)))?.write_all(bytes)?;
        }
    }

    if args.headers {
        println!("{:#?}", mobi.pdb);
        println!("{:#?}", mobi.palmdoc_header);
        println!("{:#?}", mobi.header);
        if let Some(exth) = &mobi.exth {
            println!("{:#?}", exth);
        }
        println!("title: {}", mobi.title()?);
        if let Some(author) = mobi.author() {
            println!("author: {author}");
        }
    } else {
        println!("{}", mobi.text());
    }

    Ok(())
}
