//! 序列批处理命令行.
//!
//! ```text
//! classify-series --series-dirs data/s1 data/s2 --csv-file out.csv
//! classify-series --series-paths-file series.txt -q
//! ```

use clap::Parser;

mod cli;
mod runner;

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    utils::init_logging(args.quiet)?;

    let summary = runner::run(&args)?;
    println!("{}", summary.to_json()?);
    Ok(())
}
