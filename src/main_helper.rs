//! CLI surface and the JSONL host loop for the `tokengate` binary.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;

use crate::filter::{FilterConfig, RecordFilter, TokenCountFilter};
use crate::location::Location;
use crate::record::Record;
use crate::types::{CostUsd, Result};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Counts sub-word tokens across dataset records, enforces an optional \
             cumulative token budget, and reports a derived price at end of stream."
)]
pub struct Args {
    /// Name of the encoding to use, e.g. cl100k_base, p50k_base, r50k_base.
    #[arg(short = 'e', long)]
    pub encoding: Option<String>,
    /// Name of the model to derive the encoding from, e.g. gpt-4.
    #[arg(short = 'm', long)]
    pub model: Option<String>,
    /// Prompt whose token count is added once per counted location hit.
    #[arg(short = 'p', long)]
    pub prompt: Option<String>,
    /// Price per 1000 tokens.
    #[arg(short = 't', long, value_name = "PRICE")]
    pub price_per_1k_tokens: Option<f64>,
    /// Cumulative token budget; <= 0 means unlimited.
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub max_tokens: i64,
    /// Location to count; repeat for several. Defaults to "any".
    #[arg(short = 'L', long = "location", value_name = "TAG")]
    pub locations: Vec<Location>,
    /// Language to inspect on translation records; repeat for several,
    /// all present languages if not given.
    #[arg(short = 'g', long = "language", value_name = "LANG")]
    pub languages: Vec<String>,
    /// Input JSONL file; stdin if not given.
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,
    /// Output JSONL file; stdout if not given.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

impl Args {
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            encoding: self.encoding.clone(),
            model: self.model.clone(),
            prompt: self.prompt.clone(),
            price_per_1k_tokens: self.price_per_1k_tokens,
            max_tokens: self.max_tokens,
            location: if self.locations.is_empty() {
                vec![Location::Any]
            } else {
                self.locations.clone()
            },
            languages: if self.languages.is_empty() {
                None
            } else {
                Some(self.languages.clone())
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSummary {
    pub records_in: u64,
    pub records_out: u64,
    pub total_tokens: u64,
    pub budget_exceeded: bool,
    pub price: Option<CostUsd>,
}

/// Stream records through the filter: JSONL in, surviving records out.
///
/// A malformed line aborts the run; silently skipping input would corrupt
/// the cumulative count this tool exists to report.
pub fn run_pipeline(args: &Args) -> Result<PipelineSummary> {
    let mut filter = TokenCountFilter::new(args.filter_config());
    filter.initialize()?;

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };
    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };

    let mut records_in = 0u64;
    let mut records_out = 0u64;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(&line)?;
        records_in += 1;
        if let Some(passed) = filter.process(record)? {
            serde_json::to_writer(&mut writer, &passed)?;
            writer.write_all(b"\n")?;
            records_out += 1;
        }
    }
    writer.flush()?;

    let summary = PipelineSummary {
        records_in,
        records_out,
        total_tokens: filter.total_tokens(),
        budget_exceeded: filter.budget_exceeded(),
        price: filter.price(),
    };
    filter.finalize();
    Ok(summary)
}
