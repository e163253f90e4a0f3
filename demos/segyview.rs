use clap::{self, Parser};
use segyio::{ReaderConfig, SegyReader, SuReader};

#[derive(clap::Parser)]
struct Cmd {
    /// SEG-Y file to read
    file: String,
    /// Interpret the file as a Seismic Unix stream (no file headers)
    #[arg(long)]
    su: bool,
    /// Print the textual header and the binary header as JSON
    #[arg(short, long)]
    summary: bool,
    /// Print the decoded samples of every trace
    #[arg(short, long)]
    data: bool,
    /// Skip sample decoding, print trace headers only
    #[arg(long)]
    headonly: bool,
}

fn main() {
    let _ = env_logger::builder().try_init();
    let cmd = Cmd::parse();
    let bytes = std::fs::read(&cmd.file).unwrap();
    let config = ReaderConfig {
        headonly: cmd.headonly,
        ..ReaderConfig::default()
    };
    let decoded = if cmd.su {
        SuReader::from_bytes(bytes, None, config).read_all()
    } else {
        SegyReader::from_bytes(bytes, config)
            .expect("Cannot open file")
            .read_all()
    };
    if cmd.summary {
        println!("{}", decoded.header_json().expect("encode error"));
    }
    for trace in &decoded.traces {
        println!(
            "trace seq {} record {} ({} samples, {} us)",
            trace.header.sequence_in_line,
            trace.header.field_record,
            trace.header.num_samples,
            trace.header.sample_interval_us
        );
        if cmd.data {
            println!("{:?}", trace.samples);
        }
    }
    for anomaly in &decoded.anomalies {
        eprintln!("{}", anomaly);
    }
}
