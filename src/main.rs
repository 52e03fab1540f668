//! SmartSum CLI - Checksums and Cache Validators
//!
//! Hashes files and strings, runs custom CRCs, and derives cache validators.

use clap::Parser;
use serde::Serialize;
use smartsum::cache::{CacheValidator, ReferenceOptions};
use smartsum::config::{parse_size, ChecksumAlgorithm, CliArgs, Commands, DigestFormat, OutputFormat};
use smartsum::encode::{encode_str, ByteOrder, TextEncoding};
use smartsum::error::{ChecksumError, Result};
use smartsum::hash::{
    benchmark_algorithms, digest_file, hash_bytes, hash_files_parallel_with_order, verify_files_match, Crc,
    CrcParams, Digest, EngineConfig, HashEngine,
};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = CliArgs::parse();

    // Initialize logging; RUST_LOG overrides -v
    let default_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Dispatch a subcommand; `Ok(false)` means a verification failed
fn run(args: &CliArgs) -> Result<bool> {
    let output = args.output_format;

    match &args.command {
        Commands::Hash {
            paths,
            algorithm,
            format,
            byte_order,
        } => cmd_hash(paths, *algorithm, *format, *byte_order, output),
        Commands::Text {
            text,
            algorithm,
            encoding,
            bom,
            format,
        } => cmd_text(text, *algorithm, *encoding, *bom, *format, output),
        Commands::Crc {
            path,
            width,
            poly,
            init,
            xor_out,
            reflect_in,
            reflect_out,
            byte_order,
        } => {
            let params = CrcParams {
                width: *width,
                polynomial: *poly,
                init: *init,
                xor_out: *xor_out,
            };
            let config = EngineConfig::reflected(*reflect_in, *reflect_out).with_byte_order(*byte_order);
            let crc = Crc::new(format!("CRC-{}/CUSTOM", width), params, config)?;
            cmd_crc(path, &crc, output)
        }
        Commands::Validate {
            path,
            method,
            max_bytes,
            algorithm,
        } => {
            let options = ReferenceOptions {
                max_bytes: parse_size(max_bytes).map_err(ChecksumError::ConfigError)?,
                method: *method,
                algorithm: *algorithm,
            };
            cmd_validate(path, &options, output)
        }
        Commands::Verify {
            source,
            destination,
            algorithm,
        } => cmd_verify(source, destination, *algorithm, output),
        Commands::Algorithms => cmd_algorithms(output),
        Commands::Benchmark { size } => {
            let size = parse_size(size).map_err(ChecksumError::ConfigError)?;
            cmd_benchmark(size as usize, output)
        }
    }
}

fn format_digest(digest: &Digest, format: DigestFormat) -> String {
    match format {
        DigestFormat::Hex => digest.to_hex(),
        DigestFormat::Base64 => digest.to_base64(),
        DigestFormat::Base64Url => digest.to_base64_url(),
        DigestFormat::Binary => digest.to_binary_string(),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct HashLine<'a> {
    path: &'a Path,
    algorithm: ChecksumAlgorithm,
    byte_order: ByteOrder,
    digest: String,
    size: u64,
}

fn cmd_hash(
    paths: &[std::path::PathBuf],
    algorithm: ChecksumAlgorithm,
    format: DigestFormat,
    byte_order: ByteOrder,
    output: OutputFormat,
) -> Result<bool> {
    let results = hash_files_parallel_with_order(paths, algorithm, byte_order);
    let mut lines = Vec::with_capacity(results.len());
    let mut all_ok = true;

    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(checksum) => lines.push(HashLine {
                path,
                algorithm,
                byte_order,
                digest: format_digest(&checksum.digest, format),
                size: checksum.size,
            }),
            Err(e) => {
                eprintln!("Error: {}", e);
                all_ok = false;
            }
        }
    }

    match output {
        OutputFormat::Json => print_json(&lines)?,
        OutputFormat::Text => {
            for line in &lines {
                println!("{}  {}", line.digest, line.path.display());
            }
        }
    }

    Ok(all_ok)
}

fn cmd_text(
    text: &str,
    algorithm: ChecksumAlgorithm,
    encoding: TextEncoding,
    bom: bool,
    format: DigestFormat,
    output: OutputFormat,
) -> Result<bool> {
    let bytes = encode_str(text, encoding, bom);
    let digest = format_digest(&hash_bytes(&bytes, algorithm), format);

    match output {
        OutputFormat::Json => print_json(&serde_json::json!({
            "algorithm": algorithm,
            "encoding": encoding,
            "bytes": bytes.len(),
            "digest": digest,
        }))?,
        OutputFormat::Text => println!("{}", digest),
    }

    Ok(true)
}

fn cmd_crc(path: &Path, crc: &Crc, output: OutputFormat) -> Result<bool> {
    let (digest, size) = digest_file(path, crc, 1024 * 1024)?;

    match output {
        OutputFormat::Json => print_json(&serde_json::json!({
            "path": path,
            "name": crc.name(),
            "width": crc.params().width,
            "digest": digest,
            "size": size,
        }))?,
        OutputFormat::Text => println!("{}  {}", digest, path.display()),
    }

    Ok(true)
}

fn cmd_validate(path: &Path, options: &ReferenceOptions, output: OutputFormat) -> Result<bool> {
    let validator = CacheValidator::from_file(path, options)?;
    let report = validator.report();

    match output {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            println!("=== Cache Validator ===");
            println!("Path:             {}", path.display());
            println!("Created:          {}", report.created.to_rfc3339());
            match report.modified {
                Some(modified) => println!("Modified:         {}", modified.to_rfc3339()),
                None => println!("Modified:         -"),
            }
            println!("Most significant: {}", report.most_significant.to_rfc3339());
            println!("Method:           {:?}", report.method);
            println!("Strength:         {}", report.strength);
            println!("Digest:           {}", report.digest);
        }
    }

    Ok(validator.is_valid())
}

fn cmd_verify(
    source: &Path,
    destination: &Path,
    algorithm: ChecksumAlgorithm,
    output: OutputFormat,
) -> Result<bool> {
    let result = verify_files_match(source, destination, algorithm)?;

    match output {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Text => {
            println!("Source:      {}", result.source);
            println!("Destination: {}", result.destination);
            println!("Match: {}", if result.matches { "YES ✓" } else { "NO ✗" });
        }
    }

    Ok(result.matches)
}

fn cmd_algorithms(output: OutputFormat) -> Result<bool> {
    match output {
        OutputFormat::Json => {
            let entries: Vec<_> = ChecksumAlgorithm::ALL
                .iter()
                .map(|a| {
                    serde_json::json!({
                        "id": a.id(),
                        "name": a.engine().name(),
                        "bytes": a.output_size(),
                    })
                })
                .collect();
            print_json(&entries)?;
        }
        OutputFormat::Text => {
            println!("{:<14} {:<20} {:>5}", "ID", "Name", "Bytes");
            println!("{}", "-".repeat(41));
            for algorithm in ChecksumAlgorithm::ALL {
                let default = if algorithm == ChecksumAlgorithm::default() { " (default)" } else { "" };
                println!(
                    "{:<14} {:<20} {:>5}{}",
                    algorithm.id(),
                    algorithm.engine().name(),
                    algorithm.output_size(),
                    default
                );
            }
        }
    }

    Ok(true)
}

fn cmd_benchmark(size: usize, output: OutputFormat) -> Result<bool> {
    if output == OutputFormat::Text {
        println!("=== SmartSum Benchmark ===");
        println!("Buffer size: {}\n", humansize::format_size(size, humansize::BINARY));
    }

    let results = benchmark_algorithms(size);

    match output {
        OutputFormat::Json => {
            let entries: Vec<_> = results
                .iter()
                .map(|(algorithm, duration, throughput)| {
                    serde_json::json!({
                        "algorithm": algorithm,
                        "nanos": duration.as_nanos() as u64,
                        "mib_per_sec": throughput,
                    })
                })
                .collect();
            print_json(&entries)?;
        }
        OutputFormat::Text => {
            println!("{:<14} {:>12} {:>14}", "Algorithm", "Time", "Throughput");
            println!("{}", "-".repeat(42));
            for (algorithm, duration, throughput) in &results {
                println!(
                    "{:<14} {:>12} {:>9.1} MB/s",
                    algorithm.id(),
                    format!("{:.2?}", duration),
                    throughput
                );
            }
        }
    }

    Ok(true)
}
