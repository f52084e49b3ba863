//! Chain command - compose two source maps with vernis_trame

use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use vernis_trame::{chain_source_maps, ChainOptions, MapInput, SourceMap};

#[derive(Args)]
pub struct ChainArgs {
    /// Map of the first stage (original -> intermediate)
    pub first: PathBuf,

    /// Map of the second stage (intermediate -> final)
    pub second: PathBuf,

    /// Indentation stripped from the original before the first stage
    #[arg(long, default_value = "0")]
    pub indentation: u32,

    /// Write the composed map here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: ChainArgs) {
    let composed = match chain_files(&args.first, &args.second, args.indentation) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match &args.output {
        Some(path) => {
            if let Err(e) = fs::write(path, &composed) {
                eprintln!("Error writing {}: {}", path.display(), e);
                std::process::exit(1);
            }
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{composed}"),
    }
}

fn chain_files(
    first: &Path,
    second: &Path,
    indentation: u32,
) -> Result<String, Box<dyn std::error::Error>> {
    let map1 = SourceMap::from_json(&fs::read_to_string(first)?)?;
    let map2 = fs::read_to_string(second)?;
    tracing::debug!(first = %first.display(), second = %second.display(), indentation, "chaining");

    let composed = chain_source_maps(
        Some(&map1),
        Some(MapInput::Json(map2)),
        ChainOptions::with_indentation(indentation),
    )?;

    Ok(composed.unwrap_or(map1).to_json()?)
}
