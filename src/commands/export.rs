use std::fs::File;
use std::io::{self, BufWriter};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::ExportArgs;
use crate::dataset::LeadDataset;
use crate::util::ensure_parent_directory;

pub fn run(args: ExportArgs) -> Result<()> {
    let dataset = LeadDataset::load(&args.data_path)?;

    let Some(out_path) = &args.out_path else {
        return dataset.write_csv(BufWriter::new(io::stdout().lock()));
    };

    ensure_parent_directory(out_path)?;
    let file = File::create(out_path)
        .with_context(|| format!("failed to create {}", out_path.display()))?;
    dataset
        .write_csv(BufWriter::new(file))
        .with_context(|| format!("failed to write {}", out_path.display()))?;

    info!(
        path = %out_path.display(),
        rows = dataset.len(),
        "exported lead dataset"
    );
    Ok(())
}
