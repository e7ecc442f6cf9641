//! All-or-nothing emission of every output file.
//!
//! Files are written as `<name>.partial` next to their final location and
//! renamed only once every table has been written. On failure the staged
//! files (and any already renamed in this run) are removed.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bounce_core::AnalysisOutput;
use bounce_model::StratumDimension;
use tracing::{debug, info, warn};

use crate::error::{ReportError, Result};
use crate::summary::{RunSummary, write_run_summary};
use crate::tables::{
    write_classified_cohort, write_overlap, write_rate_table, write_revisit_then_admit_overlap,
};

pub const CLASSIFIED_COHORT_FILE: &str = "classified_cohort.csv";
pub const RATE_SUMMARY_FILE: &str = "rate_summary.csv";
pub const OVERLAP_FILE: &str = "overlap.csv";
pub const REVISIT_THEN_ADMIT_OVERLAP_FILE: &str = "overlap_revisit_then_admit.csv";
pub const RUN_SUMMARY_FILE: &str = "run_summary.json";

const STAGING_SUFFIX: &str = ".partial";

/// File name of a per-dimension breakdown.
pub fn rates_file_name(dimension: StratumDimension) -> String {
    format!("rates_by_{}.csv", dimension.file_stem())
}

/// Every file a run writes, in write order.
pub fn planned_files(output: &AnalysisOutput) -> Vec<String> {
    let mut files = vec![
        CLASSIFIED_COHORT_FILE.to_string(),
        RATE_SUMMARY_FILE.to_string(),
    ];
    files.extend(
        output
            .dimensions()
            .into_iter()
            .filter(|dimension| *dimension != StratumDimension::Overall)
            .map(rates_file_name),
    );
    files.push(OVERLAP_FILE.to_string());
    files.push(REVISIT_THEN_ADMIT_OVERLAP_FILE.to_string());
    files.push(RUN_SUMMARY_FILE.to_string());
    files
}

/// Files written by [`write_outputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub directory: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Write every table for `output` into `directory`.
pub fn write_outputs(output: &AnalysisOutput, directory: &Path) -> Result<OutputPaths> {
    fs::create_dir_all(directory).map_err(|source| ReportError::CreateDir {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut staging = Staging::new(directory);
    match stage_tables(output, &mut staging) {
        Ok(()) => {
            let files = staging.commit()?;
            info!(
                directory = %directory.display(),
                files = files.len(),
                "outputs written"
            );
            Ok(OutputPaths {
                directory: directory.to_path_buf(),
                files,
            })
        }
        Err(error) => {
            warn!(error = %error, "output failed; removing staged files");
            staging.discard();
            Err(error)
        }
    }
}

fn stage_tables(output: &AnalysisOutput, staging: &mut Staging) -> Result<()> {
    staging.stage(CLASSIFIED_COHORT_FILE, |writer| {
        write_classified_cohort(writer, output)
    })?;
    staging.stage(RATE_SUMMARY_FILE, |writer| {
        write_rate_table(writer, &output.rates)
    })?;
    for dimension in output.dimensions() {
        if dimension == StratumDimension::Overall {
            continue;
        }
        staging.stage(&rates_file_name(dimension), |writer| {
            write_rate_table(writer, output.rates_for(dimension))
        })?;
    }
    staging.stage(OVERLAP_FILE, |writer| write_overlap(writer, output))?;
    staging.stage(REVISIT_THEN_ADMIT_OVERLAP_FILE, |writer| {
        write_revisit_then_admit_overlap(writer, output)
    })?;
    let summary = RunSummary::new(output, planned_files(output));
    staging.stage(RUN_SUMMARY_FILE, |writer| write_run_summary(writer, &summary))
}

struct Staging {
    directory: PathBuf,
    /// (staged path, final path)
    staged: Vec<(PathBuf, PathBuf)>,
}

impl Staging {
    fn new(directory: &Path) -> Self {
        Self {
            directory: directory.to_path_buf(),
            staged: Vec::new(),
        }
    }

    fn stage<F>(&mut self, name: &str, render: F) -> Result<()>
    where
        F: FnOnce(&mut BufWriter<File>) -> Result<()>,
    {
        let target = self.directory.join(name);
        let partial = self.directory.join(format!("{name}{STAGING_SUFFIX}"));
        let file = File::create(&partial).map_err(|source| ReportError::Io {
            path: partial.clone(),
            source,
        })?;
        self.staged.push((partial.clone(), target));

        let mut writer = BufWriter::new(file);
        render(&mut writer)?;
        writer.flush().map_err(|source| ReportError::Io {
            path: partial.clone(),
            source,
        })?;
        debug!(file = name, "staged output");
        Ok(())
    }

    fn commit(self) -> Result<Vec<PathBuf>> {
        let mut committed: Vec<PathBuf> = Vec::with_capacity(self.staged.len());
        for (index, (partial, target)) in self.staged.iter().enumerate() {
            if let Err(source) = fs::rename(partial, target) {
                for (remaining, _) in &self.staged[index..] {
                    let _ = fs::remove_file(remaining);
                }
                for path in &committed {
                    let _ = fs::remove_file(path);
                }
                return Err(ReportError::Commit {
                    from: partial.clone(),
                    to: target.clone(),
                    source,
                });
            }
            committed.push(target.clone());
        }
        Ok(committed)
    }

    fn discard(self) {
        for (partial, _) in &self.staged {
            let _ = fs::remove_file(partial);
        }
    }
}
