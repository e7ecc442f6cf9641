use std::path::PathBuf;

use bounce_core::AnalysisOutput;
use bounce_report::OutputPaths;

#[derive(Debug)]
pub struct AnalyzeResult {
    pub input: PathBuf,
    pub diagnosis_lookup: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// Files written; `None` on a dry run.
    pub written: Option<OutputPaths>,
    pub output: AnalysisOutput,
}
