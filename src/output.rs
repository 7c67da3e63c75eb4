use std::io::{self, Write};

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::harvest::HarvestResult;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub count_v1: usize,
    pub count_v2: usize,
    pub files: Vec<String>,
}

impl RunSummary {
    pub fn new(result: &HarvestResult, files: &[Utf8PathBuf]) -> Self {
        Self {
            count_v1: result.v1.count,
            count_v2: result.v2.count,
            files: files.iter().map(ToString::to_string).collect(),
        }
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
