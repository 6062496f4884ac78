//! Per-policy CSV results and the averages read back from them.

use std::{
    fmt::Display,
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use super::driver::RunReport;
use crate::{error::SimError, scheduler::PolicyRegistry};

pub const CSV_HEADER: &str = "name,priority,status,simulated_arrival_time,arrival_tick,\
service_time,turnaround_time,waiting_time,completion_tick";

const SERVICE_COLUMN: usize = 5;
const TURNAROUND_COLUMN: usize = 6;
const WAITING_COLUMN: usize = 7;

pub fn csv_file_name(policy: &str) -> String {
    format!("{}_results.csv", policy.to_uppercase())
}

/// `dyn_aging_rr` -> `Dyn Aging Rr`
pub fn label(policy: &str) -> String {
    policy
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

fn opt(value: Option<impl Display>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows(report: &RunReport, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{CSV_HEADER}")?;
    for p in &report.processes {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{}",
            quote(&p.name),
            p.priority,
            p.status,
            p.simulated_arrival_time,
            opt(p.arrival_tick),
            p.service_time,
            opt(p.turnaround_time),
            opt(p.waiting_time),
            opt(p.completion_tick),
        )?;
    }
    out.flush()
}

/// Writes `<POLICY>_results.csv` into `dir` and returns its path.
pub fn write_csv(report: &RunReport, dir: &Path) -> Result<PathBuf, SimError> {
    let path = dir.join(csv_file_name(&report.policy));
    let io_err = |source| SimError::Io {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(dir).map_err(io_err)?;
    let mut out = BufWriter::new(File::create(&path).map_err(io_err)?);
    write_rows(report, &mut out).map_err(io_err)?;

    info!(path = %path.display(), rows = report.processes.len(), "wrote results");
    Ok(path)
}

// Splits one CSV record, honoring double-quoted fields.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            ('"', _) => quoted = !quoted,
            (',', false) => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Averages {
    pub service: f64,
    pub turnaround: f64,
    pub waiting: f64,
}

/// Averages service, turnaround and waiting time over the rows of one
/// results file. A file with no rows averages to zero.
pub fn read_metrics(path: &Path) -> Result<Averages, SimError> {
    let raw = fs::read_to_string(path).map_err(|source| SimError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut totals = Averages::default();
    let mut count = 0usize;

    for (index, line) in raw.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_record(line);
        let column = |col: usize| -> Result<f64, SimError> {
            let malformed = |reason: String| SimError::MalformedCsv {
                path: path.to_path_buf(),
                line: index + 1,
                reason,
            };
            let raw = fields
                .get(col)
                .ok_or_else(|| malformed(format!("missing column {col}")))?;
            raw.trim()
                .parse()
                .map_err(|_| malformed(format!("column {col} is not a number: {raw:?}")))
        };

        totals.service += column(SERVICE_COLUMN)?;
        totals.turnaround += column(TURNAROUND_COLUMN)?;
        totals.waiting += column(WAITING_COLUMN)?;
        count += 1;
    }

    if count == 0 {
        return Ok(Averages::default());
    }
    let n = count as f64;
    Ok(Averages {
        service: totals.service / n,
        turnaround: totals.turnaround / n,
        waiting: totals.waiting / n,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolicySummary {
    pub policy: &'static str,
    pub label: String,
    pub averages: Averages,
}

/// Reads the results file of every registered policy found in `dir`, in
/// registry order. Missing files are skipped with a warning.
pub fn summarize_dir(
    dir: &Path,
    registry: &PolicyRegistry,
) -> Result<Vec<PolicySummary>, SimError> {
    let mut summaries = Vec::new();
    for policy in registry.keys() {
        let path = dir.join(csv_file_name(policy));
        if !path.exists() {
            warn!(path = %path.display(), "results file not found, skipping");
            continue;
        }
        summaries.push(PolicySummary {
            policy,
            label: label(policy),
            averages: read_metrics(&path)?,
        });
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(label("dyn_aging_rr"), "Dyn Aging Rr");
        assert_eq!(label("fcfs"), "Fcfs");
        assert_eq!(label("priority_preemptive"), "Priority Preemptive");
    }

    #[test]
    fn file_names() {
        assert_eq!(csv_file_name("dyn_aging_rr"), "DYN_AGING_RR_results.csv");
    }

    #[test]
    fn splits_quoted_fields() {
        assert_eq!(
            split_record(r#""a,""b""",1,,3"#),
            ["a,\"b\"", "1", "", "3"]
        );
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote("x,y"), "\"x,y\"");
    }
}
