/*!
 * Results files
 * CSV emission from real runs and the averages read back from disk
 */

use pretty_assertions::assert_eq;
use sched_sim::{
    PolicyParams, PolicyRegistry, ProcessSpec, Sim, SimError, Workload,
    sim::{
        Averages,
        report::{self, CSV_HEADER},
    },
};
use std::fs;

fn workload() -> Workload {
    Workload::new(vec![
        ProcessSpec::new("A", 1, 0, 5),
        ProcessSpec::new("B", 1, 0, 3),
        ProcessSpec::new("C", 1, 0, 8),
    ])
    .unwrap()
}

#[test]
fn fcfs_results_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let sim = Sim::new(
        &workload(),
        PolicyRegistry::standard(),
        PolicyParams::default(),
        1_000,
    );
    let report = sim.run_policy("fcfs").unwrap();
    let path = report::write_csv(&report, dir.path()).unwrap();

    assert_eq!(path.file_name().unwrap(), "FCFS_results.csv");
    let written = fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = written.lines().collect();
    assert_eq!(
        lines,
        [
            CSV_HEADER,
            "A,1,TERMINATED,0,0,5,5,0,5",
            "B,1,TERMINATED,0,0,3,8,5,8",
            "C,1,TERMINATED,0,0,8,16,8,16",
        ]
    );

    let averages = report::read_metrics(&path).unwrap();
    assert_eq!(averages.service, 16.0 / 3.0);
    assert_eq!(averages.turnaround, 29.0 / 3.0);
    assert_eq!(averages.waiting, 13.0 / 3.0);
}

#[test]
fn summary_follows_registry_order_and_skips_missing() {
    let dir = tempfile::tempdir().unwrap();
    let registry = PolicyRegistry::standard().subset(&["rr", "sjn"]).unwrap();
    let sim = Sim::new(&workload(), registry, PolicyParams::default(), 1_000);
    for (_, result) in sim.run_all() {
        report::write_csv(&result.unwrap(), dir.path()).unwrap();
    }

    let summaries = report::summarize_dir(dir.path(), &PolicyRegistry::standard()).unwrap();
    let labels: Vec<_> = summaries.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, ["Sjn", "Rr"]);

    // sjn: B 0-3, A 3-8, C 8-16
    let sjn = &summaries[0].averages;
    assert_eq!(sjn.turnaround, 27.0 / 3.0);
    assert_eq!(sjn.waiting, 11.0 / 3.0);
}

#[test]
fn empty_and_malformed_files() {
    let dir = tempfile::tempdir().unwrap();

    let empty = dir.path().join("EMPTY_results.csv");
    fs::write(&empty, format!("{CSV_HEADER}\n\n")).unwrap();
    assert_eq!(report::read_metrics(&empty).unwrap(), Averages::default());

    let bad = dir.path().join("BAD_results.csv");
    fs::write(&bad, format!("{CSV_HEADER}\nA,1,TERMINATED,0,0,five,5,0,5\n")).unwrap();
    assert!(matches!(
        report::read_metrics(&bad),
        Err(SimError::MalformedCsv { line: 2, .. })
    ));

    let missing = dir.path().join("NOPE_results.csv");
    assert!(matches!(
        report::read_metrics(&missing),
        Err(SimError::Io { .. })
    ));
}
