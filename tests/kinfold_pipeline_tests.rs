use drforna_converters::aggregator::{combine_trajectories, find_trajectories, Occupancy};
use drforna_converters::output::{
    read_manifest, write_combined_table, write_final_distribution, write_manifest, JobManifest,
};
use drforna_converters::resample::{GridConfig, KinfoldResampler, RateConversion};
use drforna_converters::utils::error::{ConsistencyError, ConvertError};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

// Grid (k0 = 1): 0 .5 1 1.5 2 2.449.. 3
fn config() -> GridConfig {
    GridConfig {
        seqlen: 2,
        t_ext: 1.0,
        t_end: 1.0,
        t_lin: 2,
        t_log: 2,
    }
}

#[test]
fn test_streams_to_combined_table() {
    let dir = TempDir::new().unwrap();
    let config = config();
    let grid = config.build().unwrap();
    let rates = RateConversion::new(1.0, config.t_ext).unwrap();
    let resampler = KinfoldResampler::new(&grid, &rates);

    let folded = ". 0.00 0.0\n() -1.00 3.0 X\n";
    let open = ". 0.00 0.0\n.. 0.00 3.0 X\n";
    assert_eq!(
        resampler
            .convert_stream(folded.as_bytes(), &dir.path().join("hp.001.drf"))
            .unwrap(),
        1
    );
    assert_eq!(
        resampler
            .convert_stream(open.as_bytes(), &dir.path().join("hp.002.drf"))
            .unwrap(),
        1
    );

    let pattern = format!("{}/hp.*.drf", dir.path().display());
    let paths = find_trajectories(&pattern).unwrap();
    assert_eq!(paths.len(), 2);

    let table = combine_trajectories(&paths, &grid, config.seqlen, false).unwrap();
    assert_eq!(table.runs, 2);
    assert_eq!(table.files, 2);
    assert_eq!(table.structures, 2);

    // '.' at t = 0 is padded and merges with '..'
    assert_eq!(table.rows[0].structure, "..");
    assert_eq!(table.rows[0].id, 0);
    assert_eq!(table.rows[0].occupancy, Occupancy::Fraction(1.0));

    let last: Vec<(&str, i64)> = table
        .final_distribution
        .iter()
        .map(|t| (t.structure.as_str(), t.energy_centi))
        .collect();
    assert_eq!(last, [("()", -100), ("..", 0)]);

    let output = dir.path().join("hp.drf");
    write_combined_table(&table.rows, &output).unwrap();
    let text = fs::read_to_string(&output).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("id time occupancy structure energy"));
    assert_eq!(lines.next(), Some("    0   0.000000000 1.0000 ..   0.00"));
    assert_eq!(text.lines().count(), 1 + table.rows.len());

    let kp8 = dir.path().join("hp.kp8");
    write_final_distribution(&table.final_distribution, &kp8).unwrap();
    assert_eq!(
        fs::read_to_string(&kp8).unwrap(),
        "()     1  -1.00\n..     1   0.00\n"
    );

    let manifest = JobManifest::new("hp", "GC", "kinfold", &config, &grid, table.runs);
    let manifest_path = JobManifest::default_path(dir.path(), "hp");
    write_manifest(&manifest, &manifest_path).unwrap();
    let restored = read_manifest(&manifest_path).unwrap();
    assert_eq!(restored.grid, config);
    assert_eq!(restored.grid_points, grid.len());
    assert_eq!(restored.runs, 2);
}

#[test]
fn test_counts_mode() {
    let dir = TempDir::new().unwrap();
    let config = config();
    let grid = config.build().unwrap();
    let rates = RateConversion::new(1.0, config.t_ext).unwrap();
    let resampler = KinfoldResampler::new(&grid, &rates);

    let two_runs = ". 0.00 0.0\n() -1.00 3.0 X\n. 0.00 0.0\n() -1.00 3.0 X\n";
    let path = dir.path().join("hp.001.drf");
    assert_eq!(resampler.convert_stream(two_runs.as_bytes(), &path).unwrap(), 2);

    let table = combine_trajectories(&[path], &grid, config.seqlen, true).unwrap();
    assert_eq!(table.runs, 2);
    assert!(table
        .rows
        .iter()
        .all(|row| row.occupancy == Occupancy::Count(2)));
}

#[test]
fn test_failed_stream_leaves_no_trajectory() {
    let dir = TempDir::new().unwrap();
    let config = config();
    let grid = config.build().unwrap();
    let rates = RateConversion::new(1.0, config.t_ext).unwrap();
    let path = dir.path().join("hp.001.drf");

    let result = KinfoldResampler::new(&grid, &rates).convert_stream(". 0.00 0.0\n".as_bytes(), &path);

    assert!(matches!(
        result,
        Err(ConvertError::Consistency(ConsistencyError::IncompleteRun { .. }))
    ));
    assert!(!path.exists());
}
