use drforna_converters::resample::{is_close, GridConfig};
use pretty_assertions::assert_eq;

fn config(seqlen: usize) -> GridConfig {
    GridConfig {
        seqlen,
        t_ext: 1.0,
        t_end: 1.0,
        t_lin: 2,
        t_log: 2,
    }
}

#[test]
fn test_small_grid_matches_worked_example() {
    let grid = config(2).build().unwrap();
    let expected = [0.0, 0.5, 1.0, 1.5, 2.0, 6f64.sqrt(), 3.0];

    assert_eq!(grid.len(), expected.len());
    for (actual, expected) in grid.times().iter().zip(expected) {
        assert!(is_close(*actual, expected), "{} != {}", actual, expected);
    }
    assert_eq!(grid.growth_end(), 4);
}

#[test]
fn test_grid_length_and_monotonicity() {
    let grid = GridConfig::new(25).build().unwrap();
    let config = GridConfig::new(25);

    assert_eq!(grid.len(), 1 + 25 * config.t_lin + config.t_log);
    assert!(grid.times().windows(2).all(|w| w[0] < w[1]));
    assert!(is_close(grid.last(), 25.0 * config.t_ext + config.t_end));
}

#[test]
fn test_degenerate_grids_are_rejected() {
    assert!(config(0).build().is_err());
    assert!(GridConfig { t_lin: 0, ..config(3) }.build().is_err());
    assert!(GridConfig { t_log: 0, ..config(3) }.build().is_err());
    assert!(GridConfig { t_ext: -1.0, ..config(3) }.build().is_err());
}
