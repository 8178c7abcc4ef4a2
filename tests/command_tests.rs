use drforna_converters::commands::{
    execute_combine, execute_kinefold, execute_kinfold, CombineArgs, GridArgs, JobArgs, KinefoldArgs,
    KinfoldArgs,
};
use drforna_converters::output::read_manifest;
use drforna_converters::resample::{KinfoldResampler, RateConversion};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SEQUENCE: &str = "AUCGGGGGCUCUGUUGGUUCUCCCGCAACGCUACC";
const MARKERS: &str = "A U[C G G G G G]C U C U[G U U G]G U U[C U C C C G^C A A C]G C U A C C";
const IDS: &str = "- - -5- - - - - - - - - -6- - - - - - -5' - - - - -6' - - - - - - - -";
const STRUCTURE: &str = "..((((((....((((...))))))))))......";

fn job_args(dir: &Path, fasta: &str, grid: GridArgs, tmpdir: &str) -> JobArgs {
    let input = dir.join("input.fa");
    fs::write(&input, fasta).unwrap();
    JobArgs {
        input: Some(input),
        name: None,
        tmpdir: dir.join(tmpdir),
        output_dir: dir.to_path_buf(),
        processes: 0,
        grid,
        use_counts: false,
        kp8: true,
    }
}

fn small_grid() -> GridArgs {
    GridArgs {
        t_ext: 1.0,
        t_end: 1.0,
        t_lin: 2,
        t_log: 2,
    }
}

#[test]
fn test_kinfold_job_combines_existing_runs() {
    let dir = TempDir::new().unwrap();
    let job = job_args(dir.path(), ">hp\nGC\n", small_grid(), "drkinfold");
    fs::create_dir_all(&job.tmpdir).unwrap();

    let config = small_grid().config(2);
    let grid = config.build().unwrap();
    let rates = RateConversion::new(1.0, config.t_ext).unwrap();
    let resampler = KinfoldResampler::new(&grid, &rates);
    resampler
        .convert_stream(". 0.00 0.0\n() -1.00 3.0 X\n".as_bytes(), &job.tmpdir.join("hp.001.drf"))
        .unwrap();
    resampler
        .convert_stream(". 0.00 0.0\n.. 0.00 3.0 X\n".as_bytes(), &job.tmpdir.join("hp.002.drf"))
        .unwrap();

    let runs = execute_kinfold(KinfoldArgs {
        job,
        k0: 1.0,
        ..Default::default()
    })
    .unwrap();

    assert_eq!(runs, 2);
    let table = fs::read_to_string(dir.path().join("hp.drf")).unwrap();
    assert_eq!(table.lines().count(), 1 + 1 + 2 * 6);
    assert_eq!(
        fs::read_to_string(dir.path().join("hp.kp8")).unwrap(),
        "()     1  -1.00\n..     1   0.00\n"
    );

    let manifest = read_manifest(dir.path().join("hp.manifest.json")).unwrap();
    assert_eq!(manifest.engine, "kinfold");
    assert_eq!(manifest.sequence, "GC");
    assert_eq!(manifest.grid, config);
    assert_eq!(manifest.runs, 2);
}

#[test]
fn test_kinefold_job_converts_existing_logs() {
    let dir = TempDir::new().unwrap();
    let grid = GridArgs {
        t_end: 1.0,
        t_lin: 1,
        t_log: 4,
        ..GridArgs::default()
    };
    let job = job_args(dir.path(), &format!(">ex\n{}\n", SEQUENCE), grid, "drkinefold");
    fs::create_dir_all(&job.tmpdir).unwrap();

    let rnm = job.tmpdir.join("ex.001.rnm");
    fs::write(
        &rnm,
        format!(
            "< ex\n{}\n{}| -10.50 kcal/mol at t= 0 ms, x\n{} H1 5 6\n",
            SEQUENCE, MARKERS, IDS
        ),
    )
    .unwrap();

    let runs = execute_kinefold(KinefoldArgs {
        job,
        ..Default::default()
    })
    .unwrap();

    assert_eq!(runs, 1);
    assert!(dir.path().join("drkinefold/ex.001.drf").exists());
    assert!(dir.path().join("drkinefold/ex.001.rnm.log").exists());
    assert_eq!(
        fs::read_to_string(dir.path().join("ex.kp8")).unwrap(),
        format!("{}     1 -10.50\n", STRUCTURE)
    );
}

#[test]
fn test_kinefold_job_rejects_foreign_log() {
    let dir = TempDir::new().unwrap();
    let job = job_args(dir.path(), &format!(">ex\n{}\n", SEQUENCE), small_grid(), "drkinefold");
    fs::create_dir_all(&job.tmpdir).unwrap();
    fs::write(
        job.tmpdir.join("ex.001.rnm"),
        format!("< other\n{}\n{}| -10.50 kcal/mol at t= 0 ms, x\n{} H1 5 6\n", SEQUENCE, MARKERS, IDS),
    )
    .unwrap();

    assert!(execute_kinefold(KinefoldArgs {
        job,
        ..Default::default()
    })
    .is_err());
    assert!(!dir.path().join("drkinefold/ex.001.drf").exists());
}

#[test]
fn test_combine_command_requires_matches() {
    let dir = TempDir::new().unwrap();
    let args = CombineArgs {
        pattern: format!("{}/*.drf", dir.path().display()),
        output: dir.path().join("out.drf"),
        grid: small_grid().config(2),
        ..Default::default()
    };

    assert!(execute_combine(args).is_err());
}
