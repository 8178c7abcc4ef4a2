//! Configuration and constants for the converters.

/// Current manifest schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Header row of every trajectory table (per-run and combined)
pub const DRF_HEADER: &str = "id time occupancy structure energy";

// Default time-grid parameters (seconds / sample counts)
pub const DEFAULT_T_EXT: f64 = 0.02;
pub const DEFAULT_T_END: f64 = 30.0;
pub const DEFAULT_T_LIN: usize = 10;
pub const DEFAULT_T_LOG: usize = 30;

// Kinfold: Arrhenius rate constant [atu/s]
pub const DEFAULT_K0: f64 = 1e5;

// Energy cutoff passed to Kinfold so that every event is printed
pub const KINFOLD_ENERGY_CUTOFF: u64 = 999_999;

// Tolerances matching numpy.isclose defaults
pub const GRID_RTOL: f64 = 1e-5;
pub const GRID_ATOL: f64 = 1e-8;

/// Residues accepted in an input sequence record
pub const ALLOWED_RESIDUES: &str = "ACGUNTacgunt";

/// Number of helix slots available to the annotation parser
/// (one primary bracket family plus one per uppercase letter)
pub const HELIX_SLOTS: usize = 27;

// Separators terminating a helix identifier in a Kinefold annotation line
pub const HELIX_ID_SEPARATORS: &[char] = &[' ', '-', '\''];

// External executables
pub const KINFOLD_EXECUTABLE: &str = "Kinfold";
pub const KINEFOLD_EXECUTABLE: &str = "./kinefold_long_static";

// Kinefold: helix minimum free energy in kcal/mol (10 kT)
pub const KINEFOLD_HELIX_MIN_FREE_ENERGY: f64 = 6.3460741;
