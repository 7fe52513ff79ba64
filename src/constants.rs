// Input schema
pub const REQUIRED_COLUMNS: [&str; 5] = ["uid", "d", "t", "x", "y"];

// Coordinate dimensionality: (x, y) pairs in and out
pub const COORD_DIM: usize = 2;

// Dataset policy constants, overridable from the command line
pub const UID_CAP: i64 = 1000; // keep only the first 1000 users
pub const TRAIN_MAX_DAY: i64 = 30;
pub const VAL_MIN_DAY: i64 = 31;
pub const VAL_MAX_DAY: i64 = 50;

// Model parameters
pub const HIDDEN_SIZE: usize = 8;
pub const NUM_LAYERS: usize = 1;

// Training parameters
pub const BATCH_SIZE: usize = 32;
pub const EPOCHS: usize = 50;
pub const LEARNING_RATE: f64 = 0.01;
pub const SEED: u64 = 4020;

// Reporting
pub const HISTOGRAM_BINS: usize = 50;
