//! Data preprocessing module
//!
//! - Column selection by normalized sensor name
//! - Dropping columns with too many missing values
//! - Standard scaling
//! - Label encoding of the activity target

mod columns;
mod encoder;
mod scaler;

pub use columns::{
    drop_missing_columns, missing_count, missing_percentages, normalize_column_name,
    select_columns,
};
pub use encoder::LabelEncoder;
pub use scaler::StandardScaler;
