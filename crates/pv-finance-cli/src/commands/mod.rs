pub mod model;
pub mod time_value;
