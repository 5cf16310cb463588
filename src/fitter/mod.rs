pub mod fit;
pub mod fit_handler;
pub mod least_squares;
pub mod models;
