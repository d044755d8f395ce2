pub mod data;
pub mod io;
