pub mod binning;
pub mod io;
