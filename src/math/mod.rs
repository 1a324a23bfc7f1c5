pub mod angles;
pub mod interp;
