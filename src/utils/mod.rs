//! Project-specific utilities live here.

pub mod iso_date;
