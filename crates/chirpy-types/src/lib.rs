pub mod api;
pub mod models;

/// Numeric identifier shared by chirps and users.
pub type Id = u64;

/// Longest chirp body accepted, counted in characters.
pub const MAX_CHIRP_LENGTH: usize = 140;
