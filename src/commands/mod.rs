pub mod index;
pub mod search;
pub mod seed;
pub mod serve;
pub mod status;
