mod arbitrary;
mod parse_bad;
mod parse_good;
pub(crate) mod utils;
