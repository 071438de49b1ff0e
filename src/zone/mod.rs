mod error;
mod records;
#[cfg(test)]
pub(crate) mod testing;
mod transfer;

pub use error::Error;
pub use records::RecordSet;
#[cfg(test)]
pub use records::APEX;
pub use transfer::fetch;
