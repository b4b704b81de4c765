//! FGFR1 internal tandem duplication calling.
//!
//! Raw variants come from VarDict; this crate loads the breakpoint exon
//! windows and keeps only VCF records that look like a multi-kilobase
//! insertion anchored in the 3' exon.

pub mod caller;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;

pub mod utils {
    pub mod bed;
    pub mod time;
}

pub mod var {
    pub mod itd;
}

pub use error::{ItdError, Result};
