// Copyright 2024 delfies developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Detection of DNA elimination breakpoints from reads aligned to a reference genome.
//!
//! Two classes of breakpoints are distinguished:
//! * G2S (germline to soma): soft clipped reads whose clip carries a newly added telomere
//!   repeat array,
//! * S2G (soma to germline): soft clipped reads without such a signature.
//!
//! Soft clip boundaries are counted per position and orientation (tents), clustered, and each
//! cluster is represented by its best supported position (maximal focus).

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate getset;
#[macro_use]
extern crate strum_macros;
#[macro_use]
extern crate derive_new;

pub mod alignment;
pub mod breakpoints;
pub mod cli;
pub mod errors;
pub mod output;
pub mod reference;
pub mod scheduler;
pub mod telomeres;
pub mod utils;

pub use crate::alignment::{AlignedRead, AlignmentSource, BamSource, Softclip};
pub use crate::breakpoints::{
    BreakpointFocus, BreakpointType, BreakpointTypeSelection, DetectionParams,
    DetectionParamsBuilder, MaximalFocus, Tents,
};
pub use crate::reference::SequenceAccessor;
pub use crate::scheduler::{detect_breakpoints, RegionSelection};
pub use crate::utils::intervals::Interval;
pub use crate::utils::seq::{Orientation, TelomereSeqs};
