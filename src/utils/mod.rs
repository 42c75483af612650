// Copyright 2024 delfies developers.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

pub mod bed;
pub mod intervals;
pub mod seq;

/// Separator used when composing output file names.
pub const ID_DELIM: &str = "__";
