// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the witmotion-vibration project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Result output configuration

use serde::{Deserialize, Serialize};

/// Where analysis results go besides the console listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Write the analysis report as pretty-printed JSON to this path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_file: Option<String>,
}
