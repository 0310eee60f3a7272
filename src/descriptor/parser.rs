// SPDX-FileCopyrightText: 2026 The metaresolvr Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::descriptor::Descriptor;

use serde_bencode::de;
use serde_bencode::value::Value;

use std::fmt;

#[derive(Debug)]
pub enum ParseError {
    Bencode(serde_bencode::Error),
    MissingInfoDict,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::Bencode(e) => write!(f, "Bencode parsing error: {}", e),
            ParseError::MissingInfoDict => write!(f, "Missing 'info' dictionary in descriptor"),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<serde_bencode::Error> for ParseError {
    fn from(e: serde_bencode::Error) -> Self {
        ParseError::Bencode(e)
    }
}

pub fn from_bytes(bencode_data: &[u8]) -> Result<Descriptor, ParseError> {
    // 1. Deserialize into a generic Bencode Value so the raw 'info'
    //    dictionary can be inspected before conversion to the typed struct.
    let generic_bencode: Value = de::from_bytes(bencode_data)?;

    // 2. Extract the raw 'info' dictionary value.
    let info_dict_value = if let Value::Dict(mut top_level_dict) = generic_bencode {
        top_level_dict
            .remove("info".as_bytes())
            .ok_or(ParseError::MissingInfoDict)?
    } else {
        return Err(ParseError::MissingInfoDict);
    };

    // 3. Re-encode just the 'info' dictionary; these are the bytes the
    //    info-hash is derived from.
    let info_dict_bencode = serde_bencode::to_bytes(&info_dict_value)?;

    // 4. Deserialize the original data again, this time into the typed
    //    Descriptor struct.
    let mut descriptor: Descriptor = de::from_bytes(bencode_data)?;

    // Pure multi-file descriptors leave 'length' at 0; fill it in so callers
    // see a valid total size immediately.
    if descriptor.info.length == 0 {
        descriptor.info.length = descriptor.info.total_length();
    }

    descriptor.info_dict_bencode = info_dict_bencode;

    Ok(descriptor)
}
