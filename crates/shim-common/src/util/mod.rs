// Utility helpers.

pub mod var_util;
