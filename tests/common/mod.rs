#![allow(dead_code)]

pub(crate) mod test_utils;
