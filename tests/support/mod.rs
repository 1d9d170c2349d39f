#![allow(dead_code)]

pub mod civic_env;
pub mod corpus;
