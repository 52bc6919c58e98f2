//! Label agent - command line front end for the thermal label printer

pub mod cli;
pub mod commands;
