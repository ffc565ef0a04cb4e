//! Per-diem travel allowance engine for Austrian expense reporting.
//!
//! This crate computes statutory travel reimbursements: the meal allowance
//! (Taggeld), the overnight allowance, and the kilometer allowance for
//! private vehicles, aggregated per trip and across a reporting period.
//! Rates, tiering policies, and deduction rules are loaded from YAML rate
//! tables rather than compiled in.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
