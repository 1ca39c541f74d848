#![doc = "ecs-report-core: core logic library for ecs-report."]

//! This crate contains the collection walk, the spreadsheet model and merge
//! rules, and workbook persistence. The HTTP client lives in the CLI crate and
//! plugs in through [`contract::EcsApi`].
//!
//! # Usage
//! Build a [`config::ReportConfig`], hand it and an `EcsApi` implementation to
//! [`report::run_report`].

pub mod collect;
pub mod config;
pub mod contract;
pub mod error;
pub mod report;
pub mod sheet;
pub mod workbook;
