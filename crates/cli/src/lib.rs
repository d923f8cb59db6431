// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Host tooling for flashvar images: provisioning, inspection and crash forensics
//! on a raw dump of the two EEPROM pages.

pub mod commands;
pub mod config;
pub mod engine;
pub mod image;
pub mod telemetry;
