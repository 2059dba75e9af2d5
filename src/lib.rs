//! Annotate VCF variants with predicted protein consequences, matching 3D structures and
//! iCn3D viewer commands.
//!
//! The entry point is [`pipeline::Pipeline`]: it reads variants from a tabix-indexed VCF file
//! ([`reader`]), splits them into batches ([`batch`]), resolves consequences and structures
//! through the remote services ([`remote`]) and assembles one record per variant
//! ([`annotate`]).

pub mod annotate;
pub mod batch;
pub mod common;
pub mod error;
pub mod pipeline;
pub mod reader;
pub mod remote;
