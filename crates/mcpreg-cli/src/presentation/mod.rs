//! Shared CLI presentation utilities.
//!
//! Keep this module format-only: no registry access and no probing.

pub mod envelope;
pub mod output;
pub mod server_display;
pub mod tables;

pub use envelope::Envelope;
pub use output::OutputMode;
pub use server_display::{
    print_batch_report, print_probe_result, print_record_detail, print_record_table,
    server_target, status_label,
};
pub use tables::{format_optional, print_separator, truncate_string};
