//! Output formatting for subnet results.
//!
//! This module handles formatting of engine and planner results:
//! - [`csv`] - CSV export
//! - [`terminal`] - Terminal output with colors

mod csv;
mod terminal;

pub use csv::{csv_row, escape_csv_field, subnet_table_csv, summary_csv, vlsm_csv};
pub use terminal::{
    efficiency_label, format_field, key_values, render_commands, render_count_plan,
    render_count_plan_v6, render_host_sizing, render_subnet_list, render_subnet_v4,
    render_subnet_v6, render_summary, render_transfer_time, render_vlsm,
};
