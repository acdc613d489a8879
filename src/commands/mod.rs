pub mod scan;

pub use scan::{
    gather_local_paths, render_summary, scan_local_paths, scan_with_reader, summary_json,
    write_report,
};
