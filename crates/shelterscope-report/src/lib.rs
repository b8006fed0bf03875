//! shelterscope-report — HTML outputs for scored shelter sites.
//!
//! - Overview map (Leaflet) with sites coloured by suitability score
//! - One report per site with its criterion breakdown
//!
//! Templates are compiled into the binary; the documents load Leaflet and
//! OpenStreetMap tiles from their public CDNs when opened.

pub mod map;
pub mod report;
pub mod templates;

pub use map::{render_map, write_map, MapOptions};
pub use report::{render_site_report, report_file_names, write_reports};
