//! Flattened (geometry-free) CSV export of a site table.

use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::error::Result;
use crate::sites::SiteTable;

/// Write `id,lon,lat,<every property>` with the centroid as lon/lat.
/// Property columns appear in first-seen order across all sites.
pub fn write_csv(table: &SiteTable, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_csv_to(table, file)?;
    info!(path = %path.display(), rows = table.len(), "CSV export written");
    Ok(())
}

/// Same as [`write_csv`] but into any writer.
pub fn write_csv_to<W: std::io::Write>(table: &SiteTable, out: W) -> Result<()> {
    let mut columns: Vec<&str> = Vec::new();
    for site in table.sites() {
        for key in site.properties.keys() {
            if key != "id" && !columns.contains(&key.as_str()) {
                columns.push(key.as_str());
            }
        }
    }

    let mut writer = csv::Writer::from_writer(out);
    let mut header = vec!["id", "lon", "lat"];
    header.extend(columns.iter().copied());
    writer.write_record(&header)?;

    for site in table.sites() {
        let centroid = site.centroid();
        let mut record = vec![
            site.id.clone(),
            centroid.map(|c| c.lon.to_string()).unwrap_or_default(),
            centroid.map(|c| c.lat.to_string()).unwrap_or_default(),
        ];
        record.extend(columns.iter().map(|c| cell(site.properties.get(*c))));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::CandidateSite;
    use shelterscope_common::geo::{Geometry, Position};

    #[test]
    fn test_flattened_columns() {
        let mut a = CandidateSite::new("a")
            .with_geometry(Geometry::Point(Position::new(39.5, 38.25)))
            .with_value("Slope", 3.0);
        a.properties.insert("name".into(), Value::String("Stadium".into()));
        let b = CandidateSite::new("b").with_value("Slope", 4.5).with_value("score", 0.25);

        let mut buf = Vec::new();
        write_csv_to(&SiteTable::new(vec![a, b]), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,lon,lat,Slope,name,score");
        assert_eq!(lines[1], "a,39.5,38.25,3.0,Stadium,");
        assert_eq!(lines[2], "b,,,4.5,,0.25");
    }
}
