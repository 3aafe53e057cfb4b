use std::io::Write;

use super::super::model::DimensionId;
use super::PersistedAssessment;

/// Flatten saved assessments into CSV: one row per assessment, one column per
/// dimension seen across the records. Unassessed dimensions are left blank.
pub fn write_history_csv<W: Write>(
    records: &[PersistedAssessment],
    writer: W,
) -> Result<(), csv::Error> {
    let mut dimensions: Vec<&DimensionId> = Vec::new();
    for record in records {
        for score in &record.results.dimensions {
            if !dimensions.contains(&&score.dimension) {
                dimensions.push(&score.dimension);
            }
        }
    }

    let mut csv = csv::Writer::from_writer(writer);
    let mut header = vec![
        "id".to_string(),
        "title".to_string(),
        "created_at".to_string(),
        "progress_percent".to_string(),
        "overall_score".to_string(),
        "level".to_string(),
    ];
    header.extend(dimensions.iter().map(|id| id.to_string()));
    csv.write_record(&header)?;

    for record in records {
        let overall = &record.results.overall;
        let mut row = vec![
            record.id.to_string(),
            record.title.clone(),
            record.created_at.to_rfc3339(),
            record.progress_percent.to_string(),
            if overall.is_assessed() {
                overall.score.to_string()
            } else {
                String::new()
            },
            overall.level().unwrap_or_default().to_string(),
        ];
        for dimension in &dimensions {
            let cell = record
                .results
                .dimension(dimension)
                .filter(|score| score.assessed)
                .map(|score| score.score.to_string())
                .unwrap_or_default();
            row.push(cell);
        }
        csv.write_record(&row)?;
    }

    csv.flush()?;
    Ok(())
}
