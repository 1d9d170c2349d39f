use std::collections::HashMap;

use tracing::debug;

use super::{DatasetError, TrainingSample};

/// Header columns the training pipeline reads. Other columns (e.g. `impact`) are ignored.
pub const REQUIRED_COLUMNS: [&str; 3] = ["category", "description", "priority"];

/// Parse comma-separated rows with a header line into training samples.
///
/// Fields are split on `,` and trimmed; quoting is not supported. Blank lines,
/// rows without a category or description, and rows whose priority is not a
/// finite number are skipped.
pub fn parse_samples(text: &str) -> Result<Vec<TrainingSample>, DatasetError> {
    let mut lines = text.trim().lines();
    let header = lines.next().ok_or(DatasetError::NoSamples)?;
    let columns: HashMap<&str, usize> = header
        .split(',')
        .enumerate()
        .map(|(idx, name)| (name.trim(), idx))
        .collect();
    let [category_col, description_col, priority_col] = REQUIRED_COLUMNS.map(|name| {
        columns
            .get(name)
            .copied()
            .ok_or(DatasetError::MissingColumn(name))
    });
    let (category_col, description_col, priority_col) = (category_col?, description_col?, priority_col?);

    let mut samples = Vec::new();
    let mut skipped = 0usize;
    for line in lines.filter(|line| !line.trim().is_empty()) {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let field = |idx: usize| fields.get(idx).copied().unwrap_or("");
        let category = field(category_col);
        let description = field(description_col);
        if category.is_empty() || description.is_empty() {
            skipped += 1;
            continue;
        }
        let Some(priority) = field(priority_col)
            .parse::<f32>()
            .ok()
            .filter(|value| value.is_finite())
        else {
            skipped += 1;
            continue;
        };
        samples.push(TrainingSample::new(category, description, priority));
    }
    if skipped > 0 {
        debug!("Skipped {skipped} malformed dataset rows");
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_columns_by_header_name() {
        let text = "category,impact,description,priority\n\
                    water_supply,critical,Burst water main flooding the street,0.95\n\
                    \n\
                    roads, low , Small pothole near the corner ,0.2\n";
        let samples = parse_samples(text).unwrap();
        assert_eq!(
            samples,
            vec![
                TrainingSample::new("water_supply", "Burst water main flooding the street", 0.95),
                TrainingSample::new("roads", "Small pothole near the corner", 0.2),
            ]
        );
    }

    #[test]
    fn column_order_is_taken_from_header() {
        let text = "priority,description,category\n0.5,Streetlight out,street_lighting\n";
        let samples = parse_samples(text).unwrap();
        assert_eq!(samples[0].category, "street_lighting");
        assert_eq!(samples[0].priority, 0.5);
    }

    #[test]
    fn drops_incomplete_and_unparseable_rows() {
        let text = "category,impact,description,priority\n\
                    ,low,No category,0.3\n\
                    roads,low,,0.3\n\
                    roads,low,Pothole,not-a-number\n\
                    roads,low,Short row\n\
                    roads,low,Pothole,0.3\n";
        let samples = parse_samples(text).unwrap();
        assert_eq!(samples, vec![TrainingSample::new("roads", "Pothole", 0.3)]);
    }

    #[test]
    fn missing_required_column_is_reported() {
        let err = parse_samples("category,impact,priority\nroads,low,0.2\n").unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn("description")));
    }
}
