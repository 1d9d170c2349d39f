use std::path::Path;

use civic_priority::dataset::TrainingSample;

const URGENT: [&str; 10] = [
    "Burst water main flooding the street",
    "Burst pipe flooding basement of apartment block",
    "Sewage overflow contaminated drinking water supply",
    "Major leak flooding the road near school",
    "Water main burst causing severe flooding",
    "Contaminated water supply health risk for residents",
    "Flooding from burst pipeline blocking traffic",
    "Sewage leak near hospital immediate health threat",
    "Burst valve flooding market area urgent",
    "Overflowing sewage flooding homes dangerous",
];

const ROUTINE: [&str; 10] = [
    "Small pothole near the corner",
    "Faded lane markings on quiet lane",
    "Pothole beside bus stop needs patching",
    "Uneven paving stones outside bakery",
    "Small pothole near the park gate",
    "Road sign slightly tilted near junction",
    "Minor cracks along footpath edge",
    "Speed bump paint has faded",
    "Loose gravel on side street",
    "Small dip in road near library",
];

/// Urgent water complaints interleaved with routine road complaints.
pub fn scenario_samples() -> Vec<TrainingSample> {
    let mut samples = Vec::new();
    for round in 0..2 {
        for (idx, (urgent, routine)) in URGENT.iter().zip(ROUTINE.iter()).enumerate() {
            let jitter = ((round * 10 + idx) % 5) as f32 * 0.01;
            samples.push(TrainingSample::new("water_supply", *urgent, 0.93 + jitter));
            samples.push(TrainingSample::new("roads", *routine, 0.18 + jitter));
        }
    }
    samples
}

pub fn write_csv(path: &Path, samples: &[TrainingSample]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create dataset dir");
    }
    let mut text = String::from("category,impact,description,priority\n");
    for sample in samples {
        text.push_str(&format!(
            "{},{},{},{}\n",
            sample.category, "medium", sample.description, sample.priority
        ));
    }
    std::fs::write(path, text).expect("write dataset csv");
}
