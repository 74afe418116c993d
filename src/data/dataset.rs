use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::info;
use serde::{Serialize, Deserialize};

use crate::data::batch::ImageShape;
use crate::error::{Result, TrainError};

/// One labelled radar scene as stored in the competition JSON file.
///
/// `band_1`/`band_2` are the HH and HV backscatter images (dB), flattened
/// row-major. `inc_angle` is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadarRecord {
    pub id: String,
    pub band_1: Vec<f64>,
    pub band_2: Vec<f64>,
    #[serde(default)]
    pub is_iceberg: Option<u8>,
}

/// Two-channel images with binary labels, held in memory.
#[derive(Debug, Clone)]
pub struct RadarDataset {
    pub ids: Vec<String>,
    /// One `channels × height × width` row per sample.
    pub images: Vec<Vec<f64>>,
    pub labels: Vec<f64>,
    pub shape: ImageShape,
}

impl RadarDataset {
    /// Reads a JSON array of [`RadarRecord`]s.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<RadarDataset> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            TrainError::Dataset(format!("cannot open {}: {e}", path.display()))
        })?;
        let records: Vec<RadarRecord> = serde_json::from_reader(BufReader::new(file))?;
        let dataset = RadarDataset::from_records(records)?;
        info!(
            "loaded {} samples ({} positive) of shape {}x{}x{} from {}",
            dataset.len(),
            dataset.labels.iter().filter(|&&y| y == 1.0).count(),
            dataset.shape.channels,
            dataset.shape.height,
            dataset.shape.width,
            path.display()
        );
        Ok(dataset)
    }

    /// Validates and stacks records. Every band must be the same square size
    /// and every record must carry a 0/1 label.
    pub fn from_records(records: Vec<RadarRecord>) -> Result<RadarDataset> {
        let first = records.first()
            .ok_or_else(|| TrainError::Dataset("dataset has no records".to_string()))?;
        let pixels = first.band_1.len();
        let side = (pixels as f64).sqrt().round() as usize;
        if pixels == 0 || side * side != pixels {
            return Err(TrainError::Dataset(format!(
                "record {} has {pixels} pixels per band, expected a square image",
                first.id
            )));
        }
        let shape = ImageShape { channels: 2, height: side, width: side };

        let mut dataset = RadarDataset {
            ids: Vec::with_capacity(records.len()),
            images: Vec::with_capacity(records.len()),
            labels: Vec::with_capacity(records.len()),
            shape,
        };
        for record in records {
            if record.band_1.len() != pixels || record.band_2.len() != pixels {
                return Err(TrainError::Dataset(format!(
                    "record {} has bands of {} and {} pixels, expected {pixels}",
                    record.id,
                    record.band_1.len(),
                    record.band_2.len()
                )));
            }
            let label = match record.is_iceberg {
                Some(0) => 0.0,
                Some(1) => 1.0,
                Some(other) => {
                    return Err(TrainError::Dataset(format!(
                        "record {} has label {other}, expected 0 or 1",
                        record.id
                    )))
                }
                None => {
                    return Err(TrainError::Dataset(format!("record {} is unlabelled", record.id)))
                }
            };
            let mut image = record.band_1;
            image.extend(record.band_2);
            dataset.ids.push(record.id);
            dataset.images.push(image);
            dataset.labels.push(label);
        }
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Standardises each channel to zero mean and unit variance over the whole
    /// dataset. Constant channels are only centred.
    pub fn standardize(&mut self) {
        let plane = self.shape.height * self.shape.width;
        for c in 0..self.shape.channels {
            let range = c * plane..(c + 1) * plane;
            let count = (plane * self.images.len()) as f64;
            if count == 0.0 {
                return;
            }
            let mean = self.images.iter()
                .flat_map(|img| img[range.clone()].iter())
                .sum::<f64>() / count;
            let var = self.images.iter()
                .flat_map(|img| img[range.clone()].iter())
                .map(|x| (x - mean).powi(2))
                .sum::<f64>() / count;
            let std = var.sqrt();
            for img in &mut self.images {
                for x in &mut img[range.clone()] {
                    *x -= mean;
                    if std > 0.0 {
                        *x /= std;
                    }
                }
            }
        }
    }
}
