use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Serialize, Deserialize};

use crate::error::{Result, TrainError};
use crate::model::classifier::Classifier;
use crate::optim::Optimizer;

/// Where in the run a checkpoint was taken and whether it is the fold's best.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub epoch: usize,
    pub fold: usize,
    pub val_loss: f64,
    pub is_best: bool,
}

/// On-disk checkpoint: metadata plus opaque classifier and optimizer state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(flatten)]
    pub meta: CheckpointMeta,
    pub classifier: serde_json::Value,
    pub optimizer: serde_json::Value,
}

/// Writes per-epoch and best-of-fold checkpoints under one directory.
///
/// File names: `<prefix>_<epoch>_fold_<fold>.<ext>` for the latest epoch and
/// `<prefix>_best_<fold>.<ext>` for the best one.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir: PathBuf,
    prefix: String,
    extension: String,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        CheckpointManager { dir: dir.into(), prefix: prefix.into(), extension: "mdl".to_string() }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn epoch_path(&self, epoch: usize, fold: usize) -> PathBuf {
        self.dir.join(format!("{}_{}_fold_{}.{}", self.prefix, epoch, fold, self.extension))
    }

    pub fn best_path(&self, fold: usize) -> PathBuf {
        self.dir.join(format!("{}_best_{}.{}", self.prefix, fold, self.extension))
    }

    /// Serializes classifier and optimizer state to `path` and, when
    /// `meta.is_best`, to the fold's best path as well. Each file is replaced
    /// atomically, so a failed write never leaves a truncated checkpoint.
    pub fn save<C: Classifier + ?Sized>(
        &self,
        path: &Path,
        classifier: &C,
        optimizer: &dyn Optimizer,
        meta: CheckpointMeta,
    ) -> Result<()> {
        let checkpoint = Checkpoint {
            meta,
            classifier: classifier.state_dict()?,
            optimizer: optimizer.state_dict()?,
        };
        let bytes = serde_json::to_vec_pretty(&checkpoint)?;

        write_atomic(path, &bytes)?;
        debug!("wrote checkpoint {}", path.display());
        if meta.is_best {
            let best = self.best_path(meta.fold);
            write_atomic(&best, &bytes)?;
            debug!("fold {} best checkpoint now epoch {} ({})", meta.fold, meta.epoch, best.display());
        }
        Ok(())
    }

    /// Reads a checkpoint written by [`CheckpointManager::save`].
    pub fn load(path: &Path) -> Result<Checkpoint> {
        let read_err = |reason: String| TrainError::CheckpointRead { path: path.to_path_buf(), reason };
        let file = File::open(path).map_err(|e| read_err(e.to_string()))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| read_err(e.to_string()))
    }

    /// Loads `path` into an existing classifier and optimizer.
    pub fn restore<C: Classifier + ?Sized>(
        path: &Path,
        classifier: &mut C,
        optimizer: &mut dyn Optimizer,
    ) -> Result<CheckpointMeta> {
        let checkpoint = CheckpointManager::load(path)?;
        classifier.load_state_dict(checkpoint.classifier)?;
        optimizer.load_state_dict(checkpoint.optimizer)?;
        Ok(checkpoint.meta)
    }
}

/// Writes `bytes` to a sibling temporary file, syncs it, then renames it over
/// `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let write_err = |source: std::io::Error| TrainError::CheckpointWrite { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let result = (|| {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkSpec;
    use crate::optim::Sgd;

    fn meta(epoch: usize, is_best: bool) -> CheckpointMeta {
        CheckpointMeta { epoch, fold: 2, val_loss: 0.5, is_best }
    }

    #[test]
    fn test_path_layout() {
        let m = CheckpointManager::new("models", "clf");
        assert_eq!(m.epoch_path(3, 1), PathBuf::from("models/clf_3_fold_1.mdl"));
        assert_eq!(m.best_path(1), PathBuf::from("models/clf_best_1.mdl"));
        assert_eq!(m.with_extension("json").best_path(0), PathBuf::from("models/clf_best_0.json"));
    }

    #[test]
    fn test_best_written_only_when_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let m = CheckpointManager::new(dir.path(), "clf");
        let net = NetworkSpec::default().build(3, 0).unwrap();
        let sgd = Sgd::new(0.1);

        m.save(&m.epoch_path(1, 2), &net, &sgd, meta(1, false)).unwrap();
        assert!(m.epoch_path(1, 2).exists());
        assert!(!m.best_path(2).exists());

        m.save(&m.epoch_path(2, 2), &net, &sgd, meta(2, true)).unwrap();
        let best = CheckpointManager::load(&m.best_path(2)).unwrap();
        assert_eq!(best.meta, meta(2, true));
        assert!(!dir.path().join("clf_best_2.mdl.tmp").exists());
    }

    #[test]
    fn test_restore_round_trip() {
        use crate::math::matrix::Matrix;
        use crate::model::Classifier;

        let dir = tempfile::tempdir().unwrap();
        let m = CheckpointManager::new(dir.path(), "clf");
        let spec = NetworkSpec::default();
        let mut saved = spec.build(3, 0).unwrap();
        m.save(&m.epoch_path(1, 2), &saved, &Sgd::new(0.1), meta(1, true)).unwrap();

        let mut fresh = spec.build(3, 7).unwrap();
        let mut sgd = Sgd::new(0.0);
        let restored = CheckpointManager::restore(&m.best_path(2), &mut fresh, &mut sgd).unwrap();
        assert_eq!(restored.epoch, 1);
        assert_eq!(sgd.learning_rate, 0.1);

        let x = Matrix::from_data(vec![vec![0.1, 0.2, 0.3]]);
        assert_eq!(saved.forward(&x).unwrap(), fresh.forward(&x).unwrap());
    }

    #[test]
    fn test_failed_write_keeps_previous_best() {
        let dir = tempfile::tempdir().unwrap();
        let m = CheckpointManager::new(dir.path(), "clf");
        let net = NetworkSpec::default().build(3, 0).unwrap();
        let sgd = Sgd::new(0.1);
        m.save(&m.epoch_path(1, 2), &net, &sgd, meta(1, true)).unwrap();

        // A directory squatting on the target makes the rename fail.
        let blocked = m.epoch_path(2, 2);
        fs::create_dir_all(blocked.join("occupied")).unwrap();
        let err = m.save(&blocked, &net, &sgd, meta(2, true)).unwrap_err();
        assert!(matches!(err, TrainError::CheckpointWrite { .. }));

        let best = CheckpointManager::load(&m.best_path(2)).unwrap();
        assert_eq!(best.meta.epoch, 1);
    }

    #[test]
    fn test_load_missing_file() {
        let err = CheckpointManager::load(Path::new("/nonexistent/clf_best_0.mdl")).unwrap_err();
        assert!(matches!(err, TrainError::CheckpointRead { .. }));
    }
}
