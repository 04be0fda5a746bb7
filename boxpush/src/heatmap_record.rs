use file_io::create_file_buf_write;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Agent positions visited by each environment since recording started,
/// written as one JSON array of `[x, y]` pairs per environment.
pub struct HeatmapRecord {
    dir: PathBuf,
    prefix: String,
    positions: Vec<Vec<[f32; 2]>>,
}

impl HeatmapRecord {
    pub fn new(dir: &Path, prefix: &str, num_envs: usize) -> Self {
        Self {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
            positions: vec![vec![]; num_envs],
        }
    }
    pub fn record(&mut self, env_index: usize, position: (f32, f32)) {
        self.positions[env_index].push([position.0, position.1]);
    }
    pub fn file_path(&self, env_index: usize) -> PathBuf {
        self.dir
            .join(format!("{}_env{}.json", self.prefix, env_index))
    }
    pub fn write(&self) -> Result<(), crate::EnvError> {
        std::fs::create_dir_all(&self.dir)?;
        for (env_index, positions) in self.positions.iter().enumerate() {
            let mut file = create_file_buf_write(self.file_path(env_index))?;
            serde_json::to_writer(&mut file, positions)?;
            file.flush()?;
        }
        log::debug!(
            "wrote heatmap records {}_env*.json to {}",
            self.prefix,
            self.dir.display()
        );
        Ok(())
    }
}
