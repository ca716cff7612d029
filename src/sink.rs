use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::output::count_records;

/// Append-only destination for serialized record blocks, keyed by route id.
pub trait OutputSink {
    /// Records already present in `destination`.
    fn written(&self, destination: &str) -> Result<usize>;

    /// Writes one whole block and flushes it before returning.
    fn append(&mut self, destination: &str, block: &str) -> Result<()>;
}

/// Total records across `destinations`; the start offset for a resumed run.
pub fn written_total(sink: &dyn OutputSink, destinations: &[&str]) -> Result<usize> {
    let mut total = 0usize;
    for dest in destinations {
        total += sink.written(dest)?;
    }
    Ok(total)
}

/// One `<destination>.txt` per route under `dir`.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, destination: &str) -> PathBuf {
        self.dir.join(format!("{destination}.txt"))
    }

    /// Truncates every destination file. Used for fresh (non-resumed) runs.
    pub fn clear(&self, destinations: &[&str]) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create output dir {}", self.dir.display()))?;
        for dest in destinations {
            let path = self.path_for(dest);
            fs::write(&path, "").with_context(|| format!("clear {}", path.display()))?;
        }
        Ok(())
    }
}

impl OutputSink for FileSink {
    fn written(&self, destination: &str) -> Result<usize> {
        let path = self.path_for(destination);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(count_records(&raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(err) => Err(err).with_context(|| format!("read {}", path.display())),
        }
    }

    fn append(&mut self, destination: &str, block: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create output dir {}", self.dir.display()))?;
        let path = self.path_for(destination);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open {}", path.display()))?;
        file.write_all(block.as_bytes())
            .with_context(|| format!("append to {}", path.display()))?;
        file.flush().context("flush record")?;
        file.sync_data().context("sync record")?;
        Ok(())
    }
}

/// Keeps blocks in memory; for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    blocks: BTreeMap<String, Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self, destination: &str) -> &[String] {
        self.blocks.get(destination).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn text(&self, destination: &str) -> String {
        self.blocks(destination).concat()
    }

    pub fn destinations(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }
}

impl OutputSink for MemorySink {
    fn written(&self, destination: &str) -> Result<usize> {
        Ok(self.blocks(destination).len())
    }

    fn append(&mut self, destination: &str, block: &str) -> Result<()> {
        self.blocks
            .entry(destination.to_string())
            .or_default()
            .push(block.to_string());
        Ok(())
    }
}
