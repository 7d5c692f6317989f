//! Loading CSV data, either from an upload or from the storage directory.

use std::{
  fmt,
  io::Cursor,
  path::{Path, PathBuf},
};

use polars::prelude::*;
use tracing::{debug, info};

use crate::{
  error::{Error, NoDataError, Result},
  text_values,
};

const CSV_SUFFIX: &str = ".csv";

/// A directory of `.csv` files.
#[derive(Debug, Clone)]
pub struct Storage {
  root: PathBuf,
}

/// A file uploaded through the page, kept in memory.
#[derive(Clone)]
pub struct Upload {
  pub name:  String,
  pub bytes: Vec<u8>,
}

impl fmt::Debug for Upload {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Upload").field("name", &self.name).field("len", &self.bytes.len()).finish()
  }
}

/// A parsed table. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Dataset {
  frame: DataFrame,
}

/// Where the dataset of an interaction came from.
#[derive(Debug)]
pub enum Loaded {
  Uploaded(Dataset),
  Stored { file: String, dataset: Dataset },
}

impl Storage {
  /// Opens `root`, creating it when it does not exist yet.
  pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
    let root = root.into();
    if !root.exists() {
      info!(path = %root.display(), "creating data directory");
    }
    std::fs::create_dir_all(&root)?;
    Ok(Storage { root })
  }

  pub fn root(&self) -> &Path { &self.root }

  /// Names of the `.csv` files currently in the directory, sorted.
  pub fn list(&self) -> Result<Vec<String>> {
    let mut files = vec![];
    for entry in std::fs::read_dir(&self.root)? {
      let entry = entry?;
      if !entry.file_type()?.is_file() {
        continue;
      }
      let Ok(name) = entry.file_name().into_string() else { continue };
      if name.ends_with(CSV_SUFFIX) {
        files.push(name);
      }
    }
    files.sort();
    Ok(files)
  }

  /// Reads one of the listed files. Names outside the listing are refused.
  pub fn read(&self, name: &str) -> Result<Dataset> {
    if !self.list()?.iter().any(|f| f == name) {
      return Err(NoDataError::NoneSelected.into());
    }
    let bytes = std::fs::read(self.root.join(name))?;
    Dataset::from_csv(bytes)
  }
}

impl Upload {
  /// Accepts a single `.csv` file.
  pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
    let name = name.into();
    if !name.to_ascii_lowercase().ends_with(CSV_SUFFIX) {
      return Err(Error::Upload("Only .csv files can be uploaded.".to_string()));
    }
    Ok(Upload { name, bytes })
  }
}

impl Dataset {
  pub fn from_csv(bytes: Vec<u8>) -> Result<Self> {
    let frame = CsvReadOptions::default()
      .with_has_header(true)
      .into_reader_with_file_handle(Cursor::new(bytes))
      .finish()
      .map_err(Error::Parse)?;
    debug!(rows = frame.height(), columns = frame.width(), "parsed csv");
    Ok(Dataset { frame })
  }

  pub fn from_frame(frame: DataFrame) -> Self { Dataset { frame } }

  pub fn frame(&self) -> &DataFrame { &self.frame }

  pub fn columns(&self) -> Vec<String> {
    self.frame.get_column_names().into_iter().map(|name| name.to_string()).collect()
  }

  pub fn has_column(&self, name: &str) -> bool {
    self.frame.get_column_names().into_iter().any(|c| c.as_str() == name)
  }

  pub fn height(&self) -> usize { self.frame.height() }

  /// The first `rows` rows as text, one inner vector per row.
  pub fn preview(&self, rows: usize) -> Result<Vec<Vec<String>>> {
    let head = self.frame.head(Some(rows));
    let columns = head
      .get_columns()
      .iter()
      .map(text_values)
      .collect::<PolarsResult<Vec<_>>>()
      .map_err(Error::Parse)?;

    Ok((0..head.height()).map(|i| columns.iter().map(|c| c[i].clone()).collect()).collect())
  }
}

/// Resolves the dataset for one interaction.
///
/// A pending upload always wins. Otherwise the storage directory must hold at
/// least one `.csv` file and one of them must be selected.
pub fn load(storage: &Storage, upload: Option<&Upload>, selected: Option<&str>) -> Result<Loaded> {
  if let Some(upload) = upload {
    let dataset = Dataset::from_csv(upload.bytes.clone())?;
    info!(file = %upload.name, rows = dataset.height(), "loaded upload");
    return Ok(Loaded::Uploaded(dataset));
  }

  let files = storage.list()?;
  if files.is_empty() {
    return Err(NoDataError::NoFiles.into());
  }

  let Some(file) = selected.filter(|s| files.iter().any(|f| f == s)) else {
    return Err(NoDataError::NoneSelected.into());
  };

  let dataset = storage.read(file)?;
  info!(file, rows = dataset.height(), "loaded stored file");
  Ok(Loaded::Stored { file: file.to_string(), dataset })
}

impl Loaded {
  pub fn dataset(&self) -> &Dataset {
    match self {
      Loaded::Uploaded(dataset) => dataset,
      Loaded::Stored { dataset, .. } => dataset,
    }
  }
}
